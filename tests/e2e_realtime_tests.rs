//! End-to-end tests for the realtime connection
//!
//! Runs the client against an in-process WebSocket push server and exercises
//! subscription recovery, routing, reconnection and explicit disconnect.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};

use chirper_client::notifications::NotificationStore;
use chirper_client::realtime::{topics, RealtimeClient, TopicRouter};

const WAIT: Duration = Duration::from_secs(5);

/// In-process push server. Each accepted connection is handed to the test
/// as a [`ServerConn`].
struct PushServer {
    addr: SocketAddr,
    connections: mpsc::UnboundedReceiver<ServerConn>,
}

/// One accepted client connection, seen from the server side.
///
/// Dropping it closes the underlying socket, which the client observes as
/// an unexpected close.
struct ServerConn {
    frames: mpsc::UnboundedReceiver<Value>,
    outbound: mpsc::UnboundedSender<Message>,
}

async fn start_push_server() -> PushServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (conn_tx, connections) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let Ok(ws) = accept_async(stream).await else {
                continue;
            };

            let (frame_tx, frame_rx) = mpsc::unbounded_channel();
            let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
            if conn_tx
                .send(ServerConn {
                    frames: frame_rx,
                    outbound: out_tx,
                })
                .is_err()
            {
                break;
            }

            tokio::spawn(async move {
                let (mut sink, mut source) = ws.split();
                loop {
                    tokio::select! {
                        outgoing = out_rx.recv() => match outgoing {
                            Some(message) => {
                                if sink.send(message).await.is_err() {
                                    break;
                                }
                            }
                            // Test dropped its handle: close the connection.
                            None => break,
                        },
                        incoming = source.next() => match incoming {
                            Some(Ok(Message::Text(text))) => {
                                if let Ok(value) = serde_json::from_str::<Value>(&text) {
                                    let _ = frame_tx.send(value);
                                }
                            }
                            Some(Ok(_)) => {}
                            Some(Err(_)) | None => break,
                        }
                    }
                }
            });
        }
    });

    PushServer { addr, connections }
}

impl PushServer {
    fn url(&self) -> String {
        format!("ws://{}/websocket", self.addr)
    }

    async fn next_connection(&mut self) -> ServerConn {
        timeout(WAIT, self.connections.recv())
            .await
            .expect("timed out waiting for a client connection")
            .expect("listener task ended")
    }

    async fn expect_no_connection(&mut self, window: Duration) {
        assert!(
            timeout(window, self.connections.recv()).await.is_err(),
            "client connected even though no attempt was expected"
        );
    }
}

impl ServerConn {
    /// Wait until a control frame with the given command and destination
    /// arrives; intervening frames are skipped.
    async fn expect_control(&mut self, command: &str, destination: &str) {
        let matched = timeout(WAIT, async {
            while let Some(frame) = self.frames.recv().await {
                if frame["command"] == command && frame["destination"] == destination {
                    return true;
                }
            }
            false
        })
        .await;

        assert!(
            matched.unwrap_or(false),
            "no {} frame for {} arrived",
            command,
            destination
        );
    }

    /// Wait until SUBSCRIBE frames for all destinations arrived, in any
    /// order.
    async fn expect_subscribes(&mut self, destinations: &[&str]) {
        let mut remaining: std::collections::HashSet<String> =
            destinations.iter().map(|d| d.to_string()).collect();

        let done = timeout(WAIT, async {
            while let Some(frame) = self.frames.recv().await {
                if frame["command"] == "SUBSCRIBE" {
                    if let Some(destination) = frame["destination"].as_str() {
                        remaining.remove(destination);
                    }
                    if remaining.is_empty() {
                        return true;
                    }
                }
            }
            false
        })
        .await;

        assert!(
            done.unwrap_or(false),
            "missing SUBSCRIBE frames: {:?}",
            remaining
        );
    }

    fn push(&self, destination: &str, payload: Value) {
        let frame = json!({ "destination": destination, "payload": payload });
        self.push_raw(&frame.to_string());
    }

    fn push_raw(&self, text: &str) {
        self.outbound
            .send(Message::Text(text.to_string().into()))
            .expect("server connection already closed");
    }
}

fn client_with_delay(url: String, delay: Duration) -> RealtimeClient {
    RealtimeClient::with_reconnect_delay(url, None, Arc::new(TopicRouter::new()), delay)
}

async fn wait_until_connected(client: &RealtimeClient) {
    timeout(WAIT, async {
        while !client.is_connected() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("client never reached the connected state");
}

#[tokio::test]
async fn connect_announces_previously_registered_topics() {
    let mut server = start_push_server().await;
    let client = client_with_delay(server.url(), Duration::from_millis(100));

    client.subscribe_topic(topics::FEED);
    client.subscribe_topic(topics::chat(7));
    client.connect().await;

    let mut conn = server.next_connection().await;
    conn.expect_subscribes(&["/topic/feed", "/topic/chat/7"])
        .await;

    client.disconnect().await;
}

#[tokio::test]
async fn subscribing_while_open_sends_control_frames() {
    let mut server = start_push_server().await;
    let client = client_with_delay(server.url(), Duration::from_millis(100));

    client.connect().await;
    let mut conn = server.next_connection().await;
    wait_until_connected(&client).await;

    let token = client.subscribe(topics::notifications(7), |_| {});
    conn.expect_control("SUBSCRIBE", "/topic/notifications/7")
        .await;

    client.unsubscribe("/topic/notifications/7", token);
    conn.expect_control("UNSUBSCRIBE", "/topic/notifications/7")
        .await;

    client.disconnect().await;
}

#[tokio::test]
async fn pushed_frames_reach_the_handler_in_order() {
    let mut server = start_push_server().await;
    let client = client_with_delay(server.url(), Duration::from_millis(100));

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    client.subscribe(topics::FEED, move |payload| {
        let _ = seen_tx.send(payload.clone());
    });

    client.connect().await;
    let mut conn = server.next_connection().await;
    conn.expect_control("SUBSCRIBE", "/topic/feed").await;

    conn.push("/topic/feed", json!({"seq": 1}));
    conn.push("/topic/feed", json!({"seq": 2}));

    let first = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    let second = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    assert_eq!(first["seq"], 1);
    assert_eq!(second["seq"], 2);

    client.disconnect().await;
}

#[tokio::test]
async fn frames_for_other_topics_are_not_delivered() {
    let mut server = start_push_server().await;
    let client = client_with_delay(server.url(), Duration::from_millis(100));

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    client.subscribe(topics::FEED, move |payload| {
        let _ = seen_tx.send(payload.clone());
    });

    client.connect().await;
    let mut conn = server.next_connection().await;
    conn.expect_control("SUBSCRIBE", "/topic/feed").await;

    conn.push("/topic/notifications/99", json!({"seq": 1}));
    conn.push("/topic/feed", json!({"seq": 2}));

    let delivered = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    assert_eq!(delivered["seq"], 2);
    assert!(seen_rx.try_recv().is_err());

    client.disconnect().await;
}

#[tokio::test]
async fn malformed_frames_are_dropped_without_killing_the_connection() {
    let mut server = start_push_server().await;
    let client = client_with_delay(server.url(), Duration::from_millis(100));

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    client.subscribe(topics::FEED, move |payload| {
        let _ = seen_tx.send(payload.clone());
    });

    client.connect().await;
    let mut conn = server.next_connection().await;
    conn.expect_control("SUBSCRIBE", "/topic/feed").await;

    conn.push_raw("this is not json");
    conn.push("/topic/feed", json!({"seq": 1}));

    let delivered = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    assert_eq!(delivered["seq"], 1);
    assert!(client.is_connected());

    client.disconnect().await;
}

#[tokio::test]
async fn unexpected_close_triggers_reconnect_and_resubscribe() {
    let mut server = start_push_server().await;
    let client = client_with_delay(server.url(), Duration::from_millis(100));

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    client.subscribe(topics::FEED, move |payload| {
        let _ = seen_tx.send(payload.clone());
    });

    client.connect().await;
    let mut first = server.next_connection().await;
    first.expect_control("SUBSCRIBE", "/topic/feed").await;

    // Server drops the connection; no caller intervention from here on.
    drop(first);

    let mut second = server.next_connection().await;
    second.expect_control("SUBSCRIBE", "/topic/feed").await;

    second.push("/topic/feed", json!({"seq": 1}));
    let delivered = timeout(WAIT, seen_rx.recv()).await.unwrap().unwrap();
    assert_eq!(delivered["seq"], 1);

    client.disconnect().await;
}

#[tokio::test]
async fn disconnect_cancels_a_pending_reconnect() {
    let mut server = start_push_server().await;
    let client = client_with_delay(server.url(), Duration::from_millis(400));

    client.subscribe_topic(topics::FEED);
    client.connect().await;
    let conn = server.next_connection().await;

    // Kill the connection, give the client time to enter the retry wait,
    // then disconnect while the reconnect is still pending.
    drop(conn);
    tokio::time::sleep(Duration::from_millis(100)).await;
    client.disconnect().await;

    server
        .expect_no_connection(Duration::from_millis(800))
        .await;
    assert!(!client.is_connected());
}

#[tokio::test]
async fn connect_is_idempotent_while_running() {
    let mut server = start_push_server().await;
    let client = client_with_delay(server.url(), Duration::from_millis(100));

    client.connect().await;
    let _conn = server.next_connection().await;

    client.connect().await;
    server
        .expect_no_connection(Duration::from_millis(300))
        .await;

    client.disconnect().await;
}

#[tokio::test]
async fn pushed_notification_updates_store_and_emits_toast() {
    let mut server = start_push_server().await;
    let client = client_with_delay(server.url(), Duration::from_millis(100));
    let store = Arc::new(NotificationStore::new());
    store.attach(&client, 7);
    let mut toasts = store.toasts();

    client.connect().await;
    let mut conn = server.next_connection().await;
    conn.expect_subscribes(&["/topic/notifications/7", "/topic/mentions/7"])
        .await;

    conn.push(
        "/topic/notifications/7",
        json!({
            "id": 1,
            "notificationType": "LIKE",
            "user": { "id": 3, "fullName": "Alice Doe", "username": "alice" },
            "date": "2024-05-01T12:00:00Z"
        }),
    );

    let toast = timeout(WAIT, toasts.recv()).await.unwrap().unwrap();
    assert_eq!(toast.title, "New Like");
    assert_eq!(toast.description, "@alice liked your tweet");
    assert_eq!(store.unread_count(), 1);
    assert_eq!(store.notifications()[0].id, 1);

    conn.push("/topic/mentions/7", Value::Null);
    let mut changes = store.changes();
    // Mention counter catches up without touching the list.
    timeout(WAIT, async {
        while store.mentions_count() == 0 {
            let _ = changes.recv().await;
        }
    })
    .await
    .expect("mention count never incremented");
    assert_eq!(store.notifications().len(), 1);

    client.disconnect().await;
}
