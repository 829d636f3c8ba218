//! Realtime push client.
//!
//! Owns the WebSocket connection for a session: connect, automatic
//! reconnection after unexpected closes, and the control frames that keep
//! the server's view of topic subscriptions in sync with the router.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::messages::{Command, ControlFrame, PushFrame};
use super::router::{HandlerToken, TopicRouter};

/// Delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = futures::stream::SplitSink<WsStream, Message>;

/// State shared with the connection task.
struct Shared {
    ws_url: String,
    auth_token: Option<String>,
    reconnect_delay: Duration,
    router: Arc<TopicRouter>,
    /// Present only while the socket is open.
    outbound: StdMutex<Option<mpsc::Sender<ControlFrame>>>,
}

impl Shared {
    fn connect_url(&self) -> String {
        match &self.auth_token {
            Some(token) => format!("{}?token={}", self.ws_url, token),
            None => self.ws_url.clone(),
        }
    }

    /// Send a control frame if the socket is open; skipped otherwise.
    /// Subscriptions are recovered from the router on the next connect.
    fn send_control(&self, command: Command, destination: &str) {
        let sender = self.outbound.lock().unwrap().clone();
        let Some(sender) = sender else {
            debug!(
                "channel closed, skipping {:?} for {}",
                command, destination
            );
            return;
        };
        let frame = ControlFrame {
            command,
            destination: destination.to_string(),
        };
        if sender.try_send(frame).is_err() {
            debug!("outbound queue unavailable, dropping frame for {}", destination);
        }
    }
}

#[derive(Default)]
struct Lifecycle {
    task: Option<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
}

/// The session's realtime connection.
///
/// One instance per authenticated session. Reconnecting replaces the
/// transport handle but not the client's identity.
pub struct RealtimeClient {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl RealtimeClient {
    pub fn new(
        ws_url: impl Into<String>,
        auth_token: Option<String>,
        router: Arc<TopicRouter>,
    ) -> Self {
        Self::with_reconnect_delay(ws_url, auth_token, router, DEFAULT_RECONNECT_DELAY)
    }

    pub fn with_reconnect_delay(
        ws_url: impl Into<String>,
        auth_token: Option<String>,
        router: Arc<TopicRouter>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                ws_url: ws_url.into(),
                auth_token,
                reconnect_delay,
                router,
                outbound: StdMutex::new(None),
            }),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    pub fn router(&self) -> Arc<TopicRouter> {
        self.shared.router.clone()
    }

    /// Whether the socket is currently open.
    pub fn is_connected(&self) -> bool {
        self.shared.outbound.lock().unwrap().is_some()
    }

    /// Start the connection task. No-op if it is already running.
    ///
    /// On every successful open the task re-issues SUBSCRIBE frames for all
    /// topics currently in the router, so subscriptions survive reconnects.
    pub async fn connect(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
        {
            debug!("connection task already running, ignoring connect()");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        lifecycle.shutdown = Some(shutdown_tx);
        lifecycle.task = Some(tokio::spawn(connection_loop(
            self.shared.clone(),
            shutdown_rx,
        )));
    }

    /// Stop the connection task and close the socket if open. Cancels any
    /// pending reconnect; no further attempts fire. No-op if not running.
    pub async fn disconnect(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(shutdown) = lifecycle.shutdown.take() else {
            return;
        };
        let _ = shutdown.send(true);
        if let Some(task) = lifecycle.task.take() {
            let _ = task.await;
        }
        debug!("realtime client disconnected");
    }

    /// Register a handler and announce the subscription to the server.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> HandlerToken
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let token = self.shared.router.subscribe(topic.clone(), handler);
        self.shared.send_control(Command::Subscribe, &topic);
        token
    }

    /// Announce a topic subscription without attaching a handler.
    pub fn subscribe_topic(&self, topic: impl Into<String>) {
        let topic = topic.into();
        self.shared.router.subscribe_topic(topic.clone());
        self.shared.send_control(Command::Subscribe, &topic);
    }

    /// Remove one handler registration and notify the server.
    pub fn unsubscribe(&self, topic: &str, token: HandlerToken) -> bool {
        let removed = self.shared.router.unsubscribe(topic, token);
        self.shared.send_control(Command::Unsubscribe, topic);
        removed
    }

    /// Drop a topic and all its handlers, and notify the server.
    pub fn unsubscribe_topic(&self, topic: &str) {
        self.shared.router.unsubscribe_topic(topic);
        self.shared.send_control(Command::Unsubscribe, topic);
    }
}

/// Outer connection loop: connect, run the session, retry after the fixed
/// delay on unexpected close or failed open, stop on shutdown.
async fn connection_loop(shared: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    loop {
        let url = shared.connect_url();
        let stream = tokio::select! {
            _ = shutdown.changed() => return,
            result = connect_async(&url) => match result {
                Ok((stream, _)) => Some(stream),
                Err(e) => {
                    debug!("websocket connection to {} failed: {}", shared.ws_url, e);
                    None
                }
            }
        };

        if let Some(stream) = stream {
            run_session(&shared, stream, &mut shutdown).await;
            if *shutdown.borrow() {
                return;
            }
            info!(
                "websocket closed unexpectedly, reconnecting in {:?}",
                shared.reconnect_delay
            );
        }

        tokio::select! {
            _ = shutdown.changed() => return,
            _ = sleep(shared.reconnect_delay) => {}
        }
    }
}

/// Run one open socket until it closes or shutdown is signalled.
async fn run_session(shared: &Shared, stream: WsStream, shutdown: &mut watch::Receiver<bool>) {
    info!("websocket connected to {}", shared.ws_url);
    let (mut sink, mut source) = stream.split();

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ControlFrame>(32);
    *shared.outbound.lock().unwrap() = Some(outbound_tx);

    // Recover server-side registrations for every routed topic.
    let mut healthy = true;
    for topic in shared.router.topics() {
        if !send_control_frame(&mut sink, &ControlFrame::subscribe(topic)).await {
            healthy = false;
            break;
        }
    }

    while healthy {
        tokio::select! {
            _ = shutdown.changed() => break,
            Some(frame) = outbound_rx.recv() => {
                if !send_control_frame(&mut sink, &frame).await {
                    break;
                }
            }
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<PushFrame>(&text) {
                        Ok(frame) => {
                            shared.router.dispatch(&frame.destination, &frame.payload);
                        }
                        Err(e) => warn!("dropping malformed frame: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!("websocket closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("websocket error: {}", e);
                    break;
                }
            }
        }
    }

    *shared.outbound.lock().unwrap() = None;
    let _ = sink.close().await;
    debug!("websocket session ended");
}

/// Returns false when the transport is no longer usable.
async fn send_control_frame(sink: &mut WsSink, frame: &ControlFrame) -> bool {
    match serde_json::to_string(frame) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            error!("failed to serialize control frame: {}", e);
            true
        }
    }
}
