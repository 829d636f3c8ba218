//! Session notification store.
//!
//! Holds the notification list and the unread/mention counters for one
//! session. Seeded from REST on session start, then mutated by routed push
//! events. Observers watch the store through broadcast channels.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::models::Notification;
use crate::api::ChirperApi;
use crate::realtime::messages::topics;
use crate::realtime::router::HandlerToken;
use crate::realtime::RealtimeClient;

/// Transient user-facing alert describing a notification event.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub title: String,
    pub description: String,
}

impl Toast {
    fn for_notification(notification: &Notification) -> Self {
        Self {
            title: notification.toast_title().to_string(),
            description: notification.toast_description(),
        }
    }
}

/// Store mutation, emitted to observers after the state change applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Seeded,
    NotificationArrived,
    MentionArrived,
    AllRead,
    MentionsRead,
}

#[derive(Default)]
struct State {
    notifications: Vec<Notification>,
    unread_count: usize,
    mentions_count: usize,
}

struct Attachment {
    notifications_topic: String,
    notifications_token: HandlerToken,
    mentions_topic: String,
    mentions_token: HandlerToken,
}

/// Session-wide notification state.
pub struct NotificationStore {
    state: Mutex<State>,
    changes_tx: broadcast::Sender<StoreChange>,
    toasts_tx: broadcast::Sender<Toast>,
    attachment: Mutex<Option<Attachment>>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        let (changes_tx, _) = broadcast::channel(64);
        let (toasts_tx, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(State::default()),
            changes_tx,
            toasts_tx,
            attachment: Mutex::new(None),
        }
    }

    /// Snapshot of the notification list, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().unwrap().notifications.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.state.lock().unwrap().unread_count
    }

    pub fn mentions_count(&self) -> usize {
        self.state.lock().unwrap().mentions_count
    }

    /// Observe store mutations.
    pub fn changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes_tx.subscribe()
    }

    /// Observe transient alerts for arriving notifications.
    pub fn toasts(&self) -> broadcast::Receiver<Toast> {
        self.toasts_tx.subscribe()
    }

    /// Reset to the fetched baseline: the current notification list and the
    /// counters carried by the current user. Each fetch failure is logged
    /// and leaves that part of the baseline empty.
    pub async fn seed(&self, api: &dyn ChirperApi) {
        {
            let mut state = self.state.lock().unwrap();
            *state = State::default();
        }

        match api.notifications().await {
            Ok(notifications) => {
                self.state.lock().unwrap().notifications = notifications;
            }
            Err(e) => warn!("failed to fetch notifications: {}", e),
        }

        match api.current_user().await {
            Ok(auth) => {
                let mut state = self.state.lock().unwrap();
                state.unread_count = auth.user.notifications_count;
                state.mentions_count = auth.user.mentions_count;
            }
            Err(e) => warn!("failed to fetch current user: {}", e),
        }

        let _ = self.changes_tx.send(StoreChange::Seeded);
    }

    /// Prepend an arriving notification, bump the unread counter and emit
    /// the matching toast.
    pub fn apply_notification(&self, notification: Notification) {
        let toast = Toast::for_notification(&notification);
        {
            let mut state = self.state.lock().unwrap();
            state.notifications.insert(0, notification);
            state.unread_count += 1;
        }
        let _ = self.toasts_tx.send(toast);
        let _ = self.changes_tx.send(StoreChange::NotificationArrived);
    }

    /// Bump the mention counter. The notification list is untouched.
    pub fn apply_mention(&self) {
        self.state.lock().unwrap().mentions_count += 1;
        let _ = self.changes_tx.send(StoreChange::MentionArrived);
    }

    /// Local-only: the server is not informed.
    pub fn mark_all_as_read(&self) {
        self.state.lock().unwrap().unread_count = 0;
        let _ = self.changes_tx.send(StoreChange::AllRead);
    }

    /// Local-only: the server is not informed.
    pub fn mark_mentions_as_read(&self) {
        self.state.lock().unwrap().mentions_count = 0;
        let _ = self.changes_tx.send(StoreChange::MentionsRead);
    }

    /// Register the store's handlers on the session's notification and
    /// mention topics.
    pub fn attach(self: &Arc<Self>, client: &RealtimeClient, user_id: u64) {
        let mut attachment = self.attachment.lock().unwrap();
        if attachment.is_some() {
            warn!("store already attached, ignoring attach()");
            return;
        }

        let notifications_topic = topics::notifications(user_id);
        let mentions_topic = topics::mentions(user_id);

        let store = Arc::clone(self);
        let notifications_token = client.subscribe(notifications_topic.clone(), move |payload| {
            match serde_json::from_value::<Notification>(payload.clone()) {
                Ok(notification) => store.apply_notification(notification),
                Err(e) => warn!("dropping malformed notification payload: {}", e),
            }
        });

        let store = Arc::clone(self);
        let mentions_token = client.subscribe(mentions_topic.clone(), move |_| {
            store.apply_mention();
        });

        *attachment = Some(Attachment {
            notifications_topic,
            notifications_token,
            mentions_topic,
            mentions_token,
        });
        debug!("notification store attached for user {}", user_id);
    }

    /// Unregister the store's handlers. No-op if not attached.
    pub fn detach(&self, client: &RealtimeClient) {
        let Some(attachment) = self.attachment.lock().unwrap().take() else {
            return;
        };
        client.unsubscribe(
            &attachment.notifications_topic,
            attachment.notifications_token,
        );
        client.unsubscribe(&attachment.mentions_topic, attachment.mentions_token);
        debug!("notification store detached");
    }
}
