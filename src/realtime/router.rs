//! Topic router.
//!
//! Maps topic names to ordered handler registrations and dispatches inbound
//! push frames to every handler subscribed to the frame's destination.
//! Registrations are identified by token, so removing one handler never
//! disturbs the others.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use tracing::warn;
use uuid::Uuid;

type HandlerFn = dyn Fn(&serde_json::Value) + Send + Sync;

/// Identifies a single handler registration for precise removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerToken(Uuid);

struct Registration {
    token: HandlerToken,
    handler: Arc<HandlerFn>,
}

/// Routes inbound frames to topic subscribers.
///
/// Handlers for one topic run in registration order. Topics registered
/// without a handler are still tracked, so the connection re-announces them
/// to the server after a reconnect.
#[derive(Default)]
pub struct TopicRouter {
    topics: RwLock<HashMap<String, Vec<Registration>>>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a topic. Every call creates a distinct
    /// registration; the returned token removes exactly that one.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> HandlerToken
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        let token = HandlerToken(Uuid::new_v4());
        let mut topics = self.topics.write().unwrap();
        topics.entry(topic.into()).or_default().push(Registration {
            token,
            handler: Arc::new(handler),
        });
        token
    }

    /// Mark a topic subscribed without attaching a handler.
    pub fn subscribe_topic(&self, topic: impl Into<String>) {
        self.topics.write().unwrap().entry(topic.into()).or_default();
    }

    /// Remove one registration. Returns false if the token was not
    /// registered for this topic. The topic itself is dropped once its last
    /// handler is removed.
    pub fn unsubscribe(&self, topic: &str, token: HandlerToken) -> bool {
        let mut topics = self.topics.write().unwrap();
        let Some(registrations) = topics.get_mut(topic) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|r| r.token != token);
        let removed = registrations.len() != before;
        if removed && registrations.is_empty() {
            topics.remove(topic);
        }
        removed
    }

    /// Remove a topic and all its registrations.
    pub fn unsubscribe_topic(&self, topic: &str) {
        self.topics.write().unwrap().remove(topic);
    }

    /// Invoke every handler registered for `topic`, in registration order.
    ///
    /// A panicking handler is logged and skipped; the remaining handlers
    /// still run. Returns the number of handlers that completed.
    pub fn dispatch(&self, topic: &str, payload: &serde_json::Value) -> usize {
        let handlers: Vec<Arc<HandlerFn>> = {
            let topics = self.topics.read().unwrap();
            match topics.get(topic) {
                Some(registrations) => registrations.iter().map(|r| r.handler.clone()).collect(),
                None => return 0,
            }
        };

        let mut completed = 0;
        for handler in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(()) => completed += 1,
                Err(_) => warn!("subscriber panicked while handling frame on {}", topic),
            }
        }
        completed
    }

    /// Names of all currently subscribed topics.
    pub fn topics(&self) -> Vec<String> {
        self.topics.read().unwrap().keys().cloned().collect()
    }

    /// Whether the topic has at least one registration or marker entry.
    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.topics.read().unwrap().contains_key(topic)
    }

    /// Number of handlers registered for a topic.
    #[allow(dead_code)] // Useful for testing/debugging
    pub fn handler_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .unwrap()
            .get(topic)
            .map(|registrations| registrations.len())
            .unwrap_or(0)
    }
}
