//! Realtime wire envelopes.
//!
//! Defines the JSON frame formats exchanged over the push channel. Control
//! frames (client -> server) register and drop topic subscriptions; push
//! frames (server -> client) carry a topic destination and an opaque payload
//! routed to subscribers.

use serde::{Deserialize, Serialize};

/// Subscription control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Subscribe,
    Unsubscribe,
}

/// Client -> Server control frame.
///
/// Sent to register or drop interest in a topic on the server side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFrame {
    pub command: Command,
    pub destination: String,
}

impl ControlFrame {
    pub fn subscribe(destination: impl Into<String>) -> Self {
        Self {
            command: Command::Subscribe,
            destination: destination.into(),
        }
    }

    pub fn unsubscribe(destination: impl Into<String>) -> Self {
        Self {
            command: Command::Unsubscribe,
            destination: destination.into(),
        }
    }
}

/// Server -> Client push frame.
///
/// The `destination` is used for routing; the payload shape depends on the
/// topic and is decoded by the subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushFrame {
    pub destination: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Topic name builders.
///
/// Per-user topics are derived from the session's user id at subscribe time.
pub mod topics {
    /// Global feed stream, shared by all users.
    pub const FEED: &str = "/topic/feed";

    /// Per-user notification stream.
    pub fn notifications(user_id: u64) -> String {
        format!("/topic/notifications/{}", user_id)
    }

    /// Per-user mention stream.
    pub fn mentions(user_id: u64) -> String {
        format!("/topic/mentions/{}", user_id)
    }

    /// Per-user direct message stream.
    pub fn chat(user_id: u64) -> String {
        format!("/topic/chat/{}", user_id)
    }
}
