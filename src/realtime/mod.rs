//! Realtime push infrastructure.
//!
//! One WebSocket connection per session multiplexes all logical topic
//! streams. The router fans inbound frames out to subscribers; the client
//! owns the socket lifecycle and keeps server-side subscriptions in sync.

pub mod client;
pub mod messages;
pub mod router;

pub use client::{RealtimeClient, DEFAULT_RECONNECT_DELAY};
pub use messages::{topics, Command, ControlFrame, PushFrame};
pub use router::{HandlerToken, TopicRouter};
