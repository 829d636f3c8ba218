//! Chirper client core.
//!
//! The non-visual half of the Chirper social-networking client: the realtime
//! push layer (one WebSocket multiplexing per-user notification, mention,
//! chat and global feed topics), the session notification store reconciling
//! push events with REST-fetched state, and the authenticated session
//! boundary that gates the connection lifecycle. A UI layer consumes this
//! crate through the session object and the store's observer channels.

pub mod api;
pub mod config;
pub mod notifications;
pub mod realtime;
pub mod session;

// Re-export commonly used types for convenience
pub use api::{ChirperApi, HttpApi};
pub use notifications::{Notification, NotificationStore, NotificationType, Toast};
pub use realtime::{RealtimeClient, TopicRouter};
pub use session::{AuthState, NavDecision, NavTarget, Session};
