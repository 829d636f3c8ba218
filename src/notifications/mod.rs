//! Session notifications: models, counters and the observable store.

pub mod models;
pub mod store;

pub use models::{Notification, NotificationList, NotificationType};
pub use store::{NotificationStore, StoreChange, Toast};
