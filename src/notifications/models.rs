//! Notification data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::api::models::{SimpleUser, Tweet};

/// Notification type, tagged on the wire with the uppercase name.
///
/// Unrecognized values decode to `Other` so a new server-side type never
/// breaks frame handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Like,
    Retweet,
    Reply,
    Follow,
    Mention,
    Tweet,
    Lists,
    Other,
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "LIKE" => Self::Like,
            "RETWEET" => Self::Retweet,
            "REPLY" => Self::Reply,
            "FOLLOW" => Self::Follow,
            "MENTION" => Self::Mention,
            "TWEET" => Self::Tweet,
            "LISTS" => Self::Lists,
            _ => Self::Other,
        })
    }
}

/// List referenced by a LISTS notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub id: u64,
    pub list_name: String,
}

/// A single notification. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub notification_type: NotificationType,
    pub user: SimpleUser,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<Tweet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<NotificationList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_added_to_list: Option<bool>,
    pub date: DateTime<Utc>,
}

impl Notification {
    /// Title of the transient alert shown when this notification arrives.
    pub fn toast_title(&self) -> &'static str {
        match self.notification_type {
            NotificationType::Like => "New Like",
            NotificationType::Retweet => "New Retweet",
            NotificationType::Reply => "New Reply",
            NotificationType::Follow => "New Follower",
            NotificationType::Mention => "New Mention",
            NotificationType::Tweet => "New Tweet",
            NotificationType::Lists => "List Update",
            NotificationType::Other => "New Notification",
        }
    }

    /// Description of the transient alert shown when this notification
    /// arrives.
    pub fn toast_description(&self) -> String {
        let username = &self.user.username;
        match self.notification_type {
            NotificationType::Like => format!("@{} liked your tweet", username),
            NotificationType::Retweet => format!("@{} retweeted your tweet", username),
            NotificationType::Reply => format!("@{} replied to your tweet", username),
            NotificationType::Follow => format!("@{} followed you", username),
            NotificationType::Mention => format!("@{} mentioned you in a tweet", username),
            NotificationType::Tweet => format!("@{} posted a new tweet", username),
            NotificationType::Lists => {
                let list_name = self
                    .list
                    .as_ref()
                    .map(|list| list.list_name.as_str())
                    .unwrap_or_default();
                if self.is_added_to_list.unwrap_or(false) {
                    format!("@{} added you to list {}", username, list_name)
                } else {
                    format!("@{} removed you from list {}", username, list_name)
                }
            }
            NotificationType::Other => "You have a new notification".to_string(),
        }
    }
}
