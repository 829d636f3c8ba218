//! REST resource models.
//!
//! Wire shapes for the auth, user, tweet and chat resources. Field names are
//! camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credentials for the login request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by login and by the current-user lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// The authenticated user's full profile.
///
/// `notifications_count` and `mentions_count` seed the session's unread
/// counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub email: String,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub avatar: String,
    pub registration_date: DateTime<Utc>,
    #[serde(default)]
    pub tweet_count: u64,
    #[serde(default)]
    pub notifications_count: usize,
    #[serde(default)]
    pub mentions_count: usize,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub unread_messages_count: u64,
    #[serde(default)]
    pub is_private_profile: bool,
}

/// Compact user representation embedded in tweets and notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleUser {
    pub id: u64,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private_profile: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_follower: Option<bool>,
}

/// Tweet author embedded in a tweet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetAuthor {
    pub id: u64,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub avatar: String,
}

/// A tweet, as returned by the feed and mention endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: TweetAuthor,
    #[serde(default)]
    pub retweets_count: u64,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub replies_count: u64,
    #[serde(default)]
    pub is_tweet_liked: bool,
    #[serde(default)]
    pub is_tweet_retweeted: bool,
}

/// Direct message conversation participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatParticipant {
    pub id: u64,
    pub full_name: String,
    pub username: String,
    #[serde(default)]
    pub avatar: String,
}

/// Reference to the chat a message belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: u64,
}

/// Reference to the author of a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: u64,
}

/// A single direct message, also the payload of chat push frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorRef,
    pub chat: ChatRef,
}

/// A direct message conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<ChatParticipant>,
    #[serde(default)]
    pub unread_messages_count: u64,
}
