//! Typed REST collaborators.
//!
//! The core consumes the backend through the [`ChirperApi`] trait so tests
//! can substitute a fake; [`HttpApi`] is the production implementation.

mod http;
pub mod models;

pub use http::HttpApi;
pub use models::{
    AuthResponse, AuthorRef, Chat, ChatMessage, ChatParticipant, ChatRef, LoginRequest,
    SimpleUser, Tweet, TweetAuthor, User,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::notifications::models::Notification;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected request with status {status}: {message}")]
    Status { status: u16, message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Request surface of the backend consumed by the session core.
#[async_trait]
pub trait ChirperApi: Send + Sync {
    /// Set or clear the bearer token used by subsequent requests.
    fn set_auth_token(&self, token: Option<String>);

    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse>;

    /// The user owning the current token, with baseline counters.
    async fn current_user(&self) -> ApiResult<AuthResponse>;

    async fn user_by_id(&self, user_id: u64) -> ApiResult<User>;

    /// Current notification list, newest first.
    async fn notifications(&self) -> ApiResult<Vec<Notification>>;

    /// Tweets mentioning the current user, newest first.
    async fn mentions(&self) -> ApiResult<Vec<Tweet>>;

    async fn tweets(&self, page: usize, size: usize) -> ApiResult<Vec<Tweet>>;

    async fn chats(&self) -> ApiResult<Vec<Chat>>;
}
