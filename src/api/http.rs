//! HTTP implementation of the REST collaborators.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::models::{AuthResponse, Chat, LoginRequest, Tweet, User};
use super::{ApiError, ApiResult, ChirperApi};
use crate::notifications::models::Notification;

/// Backend client speaking JSON over HTTP with bearer authentication.
pub struct HttpApi {
    client: Client,
    base_url: String,
    auth_token: Mutex<Option<String>>,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
            auth_token: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth_token.lock().unwrap().as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl ChirperApi for HttpApi {
    fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.lock().unwrap() = token;
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthResponse> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn current_user(&self) -> ApiResult<AuthResponse> {
        self.get_json("/user/token").await
    }

    async fn user_by_id(&self, user_id: u64) -> ApiResult<User> {
        self.get_json(&format!("/user/{}", user_id)).await
    }

    async fn notifications(&self) -> ApiResult<Vec<Notification>> {
        self.get_json("/notification/user").await
    }

    async fn mentions(&self) -> ApiResult<Vec<Tweet>> {
        self.get_json("/notification/mentions").await
    }

    async fn tweets(&self, page: usize, size: usize) -> ApiResult<Vec<Tweet>> {
        self.get_json(&format!("/tweets?page={}&size={}", page, size))
            .await
    }

    async fn chats(&self) -> ApiResult<Vec<Chat>> {
        self.get_json("/chat/users").await
    }
}
