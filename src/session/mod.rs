//! Authenticated session boundary.
//!
//! Derives the auth state from the persisted credential, owns the realtime
//! connection lifecycle (connect on entering the authenticated state,
//! disconnect on leaving it) and gates navigation while signed out.

pub mod credentials;

pub use credentials::{CredentialStore, StoredCredential};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::models::LoginRequest;
use crate::api::{ApiError, ChirperApi};
use crate::config::AppConfig;
use crate::notifications::NotificationStore;
use crate::realtime::messages::topics;
use crate::realtime::{RealtimeClient, TopicRouter};

/// Authentication state of the session.
///
/// `Unknown` is the initial state while the persisted credential has not
/// been checked yet; the UI renders a neutral loading indicator and no
/// socket activity happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Where a navigation attempt is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Login,
    Protected,
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDecision {
    /// Credential check still pending, keep showing the loading state.
    Hold,
    Proceed,
    RedirectToLogin,
}

/// One signed-in (or signed-out) application session.
///
/// Explicitly constructed and passed down; owns the store, the credential
/// file and, while authenticated, the realtime connection.
pub struct Session {
    api: Arc<dyn ChirperApi>,
    notifications: Arc<NotificationStore>,
    credentials: CredentialStore,
    realtime: Mutex<Option<Arc<RealtimeClient>>>,
    user_id: Mutex<Option<u64>>,
    auth_tx: watch::Sender<AuthState>,
    ws_url: String,
    reconnect_delay: Duration,
}

impl Session {
    pub fn new(config: &AppConfig, api: Arc<dyn ChirperApi>) -> Self {
        let (auth_tx, _) = watch::channel(AuthState::Unknown);
        Self {
            api,
            notifications: Arc::new(NotificationStore::new()),
            credentials: CredentialStore::new(config.credentials_path.clone()),
            realtime: Mutex::new(None),
            user_id: Mutex::new(None),
            auth_tx,
            ws_url: config.ws_url.clone(),
            reconnect_delay: config.reconnect_delay,
        }
    }

    pub fn auth_state(&self) -> AuthState {
        *self.auth_tx.borrow()
    }

    /// Observe auth state transitions.
    pub fn subscribe_auth(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }

    pub fn notifications(&self) -> &Arc<NotificationStore> {
        &self.notifications
    }

    /// The realtime client, while authenticated.
    pub fn realtime(&self) -> Option<Arc<RealtimeClient>> {
        self.realtime.lock().unwrap().clone()
    }

    pub fn user_id(&self) -> Option<u64> {
        *self.user_id.lock().unwrap()
    }

    /// Check the persisted credential and enter the matching state. A found
    /// credential brings the session up: store seeded and attached, topics
    /// subscribed, connection started.
    pub async fn resolve(&self) -> AuthState {
        match self.credentials.load() {
            Some(credential) => {
                info!("found persisted credential for user {}", credential.user_id);
                self.enter_authenticated(credential).await;
                AuthState::Authenticated
            }
            None => {
                self.auth_tx.send_replace(AuthState::Unauthenticated);
                AuthState::Unauthenticated
            }
        }
    }

    /// Authenticate against the backend, persist the credential and enter
    /// the authenticated state.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let auth = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        let credential = StoredCredential {
            token: auth.token,
            user_id: auth.user.id,
        };
        if let Err(e) = self.credentials.save(&credential) {
            warn!("failed to persist credential: {}", e);
        }
        self.enter_authenticated(credential).await;
        Ok(())
    }

    /// Leave the authenticated state and clear the persisted credential.
    pub async fn logout(&self) {
        self.leave_authenticated().await;
        if let Err(e) = self.credentials.clear() {
            warn!("failed to clear credential: {}", e);
        }
        self.api.set_auth_token(None);
    }

    /// Explicit teardown: disconnect without touching the credential, so the
    /// next start resumes the session.
    pub async fn shutdown(&self) {
        self.leave_authenticated().await;
    }

    /// Gate a navigation attempt against the current auth state. Moving to
    /// the login surface while authenticated exits the authenticated state;
    /// the credential stays persisted.
    pub async fn navigate(&self, target: NavTarget) -> NavDecision {
        match (self.auth_state(), target) {
            (AuthState::Unknown, _) => NavDecision::Hold,
            (AuthState::Authenticated, NavTarget::Login) => {
                self.leave_authenticated().await;
                NavDecision::Proceed
            }
            (AuthState::Authenticated, NavTarget::Protected) => NavDecision::Proceed,
            (AuthState::Unauthenticated, NavTarget::Login) => NavDecision::Proceed,
            (AuthState::Unauthenticated, NavTarget::Protected) => NavDecision::RedirectToLogin,
        }
    }

    async fn enter_authenticated(&self, credential: StoredCredential) {
        self.api.set_auth_token(Some(credential.token.clone()));
        *self.user_id.lock().unwrap() = Some(credential.user_id);

        let router = Arc::new(TopicRouter::new());
        let client = Arc::new(RealtimeClient::with_reconnect_delay(
            self.ws_url.clone(),
            Some(credential.token),
            router,
            self.reconnect_delay,
        ));

        self.notifications.seed(self.api.as_ref()).await;
        self.notifications.attach(&client, credential.user_id);
        client.subscribe_topic(topics::FEED);
        client.subscribe_topic(topics::chat(credential.user_id));
        client.connect().await;

        *self.realtime.lock().unwrap() = Some(client);
        self.auth_tx.send_replace(AuthState::Authenticated);
    }

    async fn leave_authenticated(&self) {
        let client = self.realtime.lock().unwrap().take();
        if let Some(client) = client {
            self.notifications.detach(&client);
            client.disconnect().await;
        }
        *self.user_id.lock().unwrap() = None;
        self.auth_tx.send_replace(AuthState::Unauthenticated);
    }
}
