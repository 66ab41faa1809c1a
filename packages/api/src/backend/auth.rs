use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::response_error;
use crate::config::PublicConfig;
use crate::error::BackendError;
use crate::types::{Session, User};

/// Tokens this close to expiry are refreshed before being handed out.
pub const REFRESH_LEEWAY_SECS: i64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

#[async_trait(?Send)]
pub trait AuthApi {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), BackendError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError>;
    /// Clears the local session unconditionally; the backend logout call is
    /// best-effort.
    async fn sign_out(&self);
    async fn current_user(&self) -> Result<Option<User>, BackendError>;
    /// Bearer token guaranteed not to be expired, refreshed if needed.
    /// `None` means there is no usable session.
    async fn fresh_access_token(&self) -> Result<Option<String>, BackendError>;
}

/// Client for the platform's auth service (`{base}/auth/v1`).
pub struct AuthClient {
    http: reqwest::Client,
    endpoint: String,
    anon_key: String,
    session: Mutex<Option<Session>>,
    listeners: Mutex<Vec<UnboundedSender<AuthEvent>>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
            user: self.user,
        }
    }
}

impl AuthClient {
    pub fn new(http: reqwest::Client, config: &PublicConfig) -> Self {
        Self {
            http,
            endpoint: config.auth_endpoint(),
            anon_key: config.anon_key.clone(),
            session: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Stream of auth state changes (sign-in, sign-out, token refresh).
    /// Every event should trigger a fresh identity resolution.
    pub fn subscribe(&self) -> UnboundedReceiver<AuthEvent> {
        let (tx, rx) = unbounded();
        self.listeners().push(tx);
        rx
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session_slot().clone()
    }

    /// Adopt a session persisted by a previous page load.
    pub fn restore_session(&self, session: Session) {
        debug!("auth.restore_session: user_id={}", session.user.id);
        *self.session_slot() = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session));
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().expect("session lock poisoned")
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<UnboundedSender<AuthEvent>>> {
        self.listeners.lock().expect("listener lock poisoned")
    }

    fn emit(&self, event: AuthEvent) {
        self.listeners()
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    async fn refresh(&self, refresh_token: String) -> Result<Session, BackendError> {
        let resp = self
            .http
            .post(format!("{}/token?grant_type=refresh_token", self.endpoint))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }

        let session = resp.json::<TokenResponse>().await?.into_session();
        *self.session_slot() = Some(session.clone());
        debug!("auth.refresh: token renewed user_id={}", session.user.id);
        self.emit(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }
}

fn email_label(email: &str) -> String {
    let domain = email.split('@').nth(1).unwrap_or("invalid");
    format!("{domain} (len={})", email.len())
}

#[async_trait(?Send)]
impl AuthApi for AuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), BackendError> {
        info!("auth.sign_up: email={}", email_label(email));
        let resp = self
            .http
            .post(format!("{}/signup", self.endpoint))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }
        // No session yet: the account is pending email confirmation.
        info!("auth.sign_up: pending confirmation");
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        info!("auth.sign_in: email={}", email_label(email));
        let resp = self
            .http
            .post(format!("{}/token?grant_type=password", self.endpoint))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }

        let session = resp.json::<TokenResponse>().await?.into_session();
        *self.session_slot() = Some(session.clone());
        info!("auth.sign_in: success user_id={}", session.user.id);
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) {
        let session = self.session_slot().take();
        if let Some(s) = session {
            let res = self
                .http
                .post(format!("{}/logout", self.endpoint))
                .header("apikey", &self.anon_key)
                .bearer_auth(&s.access_token)
                .send()
                .await;
            if let Err(e) = res {
                warn!("auth.sign_out: logout request failed: {e}");
            }
        }
        info!("auth.sign_out: local session cleared");
        self.emit(AuthEvent::SignedOut);
    }

    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        let Some(token) = self.fresh_access_token().await? else {
            return Ok(None);
        };

        let resp = self
            .http
            .get(format!("{}/user", self.endpoint))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            debug!("auth.current_user: token rejected, dropping session");
            *self.session_slot() = None;
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(response_error(resp).await);
        }

        Ok(Some(resp.json::<User>().await?))
    }

    async fn fresh_access_token(&self) -> Result<Option<String>, BackendError> {
        let Some(session) = self.current_session() else {
            return Ok(None);
        };

        if !session.expires_within(REFRESH_LEEWAY_SECS) {
            return Ok(Some(session.access_token));
        }

        debug!("auth.fresh_access_token: token near expiry, refreshing");
        match self.refresh(session.refresh_token).await {
            Ok(renewed) => Ok(Some(renewed.access_token)),
            Err(e) => {
                warn!("auth.fresh_access_token: refresh failed: {e}");
                *self.session_slot() = None;
                self.emit(AuthEvent::SignedOut);
                Ok(None)
            }
        }
    }
}
