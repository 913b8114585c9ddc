//! Signed-in identity: restored once at startup from the persisted token,
//! replaced on login, dropped on logout or when the backend rejects the token.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use shared::{
    domain::User,
    protocol::{LoginRequest, LoginResponse, PasswordUpdate, ProfileUpdate, RegisterRequest},
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    credentials::CredentialStore,
    error::{ClientError, Result},
    transport::{ApiClient, ClientEvent, OnUnauthorized},
};

const LOGIN_PATH: &str = "auth/login";
const ME_PATH: &str = "auth/me";
const REGISTER_PATH: &str = "auth/register";
const PASSWORD_PATH: &str = "auth/user/password";
const PROFILE_PATH: &str = "auth/user/profile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    /// True until the startup restore has finished.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

pub struct SessionStore {
    api: Arc<ApiClient>,
    credentials: Arc<dyn CredentialStore>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new(api: Arc<ApiClient>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            api,
            credentials,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn require_user(&self) -> Result<User> {
        self.current_user().await.ok_or(ClientError::NotLoggedIn)
    }

    /// Resolves the identity behind the persisted token. Loading is over when
    /// this returns, whatever the outcome; any failure discards the token.
    pub async fn restore(&self) -> Result<Option<User>> {
        let token = match self.credentials.load().await {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %err, "could not read persisted credential");
                None
            }
        };
        let Some(token) = token else {
            self.finish(None).await;
            return Ok(None);
        };

        if token_expired(&token, Utc::now()) {
            info!("persisted credential already expired; discarding");
            self.discard_credential().await;
            self.finish(None).await;
            return Ok(None);
        }

        self.api.set_credential(Some(token)).await;
        match self.api.get_json::<User>(ME_PATH).await {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "session restored");
                self.finish(Some(user.clone())).await;
                Ok(Some(user))
            }
            Err(err) => {
                warn!(error = %err, "session restore failed; discarding credential");
                self.api.set_credential(None).await;
                self.discard_credential().await;
                self.finish(None).await;
                Err(err)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self
            .api
            .execute(Method::POST, LOGIN_PATH, Some(&request), OnUnauthorized::Reject)
            .await?
            .json()
            .await?;

        self.credentials.save(&response.access_token).await?;
        self.api.set_credential(Some(response.access_token)).await;

        let user: User = self.api.get_json(ME_PATH).await?;
        info!(user_id = %user.id, email = %user.email, "logged in");
        self.finish(Some(user.clone())).await;
        Ok(user)
    }

    pub async fn logout(&self) -> Result<()> {
        self.api.set_credential(None).await;
        self.finish(None).await;
        self.credentials.clear().await?;
        info!("logged out");
        Ok(())
    }

    /// Account creation. Needs the backend's admin password; does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.api
            .execute(Method::POST, REGISTER_PATH, Some(request), OnUnauthorized::Reject)
            .await?;
        info!(email = %request.email, "account registered");
        Ok(())
    }

    pub async fn update_profile(&self, username: &str) -> Result<User> {
        self.require_user().await?;
        self.api
            .put_json(
                PROFILE_PATH,
                &ProfileUpdate {
                    username: username.trim().to_string(),
                },
            )
            .await?;
        let user: User = self.api.get_json(ME_PATH).await?;
        self.finish(Some(user.clone())).await;
        Ok(user)
    }

    /// A wrong old password comes back as 401 and must not end the session.
    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        self.require_user().await?;
        let body = PasswordUpdate {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.api
            .execute(Method::PUT, PASSWORD_PATH, Some(&body), OnUnauthorized::Reject)
            .await?;
        info!("password changed");
        Ok(())
    }

    pub async fn handle_event(&self, event: &ClientEvent) {
        if matches!(event, ClientEvent::SessionExpired) {
            self.expire().await;
        }
    }

    /// Drops identity and the persisted token after the backend rejected it.
    pub async fn expire(&self) {
        if self.current_user().await.is_some() {
            info!("session expired");
        }
        self.api.set_credential(None).await;
        self.discard_credential().await;
        self.finish(None).await;
    }

    async fn finish(&self, user: Option<User>) {
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.user != user;
            state.user = user.clone();
            state.loading = false;
            changed
        };
        if changed {
            self.api.emit(ClientEvent::SessionChanged(user));
        }
    }

    async fn discard_credential(&self) {
        if let Err(err) = self.credentials.clear().await {
            warn!(error = %err, "could not clear persisted credential");
        }
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

/// Reads the `exp` claim without verifying the signature; the backend stays
/// the authority. Tokens that cannot be decoded are left for the backend to
/// judge.
pub fn token_expired(token: &str, now: DateTime<Utc>) -> bool {
    let Some(payload) = token.split('.').nth(1) else {
        return false;
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) else {
        return false;
    };
    match serde_json::from_slice::<ExpiryClaim>(&bytes) {
        Ok(ExpiryClaim { exp: Some(exp) }) => exp <= now.timestamp(),
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
