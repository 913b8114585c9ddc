use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::{domain::User, error::ApiError};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A protected call came back 401; the credential has been dropped.
    SessionExpired,
    SessionChanged(Option<User>),
    StoreRefreshed {
        resource: &'static str,
        generation: u64,
        len: usize,
    },
    StoreFailed {
        resource: &'static str,
        message: String,
    },
}

/// What a 401 means for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnUnauthorized {
    /// Protected call: the credential is stale, expire the session.
    ExpireSession,
    /// Credential check (login, password change): report it as an api error.
    Reject,
}

pub struct ApiClient {
    http: Client,
    base_url: Url,
    credential: RwLock<Option<String>>,
    events: broadcast::Sender<ClientEvent>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url.trim())?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::UnsupportedScheme(base_url.scheme().to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let (events, _) = broadcast::channel(256);
        Ok(Self {
            http,
            base_url,
            credential: RwLock::new(None),
            events,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn set_credential(&self, token: Option<String>) {
        *self.credential.write().await = token;
    }

    pub async fn has_credential(&self) -> bool {
        self.credential.read().await.is_some()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        // No receivers is fine: nobody is watching yet.
        let _ = self.events.send(event);
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .execute::<()>(Method::GET, path, None, OnUnauthorized::ExpireSession)
            .await?;
        Ok(response.json().await?)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(Method::POST, path, Some(body), OnUnauthorized::ExpireSession)
            .await?;
        Ok(response.json().await?)
    }

    /// POST whose response body is not needed.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.execute(Method::POST, path, Some(body), OnUnauthorized::ExpireSession)
            .await?;
        Ok(())
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.execute(Method::PUT, path, Some(body), OnUnauthorized::ExpireSession)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute::<()>(Method::DELETE, path, None, OnUnauthorized::ExpireSession)
            .await?;
        Ok(())
    }

    pub(crate) async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        on_unauthorized: OnUnauthorized,
    ) -> Result<Response> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "api request");
        let mut request: RequestBuilder = self.http.request(method.clone(), url);
        if let Some(token) = self.credential.read().await.as_deref() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED && on_unauthorized == OnUnauthorized::ExpireSession {
            info!(%method, path, "credential rejected; expiring session");
            self.set_credential(None).await;
            self.emit(ClientEvent::SessionExpired);
            return Err(ClientError::Unauthenticated);
        }

        let error = ApiError::from_status(status.as_u16(), &text);
        warn!(%method, path, status = status.as_u16(), error = %error.message, "api request failed");
        Err(error.into())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
