use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend rejected the bearer credential of a protected call.
    #[error("session expired or credential rejected")]
    Unauthenticated,
    #[error("not logged in")]
    NotLoggedIn,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("server url must start with http:// or https://, got {0}://")]
    UnsupportedScheme(String),
    #[error("credential storage failure: {0}")]
    Credentials(#[from] std::io::Error),
}

impl ClientError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
