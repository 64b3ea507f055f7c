use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity};
use crate::config::AuthMethod;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No API key presented")]
    MissingCredentials,

    #[error("Unknown API key")]
    UnknownKey,

    #[error("Authentication is misconfigured: {0}")]
    Misconfigured(String),
}

impl AuthError {
    /// Label for the auth failure counter.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials => "missing_credentials",
            AuthError::UnknownKey => "unknown_key",
            AuthError::Misconfigured(_) => "misconfigured",
        }
    }

    /// True when the caller, not the server, is at fault.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AuthError::Misconfigured(_))
    }
}

/// Names the user behind a request.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    fn method(&self) -> AuthMethod;
}
