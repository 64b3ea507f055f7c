//! Caller identification for the HTTP API.
//!
//! `none` trusts an `X-User-Id` header set by a fronting proxy; `api_key`
//! maps configured keys to the user ids they were issued to.

mod api_key;
mod none;
mod traits;
mod types;

pub use api_key::*;
pub use none::*;
pub use traits::*;
pub use types::*;

use std::sync::Arc;

use crate::config::{AuthConfig, AuthMethod};

/// Build the authenticator selected by `[auth] method`.
pub fn create_authenticator(config: &AuthConfig) -> Result<Arc<dyn Authenticator>, AuthError> {
    let authenticator: Arc<dyn Authenticator> = match config.method {
        AuthMethod::None => Arc::new(NoneAuthenticator::new()),
        AuthMethod::ApiKey if config.api_keys.is_empty() => {
            return Err(AuthError::Misconfigured(
                "api_key auth needs at least one entry in [auth.api_keys]".to_string(),
            ));
        }
        AuthMethod::ApiKey => Arc::new(ApiKeyAuthenticator::new(config.api_keys.clone())),
    };

    tracing::debug!(
        method = config.method.as_str(),
        keys = config.api_keys.len(),
        "Authenticator created"
    );
    Ok(authenticator)
}
