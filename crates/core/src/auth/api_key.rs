//! API Key authentication.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};
use crate::config::AuthMethod;

/// Authenticator that resolves API keys to the user ids they were issued to.
///
/// Accepts the key in either:
/// - `Authorization: Bearer <key>` header
/// - `X-API-Key: <key>` header
pub struct ApiKeyAuthenticator {
    keys: Vec<(String, String)>,
}

impl ApiKeyAuthenticator {
    /// Create from a key -> user id table.
    pub fn new(keys: HashMap<String, String>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Bearer token first, then `X-API-Key`.
    fn extract_key<'a>(&self, request: &'a AuthRequest) -> Option<&'a str> {
        let bearer = request.header("authorization").and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
                .map(str::trim)
        });

        bearer
            .filter(|key| !key.is_empty())
            .or_else(|| request.header("x-api-key"))
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let provided_key = self
            .extract_key(request)
            .ok_or(AuthError::MissingCredentials)?;

        // Compare against every key so the lookup time doesn't depend on which one matched
        let mut matched: Option<&str> = None;
        for (key, user_id) in &self.keys {
            if constant_time_eq(provided_key.as_bytes(), key.as_bytes()) {
                matched = Some(user_id.as_str());
            }
        }

        match matched {
            Some(user_id) => Ok(Identity::new(user_id, AuthMethod::ApiKey)),
            None => Err(AuthError::UnknownKey),
        }
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::ApiKey
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
