use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};
use crate::config::AuthMethod;

/// Header carrying the user id when no credentials are checked.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticator that trusts the caller-supplied `X-User-Id` header.
///
/// Meant for local development or for deployments where an upstream proxy
/// has already signed the user in. Requests without the header are anonymous.
pub struct NoneAuthenticator;

impl NoneAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoneAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        Ok(request
            .header(USER_ID_HEADER)
            .map(|user_id| Identity::new(user_id, AuthMethod::None))
            .unwrap_or_else(Identity::anonymous))
    }

    fn method(&self) -> AuthMethod {
        AuthMethod::None
    }
}
