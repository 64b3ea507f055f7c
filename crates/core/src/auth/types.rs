use std::collections::HashMap;

use serde::Serialize;

use crate::config::AuthMethod;

/// User id given to callers that did not name themselves.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Headers of an incoming request, as seen by an authenticator.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    headers: HashMap<String, String>,
}

impl AuthRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Trimmed value of a header, ignoring case. Blank values count as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for AuthRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |request, (name, value)| {
                request.with_header(name.as_ref(), value)
            })
    }
}

/// The caller of a request.
///
/// `user_id` keys the caller's profile in the `users` collection; the profile
/// itself is loaded by the handler that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub method: AuthMethod,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, method: AuthMethod) -> Self {
        Self {
            user_id: user_id.into(),
            method,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_USER, AuthMethod::None)
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id == ANONYMOUS_USER
    }
}
