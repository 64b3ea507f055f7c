//! Reporter profiles from the `users` collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::store::{Collection, DocumentStore, DocumentStoreError};
use crate::ticket::PersonRef;

/// Field on the user document listing the tickets a user reported.
pub const MY_TICKETS_FIELD: &str = "myTickets";

#[derive(Debug, Error)]
pub enum UserLookupError {
    #[error("User profile not found: {0}")]
    NotFound(String),

    #[error("Malformed user profile {user_id}: {reason}")]
    Malformed { user_id: String, reason: String },

    #[error(transparent)]
    Store(#[from] DocumentStoreError),
}

/// Snapshot of the signed-in user taken when a request starts.
///
/// `my_tickets` is whatever the caller knew at that moment; nothing refreshes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub my_tickets: Vec<String>,
}

impl CurrentUser {
    pub fn person_ref(&self) -> PersonRef {
        PersonRef {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Stored shape of a user document (the id is the document key).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    my_tickets: Vec<String>,
}

/// Load the profile of `user_id` from the document store.
pub async fn load_current_user(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<CurrentUser, UserLookupError> {
    let document = store
        .get(Collection::Users, user_id)
        .await?
        .ok_or_else(|| UserLookupError::NotFound(user_id.to_string()))?;

    let profile: UserDocument =
        serde_json::from_value(Value::Object(document)).map_err(|e| UserLookupError::Malformed {
            user_id: user_id.to_string(),
            reason: e.to_string(),
        })?;

    Ok(CurrentUser {
        id: user_id.to_string(),
        display_name: profile.display_name,
        email: profile.email,
        role: profile.role,
        my_tickets: profile.my_tickets,
    })
}
