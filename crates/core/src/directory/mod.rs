//! Lookups against the externally owned `users` and `projects` collections.

mod projects;
mod users;

pub use projects::resolve_project;
pub use users::{load_current_user, CurrentUser, UserLookupError, MY_TICKETS_FIELD};
