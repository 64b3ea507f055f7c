//! Project name lookup.

use serde_json::Value;

use crate::store::{Collection, DocumentStore};
use crate::ticket::ProjectRef;

/// Resolve the display name of a project.
///
/// Any failure is logged and yields an empty name; submission never waits on it.
pub async fn resolve_project(store: &dyn DocumentStore, project_id: &str) -> ProjectRef {
    let project_name = match store.get(Collection::Projects, project_id).await {
        Ok(Some(document)) => match document.get("name") {
            Some(Value::String(name)) => name.clone(),
            _ => {
                tracing::warn!(project_id = %project_id, "Project document has no name");
                String::new()
            }
        },
        Ok(None) => {
            tracing::warn!(project_id = %project_id, "Project not found");
            String::new()
        }
        Err(e) => {
            tracing::error!(project_id = %project_id, "Couldn't fetch project name: {}", e);
            String::new()
        }
    };

    ProjectRef {
        project_id: project_id.to_string(),
        project_name,
    }
}
