//! Core ticket data types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Document;

/// Status every ticket starts in.
pub const STATUS_UNASSIGNED: &str = "unassigned";

/// `statusChangedTo` value of the log entry written on creation.
pub const LOG_CREATED: &str = "created";

/// Reference to a person (ticket owner or assignee).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    pub id: String,
    pub display_name: String,
    pub email: String,
}

impl PersonRef {
    /// The "nobody" reference used for unassigned tickets.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Reference to the project a ticket was raised against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub project_id: String,
    /// Empty when the project lookup failed.
    pub project_name: String,
}

/// Priority level chosen by the reporter.
///
/// Unknown labels (including the form's placeholder entry) are kept verbatim
/// so the stored value is exactly what was submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    #[default]
    Unset,
    Severe,
    High,
    Medium,
    Low,
    FeatureRequest,
    Other(String),
}

impl Priority {
    /// Parse a submitted label. Never fails.
    pub fn parse(label: &str) -> Self {
        match label {
            "" => Priority::Unset,
            "Severe" => Priority::Severe,
            "High" => Priority::High,
            "Medium" => Priority::Medium,
            "Low" => Priority::Low,
            "Feature request" => Priority::FeatureRequest,
            other => Priority::Other(other.to_string()),
        }
    }

    /// Label as stored and displayed.
    pub fn label(&self) -> &str {
        match self {
            Priority::Unset => "",
            Priority::Severe => "Severe",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::FeatureRequest => "Feature request",
            Priority::Other(label) => label,
        }
    }

    /// True for one of the five recognised levels.
    pub fn is_known(&self) -> bool {
        !matches!(self, Priority::Unset | Priority::Other(_))
    }

    /// Bounded label for metrics: the level itself, `unset` or `other`.
    pub fn metric_label(&self) -> &str {
        if self.is_known() {
            self.label()
        } else if *self == Priority::Unset {
            "unset"
        } else {
            "other"
        }
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        Priority::parse(&label)
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.label().to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One status change in a ticket's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLogEntry {
    pub person_name: String,
    pub person_role: String,
    pub timestamp: DateTime<Utc>,
    pub status_changed_to: String,
}

impl StatusLogEntry {
    /// The entry recorded when a ticket is created.
    pub fn created(person_name: &str, person_role: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            person_name: person_name.to_string(),
            person_role: person_role.to_string(),
            timestamp,
            status_changed_to: LOG_CREATED.to_string(),
        }
    }
}

/// A persisted defect report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub owner: PersonRef,
    pub project: ProjectRef,
    pub title: String,
    pub description: String,
    /// Download URL of the attached image, empty when there is none.
    pub image_url: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub assignee: PersonRef,
    /// Append-only status history, never empty.
    pub logs: Vec<StatusLogEntry>,
    /// Comment shape is owned by the discussion feature; kept opaque here.
    #[serde(default)]
    pub comments: Vec<Value>,
}

impl Ticket {
    /// Serialize into a store document.
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(document) => Ok(document),
            _ => Err(serde::ser::Error::custom("ticket did not serialize to an object")),
        }
    }

    /// Deserialize from a store document.
    pub fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(document))
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}
