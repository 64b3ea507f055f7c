//! Defect ticket records.

mod types;

pub use types::{
    PersonRef, Priority, ProjectRef, StatusLogEntry, Ticket, LOG_CREATED, STATUS_UNASSIGNED,
};
