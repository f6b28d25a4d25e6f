//! Error types for care-engine operations.
//!
//! Every refusal carries enough context for a person to decide the next step:
//! the deadline that passed, the task titles still open, or the engagement
//! that blocks a start.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::model::{AppointmentId, AppointmentStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Response deadline expired at {deadline}")]
    DeadlineExpired { deadline: NaiveDateTime },

    #[error("Cancellation window closed: service date {service_date} needs more than {window_days} days notice")]
    CancellationWindowClosed {
        service_date: NaiveDate,
        window_days: i64,
    },

    #[error("Incomplete tasks: {}", .missing.join(", "))]
    IncompleteTasks { missing: Vec<String> },

    #[error("Cannot start: appointment {conflicting_id} with {client_name} at {address} is in progress")]
    StartConflict {
        conflicting_id: AppointmentId,
        client_name: String,
        address: String,
    },

    #[error("Invalid transition: cannot {action} appointment {id} in status {from:?}")]
    InvalidTransition {
        id: AppointmentId,
        from: AppointmentStatus,
        action: &'static str,
    },

    #[error("Unknown appointment: {0}")]
    UnknownAppointment(AppointmentId),

    #[error("Duplicate appointment: {0}")]
    DuplicateAppointment(AppointmentId),

    #[error("Unknown task {task_id} on appointment {id}")]
    UnknownTask { id: AppointmentId, task_id: String },

    #[error("Note content is empty")]
    EmptyNote,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
