//! Appointment data model: identifiers, contacts, statuses, and checklists.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::slot::TimeSlot;

/// Canonical calendar key. Drops time-of-day so equality is by date only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Opaque appointment identifier assigned by the booking flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(pub String);

impl From<&str> for AppointmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The person who booked the engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContact {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ClientContact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Appointment status. Core logic branches on this enum only; display text
/// comes from [`AppointmentStatus::label`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    New,
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::New,
        AppointmentStatus::Pending,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Rejected,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed
                | AppointmentStatus::Cancelled
                | AppointmentStatus::Rejected
        )
    }

    /// Human-readable label for presentation layers.
    pub fn label(self) -> &'static str {
        match self {
            AppointmentStatus::New => "New request",
            AppointmentStatus::Pending => "Awaiting service",
            AppointmentStatus::InProgress => "In progress",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Rejected => "Rejected",
        }
    }
}

/// A single checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            done: false,
        }
    }
}

/// Service checklist. Fixed and flexible items are required for completion;
/// optional items never block it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskChecklist {
    #[serde(default)]
    pub fixed: Vec<Task>,
    #[serde(default)]
    pub flexible: Vec<Task>,
    #[serde(default)]
    pub optional: Vec<Task>,
}

impl TaskChecklist {
    /// Titles of required tasks not yet done, fixed before flexible.
    pub fn missing_required(&self) -> Vec<String> {
        self.fixed
            .iter()
            .chain(self.flexible.iter())
            .filter(|t| !t.done)
            .map(|t| t.title.clone())
            .collect()
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.fixed
            .iter_mut()
            .chain(self.flexible.iter_mut())
            .chain(self.optional.iter_mut())
            .find(|t| t.id == task_id)
    }
}

/// A free-text note attached to an engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub at: NaiveDateTime,
    pub author: String,
    pub content: String,
}

/// A booked engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub date: NaiveDate,
    pub time_range: TimeSlot,
    pub client: ClientContact,
    pub address: String,
    #[serde(default)]
    pub status: AppointmentStatus,
    /// Explicit deadline from the booking flow; derived from `date` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_deadline: Option<NaiveDateTime>,
    #[serde(default)]
    pub tasks: TaskChecklist,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

impl Appointment {
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        time_range: TimeSlot,
        client: ClientContact,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: AppointmentId(id.into()),
            date,
            time_range,
            client,
            address: address.into(),
            status: AppointmentStatus::New,
            response_deadline: None,
            tasks: TaskChecklist::default(),
            notes: Vec::new(),
            cancellation_reason: None,
        }
    }

    pub fn with_status(mut self, status: AppointmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_tasks(mut self, tasks: TaskChecklist) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_response_deadline(mut self, deadline: NaiveDateTime) -> Self {
        self.response_deadline = Some(deadline);
        self
    }

    pub fn date_key(&self) -> DateKey {
        DateKey::from(self.date)
    }

    /// Midnight opening the service date. Notice periods count back from
    /// here, whatever time of day the service starts.
    pub fn service_day_start(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }
}
