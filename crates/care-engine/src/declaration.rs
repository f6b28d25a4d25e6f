//! Availability declarations: a caregiver's statement of free or busy time.

use std::collections::HashSet;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::slot::TimeSlot;

/// Whether the declared dates are free or blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Busy,
    Available,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    OneTime,
    Weekly,
}

/// Transient input from the caregiver. Never stored as-is: it is expanded
/// into one [`AvailabilityRecord`](crate::availability::AvailabilityRecord)
/// per date on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityDeclaration {
    pub mode: Mode,
    pub recurrence: Recurrence,
    #[serde(default)]
    pub days_of_week: HashSet<Weekday>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_full_day: bool,
    #[serde(default)]
    pub time_slots: Vec<TimeSlot>,
}

impl AvailabilityDeclaration {
    /// A one-time declaration for a single date.
    pub fn one_time(mode: Mode, date: NaiveDate) -> Self {
        Self {
            mode,
            recurrence: Recurrence::OneTime,
            days_of_week: HashSet::new(),
            start_date: date,
            end_date: None,
            is_full_day: false,
            time_slots: Vec::new(),
        }
    }

    /// A weekly declaration over the given weekdays.
    pub fn weekly(
        mode: Mode,
        days: impl IntoIterator<Item = Weekday>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            mode,
            recurrence: Recurrence::Weekly,
            days_of_week: days.into_iter().collect(),
            start_date,
            end_date,
            is_full_day: false,
            time_slots: Vec::new(),
        }
    }

    pub fn full_day(mut self) -> Self {
        self.is_full_day = true;
        self
    }

    pub fn with_slots(mut self, slots: impl IntoIterator<Item = TimeSlot>) -> Self {
        self.time_slots = slots.into_iter().collect();
        self
    }
}

/// Reject recurrence fields that cannot be expanded into dates.
pub fn validate_recurrence(decl: &AvailabilityDeclaration) -> Result<()> {
    if decl.recurrence == Recurrence::Weekly && decl.days_of_week.is_empty() {
        return Err(EngineError::InvalidDeclaration(
            "weekly declaration needs at least one weekday".to_string(),
        ));
    }
    if let Some(end) = decl.end_date {
        if end < decl.start_date {
            return Err(EngineError::InvalidDeclaration(format!(
                "end date {} is before start date {}",
                end, decl.start_date
            )));
        }
    }
    Ok(())
}

/// Reject declarations that cannot be committed: bad recurrence, or an
/// available partial day with nothing declared free.
pub fn validate_declaration(decl: &AvailabilityDeclaration) -> Result<()> {
    validate_recurrence(decl)?;
    if decl.mode == Mode::Available && !decl.is_full_day && decl.time_slots.is_empty() {
        return Err(EngineError::InvalidDeclaration(
            "available declaration needs a time slot or a full day".to_string(),
        ));
    }
    Ok(())
}
