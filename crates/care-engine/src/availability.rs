//! The caregiver's availability calendar: one record per date.
//!
//! A committed declaration replaces each touched date's record wholesale;
//! records for other dates are left alone. The calendar also answers the
//! read-side questions the booking flow asks: what kind of day is this, what
//! time is still free, and which fixed-length slots can be offered.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coverage::{free_gaps, Coverage};
use crate::declaration::{AvailabilityDeclaration, Mode};
use crate::error::{EngineError, Result};
use crate::model::{Appointment, AppointmentId, DateKey};
use crate::slot::TimeSlot;

/// What the caregiver declared for a single date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub date: NaiveDate,
    pub mode: Mode,
    pub is_full_day: bool,
    pub time_slots: Vec<TimeSlot>,
}

impl AvailabilityRecord {
    /// The record a declaration writes for `date`. Busy days and full days
    /// keep no slots.
    pub fn from_declaration(decl: &AvailabilityDeclaration, date: NaiveDate) -> Self {
        match decl.mode {
            Mode::Busy => Self {
                date,
                mode: Mode::Busy,
                is_full_day: true,
                time_slots: Vec::new(),
            },
            Mode::Available => Self {
                date,
                mode: Mode::Available,
                is_full_day: decl.is_full_day,
                time_slots: if decl.is_full_day {
                    Vec::new()
                } else {
                    decl.time_slots.clone()
                },
            },
        }
    }

    /// Free time on this date; a busy day has none.
    pub fn coverage(&self) -> Coverage {
        match self.mode {
            Mode::Busy => Coverage::Slots(Vec::new()),
            Mode::Available => Coverage::new(self.is_full_day, &self.time_slots),
        }
    }
}

/// Calendar-cell view of a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DaySummary {
    /// Nothing declared; treated as unavailable.
    Unset,
    Busy,
    FullDay,
    Partial,
}

/// A fixed-length slot offered to the booking flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookableSlot {
    pub slot: TimeSlot,
    pub available: bool,
    /// First live appointment overlapping the slot, if any.
    pub blocked_by: Option<AppointmentId>,
}

/// How a commit changed the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub added: usize,
    pub replaced: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AvailabilityCalendar {
    records: BTreeMap<DateKey, AvailabilityRecord>,
}

impl AvailabilityCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one record per date, replacing any existing record for that date.
    pub fn commit(&mut self, decl: &AvailabilityDeclaration, dates: &[NaiveDate]) -> CommitStats {
        let mut stats = CommitStats::default();
        for date in dates {
            let record = AvailabilityRecord::from_declaration(decl, *date);
            match self.records.insert(DateKey::from(*date), record) {
                Some(_) => stats.replaced += 1,
                None => stats.added += 1,
            }
        }
        debug!(
            "Committed availability: {} added, {} replaced",
            stats.added, stats.replaced
        );
        stats
    }

    pub fn get(&self, date: NaiveDate) -> Option<&AvailabilityRecord> {
        self.records.get(&DateKey::from(date))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records dated within `[from, to]`, ascending.
    pub fn records_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<&AvailabilityRecord> {
        self.records
            .range(DateKey::from(from)..=DateKey::from(to))
            .map(|(_, record)| record)
            .collect()
    }

    pub fn summary(&self, date: NaiveDate) -> DaySummary {
        match self.get(date) {
            None => DaySummary::Unset,
            Some(record) => match (record.mode, record.is_full_day) {
                (Mode::Busy, _) => DaySummary::Busy,
                (Mode::Available, true) => DaySummary::FullDay,
                (Mode::Available, false) => DaySummary::Partial,
            },
        }
    }

    /// Declared free ranges on `date` minus time taken by live appointments.
    pub fn free_time<'a>(
        &self,
        date: NaiveDate,
        appointments: impl IntoIterator<Item = &'a Appointment>,
    ) -> Vec<TimeSlot> {
        let Some(record) = self.get(date) else {
            return Vec::new();
        };
        let busy: Vec<TimeSlot> = live_on(date, appointments)
            .map(|appt| appt.time_range)
            .collect();

        record
            .coverage()
            .ranges()
            .iter()
            .flat_map(|range| free_gaps(range, &busy))
            .collect()
    }

    /// Cut each declared free range on `date` into `slot_minutes` pieces and
    /// flag the ones that overlap a live appointment.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidTime` if `slot_minutes` is zero.
    pub fn available_slots<'a>(
        &self,
        date: NaiveDate,
        slot_minutes: u16,
        appointments: impl IntoIterator<Item = &'a Appointment>,
    ) -> Result<Vec<BookableSlot>> {
        if slot_minutes == 0 {
            return Err(EngineError::InvalidTime(
                "slot length must be positive".to_string(),
            ));
        }
        let Some(record) = self.get(date) else {
            return Ok(Vec::new());
        };
        let live: Vec<&Appointment> = live_on(date, appointments).collect();

        let mut slots = Vec::new();
        for range in record.coverage().ranges() {
            let mut cursor = range.start();
            while u32::from(cursor) + u32::from(slot_minutes) <= u32::from(range.end()) {
                let slot = TimeSlot::new(cursor, cursor + slot_minutes)?;
                let blocked_by = live
                    .iter()
                    .find(|appt| appt.time_range.overlaps(&slot))
                    .map(|appt| appt.id.clone());
                slots.push(BookableSlot {
                    slot,
                    available: blocked_by.is_none(),
                    blocked_by,
                });
                cursor += slot_minutes;
            }
        }
        Ok(slots)
    }
}

fn live_on<'a>(
    date: NaiveDate,
    appointments: impl IntoIterator<Item = &'a Appointment>,
) -> impl Iterator<Item = &'a Appointment> {
    appointments
        .into_iter()
        .filter(move |appt| appt.date == date && !appt.status.is_terminal())
}
