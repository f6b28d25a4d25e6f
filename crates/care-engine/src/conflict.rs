//! Detect appointments a pending availability declaration would invalidate.
//!
//! Detection is pure: it reads the expanded dates, the declaration's coverage
//! and the appointment set, and returns a (possibly empty) list. Presenting,
//! confirming and cancelling are the caller's job.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::coverage::Coverage;
use crate::declaration::{AvailabilityDeclaration, Mode};
use crate::model::{Appointment, AppointmentId};
use crate::slot::TimeSlot;

/// Why an appointment conflicts with a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictReason {
    /// The date is declared busy; everything on it is blocked.
    BusyDay,
    /// The appointment's range is not inside the declared free time.
    NotCovered { range: TimeSlot },
}

/// An appointment invalidated by a declaration. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub appointment_id: AppointmentId,
    pub date: NaiveDate,
    pub client_name: String,
    pub reason: ConflictReason,
}

/// Find conflicts for a declaration whose dates are already expanded.
pub fn detect_conflicts<'a>(
    decl: &AvailabilityDeclaration,
    dates: &[NaiveDate],
    appointments: impl IntoIterator<Item = &'a Appointment>,
) -> Vec<Conflict> {
    let coverage = Coverage::new(decl.is_full_day, &decl.time_slots);
    find_conflicts(dates, decl.mode, &coverage, appointments)
}

/// Find every live appointment on one of `dates` that `mode`/`coverage`
/// would invalidate.
///
/// - `Busy`: every appointment on an affected date conflicts.
/// - `Available`: an appointment conflicts iff its range is not fully covered.
///
/// Appointments on other dates and appointments in a terminal status are
/// ignored. Results are ordered by date, start time, then id.
pub fn find_conflicts<'a>(
    dates: &[NaiveDate],
    mode: Mode,
    coverage: &Coverage,
    appointments: impl IntoIterator<Item = &'a Appointment>,
) -> Vec<Conflict> {
    let affected: HashSet<NaiveDate> = dates.iter().copied().collect();

    let mut conflicts: Vec<(u16, Conflict)> = appointments
        .into_iter()
        .filter(|appt| !appt.status.is_terminal() && affected.contains(&appt.date))
        .filter_map(|appt| {
            let reason = match mode {
                Mode::Busy => ConflictReason::BusyDay,
                Mode::Available if coverage.covers(&appt.time_range) => return None,
                Mode::Available => ConflictReason::NotCovered {
                    range: appt.time_range,
                },
            };
            Some((
                appt.time_range.start(),
                Conflict {
                    appointment_id: appt.id.clone(),
                    date: appt.date,
                    client_name: appt.client.name.clone(),
                    reason,
                },
            ))
        })
        .collect();

    conflicts.sort_by(|(a_start, a), (b_start, b)| {
        (a.date, *a_start, &a.appointment_id).cmp(&(b.date, *b_start, &b.appointment_id))
    });

    conflicts.into_iter().map(|(_, c)| c).collect()
}
