//! Appointment lifecycle: the status state machine and its time-bound gates.
//!
//! ```text
//! New ──accept──▶ Pending ──start──▶ InProgress ──complete──▶ Completed
//!  │                 │
//!  └──reject──▶ Rejected   └──cancel (> window before service)──▶ Cancelled
//!
//! any non-terminal ──system cancel──▶ Cancelled
//! ```
//!
//! Completed, Cancelled and Rejected are terminal. Every successful transition
//! is published on the [`ChangeBus`] before the call returns.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::admission;
use crate::deadline::{ResponseDeadlineEnforcer, DEFAULT_RESPONSE_WINDOW_DAYS};
use crate::error::{EngineError, Result};
use crate::model::{Appointment, AppointmentId, AppointmentStatus, Note, TaskChecklist};
use crate::notify::{ChangeBus, ChangeEvent, Subscription};

pub const DEFAULT_CANCELLATION_WINDOW_DAYS: u32 = 3;

/// A caller-initiated step through the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Accept,
    Reject,
    Start,
    Cancel,
    Complete,
    /// Cancellation driven by the caregiver's own availability change.
    SystemCancel,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Accept => "accept",
            Action::Reject => "reject",
            Action::Start => "start",
            Action::Cancel => "cancel",
            Action::Complete => "complete",
            Action::SystemCancel => "system-cancel",
        }
    }
}

/// The status `action` leads to from `from`, or `None` if undefined.
pub fn next_status(from: AppointmentStatus, action: Action) -> Option<AppointmentStatus> {
    use AppointmentStatus::*;

    match (from, action) {
        (New, Action::Accept) => Some(Pending),
        (New, Action::Reject) => Some(Rejected),
        (Pending, Action::Start) => Some(InProgress),
        (Pending, Action::Cancel) => Some(Cancelled),
        (InProgress, Action::Complete) => Some(Completed),
        (status, Action::SystemCancel) if !status.is_terminal() => Some(Cancelled),
        _ => None,
    }
}

/// Client-side cancellation needs strictly more than `window_days` between
/// `now` and the start of the service date. The time-of-day slot is ignored.
///
/// # Errors
/// Returns `EngineError::CancellationWindowClosed` otherwise.
pub fn check_cancellation_window(
    appt: &Appointment,
    window_days: u32,
    now: NaiveDateTime,
) -> Result<()> {
    if appt.service_day_start() - now > Duration::days(i64::from(window_days)) {
        return Ok(());
    }
    Err(EngineError::CancellationWindowClosed {
        service_date: appt.date,
        window_days: i64::from(window_days),
    })
}

/// Owns the appointment table and the observer list.
#[derive(Debug)]
pub struct AppointmentLifecycle {
    appointments: BTreeMap<AppointmentId, Appointment>,
    bus: ChangeBus,
    deadlines: ResponseDeadlineEnforcer,
    cancellation_window_days: u32,
}

impl Default for AppointmentLifecycle {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_WINDOW_DAYS, DEFAULT_CANCELLATION_WINDOW_DAYS)
    }
}

impl AppointmentLifecycle {
    pub fn new(response_window_days: u32, cancellation_window_days: u32) -> Self {
        Self {
            appointments: BTreeMap::new(),
            bus: ChangeBus::new(),
            deadlines: ResponseDeadlineEnforcer::new(response_window_days),
            cancellation_window_days,
        }
    }

    pub fn deadlines(&self) -> &ResponseDeadlineEnforcer {
        &self.deadlines
    }

    // ── Table access ────────────────────────────────────────────────────────

    /// Register an appointment created by the booking flow.
    pub fn insert(&mut self, appt: Appointment) -> Result<()> {
        if self.appointments.contains_key(&appt.id) {
            return Err(EngineError::DuplicateAppointment(appt.id));
        }
        debug!("Registered appointment {} on {}", appt.id, appt.date);
        self.appointments.insert(appt.id.clone(), appt);
        Ok(())
    }

    pub fn get(&self, id: &AppointmentId) -> Option<&Appointment> {
        self.appointments.get(id)
    }

    pub fn status(&self, id: &AppointmentId) -> Result<AppointmentStatus> {
        self.lookup(id).map(|appt| appt.status)
    }

    pub fn appointments(&self) -> impl Iterator<Item = &Appointment> {
        self.appointments.values()
    }

    /// Appointments dated within `[from, to]`, ordered by date, start, then id.
    pub fn list_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<&Appointment> {
        let mut listed: Vec<&Appointment> = self
            .appointments
            .values()
            .filter(|appt| appt.date >= from && appt.date <= to)
            .collect();
        listed.sort_by(|a, b| {
            (a.date, a.time_range.start(), &a.id).cmp(&(b.date, b.time_range.start(), &b.id))
        });
        listed
    }

    /// Number of appointments per status; every status is present.
    pub fn status_counts(&self) -> BTreeMap<AppointmentStatus, usize> {
        let mut counts: BTreeMap<AppointmentStatus, usize> =
            AppointmentStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for appt in self.appointments.values() {
            *counts.entry(appt.status).or_default() += 1;
        }
        counts
    }

    /// New requests whose response deadline has passed. An external job can
    /// feed these to [`system_cancel`](Self::system_cancel).
    pub fn expired_requests(&self, now: NaiveDateTime) -> Vec<AppointmentId> {
        self.appointments
            .values()
            .filter(|appt| appt.status == AppointmentStatus::New)
            .filter(|appt| self.deadlines.is_expired(appt, now))
            .map(|appt| appt.id.clone())
            .collect()
    }

    // ── Observers ───────────────────────────────────────────────────────────

    pub fn subscribe(&mut self, observer: impl FnMut(&ChangeEvent) + 'static) -> Subscription {
        self.bus.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        self.bus.unsubscribe(handle)
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    pub fn accept(&mut self, id: &AppointmentId, now: NaiveDateTime) -> Result<ChangeEvent> {
        self.apply(id, Action::Accept, now, |this, appt| this.deadlines.check(appt, now))
    }

    pub fn reject(&mut self, id: &AppointmentId, now: NaiveDateTime) -> Result<ChangeEvent> {
        self.apply(id, Action::Reject, now, |this, appt| this.deadlines.check(appt, now))
    }

    pub fn start(&mut self, id: &AppointmentId, now: NaiveDateTime) -> Result<ChangeEvent> {
        self.apply(id, Action::Start, now, |this, appt| {
            admission::check_start(appt, this.appointments.values())
        })
    }

    pub fn cancel(
        &mut self,
        id: &AppointmentId,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<ChangeEvent> {
        let event = self.apply(id, Action::Cancel, now, |this, appt| {
            check_cancellation_window(appt, this.cancellation_window_days, now)
        })?;
        self.record_cancellation_reason(id, reason);
        Ok(event)
    }

    /// Cancel regardless of the notice window. Used when the caregiver's own
    /// availability change invalidates the appointment.
    pub fn system_cancel(
        &mut self,
        id: &AppointmentId,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<ChangeEvent> {
        let event = self.apply(id, Action::SystemCancel, now, |_, _| Ok(()))?;
        self.record_cancellation_reason(id, reason);
        Ok(event)
    }

    /// Complete using the caller's checklist, which is recorded on success.
    pub fn complete(
        &mut self,
        id: &AppointmentId,
        checklist: &TaskChecklist,
        now: NaiveDateTime,
    ) -> Result<ChangeEvent> {
        let event = self.apply(id, Action::Complete, now, |_, _| check_tasks(checklist))?;
        if let Some(appt) = self.appointments.get_mut(id) {
            appt.tasks = checklist.clone();
        }
        Ok(event)
    }

    /// Complete using the checklist stored on the appointment.
    pub fn complete_recorded(
        &mut self,
        id: &AppointmentId,
        now: NaiveDateTime,
    ) -> Result<ChangeEvent> {
        self.apply(id, Action::Complete, now, |_, appt| check_tasks(&appt.tasks))
    }

    // ── Engagement details ──────────────────────────────────────────────────

    /// Tick or untick a checklist item while the engagement is live.
    pub fn mark_task(&mut self, id: &AppointmentId, task_id: &str, done: bool) -> Result<()> {
        let appt = self.lookup_active_mut(id, "mark task on")?;
        let task = appt
            .tasks
            .task_mut(task_id)
            .ok_or_else(|| EngineError::UnknownTask {
                id: id.clone(),
                task_id: task_id.to_string(),
            })?;
        task.done = done;
        Ok(())
    }

    pub fn add_note(
        &mut self,
        id: &AppointmentId,
        author: &str,
        content: &str,
        now: NaiveDateTime,
    ) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Err(EngineError::EmptyNote);
        }
        let appt = self.lookup_active_mut(id, "add note to")?;
        appt.notes.push(Note {
            at: now,
            author: author.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn lookup(&self, id: &AppointmentId) -> Result<&Appointment> {
        self.appointments
            .get(id)
            .ok_or_else(|| EngineError::UnknownAppointment(id.clone()))
    }

    /// Pending or in progress; anything else refuses with `InvalidTransition`.
    fn lookup_active_mut(
        &mut self,
        id: &AppointmentId,
        action: &'static str,
    ) -> Result<&mut Appointment> {
        let appt = self
            .appointments
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownAppointment(id.clone()))?;
        match appt.status {
            AppointmentStatus::Pending | AppointmentStatus::InProgress => Ok(appt),
            from => Err(EngineError::InvalidTransition {
                id: id.clone(),
                from,
                action,
            }),
        }
    }

    fn record_cancellation_reason(&mut self, id: &AppointmentId, reason: &str) {
        if let Some(appt) = self.appointments.get_mut(id) {
            appt.cancellation_reason = Some(reason.to_string());
        }
    }

    /// Resolve the target status, run the gate, mutate, then publish.
    fn apply(
        &mut self,
        id: &AppointmentId,
        action: Action,
        now: NaiveDateTime,
        gate: impl FnOnce(&Self, &Appointment) -> Result<()>,
    ) -> Result<ChangeEvent> {
        let appt = self.lookup(id)?;
        let from = appt.status;

        let to = next_status(from, action).ok_or_else(|| EngineError::InvalidTransition {
            id: id.clone(),
            from,
            action: action.name(),
        });
        let to = match to {
            Ok(to) => to,
            Err(e) => {
                warn!("Refused {} on appointment {}: {}", action.name(), id, e);
                return Err(e);
            }
        };

        if let Err(e) = gate(self, appt) {
            warn!("Refused {} on appointment {}: {}", action.name(), id, e);
            return Err(e);
        }

        if let Some(appt) = self.appointments.get_mut(id) {
            appt.status = to;
        }
        info!(
            "Appointment {} {:?} -> {:?} via {}",
            id,
            from,
            to,
            action.name()
        );

        let event = ChangeEvent {
            appointment_id: id.clone(),
            from,
            to,
            at: now,
        };
        self.bus.publish(&event);
        Ok(event)
    }
}

fn check_tasks(checklist: &TaskChecklist) -> Result<()> {
    let missing = checklist.missing_required();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::IncompleteTasks { missing })
    }
}
