//! `CareEngine`: one caregiver's calendar, appointment table and observers
//! behind a single constructible value.
//!
//! Availability writes follow a two-phase protocol. [`CareEngine::submit`]
//! with `confirmed = false` only detects; if anything conflicts, the caller
//! shows the conflicts and asks the caregiver. Calling again with
//! `confirmed = true` re-runs detection against the current table, cancels
//! what conflicts, and then commits the records.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::availability::{AvailabilityCalendar, AvailabilityRecord, BookableSlot, DaySummary};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::conflict::{detect_conflicts, Conflict};
use crate::declaration::{validate_declaration, AvailabilityDeclaration};
use crate::error::Result;
use crate::expander::expand_dates_with_horizon;
use crate::lifecycle::AppointmentLifecycle;
use crate::model::{Appointment, AppointmentId, AppointmentStatus, TaskChecklist};
use crate::notify::{ChangeEvent, Subscription};
use crate::slot::TimeSlot;

/// Reason recorded on appointments cancelled by an availability change.
pub const AVAILABILITY_CHANGE_REASON: &str = "caregiver availability changed";

/// Result of an availability write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Records were written for `dates`; `cancelled` lists the appointments
    /// cancelled first (empty on a clean commit).
    Committed {
        dates: Vec<NaiveDate>,
        cancelled: Vec<AppointmentId>,
    },
    /// Nothing was written. Re-submit with `confirmed = true` to cancel these
    /// appointments and commit.
    RequiresConfirmation { conflicts: Vec<Conflict> },
}

#[derive(Debug)]
pub struct CareEngine<C: Clock = SystemClock> {
    config: EngineConfig,
    calendar: AvailabilityCalendar,
    lifecycle: AppointmentLifecycle,
    clock: C,
}

impl CareEngine<SystemClock> {
    /// Engine reading the host clock in the configured timezone.
    pub fn with_system_clock(config: EngineConfig) -> Result<Self> {
        let clock = SystemClock::new(config.tz()?);
        Self::new(config, clock)
    }
}

impl<C: Clock> CareEngine<C> {
    pub fn new(config: EngineConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let lifecycle = AppointmentLifecycle::new(
            config.response_window_days,
            config.cancellation_window_days,
        );
        Ok(Self {
            config,
            calendar: AvailabilityCalendar::new(),
            lifecycle,
            clock,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn calendar(&self) -> &AvailabilityCalendar {
        &self.calendar
    }

    pub fn lifecycle(&self) -> &AppointmentLifecycle {
        &self.lifecycle
    }

    // ── Availability writes ─────────────────────────────────────────────────

    /// Expand `decl` and report the appointments it would invalidate, without
    /// changing anything.
    pub fn preview(&self, decl: &AvailabilityDeclaration) -> Result<Vec<Conflict>> {
        validate_declaration(decl)?;
        let dates = expand_dates_with_horizon(decl, self.config.recurrence_horizon_days)?;
        Ok(detect_conflicts(decl, &dates, self.lifecycle.appointments()))
    }

    /// Write `decl` to the calendar.
    ///
    /// Without confirmation, any conflict aborts the write and is returned for
    /// review. With confirmation, conflicts are recomputed, each conflicting
    /// appointment is system-cancelled, and then one record per date commits.
    pub fn submit(
        &mut self,
        decl: &AvailabilityDeclaration,
        confirmed: bool,
    ) -> Result<SubmitOutcome> {
        validate_declaration(decl)?;
        let dates = expand_dates_with_horizon(decl, self.config.recurrence_horizon_days)?;
        let conflicts = detect_conflicts(decl, &dates, self.lifecycle.appointments());

        if !conflicts.is_empty() && !confirmed {
            info!(
                "Availability write over {} dates needs confirmation: {} conflicts",
                dates.len(),
                conflicts.len()
            );
            return Ok(SubmitOutcome::RequiresConfirmation { conflicts });
        }

        let now = self.clock.now();
        let mut cancelled = Vec::with_capacity(conflicts.len());
        for conflict in &conflicts {
            self.lifecycle
                .system_cancel(&conflict.appointment_id, AVAILABILITY_CHANGE_REASON, now)?;
            cancelled.push(conflict.appointment_id.clone());
        }

        let stats = self.calendar.commit(decl, &dates);
        info!(
            "Committed {:?} availability for {} dates ({} replaced), cancelled {} appointments",
            decl.mode,
            dates.len(),
            stats.replaced,
            cancelled.len()
        );
        Ok(SubmitOutcome::Committed { dates, cancelled })
    }

    // ── Availability reads ──────────────────────────────────────────────────

    pub fn availability(&self, date: NaiveDate) -> Option<&AvailabilityRecord> {
        self.calendar.get(date)
    }

    pub fn day_summary(&self, date: NaiveDate) -> DaySummary {
        self.calendar.summary(date)
    }

    pub fn free_time(&self, date: NaiveDate) -> Vec<TimeSlot> {
        self.calendar.free_time(date, self.lifecycle.appointments())
    }

    pub fn available_slots(&self, date: NaiveDate, slot_minutes: u16) -> Result<Vec<BookableSlot>> {
        self.calendar
            .available_slots(date, slot_minutes, self.lifecycle.appointments())
    }

    // ── Appointment reads ───────────────────────────────────────────────────

    pub fn insert_appointment(&mut self, appt: Appointment) -> Result<()> {
        self.lifecycle.insert(appt)
    }

    pub fn appointment(&self, id: &AppointmentId) -> Option<&Appointment> {
        self.lifecycle.get(id)
    }

    pub fn get_status(&self, id: &AppointmentId) -> Result<AppointmentStatus> {
        self.lifecycle.status(id)
    }

    pub fn list_by_date_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<&Appointment> {
        self.lifecycle.list_by_date_range(from, to)
    }

    pub fn status_counts(&self) -> BTreeMap<AppointmentStatus, usize> {
        self.lifecycle.status_counts()
    }

    /// New requests past their response deadline as of the engine clock.
    pub fn expired_requests(&self) -> Vec<AppointmentId> {
        self.lifecycle.expired_requests(self.clock.now())
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&ChangeEvent) + 'static) -> Subscription {
        self.lifecycle.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        self.lifecycle.unsubscribe(handle)
    }

    // ── Lifecycle actions ───────────────────────────────────────────────────

    pub fn accept(&mut self, id: &AppointmentId) -> Result<ChangeEvent> {
        let now = self.clock.now();
        self.lifecycle.accept(id, now)
    }

    pub fn reject(&mut self, id: &AppointmentId) -> Result<ChangeEvent> {
        let now = self.clock.now();
        self.lifecycle.reject(id, now)
    }

    pub fn start(&mut self, id: &AppointmentId) -> Result<ChangeEvent> {
        let now = self.clock.now();
        self.lifecycle.start(id, now)
    }

    pub fn cancel(&mut self, id: &AppointmentId, reason: &str) -> Result<ChangeEvent> {
        let now = self.clock.now();
        self.lifecycle.cancel(id, reason, now)
    }

    pub fn system_cancel(&mut self, id: &AppointmentId, reason: &str) -> Result<ChangeEvent> {
        let now = self.clock.now();
        self.lifecycle.system_cancel(id, reason, now)
    }

    pub fn complete(
        &mut self,
        id: &AppointmentId,
        checklist: &TaskChecklist,
    ) -> Result<ChangeEvent> {
        let now = self.clock.now();
        self.lifecycle.complete(id, checklist, now)
    }

    pub fn complete_recorded(&mut self, id: &AppointmentId) -> Result<ChangeEvent> {
        let now = self.clock.now();
        self.lifecycle.complete_recorded(id, now)
    }

    pub fn mark_task(&mut self, id: &AppointmentId, task_id: &str, done: bool) -> Result<()> {
        self.lifecycle.mark_task(id, task_id, done)
    }

    pub fn add_note(&mut self, id: &AppointmentId, author: &str, content: &str) -> Result<()> {
        let now = self.clock.now();
        self.lifecycle.add_note(id, author, content, now)
    }
}
