//! Response deadline for new requests.
//!
//! A caregiver must accept or reject a request by 23:59:59 on the day that is
//! `window_days` before the service date. The check is lazy: it runs on each
//! accept/reject call and never cancels anything by itself.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};

use crate::error::{EngineError, Result};
use crate::model::Appointment;

pub const DEFAULT_RESPONSE_WINDOW_DAYS: u32 = 3;

/// Last second of the day `window_days` before `service_date`.
pub fn response_deadline(service_date: NaiveDate, window_days: u32) -> NaiveDateTime {
    let day = service_date - Duration::days(i64::from(window_days));
    day.and_time(NaiveTime::MIN) + Duration::seconds(86_399)
}

/// Strictly after, at whole-second resolution: anything within the deadline's
/// final second (23:59:59.999..) is still on time.
pub fn is_expired(deadline: NaiveDateTime, now: NaiveDateTime) -> bool {
    now.trunc_subsecs(0) > deadline
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseDeadlineEnforcer {
    window_days: u32,
}

impl Default for ResponseDeadlineEnforcer {
    fn default() -> Self {
        Self::new(DEFAULT_RESPONSE_WINDOW_DAYS)
    }
}

impl ResponseDeadlineEnforcer {
    pub fn new(window_days: u32) -> Self {
        Self { window_days }
    }

    /// The appointment's explicit deadline if the booking flow set one,
    /// otherwise the one derived from its service date.
    pub fn deadline_for(&self, appt: &Appointment) -> NaiveDateTime {
        appt.response_deadline
            .unwrap_or_else(|| response_deadline(appt.date, self.window_days))
    }

    pub fn is_expired(&self, appt: &Appointment, now: NaiveDateTime) -> bool {
        is_expired(self.deadline_for(appt), now)
    }

    /// Gate for accept/reject.
    ///
    /// # Errors
    /// Returns `EngineError::DeadlineExpired` carrying the deadline when `now`
    /// is past it.
    pub fn check(&self, appt: &Appointment, now: NaiveDateTime) -> Result<()> {
        let deadline = self.deadline_for(appt);
        if is_expired(deadline, now) {
            return Err(EngineError::DeadlineExpired { deadline });
        }
        Ok(())
    }
}
