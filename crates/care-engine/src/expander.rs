//! Recurrence expansion: turns a declaration into concrete calendar dates.
//!
//! Weekly patterns go through the `rrule` crate as an RFC 5545
//! `FREQ=WEEKLY;BYDAY=..;UNTIL=..` rule anchored at midnight UTC. Only the
//! calendar date of each instance is kept; time-of-day lives in the slots.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rrule::RRuleSet;
use tracing::debug;

use crate::declaration::{validate_recurrence, AvailabilityDeclaration, Recurrence};
use crate::error::{EngineError, Result};

/// Implicit ceiling for open-ended weekly declarations: `start + 365 days`.
pub const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Longest weekly range, in days inclusive of both ends, that one expansion
/// covers. Seven weekdays over this span is the most instances `rrule` returns.
pub const MAX_SPAN_DAYS: i64 = u16::MAX as i64;

/// Largest horizon whose open-ended range still fits in [`MAX_SPAN_DAYS`].
pub const MAX_HORIZON_DAYS: u32 = u16::MAX as u32 - 1;

/// Expand a declaration into ascending, de-duplicated dates using the
/// default one-year horizon for open-ended weekly patterns.
///
/// # Errors
/// Returns `EngineError::InvalidDeclaration` if a weekly declaration has no
/// weekdays, the end date precedes the start date, or the range spans more
/// than [`MAX_SPAN_DAYS`].
pub fn expand_dates(decl: &AvailabilityDeclaration) -> Result<Vec<NaiveDate>> {
    expand_dates_with_horizon(decl, DEFAULT_HORIZON_DAYS)
}

/// Expand a declaration, bounding open-ended weekly patterns at
/// `start + horizon_days`.
///
/// The same input always yields the same dates, so callers may re-run the
/// expansion between conflict review and commit.
pub fn expand_dates_with_horizon(
    decl: &AvailabilityDeclaration,
    horizon_days: u32,
) -> Result<Vec<NaiveDate>> {
    validate_recurrence(decl)?;

    match decl.recurrence {
        Recurrence::OneTime => Ok(vec![decl.start_date]),
        Recurrence::Weekly => {
            let start = decl.start_date;
            let until = match decl.end_date {
                Some(end) => end,
                None => start
                    .checked_add_days(Days::new(u64::from(horizon_days)))
                    .ok_or_else(|| {
                        EngineError::InvalidDeclaration(format!(
                            "horizon of {} days from {} is out of range",
                            horizon_days, start
                        ))
                    })?,
            };
            let dates = expand_weekly(start, until, decl)?;
            debug!(
                "Expanded weekly declaration {}..{} into {} dates",
                start,
                until,
                dates.len()
            );
            Ok(dates)
        }
    }
}

fn expand_weekly(
    start: NaiveDate,
    until: NaiveDate,
    decl: &AvailabilityDeclaration,
) -> Result<Vec<NaiveDate>> {
    // Emit BYDAY in a fixed Monday-first order so the rule text is stable.
    let byday: Vec<&str> = WEEK
        .iter()
        .filter(|day| decl.days_of_week.contains(day))
        .map(|day| ical_day(*day))
        .collect();

    // DTSTART is UTC here, so UNTIL must carry the trailing "Z".
    let rule_text = format!(
        "DTSTART;TZID=UTC:{}T000000\nRRULE:FREQ=WEEKLY;BYDAY={};UNTIL={}T000000Z",
        start.format("%Y%m%d"),
        byday.join(","),
        until.format("%Y%m%d"),
    );

    let rrule_set: RRuleSet = rule_text
        .parse()
        .map_err(|e| EngineError::InvalidDeclaration(format!("{}", e)))?;

    // One instance per day is the most a weekly rule can produce.
    let span_days = (until - start).num_days() + 1;
    let limit = u16::try_from(span_days).map_err(|_| {
        EngineError::InvalidDeclaration(format!(
            "weekly range {}..{} spans {} days, at most {} allowed",
            start, until, span_days, MAX_SPAN_DAYS
        ))
    })?;

    let mut dates: Vec<NaiveDate> = rrule_set
        .all(limit)
        .dates
        .into_iter()
        .map(|dt| dt.date_naive())
        .filter(|date| {
            *date >= start && *date <= until && decl.days_of_week.contains(&date.weekday())
        })
        .collect();

    dates.sort();
    dates.dedup();
    Ok(dates)
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn ical_day(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}
