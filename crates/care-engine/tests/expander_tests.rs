//! Tests for declaration → date expansion.

use care_engine::declaration::{AvailabilityDeclaration, Mode};
use care_engine::expander::{expand_dates, expand_dates_with_horizon, MAX_SPAN_DAYS};
use care_engine::{EngineError, TimeSlot};
use chrono::{Datelike, Days, NaiveDate, Weekday};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn morning() -> TimeSlot {
    TimeSlot::parse("08:00", "12:00").unwrap()
}

#[test]
fn one_time_expands_to_start_date_only() {
    let decl = AvailabilityDeclaration::one_time(Mode::Busy, date(2025, 11, 11));
    assert_eq!(expand_dates(&decl).unwrap(), vec![date(2025, 11, 11)]);
}

#[test]
fn weekly_mon_wed_over_two_weeks() {
    // 2025-10-20 is a Monday; 2025-11-03 is the Monday two weeks later.
    let decl = AvailabilityDeclaration::weekly(
        Mode::Available,
        [Weekday::Mon, Weekday::Wed],
        date(2025, 10, 20),
        Some(date(2025, 11, 3)),
    )
    .with_slots([morning()]);

    let dates = expand_dates(&decl).unwrap();

    assert_eq!(
        dates,
        vec![
            date(2025, 10, 20),
            date(2025, 10, 22),
            date(2025, 10, 27),
            date(2025, 10, 29),
            date(2025, 11, 3),
        ]
    );
}

#[test]
fn weekly_start_not_on_selected_day_is_skipped() {
    // 2025-10-21 is a Tuesday; only Fridays requested.
    let decl = AvailabilityDeclaration::weekly(
        Mode::Busy,
        [Weekday::Fri],
        date(2025, 10, 21),
        Some(date(2025, 11, 1)),
    );

    let dates = expand_dates(&decl).unwrap();

    assert_eq!(dates, vec![date(2025, 10, 24), date(2025, 10, 31)]);
}

#[test]
fn weekly_end_equal_to_start_on_selected_day() {
    let decl = AvailabilityDeclaration::weekly(
        Mode::Busy,
        [Weekday::Mon],
        date(2025, 10, 20),
        Some(date(2025, 10, 20)),
    );
    assert_eq!(expand_dates(&decl).unwrap(), vec![date(2025, 10, 20)]);
}

#[test]
fn open_ended_weekly_is_capped_at_one_year() {
    let start = date(2025, 1, 1);
    let every_day = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    let decl = AvailabilityDeclaration::weekly(Mode::Busy, every_day, start, None);

    let dates = expand_dates(&decl).unwrap();

    // start ..= start + 365 days
    assert_eq!(dates.len(), 366);
    assert_eq!(dates.first(), Some(&start));
    assert_eq!(dates.last(), Some(&date(2026, 1, 1)));
}

#[test]
fn custom_horizon_bounds_open_ended_weekly() {
    let decl =
        AvailabilityDeclaration::weekly(Mode::Busy, [Weekday::Mon], date(2025, 10, 20), None);

    let dates = expand_dates_with_horizon(&decl, 14).unwrap();

    assert_eq!(
        dates,
        vec![date(2025, 10, 20), date(2025, 10, 27), date(2025, 11, 3)]
    );
}

#[test]
fn weekly_with_no_days_is_invalid() {
    let decl = AvailabilityDeclaration::weekly(
        Mode::Busy,
        Vec::<Weekday>::new(),
        date(2025, 10, 20),
        Some(date(2025, 11, 3)),
    );
    assert!(matches!(
        expand_dates(&decl),
        Err(EngineError::InvalidDeclaration(_))
    ));
}

#[test]
fn end_before_start_is_invalid() {
    let decl = AvailabilityDeclaration::weekly(
        Mode::Busy,
        [Weekday::Mon],
        date(2025, 11, 3),
        Some(date(2025, 10, 20)),
    );
    assert!(matches!(
        expand_dates(&decl),
        Err(EngineError::InvalidDeclaration(_))
    ));
}

#[test]
fn longest_weekly_range_keeps_its_last_date() {
    // 2025-01-06 is a Monday; MAX_SPAN_DAYS - 1 is a whole number of weeks.
    let start = date(2025, 1, 6);
    let end = start + Days::new(MAX_SPAN_DAYS as u64 - 1);
    let decl = AvailabilityDeclaration::weekly(Mode::Busy, [Weekday::Mon], start, Some(end));

    let dates = expand_dates(&decl).unwrap();

    assert_eq!(dates.len(), 9363);
    assert_eq!(dates.first(), Some(&start));
    assert_eq!(dates.last(), Some(&end));
}

#[test]
fn weekly_range_past_the_span_limit_is_invalid() {
    let start = date(2025, 1, 6);
    let end = start + Days::new(MAX_SPAN_DAYS as u64);
    let decl = AvailabilityDeclaration::weekly(Mode::Busy, [Weekday::Mon], start, Some(end));

    assert!(matches!(
        expand_dates(&decl),
        Err(EngineError::InvalidDeclaration(_))
    ));
}

#[test]
fn out_of_range_horizon_is_invalid() {
    let decl =
        AvailabilityDeclaration::weekly(Mode::Busy, [Weekday::Mon], date(2025, 1, 6), None);

    assert!(matches!(
        expand_dates_with_horizon(&decl, u32::MAX),
        Err(EngineError::InvalidDeclaration(_))
    ));
    assert!(matches!(
        expand_dates_with_horizon(&decl, 100_000),
        Err(EngineError::InvalidDeclaration(_))
    ));
}

#[test]
fn expansion_is_restartable() {
    let decl = AvailabilityDeclaration::weekly(
        Mode::Available,
        [Weekday::Tue, Weekday::Sat],
        date(2026, 2, 1),
        Some(date(2026, 3, 31)),
    )
    .full_day();

    let first = expand_dates(&decl).unwrap();
    let second = expand_dates(&decl).unwrap();

    assert_eq!(first, second);
    assert!(first
        .iter()
        .all(|d| matches!(d.weekday(), Weekday::Tue | Weekday::Sat)));
}
