//! End-to-end flows through `CareEngine` with a fixed clock.

use std::cell::RefCell;
use std::rc::Rc;

use care_engine::engine::AVAILABILITY_CHANGE_REASON;
use care_engine::{
    Appointment, AppointmentId, AppointmentStatus, AvailabilityDeclaration, CareEngine,
    ClientContact, DaySummary, EngineConfig, EngineError, FixedClock, Mode, SubmitOutcome, Task,
    TaskChecklist, TimeSlot,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

fn slot(s: &str) -> TimeSlot {
    s.parse().unwrap()
}

fn engine_at(now: NaiveDateTime) -> CareEngine<FixedClock> {
    CareEngine::new(EngineConfig::default(), FixedClock::new(now)).unwrap()
}

fn booking(id: &str, on: NaiveDate, range: &str, status: AppointmentStatus) -> Appointment {
    Appointment::new(
        id,
        on,
        slot(range),
        ClientContact::new("Nguyen").with_phone("0901234567"),
        "123 X St",
    )
    .with_status(status)
}

// ── Two-phase availability writes ───────────────────────────────────────────

#[test]
fn busy_day_requires_confirmation_then_cancels() {
    let mut engine = engine_at(at(2025, 11, 1, 9, 0));
    engine
        .insert_appointment(booking(
            "a1",
            date(2025, 11, 11),
            "08:00-12:00",
            AppointmentStatus::Pending,
        ))
        .unwrap();
    let decl = AvailabilityDeclaration::one_time(Mode::Busy, date(2025, 11, 11));

    let first = engine.submit(&decl, false).unwrap();
    let SubmitOutcome::RequiresConfirmation { conflicts } = first else {
        panic!("expected a confirmation request");
    };
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].appointment_id, AppointmentId::from("a1"));
    assert!(engine.availability(date(2025, 11, 11)).is_none());
    assert_eq!(
        engine.get_status(&AppointmentId::from("a1")).unwrap(),
        AppointmentStatus::Pending
    );

    let second = engine.submit(&decl, true).unwrap();
    assert_eq!(
        second,
        SubmitOutcome::Committed {
            dates: vec![date(2025, 11, 11)],
            cancelled: vec![AppointmentId::from("a1")],
        }
    );

    let appt = engine.appointment(&AppointmentId::from("a1")).unwrap();
    assert_eq!(appt.status, AppointmentStatus::Cancelled);
    assert_eq!(
        appt.cancellation_reason.as_deref(),
        Some(AVAILABILITY_CHANGE_REASON)
    );
    let record = engine.availability(date(2025, 11, 11)).unwrap();
    assert_eq!(record.mode, Mode::Busy);
    assert_eq!(engine.day_summary(date(2025, 11, 11)), DaySummary::Busy);
}

#[test]
fn clean_write_commits_immediately() {
    let mut engine = engine_at(at(2025, 10, 1, 9, 0));
    engine
        .insert_appointment(booking(
            "a1",
            date(2025, 10, 22),
            "08:00-12:00",
            AppointmentStatus::Pending,
        ))
        .unwrap();
    let decl = AvailabilityDeclaration::weekly(
        Mode::Available,
        [Weekday::Mon, Weekday::Wed],
        date(2025, 10, 20),
        Some(date(2025, 11, 3)),
    )
    .with_slots([slot("08:00-12:00")]);

    let outcome = engine.submit(&decl, false).unwrap();

    let SubmitOutcome::Committed { dates, cancelled } = outcome else {
        panic!("expected a clean commit");
    };
    assert_eq!(dates.len(), 5);
    assert!(cancelled.is_empty());
    assert_eq!(engine.calendar().len(), 5);
    assert_eq!(engine.day_summary(date(2025, 10, 22)), DaySummary::Partial);
    assert_eq!(engine.day_summary(date(2025, 10, 21)), DaySummary::Unset);
}

#[test]
fn preview_changes_nothing() {
    let mut engine = engine_at(at(2025, 10, 1, 9, 0));
    engine
        .insert_appointment(booking(
            "a1",
            date(2025, 10, 22),
            "07:00-13:00",
            AppointmentStatus::New,
        ))
        .unwrap();
    let decl = AvailabilityDeclaration::one_time(Mode::Available, date(2025, 10, 22))
        .with_slots([slot("08:00-12:00")]);

    let conflicts = engine.preview(&decl).unwrap();

    assert_eq!(conflicts.len(), 1);
    assert!(engine.calendar().is_empty());
    assert_eq!(
        engine.get_status(&AppointmentId::from("a1")).unwrap(),
        AppointmentStatus::New
    );
}

#[test]
fn confirmed_write_recomputes_conflicts() {
    let mut engine = engine_at(at(2025, 11, 1, 9, 0));
    engine
        .insert_appointment(booking(
            "a1",
            date(2025, 11, 11),
            "08:00-12:00",
            AppointmentStatus::Pending,
        ))
        .unwrap();
    let decl = AvailabilityDeclaration::one_time(Mode::Busy, date(2025, 11, 11));
    assert!(matches!(
        engine.submit(&decl, false).unwrap(),
        SubmitOutcome::RequiresConfirmation { .. }
    ));

    // The client cancels in between; the confirmed write has nothing to cancel.
    engine
        .cancel(&AppointmentId::from("a1"), "plans changed")
        .unwrap();
    let outcome = engine.submit(&decl, true).unwrap();

    assert_eq!(
        outcome,
        SubmitOutcome::Committed {
            dates: vec![date(2025, 11, 11)],
            cancelled: vec![],
        }
    );
    assert_eq!(
        engine
            .appointment(&AppointmentId::from("a1"))
            .unwrap()
            .cancellation_reason
            .as_deref(),
        Some("plans changed")
    );
}

#[test]
fn later_declaration_replaces_overlapping_dates() {
    let mut engine = engine_at(at(2025, 10, 1, 9, 0));
    let weekly = AvailabilityDeclaration::weekly(
        Mode::Available,
        [Weekday::Mon],
        date(2025, 10, 20),
        Some(date(2025, 11, 3)),
    )
    .with_slots([slot("08:00-12:00")]);
    engine.submit(&weekly, false).unwrap();

    let override_day =
        AvailabilityDeclaration::one_time(Mode::Available, date(2025, 10, 27)).full_day();
    engine.submit(&override_day, false).unwrap();

    assert_eq!(engine.calendar().len(), 3);
    assert_eq!(engine.day_summary(date(2025, 10, 20)), DaySummary::Partial);
    assert_eq!(engine.day_summary(date(2025, 10, 27)), DaySummary::FullDay);
    assert!(engine
        .availability(date(2025, 10, 27))
        .unwrap()
        .time_slots
        .is_empty());
}

#[test]
fn invalid_declaration_is_rejected_before_detection() {
    let mut engine = engine_at(at(2025, 10, 1, 9, 0));
    let empty = AvailabilityDeclaration::one_time(Mode::Available, date(2025, 10, 22));

    assert!(matches!(
        engine.submit(&empty, true),
        Err(EngineError::InvalidDeclaration(_))
    ));
    assert!(engine.calendar().is_empty());
}

#[test]
fn horizon_from_config_bounds_open_weekly() {
    let config = EngineConfig {
        recurrence_horizon_days: 13,
        ..EngineConfig::default()
    };
    let mut engine = CareEngine::new(config, FixedClock::new(at(2025, 10, 1, 9, 0))).unwrap();
    let decl =
        AvailabilityDeclaration::weekly(Mode::Busy, [Weekday::Mon], date(2025, 10, 20), None);

    let SubmitOutcome::Committed { dates, .. } = engine.submit(&decl, false).unwrap() else {
        panic!("expected a clean commit");
    };

    assert_eq!(dates, vec![date(2025, 10, 20), date(2025, 10, 27)]);
}

// ── Availability reads ──────────────────────────────────────────────────────

#[test]
fn free_time_subtracts_live_appointments() {
    let mut engine = engine_at(at(2025, 10, 1, 9, 0));
    let decl = AvailabilityDeclaration::one_time(Mode::Available, date(2025, 10, 22))
        .with_slots([slot("08:00-12:00"), slot("14:00-18:00")]);
    engine.submit(&decl, false).unwrap();
    engine
        .insert_appointment(booking(
            "a1",
            date(2025, 10, 22),
            "09:00-10:00",
            AppointmentStatus::Pending,
        ))
        .unwrap();
    engine
        .insert_appointment(booking(
            "gone",
            date(2025, 10, 22),
            "15:00-16:00",
            AppointmentStatus::Cancelled,
        ))
        .unwrap();

    assert_eq!(
        engine.free_time(date(2025, 10, 22)),
        vec![slot("08:00-09:00"), slot("10:00-12:00"), slot("14:00-18:00")]
    );
    assert!(engine.free_time(date(2025, 10, 23)).is_empty());
}

#[test]
fn available_slots_flags_booked_pieces() {
    let mut engine = engine_at(at(2025, 10, 1, 9, 0));
    let decl = AvailabilityDeclaration::one_time(Mode::Available, date(2025, 10, 22))
        .with_slots([slot("08:00-11:00")]);
    engine.submit(&decl, false).unwrap();
    engine
        .insert_appointment(booking(
            "a1",
            date(2025, 10, 22),
            "09:30-10:00",
            AppointmentStatus::Pending,
        ))
        .unwrap();

    let slots = engine.available_slots(date(2025, 10, 22), 60).unwrap();

    let summary: Vec<(String, bool)> = slots
        .iter()
        .map(|s| (s.slot.to_string(), s.available))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("08:00-09:00".to_string(), true),
            ("09:00-10:00".to_string(), false),
            ("10:00-11:00".to_string(), true),
        ]
    );
    assert_eq!(slots[1].blocked_by, Some(AppointmentId::from("a1")));
    assert!(matches!(
        engine.available_slots(date(2025, 10, 22), 0),
        Err(EngineError::InvalidTime(_))
    ));
}

#[test]
fn busy_day_offers_no_time() {
    let mut engine = engine_at(at(2025, 10, 1, 9, 0));
    engine
        .submit(
            &AvailabilityDeclaration::one_time(Mode::Busy, date(2025, 10, 22)),
            false,
        )
        .unwrap();

    assert!(engine.free_time(date(2025, 10, 22)).is_empty());
    assert!(engine
        .available_slots(date(2025, 10, 22), 30)
        .unwrap()
        .is_empty());
}

// ── Lifecycle through the engine clock ──────────────────────────────────────

#[test]
fn full_engagement_follows_the_clock() {
    let mut engine = engine_at(at(2025, 11, 1, 9, 0));
    let tasks = TaskChecklist {
        fixed: vec![Task::new("F1", "Measure blood pressure")],
        flexible: vec![],
        optional: vec![Task::new("O1", "Walk outside")],
    };
    engine
        .insert_appointment(
            booking("a1", date(2025, 11, 11), "08:00-12:00", AppointmentStatus::New)
                .with_tasks(tasks),
        )
        .unwrap();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    engine.subscribe(move |e| sink.borrow_mut().push((e.from, e.to, e.at)));
    let id = AppointmentId::from("a1");

    engine.accept(&id).unwrap();
    engine.clock().set(at(2025, 11, 11, 8, 0));
    engine.start(&id).unwrap();
    engine.add_note(&id, "caregiver", "Blood pressure normal").unwrap();
    assert!(matches!(
        engine.complete_recorded(&id),
        Err(EngineError::IncompleteTasks { .. })
    ));
    engine.mark_task(&id, "F1", true).unwrap();
    engine.clock().advance(Duration::hours(4));
    engine.complete_recorded(&id).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            (
                AppointmentStatus::New,
                AppointmentStatus::Pending,
                at(2025, 11, 1, 9, 0)
            ),
            (
                AppointmentStatus::Pending,
                AppointmentStatus::InProgress,
                at(2025, 11, 11, 8, 0)
            ),
            (
                AppointmentStatus::InProgress,
                AppointmentStatus::Completed,
                at(2025, 11, 11, 12, 0)
            ),
        ]
    );
    assert_eq!(engine.appointment(&id).unwrap().notes.len(), 1);
}

#[test]
fn expired_requests_use_the_engine_clock() {
    let mut engine = engine_at(at(2025, 11, 8, 12, 0));
    engine
        .insert_appointment(booking(
            "a1",
            date(2025, 11, 11),
            "08:00-12:00",
            AppointmentStatus::New,
        ))
        .unwrap();

    assert!(engine.expired_requests().is_empty());
    engine.clock().set(at(2025, 11, 9, 0, 0));
    assert_eq!(engine.expired_requests(), vec![AppointmentId::from("a1")]);
    assert!(matches!(
        engine.accept(&AppointmentId::from("a1")),
        Err(EngineError::DeadlineExpired { .. })
    ));
}

#[test]
fn wider_response_window_moves_the_deadline() {
    let config = EngineConfig {
        response_window_days: 5,
        ..EngineConfig::default()
    };
    let mut engine = CareEngine::new(config, FixedClock::new(at(2025, 11, 7, 0, 0))).unwrap();
    engine
        .insert_appointment(booking(
            "a1",
            date(2025, 11, 11),
            "08:00-12:00",
            AppointmentStatus::New,
        ))
        .unwrap();

    assert!(matches!(
        engine.accept(&AppointmentId::from("a1")),
        Err(EngineError::DeadlineExpired { .. })
    ));
}

// ── Configuration ───────────────────────────────────────────────────────────

#[test]
fn config_parses_toml_with_defaults() {
    let config = EngineConfig::from_toml_str(
        r#"
        cancellation_window_days = 2
        timezone = "Asia/Ho_Chi_Minh"
        "#,
    )
    .unwrap();

    assert_eq!(config.cancellation_window_days, 2);
    assert_eq!(config.response_window_days, 3);
    assert_eq!(config.recurrence_horizon_days, 365);
    assert_eq!(config.tz().unwrap(), chrono_tz::Asia::Ho_Chi_Minh);
}

#[test]
fn empty_config_is_the_default() {
    assert_eq!(
        EngineConfig::from_toml_str("").unwrap(),
        EngineConfig::default()
    );
}

#[test]
fn config_rejects_unknown_timezone() {
    assert!(matches!(
        EngineConfig::from_toml_str(r#"timezone = "Mars/Olympus""#),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn config_rejects_unknown_fields() {
    assert!(matches!(
        EngineConfig::from_toml_str("response_days = 3"),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn config_rejects_zero_horizon() {
    assert!(matches!(
        EngineConfig::from_toml_str("recurrence_horizon_days = 0"),
        Err(EngineError::Config(_))
    ));
}

#[test]
fn config_rejects_horizon_beyond_expansion_limit() {
    assert!(matches!(
        EngineConfig::from_toml_str("recurrence_horizon_days = 4294967295"),
        Err(EngineError::Config(_))
    ));
    assert!(matches!(
        EngineConfig::from_toml_str("recurrence_horizon_days = 65535"),
        Err(EngineError::Config(_))
    ));
    assert!(EngineConfig::from_toml_str("recurrence_horizon_days = 65534").is_ok());
}

#[test]
fn system_clock_engine_builds_from_config() {
    let engine = CareEngine::with_system_clock(EngineConfig::default()).unwrap();
    assert_eq!(engine.clock().timezone(), chrono_tz::Tz::UTC);
}
