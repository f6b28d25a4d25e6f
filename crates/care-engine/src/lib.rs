//! # care-engine
//!
//! Availability reconciliation and appointment lifecycle for a single caregiver.
//!
//! A caregiver declares free or busy time, either once or weekly and either
//! for the whole day or by slots. The engine expands the declaration into
//! dates and checks it against booked appointments. It cancels conflicting
//! appointments only after explicit confirmation. Appointments move through a
//! status machine gated by a response deadline, a cancellation notice window,
//! a task checklist and a one-active-engagement admission rule.
//!
//! ## Modules
//!
//! - [`slot`]: `"HH:MM"` parsing and minute-of-day ranges
//! - [`declaration`]: what a caregiver submits
//! - [`expander`]: declaration → concrete calendar dates
//! - [`coverage`]: slot merging and full-coverage tests
//! - [`conflict`]: appointments a declaration would invalidate
//! - [`lifecycle`]: status state machine, gates and change publishing
//! - [`deadline`]: accept/reject response deadline
//! - [`admission`]: single active engagement rule for `start`
//! - [`availability`]: per-date records and free-slot queries
//! - [`engine`]: `CareEngine`, owning calendar, appointments and clock
//! - [`config`]: TOML engine settings
//! - [`error`]: error types

pub mod admission;
pub mod availability;
pub mod clock;
pub mod config;
pub mod conflict;
pub mod coverage;
pub mod deadline;
pub mod declaration;
pub mod engine;
pub mod error;
pub mod expander;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod slot;

pub use availability::{AvailabilityCalendar, AvailabilityRecord, DaySummary};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use conflict::{detect_conflicts, Conflict, ConflictReason};
pub use coverage::{is_fully_covered, merge_slots, Coverage};
pub use declaration::{AvailabilityDeclaration, Mode, Recurrence};
pub use engine::{CareEngine, SubmitOutcome};
pub use error::EngineError;
pub use expander::expand_dates;
pub use lifecycle::AppointmentLifecycle;
pub use model::{
    Appointment, AppointmentId, AppointmentStatus, ClientContact, DateKey, Task, TaskChecklist,
};
pub use notify::{ChangeEvent, Subscription};
pub use slot::TimeSlot;
