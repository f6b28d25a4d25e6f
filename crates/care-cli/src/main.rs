//! `carectl` CLI: expand availability declarations and check them against
//! booked appointments from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Expand a declaration into dates (stdin → stdout)
//! cat weekly.json | carectl expand
//!
//! # Show which appointments a declaration would invalidate
//! carectl conflicts -d busy.json -a appointments.json
//!
//! # Commit a declaration; conflicts need --confirm
//! carectl apply -d busy.json -a appointments.json --confirm
//!
//! # Fixed-length bookable slots on one date
//! carectl slots -d weekly.json -a appointments.json --date 2025-10-22 --minutes 30
//!
//! # Accept/reject deadline for a service date
//! carectl deadline --date 2025-11-11
//! ```

use anyhow::{Context, Result};
use care_engine::availability::AvailabilityCalendar;
use care_engine::deadline::response_deadline;
use care_engine::expander::expand_dates_with_horizon;
use care_engine::{
    Appointment, AvailabilityDeclaration, CareEngine, Conflict, ConflictReason, EngineConfig,
    SubmitOutcome,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "carectl",
    version,
    about = "Caregiver availability and appointment CLI"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (TOML); defaults apply if omitted
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a declaration into concrete dates, one per line
    Expand {
        /// Declaration JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// List appointments a declaration would invalidate
    Conflicts {
        /// Declaration JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        declaration: Option<String>,
        /// Appointments JSON file (array)
        #[arg(short, long)]
        appointments: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write a declaration, cancelling conflicts when confirmed
    Apply {
        /// Declaration JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        declaration: Option<String>,
        /// Appointments JSON file (array)
        #[arg(short, long)]
        appointments: String,
        /// Cancel conflicting appointments and commit
        #[arg(long)]
        confirm: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show bookable fixed-length slots on one date
    Slots {
        /// Declaration JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        declaration: Option<String>,
        /// Appointments JSON file (array); none if omitted
        #[arg(short, long)]
        appointments: Option<String>,
        /// Date to inspect (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Slot length in minutes
        #[arg(long, default_value_t = 60)]
        minutes: u16,
    },
    /// Print the accept/reject deadline for a service date
    Deadline {
        /// Service date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Override the configured response window in days
        #[arg(long)]
        window: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Expand { input } => {
            let decl = read_declaration(input.as_deref())?;
            let dates = expand_dates_with_horizon(&decl, config.recurrence_horizon_days)
                .context("Failed to expand declaration")?;
            let lines: Vec<String> = dates.iter().map(|d| d.to_string()).collect();
            write_lines(&lines);
        }
        Commands::Conflicts {
            declaration,
            appointments,
            json,
        } => {
            let decl = read_declaration(declaration.as_deref())?;
            let appts = read_appointments(&appointments)?;
            let mut engine = CareEngine::with_system_clock(config)?;
            for appt in appts {
                engine.insert_appointment(appt)?;
            }
            let conflicts = engine
                .preview(&decl)
                .context("Failed to check declaration")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&conflicts)?);
            } else if conflicts.is_empty() {
                println!("no conflicts");
            } else {
                write_lines(&conflicts.iter().map(format_conflict).collect::<Vec<_>>());
            }
        }
        Commands::Apply {
            declaration,
            appointments,
            confirm,
            json,
        } => {
            let decl = read_declaration(declaration.as_deref())?;
            let appts = read_appointments(&appointments)?;
            let mut engine = CareEngine::with_system_clock(config)?;
            for appt in appts {
                engine.insert_appointment(appt)?;
            }
            let outcome = engine
                .submit(&decl, confirm)
                .context("Failed to apply declaration")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }
        Commands::Slots {
            declaration,
            appointments,
            date,
            minutes,
        } => {
            let decl = read_declaration(declaration.as_deref())?;
            let appts = match appointments.as_deref() {
                Some(path) => read_appointments(path)?,
                None => Vec::new(),
            };
            let dates = expand_dates_with_horizon(&decl, config.recurrence_horizon_days)
                .context("Failed to expand declaration")?;
            let mut calendar = AvailabilityCalendar::new();
            calendar.commit(&decl, &dates);

            let slots = calendar
                .available_slots(date, minutes, &appts)
                .context("Failed to compute slots")?;
            if slots.is_empty() {
                println!("no free time on {}", date);
            }
            for slot in slots {
                match slot.blocked_by {
                    Some(id) => println!("{}  booked ({})", slot.slot, id),
                    None => println!("{}  free", slot.slot),
                }
            }
        }
        Commands::Deadline { date, window } => {
            let window = window.unwrap_or(config.response_window_days);
            println!("{}", response_deadline(date, window));
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("Failed to load config: {}", path)),
        None => Ok(EngineConfig::default()),
    }
}

fn read_declaration(path: Option<&str>) -> Result<AvailabilityDeclaration> {
    let text = read_input(path)?;
    serde_json::from_str(&text).context("Failed to parse declaration JSON")
}

fn read_appointments(path: &str) -> Result<Vec<Appointment>> {
    let text = read_input(Some(path))?;
    let appts: Vec<Appointment> =
        serde_json::from_str(&text).context("Failed to parse appointments JSON")?;
    debug!("Loaded {} appointments from {}", appts.len(), path);
    Ok(appts)
}

fn format_conflict(conflict: &Conflict) -> String {
    let reason = match &conflict.reason {
        ConflictReason::BusyDay => "busy day".to_string(),
        ConflictReason::NotCovered { range } => format!("{} not covered", range),
    };
    format!(
        "{}  {}  {}  {}",
        conflict.date, conflict.appointment_id, conflict.client_name, reason
    )
}

fn print_outcome(outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Committed { dates, cancelled } => {
            println!("committed {} dates", dates.len());
            for date in dates {
                println!("  {}", date);
            }
            for id in cancelled {
                println!("cancelled {}", id);
            }
        }
        SubmitOutcome::RequiresConfirmation { conflicts } => {
            for conflict in conflicts {
                println!("{}", format_conflict(conflict));
            }
            println!(
                "{} conflicting appointment(s); re-run with --confirm to cancel them and commit",
                conflicts.len()
            );
        }
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
