//! Start admission: at most one active engagement per caregiver.
//!
//! Starting a second appointment is allowed only when every engagement
//! already in progress is for the same client at the same address (for
//! example, two back-to-back bookings by one family).

use crate::error::{EngineError, Result};
use crate::model::{Appointment, AppointmentStatus, ClientContact};

/// Same client: phone numbers when both sides have one, names otherwise.
pub fn same_client(a: &ClientContact, b: &ClientContact) -> bool {
    match (a.phone.as_deref(), b.phone.as_deref()) {
        (Some(pa), Some(pb)) => pa.trim() == pb.trim(),
        _ => a.name.trim() == b.name.trim(),
    }
}

/// Lowercased with whitespace runs collapsed to single spaces.
pub fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn same_address(a: &str, b: &str) -> bool {
    normalize_address(a) == normalize_address(b)
}

/// Refuse `candidate` if any other in-progress appointment differs in client
/// or address.
///
/// # Errors
/// Returns `EngineError::StartConflict` naming the first blocking engagement.
pub fn check_start<'a>(
    candidate: &Appointment,
    appointments: impl IntoIterator<Item = &'a Appointment>,
) -> Result<()> {
    let blocking = appointments.into_iter().find(|other| {
        other.id != candidate.id
            && other.status == AppointmentStatus::InProgress
            && !(same_client(&candidate.client, &other.client)
                && same_address(&candidate.address, &other.address))
    });

    match blocking {
        Some(other) => Err(EngineError::StartConflict {
            conflicting_id: other.id.clone(),
            client_name: other.client.name.clone(),
            address: other.address.clone(),
        }),
        None => Ok(()),
    }
}
