//! Time coverage: merging declared slots and testing whether an interval is
//! fully inside declared free time.
//!
//! Sorts slots by start, merges overlapping or touching ranges in one pass,
//! then answers containment against the merged set. A target that spans a gap
//! between two merged ranges is not covered.

use crate::slot::TimeSlot;

/// What a declaration (or a stored record) makes free on a single day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    /// The whole day is free; every target is covered.
    FullDay,
    /// Merged, sorted, disjoint free ranges.
    Slots(Vec<TimeSlot>),
}

impl Coverage {
    /// Build coverage from a full-day flag and raw (unmerged) slots.
    pub fn new(is_full_day: bool, slots: &[TimeSlot]) -> Self {
        if is_full_day {
            Coverage::FullDay
        } else {
            Coverage::Slots(merge_slots(slots))
        }
    }

    pub fn covers(&self, target: &TimeSlot) -> bool {
        match self {
            Coverage::FullDay => true,
            Coverage::Slots(merged) => is_fully_covered(target, merged),
        }
    }

    /// The free ranges as slots; a full day is `00:00-24:00`.
    pub fn ranges(&self) -> Vec<TimeSlot> {
        match self {
            Coverage::FullDay => vec![TimeSlot::whole_day()],
            Coverage::Slots(merged) => merged.clone(),
        }
    }
}

/// Merge overlapping or touching slots into a minimal sorted cover.
///
/// A slot joins the running range when its start is at or before the running
/// end. Merging an already-merged list returns it unchanged.
pub fn merge_slots(slots: &[TimeSlot]) -> Vec<TimeSlot> {
    let mut sorted: Vec<TimeSlot> = slots.to_vec();
    if sorted.is_empty() {
        return sorted;
    }

    sorted.sort_by_key(|s| (s.start(), s.end()));

    let mut merged: Vec<(u16, u16)> = Vec::with_capacity(sorted.len());
    for slot in sorted {
        if let Some(last) = merged.last_mut() {
            if slot.start() <= last.1 {
                last.1 = last.1.max(slot.end());
                continue;
            }
        }
        merged.push((slot.start(), slot.end()));
    }

    merged
        .into_iter()
        .filter_map(|(start, end)| TimeSlot::new(start, end).ok())
        .collect()
}

/// True iff a single merged range contains the whole target.
///
/// `merged` must come from [`merge_slots`]; unmerged input under-reports
/// coverage for targets that span touching slots.
pub fn is_fully_covered(target: &TimeSlot, merged: &[TimeSlot]) -> bool {
    merged.iter().any(|range| range.contains(target))
}

/// Gaps inside `window` not occupied by any of `busy`.
///
/// Busy ranges may overlap; they are clipped to the window and merged first.
pub fn free_gaps(window: &TimeSlot, busy: &[TimeSlot]) -> Vec<TimeSlot> {
    let clipped: Vec<TimeSlot> = busy
        .iter()
        .filter(|b| b.overlaps(window))
        .filter_map(|b| {
            TimeSlot::new(b.start().max(window.start()), b.end().min(window.end())).ok()
        })
        .collect();
    let merged = merge_slots(&clipped);

    let mut gaps = Vec::new();
    let mut cursor = window.start();

    for range in &merged {
        if cursor < range.start() {
            if let Ok(gap) = TimeSlot::new(cursor, range.start()) {
                gaps.push(gap);
            }
        }
        cursor = cursor.max(range.end());
    }

    // Trailing gap after the last busy range.
    if cursor < window.end() {
        if let Ok(gap) = TimeSlot::new(cursor, window.end()) {
            gaps.push(gap);
        }
    }

    gaps
}
