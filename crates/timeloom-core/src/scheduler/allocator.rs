//! First-fit slot allocation for a single task.
//!
//! Scans free capacity in time order and takes the earliest feasible
//! placement, splitting the consumed slot into its remainder fragments. A
//! task is always placed as one contiguous block equal to its full duration,
//! or not at all; it is never split across fragments.

use chrono::{DateTime, Duration, Utc};

use crate::schedule::{Placement, Task};
use crate::timeline::Slot;

/// Find the earliest feasible placement for `task` in `slots`.
///
/// Slots must be sorted ascending by start. Returns the placement and the
/// slot list with the consumed span split out, re-sorted by start; `None`
/// means the task is unplaceable this run.
pub fn allocate(task: &Task, slots: &[Slot], now: DateTime<Utc>) -> Option<(Placement, Vec<Slot>)> {
    allocate_from(task, slots, now, None)
}

/// First-fit allocation with an optional earliest-start floor.
///
/// The floor is how sequential chains keep a child from starting before its
/// predecessor ends.
pub fn allocate_from(
    task: &Task,
    slots: &[Slot],
    now: DateTime<Utc>,
    floor: Option<DateTime<Utc>>,
) -> Option<(Placement, Vec<Slot>)> {
    // A duration chrono cannot represent degrades to "unplaceable", the
    // same as any other infeasible candidate.
    let duration = Duration::try_minutes(task.duration_minutes)?;
    if duration <= Duration::zero() {
        return None;
    }

    for (index, slot) in slots.iter().enumerate() {
        if !task.allows_time_map(&slot.time_map_id) {
            continue;
        }
        // Slot opens too late to matter for this deadline.
        if slot.start >= task.deadline {
            continue;
        }

        let mut candidate_start = slot.start.max(now);
        if let Some(floor) = floor {
            candidate_start = candidate_start.max(floor);
        }
        let Some(candidate_end) = candidate_start.checked_add_signed(duration) else {
            continue;
        };

        if candidate_end > slot.end || candidate_end > task.deadline {
            continue;
        }

        let placement = Placement::new(task, &slot.time_map_id, candidate_start, candidate_end);

        let mut remaining = Vec::with_capacity(slots.len() + 1);
        remaining.extend_from_slice(&slots[..index]);
        if candidate_start > slot.start {
            remaining.push(Slot::new(slot.start, candidate_start, &slot.time_map_id));
        }
        if candidate_end < slot.end {
            remaining.push(Slot::new(candidate_end, slot.end, &slot.time_map_id));
        }
        remaining.extend_from_slice(&slots[index + 1..]);
        remaining.sort_by_key(|s| s.start);

        return Some((placement, remaining));
    }

    None
}
