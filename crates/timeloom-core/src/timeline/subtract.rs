//! Interval subtraction over capacity slots.
//!
//! The single splitting primitive behind busy-time removal, pinned placement
//! consumption, and placement-as-busy updates during a run. All operations
//! are pure slice-and-replace: they return new slot lists instead of mutating
//! shared state.

use chrono::{DateTime, Utc};

use super::window::Slot;
use crate::schedule::BusyBlock;

/// Remove `[start, end)` from every slot, splitting around the span.
///
/// A slot untouched by the span passes through unchanged; an overlapped slot
/// is replaced by its "before" and/or "after" fragments, with zero-length
/// fragments dropped. An empty or inverted span is a no-op.
pub fn subtract_span(slots: Vec<Slot>, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Slot> {
    if end <= start {
        return slots;
    }

    let mut out = Vec::with_capacity(slots.len() + 1);
    for slot in slots {
        if start >= slot.end || end <= slot.start {
            out.push(slot);
            continue;
        }
        if start > slot.start {
            out.push(Slot::new(slot.start, start, &slot.time_map_id));
        }
        if end < slot.end {
            out.push(Slot::new(end, slot.end, &slot.time_map_id));
        }
    }
    out
}

/// Subtract busy blocks from slots, applying blocks in start order.
///
/// Later fragments are only checked against the remaining blocks, so the
/// whole pass stays linear in fragments produced.
///
/// # Returns
/// Free fragments with `end > start`, sorted ascending by start.
pub fn subtract_busy(slots: Vec<Slot>, blocks: &[BusyBlock]) -> Vec<Slot> {
    let mut ordered: Vec<&BusyBlock> = blocks.iter().collect();
    ordered.sort_by_key(|b| b.start);

    let mut free = slots;
    for block in ordered {
        free = subtract_span(free, block.start, block.end);
    }

    free.retain(|s| s.end > s.start);
    free.sort_by_key(|s| s.start);
    free
}
