//! Expansion of time maps into concrete availability windows.
//!
//! Each time map's weekly rules are walked day by day over the scheduling
//! horizon and turned into concrete `[start, end)` slots, clipped to `now`
//! and to the horizon end.

use chrono::{DateTime, Datelike, Days, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::{TimeMap, TimeMapId};

/// A contiguous stretch of capacity inside one time map.
///
/// The same shape serves raw availability windows (before busy subtraction)
/// and free capacity fragments (after). Invariant: `start < end`; zero-length
/// fragments are discarded wherever slots are produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_map_id: TimeMapId,
}

impl Slot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, time_map_id: &str) -> Self {
        Self {
            start,
            end,
            time_map_id: time_map_id.to_string(),
        }
    }

    /// Get duration in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Check if this slot can fit a task of the given duration.
    pub fn can_fit(&self, minutes: i64) -> bool {
        self.duration_minutes() >= minutes
    }
}

/// Expand time maps into concrete windows over `[now, horizon_end]`.
///
/// Rules that fail to parse or have inverted clock ranges are skipped rather
/// than aborting the run. Windows entirely in the past are dropped; a window
/// containing `now` has its start clamped to `now`; a window crossing the
/// horizon has its end clipped to `horizon_end`.
///
/// # Returns
/// Windows sorted ascending by start time.
pub fn build_windows(
    time_maps: &[TimeMap],
    now: DateTime<Utc>,
    horizon_end: DateTime<Utc>,
) -> Vec<Slot> {
    let mut windows = Vec::new();
    let first_day = now.date_naive();
    let last_day = horizon_end.date_naive();

    for map in time_maps {
        for rule in map.normalized_rules() {
            let Ok((start_clock, end_clock)) = rule.clock_range() else {
                continue;
            };

            let mut offset = 0u64;
            while let Some(day) = first_day.checked_add_days(Days::new(offset)) {
                if day > last_day {
                    break;
                }
                offset += 1;

                if day.weekday().num_days_from_sunday() as u8 != rule.day {
                    continue;
                }

                let mut start = day.and_time(start_clock).and_utc();
                let mut end = day.and_time(end_clock).and_utc();

                if end > horizon_end {
                    end = horizon_end;
                }
                if end <= now {
                    continue;
                }
                if start < now {
                    start = now;
                }
                if start >= end {
                    continue;
                }

                windows.push(Slot::new(start, end, &map.id));
            }
        }
    }

    merge_per_map(windows)
}

/// Coalesce overlapping or touching windows of the same map, so capacity
/// covered by more than one rule is never counted twice.
fn merge_per_map(mut windows: Vec<Slot>) -> Vec<Slot> {
    windows.sort_by(|a, b| {
        a.time_map_id
            .cmp(&b.time_map_id)
            .then(a.start.cmp(&b.start))
    });

    let mut merged: Vec<Slot> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(last) if last.time_map_id == window.time_map_id && window.start <= last.end => {
                if window.end > last.end {
                    last.end = window.end;
                }
            }
            _ => merged.push(window),
        }
    }

    merged.sort_by_key(|w| w.start);
    merged
}
