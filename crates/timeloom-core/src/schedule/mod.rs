//! Domain types for the scheduling core.
//!
//! These are the normalized inputs the surrounding application hands to the
//! planner: weekly availability templates (time maps), externally-busy
//! calendar intervals, occurrence-expanded task candidates, and placements
//! (pinned by the user or produced by a previous run).

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Unique identifier for a task.
pub type TaskId = String;

/// Unique identifier for one due-dated occurrence of a task.
pub type OccurrenceId = String;

/// Unique identifier for a time map.
pub type TimeMapId = String;

/// Unique identifier for an external calendar.
pub type CalendarId = String;

/// Parse an `HH:mm` clock string.
pub fn parse_clock(value: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ScheduleError::InvalidClockTime(value.to_string()))
}

/// One weekly recurrence rule of a time map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeMapRule {
    /// Day of week, 0=Sun .. 6=Sat.
    pub day: u8,
    pub start_time: String, // HH:mm
    pub end_time: String,   // HH:mm
}

impl TimeMapRule {
    pub fn new(day: u8, start_time: &str, end_time: &str) -> Self {
        Self {
            day,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }

    /// Parse and validate the rule's clock range.
    pub fn clock_range(&self) -> Result<(NaiveTime, NaiveTime), ScheduleError> {
        let start = parse_clock(&self.start_time)?;
        let end = parse_clock(&self.end_time)?;
        if start >= end {
            return Err(ScheduleError::InvalidRuleRange {
                start: self.start_time.clone(),
                end: self.end_time.clone(),
            });
        }
        Ok((start, end))
    }
}

/// A named recurring weekly availability template.
///
/// The legacy single-range form (`days` plus one start/end pair) is still
/// accepted and expanded into one rule per listed day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeMap {
    pub id: TimeMapId,
    #[serde(default)]
    pub rules: Vec<TimeMapRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl TimeMap {
    pub fn new(id: &str, rules: Vec<TimeMapRule>) -> Self {
        Self {
            id: id.to_string(),
            rules,
            days: None,
            start_time: None,
            end_time: None,
        }
    }

    /// All rules in the normalized form, legacy fields expanded.
    pub fn normalized_rules(&self) -> Vec<TimeMapRule> {
        let mut rules = self.rules.clone();
        if let (Some(days), Some(start), Some(end)) =
            (&self.days, &self.start_time, &self.end_time)
        {
            for &day in days {
                rules.push(TimeMapRule::new(day, start, end));
            }
        }
        rules
    }
}

/// An externally-imposed unavailable interval, e.g. a synced calendar event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusyBlock {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Calendar the block came from. Blocks without one always apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<CalendarId>,
}

impl BusyBlock {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            calendar_id: None,
        }
    }

    pub fn with_calendar(mut self, calendar_id: &str) -> Self {
        self.calendar_id = Some(calendar_id.to_string());
        self
    }

    /// Check if this block overlaps with a time range.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    /// Whether this block constrains the given task.
    ///
    /// A task with a non-empty `external_calendar_ids` list has opted out of
    /// blocking from every calendar outside that list. Blocks with no
    /// calendar id always apply.
    pub fn blocks_task(&self, task: &Task) -> bool {
        match &self.calendar_id {
            None => true,
            Some(id) => {
                task.external_calendar_ids.is_empty()
                    || task.external_calendar_ids.iter().any(|c| c == id)
            }
        }
    }
}

/// How a parent's children may be placed relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubtaskMode {
    /// No ordering constraint between siblings.
    Parallel,
    /// Siblings chain end-to-start in sorted order.
    Sequential,
    /// At most one sibling is placed per run.
    SequentialSingle,
}

/// One occurrence-expanded scheduling candidate.
///
/// A repeating task contributes one candidate per occurrence; `deadline` is
/// that occurrence's own due date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_id: Option<OccurrenceId>,
    pub duration_minutes: i64,
    /// Reserved for split scheduling. Allocation always places the full
    /// duration as one contiguous block and never consults this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_block_minutes: Option<i64>,
    pub deadline: DateTime<Utc>,
    /// 1..=5, 5 is most urgent.
    pub priority: u8,
    /// Time maps this task may be placed into.
    pub time_map_ids: Vec<TimeMapId>,
    /// Calendars whose busy blocks constrain this task; empty means all do.
    #[serde(default)]
    pub external_calendar_ids: Vec<CalendarId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtask_parent_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtask_mode: Option<SubtaskMode>,
}

impl Task {
    /// Check if this task may be placed into the given time map.
    pub fn allows_time_map(&self, time_map_id: &str) -> bool {
        self.time_map_ids.iter().any(|id| id == time_map_id)
    }

    /// Whether this task is governed by sequential sibling ordering.
    pub fn is_sequential_child(&self) -> bool {
        self.subtask_parent_id.is_some()
            && matches!(
                self.subtask_mode,
                Some(SubtaskMode::Sequential | SubtaskMode::SequentialSingle)
            )
    }
}

/// A concrete assignment of a task occurrence to an interval in a time map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    #[serde(default)]
    pub id: String,
    pub task_id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence_id: Option<OccurrenceId>,
    pub time_map_id: TimeMapId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub pinned: bool,
}

impl Placement {
    /// Create a new (non-pinned) placement for a task.
    pub fn new(task: &Task, time_map_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task.id.clone(),
            occurrence_id: task.occurrence_id.clone(),
            time_map_id: time_map_id.to_string(),
            start,
            end,
            pinned: false,
        }
    }

    /// Get duration in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Validate the time range.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.end <= self.start {
            return Err(ScheduleError::InvalidTimeRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}
