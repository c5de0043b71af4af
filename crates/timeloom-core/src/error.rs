//! Error types for timeloom-core.
//!
//! The planner itself never fails: malformed rules and placements degrade to
//! "skipped" or "unplaceable" so one bad candidate cannot abort a run. These
//! errors surface at the edges, where clock strings and time ranges are
//! parsed and validated.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced while validating scheduling inputs.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Clock string that is not `HH:mm`
    #[error("invalid clock time '{0}': expected HH:mm")]
    InvalidClockTime(String),

    /// Concrete time range where the end does not come after the start
    #[error("invalid time range: end ({end}) must be after start ({start})")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Rule whose clock range is empty or inverted within the day
    #[error("invalid rule range: '{start}'..'{end}' is empty or inverted")]
    InvalidRuleRange { start: String, end: String },
}

/// Result type alias for ScheduleError
pub type Result<T, E = ScheduleError> = std::result::Result<T, E>;
