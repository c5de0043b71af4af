//! # Timeloom Core Library
//!
//! Computational core of the Timeloom task scheduler. It assigns discrete
//! task occurrences to time capacity drawn from recurring weekly
//! availability templates ("time maps"), after carving out externally-busy
//! calendar time, while honoring deadlines, priorities, user-pinned
//! placements, and sequential subtask ordering.
//!
//! The surrounding application (persistence, calendar sync, rendering,
//! recurrence expansion) supplies already-normalized inputs and consumes the
//! outputs; this crate performs no I/O and reads no clock unless `now` is
//! left unset on the request.
//!
//! ## Key Components
//!
//! - [`Planner`]: the single-pass scheduling loop over one input snapshot
//! - [`build_windows`]: expansion of weekly rules into concrete windows
//! - [`subtract_busy`]: fragmentation of windows around busy time
//! - [`PinnedState`]: normalization of user-fixed placements
//! - [`SequentialCoordinator`]: parent/child ordering constraints

pub mod error;
pub mod schedule;
pub mod scheduler;
pub mod timeline;

pub use error::ScheduleError;
pub use schedule::{
    BusyBlock, CalendarId, OccurrenceId, Placement, SubtaskMode, Task, TaskId, TimeMap,
    TimeMapId, TimeMapRule,
};
pub use scheduler::{
    PinnedState, PlanOutcome, PlanRequest, Planner, PlannerConfig, SequentialCoordinator,
    SequentialVerdict,
};
pub use timeline::{build_windows, subtract_busy, subtract_span, Slot};
