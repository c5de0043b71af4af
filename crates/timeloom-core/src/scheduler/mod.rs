//! The scheduling loop.
//!
//! Drives one planning run: expand availability windows over the horizon,
//! carve out busy and pinned time, order the candidates, and place them one
//! at a time while keeping sequential sibling constraints intact. The whole
//! pass is synchronous and pure with respect to its inputs; `now` can be
//! injected for deterministic runs.

mod allocator;
mod pinned;
mod sequential;
mod sorting;

pub use allocator::{allocate, allocate_from};
pub use pinned::PinnedState;
pub use sequential::{SequentialCoordinator, SequentialVerdict};
pub use sorting::sort_candidates;

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::{BusyBlock, OccurrenceId, Placement, Task, TaskId, TimeMap};
use crate::timeline::{build_windows, subtract_busy, subtract_span, Slot};

/// Inputs for one planning run, as handed over by the surrounding
/// application: occurrence-expanded tasks, availability templates, busy
/// calendar time, and pins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequest {
    pub tasks: Vec<Task>,
    pub time_maps: Vec<TimeMap>,
    #[serde(default)]
    pub busy: Vec<BusyBlock>,
    #[serde(default)]
    pub pinned_placements: Vec<Placement>,
    #[serde(default)]
    pub pinned_occurrence_ids: Vec<OccurrenceId>,
    #[serde(default)]
    pub pinned_task_ids: Vec<TaskId>,
    pub horizon_days: u32,
    /// Injected clock for deterministic runs; wall clock when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<DateTime<Utc>>,
}

/// Outcome of one planning run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanOutcome {
    /// Pinned placements verbatim, then newly produced placements.
    pub scheduled: Vec<Placement>,
    /// Attempted, no feasible slot; retryable once capacity frees up.
    pub unscheduled: HashSet<TaskId>,
    /// Blocked by sequential sibling ordering; expected to clear on its own.
    pub deferred: HashSet<TaskId>,
    /// Due beyond the horizon; deliberately not attempted.
    pub ignored: Vec<TaskId>,
    /// Residual free capacity, for diagnostics and reporting.
    pub free_slots: Vec<Slot>,
}

/// Planner configuration.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Upper bound on the requested scheduling horizon (days).
    pub max_horizon_days: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_horizon_days: 365,
        }
    }
}

/// Single-pass planner over one in-memory input snapshot.
///
/// The caller re-runs `plan` from a fresh snapshot whenever the underlying
/// data (tasks, busy calendars, pins) changes.
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    /// Create a planner with default config.
    pub fn new() -> Self {
        Self {
            config: PlannerConfig::default(),
        }
    }

    /// Create with custom config.
    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Run one planning pass.
    ///
    /// Never fails: malformed rules, placements, and candidates degrade to
    /// skipped or unplaceable rather than aborting the batch.
    pub fn plan(&self, request: &PlanRequest) -> PlanOutcome {
        let now = request.now.unwrap_or_else(Utc::now);
        let horizon_days = request.horizon_days.min(self.config.max_horizon_days);
        let horizon_end = now + Duration::days(i64::from(horizon_days));

        let windows = build_windows(&request.time_maps, now, horizon_end);

        let pinned = PinnedState::build(
            &request.pinned_placements,
            &request.pinned_occurrence_ids,
            &request.pinned_task_ids,
        );

        // Default pool: what a task with no calendar opt-outs can see.
        // Intervals consumed so far (pinned plus placements made this run)
        // are kept separately so opted-out tasks can rebuild their own view.
        let mut free = subtract_busy(windows.clone(), &request.busy);
        let mut consumed: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
        for placement in &pinned.placements {
            free = subtract_span(free, placement.start, placement.end);
            consumed.push((placement.start, placement.end));
        }

        let (candidates, ignored) = sort_candidates(&request.tasks, horizon_end);

        // Parent links and pinned seeding come from the full task list: a
        // pinned child due beyond the horizon still advances or blocks its
        // in-horizon siblings.
        let mut coordinator = SequentialCoordinator::new(&request.tasks);
        coordinator.seed_pinned(&request.tasks, &pinned);

        let mut outcome = PlanOutcome {
            scheduled: pinned.placements.clone(),
            ignored,
            ..PlanOutcome::default()
        };

        for task in &candidates {
            if pinned.covers(task) {
                // Its effect on sibling ordering was seeded above; the
                // placement itself stays exactly where the user put it.
                continue;
            }

            let available = self.available_for(task, &free, &windows, &request.busy, &consumed);

            if coordinator.handles(task) {
                match coordinator.attempt(task, &available, now) {
                    SequentialVerdict::Placed(placement) => {
                        free = subtract_span(free, placement.start, placement.end);
                        consumed.push((placement.start, placement.end));
                        outcome.scheduled.push(placement);
                    }
                    SequentialVerdict::Deferred => {
                        outcome.deferred.insert(task.id.clone());
                    }
                    SequentialVerdict::Unscheduled => {
                        outcome.unscheduled.insert(task.id.clone());
                    }
                }
                continue;
            }

            match allocate(task, &available, now) {
                Some((placement, _)) => {
                    free = subtract_span(free, placement.start, placement.end);
                    consumed.push((placement.start, placement.end));
                    outcome.scheduled.push(placement);
                }
                None => {
                    outcome.unscheduled.insert(task.id.clone());
                }
            }
        }

        outcome.free_slots = free;
        outcome
    }

    /// Slots visible to one task.
    ///
    /// Most tasks see the shared default pool. A task that opted out of some
    /// calendars' blocking effect gets its pool rebuilt from the raw windows,
    /// minus only the busy blocks that apply to it, minus everything already
    /// consumed this run.
    fn available_for(
        &self,
        task: &Task,
        free: &[Slot],
        windows: &[Slot],
        busy: &[BusyBlock],
        consumed: &[(DateTime<Utc>, DateTime<Utc>)],
    ) -> Vec<Slot> {
        if task.external_calendar_ids.is_empty() {
            return free.to_vec();
        }

        let applicable: Vec<BusyBlock> = busy
            .iter()
            .filter(|block| block.blocks_task(task))
            .cloned()
            .collect();

        let mut slots = subtract_busy(windows.to_vec(), &applicable);
        for &(start, end) in consumed {
            slots = subtract_span(slots, start, end);
        }
        slots
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}
