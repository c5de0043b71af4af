//! Normalization of user-pinned placements.
//!
//! Pinned placements are schedule entries the user has fixed in place; the
//! planner must preserve them verbatim and route new work around them. Pins
//! can also arrive as bare occurrence/task ids when no concrete placement
//! exists yet ("pin this wherever it lands next run").

use std::collections::{HashMap, HashSet};

use crate::schedule::{OccurrenceId, Placement, Task, TaskId};

/// Pinned placements and lookup indexes, normalized for one run.
#[derive(Debug, Default)]
pub struct PinnedState {
    /// All valid pinned placements, passed through to the output verbatim.
    pub placements: Vec<Placement>,
    /// Time-sorted placements per occurrence (repeats pinned across dates).
    pub by_occurrence: HashMap<OccurrenceId, Vec<Placement>>,
    /// Time-sorted placements per task.
    pub by_task: HashMap<TaskId, Vec<Placement>>,
    /// Occurrences that must not be re-allocated this run.
    pub occurrence_ids: HashSet<OccurrenceId>,
    /// Tasks that must not be re-allocated this run.
    pub task_ids: HashSet<TaskId>,
}

impl PinnedState {
    /// Build the pinned state from raw placements and id-only pins.
    ///
    /// Placements with an empty or inverted time range are silently dropped;
    /// survivors are forced to `pinned = true`. A placement carrying an
    /// occurrence id pins only that occurrence; one without pins the whole
    /// task.
    pub fn build(
        placements: &[Placement],
        pinned_occurrence_ids: &[OccurrenceId],
        pinned_task_ids: &[TaskId],
    ) -> Self {
        let mut state = Self::default();

        for raw in placements {
            if raw.validate().is_err() {
                continue;
            }
            let mut placement = raw.clone();
            placement.pinned = true;

            match &placement.occurrence_id {
                Some(occurrence_id) => {
                    state.occurrence_ids.insert(occurrence_id.clone());
                    state
                        .by_occurrence
                        .entry(occurrence_id.clone())
                        .or_default()
                        .push(placement.clone());
                }
                None => {
                    state.task_ids.insert(placement.task_id.clone());
                }
            }
            state
                .by_task
                .entry(placement.task_id.clone())
                .or_default()
                .push(placement.clone());
            state.placements.push(placement);
        }

        for index in state
            .by_occurrence
            .values_mut()
            .chain(state.by_task.values_mut())
        {
            index.sort_by_key(|p| p.start);
        }

        state.occurrence_ids.extend(pinned_occurrence_ids.iter().cloned());
        state.task_ids.extend(pinned_task_ids.iter().cloned());

        state
    }

    /// Whether this candidate is pinned and must be skipped by allocation.
    pub fn covers(&self, task: &Task) -> bool {
        if self.task_ids.contains(&task.id) {
            return true;
        }
        task.occurrence_id
            .as_ref()
            .is_some_and(|occurrence_id| self.occurrence_ids.contains(occurrence_id))
    }

    /// End of the latest pinned placement known for this candidate, if any.
    pub fn latest_end_for(&self, task: &Task) -> Option<chrono::DateTime<chrono::Utc>> {
        if let Some(occurrence_id) = &task.occurrence_id {
            if let Some(placements) = self.by_occurrence.get(occurrence_id) {
                return placements.last().map(|p| p.end);
            }
        }
        self.by_task
            .get(&task.id)
            .and_then(|placements| placements.last().map(|p| p.end))
    }
}
