//! Ordering state for sequential subtask hierarchies.
//!
//! Parents whose children run in `sequential` mode chain their children
//! end-to-start; `sequential-single` parents allow at most one child per run.
//! Progress is tracked per ancestor id in a plain state table, never on the
//! task values themselves.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::allocator::allocate_from;
use super::pinned::PinnedState;
use crate::schedule::{Placement, SubtaskMode, Task, TaskId};
use crate::timeline::Slot;

/// Progress of one ancestor's chain within a run.
#[derive(Debug, Clone, Default)]
struct AncestorState {
    /// A child already failed to place; later children are blocked.
    failed: bool,
    /// End of the latest child placed; the floor for the next child.
    last_end: Option<DateTime<Utc>>,
    /// A child has been placed (or was pinned) this run.
    scheduled_one: bool,
}

/// Verdict for a coordinator-handled candidate.
#[derive(Debug)]
pub enum SequentialVerdict {
    /// Placed under the chain constraint.
    Placed(Placement),
    /// Blocked by sibling ordering; retryable on a later run.
    Deferred,
    /// Attempted, no feasible slot.
    Unscheduled,
}

/// Tracks per-ancestor ordering state for sequential hierarchies.
pub struct SequentialCoordinator {
    /// Child id -> (parent id, mode governing that child's sibling group).
    parents: HashMap<TaskId, (TaskId, SubtaskMode)>,
    states: HashMap<TaskId, AncestorState>,
}

impl SequentialCoordinator {
    /// Build the coordinator's parent links from this run's tasks.
    ///
    /// Links are taken from the full task list, not just in-horizon
    /// candidates, so pins on out-of-horizon children still count.
    pub fn new(tasks: &[Task]) -> Self {
        let mut parents = HashMap::new();
        for task in tasks {
            if let (Some(parent_id), Some(mode)) = (&task.subtask_parent_id, task.subtask_mode) {
                parents.insert(task.id.clone(), (parent_id.clone(), mode));
            }
        }
        Self {
            parents,
            states: HashMap::new(),
        }
    }

    /// Whether this candidate is governed by sequential sibling ordering.
    pub fn handles(&self, task: &Task) -> bool {
        task.is_sequential_child()
    }

    /// Fold already-pinned placements into ancestor state, so a pinned child
    /// correctly advances or blocks its siblings before the loop runs.
    pub fn seed_pinned(&mut self, tasks: &[Task], pinned: &PinnedState) {
        for task in tasks {
            if !self.handles(task) || !pinned.covers(task) {
                continue;
            }
            self.mark_placed(task, pinned.latest_end_for(task));
        }
    }

    /// Attempt a constrained placement for a coordinator-handled candidate.
    ///
    /// `slots` is the task's own available capacity; the slot search and
    /// splitting mechanics are the generic allocator's, scoped by the
    /// ancestor's floor.
    pub fn attempt(
        &mut self,
        task: &Task,
        slots: &[Slot],
        now: DateTime<Utc>,
    ) -> SequentialVerdict {
        let Some((parent_id, mode)) = self.parents.get(&task.id).cloned() else {
            return SequentialVerdict::Unscheduled;
        };
        let state = self.states.entry(parent_id).or_default().clone();

        match mode {
            SubtaskMode::SequentialSingle => {
                if state.scheduled_one {
                    return SequentialVerdict::Deferred;
                }
                match allocate_from(task, slots, now, state.last_end) {
                    Some((placement, _)) => {
                        self.mark_placed(task, Some(placement.end));
                        SequentialVerdict::Placed(placement)
                    }
                    // A failed sibling does not block the others here; they
                    // are alternatives, not a chain.
                    None => SequentialVerdict::Unscheduled,
                }
            }
            SubtaskMode::Sequential => {
                if state.failed {
                    return SequentialVerdict::Deferred;
                }
                match allocate_from(task, slots, now, state.last_end) {
                    Some((placement, _)) => {
                        self.mark_placed(task, Some(placement.end));
                        SequentialVerdict::Placed(placement)
                    }
                    None => {
                        self.mark_failed(task);
                        SequentialVerdict::Unscheduled
                    }
                }
            }
            // handles() keeps parallel children out of here.
            SubtaskMode::Parallel => SequentialVerdict::Unscheduled,
        }
    }

    /// Ancestor ids from the task's parent upward, following candidate links.
    fn ancestor_chain(&self, task: &Task) -> Vec<TaskId> {
        let mut chain = Vec::new();
        let mut current = task.subtask_parent_id.clone();
        while let Some(id) = current {
            if chain.contains(&id) {
                break; // cycle guard
            }
            current = self.parents.get(&id).map(|(parent_id, _)| parent_id.clone());
            chain.push(id);
        }
        chain
    }

    fn mark_placed(&mut self, task: &Task, end: Option<DateTime<Utc>>) {
        for ancestor_id in self.ancestor_chain(task) {
            let state = self.states.entry(ancestor_id).or_default();
            state.scheduled_one = true;
            if let Some(end) = end {
                state.last_end = Some(match state.last_end {
                    Some(previous) => previous.max(end),
                    None => end,
                });
            }
        }
    }

    fn mark_failed(&mut self, task: &Task) {
        for ancestor_id in self.ancestor_chain(task) {
            self.states.entry(ancestor_id).or_default().failed = true;
        }
    }
}
