//! Candidate ordering: soonest deadline first, priority as tie-break.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::schedule::{Task, TaskId};

/// Partition tasks into in-horizon candidates and ignored ids.
///
/// Tasks due beyond the horizon are not attempted this run regardless of
/// capacity. The rest are sorted by deadline ascending, ties broken by
/// priority descending (5 wins). The sort is stable, so equal candidates
/// keep their input order.
pub fn sort_candidates(tasks: &[Task], horizon_end: DateTime<Utc>) -> (Vec<Task>, Vec<TaskId>) {
    let mut candidates = Vec::new();
    let mut ignored = Vec::new();

    for task in tasks {
        if task.deadline > horizon_end {
            ignored.push(task.id.clone());
        } else {
            candidates.push(task.clone());
        }
    }

    candidates.sort_by(|a, b| match a.deadline.cmp(&b.deadline) {
        Ordering::Equal => b.priority.cmp(&a.priority),
        other => other,
    });

    (candidates, ignored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dt(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn make_test_task(id: &str, deadline: DateTime<Utc>, priority: u8) -> Task {
        Task {
            id: id.to_string(),
            occurrence_id: None,
            duration_minutes: 30,
            min_block_minutes: None,
            deadline,
            priority,
            time_map_ids: vec!["work".to_string()],
            external_calendar_ids: Vec::new(),
            subtask_parent_id: None,
            subtask_mode: None,
        }
    }

    #[test]
    fn sorts_by_deadline_then_priority() {
        let tasks = vec![
            make_test_task("late", dt(5, 12), 5),
            make_test_task("soon-low", dt(2, 12), 1),
            make_test_task("soon-high", dt(2, 12), 5),
        ];

        let (candidates, ignored) = sort_candidates(&tasks, dt(10, 0));
        assert!(ignored.is_empty());

        let order: Vec<&str> = candidates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["soon-high", "soon-low", "late"]);
    }

    #[test]
    fn tasks_beyond_horizon_are_ignored() {
        let tasks = vec![
            make_test_task("in", dt(3, 12), 3),
            make_test_task("out", dt(20, 12), 5),
        ];

        let (candidates, ignored) = sort_candidates(&tasks, dt(10, 0));
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "in");
        assert_eq!(ignored, vec!["out".to_string()]);
    }

    #[test]
    fn deadline_exactly_at_horizon_is_attempted() {
        let tasks = vec![make_test_task("edge", dt(10, 0), 3)];
        let (candidates, ignored) = sort_candidates(&tasks, dt(10, 0));
        assert_eq!(candidates.len(), 1);
        assert!(ignored.is_empty());
    }
}
