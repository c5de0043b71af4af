//! End-to-end planning scenarios and output invariants.

use chrono::{DateTime, TimeZone, Utc};
use timeloom_core::{
    BusyBlock, Placement, PlanOutcome, PlanRequest, Planner, SubtaskMode, Task, TimeMap,
    TimeMapRule,
};

// 2024-01-01 is a Monday (Sunday-based day index 1).
fn dt(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, min, 0).unwrap()
}

fn make_task(id: &str, minutes: i64, deadline: DateTime<Utc>, priority: u8) -> Task {
    Task {
        id: id.to_string(),
        occurrence_id: None,
        duration_minutes: minutes,
        min_block_minutes: None,
        deadline,
        priority,
        time_map_ids: vec!["work".to_string()],
        external_calendar_ids: Vec::new(),
        subtask_parent_id: None,
        subtask_mode: None,
    }
}

fn weekday_map() -> TimeMap {
    TimeMap::new(
        "work",
        (1..=5)
            .map(|day| TimeMapRule::new(day, "09:00", "17:00"))
            .collect(),
    )
}

fn make_request(tasks: Vec<Task>) -> PlanRequest {
    PlanRequest {
        tasks,
        time_maps: vec![weekday_map()],
        horizon_days: 7,
        now: Some(dt(1, 8, 0)),
        ..PlanRequest::default()
    }
}

/// Shared invariant checks over any outcome.
fn assert_invariants(outcome: &PlanOutcome, tasks: &[Task]) {
    // No overlap between placements sharing a time map.
    for (i, a) in outcome.scheduled.iter().enumerate() {
        for b in outcome.scheduled.iter().skip(i + 1) {
            if a.time_map_id == b.time_map_id {
                assert!(
                    a.end <= b.start || b.end <= a.start,
                    "placements overlap: {a:?} vs {b:?}"
                );
            }
        }
    }

    for placement in &outcome.scheduled {
        let Some(task) = tasks.iter().find(|t| t.id == placement.task_id) else {
            continue; // pinned placement for a task outside this run
        };
        if !placement.pinned {
            // Duration exactness and deadline respect.
            assert_eq!(placement.duration_minutes(), task.duration_minutes);
            assert!(placement.end <= task.deadline);
        }
    }

    // A task id never lands in more than one bucket.
    for id in &outcome.unscheduled {
        assert!(!outcome.deferred.contains(id));
        assert!(!outcome.ignored.contains(id));
    }
}

#[test]
fn busy_block_fragments_the_morning() {
    // Window Monday 09:00-17:00, busy 10:00-11:00: the 30-minute task lands
    // at 09:00 and the next at 11:00, straddling the busy hour.
    let mut request = make_request(vec![
        make_task("first", 60, dt(1, 17, 0), 5),
        make_task("second", 120, dt(1, 17, 0), 4),
    ]);
    request.busy = vec![BusyBlock::new(dt(1, 10, 0), dt(1, 11, 0))];

    let outcome = Planner::new().plan(&request);
    assert_invariants(&outcome, &request.tasks);

    let first = outcome.scheduled.iter().find(|p| p.task_id == "first").unwrap();
    let second = outcome.scheduled.iter().find(|p| p.task_id == "second").unwrap();
    assert_eq!((first.start, first.end), (dt(1, 9, 0), dt(1, 10, 0)));
    assert_eq!((second.start, second.end), (dt(1, 11, 0), dt(1, 13, 0)));
}

#[test]
fn contested_fragment_goes_to_higher_priority() {
    let mut request = make_request(vec![
        make_task("low", 60, dt(1, 10, 0), 1),
        make_task("high", 60, dt(1, 10, 0), 5),
    ]);
    // Only 09:00-10:00 is usable before either deadline.
    request.busy = vec![BusyBlock::new(dt(1, 10, 0), dt(1, 17, 0))];

    let outcome = Planner::new().plan(&request);
    assert_invariants(&outcome, &request.tasks);

    assert_eq!(outcome.scheduled.len(), 1);
    assert_eq!(outcome.scheduled[0].task_id, "high");
    assert!(outcome.unscheduled.contains("low"));
    assert!(!outcome.unscheduled.contains("high"));
}

#[test]
fn pinned_placement_reduces_free_capacity() {
    let mut request = make_request(Vec::new());
    request.pinned_placements = vec![Placement {
        id: "pin".to_string(),
        task_id: "errand".to_string(),
        occurrence_id: None,
        time_map_id: "work".to_string(),
        start: dt(1, 9, 0),
        end: dt(1, 10, 0),
        pinned: true,
    }];

    let outcome = Planner::new().plan(&request);

    // The pin itself comes back untouched.
    assert_eq!(outcome.scheduled.len(), 1);
    assert_eq!(outcome.scheduled[0].id, "pin");
    assert_eq!(outcome.scheduled[0].start, dt(1, 9, 0));
    assert_eq!(outcome.scheduled[0].end, dt(1, 10, 0));

    // Monday's residual capacity starts where the pin ends.
    let monday = &outcome.free_slots[0];
    assert_eq!((monday.start, monday.end), (dt(1, 10, 0), dt(1, 17, 0)));
}

#[test]
fn sequential_single_places_exactly_one_sibling() {
    let mut a = make_task("a", 60, dt(1, 17, 0), 3);
    let mut b = make_task("b", 60, dt(1, 17, 0), 5);
    let mut c = make_task("c", 60, dt(1, 17, 0), 1);
    for child in [&mut a, &mut b, &mut c] {
        child.subtask_parent_id = Some("family".to_string());
        child.subtask_mode = Some(SubtaskMode::SequentialSingle);
    }
    let request = make_request(vec![a, b, c]);

    let outcome = Planner::new().plan(&request);
    assert_invariants(&outcome, &request.tasks);

    // B sorts first on priority; A and C are deferred, not unscheduled.
    assert_eq!(outcome.scheduled.len(), 1);
    assert_eq!(outcome.scheduled[0].task_id, "b");
    assert!(outcome.deferred.contains("a"));
    assert!(outcome.deferred.contains("c"));
    assert!(outcome.unscheduled.is_empty());
}

#[test]
fn sequential_chain_runs_end_to_start_and_blocks_after_failure() {
    let mut a = make_task("a", 120, dt(1, 17, 0), 5);
    let mut b = make_task("b", 600, dt(1, 17, 0), 4); // cannot fit after a
    let mut c = make_task("c", 30, dt(1, 17, 0), 3);
    for child in [&mut a, &mut b, &mut c] {
        child.subtask_parent_id = Some("project".to_string());
        child.subtask_mode = Some(SubtaskMode::Sequential);
    }
    let request = make_request(vec![a, b, c]);

    let outcome = Planner::new().plan(&request);
    assert_invariants(&outcome, &request.tasks);

    assert_eq!(outcome.scheduled.len(), 1);
    assert_eq!(outcome.scheduled[0].task_id, "a");
    assert!(outcome.unscheduled.contains("b"));
    assert!(outcome.deferred.contains("c"));
}

#[test]
fn pinned_child_beyond_horizon_still_blocks_sequential_single_siblings() {
    // "a" is due past the horizon (so it lands in `ignored`), but its pinned
    // placement must still count as the family's one placement.
    let mut a = make_task("a", 60, dt(20, 12, 0), 3);
    let mut b = make_task("b", 60, dt(1, 17, 0), 3);
    for child in [&mut a, &mut b] {
        child.subtask_parent_id = Some("family".to_string());
        child.subtask_mode = Some(SubtaskMode::SequentialSingle);
    }
    let mut request = make_request(vec![a, b]);
    request.pinned_placements = vec![Placement {
        id: "pin-a".to_string(),
        task_id: "a".to_string(),
        occurrence_id: None,
        time_map_id: "work".to_string(),
        start: dt(1, 9, 0),
        end: dt(1, 10, 0),
        pinned: true,
    }];

    let outcome = Planner::new().plan(&request);
    assert_invariants(&outcome, &request.tasks);

    // Only the pin is scheduled; the sibling is deferred, never placed.
    assert_eq!(outcome.scheduled.len(), 1);
    assert_eq!(outcome.scheduled[0].id, "pin-a");
    assert!(outcome.deferred.contains("b"));
    assert_eq!(outcome.ignored, vec!["a".to_string()]);
}

#[test]
fn pinned_child_beyond_horizon_chains_sequential_siblings() {
    let mut a = make_task("a", 60, dt(20, 12, 0), 3);
    let mut b = make_task("b", 60, dt(1, 17, 0), 3);
    for child in [&mut a, &mut b] {
        child.subtask_parent_id = Some("project".to_string());
        child.subtask_mode = Some(SubtaskMode::Sequential);
    }
    let mut request = make_request(vec![a, b]);
    request.pinned_placements = vec![Placement {
        id: "pin-a".to_string(),
        task_id: "a".to_string(),
        occurrence_id: None,
        time_map_id: "work".to_string(),
        start: dt(1, 9, 0),
        end: dt(1, 11, 0),
        pinned: true,
    }];

    let outcome = Planner::new().plan(&request);
    assert_invariants(&outcome, &request.tasks);

    // The sibling chains off the out-of-horizon pin's end.
    let fresh = outcome.scheduled.iter().find(|p| !p.pinned).unwrap();
    assert_eq!(fresh.task_id, "b");
    assert_eq!(fresh.start, dt(1, 11, 0));
}

#[test]
fn deadline_beyond_horizon_is_ignored_regardless_of_capacity() {
    let request = PlanRequest {
        horizon_days: 1,
        ..make_request(vec![make_task("far", 60, dt(3, 12, 0), 5)])
    };

    let outcome = Planner::new().plan(&request);

    assert_eq!(outcome.ignored, vec!["far".to_string()]);
    assert!(outcome.scheduled.is_empty());
    assert!(outcome.unscheduled.is_empty());
    assert!(outcome.deferred.is_empty());
}

#[test]
fn occurrences_of_a_repeat_schedule_independently() {
    let mut monday = make_task("report", 60, dt(1, 17, 0), 3);
    monday.occurrence_id = Some("report#1".to_string());
    let mut tuesday = make_task("report", 60, dt(2, 17, 0), 3);
    tuesday.occurrence_id = Some("report#2".to_string());

    let request = make_request(vec![monday, tuesday]);
    let outcome = Planner::new().plan(&request);
    assert_invariants(&outcome, &request.tasks);

    assert_eq!(outcome.scheduled.len(), 2);
    let first = &outcome.scheduled[0];
    let second = &outcome.scheduled[1];
    assert_eq!(first.occurrence_id.as_deref(), Some("report#1"));
    // Both occurrences land back to back on Monday; no overlap.
    assert_eq!(first.start, dt(1, 9, 0));
    assert_eq!(second.start, dt(1, 10, 0));
}

#[test]
fn pinned_occurrence_skips_allocation_but_siblings_proceed() {
    let mut monday = make_task("report", 60, dt(1, 17, 0), 3);
    monday.occurrence_id = Some("report#1".to_string());
    let mut tuesday = make_task("report", 60, dt(2, 17, 0), 3);
    tuesday.occurrence_id = Some("report#2".to_string());

    let mut request = make_request(vec![monday, tuesday]);
    request.pinned_placements = vec![Placement {
        id: "pin".to_string(),
        task_id: "report".to_string(),
        occurrence_id: Some("report#1".to_string()),
        time_map_id: "work".to_string(),
        start: dt(1, 14, 0),
        end: dt(1, 15, 0),
        pinned: true,
    }];

    let outcome = Planner::new().plan(&request);
    assert_invariants(&outcome, &request.tasks);

    // Pin passes through; only the second occurrence is newly placed.
    assert_eq!(outcome.scheduled.len(), 2);
    let fresh: Vec<_> = outcome.scheduled.iter().filter(|p| !p.pinned).collect();
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].occurrence_id.as_deref(), Some("report#2"));
    assert_eq!(fresh[0].start, dt(1, 9, 0));
}

#[test]
fn malformed_pins_are_dropped_without_aborting_the_run() {
    let mut request = make_request(vec![make_task("t", 60, dt(1, 17, 0), 3)]);
    request.pinned_placements = vec![Placement {
        id: "broken".to_string(),
        task_id: "x".to_string(),
        occurrence_id: None,
        time_map_id: "work".to_string(),
        start: dt(1, 11, 0),
        end: dt(1, 10, 0),
        pinned: true,
    }];

    let outcome = Planner::new().plan(&request);
    assert_invariants(&outcome, &request.tasks);

    // The inverted pin vanished; the task scheduled normally.
    assert_eq!(outcome.scheduled.len(), 1);
    assert_eq!(outcome.scheduled[0].task_id, "t");
}

#[test]
fn task_with_no_matching_time_map_is_unscheduled() {
    let mut task = make_task("t", 60, dt(1, 17, 0), 3);
    task.time_map_ids = vec!["evenings".to_string()];

    let outcome = Planner::new().plan(&make_request(vec![task]));
    assert!(outcome.unscheduled.contains("t"));
    assert!(outcome.scheduled.is_empty());
}

#[test]
fn legacy_time_map_form_feeds_the_planner() {
    let request = PlanRequest {
        tasks: vec![make_task("t", 60, dt(1, 17, 0), 3)],
        time_maps: vec![TimeMap {
            id: "work".to_string(),
            rules: Vec::new(),
            days: Some(vec![1]),
            start_time: Some("09:00".to_string()),
            end_time: Some("17:00".to_string()),
        }],
        horizon_days: 7,
        now: Some(dt(1, 8, 0)),
        ..PlanRequest::default()
    };

    let outcome = Planner::new().plan(&request);
    assert_eq!(outcome.scheduled.len(), 1);
    assert_eq!(outcome.scheduled[0].start, dt(1, 9, 0));
}

#[test]
fn request_round_trips_through_json() {
    let request = make_request(vec![make_task("t", 60, dt(1, 17, 0), 3)]);
    let json = serde_json::to_string(&request).unwrap();
    let decoded: PlanRequest = serde_json::from_str(&json).unwrap();

    let a = Planner::new().plan(&request);
    let b = Planner::new().plan(&decoded);
    assert_eq!(a.scheduled.len(), b.scheduled.len());
    assert_eq!(a.scheduled[0].start, b.scheduled[0].start);
}
