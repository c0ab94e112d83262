//! End-to-end scheduling scenarios.
//!
//! These drive the whole engine path: eligibility, dependency ordering,
//! anchor conflicts, instance overrides, and crunch-time shortening.

use dayplan_core::clock::{format_hhmm, parse_date, parse_hhmm};
use dayplan_core::engine::{generate_schedule, ScheduleResult};
use dayplan_core::model::{Instance, InstanceStatus, SchedulingType, Settings, Template, TimeWindow};
use dayplan_core::Advisory;

fn flexible(id: &str, priority: u8, duration: u32, window: TimeWindow) -> Template {
    Template {
        id: id.to_string(),
        name: id.to_string(),
        description: None,
        duration_minutes: duration,
        priority,
        is_mandatory: false,
        scheduling_type: SchedulingType::Flexible,
        default_time: None,
        time_window: Some(window),
        depends_on: None,
        buffer_minutes: None,
        min_duration: None,
        is_active: true,
        recurrence_rule: None,
        updated_at: None,
    }
}

fn fixed(id: &str, start: &str, duration: u32) -> Template {
    Template {
        scheduling_type: SchedulingType::Fixed,
        default_time: Some(start.to_string()),
        time_window: None,
        ..flexible(id, 3, duration, TimeWindow::Anytime)
    }
}

fn spans(result: &ScheduleResult) -> Vec<(String, String, String)> {
    result
        .schedule
        .iter()
        .map(|b| {
            (
                b.template_id.clone(),
                format_hhmm(b.start_time),
                format_hhmm(b.end_time),
            )
        })
        .collect()
}

#[test]
fn dependency_chain_schedules_in_order() {
    let settings = Settings::default();
    let a = flexible("A", 3, 30, TimeWindow::Morning);
    let mut b = flexible("B", 3, 30, TimeWindow::Morning);
    b.depends_on = Some("A".to_string());
    let mut c = flexible("C", 3, 30, TimeWindow::Morning);
    c.depends_on = Some("B".to_string());

    let result = generate_schedule(
        &settings,
        &[a, b, c],
        &[],
        parse_date("2025-03-01").unwrap(),
        None,
    );

    assert!(result.success);
    assert_eq!(
        spans(&result),
        [
            ("A".to_string(), "06:30".to_string(), "07:00".to_string()),
            ("B".to_string(), "07:00".to_string(), "07:30".to_string()),
            ("C".to_string(), "07:30".to_string(), "08:00".to_string()),
        ]
    );
}

#[test]
fn crunch_time_shortens_mandatories_to_their_floor() {
    let settings = Settings::default();
    let mut m1 = flexible("M1", 3, 60, TimeWindow::Morning);
    m1.is_mandatory = true;
    m1.min_duration = Some(20);
    let mut m2 = flexible("M2", 3, 60, TimeWindow::Morning);
    m2.is_mandatory = true;
    m2.min_duration = Some(20);

    let now = parse_hhmm("11:20").unwrap();
    let result = generate_schedule(
        &settings,
        &[m1, m2],
        &[],
        parse_date("2025-03-01").unwrap(),
        Some(now),
    );

    assert!(result.success, "advisories: {:?}", result.advisories);
    assert_eq!(
        spans(&result),
        [
            ("M1".to_string(), "11:20".to_string(), "11:40".to_string()),
            ("M2".to_string(), "11:40".to_string(), "12:00".to_string()),
        ]
    );
    for id in ["M1", "M2"] {
        assert!(
            result.advisories.iter().any(|a| matches!(
                a,
                Advisory::Shortened { template_id, from_minutes: 60, to_minutes: 20 }
                    if template_id == id
            )),
            "missing Shortened advisory for {id}: {:?}",
            result.advisories
        );
    }
}

#[test]
fn crunch_time_without_min_duration_leaves_mandatory_unplaced() {
    let settings = Settings::default();
    let mut m = flexible("M", 3, 60, TimeWindow::Morning);
    m.is_mandatory = true;

    let now = parse_hhmm("11:20").unwrap();
    let result = generate_schedule(
        &settings,
        &[m],
        &[],
        parse_date("2025-03-01").unwrap(),
        Some(now),
    );

    assert!(!result.success);
    assert!(result
        .advisories
        .iter()
        .any(|a| matches!(a, Advisory::MandatoryUnplaced { template_id } if template_id == "M")));
}

#[test]
fn overlapping_mandatory_anchors_keep_the_earlier() {
    let settings = Settings::default();
    let mut x = fixed("X", "08:00", 120);
    x.is_mandatory = true;
    let mut y = fixed("Y", "09:00", 60);
    y.is_mandatory = true;

    let result = generate_schedule(
        &settings,
        &[x, y],
        &[],
        parse_date("2025-03-01").unwrap(),
        None,
    );

    assert!(!result.success);
    assert_eq!(
        spans(&result),
        [("X".to_string(), "08:00".to_string(), "10:00".to_string())]
    );
    assert!(result
        .advisories
        .iter()
        .any(|a| matches!(a, Advisory::HardConflict { template_id } if template_id == "Y")));
}

#[test]
fn skipped_instance_removes_the_flexible() {
    let settings = Settings::default();
    let breakfast = fixed("breakfast", "08:00", 30);
    let f = flexible("F", 4, 45, TimeWindow::Morning);
    let date = parse_date("2025-03-01").unwrap();
    let skipped = Instance::new(date, "F").with_status(InstanceStatus::Skipped);

    let result = generate_schedule(&settings, &[breakfast, f], &[skipped], date, None);

    assert!(result.success);
    assert_eq!(
        spans(&result),
        [(
            "breakfast".to_string(),
            "08:00".to_string(),
            "08:30".to_string()
        )]
    );
    assert_eq!(result.total_tasks, 1);
    assert_eq!(result.scheduled_tasks, 1);
}

#[test]
fn non_mandatory_without_space_is_skipped_for_space() {
    let settings = Settings::default();
    // evening window is 18:00-23:00: five hours; fill it with one anchor
    let wall = fixed("wall", "18:00", 300);
    let f = flexible("F", 3, 30, TimeWindow::Evening);

    let result = generate_schedule(
        &settings,
        &[wall, f],
        &[],
        parse_date("2025-03-01").unwrap(),
        None,
    );

    assert!(result.success);
    assert!(result.block_for("F").is_none());
    assert!(result
        .advisories
        .iter()
        .any(|a| matches!(a, Advisory::SkippedForSpace { template_id } if template_id == "F")));
}

#[test]
fn schedule_is_sorted_and_inside_awake_window() {
    let settings = Settings::default();
    let templates = [
        fixed("lunch", "12:00", 60),
        flexible("a", 5, 45, TimeWindow::Afternoon),
        flexible("b", 4, 30, TimeWindow::Morning),
        flexible("c", 3, 60, TimeWindow::Evening),
    ];
    let result = generate_schedule(
        &settings,
        &templates,
        &[],
        parse_date("2025-03-01").unwrap(),
        None,
    );

    assert!(result.success);
    let starts: Vec<u32> = result.schedule.iter().map(|b| b.start_time).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);

    for block in &result.schedule {
        assert!(block.start_time >= 390, "{} starts too early", block.template_id);
        assert!(block.end_time <= 1380, "{} ends too late", block.template_id);
    }

    // one block per template
    let mut ids: Vec<&str> = result
        .schedule
        .iter()
        .map(|b| b.template_id.as_str())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), result.schedule.len());
}

#[test]
fn flexibles_stay_inside_their_window() {
    let settings = Settings::default();
    // morning is full except 20 minutes; the 45-minute task must not leak
    // into the afternoon
    let wall = fixed("wall", "06:50", 310);
    let f = flexible("F", 3, 45, TimeWindow::Morning);

    let result = generate_schedule(
        &settings,
        &[wall, f],
        &[],
        parse_date("2025-03-01").unwrap(),
        None,
    );

    assert!(result.block_for("F").is_none());
}
