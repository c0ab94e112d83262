//! View-model scenarios: lane overflow badges and the now overlay.

use dayplan_core::clock::{parse_date, parse_hhmm};
use dayplan_core::engine::generate_schedule;
use dayplan_core::model::{SchedulingType, Settings, Template, TimeWindow};
use dayplan_core::ports::ResponsiveParams;
use dayplan_core::timeline::{apply_now_overlay, compute_static_vm, OverdueKind, OverlayInput};

fn fixed(id: &str, start: &str, duration: u32, mandatory: bool) -> Template {
    Template {
        id: id.to_string(),
        name: id.to_string(),
        description: None,
        duration_minutes: duration,
        priority: 3,
        is_mandatory: mandatory,
        scheduling_type: SchedulingType::Fixed,
        default_time: Some(start.to_string()),
        time_window: None,
        depends_on: None,
        buffer_minutes: None,
        min_duration: None,
        is_active: true,
        recurrence_rule: None,
        updated_at: None,
    }
}

#[test]
fn lane_overflow_produces_one_badge_with_the_hidden_count() {
    let settings = Settings::default();
    let templates = [
        fixed("a", "09:00", 60, false),
        fixed("b", "09:00", 60, false),
        fixed("c", "09:00", 60, false),
        fixed("d", "09:00", 60, false),
    ];
    let result = generate_schedule(
        &settings,
        &templates,
        &[],
        parse_date("2025-03-01").unwrap(),
        None,
    );
    let params = ResponsiveParams {
        lane_cap: 2,
        ..ResponsiveParams::default()
    };
    let vm = compute_static_vm(&result, &templates, &settings, &params).unwrap();

    let visible: Vec<_> = vm.blocks.iter().filter(|b| !b.hidden).collect();
    assert_eq!(visible.len(), 2);
    for block in &visible {
        assert!(block.lane_index < 2);
    }
    assert_eq!(vm.blocks.iter().filter(|b| b.hidden).count(), 2);

    assert_eq!(vm.clusters.len(), 1);
    let cluster = &vm.clusters[0];
    assert_eq!(cluster.badge.count, 2);
    assert_eq!(cluster.badge.label, "+2 more");
    assert_eq!(cluster.range_mins, [540, 600]);
    assert_eq!(cluster.hidden_ids.len(), 2);
}

#[test]
fn now_overlay_reseats_overdue_mandatory_and_leaves_vm_untouched() {
    let settings = Settings::default();
    let templates = [fixed("M", "09:00", 60, true)];
    let result = generate_schedule(
        &settings,
        &templates,
        &[],
        parse_date("2025-03-01").unwrap(),
        None,
    );
    let params = ResponsiveParams::default();
    let vm = compute_static_vm(&result, &templates, &settings, &params).unwrap();
    let snapshot = vm.clone();

    let now = parse_hhmm("10:30").unwrap();
    let overlay = apply_now_overlay(
        &vm,
        &[],
        OverlayInput {
            is_today: true,
            now_mins: now,
        },
    );

    let expected_line = f64::from(now) / 60.0 * params.row_height;
    assert!((overlay.now_line.unwrap().top - expected_line).abs() < 1e-9);

    let adjustment = overlay
        .block_adjustments
        .iter()
        .find(|a| a.template_id == "M")
        .unwrap();
    assert_eq!(adjustment.overdue_kind, OverdueKind::Mandatory);
    let expected_shift = 1.5 * params.row_height;
    assert!((adjustment.transform_y - expected_shift).abs() < 1e-9);

    assert_eq!(vm, snapshot, "overlay must not touch the static VM");
}

#[test]
fn buffers_and_gaps_line_up_with_the_anchor() {
    let settings = Settings::default();
    let templates = [fixed("x", "09:00", 60, false)];
    let result = generate_schedule(
        &settings,
        &templates,
        &[],
        parse_date("2025-03-01").unwrap(),
        None,
    );
    let params = ResponsiveParams::default();
    let vm = compute_static_vm(&result, &templates, &settings, &params).unwrap();

    // two buffer bands of the default 8 minutes
    assert_eq!(vm.buffers.len(), 2);
    let band_height = 8.0 / 60.0 * params.row_height;
    for band in &vm.buffers {
        assert!((band.height - band_height).abs() < 1e-9);
        assert_eq!(band.anchor_id, "x");
    }

    // gaps cover the rest of the awake window
    assert_eq!(vm.gaps.len(), 2);
    assert_eq!((vm.gaps[0].start_mins, vm.gaps[0].end_mins), (390, 540));
    assert_eq!((vm.gaps[1].start_mins, vm.gaps[1].end_mins), (600, 1380));
}

#[test]
fn gap_threshold_is_respected() {
    let settings = Settings::default();
    // two anchors four minutes apart
    let templates = [
        fixed("a", "09:00", 60, false),
        fixed("b", "10:04", 60, false),
    ];
    let result = generate_schedule(
        &settings,
        &templates,
        &[],
        parse_date("2025-03-01").unwrap(),
        None,
    );
    let params = ResponsiveParams {
        gap_min_minutes: 5,
        ..ResponsiveParams::default()
    };
    let vm = compute_static_vm(&result, &templates, &settings, &params).unwrap();
    assert!(
        !vm.gaps.iter().any(|g| g.start_mins == 600),
        "four-minute gap must be below the threshold"
    );
}
