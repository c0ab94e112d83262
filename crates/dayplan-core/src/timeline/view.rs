//! Static timeline view model.
//!
//! Composes the engine's schedule into render-ready geometry: block
//! rectangles with lane placement, "+X more" badges for hidden overflow,
//! anchor buffer bands, sleep shading, and free gaps. Pure and
//! time-invariant; everything that depends on "now" lives in the overlay.

use std::collections::HashMap;

use serde::Serialize;

use crate::clock::MINUTES_PER_DAY;
use crate::engine::{ScheduleBlock, ScheduleResult};
use crate::error::{CoreError, Result};
use crate::model::{Settings, Template, TimeWindow};
use crate::ports::ResponsiveParams;
use crate::timeline::gap::detect_gaps;
use crate::timeline::lane::{assign_lanes, clusters, LaneInput};

/// One block's geometry and semantic flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmBlock {
    pub template_id: String,
    pub top: f64,
    pub height: f64,
    pub lane_index: usize,
    /// Visible lanes in this block's cluster, for width division
    pub lane_count: usize,
    /// Overflowed past the lane cap; represented by the cluster badge
    pub hidden: bool,
    pub is_mandatory: bool,
    pub is_fixed: bool,
    pub is_flexible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_hint: Option<TimeWindow>,
    /// Clock-face start minute (0..1440)
    pub start_minutes: u32,
    /// `start_minutes` plus duration; past 1440 for blocks crossing midnight
    pub end_minutes: u32,
}

/// "+X more" badge for a cluster's hidden overflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBadge {
    pub top: f64,
    pub count: usize,
    pub label: String,
}

/// A cluster that overflowed its lanes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmCluster {
    /// Union of the hidden blocks' minutes, `[start, end]`
    pub range_mins: [u32; 2],
    pub hidden_ids: Vec<String>,
    pub badge: ClusterBadge,
}

/// Visual padding band around an anchor. Pointer-transparent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferBand {
    pub top: f64,
    pub height: f64,
    pub anchor_id: String,
}

/// Sleep shading segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepSegment {
    pub top: f64,
    pub height: f64,
}

/// Free gap with geometry attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmGap {
    pub start_mins: u32,
    pub end_mins: u32,
    pub top: f64,
    pub height: f64,
}

/// The static timeline view model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineVm {
    pub blocks: Vec<VmBlock>,
    pub clusters: Vec<VmCluster>,
    pub buffers: Vec<BufferBand>,
    pub sleep_segments: Vec<SleepSegment>,
    pub gaps: Vec<VmGap>,
    /// Pixels per hour, echoed for the overlay's geometry
    pub row_height: f64,
}

/// Compose the static view model from a schedule.
pub fn compute_static_vm(
    result: &ScheduleResult,
    templates: &[Template],
    settings: &Settings,
    params: &ResponsiveParams,
) -> Result<TimelineVm> {
    let awake = settings.awake_window().map_err(CoreError::from)?;
    let by_id: HashMap<&str, &Template> = templates.iter().map(|t| (t.id.as_str(), t)).collect();
    let row_height = params.row_height;

    // Cluster and lane in the schedule's extended coordinate so
    // midnight-crossing days still group correctly.
    let lane_inputs: Vec<LaneInput> = result
        .schedule
        .iter()
        .map(|b| LaneInput {
            id: b.template_id.as_str(),
            start: b.start_time,
            end: b.end_time,
        })
        .collect();
    let cluster_sets = clusters(&lane_inputs);

    let mut blocks: Vec<Option<VmBlock>> = vec![None; result.schedule.len()];
    let mut vm_clusters = Vec::new();

    for member_indices in &cluster_sets {
        let members: Vec<LaneInput> = member_indices.iter().map(|&i| lane_inputs[i]).collect();
        let lanes = assign_lanes(&members, params.lane_cap);
        let lane_count = lanes
            .iter()
            .filter(|l| !l.hidden)
            .map(|l| l.lane_index + 1)
            .max()
            .unwrap_or(1);

        let mut hidden_ids = Vec::new();
        let mut hidden_range: Option<(u32, u32)> = None;

        for (&block_idx, lane) in member_indices.iter().zip(&lanes) {
            let schedule_block = &result.schedule[block_idx];
            let template = by_id.get(schedule_block.template_id.as_str()).copied();
            blocks[block_idx] = Some(make_block(
                schedule_block,
                template,
                lane.lane_index,
                lane.hidden,
                lane_count,
                row_height,
            ));
            if lane.hidden {
                hidden_ids.push(schedule_block.template_id.clone());
                hidden_range = Some(match hidden_range {
                    None => (schedule_block.start_time, schedule_block.end_time),
                    Some((lo, hi)) => (
                        lo.min(schedule_block.start_time),
                        hi.max(schedule_block.end_time),
                    ),
                });
            }
        }

        if let Some((lo, hi)) = hidden_range {
            let start_day = lo % MINUTES_PER_DAY;
            vm_clusters.push(VmCluster {
                range_mins: [start_day, start_day + (hi - lo)],
                badge: ClusterBadge {
                    top: minutes_to_y(lo, row_height),
                    count: hidden_ids.len(),
                    label: format!("+{} more", hidden_ids.len()),
                },
                hidden_ids,
            });
        }
    }

    let blocks: Vec<VmBlock> = blocks.into_iter().flatten().collect();

    // Buffer bands around anchors, clamped to the day.
    let mut buffers = Vec::new();
    for block in result.schedule.iter().filter(|b| b.is_anchor) {
        let minutes = by_id
            .get(block.template_id.as_str())
            .map(|t| t.effective_buffer(params.anchor_buffer_default_minutes))
            .unwrap_or(params.anchor_buffer_default_minutes);
        if minutes == 0 {
            continue;
        }
        let before_start = block.start_time.saturating_sub(minutes);
        if before_start < block.start_time {
            buffers.push(band(before_start, block.start_time, block, row_height));
        }
        let after_end = block.end_time + minutes;
        buffers.push(band(block.end_time, after_end, block, row_height));
    }

    // Sleep shading: one segment when the sleep period sits inside the day,
    // two when it wraps midnight.
    let wake = awake.wake();
    let sleep = awake.sleep();
    let sleep_segments = if sleep > wake {
        let mut segments = Vec::new();
        if wake > 0 {
            segments.push(SleepSegment {
                top: 0.0,
                height: minutes_to_height(wake, row_height),
            });
        }
        if sleep < MINUTES_PER_DAY {
            segments.push(SleepSegment {
                top: minutes_to_y(sleep, row_height),
                height: minutes_to_height(MINUTES_PER_DAY - sleep, row_height),
            });
        }
        segments
    } else {
        vec![SleepSegment {
            top: minutes_to_y(sleep, row_height),
            height: minutes_to_height(wake - sleep, row_height),
        }]
    };

    let busy: Vec<(u32, u32)> = result
        .schedule
        .iter()
        .map(|b| (b.start_time, b.end_time))
        .collect();
    let gaps = detect_gaps(&busy, awake.start, awake.end, params.gap_min_minutes)
        .into_iter()
        .map(|gap| {
            let start_day = gap.start % MINUTES_PER_DAY;
            VmGap {
                start_mins: start_day,
                end_mins: start_day + gap.len_minutes(),
                top: minutes_to_y(gap.start, row_height),
                height: minutes_to_height(gap.len_minutes(), row_height),
            }
        })
        .collect();

    Ok(TimelineVm {
        blocks,
        clusters: vm_clusters,
        buffers,
        sleep_segments,
        gaps,
        row_height,
    })
}

fn make_block(
    block: &ScheduleBlock,
    template: Option<&Template>,
    lane_index: usize,
    hidden: bool,
    lane_count: usize,
    row_height: f64,
) -> VmBlock {
    let start_day = block.start_time % MINUTES_PER_DAY;
    VmBlock {
        template_id: block.template_id.clone(),
        top: minutes_to_y(block.start_time, row_height),
        height: minutes_to_height(block.duration_minutes(), row_height),
        lane_index,
        lane_count,
        hidden,
        is_mandatory: block.is_mandatory,
        is_fixed: template.map_or(false, |t| t.is_fixed()),
        is_flexible: template.map_or(false, |t| t.is_flexible()),
        window_hint: template.and_then(|t| {
            if t.is_flexible() {
                t.time_window
            } else {
                None
            }
        }),
        start_minutes: start_day,
        end_minutes: start_day + block.duration_minutes(),
    }
}

fn band(start: u32, end: u32, anchor: &ScheduleBlock, row_height: f64) -> BufferBand {
    BufferBand {
        top: minutes_to_y(start, row_height),
        height: minutes_to_height(end - start, row_height),
        anchor_id: anchor.template_id.clone(),
    }
}

fn minutes_to_y(minutes: u32, row_height: f64) -> f64 {
    f64::from(minutes % MINUTES_PER_DAY) / 60.0 * row_height
}

fn minutes_to_height(minutes: u32, row_height: f64) -> f64 {
    f64::from(minutes) / 60.0 * row_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::parse_date;
    use crate::engine::generate_schedule;
    use crate::model::SchedulingType;

    fn flexible(id: &str, duration: u32) -> Template {
        Template {
            id: id.to_string(),
            name: format!("Task {id}"),
            description: None,
            duration_minutes: duration,
            priority: 3,
            is_mandatory: false,
            scheduling_type: SchedulingType::Flexible,
            default_time: None,
            time_window: Some(TimeWindow::Morning),
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
            ..flexible(id, duration)
        }
    }

    fn vm_for(templates: &[Template], params: &ResponsiveParams) -> TimelineVm {
        let settings = Settings::default();
        let result = generate_schedule(
            &settings,
            templates,
            &[],
            parse_date("2025-03-01").unwrap(),
            None,
        );
        compute_static_vm(&result, templates, &settings, params).unwrap()
    }

    #[test]
    fn block_geometry_scales_with_row_height() {
        let params = ResponsiveParams {
            row_height: 80.0,
            ..ResponsiveParams::default()
        };
        let vm = vm_for(&[fixed("x", "09:00", 90)], &params);
        let block = &vm.blocks[0];
        assert!((block.top - 9.0 * 80.0).abs() < 1e-9);
        assert!((block.height - 1.5 * 80.0).abs() < 1e-9);
        assert!(block.is_fixed && !block.is_flexible);
    }

    #[test]
    fn buffers_surround_each_anchor() {
        let params = ResponsiveParams::default();
        let vm = vm_for(&[fixed("x", "09:00", 60)], &params);
        assert_eq!(vm.buffers.len(), 2);
        // default 8 minutes before and after
        assert!((vm.buffers[0].top - (540.0 - 8.0) / 60.0 * params.row_height).abs() < 1e-9);
        assert_eq!(vm.buffers[0].anchor_id, "x");
    }

    #[test]
    fn per_template_buffer_override_wins() {
        let params = ResponsiveParams::default();
        let mut anchor = fixed("x", "09:00", 60);
        anchor.buffer_minutes = Some(20);
        let vm = vm_for(&[anchor], &params);
        let height = 20.0 / 60.0 * params.row_height;
        assert!((vm.buffers[0].height - height).abs() < 1e-9);
    }

    #[test]
    fn sleep_crossing_midnight_yields_two_segments() {
        let vm = vm_for(&[], &ResponsiveParams::default());
        // default settings: wake 06:30, sleep 23:00
        assert_eq!(vm.sleep_segments.len(), 2);
        assert!((vm.sleep_segments[0].top - 0.0).abs() < 1e-9);
        assert!((vm.sleep_segments[1].top - 23.0 * 60.0).abs() < 1e-9);
    }

    #[test]
    fn sleep_inside_day_is_one_segment() {
        let settings = Settings {
            default_wake_time: "09:00".to_string(),
            default_sleep_time: "01:00".to_string(),
            ..Settings::default()
        };
        let result = generate_schedule(
            &settings,
            &[],
            &[],
            parse_date("2025-03-01").unwrap(),
            None,
        );
        let vm =
            compute_static_vm(&result, &[], &settings, &ResponsiveParams::default()).unwrap();
        assert_eq!(vm.sleep_segments.len(), 1);
        assert!((vm.sleep_segments[0].top - 60.0).abs() < 1e-9);
    }

    #[test]
    fn gaps_cover_unscheduled_awake_time() {
        let vm = vm_for(&[fixed("x", "09:00", 60)], &ResponsiveParams::default());
        assert_eq!(vm.gaps.len(), 2);
        assert_eq!(vm.gaps[0].start_mins, 390);
        assert_eq!(vm.gaps[0].end_mins, 540);
        assert_eq!(vm.gaps[1].start_mins, 600);
        assert_eq!(vm.gaps[1].end_mins, 1380);
    }

    #[test]
    fn overflow_produces_cluster_badge() {
        let params = ResponsiveParams {
            lane_cap: 2,
            ..ResponsiveParams::default()
        };
        // four 60-minute morning tasks: only 330 morning minutes, but the
        // first fits 06:30 and the rest stack after it sequentially, so use
        // fixed anchors to force a true four-way overlap
        let templates = [
            fixed("a", "09:00", 60),
            fixed("b", "09:00", 60),
            fixed("c", "09:00", 60),
            fixed("d", "09:00", 60),
        ];
        let vm = vm_for(&templates, &params);
        let visible = vm.blocks.iter().filter(|b| !b.hidden).count();
        assert_eq!(visible, 2);
        assert_eq!(vm.clusters.len(), 1);
        let cluster = &vm.clusters[0];
        assert_eq!(cluster.badge.count, 2);
        assert_eq!(cluster.range_mins, [540, 600]);
        assert_eq!(cluster.hidden_ids.len(), 2);
    }
}
