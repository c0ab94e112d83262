//! Now overlay: the time-variant layer over the static view model.
//!
//! Recomputing block geometry every minute would churn the whole timeline,
//! so the static VM stays frozen and this overlay carries the deltas: the
//! now line, overdue tinting, and the visual re-seat of overdue mandatory
//! blocks. Pure function; the static VM is never touched.

use serde::Serialize;

use crate::model::{Instance, InstanceStatus};
use crate::timeline::view::TimelineVm;

/// What kind of overdue treatment a block gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverdueKind {
    /// Re-seated at the now line until done
    Mandatory,
    /// Tinted in place; the day moves on without it
    Skippable,
    None,
}

/// Per-block overlay delta.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockAdjustment {
    pub template_id: String,
    /// Vertical shift in pixels; non-zero only for re-seated mandatories
    pub transform_y: f64,
    pub overdue_kind: OverdueKind,
}

/// The now line's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowLine {
    pub top: f64,
}

/// Time-variant overlay over a static VM.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowOverlay {
    pub now_mins: u32,
    pub is_today: bool,
    pub block_adjustments: Vec<BlockAdjustment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now_line: Option<NowLine>,
}

/// Overlay inputs.
#[derive(Debug, Clone, Copy)]
pub struct OverlayInput {
    pub is_today: bool,
    /// Minutes since midnight
    pub now_mins: u32,
}

/// Compute the overlay for the current moment.
///
/// `instances` are the viewed date's overrides; a block whose instance is
/// completed or skipped is never overdue.
pub fn apply_now_overlay(
    vm: &TimelineVm,
    instances: &[Instance],
    input: OverlayInput,
) -> NowOverlay {
    let now_line = input.is_today.then(|| NowLine {
        top: f64::from(input.now_mins) / 60.0 * vm.row_height,
    });

    let block_adjustments = vm
        .blocks
        .iter()
        .map(|block| {
            let resolved = instances
                .iter()
                .find(|i| i.template_id == block.template_id)
                .map_or(false, |i| {
                    matches!(i.status, InstanceStatus::Completed | InstanceStatus::Skipped)
                });
            let overdue = input.is_today && block.start_minutes < input.now_mins && !resolved;

            let (overdue_kind, transform_y) = if !overdue {
                (OverdueKind::None, 0.0)
            } else if block.is_mandatory {
                (
                    OverdueKind::Mandatory,
                    f64::from(input.now_mins - block.start_minutes) / 60.0 * vm.row_height,
                )
            } else {
                (OverdueKind::Skippable, 0.0)
            };

            BlockAdjustment {
                template_id: block.template_id.clone(),
                transform_y,
                overdue_kind,
            }
        })
        .collect();

    NowOverlay {
        now_mins: input.now_mins,
        is_today: input.is_today,
        block_adjustments,
        now_line,
    }
}
