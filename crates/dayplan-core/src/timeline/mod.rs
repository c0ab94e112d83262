//! Timeline presentation pipeline.
//!
//! This module turns a generated schedule into render-ready geometry:
//! - overlap lane assignment with a visible-lane cap
//! - free-gap detection inside the awake window
//! - the static view model (blocks, buffers, sleep shading, badges, gaps)
//! - the time-variant now overlay (now line, overdue adjustments)
//!
//! Everything here is semantic geometry; the renderer maps flags to visuals.

mod gap;
mod lane;
mod overlay;
mod view;

pub use gap::{detect_gaps, FreeGap};
pub use lane::{assign_lanes, clusters, LaneAssignment, LaneInput};
pub use overlay::{
    apply_now_overlay, BlockAdjustment, NowLine, NowOverlay, OverlayInput, OverdueKind,
};
pub use view::{
    compute_static_vm, BufferBand, ClusterBadge, SleepSegment, TimelineVm, VmBlock, VmCluster,
    VmGap,
};
