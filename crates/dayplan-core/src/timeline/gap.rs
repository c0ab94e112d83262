//! Free-gap detection inside the awake window.
//!
//! Finds the stretches of the day no block claims, so the renderer can offer
//! them as drop targets. The minimum length is passed in by the caller; the
//! detector knows nothing about devices.

use serde::{Deserialize, Serialize};

/// A detected free interval, minutes in the schedule's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeGap {
    pub start: u32,
    pub end: u32,
}

impl FreeGap {
    pub fn len_minutes(&self) -> u32 {
        self.end - self.start
    }
}

/// Find free gaps of at least `min_minutes` between `busy` intervals.
///
/// Busy intervals may overlap and arrive in any order; they are merged and
/// clamped to `[window_start, window_end)` before the complement is taken.
pub fn detect_gaps(
    busy: &[(u32, u32)],
    window_start: u32,
    window_end: u32,
    min_minutes: u32,
) -> Vec<FreeGap> {
    let mut sorted: Vec<(u32, u32)> = busy.to_vec();
    sorted.sort_unstable();

    let mut gaps = Vec::new();
    let mut last_end = window_start;

    for (start, end) in sorted {
        if end <= last_end {
            continue;
        }
        if start >= window_end {
            break;
        }
        if start > last_end {
            let gap_end = start.min(window_end);
            if gap_end - last_end >= min_minutes {
                gaps.push(FreeGap {
                    start: last_end,
                    end: gap_end,
                });
            }
        }
        last_end = last_end.max(end.min(window_end));
    }

    if window_end > last_end && window_end - last_end >= min_minutes {
        gaps.push(FreeGap {
            start: last_end,
            end: window_end,
        });
    }

    gaps
}
