//! Deterministic daily scheduling engine.
//!
//! Turns templates + per-date instances + settings into an ordered,
//! conflict-free list of schedule blocks:
//! - anchors (fixed tasks and manual overrides) are seated first
//! - flexible tasks fill the remaining free intervals inside their windows,
//!   in dependency order
//! - crunch time retries unplaced mandatories at their reduced duration
//!
//! The engine is a pure function of its inputs. Soft problems come back as
//! advisories on the result; only malformed input fails the whole run.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::{parse_hhmm, serde_hhmm};
use crate::deps::schedulable_order;
use crate::error::Advisory;
use crate::model::{AwakeWindow, Instance, Settings, SleepSchedule, Template};
use crate::recurrence::occurs_on;

/// One placed task on the day.
///
/// Times are minutes in the awake window's extended coordinate; they
/// serialize as clock-face `HH:MM`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBlock {
    pub template_id: String,
    #[serde(with = "serde_hhmm")]
    pub start_time: u32,
    #[serde(with = "serde_hhmm")]
    pub end_time: u32,
    /// Minutes an anchor ran past the awake window before clamping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrun_minutes: Option<u32>,
    /// Fixed task or manual start override
    pub is_anchor: bool,
    pub is_mandatory: bool,
}

impl ScheduleBlock {
    pub fn duration_minutes(&self) -> u32 {
        self.end_time - self.start_time
    }

    /// Whether `[start, end)` contains the extended minute `m`.
    pub fn contains(&self, minute: u32) -> bool {
        (self.start_time..self.end_time).contains(&minute)
    }

    fn overlaps(&self, other: &ScheduleBlock) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

/// Everything a day's schedule run produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    /// True when every mandatory task found a seat
    pub success: bool,
    pub schedule: Vec<ScheduleBlock>,
    pub sleep_schedule: SleepSchedule,
    /// Eligible tasks for the date (anchors + flexibles)
    pub total_tasks: usize,
    /// Tasks actually placed
    pub scheduled_tasks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub advisories: Vec<Advisory>,
}

impl ScheduleResult {
    /// The block for a template, if one was placed.
    pub fn block_for(&self, template_id: &str) -> Option<&ScheduleBlock> {
        self.schedule.iter().find(|b| b.template_id == template_id)
    }
}

/// A half-open free interval in extended minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FreeInterval {
    start: u32,
    end: u32,
}

/// Generate the schedule for one date.
///
/// `current_time` is minutes since midnight; when provided, flexible
/// placement starts no earlier than now and crunch-time shortening becomes
/// available. Inputs are never mutated.
pub fn generate_schedule(
    settings: &Settings,
    templates: &[Template],
    instances: &[Instance],
    date: NaiveDate,
    current_time: Option<u32>,
) -> ScheduleResult {
    let awake = match settings.awake_window() {
        Ok(awake) => awake,
        Err(e) => return bad_input(settings, e.to_string()),
    };
    let sleep_schedule = match settings.sleep_schedule() {
        Ok(sleep) => sleep,
        Err(e) => return bad_input(settings, e.to_string()),
    };

    // Boundary validation: malformed active templates are hard errors.
    for template in templates.iter().filter(|t| t.is_active) {
        if let Err(e) = template.validate() {
            return bad_input_with(sleep_schedule, format!("template '{}': {e}", template.id));
        }
        if let Some(rule) = &template.recurrence_rule {
            let problems = rule.validate();
            if let Some(first) = problems.first() {
                return bad_input_with(
                    sleep_schedule,
                    format!("template '{}' recurrenceRule: {first}", template.id),
                );
            }
        }
    }

    let overrides: HashMap<&str, &Instance> = instances
        .iter()
        .filter(|i| i.date == date)
        .map(|i| (i.template_id.as_str(), i))
        .collect();

    // Eligibility: active, occurring, and not resolved away for the day.
    let eligible: Vec<&Template> = templates
        .iter()
        .filter(|t| t.is_active)
        .filter(|t| occurs_on(t.recurrence_rule.as_ref(), date))
        .filter(|t| {
            overrides
                .get(t.id.as_str())
                .map_or(true, |i| !i.status.is_resolved())
        })
        .collect();

    let mut advisories = Vec::new();
    let mut anchors = Vec::new();
    let mut flexibles = Vec::new();
    for template in &eligible {
        let manual_start = overrides
            .get(template.id.as_str())
            .and_then(|i| i.modified_start_time.as_deref());
        if template.is_fixed() || manual_start.is_some() {
            let start = manual_start.or(template.default_time.as_deref());
            let start = match start.map(parse_hhmm) {
                Some(Ok(minutes)) => minutes,
                Some(Err(e)) => {
                    return bad_input_with(
                        sleep_schedule,
                        format!("template '{}': {e}", template.id),
                    );
                }
                // fixed templates always carry defaultTime (validated above)
                None => continue,
            };
            anchors.push((*template, start));
        } else {
            flexibles.push(*template);
        }
    }
    let total_tasks = anchors.len() + flexibles.len();

    // Anchors first, in start order.
    let mut blocks = place_anchors(&anchors, &awake, &mut advisories);

    // Free intervals: the awake window minus anchor spans, trimmed to `now`
    // when the caller is scheduling mid-day.
    let mut free = free_intervals(&awake, &blocks);
    if let Some(now) = current_time {
        let now_ext = awake.to_extended(now);
        if awake.contains(now_ext) {
            free = clip_intervals(&free, now_ext);
        }
    }

    // Flexibles in dependency order.
    let library: HashMap<&str, &Template> = templates.iter().map(|t| (t.id.as_str(), t)).collect();
    let satisfied: HashSet<&str> = anchors.iter().map(|(t, _)| t.id.as_str()).collect();
    let (ordered, dep_advisories) = schedulable_order(&flexibles, &library, &satisfied);
    advisories.extend(dep_advisories);

    let mut unplaced_mandatory = Vec::new();
    for template in ordered {
        match place_flexible(template, template.duration_minutes, &mut free) {
            Some(block) => blocks.push(block),
            None if template.is_mandatory => unplaced_mandatory.push(template),
            None => advisories.push(Advisory::SkippedForSpace {
                template_id: template.id.clone(),
            }),
        }
    }

    // Crunch time: what is left over no longer fits at full length, so retry
    // mandatories at their declared floor.
    if current_time.is_some() && !unplaced_mandatory.is_empty() {
        unplaced_mandatory.retain(|template| {
            let floor = match template.min_duration {
                Some(min) if min >= 1 && min < template.duration_minutes => min,
                _ => return true,
            };
            match place_flexible(template, floor, &mut free) {
                Some(block) => {
                    advisories.push(Advisory::Shortened {
                        template_id: template.id.clone(),
                        from_minutes: template.duration_minutes,
                        to_minutes: floor,
                    });
                    blocks.push(block);
                    false
                }
                None => true,
            }
        });
    }
    for template in &unplaced_mandatory {
        advisories.push(Advisory::MandatoryUnplaced {
            template_id: template.id.clone(),
        });
    }

    blocks.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.template_id.cmp(&b.template_id))
    });

    let success = !advisories.iter().any(|a| {
        matches!(
            a,
            Advisory::HardConflict { .. } | Advisory::MandatoryUnplaced { .. }
        )
    });

    ScheduleResult {
        success,
        scheduled_tasks: blocks.len(),
        schedule: blocks,
        sleep_schedule,
        total_tasks,
        error: None,
        advisories,
    }
}

/// Seat anchors in start order, enforcing the mandatory-overlap rule.
fn place_anchors(
    anchors: &[(&Template, u32)],
    awake: &AwakeWindow,
    advisories: &mut Vec<Advisory>,
) -> Vec<ScheduleBlock> {
    let mut candidates: Vec<(&Template, u32)> = anchors.to_vec();
    candidates.sort_by(|(a, a_start), (b, b_start)| {
        a_start.cmp(b_start).then_with(|| a.id.cmp(&b.id))
    });

    let mut placed: Vec<ScheduleBlock> = Vec::new();
    for (template, clock_start) in candidates {
        let start = awake.to_extended(clock_start);
        let end = start + template.duration_minutes;

        // clamp to the awake window; an anchor entirely outside it has no
        // seat today
        let clamped_start = start.max(awake.start);
        let clamped_end = end.min(awake.end);
        if clamped_start >= clamped_end {
            if template.is_mandatory {
                advisories.push(Advisory::MandatoryUnplaced {
                    template_id: template.id.clone(),
                });
            } else {
                advisories.push(Advisory::SkippedForSpace {
                    template_id: template.id.clone(),
                });
            }
            continue;
        }
        let block = ScheduleBlock {
            template_id: template.id.clone(),
            start_time: clamped_start,
            end_time: clamped_end,
            overrun_minutes: (end > awake.end).then_some(end - awake.end),
            is_anchor: true,
            is_mandatory: template.is_mandatory,
        };

        if template.is_mandatory {
            let conflict = placed
                .iter()
                .any(|other| other.is_mandatory && other.overlaps(&block));
            if conflict {
                advisories.push(Advisory::HardConflict {
                    template_id: template.id.clone(),
                });
                continue;
            }
        }
        if let Some(other) = placed.iter().find(|other| other.overlaps(&block)) {
            advisories.push(Advisory::SoftOverlap {
                template_id: template.id.clone(),
                other_id: other.template_id.clone(),
            });
        }
        placed.push(block);
    }
    placed
}

/// The awake window minus every placed anchor span.
fn free_intervals(awake: &AwakeWindow, anchors: &[ScheduleBlock]) -> Vec<FreeInterval> {
    let mut spans: Vec<(u32, u32)> = anchors.iter().map(|b| (b.start_time, b.end_time)).collect();
    spans.sort_unstable();

    let mut free = Vec::new();
    let mut cursor = awake.start;
    for (start, end) in spans {
        if start > cursor {
            free.push(FreeInterval {
                start: cursor,
                end: start.min(awake.end),
            });
        }
        cursor = cursor.max(end);
        if cursor >= awake.end {
            break;
        }
    }
    if cursor < awake.end {
        free.push(FreeInterval {
            start: cursor,
            end: awake.end,
        });
    }
    free
}

/// Trim intervals so nothing starts before `now_ext`.
fn clip_intervals(free: &[FreeInterval], now_ext: u32) -> Vec<FreeInterval> {
    free.iter()
        .filter_map(|interval| {
            if interval.end <= now_ext {
                None
            } else {
                Some(FreeInterval {
                    start: interval.start.max(now_ext),
                    end: interval.end,
                })
            }
        })
        .collect()
}

/// First-fit placement inside the template's time window.
///
/// Returns the block and splits the chosen interval in place.
fn place_flexible(
    template: &Template,
    duration: u32,
    free: &mut Vec<FreeInterval>,
) -> Option<ScheduleBlock> {
    let (window_start, window_end) = template.time_window?.bounds();
    let position = free.iter().position(|interval| {
        let start = interval.start.max(window_start);
        let end = interval.end.min(window_end);
        start < end && end - start >= duration
    })?;

    let interval = free[position];
    let start = interval.start.max(window_start);
    let end = start + duration;

    let mut replacement = Vec::with_capacity(2);
    if interval.start < start {
        replacement.push(FreeInterval {
            start: interval.start,
            end: start,
        });
    }
    if end < interval.end {
        replacement.push(FreeInterval {
            start: end,
            end: interval.end,
        });
    }
    free.splice(position..=position, replacement);

    Some(ScheduleBlock {
        template_id: template.id.clone(),
        start_time: start,
        end_time: end,
        overrun_minutes: None,
        is_anchor: false,
        is_mandatory: template.is_mandatory,
    })
}

fn bad_input(settings: &Settings, message: String) -> ScheduleResult {
    let sleep_schedule = SleepSchedule {
        wake_time: settings.default_wake_time.clone(),
        sleep_time: settings.default_sleep_time.clone(),
        duration: 0.0,
    };
    bad_input_with(sleep_schedule, message)
}

fn bad_input_with(sleep_schedule: SleepSchedule, message: String) -> ScheduleResult {
    ScheduleResult {
        success: false,
        schedule: Vec::new(),
        sleep_schedule,
        total_tasks: 0,
        scheduled_tasks: 0,
        error: Some(format!("BadInput: {message}")),
        advisories: Vec::new(),
    }
}
