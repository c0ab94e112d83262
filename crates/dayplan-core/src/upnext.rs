//! Up Next: one best task suggestion for the current moment.
//!
//! An anchor in progress always wins. Otherwise candidates are the
//! dependency-ready flexible tasks whose window covers now, ranked by a
//! deterministic chain of tie-breakers so the suggestion never flaps between
//! renders.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::parse_hhmm;
use crate::engine::ScheduleResult;
use crate::model::{Instance, Settings, Template, TimeWindow};
use crate::recurrence::occurs_on;

/// The suggestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UpNext {
    /// A fixed task or manual override is running right now
    #[serde(rename_all = "camelCase")]
    Anchor { template_id: String },
    /// Best flexible task for the current window
    #[serde(rename_all = "camelCase")]
    Flexible { template_id: String },
    /// Nothing to suggest
    None,
}

/// Choose the Up Next suggestion.
///
/// `now` is minutes since midnight on `date`; `schedule` is the engine
/// output for the same date.
pub fn select_up_next(
    templates: &[Template],
    instances: &[Instance],
    schedule: &ScheduleResult,
    settings: &Settings,
    date: NaiveDate,
    now: u32,
) -> UpNext {
    let awake = match settings.awake_window() {
        Ok(awake) => awake,
        Err(_) => return UpNext::None,
    };
    let now_ext = awake.to_extended(now);

    // 1. An anchor whose span contains now wins outright.
    if let Some(active) = schedule
        .schedule
        .iter()
        .find(|b| b.is_anchor && b.contains(now_ext))
    {
        return UpNext::Anchor {
            template_id: active.template_id.clone(),
        };
    }

    // 2. Candidate flexibles for the current window.
    let current_window = TimeWindow::for_minute(now);
    let day_instances: Vec<&Instance> = instances.iter().filter(|i| i.date == date).collect();
    let instance_for = |template_id: &str| {
        day_instances
            .iter()
            .find(|i| i.template_id == template_id)
            .copied()
    };

    let mut candidates: Vec<&Template> = templates
        .iter()
        .filter(|t| t.is_flexible() && t.is_active)
        .filter(|t| occurs_on(t.recurrence_rule.as_ref(), date))
        .filter(|t| matches!(t.time_window, Some(w) if w == current_window || w == TimeWindow::Anytime))
        .filter(|t| {
            instance_for(&t.id).map_or(true, |i| !i.status.is_resolved())
        })
        // a manual start later today means the user already decided when
        .filter(|t| {
            instance_for(&t.id)
                .and_then(|i| i.modified_start_time.as_deref())
                .and_then(|time| parse_hhmm(time).ok())
                .map_or(true, |start| start <= now)
        })
        .filter(|t| dependency_ready(t, &instance_for, schedule, now_ext))
        .collect();

    if candidates.is_empty() {
        return UpNext::None;
    }

    let window_end = |t: &Template| {
        let (_, end) = t.time_window.unwrap_or(TimeWindow::Anytime).bounds();
        end.min(awake.end)
    };
    let scheduled_start = |t: &Template| {
        schedule
            .block_for(&t.id)
            .map(|b| b.start_time)
            .unwrap_or(u32::MAX)
    };

    candidates.sort_by(|a, b| {
        let remaining_a = window_end(a).saturating_sub(now_ext);
        let remaining_b = window_end(b).saturating_sub(now_ext);
        let fits_a = a.duration_minutes <= remaining_a;
        let fits_b = b.duration_minutes <= remaining_b;

        b.priority
            .cmp(&a.priority)
            .then_with(|| fits_b.cmp(&fits_a))
            .then_with(|| {
                if !fits_a && !fits_b {
                    // neither fits the closing window: the shorter one is
                    // the lesser overshoot
                    a.duration_minutes.cmp(&b.duration_minutes)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| scheduled_start(a).cmp(&scheduled_start(b)))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });

    UpNext::Flexible {
        template_id: candidates[0].id.clone(),
    }
}

/// A prerequisite is satisfied once it is done today or its block is behind
/// us.
fn dependency_ready<'a>(
    template: &Template,
    instance_for: &impl Fn(&str) -> Option<&'a Instance>,
    schedule: &ScheduleResult,
    now_ext: u32,
) -> bool {
    let dep_id = match &template.depends_on {
        Some(dep) => dep.as_str(),
        None => return true,
    };
    if let Some(instance) = instance_for(dep_id) {
        if instance.status == crate::model::InstanceStatus::Completed {
            return true;
        }
    }
    schedule
        .block_for(dep_id)
        .map_or(false, |block| block.end_time <= now_ext)
}
