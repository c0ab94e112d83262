//! Per-date instance overrides for templates.
//!
//! An instance only exists once a day's occurrence of a template diverges
//! from the template: a status change, a manual start time, or a note.
//! Removing the instance is the "undo" that returns the occurrence to
//! pending.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::format_date;

/// Lifecycle status of a day's occurrence.
///
/// Valid transitions:
/// - pending -> completed | skipped | postponed
/// - any -> pending (undo, via instance removal)
///
/// Re-applying the current status is a no-op, which keeps replays idempotent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    #[default]
    Pending,
    Completed,
    Skipped,
    Postponed,
}

impl InstanceStatus {
    /// Whether this occurrence is out of the running for today's schedule.
    pub fn is_resolved(self) -> bool {
        !matches!(self, InstanceStatus::Pending)
    }

    /// Check if a transition is valid.
    pub fn can_transition_to(self, to: InstanceStatus) -> bool {
        match self {
            InstanceStatus::Pending => true,
            // undo returns to pending; same-status replays are idempotent
            _ => to == InstanceStatus::Pending || to == self,
        }
    }
}

/// Deterministic instance id: `inst-YYYY-MM-DD-{templateId}`.
///
/// Determinism makes every replayed mutation land on the same record.
pub fn instance_id(date: NaiveDate, template_id: &str) -> String {
    format!("inst-{}-{}", format_date(date), template_id)
}

/// A per-date override record for a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub template_id: String,
    /// ISO local date this instance belongs to
    pub date: NaiveDate,
    pub status: InstanceStatus,
    /// Manual start override for the day, `HH:MM`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Epoch milliseconds of completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl Instance {
    /// A fresh pending instance for (template, date).
    pub fn new(date: NaiveDate, template_id: impl Into<String>) -> Self {
        let template_id = template_id.into();
        Self {
            id: instance_id(date, &template_id),
            template_id,
            date,
            status: InstanceStatus::Pending,
            modified_start_time: None,
            note: None,
            completed_at: None,
        }
    }

    pub fn with_status(mut self, status: InstanceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_start_time(mut self, time: impl Into<String>) -> Self {
        self.modified_start_time = Some(time.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::parse_date;

    #[test]
    fn id_format_is_bit_exact() {
        let date = parse_date("2025-03-09").unwrap();
        assert_eq!(instance_id(date, "tpl-abc"), "inst-2025-03-09-tpl-abc");
    }

    #[test]
    fn new_instance_is_pending_with_deterministic_id() {
        let date = parse_date("2025-03-01").unwrap();
        let a = Instance::new(date, "t1");
        let b = Instance::new(date, "t1");
        assert_eq!(a, b);
        assert_eq!(a.status, InstanceStatus::Pending);
        assert_eq!(a.id, "inst-2025-03-01-t1");
    }

    #[test]
    fn transitions() {
        use InstanceStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Skipped));
        assert!(Pending.can_transition_to(Postponed));
        assert!(Completed.can_transition_to(Pending));
        assert!(Completed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Skipped));
    }

    #[test]
    fn serializes_camel_case() {
        let date = parse_date("2025-03-01").unwrap();
        let inst = Instance::new(date, "t1").with_start_time("09:15");
        let json = serde_json::to_value(&inst).unwrap();
        assert_eq!(json["templateId"], "t1");
        assert_eq!(json["date"], "2025-03-01");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["modifiedStartTime"], "09:15");
        assert!(json.get("completedAt").is_none());
    }
}
