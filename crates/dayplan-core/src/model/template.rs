//! Task templates: the reusable definitions the day is planned from.

use serde::{Deserialize, Serialize};

use crate::clock::parse_hhmm;
use crate::error::ValidationError;
use crate::recurrence::RecurrenceRule;

/// How a template is placed on the day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingType {
    /// Placed at `defaultTime` (or the day's manual override)
    Fixed,
    /// Placed by the engine inside its time window
    Flexible,
}

/// Named placement window for flexible tasks.
///
/// Windows are fixed stretches of the local day; `anytime` spans the whole
/// schedulable day (06:00-23:00).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Morning,
    Afternoon,
    Evening,
    Anytime,
}

impl TimeWindow {
    /// Window bounds as minutes since midnight, half-open `[start, end)`.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            TimeWindow::Morning => (6 * 60, 12 * 60),
            TimeWindow::Afternoon => (12 * 60, 18 * 60),
            TimeWindow::Evening => (18 * 60, 23 * 60),
            TimeWindow::Anytime => (6 * 60, 23 * 60),
        }
    }

    /// The named window containing `minute`, or `Anytime` outside all three.
    pub fn for_minute(minute: u32) -> Self {
        for window in [TimeWindow::Morning, TimeWindow::Afternoon, TimeWindow::Evening] {
            let (start, end) = window.bounds();
            if (start..end).contains(&minute) {
                return window;
            }
        }
        TimeWindow::Anytime
    }

    /// Whether `minute` falls inside this window.
    pub fn contains(self, minute: u32) -> bool {
        let (start, end) = self.bounds();
        (start..end).contains(&minute)
    }
}

/// A reusable task definition.
///
/// Deleting a template is soft: `isActive` flips to `false` and the record is
/// kept for history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Task length in minutes, 1..=480
    pub duration_minutes: u32,
    /// 1 (lowest) ..= 5 (highest)
    pub priority: u8,
    pub is_mandatory: bool,
    pub scheduling_type: SchedulingType,
    /// `HH:MM`; required for fixed templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_time: Option<String>,
    /// Required for flexible templates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    /// Single prerequisite template id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    /// Per-anchor visual buffer override, minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_minutes: Option<u32>,
    /// Crunch-time floor; shortening is skipped when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<RecurrenceRule>,
    /// Epoch milliseconds of the last library edit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

fn default_active() -> bool {
    true
}

impl Template {
    pub fn is_fixed(&self) -> bool {
        self.scheduling_type == SchedulingType::Fixed
    }

    pub fn is_flexible(&self) -> bool {
        self.scheduling_type == SchedulingType::Flexible
    }

    /// The buffer band width for this anchor, minutes.
    pub fn effective_buffer(&self, default_minutes: u32) -> u32 {
        self.buffer_minutes.unwrap_or(default_minutes)
    }

    /// Validate the template's own invariants.
    ///
    /// Recurrence rules have their own structured validation in
    /// [`RecurrenceRule::validate`]; this covers everything else.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "must not be empty"));
        }
        if !(1..=480).contains(&self.duration_minutes) {
            return Err(ValidationError::new(
                "durationMinutes",
                format!("{} is out of range 1..=480", self.duration_minutes),
            ));
        }
        if !(1..=5).contains(&self.priority) {
            return Err(ValidationError::new(
                "priority",
                format!("{} is out of range 1..=5", self.priority),
            ));
        }
        match self.scheduling_type {
            SchedulingType::Fixed => match &self.default_time {
                Some(time) => {
                    parse_hhmm(time)
                        .map_err(|e| ValidationError::new("defaultTime", e.to_string()))?;
                }
                None => {
                    return Err(ValidationError::new(
                        "defaultTime",
                        "fixed templates require defaultTime",
                    ));
                }
            },
            SchedulingType::Flexible => {
                if self.time_window.is_none() {
                    return Err(ValidationError::new(
                        "timeWindow",
                        "flexible templates require timeWindow",
                    ));
                }
            }
        }
        if let Some(dep) = &self.depends_on {
            if dep == &self.id {
                return Err(ValidationError::new(
                    "dependsOn",
                    "template cannot depend on itself",
                ));
            }
        }
        if let Some(min) = self.min_duration {
            if min < 1 {
                return Err(ValidationError::new("minDuration", "must be >= 1"));
            }
        }
        Ok(())
    }
}

/// A template as submitted to [`crate::ports::TemplateStore::create`].
///
/// Identical to [`Template`] minus the id, which the adapter assigns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration_minutes: u32,
    pub priority: u8,
    pub is_mandatory: bool,
    pub scheduling_type: SchedulingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<RecurrenceRule>,
}

impl TemplateDraft {
    /// Promote the draft to a full template with an adapter-assigned id.
    pub fn into_template(self, id: String, updated_at: i64) -> Template {
        Template {
            id,
            name: self.name,
            description: self.description,
            duration_minutes: self.duration_minutes,
            priority: self.priority,
            is_mandatory: self.is_mandatory,
            scheduling_type: self.scheduling_type,
            default_time: self.default_time,
            time_window: self.time_window,
            depends_on: self.depends_on,
            buffer_minutes: self.buffer_minutes,
            min_duration: self.min_duration,
            is_active: true,
            recurrence_rule: self.recurrence_rule,
            updated_at: Some(updated_at),
        }
    }
}

/// Partial update for [`crate::ports::TemplateStore::update`].
///
/// Fields left `None` are untouched; `Some` fields overwrite. Optional
/// template fields use a double `Option` so a patch can also clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mandatory: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling_type: Option<SchedulingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_time: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<Option<TimeWindow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_minutes: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_duration: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<Option<RecurrenceRule>>,
}

impl TemplatePatch {
    /// Merge this patch into `template`, stamping `updated_at`.
    pub fn apply_to(&self, template: &mut Template, updated_at: i64) {
        if let Some(name) = &self.name {
            template.name = name.clone();
        }
        if let Some(description) = &self.description {
            template.description = description.clone();
        }
        if let Some(duration) = self.duration_minutes {
            template.duration_minutes = duration;
        }
        if let Some(priority) = self.priority {
            template.priority = priority;
        }
        if let Some(mandatory) = self.is_mandatory {
            template.is_mandatory = mandatory;
        }
        if let Some(scheduling_type) = self.scheduling_type {
            template.scheduling_type = scheduling_type;
        }
        if let Some(default_time) = &self.default_time {
            template.default_time = default_time.clone();
        }
        if let Some(time_window) = self.time_window {
            template.time_window = time_window;
        }
        if let Some(depends_on) = &self.depends_on {
            template.depends_on = depends_on.clone();
        }
        if let Some(buffer) = self.buffer_minutes {
            template.buffer_minutes = buffer;
        }
        if let Some(min_duration) = self.min_duration {
            template.min_duration = min_duration;
        }
        if let Some(active) = self.is_active {
            template.is_active = active;
        }
        if let Some(rule) = &self.recurrence_rule {
            template.recurrence_rule = rule.clone();
        }
        template.updated_at = Some(updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_flexible(id: &str) -> Template {
        Template {
            id: id.to_string(),
            name: format!("Task {id}"),
            description: None,
            duration_minutes: 30,
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

    #[test]
    fn window_bounds() {
        assert_eq!(TimeWindow::Morning.bounds(), (360, 720));
        assert_eq!(TimeWindow::Afternoon.bounds(), (720, 1080));
        assert_eq!(TimeWindow::Evening.bounds(), (1080, 1380));
        assert_eq!(TimeWindow::Anytime.bounds(), (360, 1380));
    }

    #[test]
    fn window_for_minute() {
        assert_eq!(TimeWindow::for_minute(390), TimeWindow::Morning);
        assert_eq!(TimeWindow::for_minute(720), TimeWindow::Afternoon);
        assert_eq!(TimeWindow::for_minute(1100), TimeWindow::Evening);
        assert_eq!(TimeWindow::for_minute(300), TimeWindow::Anytime);
        assert_eq!(TimeWindow::for_minute(1400), TimeWindow::Anytime);
    }

    #[test]
    fn validate_rejects_bad_duration() {
        let mut t = make_flexible("a");
        t.duration_minutes = 0;
        assert_eq!(t.validate().unwrap_err().field, "durationMinutes");
        t.duration_minutes = 481;
        assert_eq!(t.validate().unwrap_err().field, "durationMinutes");
    }

    #[test]
    fn validate_requires_default_time_for_fixed() {
        let mut t = make_flexible("a");
        t.scheduling_type = SchedulingType::Fixed;
        assert_eq!(t.validate().unwrap_err().field, "defaultTime");
        t.default_time = Some("08:00".to_string());
        assert!(t.validate().is_ok());
    }

    #[test]
    fn validate_rejects_self_dependency() {
        let mut t = make_flexible("a");
        t.depends_on = Some("a".to_string());
        assert_eq!(t.validate().unwrap_err().field, "dependsOn");
    }

    #[test]
    fn serializes_camel_case_and_omits_absent_fields() {
        let t = make_flexible("a");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["durationMinutes"], 30);
        assert_eq!(json["schedulingType"], "flexible");
        assert_eq!(json["timeWindow"], "morning");
        assert!(json.get("defaultTime").is_none());
        assert!(json.get("dependsOn").is_none());
    }

    #[test]
    fn patch_merges_and_stamps_updated_at() {
        let mut t = make_flexible("a");
        let patch = TemplatePatch {
            priority: Some(5),
            description: Some(Some("desc".to_string())),
            ..TemplatePatch::default()
        };
        patch.apply_to(&mut t, 1_700_000_000_000);
        assert_eq!(t.priority, 5);
        assert_eq!(t.description.as_deref(), Some("desc"));
        assert_eq!(t.updated_at, Some(1_700_000_000_000));
        // untouched fields survive
        assert_eq!(t.duration_minutes, 30);
    }
}
