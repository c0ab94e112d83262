//! Capability ports consumed from external collaborators.
//!
//! Persistence, caching, and the wall clock are owned by adapters outside
//! the core; the store talks to them through these traits. The `memory`
//! module carries HashMap-backed reference adapters used by tests and as the
//! store's defaults.

use chrono::NaiveDate;

use crate::engine::ScheduleResult;
use crate::error::PortError;
use crate::model::{Instance, Settings, Template, TemplateDraft, TemplatePatch};

/// Per-date instance persistence.
pub trait InstanceStore {
    fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Instance>, PortError>;

    /// Idempotent by the instance's deterministic id.
    fn upsert(&mut self, instance: &Instance) -> Result<(), PortError>;

    /// Removing a missing id is success.
    fn remove(&mut self, instance_id: &str) -> Result<(), PortError>;
}

/// Template library persistence.
pub trait TemplateStore {
    fn list(&self) -> Result<Vec<Template>, PortError>;

    /// The adapter assigns the id and stamps `updatedAt`.
    fn create(&mut self, draft: TemplateDraft) -> Result<Template, PortError>;

    /// Merges the patch and stamps a new `updatedAt`.
    fn update(&mut self, id: &str, patch: TemplatePatch) -> Result<Template, PortError>;

    /// Sets `isActive = false`; the record stays for history.
    fn soft_delete(&mut self, id: &str) -> Result<(), PortError>;

    fn duplicate(&mut self, id: &str) -> Result<Template, PortError>;
}

/// Settings persistence.
pub trait SettingsStore {
    fn get(&self) -> Result<Settings, PortError>;
    fn save(&mut self, settings: &Settings) -> Result<Settings, PortError>;
}

/// Optional schedule result cache.
pub trait ScheduleCache {
    fn get_cached(&self, date: NaiveDate) -> Option<ScheduleResult>;
    fn put_cached(&mut self, date: NaiveDate, result: &ScheduleResult);
}

/// The current local wall-clock moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockNow {
    pub date: NaiveDate,
    /// Minutes since local midnight
    pub minutes: u32,
}

/// Local wall clock.
pub trait Clock {
    fn now(&self) -> ClockNow;
}

/// View parameters supplied by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponsiveParams {
    /// Pixels per hour
    pub row_height: f64,
    /// Visible lanes per cluster
    pub lane_cap: usize,
    /// Minimum gap length worth surfacing, minutes
    pub gap_min_minutes: u32,
    /// Buffer band width when the template has no override, minutes
    pub anchor_buffer_default_minutes: u32,
    pub prefers_reduced_motion: bool,
}

impl Default for ResponsiveParams {
    fn default() -> Self {
        Self {
            row_height: 60.0,
            lane_cap: 3,
            gap_min_minutes: 5,
            anchor_buffer_default_minutes: 8,
            prefers_reduced_motion: false,
        }
    }
}

/// In-memory reference adapters.
pub mod memory {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use super::{Clock, ClockNow, InstanceStore, ScheduleCache, SettingsStore, TemplateStore};
    use crate::engine::ScheduleResult;
    use crate::error::PortError;
    use crate::model::{Instance, Settings, Template, TemplateDraft, TemplatePatch};

    /// HashMap-backed instance store.
    #[derive(Debug, Default)]
    pub struct MemoryInstanceStore {
        instances: BTreeMap<String, Instance>,
        /// When set, the next mutation fails; used to exercise revert paths.
        pub fail_next: bool,
    }

    impl MemoryInstanceStore {
        pub fn new() -> Self {
            Self::default()
        }

        fn check_failure(&mut self, op: &str) -> Result<(), PortError> {
            if self.fail_next {
                self.fail_next = false;
                return Err(PortError::persist_failed(op, "injected failure"));
            }
            Ok(())
        }
    }

    impl InstanceStore for MemoryInstanceStore {
        fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Instance>, PortError> {
            Ok(self
                .instances
                .values()
                .filter(|i| i.date == date)
                .cloned()
                .collect())
        }

        fn upsert(&mut self, instance: &Instance) -> Result<(), PortError> {
            self.check_failure("upsert")?;
            self.instances
                .insert(instance.id.clone(), instance.clone());
            Ok(())
        }

        fn remove(&mut self, instance_id: &str) -> Result<(), PortError> {
            self.check_failure("remove")?;
            self.instances.remove(instance_id);
            Ok(())
        }
    }

    /// In-memory template store with counter-based id assignment.
    #[derive(Debug, Default)]
    pub struct MemoryTemplateStore {
        templates: BTreeMap<String, Template>,
        next_id: u64,
        /// Millisecond timestamp stamped on writes; advanced by the caller.
        pub now_millis: i64,
        pub fail_next: bool,
    }

    impl MemoryTemplateStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_templates(templates: Vec<Template>) -> Self {
            Self {
                templates: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
                ..Self::default()
            }
        }

        fn check_failure(&mut self, op: &str) -> Result<(), PortError> {
            if self.fail_next {
                self.fail_next = false;
                return Err(PortError::persist_failed(op, "injected failure"));
            }
            Ok(())
        }

        fn fresh_id(&mut self) -> String {
            self.next_id += 1;
            format!("tpl-{}", self.next_id)
        }
    }

    impl TemplateStore for MemoryTemplateStore {
        fn list(&self) -> Result<Vec<Template>, PortError> {
            Ok(self.templates.values().cloned().collect())
        }

        fn create(&mut self, draft: TemplateDraft) -> Result<Template, PortError> {
            self.check_failure("create")?;
            let id = self.fresh_id();
            let template = draft.into_template(id.clone(), self.now_millis);
            self.templates.insert(id, template.clone());
            Ok(template)
        }

        fn update(&mut self, id: &str, patch: TemplatePatch) -> Result<Template, PortError> {
            self.check_failure("update")?;
            let now = self.now_millis;
            let template = self
                .templates
                .get_mut(id)
                .ok_or_else(|| PortError::NotFound { id: id.to_string() })?;
            patch.apply_to(template, now);
            Ok(template.clone())
        }

        fn soft_delete(&mut self, id: &str) -> Result<(), PortError> {
            self.check_failure("softDelete")?;
            let template = self
                .templates
                .get_mut(id)
                .ok_or_else(|| PortError::NotFound { id: id.to_string() })?;
            template.is_active = false;
            Ok(())
        }

        fn duplicate(&mut self, id: &str) -> Result<Template, PortError> {
            self.check_failure("duplicate")?;
            let source = self
                .templates
                .get(id)
                .ok_or_else(|| PortError::NotFound { id: id.to_string() })?
                .clone();
            let new_id = self.fresh_id();
            let mut copy = source;
            copy.id = new_id.clone();
            copy.name = format!("{} (copy)", copy.name);
            copy.updated_at = Some(self.now_millis);
            self.templates.insert(new_id, copy.clone());
            Ok(copy)
        }
    }

    /// In-memory settings store.
    #[derive(Debug, Default)]
    pub struct MemorySettingsStore {
        settings: Settings,
        pub fail_next: bool,
    }

    impl MemorySettingsStore {
        pub fn new(settings: Settings) -> Self {
            Self {
                settings,
                fail_next: false,
            }
        }
    }

    impl SettingsStore for MemorySettingsStore {
        fn get(&self) -> Result<Settings, PortError> {
            Ok(self.settings.clone())
        }

        fn save(&mut self, settings: &Settings) -> Result<Settings, PortError> {
            if self.fail_next {
                self.fail_next = false;
                return Err(PortError::persist_failed("save", "injected failure"));
            }
            self.settings = settings.clone();
            Ok(self.settings.clone())
        }
    }

    /// In-memory schedule cache.
    #[derive(Debug, Default)]
    pub struct MemoryScheduleCache {
        cached: BTreeMap<NaiveDate, ScheduleResult>,
    }

    impl MemoryScheduleCache {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl ScheduleCache for MemoryScheduleCache {
        fn get_cached(&self, date: NaiveDate) -> Option<ScheduleResult> {
            self.cached.get(&date).cloned()
        }

        fn put_cached(&mut self, date: NaiveDate, result: &ScheduleResult) {
            self.cached.insert(date, result.clone());
        }
    }

    /// Clock pinned to a fixed moment.
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock(pub ClockNow);

    impl Clock for FixedClock {
        fn now(&self) -> ClockNow {
            self.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::*;
    use super::*;
    use crate::clock::parse_date;
    use crate::model::{SchedulingType, TimeWindow};

    fn draft(name: &str) -> TemplateDraft {
        TemplateDraft {
            name: name.to_string(),
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
            recurrence_rule: None,
        }
    }

    #[test]
    fn create_assigns_id_and_activates() {
        let mut store = MemoryTemplateStore::new();
        let created = store.create(draft("Read")).unwrap();
        assert!(!created.id.is_empty());
        assert!(created.is_active);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn soft_delete_keeps_the_record() {
        let mut store = MemoryTemplateStore::new();
        let created = store.create(draft("Read")).unwrap();
        store.soft_delete(&created.id).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].is_active);
    }

    #[test]
    fn duplicate_gets_fresh_id() {
        let mut store = MemoryTemplateStore::new();
        let created = store.create(draft("Read")).unwrap();
        let copy = store.duplicate(&created.id).unwrap();
        assert_ne!(copy.id, created.id);
        assert!(copy.name.contains("copy"));
    }

    #[test]
    fn instance_upsert_is_idempotent() {
        let date = parse_date("2025-03-01").unwrap();
        let mut store = MemoryInstanceStore::new();
        let instance = Instance::new(date, "t1");
        store.upsert(&instance).unwrap();
        store.upsert(&instance).unwrap();
        assert_eq!(store.list_by_date(date).unwrap().len(), 1);
    }

    #[test]
    fn removing_missing_instance_is_success() {
        let mut store = MemoryInstanceStore::new();
        assert!(store.remove("inst-2025-03-01-ghost").is_ok());
    }
}
