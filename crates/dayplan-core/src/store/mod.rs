//! The owning store composing the whole pipeline.
//!
//! One [`PlannerStore`] instance holds the session's templates, per-date
//! instances, settings, filter and UI state, plus a per-date memo of derived
//! schedules. Mutations are optimistic: applied locally first, pushed
//! through the persistence ports, and reverted if the port fails. Calls are
//! serialized by the caller; the store keeps no internal locks.

mod memo;

pub use memo::schedule_signature;

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::{generate_schedule, ScheduleResult};
use crate::error::{CoreError, Result};
use crate::library::{filter_templates, LibraryFilter};
use crate::model::{
    instance_id, Instance, InstanceStatus, Settings, Template, TemplateDraft, TemplatePatch,
};
use crate::ports::{
    Clock, InstanceStore, ResponsiveParams, ScheduleCache, SettingsStore, TemplateStore,
};
use crate::timeline::{apply_now_overlay, compute_static_vm, NowOverlay, OverlayInput, TimelineVm};
use crate::upnext::{select_up_next, UpNext};

/// Main view selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Timeline,
    Library,
}

/// Transient UI state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub current_date: NaiveDate,
    pub view_mode: ViewMode,
    /// Template id the Up Next card is pinned to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_next_selection: Option<String>,
}

/// Persistence status surfaced to the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncSlice {
    pub pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// The persistence and clock adapters a store runs against.
pub struct StorePorts {
    pub instances: Box<dyn InstanceStore>,
    pub templates: Box<dyn TemplateStore>,
    pub settings: Box<dyn SettingsStore>,
    pub cache: Option<Box<dyn ScheduleCache>>,
    pub clock: Box<dyn Clock>,
}

struct MemoEntry {
    signature: String,
    result: ScheduleResult,
}

/// The owning store.
pub struct PlannerStore {
    user_id: Option<String>,
    settings: Settings,
    templates: Vec<Template>,
    instances_by_date: BTreeMap<NaiveDate, Vec<Instance>>,
    filter: LibraryFilter,
    ui: UiState,
    sync: SyncSlice,
    memo: HashMap<NaiveDate, MemoEntry>,
    ports: StorePorts,
}

impl PlannerStore {
    /// Initialize after identity is known: loads templates and settings
    /// through the ports.
    pub fn init(user_id: Option<String>, ports: StorePorts) -> Result<Self> {
        let templates = ports.templates.list().map_err(CoreError::from)?;
        let settings = ports.settings.get().map_err(CoreError::from)?;
        let today = ports.clock.now().date;
        Ok(Self {
            user_id,
            settings,
            templates,
            instances_by_date: BTreeMap::new(),
            filter: LibraryFilter::default(),
            ui: UiState {
                current_date: today,
                view_mode: ViewMode::default(),
                up_next_selection: None,
            },
            sync: SyncSlice::default(),
            memo: HashMap::new(),
            ports,
        })
    }

    /// Tear down on sign-out: drop identity and every cached derivation.
    pub fn teardown(&mut self) {
        self.user_id = None;
        self.instances_by_date.clear();
        self.memo.clear();
        self.templates.clear();
        self.sync = SyncSlice::default();
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn sync_slice(&self) -> &SyncSlice {
        &self.sync
    }

    pub fn ui_state(&self) -> &UiState {
        &self.ui
    }

    pub fn set_current_date(&mut self, date: NaiveDate) {
        self.ui.current_date = date;
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.ui.view_mode = mode;
    }

    pub fn set_up_next_selection(&mut self, template_id: Option<String>) {
        self.ui.up_next_selection = template_id;
    }

    pub fn library_filter(&self) -> &LibraryFilter {
        &self.filter
    }

    pub fn set_library_filter(&mut self, filter: LibraryFilter) {
        self.filter = filter;
    }

    /// The library view under the current filter.
    pub fn filtered_templates(&self) -> Vec<&Template> {
        filter_templates(&self.templates, &self.filter)
    }

    /// Instances for a date; the slice reference is stable until a mutation.
    pub fn get_task_instances_for_date(&mut self, date: NaiveDate) -> &[Instance] {
        self.ensure_instances(date);
        self.instances_by_date
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Memoized schedule for a date; recomputes only when inputs change.
    pub fn generate_schedule_for_date(&mut self, date: NaiveDate) -> &ScheduleResult {
        self.ensure_instances(date);

        let settings = &self.settings;
        let templates = &self.templates;
        let instances: &[Instance] = self
            .instances_by_date
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let signature = schedule_signature(settings, templates, instances, date);
        let cache = self.ports.cache.as_deref_mut();

        match self.memo.entry(date) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().signature != signature {
                    let result = generate_schedule(settings, templates, instances, date, None);
                    if let Some(cache) = cache {
                        cache.put_cached(date, &result);
                    }
                    occupied.insert(MemoEntry { signature, result });
                }
                &occupied.into_mut().result
            }
            Entry::Vacant(vacant) => {
                let result = generate_schedule(settings, templates, instances, date, None);
                if let Some(cache) = cache {
                    cache.put_cached(date, &result);
                }
                &vacant.insert(MemoEntry { signature, result }).result
            }
        }
    }

    /// Static timeline VM for a date.
    pub fn timeline_vm(&mut self, date: NaiveDate, params: &ResponsiveParams) -> Result<TimelineVm> {
        let result = self.generate_schedule_for_date(date).clone();
        compute_static_vm(&result, &self.templates, &self.settings, params)
    }

    /// Now overlay for a date; `None` when the date is not today.
    pub fn now_overlay(
        &mut self,
        date: NaiveDate,
        params: &ResponsiveParams,
    ) -> Result<Option<NowOverlay>> {
        let now = self.ports.clock.now();
        if now.date != date {
            return Ok(None);
        }
        let vm = self.timeline_vm(date, params)?;
        let instances = self.get_task_instances_for_date(date);
        Ok(Some(apply_now_overlay(
            &vm,
            instances,
            OverlayInput {
                is_today: true,
                now_mins: now.minutes,
            },
        )))
    }

    /// The Up Next suggestion for the current moment.
    pub fn up_next(&mut self) -> UpNext {
        let now = self.ports.clock.now();
        let schedule = self.generate_schedule_for_date(now.date).clone();
        let instances = self
            .instances_by_date
            .get(&now.date)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        select_up_next(
            &self.templates,
            instances,
            &schedule,
            &self.settings,
            now.date,
            now.minutes,
        )
    }

    /// Set an occurrence's status. Pending means undo: the instance record
    /// is removed entirely.
    ///
    /// Optimistic; returns false and reverts when the port write fails.
    pub fn set_instance_status(
        &mut self,
        date: NaiveDate,
        template_id: &str,
        status: InstanceStatus,
    ) -> bool {
        self.ensure_instances(date);
        let id = instance_id(date, template_id);
        let previous = self.instance_by_id(date, &id);

        if previous.as_ref().map(|i| i.status) == Some(status) {
            return true;
        }

        if status == InstanceStatus::Pending {
            self.apply_local(date, &id, None);
            let outcome = self.with_pending(|store| store.ports.instances.remove(&id));
            return self.settle(date, &id, previous, outcome);
        }

        let mut next = previous
            .clone()
            .unwrap_or_else(|| Instance::new(date, template_id));
        next.status = status;
        next.completed_at = (status == InstanceStatus::Completed).then(|| self.now_millis());

        self.apply_local(date, &id, Some(next.clone()));
        let outcome = self.with_pending(|store| store.ports.instances.upsert(&next));
        self.settle(date, &id, previous, outcome)
    }

    /// Attach or clear a note (skip/postpone reason) on the day's instance.
    pub fn set_instance_note(
        &mut self,
        date: NaiveDate,
        template_id: &str,
        note: Option<&str>,
    ) -> bool {
        self.ensure_instances(date);
        let id = instance_id(date, template_id);
        let previous = self.instance_by_id(date, &id);

        let mut next = previous
            .clone()
            .unwrap_or_else(|| Instance::new(date, template_id));
        next.note = note.map(str::to_string);

        if next == Instance::new(date, template_id) {
            if previous.is_none() {
                return true;
            }
            self.apply_local(date, &id, None);
            let outcome = self.with_pending(|store| store.ports.instances.remove(&id));
            return self.settle(date, &id, previous, outcome);
        }

        self.apply_local(date, &id, Some(next.clone()));
        let outcome = self.with_pending(|store| store.ports.instances.upsert(&next));
        self.settle(date, &id, previous, outcome)
    }

    /// Set or clear a manual start override for the day.
    pub fn set_instance_start_time(
        &mut self,
        date: NaiveDate,
        template_id: &str,
        start_time: Option<&str>,
    ) -> bool {
        if let Some(time) = start_time {
            if let Err(e) = crate::clock::parse_hhmm(time) {
                self.sync.last_error = Some(e.to_string());
                return false;
            }
        }

        self.ensure_instances(date);
        let id = instance_id(date, template_id);
        let previous = self.instance_by_id(date, &id);

        let mut next = previous
            .clone()
            .unwrap_or_else(|| Instance::new(date, template_id));
        next.modified_start_time = start_time.map(str::to_string);

        // an instance reduced to an untouched pending record can go away
        let vacuous = next.status == InstanceStatus::Pending
            && next.modified_start_time.is_none()
            && next.note.is_none();

        if vacuous {
            if previous.is_none() {
                return true;
            }
            self.apply_local(date, &id, None);
            let outcome = self.with_pending(|store| store.ports.instances.remove(&id));
            return self.settle(date, &id, previous, outcome);
        }

        self.apply_local(date, &id, Some(next.clone()));
        let outcome = self.with_pending(|store| store.ports.instances.upsert(&next));
        self.settle(date, &id, previous, outcome)
    }

    /// Create a template through the port (the adapter assigns the id).
    pub fn create_template(&mut self, draft: TemplateDraft) -> Option<Template> {
        // validate with a placeholder id; the adapter's id cannot change
        // field validity
        let probe = draft.clone().into_template("pending".to_string(), 0);
        if let Err(e) = probe.validate() {
            self.sync.last_error = Some(e.to_string());
            return None;
        }
        if let Some(rule) = &draft.recurrence_rule {
            if let Some(first) = rule.validate().first() {
                self.sync.last_error = Some(first.to_string());
                return None;
            }
        }

        match self.with_pending(|store| store.ports.templates.create(draft)) {
            Ok(template) => {
                self.templates.push(template.clone());
                self.invalidate_all();
                self.sync.last_error = None;
                Some(template)
            }
            Err(e) => {
                self.sync.last_error = Some(e.to_string());
                None
            }
        }
    }

    /// Patch a template. Optimistic; reverts the local copy on port failure.
    pub fn update_template(&mut self, id: &str, patch: TemplatePatch) -> bool {
        let position = match self.templates.iter().position(|t| t.id == id) {
            Some(position) => position,
            None => {
                self.sync.last_error = Some(format!("unknown template '{id}'"));
                return false;
            }
        };
        let previous = self.templates[position].clone();

        let mut preview = previous.clone();
        patch.apply_to(&mut preview, previous.updated_at.unwrap_or(0));
        if let Err(e) = preview.validate() {
            self.sync.last_error = Some(e.to_string());
            return false;
        }

        self.templates[position] = preview;
        self.invalidate_all();

        match self.with_pending(|store| store.ports.templates.update(id, patch)) {
            Ok(saved) => {
                // the adapter stamps updatedAt; take its copy
                self.templates[position] = saved;
                self.sync.last_error = None;
                true
            }
            Err(e) => {
                self.templates[position] = previous;
                self.invalidate_all();
                self.sync.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Soft-delete a template (sets inactive, keeps history).
    pub fn soft_delete_template(&mut self, id: &str) -> bool {
        let position = match self.templates.iter().position(|t| t.id == id) {
            Some(position) => position,
            None => {
                self.sync.last_error = Some(format!("unknown template '{id}'"));
                return false;
            }
        };
        let previous_active = self.templates[position].is_active;
        self.templates[position].is_active = false;
        self.invalidate_all();

        match self.with_pending(|store| store.ports.templates.soft_delete(id)) {
            Ok(()) => {
                self.sync.last_error = None;
                true
            }
            Err(e) => {
                self.templates[position].is_active = previous_active;
                self.invalidate_all();
                self.sync.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Duplicate a template through the port.
    pub fn duplicate_template(&mut self, id: &str) -> Option<Template> {
        match self.with_pending(|store| store.ports.templates.duplicate(id)) {
            Ok(copy) => {
                self.templates.push(copy.clone());
                self.invalidate_all();
                self.sync.last_error = None;
                Some(copy)
            }
            Err(e) => {
                self.sync.last_error = Some(e.to_string());
                None
            }
        }
    }

    /// Replace settings. Optimistic with revert.
    pub fn update_settings(&mut self, settings: Settings) -> bool {
        if let Err(e) = settings.validate() {
            self.sync.last_error = Some(e.to_string());
            return false;
        }
        let previous = std::mem::replace(&mut self.settings, settings.clone());
        self.invalidate_all();

        match self.with_pending(|store| store.ports.settings.save(&settings)) {
            Ok(saved) => {
                self.settings = saved;
                self.sync.last_error = None;
                true
            }
            Err(e) => {
                self.settings = previous;
                self.invalidate_all();
                self.sync.last_error = Some(e.to_string());
                false
            }
        }
    }

    fn ensure_instances(&mut self, date: NaiveDate) {
        if self.instances_by_date.contains_key(&date) {
            return;
        }
        match self.ports.instances.list_by_date(date) {
            Ok(list) => {
                self.instances_by_date.insert(date, list);
            }
            Err(e) => {
                self.sync.last_error = Some(e.to_string());
                self.instances_by_date.insert(date, Vec::new());
            }
        }
    }

    fn instance_by_id(&self, date: NaiveDate, id: &str) -> Option<Instance> {
        self.instances_by_date
            .get(&date)
            .and_then(|list| list.iter().find(|i| i.id == id))
            .cloned()
    }

    /// Replace (`Some`) or remove (`None`) the instance locally and drop the
    /// date's memoized schedule.
    fn apply_local(&mut self, date: NaiveDate, id: &str, next: Option<Instance>) {
        let list = self.instances_by_date.entry(date).or_default();
        list.retain(|i| i.id != id);
        if let Some(instance) = next {
            list.push(instance);
            list.sort_by(|a, b| a.id.cmp(&b.id));
        }
        self.memo.remove(&date);
    }

    /// Commit or revert after the port call.
    fn settle(
        &mut self,
        date: NaiveDate,
        id: &str,
        previous: Option<Instance>,
        outcome: std::result::Result<(), crate::error::PortError>,
    ) -> bool {
        match outcome {
            Ok(()) => {
                self.sync.last_error = None;
                true
            }
            Err(e) => {
                self.apply_local(date, id, previous);
                self.sync.last_error = Some(e.to_string());
                false
            }
        }
    }

    fn with_pending<T>(&mut self, call: impl FnOnce(&mut Self) -> T) -> T {
        self.sync.pending = true;
        let outcome = call(self);
        self.sync.pending = false;
        outcome
    }

    fn invalidate_all(&mut self) {
        self.memo.clear();
    }

    /// Epoch milliseconds of the clock port's current moment.
    fn now_millis(&self) -> i64 {
        let now = self.ports.clock.now();
        now.date
            .and_hms_opt(now.minutes / 60, now.minutes % 60, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default()
    }
}
