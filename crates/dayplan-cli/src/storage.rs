//! File-backed adapters for the core's persistence ports.
//!
//! Templates and instances live as JSON documents in the platform data dir;
//! settings live as TOML under the config dir:
//!
//! - `~/.local/share/dayplan/templates.json`
//! - `~/.local/share/dayplan/instances.json`
//! - `~/.config/dayplan/settings.toml`
//!
//! Writes go to a temp file first and rename into place, so a crash cannot
//! leave a half-written document behind.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Timelike, Utc};
use dayplan_core::error::PortError;
use dayplan_core::model::{Instance, Settings, Template, TemplateDraft, TemplatePatch};
use dayplan_core::ports::{Clock, ClockNow, InstanceStore, SettingsStore, TemplateStore};
use dayplan_core::store::{PlannerStore, StorePorts};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Where the adapters keep their files.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub templates: PathBuf,
    pub instances: PathBuf,
    pub settings: PathBuf,
}

impl DataPaths {
    /// Platform-default locations.
    pub fn default_locations() -> Result<Self, PortError> {
        let data = dirs::data_dir()
            .ok_or_else(|| PortError::persist_failed("paths", "no data directory"))?
            .join("dayplan");
        let config = dirs::config_dir()
            .ok_or_else(|| PortError::persist_failed("paths", "no config directory"))?
            .join("dayplan");
        Ok(Self {
            templates: data.join("templates.json"),
            instances: data.join("instances.json"),
            settings: config.join("settings.toml"),
        })
    }

    /// All files under one root; used by tests.
    pub fn under(root: &Path) -> Self {
        Self {
            templates: root.join("templates.json"),
            instances: root.join("instances.json"),
            settings: root.join("settings.toml"),
        }
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, PortError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| PortError::Corrupt(format!("{}: {e}", path.display())))
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), PortError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PortError> {
    let raw = serde_json::to_string_pretty(value)
        .map_err(|e| PortError::persist_failed("serialize", e.to_string()))?;
    write_atomic(path, &raw)
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// JSON-file template store. The whole library is loaded at open and
/// rewritten on every mutation; libraries are small.
pub struct JsonTemplateStore {
    path: PathBuf,
    templates: Vec<Template>,
}

impl JsonTemplateStore {
    pub fn open(path: PathBuf) -> Result<Self, PortError> {
        let templates = read_json(&path)?;
        Ok(Self { path, templates })
    }

    fn persist(&self) -> Result<(), PortError> {
        write_json(&self.path, &self.templates)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Template, PortError> {
        self.templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| PortError::NotFound { id: id.to_string() })
    }
}

impl TemplateStore for JsonTemplateStore {
    fn list(&self) -> Result<Vec<Template>, PortError> {
        Ok(self.templates.clone())
    }

    fn create(&mut self, draft: TemplateDraft) -> Result<Template, PortError> {
        let template = draft.into_template(Uuid::new_v4().to_string(), now_millis());
        self.templates.push(template.clone());
        self.persist()?;
        Ok(template)
    }

    fn update(&mut self, id: &str, patch: TemplatePatch) -> Result<Template, PortError> {
        let stamp = now_millis();
        let template = self.find_mut(id)?;
        patch.apply_to(template, stamp);
        let updated = template.clone();
        self.persist()?;
        Ok(updated)
    }

    fn soft_delete(&mut self, id: &str) -> Result<(), PortError> {
        self.find_mut(id)?.is_active = false;
        self.persist()
    }

    fn duplicate(&mut self, id: &str) -> Result<Template, PortError> {
        let source = self
            .templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| PortError::NotFound { id: id.to_string() })?
            .clone();
        let mut copy = source;
        copy.id = Uuid::new_v4().to_string();
        copy.name = format!("{} (copy)", copy.name);
        copy.updated_at = Some(now_millis());
        self.templates.push(copy.clone());
        self.persist()?;
        Ok(copy)
    }
}

/// JSON-file instance store.
pub struct JsonInstanceStore {
    path: PathBuf,
    instances: Vec<Instance>,
}

impl JsonInstanceStore {
    pub fn open(path: PathBuf) -> Result<Self, PortError> {
        let instances = read_json(&path)?;
        Ok(Self { path, instances })
    }

    fn persist(&self) -> Result<(), PortError> {
        write_json(&self.path, &self.instances)
    }
}

impl InstanceStore for JsonInstanceStore {
    fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Instance>, PortError> {
        Ok(self
            .instances
            .iter()
            .filter(|i| i.date == date)
            .cloned()
            .collect())
    }

    fn upsert(&mut self, instance: &Instance) -> Result<(), PortError> {
        self.instances.retain(|i| i.id != instance.id);
        self.instances.push(instance.clone());
        self.persist()
    }

    fn remove(&mut self, instance_id: &str) -> Result<(), PortError> {
        let before = self.instances.len();
        self.instances.retain(|i| i.id != instance_id);
        if self.instances.len() == before {
            // missing id is success; nothing to rewrite
            return Ok(());
        }
        self.persist()
    }
}

/// TOML-file settings store.
pub struct TomlSettingsStore {
    path: PathBuf,
    settings: Settings,
}

impl TomlSettingsStore {
    pub fn open(path: PathBuf) -> Result<Self, PortError> {
        let settings = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            toml::from_str(&raw)
                .map_err(|e| PortError::Corrupt(format!("{}: {e}", path.display())))?
        } else {
            Settings::default()
        };
        Ok(Self { path, settings })
    }
}

impl SettingsStore for TomlSettingsStore {
    fn get(&self) -> Result<Settings, PortError> {
        Ok(self.settings.clone())
    }

    fn save(&mut self, settings: &Settings) -> Result<Settings, PortError> {
        let raw = toml::to_string_pretty(settings)
            .map_err(|e| PortError::persist_failed("serialize", e.to_string()))?;
        write_atomic(&self.path, &raw)?;
        self.settings = settings.clone();
        Ok(self.settings.clone())
    }
}

/// The host's local wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> ClockNow {
        let now = chrono::Local::now();
        ClockNow {
            date: now.date_naive(),
            minutes: now.time().hour() * 60 + now.time().minute(),
        }
    }
}

/// Open a store over the default file locations.
pub fn open_store() -> Result<PlannerStore, dayplan_core::CoreError> {
    let paths = DataPaths::default_locations()?;
    open_store_at(paths)
}

/// Open a store over explicit file locations.
pub fn open_store_at(paths: DataPaths) -> Result<PlannerStore, dayplan_core::CoreError> {
    let ports = StorePorts {
        instances: Box::new(JsonInstanceStore::open(paths.instances)?),
        templates: Box::new(JsonTemplateStore::open(paths.templates)?),
        settings: Box::new(TomlSettingsStore::open(paths.settings)?),
        cache: None,
        clock: Box::new(SystemClock),
    };
    PlannerStore::init(None, ports)
}
