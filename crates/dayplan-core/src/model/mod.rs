//! Data model: templates, per-date instances, and user settings.
//!
//! These are the strict value types everything downstream computes over.
//! Loose adapter payloads are validated into them at the boundary; nothing
//! past this module branches on "missing vs undefined".

mod instance;
mod settings;
mod template;

pub use instance::{instance_id, Instance, InstanceStatus};
pub use settings::{AwakeWindow, Settings, SleepSchedule};
pub use template::{SchedulingType, Template, TemplateDraft, TemplatePatch, TimeWindow};
