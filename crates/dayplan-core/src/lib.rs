//! # Dayplan Core Library
//!
//! This library plans a single user's day: it turns a library of recurring
//! task templates plus per-date overrides into a deterministic,
//! conflict-free schedule and a render-ready timeline view model. All
//! operations are available to a standalone CLI binary; GUI layers are thin
//! shells over the same core.
//!
//! ## Architecture
//!
//! - **Scheduling engine**: a pure function from templates + instances +
//!   settings + date to an ordered block list with advisories
//! - **Timeline**: lane assignment, gap detection, static view model, and a
//!   separate time-variant now overlay
//! - **Store**: the owning composition root with signature-keyed memoization
//!   and optimistic mutations over persistence ports
//! - **Ports**: capability traits implemented by external adapters
//!
//! ## Key Components
//!
//! - [`engine::generate_schedule`]: the daily scheduling pipeline
//! - [`timeline::compute_static_vm`]: schedule to geometry
//! - [`upnext::select_up_next`]: one next-best task for the moment
//! - [`store::PlannerStore`]: session state and memoized derivations

pub mod clock;
pub mod deps;
pub mod engine;
pub mod error;
pub mod library;
pub mod model;
pub mod ports;
pub mod recurrence;
pub mod store;
pub mod timeline;
pub mod upnext;

pub use deps::{dependency_status, placement_order, schedulable_order, DependencyStatus};
pub use engine::{generate_schedule, ScheduleBlock, ScheduleResult};
pub use error::{Advisory, CoreError, PortError, Result, RuleError, TimeError, ValidationError};
pub use library::{dependency_badges, filter_templates, LibraryFilter, LibrarySort};
pub use model::{
    instance_id, Instance, InstanceStatus, Settings, SleepSchedule, Template, TemplateDraft,
    TemplatePatch, TimeWindow,
};
pub use ports::{
    Clock, ClockNow, InstanceStore, ResponsiveParams, ScheduleCache, SettingsStore, TemplateStore,
};
pub use recurrence::{occurs_on, Frequency, RecurrenceRule, Weekday};
pub use store::{PlannerStore, StorePorts, SyncSlice, UiState, ViewMode};
pub use timeline::{
    apply_now_overlay, assign_lanes, compute_static_vm, detect_gaps, NowOverlay, OverlayInput,
    OverdueKind, TimelineVm,
};
pub use upnext::{select_up_next, UpNext};
