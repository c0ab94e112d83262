//! Core error types for dayplan-core.
//!
//! Hard failures are expressed through the `thiserror` hierarchy below and
//! never cross a component boundary as a panic. Soft scheduling problems are
//! not errors at all -- they travel as [`Advisory`] values inside a
//! [`crate::engine::ScheduleResult`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type for dayplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed wall-clock time or date input
    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    /// Invalid recurrence rule
    #[error("Recurrence rule error: {0}")]
    Rule(#[from] RuleError),

    /// Invalid field value caught at the boundary
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persistence adapter failure
    #[error("Persistence error: {0}")]
    Port(#[from] PortError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Wall-clock parsing errors.
///
/// Times are strict 24-hour `HH:MM`; dates are ISO `YYYY-MM-DD` local dates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    /// Input did not parse as `HH:MM`
    #[error("Malformed time '{input}': expected HH:MM")]
    BadTime { input: String },

    /// Input did not parse as `YYYY-MM-DD`
    #[error("Malformed date '{input}': expected YYYY-MM-DD")]
    BadDate { input: String },
}

/// Structured recurrence-rule validation errors.
///
/// Validation returns the full list of problems, not just the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "camelCase")]
pub enum RuleError {
    /// Weekly rules must name at least one day of the week
    #[error("Weekly rules require a non-empty daysOfWeek set")]
    WeeklyRequiresDays,

    /// Monthly rules must carry a day of month
    #[error("Monthly rules require dayOfMonth")]
    MonthlyRequiresDayOfMonth,

    /// Yearly rules must carry both month and day of month
    #[error("Yearly rules require month and dayOfMonth")]
    YearlyRequiresMonthAndDay,

    /// Interval must be at least 1
    #[error("Interval {interval} is out of range: must be >= 1")]
    IntervalTooSmall { interval: u32 },

    /// Day of month outside 1..=31
    #[error("dayOfMonth {day} is out of range 1..=31")]
    DayOfMonthOutOfRange { day: u32 },

    /// Month outside 1..=12
    #[error("month {month} is out of range 1..=12")]
    MonthOutOfRange { month: u32 },

    /// startDate must not come after endDate
    #[error("startDate is after endDate")]
    StartAfterEnd,
}

/// Invalid field value caught at the boundary.
///
/// Carries the field path so callers can point at the offending input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for '{field}': {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Persistence adapter errors.
#[derive(Error, Debug)]
pub enum PortError {
    /// The adapter could not complete a write; the store reverts
    #[error("Persist failed during {op}: {message}")]
    PersistFailed { op: String, message: String },

    /// Lookup by id found nothing
    #[error("Not found: {id}")]
    NotFound { id: String },

    /// Underlying I/O failure in a file-backed adapter
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Corrupt on-disk payload
    #[error("Corrupt data: {0}")]
    Corrupt(String),
}

impl PortError {
    pub fn persist_failed(op: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PersistFailed {
            op: op.into(),
            message: message.into(),
        }
    }
}

/// Soft problems reported by the scheduling engine and dependency resolver.
///
/// A result carrying advisories is still a result; `success` only reflects
/// whether every mandatory task found a seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Advisory {
    /// Two mandatory anchors overlapped; the later one was dropped
    #[serde(rename_all = "camelCase")]
    HardConflict { template_id: String },

    /// Non-mandatory anchors overlap; both kept, laned by the view model
    #[serde(rename_all = "camelCase")]
    SoftOverlap {
        template_id: String,
        other_id: String,
    },

    /// A mandatory task found no free interval
    #[serde(rename_all = "camelCase")]
    MandatoryUnplaced { template_id: String },

    /// A non-mandatory task found no free interval and was omitted
    #[serde(rename_all = "camelCase")]
    SkippedForSpace { template_id: String },

    /// Crunch time placed a mandatory task at its reduced duration
    #[serde(rename_all = "camelCase")]
    Shortened {
        template_id: String,
        from_minutes: u32,
        to_minutes: u32,
    },

    /// Prerequisite id not found in the template library
    #[serde(rename_all = "camelCase")]
    DependencyMissing {
        template_id: String,
        depends_on: String,
    },

    /// Task participates in a dependency cycle
    #[serde(rename_all = "camelCase")]
    DependencyCycle { template_id: String },

    /// Prerequisite exists but is inactive
    #[serde(rename_all = "camelCase")]
    DependencyDisabled {
        template_id: String,
        depends_on: String,
    },
}

impl Advisory {
    /// The template this advisory is about.
    pub fn template_id(&self) -> &str {
        match self {
            Advisory::HardConflict { template_id }
            | Advisory::SoftOverlap { template_id, .. }
            | Advisory::MandatoryUnplaced { template_id }
            | Advisory::SkippedForSpace { template_id }
            | Advisory::Shortened { template_id, .. }
            | Advisory::DependencyMissing { template_id, .. }
            | Advisory::DependencyCycle { template_id }
            | Advisory::DependencyDisabled { template_id, .. } => template_id,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
