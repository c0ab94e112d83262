//! CLI subcommand implementations.

pub mod instance;
pub mod next;
pub mod schedule;
pub mod settings;
pub mod template;
pub mod timeline;

use chrono::NaiveDate;
use dayplan_core::clock::{local_today, parse_date};

/// `--date` argument or the local today.
pub(crate) fn resolve_date(date: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match date {
        Some(raw) => Ok(parse_date(raw)?),
        None => Ok(local_today()),
    }
}
