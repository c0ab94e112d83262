//! Template library utilities: search, sort, filters, dependency badges.
//!
//! These back the library view; they never touch scheduling state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::deps::{dependency_status, DependencyStatus};
use crate::model::{Template, TimeWindow};

/// Library sort key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum LibrarySort {
    #[default]
    Name,
    Priority,
    Duration,
    UpdatedAt,
}

/// Library view filter state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LibraryFilter {
    /// Case-insensitive substring over name and description
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: LibrarySort,
    /// Only mandatory templates
    #[serde(default)]
    pub mandatory_only: bool,
    /// Only flexible templates in this window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    /// Include soft-deleted templates
    #[serde(default)]
    pub include_inactive: bool,
}

/// Filter and sort the library for display.
pub fn filter_templates<'a>(templates: &'a [Template], filter: &LibraryFilter) -> Vec<&'a Template> {
    let needle = filter.search.trim().to_lowercase();
    let mut matches: Vec<&Template> = templates
        .iter()
        .filter(|t| filter.include_inactive || t.is_active)
        .filter(|t| !filter.mandatory_only || t.is_mandatory)
        .filter(|t| match filter.time_window {
            Some(window) => t.time_window == Some(window),
            None => true,
        })
        .filter(|t| {
            if needle.is_empty() {
                return true;
            }
            t.name.to_lowercase().contains(&needle)
                || t.description
                    .as_deref()
                    .map_or(false, |d| d.to_lowercase().contains(&needle))
        })
        .collect();

    matches.sort_by(|a, b| {
        let ordering = match filter.sort {
            LibrarySort::Name => a.name.cmp(&b.name),
            LibrarySort::Priority => b.priority.cmp(&a.priority),
            LibrarySort::Duration => a.duration_minutes.cmp(&b.duration_minutes),
            // newest edits first
            LibrarySort::UpdatedAt => b.updated_at.cmp(&a.updated_at),
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    });
    matches
}

/// Dependency badge per template id, for the library list.
pub fn dependency_badges(templates: &[Template]) -> HashMap<String, DependencyStatus> {
    let library: HashMap<&str, &Template> = templates.iter().map(|t| (t.id.as_str(), t)).collect();
    templates
        .iter()
        .map(|t| (t.id.clone(), dependency_status(t, &library)))
        .collect()
}
