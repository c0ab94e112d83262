//! Dependency resolution for flexible tasks.
//!
//! Templates may name a single prerequisite. The resolver classifies each
//! template's dependency health for the library view and produces the
//! dependency-respecting placement order the engine schedules in. Tasks in
//! cycles or with missing prerequisites are excluded and reported as
//! advisories.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Advisory;
use crate::model::Template;

/// Dependency health of one template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    /// No prerequisite, or prerequisite present and active
    Ok,
    /// Prerequisite exists but is inactive
    Disabled,
    /// Prerequisite id not found
    Missing,
    /// A dependency cycle reaches this template
    Cycle,
}

/// Classify one template's dependency against the full library.
pub fn dependency_status(
    template: &Template,
    library: &HashMap<&str, &Template>,
) -> DependencyStatus {
    let dep_id = match &template.depends_on {
        Some(dep) => dep.as_str(),
        None => return DependencyStatus::Ok,
    };
    let dep = match library.get(dep_id) {
        Some(dep) => *dep,
        None => return DependencyStatus::Missing,
    };
    if !dep.is_active {
        return DependencyStatus::Disabled;
    }
    if reaches_cycle(template, library) {
        return DependencyStatus::Cycle;
    }
    DependencyStatus::Ok
}

/// Walk the prerequisite chain; true when it revisits a node.
///
/// Chains have at most one outgoing edge per node, so a repeat means the walk
/// entered a loop this template can never get out from under.
fn reaches_cycle(template: &Template, library: &HashMap<&str, &Template>) -> bool {
    let mut visited = HashSet::new();
    visited.insert(template.id.as_str());
    let mut current = template.depends_on.as_deref();
    while let Some(id) = current {
        if !visited.insert(id) {
            return true;
        }
        current = library.get(id).and_then(|t| t.depends_on.as_deref());
    }
    false
}

/// Placement tie-breaker: priority desc, duration asc, name asc, id asc.
pub fn placement_order(a: &Template, b: &Template) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.duration_minutes.cmp(&b.duration_minutes))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order eligible flexibles for placement.
///
/// - `flexibles`: the day's eligible flexible templates.
/// - `library`: every known template, for missing/disabled classification.
/// - `satisfied`: ids satisfied outside this set (anchors placed today, or
///   templates that simply have no occurrence to wait for).
///
/// Returns the schedulable templates in topological order with ties broken by
/// [`placement_order`], plus advisories for everything excluded.
pub fn schedulable_order<'a>(
    flexibles: &[&'a Template],
    library: &HashMap<&str, &Template>,
    satisfied: &HashSet<&str>,
) -> (Vec<&'a Template>, Vec<Advisory>) {
    let mut advisories = Vec::new();
    let in_set: HashMap<&str, usize> = flexibles
        .iter()
        .enumerate()
        .map(|(idx, t)| (t.id.as_str(), idx))
        .collect();

    // Filter out missing/disabled prerequisites first; cycles are what is
    // left pending after Kahn's algorithm drains.
    let mut schedulable = vec![true; flexibles.len()];
    for (idx, template) in flexibles.iter().enumerate() {
        let dep_id = match &template.depends_on {
            Some(dep) => dep.as_str(),
            None => continue,
        };
        if in_set.contains_key(dep_id) || satisfied.contains(dep_id) {
            continue;
        }
        match library.get(dep_id) {
            Some(dep) if !dep.is_active => {
                advisories.push(Advisory::DependencyDisabled {
                    template_id: template.id.clone(),
                    depends_on: dep_id.to_string(),
                });
                schedulable[idx] = false;
            }
            Some(_) => {
                // prerequisite exists and is active but has no occurrence
                // today: nothing to order against
            }
            None => {
                advisories.push(Advisory::DependencyMissing {
                    template_id: template.id.clone(),
                    depends_on: dep_id.to_string(),
                });
                schedulable[idx] = false;
            }
        }
    }

    // In-set edges only: dep -> dependent
    let mut blocked_by: Vec<Option<usize>> = vec![None; flexibles.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); flexibles.len()];
    for (idx, template) in flexibles.iter().enumerate() {
        if !schedulable[idx] {
            continue;
        }
        if let Some(dep_idx) = template
            .depends_on
            .as_deref()
            .and_then(|dep| in_set.get(dep).copied())
        {
            blocked_by[idx] = Some(dep_idx);
            dependents[dep_idx].push(idx);
        }
    }

    let mut ready: Vec<usize> = (0..flexibles.len())
        .filter(|&idx| schedulable[idx] && blocked_by[idx].is_none())
        .collect();
    let mut placed = vec![false; flexibles.len()];
    let mut order = Vec::with_capacity(flexibles.len());

    while !ready.is_empty() {
        // pick the minimum under the tie-breaker each round; the candidate
        // set is small enough that a scan beats a heap
        let pick = ready
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| placement_order(flexibles[a], flexibles[b]))
            .map(|(pos, _)| pos)
            .unwrap_or(0);
        let idx = ready.swap_remove(pick);
        placed[idx] = true;
        order.push(flexibles[idx]);
        for &dependent in &dependents[idx] {
            if schedulable[dependent] && !placed[dependent] {
                ready.push(dependent);
            }
        }
    }

    // anything schedulable but never placed sits in a cycle, or behind an
    // excluded prerequisite
    let in_set_view: HashMap<&str, &Template> = flexibles
        .iter()
        .map(|t| (t.id.as_str(), *t))
        .collect();
    for (idx, template) in flexibles.iter().enumerate() {
        if !schedulable[idx] || placed[idx] {
            continue;
        }
        if reaches_cycle(template, &in_set_view) {
            advisories.push(Advisory::DependencyCycle {
                template_id: template.id.clone(),
            });
        } else {
            // blocked behind a missing/disabled prerequisite's dependent
            let dep = template.depends_on.clone().unwrap_or_default();
            advisories.push(Advisory::DependencyMissing {
                template_id: template.id.clone(),
                depends_on: dep,
            });
        }
    }

    (order, advisories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SchedulingType, TimeWindow};

    fn make_template(id: &str, priority: u8, duration: u32, depends_on: Option<&str>) -> Template {
        Template {
            id: id.to_string(),
            name: format!("Task {id}"),
            description: None,
            duration_minutes: duration,
            priority,
            is_mandatory: false,
            scheduling_type: SchedulingType::Flexible,
            default_time: None,
            time_window: Some(TimeWindow::Morning),
            depends_on: depends_on.map(str::to_string),
            buffer_minutes: None,
            min_duration: None,
            is_active: true,
            recurrence_rule: None,
            updated_at: None,
        }
    }

    fn library(templates: &[Template]) -> HashMap<&str, &Template> {
        templates.iter().map(|t| (t.id.as_str(), t)).collect()
    }

    #[test]
    fn chain_orders_prerequisites_first() {
        let a = make_template("a", 3, 30, None);
        let b = make_template("b", 3, 30, Some("a"));
        let c = make_template("c", 3, 30, Some("b"));
        let all = [c.clone(), a.clone(), b.clone()];
        let lib = library(&all);
        let refs: Vec<&Template> = all.iter().collect();
        let (order, advisories) = schedulable_order(&refs, &lib, &HashSet::new());
        let ids: Vec<&str> = order.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(advisories.is_empty());
    }

    #[test]
    fn ties_break_by_priority_then_duration_then_name() {
        let long = make_template("long", 4, 60, None);
        let short = make_template("short", 4, 15, None);
        let high = make_template("high", 5, 60, None);
        let all = [long.clone(), short.clone(), high.clone()];
        let lib = library(&all);
        let refs: Vec<&Template> = all.iter().collect();
        let (order, _) = schedulable_order(&refs, &lib, &HashSet::new());
        let ids: Vec<&str> = order.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["high", "short", "long"]);
    }

    #[test]
    fn cycle_members_are_excluded_and_reported() {
        let a = make_template("a", 3, 30, Some("b"));
        let b = make_template("b", 3, 30, Some("a"));
        let lone = make_template("lone", 3, 30, None);
        let all = [a.clone(), b.clone(), lone.clone()];
        let lib = library(&all);
        let refs: Vec<&Template> = all.iter().collect();
        let (order, advisories) = schedulable_order(&refs, &lib, &HashSet::new());
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].id, "lone");
        assert_eq!(
            advisories
                .iter()
                .filter(|a| matches!(a, Advisory::DependencyCycle { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn missing_prerequisite_is_reported() {
        let a = make_template("a", 3, 30, Some("ghost"));
        let all = [a.clone()];
        let lib = library(&all);
        let refs: Vec<&Template> = all.iter().collect();
        let (order, advisories) = schedulable_order(&refs, &lib, &HashSet::new());
        assert!(order.is_empty());
        assert!(matches!(
            advisories[0],
            Advisory::DependencyMissing { .. }
        ));
    }

    #[test]
    fn satisfied_external_dependency_is_ok() {
        let anchor = make_template("anchor", 3, 30, None);
        let a = make_template("a", 3, 30, Some("anchor"));
        let all = [anchor.clone(), a.clone()];
        let lib = library(&all);
        let flexibles = [&all[1]];
        let satisfied: HashSet<&str> = ["anchor"].into_iter().collect();
        let (order, advisories) = schedulable_order(&flexibles, &lib, &satisfied);
        assert_eq!(order.len(), 1);
        assert!(advisories.is_empty());
    }

    #[test]
    fn status_classification() {
        let mut inactive = make_template("off", 3, 30, None);
        inactive.is_active = false;
        let on_off = make_template("a", 3, 30, Some("off"));
        let on_ghost = make_template("b", 3, 30, Some("ghost"));
        let self_cycle_a = make_template("c", 3, 30, Some("d"));
        let self_cycle_b = make_template("d", 3, 30, Some("c"));
        let all = [
            inactive.clone(),
            on_off.clone(),
            on_ghost.clone(),
            self_cycle_a.clone(),
            self_cycle_b.clone(),
        ];
        let lib = library(&all);
        assert_eq!(dependency_status(&on_off, &lib), DependencyStatus::Disabled);
        assert_eq!(dependency_status(&on_ghost, &lib), DependencyStatus::Missing);
        assert_eq!(
            dependency_status(&self_cycle_a, &lib),
            DependencyStatus::Cycle
        );
        assert_eq!(dependency_status(&inactive, &lib), DependencyStatus::Ok);
    }
}
