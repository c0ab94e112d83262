//! Template library management commands.

use clap::Subcommand;
use dayplan_core::library::{LibraryFilter, LibrarySort};
use dayplan_core::model::{SchedulingType, TemplateDraft, TemplatePatch, TimeWindow};
use dayplan_core::recurrence::RecurrenceRule;
use dayplan_core::dependency_badges;

use crate::storage::open_store;

#[derive(Subcommand)]
pub enum TemplateAction {
    /// Add a template to the library
    Add {
        /// Task name
        name: String,
        /// Duration in minutes (1-480)
        #[arg(short, long)]
        duration: u32,
        /// Priority 1-5
        #[arg(short, long, default_value_t = 3)]
        priority: u8,
        /// Mark as mandatory
        #[arg(long)]
        mandatory: bool,
        /// Fixed start time (HH:MM); makes the template fixed
        #[arg(long, conflicts_with = "window")]
        at: Option<String>,
        /// Time window for flexible templates (morning, afternoon, evening, anytime)
        #[arg(long)]
        window: Option<String>,
        /// Prerequisite template id
        #[arg(long)]
        depends_on: Option<String>,
        /// Visual buffer around the anchor, minutes
        #[arg(long)]
        buffer: Option<u32>,
        /// Crunch-time duration floor, minutes
        #[arg(long)]
        min_duration: Option<u32>,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Recurrence rule as JSON (e.g. '{"frequency":"weekly","daysOfWeek":["mon","fri"]}')
        #[arg(long)]
        recurrence: Option<String>,
    },
    /// List templates
    List {
        /// Substring filter over name and description
        #[arg(long)]
        search: Option<String>,
        /// Sort key: name, priority, duration, updated
        #[arg(long, default_value = "name")]
        sort: String,
        /// Only mandatory templates
        #[arg(long)]
        mandatory: bool,
        /// Include soft-deleted templates
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one template's full record
    Show {
        /// Template id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a template
    Edit {
        /// Template id
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        priority: Option<u8>,
        /// Set or unset the mandatory flag
        #[arg(long)]
        mandatory: Option<bool>,
        /// New fixed start time (HH:MM)
        #[arg(long)]
        at: Option<String>,
        /// New time window for flexible templates
        #[arg(long)]
        window: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Soft-delete a template (kept for history)
    Rm {
        /// Template id
        id: String,
    },
    /// Duplicate a template under a fresh id
    Duplicate {
        /// Template id
        id: String,
    },
}

pub fn run(action: TemplateAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        TemplateAction::Add {
            name,
            duration,
            priority,
            mandatory,
            at,
            window,
            depends_on,
            buffer,
            min_duration,
            description,
            recurrence,
        } => {
            let recurrence_rule: Option<RecurrenceRule> = recurrence
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?;
            let (scheduling_type, default_time, time_window) = match (&at, &window) {
                (Some(time), _) => (SchedulingType::Fixed, Some(time.clone()), None),
                (None, window_arg) => (
                    SchedulingType::Flexible,
                    None,
                    Some(parse_window(window_arg.as_deref().unwrap_or("anytime"))?),
                ),
            };
            let draft = TemplateDraft {
                name,
                description,
                duration_minutes: duration,
                priority,
                is_mandatory: mandatory,
                scheduling_type,
                default_time,
                time_window,
                depends_on,
                buffer_minutes: buffer,
                min_duration,
                recurrence_rule,
            };
            match store.create_template(draft) {
                Some(created) => println!("Created template {} ({})", created.name, created.id),
                None => return Err(last_error(&store).into()),
            }
        }
        TemplateAction::List {
            search,
            sort,
            mandatory,
            all,
            json,
        } => {
            let filter = LibraryFilter {
                search: search.unwrap_or_default(),
                sort: parse_sort(&sort)?,
                mandatory_only: mandatory,
                time_window: None,
                include_inactive: all,
            };
            store.set_library_filter(filter);
            let badges = dependency_badges(store.templates());
            let listed = store.filtered_templates();
            if json {
                println!("{}", serde_json::to_string_pretty(&listed)?);
                return Ok(());
            }
            if listed.is_empty() {
                println!("No templates. Use 'template add' to create one.");
                return Ok(());
            }
            for t in listed {
                let kind = match t.scheduling_type {
                    SchedulingType::Fixed => {
                        format!("fixed @ {}", t.default_time.as_deref().unwrap_or("?"))
                    }
                    SchedulingType::Flexible => format!(
                        "flexible ({})",
                        t.time_window
                            .map(|w| format!("{w:?}").to_lowercase())
                            .unwrap_or_default()
                    ),
                };
                let mut tags = Vec::new();
                if t.is_mandatory {
                    tags.push("mandatory".to_string());
                }
                if !t.is_active {
                    tags.push("inactive".to_string());
                }
                if let Some(badge) = badges.get(&t.id) {
                    if *badge != dayplan_core::DependencyStatus::Ok {
                        tags.push(format!("dep:{badge:?}").to_lowercase());
                    }
                }
                let suffix = if tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", tags.join(", "))
                };
                println!(
                    "{}  {}  {}m p{}  {}{}",
                    t.id, t.name, t.duration_minutes, t.priority, kind, suffix
                );
            }
        }
        TemplateAction::Show { id, json } => {
            let template = store
                .templates()
                .iter()
                .find(|t| t.id == id)
                .ok_or_else(|| format!("unknown template '{id}'"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(template)?);
                return Ok(());
            }
            println!("{}  {}", template.id, template.name);
            if let Some(description) = &template.description {
                println!("  description: {description}");
            }
            println!("  duration: {}m  priority: {}", template.duration_minutes, template.priority);
            match template.scheduling_type {
                SchedulingType::Fixed => {
                    println!("  fixed @ {}", template.default_time.as_deref().unwrap_or("?"));
                }
                SchedulingType::Flexible => {
                    println!(
                        "  flexible ({})",
                        template
                            .time_window
                            .map(|w| format!("{w:?}").to_lowercase())
                            .unwrap_or_default()
                    );
                }
            }
            if template.is_mandatory {
                println!("  mandatory");
            }
            if !template.is_active {
                println!("  inactive");
            }
            if let Some(depends_on) = &template.depends_on {
                println!("  depends on: {depends_on}");
            }
            if let Some(buffer) = template.buffer_minutes {
                println!("  buffer: {buffer}m");
            }
            if let Some(min) = template.min_duration {
                println!("  min duration: {min}m");
            }
            if let Some(rule) = &template.recurrence_rule {
                println!("  recurrence: {}", serde_json::to_string(rule)?);
            }
            if let Some(updated_at) = template.updated_at {
                println!("  updated at: {updated_at}");
            }
        }
        TemplateAction::Edit {
            id,
            name,
            duration,
            priority,
            mandatory,
            at,
            window,
            json,
        } => {
            let patch = TemplatePatch {
                name,
                duration_minutes: duration,
                priority,
                is_mandatory: mandatory,
                default_time: at.map(Some),
                time_window: match window {
                    Some(value) => Some(Some(parse_window(&value)?)),
                    None => None,
                },
                ..TemplatePatch::default()
            };
            if !store.update_template(&id, patch) {
                return Err(last_error(&store).into());
            }
            if json {
                if let Some(t) = store.templates().iter().find(|t| t.id == id) {
                    println!("{}", serde_json::to_string_pretty(t)?);
                }
            } else {
                println!("Updated template {id}");
            }
        }
        TemplateAction::Rm { id } => {
            if !store.soft_delete_template(&id) {
                return Err(last_error(&store).into());
            }
            println!("Deactivated template {id}");
        }
        TemplateAction::Duplicate { id } => match store.duplicate_template(&id) {
            Some(copy) => println!("Created {} ({})", copy.name, copy.id),
            None => return Err(last_error(&store).into()),
        },
    }
    Ok(())
}

fn parse_window(value: &str) -> Result<TimeWindow, String> {
    match value {
        "morning" => Ok(TimeWindow::Morning),
        "afternoon" => Ok(TimeWindow::Afternoon),
        "evening" => Ok(TimeWindow::Evening),
        "anytime" => Ok(TimeWindow::Anytime),
        other => Err(format!(
            "unknown window '{other}' (expected morning, afternoon, evening, anytime)"
        )),
    }
}

fn parse_sort(value: &str) -> Result<LibrarySort, String> {
    match value {
        "name" => Ok(LibrarySort::Name),
        "priority" => Ok(LibrarySort::Priority),
        "duration" => Ok(LibrarySort::Duration),
        "updated" => Ok(LibrarySort::UpdatedAt),
        other => Err(format!(
            "unknown sort '{other}' (expected name, priority, duration, updated)"
        )),
    }
}

fn last_error(store: &dayplan_core::PlannerStore) -> String {
    store
        .sync_slice()
        .last_error
        .clone()
        .unwrap_or_else(|| "unknown error".to_string())
}
