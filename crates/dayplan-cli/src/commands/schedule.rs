//! Schedule generation and display.

use clap::Subcommand;
use dayplan_core::clock::format_hhmm;

use crate::commands::resolve_date;
use crate::storage::open_store;

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Generate and show the schedule for a date
    Show {
        /// Target date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ScheduleAction::Show { date, json } => {
            let date = resolve_date(date.as_deref())?;
            let mut store = open_store()?;
            let result = store.generate_schedule_for_date(date).clone();

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            if let Some(error) = &result.error {
                println!("Schedule for {date}: {error}");
                return Ok(());
            }

            println!(
                "Schedule for {date} (awake {}-{}, {} of {} tasks placed)",
                result.sleep_schedule.wake_time,
                result.sleep_schedule.sleep_time,
                result.scheduled_tasks,
                result.total_tasks,
            );
            if result.schedule.is_empty() {
                println!("  nothing scheduled");
            }
            for block in &result.schedule {
                let mut markers = Vec::new();
                if block.is_anchor {
                    markers.push("anchor");
                }
                if block.is_mandatory {
                    markers.push("mandatory");
                }
                let suffix = if markers.is_empty() {
                    String::new()
                } else {
                    format!("  [{}]", markers.join(", "))
                };
                println!(
                    "  {}-{}  {}{}",
                    format_hhmm(block.start_time),
                    format_hhmm(block.end_time),
                    block.template_id,
                    suffix
                );
            }

            if !result.advisories.is_empty() {
                println!("Advisories:");
                for advisory in &result.advisories {
                    println!("  {}", serde_json::to_string(advisory)?);
                }
            }
            if !result.success {
                println!("Not every mandatory task fit.");
            }
        }
    }
    Ok(())
}
