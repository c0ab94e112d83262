//! Wake/sleep settings commands.

use clap::Subcommand;
use dayplan_core::model::Settings;

use crate::storage::open_store;

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Get {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update settings
    Set {
        /// Wake time (HH:MM)
        #[arg(long)]
        wake: Option<String>,
        /// Sleep time (HH:MM)
        #[arg(long)]
        sleep: Option<String>,
        /// Desired sleep duration in hours (4-12)
        #[arg(long)]
        sleep_hours: Option<f64>,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        SettingsAction::Get { json } => {
            let settings = store.settings();
            if json {
                println!("{}", serde_json::to_string_pretty(settings)?);
            } else {
                println!(
                    "wake {}  sleep {}  desired sleep {}h",
                    settings.default_wake_time,
                    settings.default_sleep_time,
                    settings.desired_sleep_duration
                );
            }
        }
        SettingsAction::Set {
            wake,
            sleep,
            sleep_hours,
        } => {
            let current = store.settings().clone();
            let next = Settings {
                default_wake_time: wake.unwrap_or(current.default_wake_time),
                default_sleep_time: sleep.unwrap_or(current.default_sleep_time),
                desired_sleep_duration: sleep_hours.unwrap_or(current.desired_sleep_duration),
            };
            if !store.update_settings(next) {
                let message = store
                    .sync_slice()
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                return Err(message.into());
            }
            println!("Settings saved.");
        }
    }
    Ok(())
}
