//! Per-date instance commands: status changes and manual start overrides.

use clap::Subcommand;
use dayplan_core::model::InstanceStatus;

use crate::commands::resolve_date;
use crate::storage::open_store;

#[derive(Subcommand)]
pub enum InstanceAction {
    /// Mark a task done for the day
    Complete {
        /// Template id
        template_id: String,
        /// Target date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Skip a task for the day
    Skip {
        /// Template id
        template_id: String,
        #[arg(short, long)]
        date: Option<String>,
        /// Why it was skipped
        #[arg(long)]
        reason: Option<String>,
    },
    /// Push a task off to another day
    Postpone {
        /// Template id
        template_id: String,
        #[arg(short, long)]
        date: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Undo a status change: the occurrence returns to pending
    Undo {
        /// Template id
        template_id: String,
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Pin a flexible task to a start time for the day
    SetTime {
        /// Template id
        template_id: String,
        /// Start time (HH:MM)
        time: String,
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Remove the day's manual start time
    ClearTime {
        /// Template id
        template_id: String,
        #[arg(short, long)]
        date: Option<String>,
    },
}

pub fn run(action: InstanceAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    let ok = match action {
        InstanceAction::Complete { template_id, date } => {
            let date = resolve_date(date.as_deref())?;
            let ok = store.set_instance_status(date, &template_id, InstanceStatus::Completed);
            if ok {
                println!("Completed {template_id} on {date}");
            }
            ok
        }
        InstanceAction::Skip {
            template_id,
            date,
            reason,
        } => {
            let date = resolve_date(date.as_deref())?;
            let mut ok = store.set_instance_status(date, &template_id, InstanceStatus::Skipped);
            if ok {
                if let Some(reason) = reason {
                    ok = store.set_instance_note(date, &template_id, Some(&reason));
                }
            }
            if ok {
                println!("Skipped {template_id} on {date}");
            }
            ok
        }
        InstanceAction::Postpone {
            template_id,
            date,
            reason,
        } => {
            let date = resolve_date(date.as_deref())?;
            let mut ok = store.set_instance_status(date, &template_id, InstanceStatus::Postponed);
            if ok {
                if let Some(reason) = reason {
                    ok = store.set_instance_note(date, &template_id, Some(&reason));
                }
            }
            if ok {
                println!("Postponed {template_id} on {date}");
            }
            ok
        }
        InstanceAction::Undo { template_id, date } => {
            let date = resolve_date(date.as_deref())?;
            let ok = store.set_instance_status(date, &template_id, InstanceStatus::Pending);
            if ok {
                println!("Reset {template_id} to pending on {date}");
            }
            ok
        }
        InstanceAction::SetTime {
            template_id,
            time,
            date,
        } => {
            let date = resolve_date(date.as_deref())?;
            let ok = store.set_instance_start_time(date, &template_id, Some(&time));
            if ok {
                println!("Pinned {template_id} to {time} on {date}");
            }
            ok
        }
        InstanceAction::ClearTime { template_id, date } => {
            let date = resolve_date(date.as_deref())?;
            let ok = store.set_instance_start_time(date, &template_id, None);
            if ok {
                println!("Cleared manual time for {template_id} on {date}");
            }
            ok
        }
    };

    if !ok {
        let message = store
            .sync_slice()
            .last_error
            .clone()
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(message.into());
    }
    Ok(())
}
