use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

mod commands;
mod storage;

#[derive(Parser)]
#[command(name = "dayplan", version)]
#[command(about = "Plan your day: recurring task templates, a deterministic schedule, and an Up Next suggestion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Template library management
    Template {
        #[command(subcommand)]
        action: commands::template::TemplateAction,
    },
    /// Per-date task status and time overrides
    Instance {
        #[command(subcommand)]
        action: commands::instance::InstanceAction,
    },
    /// Generate and show the daily schedule
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Render the timeline view model
    Timeline(commands::timeline::TimelineArgs),
    /// Show the Up Next suggestion for right now
    Next {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Wake/sleep settings management
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Generate shell completion script
    Complete {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Template { action } => commands::template::run(action),
        Commands::Instance { action } => commands::instance::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Timeline(args) => commands::timeline::run(args),
        Commands::Next { json } => commands::next::run(json),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Complete { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
