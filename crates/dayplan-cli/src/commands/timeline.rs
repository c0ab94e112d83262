//! Timeline view-model rendering.

use clap::Args;
use dayplan_core::ports::ResponsiveParams;

use crate::commands::resolve_date;
use crate::storage::open_store;

#[derive(Args)]
pub struct TimelineArgs {
    /// Target date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    pub date: Option<String>,
    /// Pixels per hour
    #[arg(long, default_value_t = 60.0)]
    pub row_height: f64,
    /// Visible lanes per overlap cluster
    #[arg(long, default_value_t = 3)]
    pub lanes: usize,
    /// Minimum gap length to surface, minutes
    #[arg(long, default_value_t = 5)]
    pub min_gap: u32,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: TimelineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let date = resolve_date(args.date.as_deref())?;
    let params = ResponsiveParams {
        row_height: args.row_height,
        lane_cap: args.lanes,
        gap_min_minutes: args.min_gap,
        ..ResponsiveParams::default()
    };

    let mut store = open_store()?;
    let vm = store.timeline_vm(date, &params)?;
    let overlay = store.now_overlay(date, &params)?;

    if args.json {
        let mut payload = serde_json::to_value(&vm)?;
        if let Some(overlay) = &overlay {
            payload["nowOverlay"] = serde_json::to_value(overlay)?;
        }
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Timeline for {date}");
    for block in &vm.blocks {
        let kind = if block.is_fixed { "fixed" } else { "flexible" };
        let visibility = if block.hidden { " (hidden)" } else { "" };
        println!(
            "  {:02}:{:02} +{}m  lane {}/{}  {} [{}]{}",
            block.start_minutes / 60,
            block.start_minutes % 60,
            block.end_minutes - block.start_minutes,
            block.lane_index,
            block.lane_count,
            block.template_id,
            kind,
            visibility
        );
    }
    for cluster in &vm.clusters {
        println!(
            "  {} at {}:{:02}",
            cluster.badge.label,
            cluster.range_mins[0] / 60,
            cluster.range_mins[0] % 60
        );
    }
    if !vm.gaps.is_empty() {
        let spans: Vec<String> = vm
            .gaps
            .iter()
            .map(|g| {
                format!(
                    "{:02}:{:02}-{:02}:{:02}",
                    g.start_mins / 60,
                    g.start_mins % 60,
                    g.end_mins / 60,
                    g.end_mins % 60
                )
            })
            .collect();
        println!("  free: {}", spans.join(", "));
    }
    if let Some(overlay) = overlay {
        for adjustment in overlay
            .block_adjustments
            .iter()
            .filter(|a| a.overdue_kind != dayplan_core::OverdueKind::None)
        {
            println!(
                "  overdue ({:?}): {}",
                adjustment.overdue_kind, adjustment.template_id
            );
        }
    }
    Ok(())
}
