//! Stage status command.

use owo_colors::OwoColorize;
use thememiner_rs::WorkPlan;

use super::StageLayout;
use crate::cli::args::{GlobalArgs, StatusArgs};
use crate::cli::config_layer::{build_layered_config, ConfigOverrides};
use crate::cli::output::format_id_ranges;

/// Report which identifiers of a range are done and which are still pending.
pub async fn status_command(args: StatusArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = build_layered_config(global, ConfigOverrides::default())?;
    let layout = StageLayout::for_stage(args.stage, &config.paths);

    let source = layout.load_source(&config.paths).await?;
    let completed = layout.sink().completed_ids().await?;
    let plan = WorkPlan::for_source(args.range.range(), source.as_ref(), &completed);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Status:".bright_blue().bold(),
        layout.name.cyan(),
        plan.range
    );
    println!("   Log:       {}", layout.log.path().display());
    println!("   Completed: {}", plan.skipped.to_string().green());
    println!("   Pending:   {}", plan.pending.len().to_string().yellow());
    if !plan.pending.is_empty() {
        println!("   Ids:       {}", format_id_ranges(&plan.pending).dimmed());
    }
    Ok(())
}
