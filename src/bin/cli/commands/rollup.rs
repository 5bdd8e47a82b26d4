//! Rollup regeneration command.

use owo_colors::OwoColorize;

use super::StageLayout;
use crate::cli::args::{GlobalArgs, RollupArgs};
use crate::cli::config_layer::{build_layered_config, ConfigOverrides};

/// Rewrite a stage's rollup from its output log alone. Never calls a provider.
pub async fn rollup_command(args: RollupArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = build_layered_config(global, ConfigOverrides::default())?;
    let layout = StageLayout::for_stage(args.stage, &config.paths);

    let rendered = layout.rollup.regenerate().await?;
    let lines = rendered.lines().filter(|l| l.starts_with("- ")).count();
    println!(
        "{} {} ({} entries)",
        "✅ Rollup written:".bright_green().bold(),
        layout.rollup.path.display().to_string().cyan(),
        lines
    );
    Ok(())
}
