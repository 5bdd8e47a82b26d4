//! Theme extraction command.

use std::sync::Arc;

use thememiner_rs::io::debug_log::DebugLog;
use thememiner_rs::{build_provider, BatchPipeline, ThemeExtractor};

use super::StageLayout;
use crate::cli::args::{ExtractArgs, GlobalArgs, Stage};
use crate::cli::config_layer::{build_layered_config, ConfigOverrides, FromCliArgs};
use crate::cli::output::{print_plan, print_summary};

/// Tag every not-yet-tagged conversation in the requested range.
pub async fn extract_command(args: ExtractArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = build_layered_config(global, ConfigOverrides::from_cli_args(&args))?;
    let layout = StageLayout::for_stage(Stage::Themes, &config.paths);

    let archive = layout.load_source(&config.paths).await?;
    let range = args.run.range.range();
    let sink = layout.sink();
    let pipeline = BatchPipeline::new(&config.pipeline).with_progress(!args.run.no_progress);

    if args.run.dry_run {
        let plan = pipeline.plan(range, archive.as_ref(), sink.as_ref()).await?;
        print_plan(layout.name, &plan);
        return Ok(());
    }

    let provider = build_provider(&config.provider)?.ok_or_else(|| {
        anyhow::anyhow!(
            "{} is not set; theme extraction needs a {} API key",
            config.provider.resolved_api_key_env(),
            config.provider.kind
        )
    })?;
    let extractor = ThemeExtractor::new(provider, &config.provider)
        .with_debug_log(Arc::new(DebugLog::new(&config.paths.debug_log)));

    let summary = pipeline
        .run(range, archive.as_ref(), &extractor, sink.as_ref(), Some(&layout.rollup))
        .await?;
    print_summary(layout.name, &summary);
    Ok(())
}
