//! Refine-stage command: apply a yes/no predicate to an upstream log.

use owo_colors::OwoColorize;
use thememiner_rs::{build_provider, BatchPipeline, DecisionClassifier, DecisionPredicate, UpstreamLogSource};
use tracing::info;

use super::StageLayout;
use crate::cli::args::{FilterArgs, GlobalArgs};
use crate::cli::config_layer::{build_layered_config, ConfigOverrides, FromCliArgs};
use crate::cli::output::{print_plan, print_summary};

pub async fn filter_command(args: FilterArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let config = build_layered_config(global, ConfigOverrides::from_cli_args(&args))?;
    let predicate = args.stage.predicate();
    let layout = StageLayout::for_stage(args.stage.into(), &config.paths);

    let Some(upstream_log) = &layout.upstream else {
        anyhow::bail!("stage {} has no upstream log", layout.name);
    };
    if !upstream_log.path().exists() {
        anyhow::bail!("Source log not found: {}", upstream_log.path().display());
    }
    let upstream = UpstreamLogSource::load(upstream_log).await?;
    let range = args.run.range.range();
    let sink = layout.sink();
    let pipeline = BatchPipeline::new(&config.pipeline).with_progress(!args.run.no_progress);

    if args.run.dry_run {
        let plan = pipeline.plan(range, &upstream, sink.as_ref()).await?;
        print_plan(layout.name, &plan);
        return Ok(());
    }

    let consult_provider = match predicate {
        DecisionPredicate::Interesting => config.filter.use_model,
        DecisionPredicate::Philosophical => true,
    };
    let provider = if consult_provider {
        build_provider(&config.provider)?
    } else {
        None
    };
    let classifier = DecisionClassifier::new(predicate, provider, &config.provider);
    if !classifier.uses_provider() {
        info!(stage = layout.name, "deciding with the keyword heuristic only");
    }

    let summary = pipeline
        .run(range, &upstream, &classifier, sink.as_ref(), Some(&layout.rollup))
        .await?;
    print_summary(layout.name, &summary);

    let accepted = layout.log.read_entries().await?.len();
    println!(
        "   Accepted so far: {} → {}",
        accepted.to_string().bold(),
        layout.log.path().display().to_string().cyan()
    );
    Ok(())
}
