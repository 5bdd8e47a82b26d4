//! thememiner CLI - resumable theme extraction and filtering
//!
//! Installs logging, parses arguments and dispatches to the command implementations
//! in `cli::commands`.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands, GlobalArgs};

fn init_tracing(global: &GlobalArgs) {
    let default_level = if global.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if global.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    match cli.command {
        Commands::Extract(args) => {
            cli::extract_command(args, &cli.global).await?;
        }
        Commands::Filter(args) => {
            cli::filter_command(args, &cli.global).await?;
        }
        Commands::Rollup(args) => {
            cli::rollup_command(args, &cli.global).await?;
        }
        Commands::Status(args) => {
            cli::status_command(args, &cli.global).await?;
        }
        Commands::PrintDefaultConfig => {
            cli::print_default_config().await?;
        }
        Commands::InitConfig(args) => {
            cli::init_config(args).await?;
        }
        Commands::ValidateConfig(args) => {
            cli::validate_config(args, &cli.global).await?;
        }
    }

    Ok(())
}
