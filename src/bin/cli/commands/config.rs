//! Configuration management commands.
//!
//! This module contains commands for managing thememiner configuration files,
//! including initialization, validation, and printing defaults.

use owo_colors::OwoColorize;
use thememiner_rs::ThememinerConfig;

use crate::cli::args::{GlobalArgs, InitConfigArgs, ValidateConfigArgs};
use crate::cli::config_layer::{resolve_config_path, workdir};

/// Print default configuration in YAML format
pub async fn print_default_config() -> anyhow::Result<()> {
    println!("{}", "# Default thememiner configuration".dimmed());
    println!(
        "{}",
        "# Save this to .thememiner.yml and customize as needed".dimmed()
    );
    println!(
        "{}",
        "# Usage: thememiner extract --config your-config.yml --start 1 --end 10".dimmed()
    );
    println!();

    let yaml_output = serde_yaml::to_string(&ThememinerConfig::default())?;
    println!("{}", yaml_output);

    Ok(())
}

/// Initialize a configuration file with defaults
pub async fn init_config(args: InitConfigArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Configuration file already exists: {}. Use --force to overwrite or choose a different name with --output",
            args.output.display()
        ));
    }

    let yaml_content = serde_yaml::to_string(&ThememinerConfig::default())?;
    tokio::fs::write(&args.output, yaml_content).await?;

    println!(
        "{} {}",
        "✅ Configuration saved to:".bright_green().bold(),
        args.output.display().to_string().cyan()
    );
    println!();
    println!("{}", "📝 Key settings you can customize:".bright_blue().bold());
    println!("   pipeline.concurrency        requests in flight (default: 1)");
    println!("   pipeline.max_text_chars     transcript characters sent (default: 2000)");
    println!("   pipeline.retry.max_attempts attempts for transient errors (default: 1)");
    println!("   provider.kind               openai or gemini");
    println!("   filter.use_model            ask the model in the interesting stage");
    println!("   paths.*                     archive, logs and rollups");

    Ok(())
}

/// Validate a thememiner configuration file
pub async fn validate_config(args: ValidateConfigArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let dir = workdir(global)?;
    let explicit = args.file.as_deref().or(global.config.as_deref());
    let Some(path) = resolve_config_path(explicit, &dir) else {
        return Err(anyhow::anyhow!(
            "No configuration file given and none of .thememiner.yml / .thememiner.yaml found in {}",
            dir.display()
        ));
    };

    println!(
        "{} {}",
        "🔍 Validating configuration:".bright_blue().bold(),
        path.display().to_string().cyan()
    );
    println!();

    let result = ThememinerConfig::from_yaml_file(&path).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    let config = match result {
        Ok(config) => {
            println!("{}", "✅ Configuration file is valid!".bright_green().bold());
            println!();
            config
        }
        Err(e) => {
            eprintln!("{} {}", "❌ Configuration validation failed:".red(), e);
            println!();
            println!("{}", "🔧 Common issues:".bright_blue().bold());
            println!("   • Check YAML syntax (indentation, colons, quotes)");
            println!("   • Ensure numeric values are in valid ranges");
            println!("   • Output logs must be distinct files");
            println!();
            println!(
                "{}",
                "💡 Tip: Use 'thememiner print-default-config' to see valid format".dimmed()
            );
            return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
        }
    };

    println!("{}", "📋 Configuration Summary".bright_blue().bold());
    println!("   Concurrency:   {}", config.pipeline.concurrency);
    println!("   Text cap:      {} chars", config.pipeline.max_text_chars);
    println!("   Max attempts:  {}", config.pipeline.retry.max_attempts);
    println!(
        "   Provider:      {} ({})",
        config.provider.kind,
        config.provider.resolved_model()
    );
    println!("   API key env:   {}", config.provider.resolved_api_key_env());
    println!("   Themes log:    {}", config.paths.themes_log.display());

    if global.verbose {
        println!();
        println!("{}", "🔧 Detailed Settings".bright_blue().bold());
        println!("{}", serde_yaml::to_string(&config)?);
    }

    Ok(())
}
