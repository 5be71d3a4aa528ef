//! Configuration management command.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use ebill_core::EbillConfig;
use ebill_services::{GoogleVisionOcr, OpenAiChat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the active configuration
    Show,

    /// Write a config file with default settings
    Init(InitArgs),

    /// Check settings and required credentials
    Validate,

    /// Print the default config file location
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Where to write the config file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

/// Default config file location: `<config dir>/ebill/config.json`.
pub(crate) fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ebill")
        .join("config.json")
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Show => show(config_path),
        ConfigCommands::Init(init_args) => init(init_args),
        ConfigCommands::Validate => validate(config_path),
        ConfigCommands::Path => {
            let path = default_config_path();
            println!("{}", path.display());
            if !path.exists() {
                println!(
                    "{} Not created yet; run 'ebill config init'",
                    style("ℹ").blue()
                );
            }
            Ok(())
        }
    }
}

fn show(config_path: Option<&str>) -> anyhow::Result<()> {
    if config_path.is_none() && !default_config_path().exists() {
        println!(
            "{} No config file found, showing defaults",
            style("ℹ").blue()
        );
    }
    let config = super::load_config(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init(args: InitArgs) -> anyhow::Result<()> {
    let target = args.output.unwrap_or_else(default_config_path);
    if target.exists() && !args.force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            target.display()
        );
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    EbillConfig::default().save(&target)?;
    println!(
        "{} Wrote default configuration to {}",
        style("✓").green(),
        target.display()
    );
    println!(
        "{} API keys are read from the environment: {} and {}",
        style("ℹ").blue(),
        OpenAiChat::API_KEY_VAR,
        GoogleVisionOcr::API_KEY_VAR
    );
    Ok(())
}

fn validate(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    match config.validate() {
        Ok(()) => {
            println!("{} Configuration is valid", style("✓").green());
            println!("  Model:   {}", config.services.openai_model);
            println!("  Timeout: {}s", config.services.timeout_secs);
            Ok(())
        }
        Err(error) => {
            println!("{} Configuration problems:", style("✗").red());
            for reason in &error.reasons {
                println!("  - {reason}");
            }
            anyhow::bail!("configuration is not usable")
        }
    }
}
