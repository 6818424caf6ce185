//! Configuration inspection

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imis_core::config::CONFIG_ENV;
use imis_core::ImisConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Show config file path
    Path,
    /// Write a config file with default values
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    match args.command {
        ConfigCommands::Show => run_show(explicit),
        ConfigCommands::Path => {
            println!("{}", resolved_path(explicit).display());
            Ok(())
        }
        ConfigCommands::Init(args) => run_init(args, explicit),
    }
}

/// The file `ImisConfig::load` would read.
fn resolved_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(ImisConfig::config_path)
}

fn run_show(explicit: Option<&Path>) -> Result<()> {
    let config = ImisConfig::load(explicit)?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn run_init(args: InitArgs, explicit: Option<&Path>) -> Result<()> {
    let config_path = resolved_path(explicit);

    // Check if config already exists
    if config_path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {:?}\n\nUse --force to overwrite",
            config_path
        ));
    }

    ImisConfig::default()
        .save(&config_path)
        .with_context(|| format!("Failed to initialize {:?}", config_path))?;
    println!("Wrote default config to {}", config_path.display());
    Ok(())
}
