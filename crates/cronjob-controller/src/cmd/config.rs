use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use cronjob_core::config::{ControllerConfig, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Validate the config for common mistakes
    Check,

    /// Print the effective config (file values merged over defaults)
    Show,

    /// Write a config file with default values
    Init {
        /// Destination path
        path: std::path::PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(config_path: Option<&Path>, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Check => check(config_path, json),
        ConfigSubcommand::Show => show(config_path, json),
        ConfigSubcommand::Init { path, force } => init(&path, force),
    }
}

fn load(config_path: Option<&Path>) -> anyhow::Result<ControllerConfig> {
    ControllerConfig::load_or_default(config_path).context("failed to load config")
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn check(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = load(config_path)?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(config_path: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = load(config_path)?;
    if json {
        return print_json(&config);
    }
    println!(
        "namespace:        {}",
        config.namespace.as_deref().unwrap_or("<all>")
    );
    println!("request timeout:  {}s", config.request_timeout_secs);
    println!(
        "backoff:          {}s doubling to {}s",
        config.backoff.base_secs, config.backoff.max_secs
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }
    ControllerConfig::default()
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
