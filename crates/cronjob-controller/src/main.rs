mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use cronjob_core::rbac::DEFAULT_ROLE_NAME;
use cronjob_core::NamespacedName;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cronjob-controller",
    about = "Level-triggered controller for batch.tutorial.kubebuilder.io CronJobs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Controller config file (YAML)
    #[arg(long, global = true, env = "CRONJOB_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the controller and run until interrupted
    Run {
        /// Watch only this namespace (overrides the config file)
        #[arg(long, short = 'n')]
        namespace: Option<String>,
    },

    /// Reconcile a single CronJob once and report what was observed
    Reconcile {
        /// CronJob to reconcile, as <namespace>/<name>
        key: NamespacedName,
    },

    /// Print the CronJob CustomResourceDefinition
    Crd,

    /// Print the ClusterRole the controller needs
    Rbac {
        /// Name of the ClusterRole
        #[arg(long, default_value = DEFAULT_ROLE_NAME)]
        name: String,
    },

    /// Inspect controller configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } | Commands::Reconcile { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run { namespace } => cmd::run::run(config, namespace),
        Commands::Reconcile { key } => cmd::reconcile::run(config, key, cli.json),
        Commands::Crd => cmd::crd::run(cli.json),
        Commands::Rbac { name } => cmd::rbac::run(&name, cli.json),
        Commands::Config { subcommand } => cmd::config::run(config, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
