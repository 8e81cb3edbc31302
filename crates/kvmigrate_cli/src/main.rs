//! kvmigrate CLI
//!
//! Runs a migration job described by a JSON configuration file.
//!
//! Without a `schedule` the job runs once and the process exits with the
//! run's outcome. With a `schedule` the job runs immediately, then on every
//! tick, and the process stays up until it is killed.

use clap::Parser;
use kvmigrate_core::{idle, MigrationConfig, Migrator, Started};
use kvmigrate_storage::BackendRegistry;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Copy every entry of one key-value store into another.
#[derive(Parser)]
#[command(name = "kvmigrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON job configuration
    #[arg(short, long, env = "KVMIGRATE_CONFIG_FILE")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over the flag
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = MigrationConfig::load(&cli.config)?;
    let heartbeat = config.heartbeat_interval;
    let migrator = Migrator::new(config, BackendRegistry::with_builtin());

    match migrator.start()? {
        Started::Completed(report) => {
            info!(
                run_id = %report.run_id,
                copied = report.keys_copied,
                absent = report.keys_absent,
                failed = report.keys_failed,
                bytes = report.bytes_copied,
                "migration complete"
            );
            Ok(())
        }
        Started::Scheduled(_handle) => idle(heartbeat),
    }
}
