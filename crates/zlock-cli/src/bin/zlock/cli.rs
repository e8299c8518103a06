//! CLI argument parsing and command dispatch.
//!
//! Uses clap derive macros for declarative argument definition with
//! support for environment variables and global options.

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use zlock::LockClientConfig;

use crate::commands::backoff::BackoffArgs;
use crate::commands::contend::ContendArgs;

/// Command-line driver for the zlock distributed lock.
#[derive(Parser)]
#[command(name = "zlock")]
#[command(version)]
#[command(about = "Command-line driver for the zlock distributed lock")]
#[command(long_about = "Runs lock contention scenarios against an in-memory coordination store \
    and prints the polling backoff schedule.")]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Global options available to all commands.
#[derive(Args, Clone)]
pub struct GlobalOptions {
    /// TOML file with lock client settings.
    ///
    /// Can also be set via ZLOCK_CONFIG environment variable.
    #[arg(long = "config", env = "ZLOCK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output JSON instead of human-readable format.
    #[arg(long = "json", global = true)]
    pub is_json: bool,

    /// Enable verbose logging.
    #[arg(short = 'v', long = "verbose", global = true)]
    pub is_verbose: bool,

    /// Suppress all logging output.
    ///
    /// Useful for scripting and when parsing JSON output.
    #[arg(short = 'q', long = "quiet", global = true)]
    pub is_quiet: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run concurrent clients against one lock and report the acquisition order.
    Contend(ContendArgs),

    /// Print the backoff ceiling for each collision count.
    Backoff(BackoffArgs),
}

impl Cli {
    /// Execute the CLI command.
    pub async fn run(self) -> Result<()> {
        let config = LockClientConfig::load_with_layers(self.global.config.as_deref())
            .context("failed to load lock client configuration")?;

        match self.command {
            Commands::Contend(args) => args.run(config, self.global.is_json).await,
            Commands::Backoff(args) => args.run(&config, self.global.is_json),
        }
    }
}
