//! zlock - command-line driver for the zlock distributed lock.
//!
//! Runs lock contention scenarios against an in-memory coordination store
//! and inspects the polling backoff schedule.
//!
//! # Usage
//!
//! ```bash
//! # Five clients contend for one resource, each holding for 50ms
//! zlock contend --resource /locks/a --clients 5 --hold-ms 50
//!
//! # Polling mode with a TTL shorter than the hold time
//! zlock contend --clients 3 --max-retries 20 --retry-wait-ms 10 --ttl-ms 30 --hold-ms 100
//!
//! # Backoff ceilings as JSON
//! zlock --json backoff --retry-wait-ms 100 --collisions 6 | jq '.ceilings_ms'
//! ```
//!
//! # Tiger Style
//!
//! - Explicit error handling with anyhow
//! - Bounded client counts and hold times
//! - Fail-fast on invalid arguments

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use cli::Cli;

/// Log to stderr. `-q` silences everything; `-v` forces debug and ignores
/// `RUST_LOG`.
fn init_tracing(quiet: bool, verbose: bool) {
    let filter = match (quiet, verbose) {
        (true, _) => EnvFilter::new("off"),
        (false, true) => EnvFilter::new("zlock=debug,zlock_store=debug"),
        (false, false) => EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).without_time().init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.global.is_quiet, cli.global.is_verbose);

    cli.run().await
}
