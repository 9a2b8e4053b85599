//! Booking frame scenario replay.
//!
//! # Usage
//!
//! ```bash
//! # Replay a scenario with its own config
//! bookframe-replay scenarios/slow-load.json
//!
//! # Shorten the watchdog and show debug logs
//! bookframe-replay scenarios/slow-load.json --load-timeout-ms 5000 --log-level debug
//! ```

use std::{path::PathBuf, process::ExitCode};

use bookframe_cli::{Overrides, ReplayError, load_scenario, replay};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Booking frame scenario replay
#[derive(Parser, Debug)]
#[command(name = "bookframe-replay")]
#[command(about = "Replay a booking frame scenario on a virtual clock")]
#[command(version)]
struct Args {
    /// Path to the scenario file (JSON)
    scenario: PathBuf,

    /// Override the load watchdog timeout
    #[arg(long)]
    load_timeout_ms: Option<u64>,

    /// Override the trusted provider domain
    #[arg(long)]
    trusted_domain: Option<String>,

    /// Support contact shown in the error view
    #[arg(long)]
    support_contact: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        },
    }
}

/// Replays the scenario and prints the result. Returns whether every
/// invariant held.
#[allow(clippy::print_stdout)]
async fn run(args: Args) -> Result<bool, ReplayError> {
    let mut scenario = load_scenario(&args.scenario)?;
    Overrides {
        load_timeout_ms: args.load_timeout_ms,
        trusted_domain: args.trusted_domain,
        support_contact: args.support_contact,
    }
    .apply(&mut scenario.config);

    let result = replay(&scenario).await?;
    print!("{result}");
    Ok(result.violations.is_empty())
}
