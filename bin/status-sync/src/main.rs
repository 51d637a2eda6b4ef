//! Entrypoint.

use std::process::ExitCode;

use clap::Parser;
use config::StatusSyncOpts;
use driver::{Driver, RunOutcome};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    if let Ok(custom_env_file) = std::env::var("ENV_FILE") {
        dotenvy::from_filename(custom_env_file)?;
    } else {
        // Try the default .env file, and ignore if it doesn't exist.
        dotenv().ok();
    }

    let opts = StatusSyncOpts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("🔭 status-sync starting...");

    let mut driver = Driver::new(&opts)?;
    let report = driver.run().await;
    let outcome = report.outcome();

    match outcome {
        RunOutcome::Degraded => error!(
            outaged = report.outaged_count(),
            "Outage detected - failing workflow to trigger notifications"
        ),
        RunOutcome::Healthy => info!("All services operational"),
    }

    Ok(ExitCode::from(outcome.exit_code()))
}
