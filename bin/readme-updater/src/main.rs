//! Entrypoint.

use clap::Parser;
use config::ReadmeUpdaterOpts;
use dotenvy::dotenv;
use readme::{WakaTimeClient, select_recent_projects, update_readme};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    if let Ok(custom_env_file) = std::env::var("ENV_FILE") {
        dotenvy::from_filename(custom_env_file)?;
    } else {
        // Try the default .env file, and ignore if it doesn't exist.
        dotenv().ok();
    }

    let opts = ReadmeUpdaterOpts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client = WakaTimeClient::new(&opts.wakatime);
    let records = match client.recent_projects().await {
        Ok(records) => records,
        Err(e) => {
            // a failed fetch must not fail the scheduled job
            error!(error = %e, "Failed to fetch WakaTime projects, README left untouched");
            return Ok(());
        }
    };

    let names = select_recent_projects(&records, opts.readme.max_projects);
    info!(projects = ?names, "Selected recent projects");

    let written = update_readme(
        &opts.readme.path,
        &names,
        &opts.readme.github_user,
        opts.readme.anchor.as_deref(),
    )?;
    if written {
        info!(path = %opts.readme.path.display(), "README updated");
    }
    Ok(())
}
