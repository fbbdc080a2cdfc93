//! Tether CLI
//!
//! Command-line front end for discovering Apify actors, inspecting their
//! inferred input forms and following runs to completion.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use colored::*;
use commands::{Commands, handle_command, hint};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Discover, configure and run Apify actors", long_about = None)]
struct Cli {
    /// Apify API URL
    #[arg(long, env = "APIFY_API_URL", default_value = tether_client::DEFAULT_BASE_URL)]
    api_url: String,

    /// Apify API token
    #[arg(long, env = "APIFY_TOKEN", hide_env_values = true)]
    token: String,

    /// Status poll interval in milliseconds (default: 3000, or TETHER_POLL_INTERVAL_MS)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Force the inferred type of a field, as name=type (repeatable)
    #[arg(long = "override", value_name = "NAME=TYPE")]
    overrides: Vec<String>,

    /// Treat a definition without declared schema or example input as an error
    #[arg(long)]
    require_schema: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so results on stdout stay machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether=warn,tether_session=warn,tether_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load(
        cli.api_url,
        cli.token,
        cli.poll_interval_ms,
        &cli.overrides,
        cli.require_schema,
    )?;

    let result = handle_command(cli.command, &config).await;
    if let Err(err) = &result {
        if let Some(hint) = hint(err) {
            eprintln!("{}", hint.yellow());
        }
    }
    result
}
