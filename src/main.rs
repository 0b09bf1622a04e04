//! Alerter
//!
//! Run with: cargo run -- -c config.yml
//!
//! Options:
//! - `-c, --config <PATH>`: config file (YAML, or JSON with a `.json` extension)
//! - `-v, --vendors`: list supported notifier kinds and exit
//!
//! Environment variables:
//! - RUST_LOG: Log level (default: alerter=info)
//!
//! Runs until interrupted with Ctrl-C.

use std::path::PathBuf;

use alerter::alerts::{Alerter, HttpChecker};
use alerter::config::{Config, NotifierConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "alerter", version, about = "Alert when a server stops responding")]
struct Cli {
    /// Config file path
    #[arg(short = 'c', long = "config", required_unless_present = "vendors")]
    config: Option<PathBuf>,

    /// List supported notifier kinds
    #[arg(short = 'v', long = "vendors")]
    vendors: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alerter=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.vendors {
        println!("{}", NotifierConfig::KINDS.join("\n"));
        return Ok(());
    }

    let Some(path) = cli.config else {
        return Err("config path is mandatory".into());
    };

    let config = Config::load(&path).map_err(|e| {
        tracing::error!(error = %e, "Failed to get config");
        e
    })?;
    let intervals = config.alert.resolve()?;
    let notifier = config.notifier.build(&config.target_uri)?;

    tracing::info!("Alerter configuration:");
    tracing::info!("  Config: {}", path.display());
    tracing::info!("  Target: {}", config.target_uri);
    tracing::info!("  Check interval: {:?}", intervals.check_interval);
    tracing::info!("  Alert interval: {:?}", intervals.alert_interval);
    tracing::info!("  Probe timeout: {:?}", config.checker.timeout());
    tracing::info!("  Notifier: {}", config.notifier.kind());

    let alerter = Alerter::builder(intervals)
        .target(config.target_uri.clone())
        .checker(HttpChecker::with_timeout(config.checker.timeout()))
        .shared_notifier(notifier)
        .build();

    tokio::select! {
        result = alerter.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down");
            alerter.stop().await?;
        }
    }

    Ok(())
}
