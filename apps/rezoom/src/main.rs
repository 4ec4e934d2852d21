mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rezoom::config::Config;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on invalid values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("rezoom v{}", env!("CARGO_PKG_VERSION"));
    debug!(api_url = %config.api_url, pagination = ?config.pagination, "Configuration loaded");

    if let Err(e) = cli::run(cli, &config).await {
        eprintln!("error [{}]: {}", e.code(), e.user_message());
        std::process::exit(1);
    }

    Ok(())
}
