//! EdgeFlush daemon entry point.
//!
//! Loads configuration, builds the purge agent, serves the event API and
//! shuts down gracefully on SIGINT/SIGTERM.

mod api;
mod signals;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use edgeflush_core::config::AppConfig;
use edgeflush_core::notify::{AlertSink, LogAlertSink, Notifier};
use edgeflush_core::purge::HttpTransport;
use edgeflush_core::PurgeAgent;

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// EdgeFlush purge agent daemon.
#[derive(Parser, Debug)]
#[command(
    name = "edgeflush-daemon",
    version,
    about = "Purges CDN edge caches when published content changes"
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// Override the log level from the config file (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load and resolve configuration
    let mut config =
        AppConfig::load_from_file(&args.config).context("failed to load configuration file")?;
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables in config")?;
    config
        .validate()
        .context("configuration validation failed")?;

    // Initialize tracing
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.daemon.log_level);

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .init();

    let mode = config.purge.mode();

    // Startup banner
    info!("========================================");
    info!("  EdgeFlush Daemon v{}", env!("CARGO_PKG_VERSION"));
    info!("========================================");
    info!("Config file   : {}", args.config.display());
    info!("API host      : {}", config.edgegrid.host);
    info!("Purge mode    : {}", mode);
    info!("Content root  : {}", config.mapping.content_root);
    info!("Listen        : {}", config.daemon.listen);
    info!("Log level     : {}", log_level);
    info!("========================================");

    // Alerting
    let notifier = Notifier::new(&config.notifications);
    let alerts: Arc<dyn AlertSink> = if notifier.is_configured() {
        Arc::new(notifier)
    } else {
        warn!("no alert channel configured; purge failures are only logged");
        Arc::new(LogAlertSink)
    };

    // Purge agent
    let transport = Arc::new(
        HttpTransport::new(config.purge.request_timeout())
            .context("failed to build purge HTTP client")?,
    );
    let agent = PurgeAgent::from_config(&config, transport, alerts)
        .context("failed to initialize purge agent")?;
    info!("Purge agent ready with {} mapping(s)", agent.mappings().len());

    let state = Arc::new(api::AppState {
        agent,
        mapping: config.mapping.clone(),
        started_at: Instant::now(),
    });

    let listener = tokio::net::TcpListener::bind(&config.daemon.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.daemon.listen))?;
    info!(addr = %config.daemon.listen, "serving event API");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(signals::wait_for_shutdown())
        .await
        .context("event API server failed")?;

    info!("EdgeFlush daemon stopped.");
    Ok(())
}
