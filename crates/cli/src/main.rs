//! EdgeFlush command-line tool.
//!
//! Provides subcommands for checking how repository paths map to purge
//! URLs, issuing purges by hand, replaying change events, running the
//! purge API connection test, and generating / validating configuration.

mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use edgeflush_core::agent::mapping_source;
use edgeflush_core::config::AppConfig;
use edgeflush_core::mapping::{FixedPageLookup, JcrPageLookup, MappingStore, PageLookup};
use edgeflush_core::models::{
    ChangeEvent, DeliveryReport, DispatchResult, Network, PurgeAction, PurgeMode, PurgeTarget,
    PurgeType, ReplicationAction,
};
use edgeflush_core::notify::{AlertSink, LogAlertSink, Notifier};
use edgeflush_core::purge::HttpTransport;
use edgeflush_core::{PathMapper, PurgeAgent};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// EdgeFlush command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "edgeflush",
    version,
    about = "Inspect path mappings and issue CDN purges"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        global = true,
        default_value = "/etc/edgeflush/config.toml"
    )]
    config: PathBuf,

    /// Log level for diagnostic output.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Purge the configured test object on the staging network.
    Test,

    /// Show the purge URLs a repository path maps to. Sends nothing.
    Resolve {
        /// Repository path, e.g. /content/mercer/us/about.
        path: String,

        /// Containing page, when it cannot be derived from the path.
        #[arg(long)]
        page: Option<String>,
    },

    /// Purge the given URLs (or CP codes) directly.
    Purge {
        /// Objects to purge.
        #[arg(required = true)]
        targets: Vec<String>,

        #[command(flatten)]
        mode: ModeArgs,
    },

    /// Replay a content-change event through the agent.
    Event {
        /// Repository path that changed.
        path: String,

        /// Replication action.
        #[arg(short, long, value_enum, default_value = "activate")]
        action: EventAction,

        /// Containing page, when it cannot be derived from the path.
        #[arg(long)]
        page: Option<String>,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./edgeflush.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

/// Per-invocation overrides of the configured purge mode.
#[derive(clap::Args, Debug)]
struct ModeArgs {
    /// remove or invalidate.
    #[arg(long)]
    action: Option<PurgeAction>,

    /// url or cpcode.
    #[arg(long = "type")]
    kind: Option<PurgeType>,

    /// staging or production.
    #[arg(long)]
    network: Option<Network>,
}

impl ModeArgs {
    fn apply(&self, base: PurgeMode) -> PurgeMode {
        PurgeMode::new(
            self.action.unwrap_or(base.action),
            self.kind.unwrap_or(base.kind),
            self.network.unwrap_or(base.network),
        )
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EventAction {
    Activate,
    Deactivate,
    Delete,
    Test,
}

impl From<EventAction> for ReplicationAction {
    fn from(action: EventAction) -> Self {
        match action {
            EventAction::Activate => ReplicationAction::Activate,
            EventAction::Deactivate => ReplicationAction::Deactivate,
            EventAction::Delete => ReplicationAction::Delete,
            EventAction::Test => ReplicationAction::Test,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Minimal logging for CLI
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", style::error(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => cmd_init(&output),
        Commands::Validate => cmd_validate(&cli.config),
        Commands::Resolve { path, page } => {
            let config = load_config(&cli.config)?;
            cmd_resolve(&config, &path, page.as_deref())
        }
        Commands::Test => {
            let config = load_config(&cli.config)?;
            cmd_test(&config).await
        }
        Commands::Purge { targets, mode } => {
            let config = load_config(&cli.config)?;
            cmd_purge(&config, targets, &mode).await
        }
        Commands::Event { path, action, page } => {
            let config = load_config(&cli.config)?;
            cmd_event(&config, path, action.into(), page).await
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config =
        AppConfig::load_from_file(path).context("failed to load configuration file")?;
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    config
        .validate()
        .context("configuration validation failed")?;
    Ok(config)
}

fn build_agent(config: &AppConfig) -> Result<PurgeAgent> {
    let notifier = Notifier::new(&config.notifications);
    let alerts: Arc<dyn AlertSink> = if notifier.is_configured() {
        Arc::new(notifier)
    } else {
        Arc::new(LogAlertSink)
    };
    let transport = Arc::new(
        HttpTransport::new(config.purge.request_timeout())
            .context("failed to build purge HTTP client")?,
    );
    PurgeAgent::from_config(config, transport, alerts).context("failed to initialize purge agent")
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        spinner.set_style(
            template.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"# EdgeFlush Configuration
# Secrets are read from the environment variables named below.

[daemon]
log_level = "info"
listen = "127.0.0.1:8085"

[edgegrid]
host = "akab-xxxxxxxxxxxxxxxx-xxxxxxxxxxxxxxxx.purge.akamaiapis.net"
access_token_env = "EDGEGRID_ACCESS_TOKEN"
client_token_env = "EDGEGRID_CLIENT_TOKEN"
client_secret_env = "EDGEGRID_CLIENT_SECRET"

[purge]
action = "remove"
type = "url"
network = "production"
request_timeout_secs = 15
test_object = "https://www.mercer.com/contact.html"
# cp_codes = ["12345"]
# transport_uri = "akamai://akab-xxxxxxxxxxxxxxxx-xxxxxxxxxxxxxxxx.purge.akamaiapis.net"
# transport_user = "replication"
# transport_password_env = "EDGEFLUSH_TRANSPORT_PASSWORD"

[mapping]
content_root = "/content"
tenant_marker = "mercer"
site_flush_marker = "flush-site-cache"
# file = "/etc/edgeflush/mappings.toml"

[[mapping.entries]]
prefix = "/content/mercer/us"
target = "https://www.mercer.com/us"

[notifications]
# slack_webhook_url_env = "SLACK_WEBHOOK_URL"
# email_smtp = "smtp.example.com:587"
# email_from = "edgeflush@example.com"
# email_recipients = ["sitesupport@example.com"]
# alert_timeout_secs = 10
"#;

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, DEFAULT_CONFIG).context("failed to write config file")?;

    println!("{}", style::success(&format!("Default configuration written to {}", output.display())));
    println!();
    println!("Next steps:");
    println!("  1. Set the API host and add your path mappings");
    println!("  2. Export EDGEGRID_ACCESS_TOKEN, EDGEGRID_CLIENT_TOKEN and EDGEGRID_CLIENT_SECRET");
    println!(
        "  3. Check the credentials with: edgeflush test --config {}",
        output.display()
    );
    println!(
        "  4. Start the daemon: edgeflush-daemon --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  {}", style::success("TOML structure is valid"));

    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    println!("  {}", style::success("Environment variable references processed"));

    match config.validate() {
        Ok(()) => println!("  {}", style::success("All required fields are valid")),
        Err(e) => {
            println!("  {}", style::error(&format!("Validation error: {}", e)));
            anyhow::bail!("configuration validation failed");
        }
    }

    let credential_ok = match config.credential() {
        Ok(_) => true,
        Err(e) => {
            println!("  {}", style::warn(&e.to_string()));
            false
        }
    };

    let mappings = match mapping_source(&config.mapping).load() {
        Ok(entries) => entries.len().to_string(),
        Err(e) => {
            println!("  {}", style::error(&format!("Mapping source error: {}", e)));
            anyhow::bail!("mapping source could not be loaded");
        }
    };

    println!();
    println!("{}", style::header("Configuration summary:"));
    println!("  API host      : {}", config.edgegrid.host);
    println!(
        "  Credentials   : {}",
        if credential_ok { "set" } else { "NOT SET" }
    );
    println!("  Purge mode    : {}", config.purge.mode());
    println!("  Timeout       : {}s", config.purge.request_timeout_secs);
    println!("  Content root  : {}", config.mapping.content_root);
    println!("  Mappings      : {}", mappings);
    println!(
        "  Slack alerts  : {}",
        if config.notifications.slack_webhook_url.is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Email alerts  : {}",
        if config.notifications.email_recipients.is_empty() {
            "disabled".to_string()
        } else {
            format!("{} recipient(s)", config.notifications.email_recipients.len())
        }
    );
    println!("  Listen        : {}", config.daemon.listen);
    println!();
    println!("{}", style::success("Configuration is valid."));

    Ok(())
}

fn cmd_resolve(config: &AppConfig, path: &str, page: Option<&str>) -> Result<()> {
    let store = MappingStore::from_source(mapping_source(&config.mapping).as_ref())
        .context("failed to load mappings")?;
    let mapper = PathMapper::new(config.mapper_config());
    let lookup: Box<dyn PageLookup> = match page {
        Some(page) => Box::new(FixedPageLookup::new(page)),
        None => Box::new(JcrPageLookup::new(config.mapping.content_root.as_str())),
    };

    let targets = mapper
        .resolve(&store.snapshot(), path, lookup.as_ref())
        .context("path resolution failed")?;

    if targets.is_empty() {
        println!("{}", style::warn(&format!("{} maps to nothing; no purge would be sent", path)));
        return Ok(());
    }

    println!("{}", style::header(&format!("Purge targets for {}", path)));
    print_targets(&targets);
    Ok(())
}

async fn cmd_test(config: &AppConfig) -> Result<()> {
    let agent = build_agent(config)?;

    let progress = spinner(format!(
        "Purging {} on staging...",
        config.purge.test_object
    ));
    let result = agent
        .dispatcher()
        .test()
        .await
        .context("connection test could not run")?;
    progress.finish_and_clear();

    print_result(&result);
    ensure_ok(&result)
}

async fn cmd_purge(config: &AppConfig, targets: Vec<String>, mode: &ModeArgs) -> Result<()> {
    let agent = build_agent(config)?;
    let mode = mode.apply(agent.mode());
    let targets: Vec<PurgeTarget> = targets.into_iter().map(PurgeTarget::from).collect();

    let progress = spinner(format!("Submitting {} object(s) ({})...", targets.len(), mode));
    let result = agent
        .dispatcher()
        .submit(&targets, &mode)
        .await
        .context("purge request could not be built")?;
    progress.finish_and_clear();

    if mode.kind == PurgeType::CpCode {
        print_targets(&agent.dispatcher().config().cp_codes);
    } else {
        print_targets(&targets);
    }
    print_result(&result);
    ensure_ok(&result)
}

async fn cmd_event(
    config: &AppConfig,
    path: String,
    action: ReplicationAction,
    page: Option<String>,
) -> Result<()> {
    let agent = build_agent(config)?;

    let progress = spinner(format!("Delivering {} {}...", action, path));
    let report = agent
        .deliver(ChangeEvent {
            path,
            action,
            containing_page: page,
        })
        .await
        .context("event delivery failed")?;
    progress.finish_and_clear();

    print_report(&report);
    match report.result {
        Some(ref result) => ensure_ok(result),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_targets(targets: &[PurgeTarget]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Object"]);
    for (i, target) in targets.iter().enumerate() {
        table.add_row(vec![Cell::new(i + 1), Cell::new(target.as_str())]);
    }
    println!("{table}");
}

fn print_result(result: &DispatchResult) {
    let status = result
        .http_status
        .map(|s| format!("HTTP {}", s))
        .unwrap_or_else(|| "no response".to_string());
    if result.is_ok() {
        println!("{}", style::success(&format!("{} ({})", result.message, status)));
    } else {
        println!("{}", style::error(&format!("{} ({})", result.message, status)));
    }
}

fn print_report(report: &DeliveryReport) {
    println!(
        "{} {}",
        style::header(&report.action.to_string()),
        style::dim(&report.path)
    );
    match report.result {
        Some(ref result) => {
            print_targets(&report.targets);
            print_result(result);
        }
        None if report.action.requires_purge() => {
            println!("{}", style::warn("no mapping matched; nothing was purged"));
        }
        None => println!("{}", style::success("acknowledged; no purge needed")),
    }
}

fn ensure_ok(result: &DispatchResult) -> Result<()> {
    if result.is_ok() {
        Ok(())
    } else {
        anyhow::bail!("purge failed: {}", result.message)
    }
}
