//! dock-collector CLI
//!
//! Reads a tenant list, collects every tenant's dock configuration and writes
//! it to a CSV or XLSX file. Log events are appended to the audit trail and
//! echoed to the terminal while the run progresses.

use anyhow::{Context, Result, bail};
use clap::Parser;
use dock_collector::types::parse_tenant_list;
use dock_collector::{
    AuditLogger, Config, Credentials, DockCollector, EventSubscriber, OutputFormat,
    ProgressUpdate, RunState, StartRequest,
};
use futures::FutureExt;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_stream::StreamExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dock-collector")]
#[command(about = "Collect logistics dock configuration for a list of tenants", long_about = None)]
struct Cli {
    /// File with one tenant account per line
    #[arg(long, required_unless_present = "export_logs")]
    tenants: Option<PathBuf>,

    /// Output format (csv or xlsx); defaults to the configured format
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Output file; a timestamped name in the output directory when omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Audit trail location; overrides the configured path
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// API app key
    #[arg(long, env = "VTEX_APP_KEY", hide_env_values = true, default_value = "")]
    app_key: String,

    /// API app token
    #[arg(long, env = "VTEX_APP_TOKEN", hide_env_values = true, default_value = "")]
    app_token: String,

    /// Copy the audit trail to this path and exit
    #[arg(long)]
    export_logs: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dock_collector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(path) = &cli.audit_log {
        config.audit.log_file = path.clone();
    }

    let audit = AuditLogger::open(&config.audit.log_file)
        .await
        .with_context(|| format!("Failed to open audit log {}", config.audit.log_file.display()))?;

    if let Some(dest) = &cli.export_logs {
        let bytes = audit
            .export(dest)
            .await
            .with_context(|| format!("Failed to export logs to {}", dest.display()))?;
        println!("Logs exported to: {} ({} bytes)", dest.display(), bytes);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(tenant_file) = &cli.tenants else {
        bail!("--tenants is required");
    };
    let text = tokio::fs::read_to_string(tenant_file)
        .await
        .with_context(|| format!("Failed to read tenant list {}", tenant_file.display()))?;
    let tenants = parse_tenant_list(&text);

    let format = cli.format.unwrap_or(config.output.default_format);
    let collector = DockCollector::new(config).context("Invalid configuration")?;
    let events = collector
        .take_events()
        .context("Event bus already taken")?;

    let mut request = StartRequest::new(
        tenants,
        Credentials::new(cli.app_key, cli.app_token),
        format,
    );
    if let Some(output) = cli.output {
        request = request.with_output_path(output);
    }

    let handle = collector.start(request)?;
    observe(events, &audit).await?;

    let report = handle.wait().await?;
    info!(
        state = ?report.state,
        succeeded = report.succeeded(),
        tenants = report.outcomes.len(),
        records = report.records,
        "run finished"
    );

    if report.state == RunState::Failed {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Echo progress and record log events until the run's sentinel arrives
async fn observe(events: EventSubscriber, audit: &AuditLogger) -> Result<()> {
    let (mut progress, mut logs) = events.into_streams();

    loop {
        tokio::select! {
            update = progress.next() => match update {
                Some(ProgressUpdate::Progress(p)) => {
                    println!("[{:>3.0}%] {}", p.percent(), p.label());
                }
                Some(ProgressUpdate::Finished) | None => break,
            },
            Some(log) = logs.next() => {
                println!("{}", audit.record(&log).await?);
            }
        }
    }

    // Every log of the run is queued before the sentinel
    while let Some(Some(log)) = logs.next().now_or_never() {
        println!("{}", audit.record(&log).await?);
    }
    Ok(())
}
