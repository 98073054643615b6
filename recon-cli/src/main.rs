//! CLI entry point: loads configuration, wires real `ActivitySource`/
//! `FileMetadataSource`/`ReconStore` implementations, runs one detection
//! pass, and writes findings as JSON.

mod config;
mod output;
mod sources;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use recon_core::types::Severity;
use recon_core::{Clock, SystemClock};
use tracing_subscriber::EnvFilter;

const STORE_TTL_DAYS: u64 = 14;

/// Correlate AI-assistant reconnaissance with data-egress activity and
/// report insider-threat findings.
#[derive(Debug, Parser)]
#[command(name = "recon-cli", version, about)]
struct Cli {
    /// Path to the configuration file (YAML, TOML, or JSON by extension).
    #[arg(long)]
    config: PathBuf,

    /// How far back to fetch activity, in hours.
    #[arg(long, default_value_t = 24)]
    lookback_hours: i64,

    /// Width of the recon-to-egress correlation window, in minutes.
    #[arg(long, default_value_t = 30)]
    window_minutes: i64,

    /// Write findings to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Emit debug-level logs in addition to info.
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(findings) => {
            let has_high = findings.iter().any(|f| f.severity == Severity::High);
            if let Err(e) = output::write_findings(&findings, cli.output.as_deref()) {
                tracing::error!(error = %e, "failed to write findings");
                return ExitCode::from(4);
            }
            ExitCode::from(u8::from(has_high))
        }
        Err(e) => {
            tracing::error!(error = %e, "detection run failed");
            ExitCode::from(exit_code_for(&e) as u8)
        }
    }
}

fn exit_code_for(e: &anyhow::Error) -> i32 {
    e.downcast_ref::<recon_core::Error>().map_or(4, recon_core::Error::exit_code)
}

async fn run(cli: &Cli) -> anyhow::Result<Vec<recon_core::Finding>> {
    let config = config::load(Some(&cli.config))?;

    let access_token = std::env::var("GOOGLE_ACCESS_TOKEN")
        .map_err(|_| recon_core::Error::Auth("GOOGLE_ACCESS_TOKEN is not set".to_string()))?;
    let http = reqwest::Client::new();

    let activity_source = Arc::new(sources::GoogleWorkspaceActivitySource::new(
        http.clone(),
        access_token.clone(),
        config.customer_id.clone(),
    ));
    let file_metadata_source = Arc::new(sources::DriveFileMetadataSource::new(http, access_token));

    let store: Arc<dyn recon_core::ReconStore> = match &config.redis_url {
        Some(url) => Arc::new(recon_store_redis::RedisReconStore::new(url, STORE_TTL_DAYS)?),
        None => Arc::new(recon_core::InMemoryReconStore::new(STORE_TTL_DAYS)),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let findings = recon_core::run_detection(
        &config,
        clock,
        activity_source,
        file_metadata_source,
        store,
        cli.lookback_hours,
        cli.window_minutes,
    )
    .await?;

    Ok(findings)
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
