//! API Server Binary Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use interview_analyzer_api_server::{start_server, ApiState};
use interview_analyzer_orchestrator::config::load_config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "interview-analyzer-server")]
#[command(about = "HTTP API for interview video analysis")]
#[command(version)]
struct Args {
    /// Bind address
    #[arg(long, env = "API_SERVER_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// Configuration file (TOML), defaults apply when absent
    #[arg(long, env = "INTERVIEW_ANALYZER_CONFIG", default_value = "interview-analyzer.toml")]
    config: PathBuf,

    /// Directory holding the input artifact
    #[arg(long)]
    uploads_dir: Option<PathBuf>,

    /// Input artifact file name
    #[arg(long)]
    artifact: Option<String>,

    /// Analyzer timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "interview_analyzer_api_server=info,interview_analyzer_orchestrator=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    config.apply_overrides(args.uploads_dir, args.artifact, args.timeout_secs);
    let settings = config.resolve()?;
    tracing::info!(
        "Input artifact: {}, analyzer: {} {:?}, timeout: {:?}",
        settings.artifact_path.display(),
        settings.analyzer.program,
        settings.analyzer.args,
        settings.timeout
    );

    let state = ApiState::new(settings);

    // Start server
    tracing::info!("Starting Interview Analyzer API Server");
    start_server(&args.addr, state)
        .await
        .with_context(|| format!("Server on {} failed", args.addr))?;

    Ok(())
}
