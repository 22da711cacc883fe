//! Interview Analyzer CLI - feedback on a recorded interview answer

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use interview_analyzer_cli::commands::{analyze::AnalyzeCommand, status::StatusCommand};

#[derive(Parser)]
#[command(
    name = "interview-analyze",
    version,
    about = "Speech and facial expression feedback for a recorded interview answer",
    after_help = "EXAMPLES:\n  \
                  # Analyze uploads/temp.mp4.mp4 with the local analyzer\n  \
                  interview-analyze analyze\n\n  \
                  # Analyze through a running API server\n  \
                  interview-analyze analyze --server http://127.0.0.1:8080\n\n  \
                  # Check analyzer and input availability\n  \
                  interview-analyze status"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the input artifact and print feedback
    Analyze(AnalyzeCommand),

    /// Report analyzer runtime and input artifact availability
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with rendered output
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Analyze(cmd) => cmd.execute().await,
        Commands::Status(cmd) => cmd.execute().await,
    }
}
