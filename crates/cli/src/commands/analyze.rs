//! Analyze command - run one analysis and print the feedback

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::watch;
use tracing::debug;

use interview_analyzer_orchestrator::Orchestrator;
use interview_analyzer_session::{default_stages, AnalysisSession, SessionState, SessionView};

use super::TargetArgs;
use crate::{remote, render};

#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Skip the staged progress display
    #[arg(long)]
    pub no_animation: bool,

    /// Print the result as JSON instead of a report
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeCommand {
    pub async fn execute(self) -> Result<()> {
        let stages = if self.no_animation {
            Vec::new()
        } else {
            default_stages()
        };
        let mut session = AnalysisSession::new(stages);
        session.mark_input_ready()?;

        match &self.target.server {
            Some(server) => {
                debug!("Analyzing through {server}");
                let server = server.clone();
                session.start(async move { remote::analyze(&server).await })?;
            }
            None => {
                let orchestrator = Orchestrator::new(self.target.settings()?);
                debug!(
                    "Analyzing {} locally",
                    orchestrator.artifact_path().display()
                );
                session.start(async move { orchestrator.analyze().await })?;
            }
        }

        let updates = session.subscribe();
        let total = session.stages().len();
        let settled = tokio::select! {
            view = follow(updates, total, !self.json) => view,
            _ = tokio::signal::ctrl_c() => {
                session.reset();
                anyhow::bail!("Analysis cancelled");
            }
        };

        match settled.state {
            SessionState::Complete(result) => {
                if self.json {
                    let body = serde_json::to_string_pretty(&result)
                        .context("Failed to serialize result")?;
                    println!("{body}");
                } else {
                    println!();
                    print!("{}", render::format_result(&result));
                }
                Ok(())
            }
            SessionState::Failed(message) => anyhow::bail!("Analysis failed: {message}"),
            other => anyhow::bail!("Analysis ended while {}", other.name()),
        }
    }
}

/// Print each new stage until the session settles
async fn follow(
    mut updates: watch::Receiver<SessionView>,
    total_stages: usize,
    show_progress: bool,
) -> SessionView {
    let mut last_stage = None;
    loop {
        let view = updates.borrow_and_update().clone();
        if show_progress && total_stages > 0 && view.progress.stage_label != last_stage {
            if view.progress.stage_label.is_some() {
                eprintln!("{}", render::format_progress(&view.progress, total_stages));
            }
            last_stage = view.progress.stage_label.clone();
        }
        if view.state.is_settled() {
            return view;
        }
        if updates.changed().await.is_err() {
            return view;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_analyzer_common::AnalysisResult;

    #[tokio::test]
    async fn test_follow_returns_settled_view() {
        let mut session = AnalysisSession::new(Vec::new());
        session.mark_input_ready().unwrap();
        session
            .start(async { Ok::<_, String>(AnalysisResult::fallback()) })
            .unwrap();

        let view = follow(session.subscribe(), 0, false).await;
        assert!(matches!(view.state, SessionState::Complete(ref result) if result.degraded));
    }

    #[tokio::test]
    async fn test_local_missing_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let command = AnalyzeCommand {
            target: TargetArgs {
                config: dir.path().join("interview-analyzer.toml"),
                uploads_dir: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
            no_animation: true,
            json: true,
        };

        let error = command.execute().await.unwrap_err();
        assert!(error.to_string().contains("not found"), "got {error}");
    }

    #[tokio::test]
    async fn test_local_missing_analyzer_prints_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("temp.mp4.mp4"), b"video").unwrap();
        std::fs::write(
            dir.path().join("interview-analyzer.toml"),
            "[analyzer]\nprogram = \"/nonexistent/bin/python\"\n",
        )
        .unwrap();
        let command = AnalyzeCommand {
            target: TargetArgs {
                config: dir.path().join("interview-analyzer.toml"),
                uploads_dir: Some(dir.path().to_path_buf()),
                ..Default::default()
            },
            no_animation: true,
            json: true,
        };

        command.execute().await.unwrap();
    }
}
