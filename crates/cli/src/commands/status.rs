//! Status command - readiness of the analysis pipeline

use anyhow::{Context, Result};
use clap::Args;

use interview_analyzer_orchestrator::Orchestrator;

use super::TargetArgs;
use crate::{remote, render};

#[derive(Args, Debug)]
pub struct StatusCommand {
    #[command(flatten)]
    pub target: TargetArgs,
}

impl StatusCommand {
    pub async fn execute(self) -> Result<()> {
        match &self.target.server {
            Some(server) => {
                let body = remote::status(server).await?;
                let text =
                    serde_json::to_string_pretty(&body).context("Failed to format status")?;
                println!("{text}");
            }
            None => {
                let orchestrator = Orchestrator::new(self.target.settings()?);
                let readiness = orchestrator.check_readiness().await;
                println!("Input artifact: {}", orchestrator.artifact_path().display());
                println!("{}", render::format_readiness(&readiness));
            }
        }
        Ok(())
    }
}
