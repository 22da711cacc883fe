//! CLI subcommands

pub mod analyze;
pub mod status;

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use interview_analyzer_orchestrator::config::load_config;
use interview_analyzer_orchestrator::OrchestratorConfig;

/// Where the analysis runs
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// API server base URL; the local analyzer is used when omitted
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Configuration file (TOML) for local analysis
    #[arg(long, env = "INTERVIEW_ANALYZER_CONFIG", default_value = "interview-analyzer.toml")]
    pub config: PathBuf,

    /// Directory holding the input artifact
    #[arg(long)]
    pub uploads_dir: Option<PathBuf>,

    /// Input artifact file name
    #[arg(long)]
    pub artifact: Option<String>,

    /// Analyzer timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
}

impl TargetArgs {
    /// Resolve local orchestrator settings from the config file and flags
    pub fn settings(&self) -> Result<OrchestratorConfig> {
        let mut config = load_config(&self.config)?;
        config.apply_overrides(
            self.uploads_dir.clone(),
            self.artifact.clone(),
            self.timeout_secs,
        );
        config.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_settings_apply_flags() {
        let target = TargetArgs {
            config: PathBuf::from("/nonexistent/interview-analyzer.toml"),
            uploads_dir: Some(PathBuf::from("/tmp/uploads")),
            artifact: Some("answer.mp4".to_string()),
            timeout_secs: Some(7),
            ..Default::default()
        };

        let settings = target.settings().unwrap();
        assert_eq!(settings.artifact_path, PathBuf::from("/tmp/uploads/answer.mp4"));
        assert_eq!(settings.timeout, Duration::from_secs(7));
        assert_eq!(settings.analyzer.program, "python");
    }
}
