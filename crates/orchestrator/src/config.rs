//! Configuration loading for the orchestrator.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default directory holding the input artifact
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";

/// Default input artifact file name
pub const DEFAULT_ARTIFACT_NAME: &str = "temp.mp4.mp4";

/// Default analyzer interpreter
pub const DEFAULT_ANALYZER_PROGRAM: &str = "python";

/// Default analyzer script, passed before the artifact path
pub const DEFAULT_ANALYZER_SCRIPT: &str = "ml_model.py";

/// Default bound on a single analyzer invocation (2 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default bound on the readiness runtime check
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// On-disk configuration file, every field optional
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    pub input: Option<InputConfig>,
    pub analyzer: Option<AnalyzerConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct InputConfig {
    pub uploads_dir: Option<PathBuf>,
    pub artifact_name: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AnalyzerConfig {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub probe_timeout_secs: Option<u64>,
}

/// External analyzer command line, without the artifact path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for AnalyzerCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_ANALYZER_PROGRAM.to_string(),
            args: vec![DEFAULT_ANALYZER_SCRIPT.to_string()],
        }
    }
}

/// Resolved orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Absolute path of the input artifact
    pub artifact_path: PathBuf,
    pub analyzer: AnalyzerCommand,
    /// Bound on one analyzer invocation
    pub timeout: Duration,
    /// Bound on the readiness runtime check
    pub probe_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let relative = PathBuf::from(DEFAULT_UPLOADS_DIR).join(DEFAULT_ARTIFACT_NAME);
        Self {
            // Stays relative only when the working directory is unreadable
            artifact_path: std::path::absolute(&relative).unwrap_or(relative),
            analyzer: AnalyzerCommand::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn uploads_dir(&self) -> PathBuf {
        self.input
            .as_ref()
            .and_then(|input| input.uploads_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR))
    }

    pub fn artifact_name(&self) -> String {
        self.input
            .as_ref()
            .and_then(|input| input.artifact_name.clone())
            .unwrap_or_else(|| DEFAULT_ARTIFACT_NAME.to_string())
    }

    pub fn timeout_secs(&self) -> u64 {
        self.analyzer
            .as_ref()
            .and_then(|analyzer| analyzer.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn probe_timeout_secs(&self) -> u64 {
        self.analyzer
            .as_ref()
            .and_then(|analyzer| analyzer.probe_timeout_secs)
            .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS)
    }

    pub fn analyzer_command(&self) -> AnalyzerCommand {
        let defaults = AnalyzerCommand::default();
        let Some(analyzer) = self.analyzer.as_ref() else {
            return defaults;
        };
        AnalyzerCommand {
            program: analyzer.program.clone().unwrap_or(defaults.program),
            args: analyzer.args.clone().unwrap_or(defaults.args),
        }
    }

    /// Apply command-line overrides on top of the file settings
    pub fn apply_overrides(
        &mut self,
        uploads_dir: Option<PathBuf>,
        artifact_name: Option<String>,
        timeout_secs: Option<u64>,
    ) {
        if uploads_dir.is_some() || artifact_name.is_some() {
            let input = self.input.get_or_insert_with(InputConfig::default);
            if uploads_dir.is_some() {
                input.uploads_dir = uploads_dir;
            }
            if artifact_name.is_some() {
                input.artifact_name = artifact_name;
            }
        }
        if timeout_secs.is_some() {
            self.analyzer
                .get_or_insert_with(AnalyzerConfig::default)
                .timeout_secs = timeout_secs;
        }
    }

    /// Resolve into the typed settings handed to the orchestrator
    ///
    /// A relative artifact path is anchored at the current working directory,
    /// since the analyzer may run from elsewhere.
    pub fn resolve(&self) -> Result<OrchestratorConfig> {
        let timeout_secs = self.timeout_secs();
        if timeout_secs == 0 {
            bail!("analyzer timeout_secs must be at least 1");
        }
        let probe_timeout_secs = self.probe_timeout_secs();
        if probe_timeout_secs == 0 {
            bail!("analyzer probe_timeout_secs must be at least 1");
        }

        let relative = self.uploads_dir().join(self.artifact_name());
        let artifact_path = std::path::absolute(&relative).with_context(|| {
            format!("Failed to resolve artifact path: {}", relative.display())
        })?;

        Ok(OrchestratorConfig {
            artifact_path,
            analyzer: self.analyzer_command(),
            timeout: Duration::from_secs(timeout_secs),
            probe_timeout: Duration::from_secs(probe_timeout_secs),
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config =
        toml::from_str(&contents).context("Failed to parse config file as TOML")?;
    Ok(config)
}
