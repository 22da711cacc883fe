//! Analysis Orchestrator
//!
//! Locates the input artifact, runs the external analyzer with a bounded wait
//! and turns every analyzer-side failure into the fallback result. A missing
//! artifact is reported to the caller instead of being masked.

pub mod analyzer;
pub mod config;

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn, Instrument};

pub use analyzer::{Analyzer, AnalyzerOutput, SubprocessAnalyzer};
pub use config::{AnalyzerCommand, OrchestratorConfig};
use interview_analyzer_common::{AnalysisError, AnalysisResult, Result};

/// In-flight analyses keyed by artifact path
type FlightMap = Arc<Mutex<HashMap<PathBuf, broadcast::Sender<Result<AnalysisResult>>>>>;

/// Maximum number of stdout bytes echoed into logs for malformed output
const STDOUT_PREVIEW_BYTES: usize = 256;

/// Diagnostic view of the analysis pipeline prerequisites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub analyzer_runtime_available: bool,
    pub input_artifact_present: bool,
}

/// Runs analyses against the external analyzer
pub struct Orchestrator {
    artifact_path: PathBuf,
    timeout: Duration,
    analyzer: Arc<dyn Analyzer>,
    flights: FlightMap,
}

impl Orchestrator {
    /// Create an orchestrator backed by the configured analyzer subprocess
    #[must_use]
    pub fn new(config: OrchestratorConfig) -> Self {
        let analyzer = Arc::new(SubprocessAnalyzer::new(
            config.analyzer.clone(),
            config.probe_timeout,
        ));
        Self::with_analyzer(config, analyzer)
    }

    /// Create an orchestrator backed by any analyzer implementation
    #[must_use]
    pub fn with_analyzer(config: OrchestratorConfig, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            artifact_path: config.artifact_path,
            timeout: config.timeout,
            analyzer,
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Configured input artifact
    #[must_use]
    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Analyze the configured input artifact
    pub async fn analyze(&self) -> Result<AnalysisResult> {
        self.analyze_artifact(&self.artifact_path).await
    }

    /// Analyze one artifact
    ///
    /// Fails with [`AnalysisError::InputMissing`] before launching anything
    /// when the artifact is absent. Analyzer failures, timeouts and
    /// unparsable output yield [`AnalysisResult::fallback`]. Concurrent
    /// calls for the same artifact share a single analyzer invocation.
    pub async fn analyze_artifact(&self, artifact: &Path) -> Result<AnalysisResult> {
        if !artifact_present(artifact).await {
            warn!(artifact = %artifact.display(), "Input artifact missing");
            return Err(AnalysisError::InputMissing(artifact.to_path_buf()));
        }

        let mut receiver = self.join_or_launch(artifact);
        match receiver.recv().await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    artifact = %artifact.display(),
                    error = %e,
                    "Analysis task ended without a result"
                );
                Err(AnalysisError::Internal(
                    "analysis task terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Report analyzer runtime and input artifact availability
    ///
    /// Each check is independent and a failed check reads as `false`.
    pub async fn check_readiness(&self) -> Readiness {
        let (analyzer_runtime_available, input_artifact_present) = tokio::join!(
            self.analyzer.runtime_available(),
            artifact_present(&self.artifact_path)
        );

        if analyzer_runtime_available {
            info!("Analyzer runtime {} available", self.analyzer.name());
        } else {
            warn!("Analyzer runtime {} not available", self.analyzer.name());
        }
        if input_artifact_present {
            info!("Input artifact found: {}", self.artifact_path.display());
        } else {
            warn!("Input artifact not found: {}", self.artifact_path.display());
        }

        Readiness {
            analyzer_runtime_available,
            input_artifact_present,
        }
    }

    /// Subscribe to the running analysis of `artifact`, starting one if none
    fn join_or_launch(&self, artifact: &Path) -> broadcast::Receiver<Result<AnalysisResult>> {
        let mut flights = self.flights.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = flights.get(artifact) {
            debug!("Joining in-flight analysis of {}", artifact.display());
            return sender.subscribe();
        }

        let (sender, receiver) = broadcast::channel(1);
        flights.insert(artifact.to_path_buf(), sender);

        let guard = FlightGuard {
            flights: Arc::clone(&self.flights),
            artifact: artifact.to_path_buf(),
            released: false,
        };
        let analyzer = Arc::clone(&self.analyzer);
        let timeout = self.timeout;
        tokio::spawn(async move {
            let result = run_analysis(analyzer.as_ref(), &guard.artifact, timeout).await;
            if let Some(sender) = guard.release() {
                // No receivers left means every caller went away
                let _ = sender.send(result);
            }
        }
        .in_current_span());

        receiver
    }
}

/// Removes a flight from the registry when its task ends, even by panic
struct FlightGuard {
    flights: FlightMap,
    artifact: PathBuf,
    released: bool,
}

impl FlightGuard {
    fn release(mut self) -> Option<broadcast::Sender<Result<AnalysisResult>>> {
        self.released = true;
        self.flights
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.artifact)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if !self.released {
            self.flights
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&self.artifact);
        }
    }
}

async fn artifact_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}

/// Invoke the analyzer once and apply the degradation policy
async fn run_analysis(
    analyzer: &dyn Analyzer,
    artifact: &Path,
    timeout: Duration,
) -> Result<AnalysisResult> {
    info!(
        "Running analyzer {} on {} (timeout {:?})",
        analyzer.name(),
        artifact.display(),
        timeout
    );

    let outcome = match tokio::time::timeout(timeout, analyzer.invoke(artifact)).await {
        Ok(invocation) => invocation,
        Err(_) => Err(AnalysisError::AnalyzerTimeout(timeout)),
    }
    .and_then(|output| {
        if !output.stderr.is_empty() {
            warn!(artifact = %artifact.display(), stderr = %output.stderr, "Analyzer stderr");
        }
        AnalysisResult::from_analyzer_output(&output.stdout).inspect_err(|_| {
            let end = output.stdout.len().min(STDOUT_PREVIEW_BYTES);
            debug!(
                "Analyzer stdout: {}",
                String::from_utf8_lossy(&output.stdout[..end])
            );
        })
    });

    match outcome {
        Ok(result) => {
            info!(
                "Analysis of {} complete: evaluation={:?}, confidence={:.2}",
                artifact.display(),
                result.speech.evaluation,
                result.speech.confidence
            );
            Ok(result)
        }
        Err(e) if e.is_degradable() => {
            warn!(
                artifact = %artifact.display(),
                kind = e.kind(),
                error = %e,
                "Analysis degraded to fallback result"
            );
            Ok(AnalysisResult::fallback())
        }
        Err(e) => {
            error!(
                artifact = %artifact.display(),
                kind = e.kind(),
                error = %e,
                "Analysis failed"
            );
            Err(e)
        }
    }
}
