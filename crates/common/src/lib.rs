/// Common types and utilities for interview analysis
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

mod result;

pub use result::*;

/// Analysis errors
///
/// Only [`AnalysisError::InputMissing`] and [`AnalysisError::Internal`] are
/// meant to reach a caller of the orchestrator. Every other variant describes
/// an analyzer-side failure that is absorbed into the fallback result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Input artifact not found: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("Analyzer unavailable: {0}")]
    AnalyzerUnavailable(String),

    #[error("Analyzer exited with {status}: {stderr}")]
    AnalyzerFailed { status: String, stderr: String },

    #[error("Analyzer timed out after {0:?}")]
    AnalyzerTimeout(Duration),

    #[error("Malformed analyzer output: {0}")]
    MalformedOutput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Whether this failure is replaced by the fallback result instead of
    /// being reported to the caller
    #[must_use]
    pub fn is_degradable(&self) -> bool {
        match self {
            Self::AnalyzerUnavailable(_)
            | Self::AnalyzerFailed { .. }
            | Self::AnalyzerTimeout(_)
            | Self::MalformedOutput(_) => true,
            Self::InputMissing(_) | Self::Internal(_) => false,
        }
    }

    /// Stable label for structured logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InputMissing(_) => "input_missing",
            Self::AnalyzerUnavailable(_) => "analyzer_unavailable",
            Self::AnalyzerFailed { .. } => "analyzer_failed",
            Self::AnalyzerTimeout(_) => "analyzer_timeout",
            Self::MalformedOutput(_) => "malformed_output",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::MalformedOutput(err.to_string())
    }
}

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradable_classification() {
        assert!(AnalysisError::AnalyzerUnavailable("python: not found".into()).is_degradable());
        assert!(AnalysisError::AnalyzerFailed {
            status: "exit status: 1".into(),
            stderr: String::new(),
        }
        .is_degradable());
        assert!(AnalysisError::AnalyzerTimeout(Duration::from_secs(120)).is_degradable());
        assert!(AnalysisError::MalformedOutput("eof".into()).is_degradable());

        assert!(!AnalysisError::InputMissing(PathBuf::from("uploads/temp.mp4.mp4")).is_degradable());
        assert!(!AnalysisError::Internal("join error".into()).is_degradable());
    }

    #[test]
    fn test_input_missing_message() {
        let err = AnalysisError::InputMissing(PathBuf::from("uploads/temp.mp4.mp4"));
        assert_eq!(
            err.to_string(),
            "Input artifact not found: uploads/temp.mp4.mp4"
        );
        assert_eq!(err.kind(), "input_missing");
    }

    #[test]
    fn test_timeout_message_keeps_sub_second_precision() {
        let err = AnalysisError::AnalyzerTimeout(Duration::from_millis(300));
        assert_eq!(err.to_string(), "Analyzer timed out after 300ms");

        let err = AnalysisError::AnalyzerTimeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "Analyzer timed out after 120s");
    }

    #[test]
    fn test_json_error_is_malformed_output() {
        let err: AnalysisError = serde_json::from_str::<serde_json::Value>("not json")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "malformed_output");
    }
}
