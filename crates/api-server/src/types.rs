//! API request and response types

use serde::{Deserialize, Serialize};

use interview_analyzer_orchestrator::Readiness;

/// Capabilities advertised by the status endpoint
pub const FEATURES: [&str; 3] = [
    "Speech transcription and analysis",
    "Facial expression analysis",
    "Interview feedback generation",
];

/// Analyzer installation hint returned by the status endpoint
pub const DEPENDENCY_NOTE: &str = "Make sure to install Python dependencies: pip install deepface opencv-python SpeechRecognition transformers torch torchaudio moviepy";

/// Error body for non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Diagnostic status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    pub features: Vec<String>,
    pub note: String,
    /// Informational only, never gates analysis
    pub readiness: Readiness,
}

impl StatusResponse {
    #[must_use]
    pub fn ready(readiness: Readiness) -> Self {
        Self {
            status: "ready".to_string(),
            message: "Interview Analyzer API is ready".to_string(),
            features: FEATURES.iter().map(|f| (*f).to_string()).collect(),
            note: DEPENDENCY_NOTE.to_string(),
            readiness,
        }
    }
}
