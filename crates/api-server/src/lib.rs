//! REST API Server for interview analysis
//!
//! Exposes the analysis orchestrator over HTTP:
//! - `POST /analyze`: analyze the input artifact
//! - `GET /status`: diagnostic readiness report
//! - `GET /health`: liveness

mod handlers;
mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use interview_analyzer_orchestrator::{Orchestrator, OrchestratorConfig};

pub use handlers::*;
pub use types::*;

/// API server state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    /// Orchestrator running the analyses
    pub orchestrator: Arc<Orchestrator>,
}

impl ApiState {
    /// Create new API state from resolved settings
    #[must_use]
    pub fn new(config: OrchestratorConfig) -> Self {
        Self::with_orchestrator(Orchestrator::new(config))
    }

    #[must_use]
    pub fn with_orchestrator(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

impl Default for ApiState {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default())
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Analysis
        .route("/analyze", post(analyze))
        .route("/status", get(get_status))
        // Legacy front-end path: POST analyzes, GET reports status
        .route("/api/analyze", get(get_status).post(analyze))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
pub async fn start_server(addr: &str, state: ApiState) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Serve the API on an already bound listener
pub async fn serve(listener: TcpListener, state: ApiState) -> Result<(), std::io::Error> {
    let app = build_router(state);
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_api_state_creation() {
        let config = OrchestratorConfig {
            artifact_path: PathBuf::from("/srv/uploads/answer.mp4"),
            ..Default::default()
        };
        let state = ApiState::new(config);
        assert_eq!(
            state.orchestrator.artifact_path(),
            PathBuf::from("/srv/uploads/answer.mp4")
        );
    }

    #[test]
    fn test_api_state_default() {
        let state = ApiState::default();
        let artifact = state.orchestrator.artifact_path();
        assert!(artifact.is_absolute());
        assert!(artifact.ends_with(PathBuf::from("uploads").join("temp.mp4.mp4")));
    }
}
