//! HTTP request handlers for API endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    types::{ErrorResponse, HealthResponse, StatusResponse},
    ApiState,
};
use interview_analyzer_common::{AnalysisError, AnalysisResult};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Analyze the configured input artifact
///
/// Responds 200 with either a genuine or a fallback result (`degraded`),
/// 404 when the artifact is missing and 500 on internal failure.
pub async fn analyze(State(state): State<ApiState>) -> Result<Json<AnalysisResult>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze", request_id = %request_id);

    async move {
        info!(
            artifact = %state.orchestrator.artifact_path().display(),
            "Analysis request received"
        );

        match state.orchestrator.analyze().await {
            Ok(result) => {
                info!(degraded = result.degraded, "Analysis request served");
                Ok(Json(result))
            }
            Err(e @ AnalysisError::InputMissing(_)) => {
                warn!(error = %e, "Analysis request rejected");
                Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new(e.to_string()))))
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, "Analysis request failed");
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal server error")),
                ))
            }
        }
    }
    .instrument(span)
    .await
}

/// Report service status and analysis prerequisites
pub async fn get_status(State(state): State<ApiState>) -> Result<Json<StatusResponse>, ApiError> {
    let orchestrator = Arc::clone(&state.orchestrator);
    let readiness = tokio::spawn(async move { orchestrator.check_readiness().await })
        .await
        .map_err(|e| {
            error!("Readiness probe failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Service unavailable")),
            )
        })?;

    Ok(Json(StatusResponse::ready(readiness)))
}
