//! Client for a remote API server

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use interview_analyzer_common::AnalysisResult;

/// Upper bound on one HTTP exchange; the server bounds the analyzer itself
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

fn endpoint(server: &str, path: &str) -> String {
    format!("{}/{}", server.trim_end_matches('/'), path)
}

fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// `POST /analyze`; the error string is what the user sees
pub async fn analyze(server: &str) -> std::result::Result<AnalysisResult, String> {
    let response = client()
        .map_err(|e| e.to_string())?
        .post(endpoint(server, "analyze"))
        .send()
        .await
        .map_err(|e| format!("Request to {server} failed: {e}"))?;

    let status = response.status();
    if status.is_success() {
        return response
            .json::<AnalysisResult>()
            .await
            .map_err(|e| format!("Invalid analysis response: {e}"));
    }

    match response.json::<ErrorBody>().await {
        Ok(body) => Err(body.error),
        Err(_) => Err(format!("HTTP error! status: {status}")),
    }
}

/// `GET /status` as raw JSON
pub async fn status(server: &str) -> Result<serde_json::Value> {
    let response = client()?
        .get(endpoint(server, "status"))
        .send()
        .await
        .with_context(|| format!("Request to {server} failed"))?;

    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .context("Invalid status response")?;
    if !status.is_success() {
        anyhow::bail!("Server returned {status}: {body}");
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_analyzer_api_server::{serve, ApiState};
    use interview_analyzer_orchestrator::{AnalyzerCommand, OrchestratorConfig};
    use std::path::Path;

    async fn spawn_server(artifact: &Path) -> String {
        let state = ApiState::new(OrchestratorConfig {
            artifact_path: artifact.to_path_buf(),
            analyzer: AnalyzerCommand {
                program: "/nonexistent/bin/python".to_string(),
                args: vec![],
            },
            timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(1),
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            serve(listener, state).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[test]
    fn test_endpoint_joins_paths() {
        assert_eq!(endpoint("http://host:8080", "analyze"), "http://host:8080/analyze");
        assert_eq!(endpoint("http://host:8080/", "status"), "http://host:8080/status");
    }

    #[tokio::test]
    async fn test_remote_analyze_fallback() {
        let artifact = tempfile::NamedTempFile::new().unwrap();
        let server = spawn_server(artifact.path()).await;

        let result = analyze(&server).await.unwrap();
        assert!(result.degraded);
        assert_eq!(result.speech.confidence, 0.87);
    }

    #[tokio::test]
    async fn test_remote_analyze_missing_artifact_message() {
        let dir = tempfile::tempdir().unwrap();
        let server = spawn_server(&dir.path().join("temp.mp4.mp4")).await;

        let error = analyze(&server).await.unwrap_err();
        assert!(error.starts_with("Input artifact not found"), "got {error}");
    }

    #[tokio::test]
    async fn test_remote_status() {
        let artifact = tempfile::NamedTempFile::new().unwrap();
        let server = spawn_server(artifact.path()).await;

        let body = status(&server).await.unwrap();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["readiness"]["inputArtifactPresent"], true);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let error = analyze("http://127.0.0.1:1").await.unwrap_err();
        assert!(error.contains("failed"), "got {error}");
    }
}
