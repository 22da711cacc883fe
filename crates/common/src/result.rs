//! Analysis result data model

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{AnalysisError, Result};

/// Overall evaluation of the spoken answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum Evaluation {
    Positive,
    Negative,
}

/// Speech transcript and its evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechAnalysis {
    /// Transcript of the spoken answer
    #[serde(rename = "text")]
    pub transcript: String,
    pub evaluation: Evaluation,
    /// Evaluation confidence in [0.0, 1.0]
    pub confidence: f64,
    pub feedback: String,
    /// Improvement suggestions in display order
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Face tracking metrics, percentages in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacialMetrics {
    pub face_visibility: f64,
    pub eye_contact: f64,
    pub facial_stability: f64,
}

/// Facial expression summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacialAnalysis {
    pub dominant_expression: String,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FacialMetrics>,
}

/// Result of one analysis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(rename = "speechAnalysis")]
    pub speech: SpeechAnalysis,
    #[serde(rename = "facialAnalysis")]
    pub facial: FacialAnalysis,
    #[serde(rename = "isComplete", default)]
    pub complete: bool,
    /// Set only on the placeholder returned when the analyzer could not
    /// produce a result
    #[serde(default)]
    pub degraded: bool,
}

impl AnalysisResult {
    /// Parse the analyzer's stdout into a normalized result
    ///
    /// Out-of-range confidence and metric values are clamped rather than
    /// rejected. An analyzer error document (`{"error": "..."}`) is reported
    /// as malformed output carrying the analyzer's message.
    pub fn from_analyzer_output(stdout: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(stdout)?;

        if value.get("speechAnalysis").is_none() {
            if let Some(message) = value.get("error").and_then(serde_json::Value::as_str) {
                return Err(AnalysisError::MalformedOutput(format!(
                    "analyzer reported error: {message}"
                )));
            }
        }

        let result: AnalysisResult = serde_json::from_value(value)?;
        Ok(result.normalized())
    }

    /// Clamp numeric fields into range and mark the result complete
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let confidence = self.speech.confidence;
        if let Some(clamped) = out_of_range(confidence, 0.0, 1.0) {
            warn!(confidence, "analyzer confidence out of range, clamping");
            self.speech.confidence = clamped;
        }

        if let Some(metrics) = self.facial.metrics.as_mut() {
            let fields = [
                ("faceVisibility", &mut metrics.face_visibility),
                ("eyeContact", &mut metrics.eye_contact),
                ("facialStability", &mut metrics.facial_stability),
            ];
            for (metric, value) in fields {
                if let Some(clamped) = out_of_range(*value, 0.0, 100.0) {
                    warn!(metric, value = *value, "analyzer metric out of range, clamping");
                    *value = clamped;
                }
            }
        }

        self.complete = true;
        self.degraded = false;
        self
    }

    /// Placeholder returned whenever the analysis pipeline is unavailable
    ///
    /// The values are demo data and carry no meaning beyond "no real analysis
    /// was performed"; `degraded` is always set.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            speech: SpeechAnalysis {
                transcript: "I believe my experience in software development and my passion for problem-solving make me an excellent candidate for this position. I have worked on various projects that required both technical skills and team collaboration.".to_string(),
                evaluation: Evaluation::Positive,
                confidence: 0.87,
                feedback: "Your response is well-structured and clear. You effectively communicated your qualifications and enthusiasm.".to_string(),
                suggestions: vec![
                    "Consider providing more specific examples of your projects".to_string(),
                    "Try to quantify your achievements when possible".to_string(),
                    "Practice speaking at a measured pace to improve clarity".to_string(),
                ],
            },
            facial: FacialAnalysis {
                dominant_expression: "confident".to_string(),
                feedback: "You appeared confident and positive throughout the interview. Your facial expressions conveyed professionalism and enthusiasm.".to_string(),
                metrics: None,
            },
            complete: true,
            degraded: true,
        }
    }
}

/// Clamped value when `value` lies outside `[min, max]`, bounds included
fn out_of_range(value: f64, min: f64, max: f64) -> Option<f64> {
    (!(min..=max).contains(&value)).then(|| value.clamp(min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer_json(confidence: f64) -> String {
        serde_json::json!({
            "speechAnalysis": {
                "text": "Hello",
                "evaluation": "POSITIVE",
                "confidence": confidence,
                "feedback": "Clear answer",
                "suggestions": ["Slow down"]
            },
            "facialAnalysis": {
                "dominantExpression": "neutral",
                "feedback": "Steady"
            },
            "isComplete": true
        })
        .to_string()
    }

    #[test]
    fn test_parse_in_range_confidence_unchanged() {
        let result = AnalysisResult::from_analyzer_output(analyzer_json(0.42).as_bytes()).unwrap();
        assert_eq!(result.speech.confidence, 0.42);
        assert_eq!(result.speech.transcript, "Hello");
        assert_eq!(result.speech.evaluation, Evaluation::Positive);
        assert_eq!(result.speech.suggestions, vec!["Slow down".to_string()]);
        assert_eq!(result.facial.dominant_expression, "neutral");
        assert!(result.complete);
        assert!(!result.degraded);
    }

    #[test]
    fn test_parse_clamps_confidence() {
        let high = AnalysisResult::from_analyzer_output(analyzer_json(1.4).as_bytes()).unwrap();
        assert_eq!(high.speech.confidence, 1.0);

        let low = AnalysisResult::from_analyzer_output(analyzer_json(-0.3).as_bytes()).unwrap();
        assert_eq!(low.speech.confidence, 0.0);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        assert_eq!(out_of_range(0.0, 0.0, 1.0), None);
        assert_eq!(out_of_range(1.0, 0.0, 1.0), None);
        assert_eq!(out_of_range(1.0000001, 0.0, 1.0), Some(1.0));
        assert_eq!(out_of_range(0.0, 0.0, 100.0), None);
        assert_eq!(out_of_range(100.0, 0.0, 100.0), None);
        assert_eq!(out_of_range(-0.5, 0.0, 100.0), Some(0.0));
    }

    #[test]
    fn test_parse_boundary_confidence_unchanged() {
        let zero = AnalysisResult::from_analyzer_output(analyzer_json(0.0).as_bytes()).unwrap();
        assert_eq!(zero.speech.confidence, 0.0);

        let one = AnalysisResult::from_analyzer_output(analyzer_json(1.0).as_bytes()).unwrap();
        assert_eq!(one.speech.confidence, 1.0);
    }

    #[test]
    fn test_parse_boundary_metrics_unchanged() {
        let json = r#"{
            "speechAnalysis": {"text": "Hi", "evaluation": "POSITIVE", "confidence": 1.0, "feedback": "ok"},
            "facialAnalysis": {
                "dominantExpression": "confident",
                "feedback": "ok",
                "metrics": {"faceVisibility": 100.0, "eyeContact": 0.0, "facialStability": 100.0}
            }
        }"#;

        let metrics = AnalysisResult::from_analyzer_output(json.as_bytes())
            .unwrap()
            .facial
            .metrics
            .unwrap();
        assert_eq!(metrics.face_visibility, 100.0);
        assert_eq!(metrics.eye_contact, 0.0);
        assert_eq!(metrics.facial_stability, 100.0);
    }

    #[test]
    fn test_parse_defaults_missing_optional_fields() {
        let json = r#"{
            "speechAnalysis": {
                "text": "Hi",
                "evaluation": "NEGATIVE",
                "confidence": 0.5,
                "feedback": "Too short"
            },
            "facialAnalysis": {"dominantExpression": "nervous", "feedback": "Fidgety"}
        }"#;

        let result = AnalysisResult::from_analyzer_output(json.as_bytes()).unwrap();
        assert_eq!(result.speech.evaluation, Evaluation::Negative);
        assert!(result.speech.suggestions.is_empty());
        assert!(result.facial.metrics.is_none());
        assert!(result.complete, "every returned result is complete");
    }

    #[test]
    fn test_parse_clamps_facial_metrics() {
        let json = r#"{
            "speechAnalysis": {"text": "Hi", "evaluation": "POSITIVE", "confidence": 0.9, "feedback": "ok"},
            "facialAnalysis": {
                "dominantExpression": "confident",
                "feedback": "ok",
                "metrics": {"faceVisibility": 104.2, "eyeContact": 61.0, "facialStability": -3.0}
            },
            "isComplete": true
        }"#;

        let metrics = AnalysisResult::from_analyzer_output(json.as_bytes())
            .unwrap()
            .facial
            .metrics
            .unwrap();
        assert_eq!(metrics.face_visibility, 100.0);
        assert_eq!(metrics.eye_contact, 61.0);
        assert_eq!(metrics.facial_stability, 0.0);
    }

    #[test]
    fn test_parse_rejects_unknown_evaluation() {
        let json = analyzer_json(0.5).replace("POSITIVE", "MAYBE");
        let err = AnalysisResult::from_analyzer_output(json.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), "malformed_output");
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = AnalysisResult::from_analyzer_output(b"Loading models...\n").unwrap_err();
        assert!(err.is_degradable());

        let err = AnalysisResult::from_analyzer_output(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert_eq!(err.kind(), "malformed_output");
    }

    #[test]
    fn test_parse_analyzer_error_document() {
        let err = AnalysisResult::from_analyzer_output(br#"{"error": "Video file not found"}"#)
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MalformedOutput("analyzer reported error: Video file not found".into())
        );
    }

    #[test]
    fn test_fallback_values() {
        let fallback = AnalysisResult::fallback();
        assert_eq!(fallback.speech.evaluation, Evaluation::Positive);
        assert_eq!(fallback.speech.confidence, 0.87);
        assert_eq!(fallback.speech.suggestions.len(), 3);
        assert_eq!(fallback.facial.dominant_expression, "confident");
        assert!(fallback.complete);
        assert!(fallback.degraded);
    }

    #[test]
    fn test_wire_format_keys() {
        let json = serde_json::to_value(AnalysisResult::fallback()).unwrap();
        assert_eq!(json["speechAnalysis"]["evaluation"], "POSITIVE");
        assert_eq!(json["speechAnalysis"]["confidence"], 0.87);
        assert!(json["speechAnalysis"]["text"].is_string());
        assert!(json["facialAnalysis"]["dominantExpression"].is_string());
        assert!(json["facialAnalysis"].get("metrics").is_none());
        assert_eq!(json["isComplete"], true);
        assert_eq!(json["degraded"], true);
    }
}
