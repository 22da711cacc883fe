//! Plain-text rendering of progress, results and readiness

use std::fmt::Write as _;

use interview_analyzer_common::{AnalysisResult, Evaluation};
use interview_analyzer_orchestrator::Readiness;
use interview_analyzer_session::Progress;

/// One progress line, e.g. `[2/6]  17% Extracting audio from video...`
#[must_use]
pub fn format_progress(progress: &Progress, total_stages: usize) -> String {
    let label = progress.stage_label.as_deref().unwrap_or("Finishing...");
    format!(
        "[{}/{}] {:>3.0}% {}",
        (progress.stage_index + 1).min(total_stages),
        total_stages,
        progress.percent,
        label
    )
}

fn evaluation_label(evaluation: Evaluation) -> &'static str {
    match evaluation {
        Evaluation::Positive => "POSITIVE",
        Evaluation::Negative => "NEGATIVE",
        _ => "UNKNOWN",
    }
}

/// Full feedback report for a completed analysis
#[must_use]
pub fn format_result(result: &AnalysisResult) -> String {
    let mut out = String::new();

    if result.degraded {
        out.push_str(
            "NOTE: The analyzer could not produce a result. \
             The feedback below is placeholder data, not an analysis of your answer.\n\n",
        );
    }

    let speech = &result.speech;
    let _ = writeln!(out, "Speech Analysis");
    let _ = writeln!(out, "  Transcript: {}", speech.transcript);
    let _ = writeln!(
        out,
        "  Evaluation: {} ({:.0}% confidence)",
        evaluation_label(speech.evaluation),
        speech.confidence * 100.0
    );
    let _ = writeln!(out, "  Feedback:   {}", speech.feedback);
    if !speech.suggestions.is_empty() {
        let _ = writeln!(out, "  Suggestions:");
        for suggestion in &speech.suggestions {
            let _ = writeln!(out, "    - {suggestion}");
        }
    }

    let facial = &result.facial;
    let _ = writeln!(out);
    let _ = writeln!(out, "Facial Expression Analysis");
    let _ = writeln!(out, "  Dominant expression: {}", facial.dominant_expression);
    let _ = writeln!(out, "  Feedback: {}", facial.feedback);
    if let Some(metrics) = &facial.metrics {
        let _ = writeln!(
            out,
            "  Face visibility {:.0}%, eye contact {:.0}%, stability {:.0}%",
            metrics.face_visibility, metrics.eye_contact, metrics.facial_stability
        );
    }

    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[must_use]
pub fn format_readiness(readiness: &Readiness) -> String {
    format!(
        "Analyzer runtime available: {}\nInput artifact present:     {}",
        yes_no(readiness.analyzer_runtime_available),
        yes_no(readiness.input_artifact_present)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_progress() {
        let progress = Progress {
            stage_index: 1,
            stage_label: Some("Extracting audio from video...".to_string()),
            percent: 100.0 / 6.0,
        };
        assert_eq!(
            format_progress(&progress, 6),
            "[2/6]  17% Extracting audio from video..."
        );
    }

    #[test]
    fn test_format_progress_after_last_stage() {
        let progress = Progress {
            stage_index: 6,
            stage_label: None,
            percent: 100.0,
        };
        assert_eq!(format_progress(&progress, 6), "[6/6] 100% Finishing...");
    }

    #[test]
    fn test_format_degraded_result_has_notice() {
        let report = format_result(&AnalysisResult::fallback());
        assert!(report.starts_with("NOTE:"));
        assert!(report.contains("POSITIVE (87% confidence)"));
        assert!(report.contains("Dominant expression: confident"));
    }

    #[test]
    fn test_format_real_result_has_no_notice() {
        let mut result = AnalysisResult::fallback();
        result.degraded = false;
        result.speech.suggestions.clear();

        let report = format_result(&result);
        assert!(!report.contains("NOTE:"));
        assert!(!report.contains("Suggestions:"));
    }

    #[test]
    fn test_format_readiness() {
        let readiness = Readiness {
            analyzer_runtime_available: true,
            input_artifact_present: false,
        };
        let text = format_readiness(&readiness);
        assert!(text.contains("Analyzer runtime available: yes"));
        assert!(text.contains("Input artifact present:     no"));
    }
}
