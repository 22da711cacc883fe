//! Analysis session state machine
//!
//! Models the presentation flow around one analysis request:
//! `Idle -> InputReady -> Analyzing -> {Complete, Failed}`, with `reset`
//! returning to `Idle` from any state.
//!
//! While analyzing, the session walks through a fixed list of stages on
//! timers. This progress is cosmetic: the analyzer reports no progress, so
//! the stages advance on their nominal durations regardless of when the
//! analysis call actually resolves.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use interview_analyzer_common::AnalysisResult;

/// Session errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// One step of the progress animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub label: String,
    /// How long the stage is displayed
    pub nominal: Duration,
}

impl Stage {
    #[must_use]
    pub fn new(label: impl Into<String>, nominal: Duration) -> Self {
        Self {
            label: label.into(),
            nominal,
        }
    }
}

/// Stage sequence shown while an analysis runs
#[must_use]
pub fn default_stages() -> Vec<Stage> {
    vec![
        Stage::new("Loading video file...", Duration::from_millis(1000)),
        Stage::new("Extracting audio from video...", Duration::from_millis(2000)),
        Stage::new("Transcribing speech...", Duration::from_millis(3000)),
        Stage::new("Analyzing speech content...", Duration::from_millis(2500)),
        Stage::new("Processing facial expressions...", Duration::from_millis(4000)),
        Stage::new("Generating feedback...", Duration::from_millis(1500)),
    ]
}

/// Session lifecycle state
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    InputReady,
    Analyzing,
    Complete(AnalysisResult),
    Failed(String),
}

impl SessionState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InputReady => "input ready",
            Self::Analyzing => "analyzing",
            Self::Complete(_) => "complete",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether no analysis is running
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Analyzing)
    }
}

/// Cosmetic progress of the stage animation
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub stage_index: usize,
    /// Label of the current stage, `None` outside the animation
    pub stage_label: Option<String>,
    /// 0.0 to 100.0
    pub percent: f64,
}

impl Progress {
    fn none() -> Self {
        Self {
            stage_index: 0,
            stage_label: None,
            percent: 0.0,
        }
    }

    fn at(stages: &[Stage], index: usize) -> Self {
        Self {
            stage_index: index,
            stage_label: stages.get(index).map(|stage| stage.label.clone()),
            percent: if stages.is_empty() {
                0.0
            } else {
                index as f64 / stages.len() as f64 * 100.0
            },
        }
    }

    fn finished(stages: &[Stage]) -> Self {
        Self {
            stage_index: stages.len(),
            stage_label: None,
            percent: 100.0,
        }
    }
}

/// Everything a renderer needs
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub state: SessionState,
    pub progress: Progress,
}

impl SessionView {
    fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            progress: Progress::none(),
        }
    }
}

/// Publishes the views of one analysis run
///
/// Aborting a task only takes effect at its next await, so a driver may still
/// publish after `reset`. Every publish checks the run against the current
/// generation under the channel lock and is dropped once the session moved on.
struct RunPublisher {
    view: Arc<watch::Sender<SessionView>>,
    generation: Arc<AtomicU64>,
    run: u64,
}

impl RunPublisher {
    /// Returns false when the run is stale and nothing was published
    fn publish(&self, next: SessionView) -> bool {
        self.view.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != self.run {
                return false;
            }
            *current = next;
            true
        })
    }
}

/// Drives one analysis request and its progress animation
pub struct AnalysisSession {
    stages: Arc<[Stage]>,
    view: Arc<watch::Sender<SessionView>>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl AnalysisSession {
    #[must_use]
    pub fn new(stages: Vec<Stage>) -> Self {
        let (sender, _) = watch::channel(SessionView::idle());
        Self {
            stages: stages.into(),
            view: Arc::new(sender),
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Current state and progress
    #[must_use]
    pub fn snapshot(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Observe every state and progress change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    /// Record that the input artifact is available, clearing any previous
    /// result or error
    pub fn mark_input_ready(&mut self) -> Result<(), SessionError> {
        let state = self.snapshot().state;
        if !state.is_settled() {
            return Err(SessionError::InvalidTransition {
                action: "mark input ready",
                state: state.name(),
            });
        }

        self.view.send_replace(SessionView {
            state: SessionState::InputReady,
            progress: Progress::none(),
        });
        Ok(())
    }

    /// Enter `Analyzing`: issue `call` and start the stage animation
    ///
    /// The session completes once both the animation has played and the
    /// call resolved; it fails as soon as the call returns an error.
    pub fn start<F, E>(&mut self, call: F) -> Result<(), SessionError>
    where
        F: Future<Output = Result<AnalysisResult, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let state = self.snapshot().state;
        if state != SessionState::InputReady {
            return Err(SessionError::InvalidTransition {
                action: "start analysis",
                state: state.name(),
            });
        }

        let run = self.advance_generation(SessionView {
            state: SessionState::Analyzing,
            progress: Progress::at(&self.stages, 0),
        });
        info!("Analysis started ({} stages)", self.stages.len());

        let publisher = RunPublisher {
            view: Arc::clone(&self.view),
            generation: Arc::clone(&self.generation),
            run,
        };
        let stages = Arc::clone(&self.stages);
        self.task = Some(tokio::spawn(drive(stages, publisher, call)));
        Ok(())
    }

    /// Cancel any running animation and return to `Idle`
    pub fn reset(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.advance_generation(SessionView::idle());
        debug!("Session reset");
    }

    /// Invalidate the current run and publish `next`, returning the new run
    fn advance_generation(&self, next: SessionView) -> u64 {
        let mut run = 0;
        self.view.send_modify(|current| {
            run = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *current = next;
        });
        run
    }

    /// Wait until no analysis is running and return the settled view
    pub async fn wait_settled(&self) -> SessionView {
        let mut receiver = self.view.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here
        let settled = receiver
            .wait_for(|view| view.state.is_settled())
            .await
            .map(|view| view.clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(default_stages())
    }
}

impl Drop for AnalysisSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn drive<F, E>(stages: Arc<[Stage]>, publisher: RunPublisher, call: F)
where
    F: Future<Output = Result<AnalysisResult, E>> + Send,
    E: Display,
{
    tokio::pin!(call);
    let mut outcome: Option<AnalysisResult> = None;

    for (index, stage) in stages.iter().enumerate() {
        let current = SessionView {
            state: SessionState::Analyzing,
            progress: Progress::at(&stages, index),
        };
        if !publisher.publish(current) {
            return;
        }
        debug!("Stage {}/{}: {}", index + 1, stages.len(), stage.label);

        let timer = tokio::time::sleep(stage.nominal);
        tokio::pin!(timer);
        loop {
            tokio::select! {
                () = &mut timer => break,
                resolved = &mut call, if outcome.is_none() => match resolved {
                    Ok(result) => outcome = Some(result),
                    Err(e) => {
                        fail(&publisher, &stages, index, &e);
                        return;
                    }
                },
            }
        }
    }

    let result = match outcome {
        Some(result) => result,
        None => match call.await {
            Ok(result) => result,
            Err(e) => {
                fail(&publisher, &stages, stages.len().saturating_sub(1), &e);
                return;
            }
        },
    };

    let degraded = result.degraded;
    let complete = SessionView {
        state: SessionState::Complete(result),
        progress: Progress::finished(&stages),
    };
    if !publisher.publish(complete) {
        debug!("Discarding result of a reset analysis");
    } else if degraded {
        warn!("Analysis complete with placeholder result");
    } else {
        info!("Analysis complete");
    }
}

fn fail(publisher: &RunPublisher, stages: &[Stage], index: usize, error: &dyn Display) {
    let failed = SessionView {
        state: SessionState::Failed(error.to_string()),
        progress: Progress::at(stages, index),
    };
    if publisher.publish(failed) {
        warn!("Analysis failed: {}", error);
    } else {
        debug!("Discarding failure of a reset analysis: {}", error);
    }
}
