//! External analyzer invocation
//!
//! The analyzer is an opaque program that receives the artifact path as its
//! last argument and prints one JSON document on stdout.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use crate::config::AnalyzerCommand;
use interview_analyzer_common::{AnalysisError, Result};

/// Default cap on analyzer stdout, which holds a single JSON document
pub const DEFAULT_MAX_STDOUT_BYTES: u64 = 16 * 1024 * 1024;

/// Cap on retained analyzer stderr; anything beyond is drained and dropped
pub const MAX_STDERR_BYTES: u64 = 64 * 1024;

/// Raw output of an analyzer run that exited successfully
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
}

/// Seam between the orchestrator and the analysis pipeline
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Run the analysis on one artifact
    ///
    /// Dropping the returned future must stop the underlying work.
    async fn invoke(&self, artifact: &Path) -> Result<AnalyzerOutput>;

    /// Best-effort check that the analyzer runtime can be launched
    async fn runtime_available(&self) -> bool;
}

/// Analyzer running as a child process
pub struct SubprocessAnalyzer {
    command: AnalyzerCommand,
    probe_timeout: Duration,
    max_stdout_bytes: u64,
}

impl SubprocessAnalyzer {
    #[must_use]
    pub fn new(command: AnalyzerCommand, probe_timeout: Duration) -> Self {
        Self {
            command,
            probe_timeout,
            max_stdout_bytes: DEFAULT_MAX_STDOUT_BYTES,
        }
    }

    /// Override the stdout cap; larger output counts as malformed
    #[must_use]
    pub fn with_max_stdout_bytes(mut self, max_stdout_bytes: u64) -> Self {
        self.max_stdout_bytes = max_stdout_bytes;
        self
    }

    fn build_command(&self, artifact: &Path) -> Command {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .arg(artifact)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group so helpers spawned by the analyzer die with it
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

#[async_trait]
impl Analyzer for SubprocessAnalyzer {
    fn name(&self) -> &str {
        &self.command.program
    }

    async fn invoke(&self, artifact: &Path) -> Result<AnalyzerOutput> {
        debug!(
            "Launching analyzer: {} {:?} {}",
            self.command.program,
            self.command.args,
            artifact.display()
        );

        let mut child = self.build_command(artifact).spawn().map_err(|e| {
            AnalysisError::AnalyzerUnavailable(format!(
                "failed to launch {}: {e}",
                self.command.program
            ))
        })?;

        // Declared after the child so the group is killed before the child drops
        let group = ProcessGroupGuard::new(child.id());
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let (stdout, stderr, status) = tokio::try_join!(
            read_stdout(stdout_pipe, self.max_stdout_bytes),
            read_stderr(stderr_pipe),
            async {
                child.wait().await.map_err(|e| {
                    AnalysisError::AnalyzerUnavailable(format!("failed to wait for analyzer: {e}"))
                })
            }
        )?;
        group.disarm();

        let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
        if !status.success() {
            return Err(AnalysisError::AnalyzerFailed {
                status: status.to_string(),
                stderr,
            });
        }

        Ok(AnalyzerOutput { stdout, stderr })
    }

    async fn runtime_available(&self) -> bool {
        let probe = Command::new(&self.command.program)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.probe_timeout, probe).await {
            Ok(Ok(output)) if output.status.success() => {
                // Some interpreters print their version on stderr
                let version = if output.stdout.is_empty() {
                    String::from_utf8_lossy(&output.stderr).trim().to_string()
                } else {
                    String::from_utf8_lossy(&output.stdout).trim().to_string()
                };
                debug!("Analyzer runtime {}: {}", self.command.program, version);
                true
            }
            Ok(Ok(output)) => {
                debug!(
                    "Analyzer runtime {} exited with {}",
                    self.command.program, output.status
                );
                false
            }
            Ok(Err(e)) => {
                debug!("Analyzer runtime {} not found: {}", self.command.program, e);
                false
            }
            Err(_) => {
                debug!(
                    "Analyzer runtime {} did not answer within {}s",
                    self.command.program,
                    self.probe_timeout.as_secs()
                );
                false
            }
        }
    }
}

fn read_error(stream: &str, e: std::io::Error) -> AnalysisError {
    AnalysisError::AnalyzerUnavailable(format!("failed to read analyzer {stream}: {e}"))
}

/// Read stdout, failing as soon as it grows past `limit`
async fn read_stdout<R: AsyncRead + Unpin>(pipe: Option<R>, limit: u64) -> Result<Vec<u8>> {
    let Some(pipe) = pipe else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::new();
    pipe.take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .await
        .map_err(|e| read_error("stdout", e))?;
    if buf.len() as u64 > limit {
        return Err(AnalysisError::MalformedOutput(format!(
            "analyzer stdout exceeds {limit} bytes"
        )));
    }
    Ok(buf)
}

/// Keep the head of stderr and drain the rest so the analyzer never blocks
async fn read_stderr<R: AsyncRead + Unpin>(pipe: Option<R>) -> Result<Vec<u8>> {
    let Some(mut pipe) = pipe else {
        return Ok(Vec::new());
    };

    let mut buf = Vec::new();
    (&mut pipe)
        .take(MAX_STDERR_BYTES)
        .read_to_end(&mut buf)
        .await
        .map_err(|e| read_error("stderr", e))?;
    tokio::io::copy(&mut pipe, &mut tokio::io::sink())
        .await
        .map_err(|e| read_error("stderr", e))?;
    Ok(buf)
}

/// Kills the child's whole process group unless disarmed
///
/// The group id stays valid until the child is reaped, which only happens
/// once `wait` completes.
struct ProcessGroupGuard {
    pid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pid }
    }

    fn disarm(mut self) {
        self.pid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pid) = self.pid.take() {
            kill_process_group(pid);
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    debug!("Terminating analyzer process group {}", pid);
    unsafe { libc::kill(-(pid as i32), libc::SIGKILL) };
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}
