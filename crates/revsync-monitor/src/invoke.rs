//! How the reporter runs the ingestion: in-process, or as a child process
//! that reports its row count on standard output.
//!
//! Both modes converge on the same `(rows_loaded, error)` shape so the
//! reporter does not care which one ran.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;

use anyhow::anyhow;
use async_trait::async_trait;
use regex::Regex;
use revsync_core::AppConfig;
use revsync_ingest::run_configured_ingestion;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};

/// Stderr lines from a failed subprocess kept as its error detail.
const STDERR_TAIL_LINES: usize = 20;

static ROWS_LOADED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ROWS_LOADED=(\d+)").expect("valid ROWS_LOADED regex"));

/// A failed invocation and the rows-loaded value known when it failed.
#[derive(Debug)]
pub struct InvokeFailure {
    pub rows_loaded: u64,
    pub error: anyhow::Error,
}

#[async_trait]
pub trait IngestInvoker: Send + Sync {
    /// Runs one ingestion and returns the rows it loaded.
    async fn invoke(&self) -> Result<u64, InvokeFailure>;
}

/// Calls the ingestion chain directly in this process.
pub struct EmbeddedInvoker {
    config: AppConfig,
}

impl EmbeddedInvoker {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl IngestInvoker for EmbeddedInvoker {
    async fn invoke(&self) -> Result<u64, InvokeFailure> {
        match run_configured_ingestion(&self.config).await {
            Ok(summary) => Ok(summary.rows_loaded),
            Err(failure) => Err(InvokeFailure {
                rows_loaded: failure.rows_loaded,
                error: anyhow::Error::new(failure),
            }),
        }
    }
}

/// Runs `program args…` and reads `ROWS_LOADED=<n>` from its stdout.
///
/// The child's stderr is relayed line by line so its logs reach the
/// operator, and the last lines are kept as the failure detail. A non-zero
/// exit status is a failure; the row count is still taken from stdout when
/// present.
pub struct SubprocessInvoker {
    program: PathBuf,
    args: Vec<String>,
}

impl SubprocessInvoker {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Re-invokes the running binary as `<exe> ingest`.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if the current executable path is unknown.
    pub fn current_exe() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?, vec!["ingest".to_owned()]))
    }
}

#[async_trait]
impl IngestInvoker for SubprocessInvoker {
    async fn invoke(&self) -> Result<u64, InvokeFailure> {
        tracing::debug!(program = %self.program.display(), args = ?self.args, "spawning ingest subprocess");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| InvokeFailure {
                rows_loaded: 0,
                error: anyhow::Error::new(e)
                    .context(format!("failed to run {}", self.program.display())),
            })?;

        let relay = tokio::spawn(relay_stderr(child.stderr.take()));
        let output = child.wait_with_output().await.map_err(|e| InvokeFailure {
            rows_loaded: 0,
            error: anyhow::Error::new(e)
                .context(format!("failed to wait for {}", self.program.display())),
        })?;
        let stderr_tail = relay.await.unwrap_or_default();

        let stdout = String::from_utf8_lossy(&output.stdout);
        let rows_loaded = parse_rows_loaded(&stdout);

        if output.status.success() {
            if rows_loaded.is_none() {
                tracing::warn!("ingest subprocess succeeded without a ROWS_LOADED line");
            }
            return Ok(rows_loaded.unwrap_or(0));
        }

        let exited = format!(
            "ingest subprocess {} exited with {}",
            self.program.display(),
            output.status
        );
        let error = if stderr_tail.is_empty() {
            anyhow!(exited)
        } else {
            anyhow!(stderr_tail.join("\n")).context(exited)
        };
        Err(InvokeFailure {
            rows_loaded: rows_loaded.unwrap_or(0),
            error,
        })
    }
}

/// Echoes the child's stderr to ours and returns its last
/// [`STDERR_TAIL_LINES`] lines.
async fn relay_stderr(stderr: Option<ChildStderr>) -> Vec<String> {
    let Some(stderr) = stderr else {
        return Vec::new();
    };
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    while let Ok(Some(line)) = lines.next_line().await {
        eprintln!("{line}");
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into()
}

/// Stands in when the real invoker could not be built, so the run is still
/// recorded as a failure.
pub struct UnavailableInvoker {
    reason: String,
}

impl UnavailableInvoker {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl IngestInvoker for UnavailableInvoker {
    async fn invoke(&self) -> Result<u64, InvokeFailure> {
        Err(InvokeFailure {
            rows_loaded: 0,
            error: anyhow!(self.reason.clone()),
        })
    }
}

/// The last `ROWS_LOADED=<n>` value in `stdout`, if any.
#[must_use]
pub fn parse_rows_loaded(stdout: &str) -> Option<u64> {
    ROWS_LOADED_RE
        .captures_iter(stdout)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .last()
}
