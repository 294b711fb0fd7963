//! The line conversion loop.
//!
//! ```text
//! UNINITIALIZED ──initialize()──▶ RUNNING ──run()──▶ (end of input)
//! ```
//!
//! A [`Worker`] starts `Uninitialized` and becomes `Running` exactly once,
//! when a conversion backend has been acquired (or injected). [`Worker::run`]
//! then reads newline-delimited paths until end-of-stream. Each path yields
//! either one record on the output stream (`<text><separator>`) or one line
//! on the diagnostics stream (`Error processing <path>: <message>`), never
//! both, and both streams are flushed after every write so a downstream
//! reader sees each record as soon as it exists.
//!
//! Lines are handled strictly one at a time: the next line is not read until
//! the current conversion has finished and its output has been flushed.

use crate::backend::{Converter, SharedConverter};
use crate::bootstrap::{acquire_backend, InstallNotice};
use crate::config::WorkerConfig;
use crate::error::Doc2TextError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Lifecycle of a [`Worker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// No conversion backend yet.
    Uninitialized,
    /// Backend acquired; lines can be processed.
    Running,
}

/// Counters for one [`Worker::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Lines consumed from the input, blank ones included.
    pub lines_read: usize,
    /// Records written to the output stream.
    pub converted: usize,
    /// Failure lines written to the diagnostics stream.
    pub failed: usize,
    /// Blank lines skipped without output.
    pub skipped: usize,
    /// Output bytes including separators.
    pub bytes_written: u64,
    pub duration_ms: u64,
}

/// What happened to a single input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Skipped,
    Converted { text_len: usize },
    Failed,
}

/// Reads paths, converts them, writes records.
pub struct Worker {
    config: WorkerConfig,
    state: WorkerState,
    converter: Option<SharedConverter>,
}

impl Worker {
    /// A worker that still has to acquire its backend via [`Worker::initialize`].
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            state: WorkerState::Uninitialized,
            converter: None,
        }
    }

    /// A worker around an already-available capability; starts `Running`.
    pub fn with_converter(config: WorkerConfig, converter: SharedConverter) -> Self {
        Self {
            config,
            state: WorkerState::Running,
            converter: Some(converter),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Name of the acquired backend, if any.
    pub fn backend_name(&self) -> Option<&str> {
        self.converter.as_deref().map(|c| c.name())
    }

    /// Acquire the configured backend and move to `Running`.
    ///
    /// Calling this on a running worker is a no-op.
    pub async fn initialize(&mut self, on_install: Option<InstallNotice>) -> Result<(), Doc2TextError> {
        if self.state == WorkerState::Running {
            return Ok(());
        }

        let converter = acquire_backend(&self.config, on_install).await?;
        self.converter = Some(converter);
        self.state = WorkerState::Running;
        Ok(())
    }

    /// Process `input` until end-of-stream.
    ///
    /// Per-path failures are reported on `diagnostics` and do not stop the
    /// loop. Errors reading `input` or writing either stream are fatal.
    pub async fn run<R, W, E>(
        &self,
        mut input: R,
        output: &mut W,
        diagnostics: &mut E,
    ) -> Result<WorkerStats, Doc2TextError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let converter = match (&self.state, &self.converter) {
            (WorkerState::Running, Some(c)) => c.as_ref(),
            _ => return Err(Doc2TextError::NotInitialized),
        };

        let started = Instant::now();
        let progress = self.config.progress_callback.as_deref();
        if let Some(cb) = progress {
            cb.on_worker_start(converter.name());
        }
        info!("Worker running with '{}' backend", converter.name());

        let mut stats = WorkerStats::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            let n = input
                .read_until(b'\n', &mut line)
                .await
                .map_err(Doc2TextError::input)?;
            if n == 0 {
                break;
            }
            stats.lines_read += 1;

            let outcome = process_line(
                converter,
                &self.config,
                stats.lines_read,
                &line,
                output,
                diagnostics,
            )
            .await?;

            match outcome {
                LineOutcome::Skipped => stats.skipped += 1,
                LineOutcome::Converted { text_len } => {
                    stats.converted += 1;
                    stats.bytes_written += text_len as u64 + 1;
                }
                LineOutcome::Failed => stats.failed += 1,
            }
        }

        stats.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Input closed: {} lines, {} converted, {} failed, {} skipped",
            stats.lines_read, stats.converted, stats.failed, stats.skipped
        );
        if let Some(cb) = progress {
            cb.on_worker_complete(&stats);
        }

        Ok(stats)
    }
}

/// Handle one raw input line (newline included, if any).
///
/// Trailing ASCII whitespace is trimmed. A blank result is skipped when the
/// config says so; anything else is converted and produces exactly one
/// record or exactly one failure line.
pub async fn process_line<W, E>(
    converter: &dyn Converter,
    config: &WorkerConfig,
    line_no: usize,
    raw: &[u8],
    output: &mut W,
    diagnostics: &mut E,
) -> Result<LineOutcome, Doc2TextError>
where
    W: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let trimmed = raw.trim_ascii_end();
    if trimmed.is_empty() && config.skip_blank_lines {
        return Ok(LineOutcome::Skipped);
    }

    let shown = String::from_utf8_lossy(trimmed);
    if std::str::from_utf8(trimmed).is_err() {
        warn!("Line {line_no} is not valid UTF-8; reporting it as '{shown}'");
    }
    let path = path_from_bytes(trimmed);
    let progress = config.progress_callback.as_deref();

    if let Some(cb) = progress {
        cb.on_record_start(line_no, &shown);
    }

    match converter.convert(&path).await {
        Ok(text) => {
            output
                .write_all(text.as_bytes())
                .await
                .map_err(Doc2TextError::output)?;
            output
                .write_all(&[config.record_separator])
                .await
                .map_err(Doc2TextError::output)?;
            output.flush().await.map_err(Doc2TextError::output)?;

            debug!("Line {line_no}: converted '{shown}' ({} bytes)", text.len());
            if let Some(cb) = progress {
                cb.on_record_complete(line_no, &shown, text.len());
            }
            Ok(LineOutcome::Converted {
                text_len: text.len(),
            })
        }
        Err(e) => {
            let message = e.to_string();
            diagnostics
                .write_all(format!("Error processing {shown}: {message}\n").as_bytes())
                .await
                .map_err(Doc2TextError::diagnostics)?;
            diagnostics
                .flush()
                .await
                .map_err(Doc2TextError::diagnostics)?;

            debug!("Line {line_no}: failed '{shown}': {message}");
            if let Some(cb) = progress {
                cb.on_record_error(line_no, &shown, &message);
            }
            Ok(LineOutcome::Failed)
        }
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
