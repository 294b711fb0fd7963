//! markitdown backend: one `python -m markitdown` child per path.
//!
//! A fresh child per request keeps the worker single-threaded and makes a
//! crash in the Python library a per-item failure instead of a fatal one.
//! The child's stdin is closed, stdout is the converted text, and stderr
//! follows the configured [`StderrPolicy`].

use super::Converter;
use crate::config::WorkerConfig;
use crate::error::ConversionError;
use crate::silence::{self, StderrPolicy};
use futures::future::{BoxFuture, FutureExt};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const BACKEND_NAME: &str = "markitdown";

/// Converts files by invoking the markitdown module with a Python interpreter.
#[derive(Debug, Clone)]
pub struct MarkItDownConverter {
    python: PathBuf,
    stderr: StderrPolicy,
    suppress_warnings: bool,
}

impl MarkItDownConverter {
    /// A converter using `python`, capturing stderr, with warnings suppressed.
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            stderr: StderrPolicy::default(),
            suppress_warnings: true,
        }
    }

    /// A converter for an interpreter already known to import markitdown.
    pub fn from_config(python: impl Into<PathBuf>, config: &WorkerConfig) -> Self {
        Self::new(python)
            .with_stderr(config.backend_stderr)
            .with_warnings_suppressed(config.suppress_warnings)
    }

    pub fn with_stderr(mut self, policy: StderrPolicy) -> Self {
        self.stderr = policy;
        self
    }

    pub fn with_warnings_suppressed(mut self, v: bool) -> Self {
        self.suppress_warnings = v;
        self
    }

    pub fn python(&self) -> &Path {
        &self.python
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.python);
        // `--` keeps paths that start with a dash from being read as flags.
        cmd.args(["-m", markitdown_auto::MARKITDOWN_MODULE, "--"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(self.stderr.stdio())
            .kill_on_drop(true);
        if self.suppress_warnings {
            cmd.env(silence::WARNINGS_ENV, silence::WARNINGS_VALUE);
        }
        cmd
    }

    async fn run(&self, path: &Path) -> Result<String, ConversionError> {
        let output = self
            .command(path)
            .output()
            .await
            .map_err(|source| ConversionError::Launch {
                backend: BACKEND_NAME.to_string(),
                source,
            })?;

        if output.status.success() {
            debug!(
                "markitdown converted {} ({} bytes)",
                path.display(),
                output.stdout.len()
            );
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let status = output.status.code();
        let detail = silence::summarize_stderr(&output.stderr).unwrap_or_else(|| match status {
            Some(code) => format!("{BACKEND_NAME} exited with code {code}"),
            None => format!("{BACKEND_NAME} was terminated by a signal"),
        });

        Err(ConversionError::Backend {
            backend: BACKEND_NAME.to_string(),
            status,
            detail,
        })
    }
}

impl Converter for MarkItDownConverter {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn convert<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, ConversionError>> {
        self.run(path).boxed()
    }
}
