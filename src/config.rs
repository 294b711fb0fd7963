//! Configuration for the line conversion worker.
//!
//! All worker behaviour is controlled through [`WorkerConfig`], built via
//! its [`WorkerConfigBuilder`]. The builder lets callers set only what they
//! care about and rely on documented defaults for the rest.

use crate::error::Doc2TextError;
use crate::progress::ProgressCallback;
use crate::silence::StderrPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default record sentinel: a single NUL byte.
pub const DEFAULT_SEPARATOR: u8 = 0x00;

/// Configuration for a [`crate::worker::Worker`].
///
/// # Example
/// ```rust
/// use edgequake_doc2text::{BackendKind, WorkerConfig};
///
/// let config = WorkerConfig::builder()
///     .backend(BackendKind::Native)
///     .skip_blank_lines(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.record_separator, 0);
/// ```
#[derive(Clone)]
pub struct WorkerConfig {
    /// Which conversion capability to acquire. Default: markitdown.
    pub backend: BackendKind,

    /// Python interpreter for the markitdown backend.
    ///
    /// `None` defers to `MARKITDOWN_PYTHON`, then `python3`.
    pub python: Option<PathBuf>,

    /// pip requirement installed when markitdown is missing. Default: `markitdown[all]`.
    pub package_spec: String,

    /// Allow the one-time `pip install` during acquisition. Default: true.
    pub auto_install: bool,

    /// Byte written after every converted record. Default: `0x00`.
    pub record_separator: u8,

    /// Skip lines that are empty after trimming. Default: true.
    ///
    /// When `false`, a blank line is handed to the backend like any other
    /// path, which normally produces a failure record.
    pub skip_blank_lines: bool,

    /// Fate of the backend child's stderr. Default: [`StderrPolicy::Capture`].
    pub backend_stderr: StderrPolicy,

    /// Export `PYTHONWARNINGS=ignore` to backend children. Default: true.
    pub suppress_warnings: bool,

    /// Per-record event hook. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            python: None,
            package_spec: markitdown_auto::MARKITDOWN_PACKAGE.to_string(),
            auto_install: true,
            record_separator: DEFAULT_SEPARATOR,
            skip_blank_lines: true,
            backend_stderr: StderrPolicy::default(),
            suppress_warnings: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("backend", &self.backend)
            .field("python", &self.python)
            .field("package_spec", &self.package_spec)
            .field("auto_install", &self.auto_install)
            .field("record_separator", &self.record_separator)
            .field("skip_blank_lines", &self.skip_blank_lines)
            .field("backend_stderr", &self.backend_stderr)
            .field("suppress_warnings", &self.suppress_warnings)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn WorkerProgressCallback>"),
            )
            .finish()
    }
}

impl WorkerConfig {
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The interpreter that acquisition and conversion will actually use.
    pub fn resolved_python(&self) -> PathBuf {
        self.python
            .clone()
            .unwrap_or_else(markitdown_auto::default_python)
    }
}

#[derive(Debug)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn python(mut self, python: impl Into<PathBuf>) -> Self {
        self.config.python = Some(python.into());
        self
    }

    pub fn package_spec(mut self, spec: impl Into<String>) -> Self {
        self.config.package_spec = spec.into();
        self
    }

    pub fn auto_install(mut self, v: bool) -> Self {
        self.config.auto_install = v;
        self
    }

    pub fn record_separator(mut self, byte: u8) -> Self {
        self.config.record_separator = byte;
        self
    }

    pub fn skip_blank_lines(mut self, v: bool) -> Self {
        self.config.skip_blank_lines = v;
        self
    }

    pub fn backend_stderr(mut self, policy: StderrPolicy) -> Self {
        self.config.backend_stderr = policy;
        self
    }

    pub fn suppress_warnings(mut self, v: bool) -> Self {
        self.config.suppress_warnings = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn build(self) -> Result<WorkerConfig, Doc2TextError> {
        let c = &self.config;
        if c.package_spec.trim().is_empty() {
            return Err(Doc2TextError::InvalidConfig(
                "package spec must not be empty".into(),
            ));
        }
        if c.record_separator == b'\n' {
            return Err(Doc2TextError::InvalidConfig(
                "record separator must not be a newline".into(),
            ));
        }
        if matches!(&c.python, Some(p) if p.as_os_str().is_empty()) {
            return Err(Doc2TextError::InvalidConfig(
                "python interpreter path must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Conversion capability selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The markitdown Python package, run as a subprocess per path.
    #[default]
    MarkItDown,
    /// Built-in reader for text formats; no external dependency.
    Native,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::MarkItDown => "markitdown",
            BackendKind::Native => "native",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_worker_contract() {
        let c = WorkerConfig::default();
        assert_eq!(c.backend, BackendKind::MarkItDown);
        assert_eq!(c.record_separator, 0);
        assert_eq!(c.package_spec, "markitdown[all]");
        assert!(c.auto_install);
        assert!(c.skip_blank_lines);
        assert!(c.suppress_warnings);
        assert_eq!(c.backend_stderr, StderrPolicy::Capture);
    }

    #[test]
    fn builder_rejects_empty_package() {
        let err = WorkerConfig::builder().package_spec("  ").build().unwrap_err();
        assert!(err.to_string().contains("package spec"));
    }

    #[test]
    fn builder_rejects_newline_separator() {
        let err = WorkerConfig::builder()
            .record_separator(b'\n')
            .build()
            .unwrap_err();
        assert!(matches!(err, Doc2TextError::InvalidConfig(_)));
    }

    #[test]
    fn explicit_python_wins() {
        let c = WorkerConfig::builder()
            .python("/opt/py/bin/python")
            .build()
            .unwrap();
        assert_eq!(c.resolved_python(), PathBuf::from("/opt/py/bin/python"));
    }

    #[test]
    fn debug_hides_callback() {
        let c = WorkerConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn WorkerProgressCallback>"));
    }

    #[test]
    fn backend_kind_names() {
        assert_eq!(BackendKind::MarkItDown.to_string(), "markitdown");
        assert_eq!(
            serde_json::to_string(&BackendKind::Native).unwrap(),
            "\"native\""
        );
    }
}
