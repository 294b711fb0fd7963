//! Error types for the edgequake-doc2text library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2TextError`] — **Fatal**: the worker cannot continue at all
//!   (backend could not be acquired, output stream closed, bad config).
//!   Returned as `Err(Doc2TextError)` from initialisation and from
//!   [`crate::worker::Worker::run`].
//!
//! * [`ConversionError`] — **Non-fatal**: a single path failed to convert.
//!   The loop reports it as one `Error processing <path>: <message>` line on
//!   the diagnostics stream and moves on to the next line.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2text library.
#[derive(Debug, Error)]
pub enum Doc2TextError {
    // ── Acquisition errors ───────────────────────────────────────────────
    /// The conversion backend could not be made available.
    #[error("Conversion backend '{backend}' is unavailable: {reason}")]
    BackendUnavailable {
        backend: String,
        reason: String,
        #[source]
        source: Option<markitdown_auto::MarkItDownAutoError>,
    },

    /// [`crate::worker::Worker::run`] was called before a backend was acquired.
    #[error("Worker is not initialised; acquire a conversion backend first")]
    NotInitialized,

    // ── Stream errors ────────────────────────────────────────────────────
    /// Reading the input or writing records / diagnostics failed.
    #[error("{stream} stream error: {source}")]
    Stream {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Doc2TextError {
    pub(crate) fn input(source: std::io::Error) -> Self {
        Self::Stream {
            stream: "input",
            source,
        }
    }

    pub(crate) fn output(source: std::io::Error) -> Self {
        Self::Stream {
            stream: "output",
            source,
        }
    }

    pub(crate) fn diagnostics(source: std::io::Error) -> Self {
        Self::Stream {
            stream: "diagnostics",
            source,
        }
    }
}

impl From<markitdown_auto::MarkItDownAutoError> for Doc2TextError {
    fn from(e: markitdown_auto::MarkItDownAutoError) -> Self {
        use markitdown_auto::MarkItDownAutoError as E;

        // The full message travels as the source; keep the reason short so
        // an error chain does not print it twice.
        let reason = match &e {
            E::Launch { .. } => "Python interpreter could not be started",
            E::Install { .. } => "pip install failed",
            E::StillMissing { .. } => "module still missing after install",
            E::NotInstalled { .. } => "module not installed and auto-install is disabled",
        };
        Self::BackendUnavailable {
            backend: "markitdown".to_string(),
            reason: reason.to_string(),
            source: Some(e),
        }
    }
}

/// A non-fatal error for a single path.
///
/// The `Display` text is the `<message>` part of the failure record; the
/// path itself is added by the worker, so messages here never repeat it.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Nothing exists at the path.
    #[error("No such file or directory")]
    NotFound { path: PathBuf },

    /// The file exists but cannot be opened.
    #[error("Permission denied")]
    PermissionDenied { path: PathBuf },

    /// Any other read failure.
    #[error("{source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backend does not handle this kind of file.
    #[error("Unsupported format '{format}'")]
    Unsupported { path: PathBuf, format: String },

    /// Text-like content that is not valid UTF-8.
    #[error("Content is not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },

    /// The backend process could not be started.
    #[error("Failed to launch {backend}: {source}")]
    Launch {
        backend: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend ran and reported a failure.
    #[error("{detail}")]
    Backend {
        backend: String,
        status: Option<i32>,
        detail: String,
    },
}

impl ConversionError {
    /// Map an I/O error from opening or reading `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            _ => Self::Unreadable { path, source },
        }
    }
}
