//! Noise suppression for the conversion backend.
//!
//! The backend (a Python library) is chatty: deprecation warnings, progress
//! logging, tracebacks. Only converted text and one failure line per bad path
//! should be observable, so two things are silenced:
//!
//! * **Warnings** — `PYTHONWARNINGS=ignore` is set once for the whole process
//!   at startup and again explicitly on every backend child.
//! * **Backend stderr** — redirected per child according to [`StderrPolicy`].
//!   The worker's own stderr is never replaced; the redirection is scoped to
//!   the child process that produced the noise.
//!
//! The default policy is [`StderrPolicy::Capture`]: noise from a successful
//! conversion is thrown away, while a failing conversion's last stderr line
//! becomes the message of its failure record. [`StderrPolicy::Discard`] drops
//! backend diagnostics entirely, which also hides the reason for failures.

use serde::{Deserialize, Serialize};
use std::process::Stdio;

/// Environment variable controlling Python's warning filter.
pub const WARNINGS_ENV: &str = "PYTHONWARNINGS";

/// Value that disables every Python warning.
pub const WARNINGS_VALUE: &str = "ignore";

/// Longest failure message taken from backend stderr, in characters.
const MAX_DETAIL_CHARS: usize = 400;

/// What happens to a backend child's stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StderrPolicy {
    /// Send to the null device; failures carry only the exit status.
    Discard,
    /// Pipe and keep; summarised into the failure message, dropped on success.
    #[default]
    Capture,
    /// Pass through to the worker's own stderr unchanged.
    Inherit,
}

impl StderrPolicy {
    /// The `Stdio` to hand to `Command::stderr`.
    pub fn stdio(self) -> Stdio {
        match self {
            StderrPolicy::Discard => Stdio::null(),
            StderrPolicy::Capture => Stdio::piped(),
            StderrPolicy::Inherit => Stdio::inherit(),
        }
    }
}

/// Set `PYTHONWARNINGS=ignore` for this process and everything it spawns.
///
/// Call before starting any threads (the binary does this first thing in
/// `main`, before building the runtime).
pub fn suppress_library_warnings() {
    std::env::set_var(WARNINGS_ENV, WARNINGS_VALUE);
}

/// Reduce a captured stderr buffer to a single-line failure reason.
///
/// Python prints the exception as the last line of a traceback
/// (`FileNotFoundError: ...`), so the last non-blank line is kept and
/// truncated to a sane length.
pub fn summarize_stderr(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    let line = text.lines().rev().map(str::trim).find(|l| !l.is_empty())?;

    if line.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = line.chars().take(MAX_DETAIL_CHARS - 1).collect();
        Some(format!("{cut}\u{2026}"))
    } else {
        Some(line.to_string())
    }
}
