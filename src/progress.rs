//! Progress-callback trait for per-record worker events.
//!
//! Inject an [`Arc<dyn WorkerProgressCallback>`] via
//! [`crate::config::WorkerConfigBuilder::progress_callback`] to observe the
//! loop without touching its output streams: forward events to metrics, a
//! log, or a supervising process.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2text::{WorkerConfig, WorkerProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failed: AtomicUsize,
//! }
//!
//! impl WorkerProgressCallback for CountingCallback {
//!     fn on_record_error(&self, _line_no: usize, _path: &str, _error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = WorkerConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { failed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::worker::WorkerStats;
use std::sync::Arc;

/// Called by the worker as it processes each input line.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive strictly in input order.
pub trait WorkerProgressCallback: Send + Sync {
    /// Called once, after acquisition, before the first line is read.
    ///
    /// # Arguments
    /// * `backend` — name of the conversion capability in use
    fn on_worker_start(&self, backend: &str) {
        let _ = backend;
    }

    /// Called just before a path is handed to the backend.
    ///
    /// # Arguments
    /// * `line_no` — 1-indexed input line number
    /// * `path`    — trimmed path from that line
    fn on_record_start(&self, line_no: usize, path: &str) {
        let _ = (line_no, path);
    }

    /// Called after a record (text + sentinel) has been written and flushed.
    ///
    /// # Arguments
    /// * `text_len` — byte length of the converted text, sentinel excluded
    fn on_record_complete(&self, line_no: usize, path: &str, text_len: usize) {
        let _ = (line_no, path, text_len);
    }

    /// Called after a failure line has been written and flushed.
    fn on_record_error(&self, line_no: usize, path: &str, error: &str) {
        let _ = (line_no, path, error);
    }

    /// Called once when the input reaches end-of-stream.
    fn on_worker_complete(&self, stats: &WorkerStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl WorkerProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::WorkerConfig`].
pub type ProgressCallback = Arc<dyn WorkerProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        bytes: AtomicUsize,
    }

    impl WorkerProgressCallback for TrackingCallback {
        fn on_record_start(&self, _line_no: usize, _path: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_record_complete(&self, _line_no: usize, _path: &str, text_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.bytes.fetch_add(text_len, Ordering::SeqCst);
        }

        fn on_record_error(&self, _line_no: usize, _path: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_worker_start("native");
        cb.on_record_start(1, "a.md");
        cb.on_record_complete(1, "a.md", 42);
        cb.on_record_error(2, "b.pdf", "boom");
        cb.on_worker_complete(&WorkerStats::default());
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            bytes: AtomicUsize::new(0),
        };

        tracker.on_record_start(1, "a.md");
        tracker.on_record_complete(1, "a.md", 100);
        tracker.on_record_start(2, "b.md");
        tracker.on_record_complete(2, "b.md", 20);
        tracker.on_record_start(3, "c.pdf");
        tracker.on_record_error(3, "c.pdf", "unsupported");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.bytes.load(Ordering::SeqCst), 120);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_worker_start("markitdown");
        cb.on_record_complete(1, "x.docx", 512);
    }
}
