//! Conversion backends: the `path → text` capability behind the worker.
//!
//! The worker treats a backend as an opaque black box: given a path it either
//! returns text or fails with a [`ConversionError`]. Nothing about the file is
//! validated up front; existence, permissions and format are the backend's
//! business.
//!
//! ## Implementations
//!
//! 1. [`markitdown`] — runs the markitdown Python package as a child process
//!    per path. Handles PDF, Office, EPUB, HTML and more. Requires the package
//!    to be importable, which [`crate::bootstrap`] guarantees before use.
//! 2. [`native`] — a dependency-free reader for text formats (Markdown, plain
//!    text, HTML, source code, `.gz` of those). Useful where Python is not an
//!    option and in tests.

pub mod markitdown;
pub mod native;

pub use markitdown::MarkItDownConverter;
pub use native::NativeConverter;

use crate::error::ConversionError;
use futures::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;

/// A document-to-text conversion capability.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// behind an [`Arc`] for the lifetime of the worker.
pub trait Converter: Send + Sync {
    /// Short backend name used in logs and progress events.
    fn name(&self) -> &str;

    /// Convert the file at `path` to text.
    fn convert<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, ConversionError>>;
}

/// Convenience alias for the shared capability held by the worker.
pub type SharedConverter = Arc<dyn Converter>;
