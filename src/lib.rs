//! # edgequake-doc2text
//!
//! Stream documents to text: newline-delimited paths in, NUL-delimited text
//! out.
//!
//! ## Why this crate?
//!
//! Document conversion libraries are heavy, slow to start and noisy. Callers
//! that need text from many files want one long-lived process they can feed
//! paths to and read results from, with a framing that survives arbitrary
//! content. This crate is that process: it owns startup (making sure the
//! backend exists, installing it once if not), silences the backend, and
//! turns every input line into exactly one record or exactly one error line.
//!
//! ## Protocol
//!
//! ```text
//! stdin   report.pdf\n  notes.md\n  missing.docx\n
//!            │            │            │
//! stdout  <text>\0     <text>\0        ·
//! stderr     ·            ·         Error processing missing.docx: <reason>\n
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! UNINITIALIZED ── acquire backend (probe → pip install → probe) ──▶ RUNNING
//! RUNNING ── one line at a time until end-of-stream ──▶ exit
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2text::{BackendKind, Worker, WorkerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkerConfig::builder().backend(BackendKind::MarkItDown).build()?;
//!     let mut worker = Worker::new(config);
//!     worker.initialize(None).await?;
//!
//!     let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//!     let stats = worker
//!         .run(stdin, &mut tokio::io::stdout(), &mut tokio::io::stderr())
//!         .await?;
//!     eprintln!("{} converted, {} failed", stats.converted, stats.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2text` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod progress;
pub mod silence;
pub mod worker;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{Converter, MarkItDownConverter, NativeConverter, SharedConverter};
pub use bootstrap::{acquire_backend, InstallNotice};
pub use config::{BackendKind, WorkerConfig, WorkerConfigBuilder, DEFAULT_SEPARATOR};
pub use error::{ConversionError, Doc2TextError};
pub use progress::{NoopProgressCallback, ProgressCallback, WorkerProgressCallback};
pub use silence::{suppress_library_warnings, StderrPolicy};
pub use worker::{process_line, LineOutcome, Worker, WorkerState, WorkerStats};
