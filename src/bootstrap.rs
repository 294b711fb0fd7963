//! Capability acquisition: get a working conversion backend or fail fast.
//!
//! This is the `UNINITIALIZED` phase of the worker. For the markitdown
//! backend, [`markitdown_auto::ensure_markitdown`] probes the interpreter,
//! installs the package once if the import fails, and probes again exactly
//! once. Any failure here is fatal; no line is read until it succeeds.
//!
//! The probe and pip subprocesses are blocking, so they run on Tokio's
//! blocking pool.

use crate::backend::{MarkItDownConverter, NativeConverter, SharedConverter};
use crate::config::{BackendKind, WorkerConfig};
use crate::error::Doc2TextError;
use markitdown_auto::{ensure_markitdown, EnsureOptions};
use std::sync::Arc;
use tracing::info;

/// Hook invoked once, right before the backend package is installed.
///
/// Receives the pip requirement being installed.
pub type InstallNotice = Arc<dyn Fn(&str) + Send + Sync>;

/// Acquire the conversion capability selected by `config.backend`.
pub async fn acquire_backend(
    config: &WorkerConfig,
    on_install: Option<InstallNotice>,
) -> Result<SharedConverter, Doc2TextError> {
    match config.backend {
        BackendKind::Native => {
            info!("Using native text backend");
            Ok(Arc::new(NativeConverter::new()))
        }
        BackendKind::MarkItDown => {
            let options = EnsureOptions {
                python: config.resolved_python(),
                package: config.package_spec.clone(),
                auto_install: config.auto_install,
            };

            let runtime = tokio::task::spawn_blocking(move || {
                let notice = on_install.as_deref().map(|cb| cb as &dyn Fn(&str));
                ensure_markitdown(&options, notice)
            })
            .await
            .map_err(|e| Doc2TextError::Internal(format!("acquisition task failed: {e}")))??;

            info!(
                "markitdown available via {}{}",
                runtime.python.display(),
                if runtime.installed_now {
                    " (installed now)"
                } else {
                    ""
                }
            );

            Ok(Arc::new(MarkItDownConverter::from_config(
                runtime.python,
                config,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn native_backend_needs_no_acquisition() {
        let config = WorkerConfig::builder()
            .backend(BackendKind::Native)
            .build()
            .unwrap();
        let conv = acquire_backend(&config, None).await.unwrap();
        assert_eq!(conv.name(), "native");
    }

    #[tokio::test]
    async fn unlaunchable_interpreter_is_fatal() {
        let config = WorkerConfig::builder()
            .python("/nonexistent/doc2text/python")
            .build()
            .unwrap();
        let err = acquire_backend(&config, None).await.err().unwrap();
        assert!(matches!(err, Doc2TextError::BackendUnavailable { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_module_without_auto_install_is_fatal() {
        let notices = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&notices);
        let config = WorkerConfig::builder()
            .python("false")
            .auto_install(false)
            .build()
            .unwrap();

        let err = acquire_backend(
            &config,
            Some(Arc::new(move |_: &str| {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .await
        .err()
        .unwrap();

        assert!(err.to_string().contains("auto-install is disabled"));
        assert_eq!(notices.load(Ordering::SeqCst), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_install_announces_once_then_fails() {
        let notices = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&notices);
        // `false` fails the import probe and the pip install alike.
        let config = WorkerConfig::builder().python("false").build().unwrap();

        let err = acquire_backend(
            &config,
            Some(Arc::new(move |pkg: &str| {
                assert_eq!(pkg, "markitdown[all]");
                seen.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .await
        .err()
        .unwrap();

        assert!(err.to_string().contains("pip install"), "got: {err}");
        assert_eq!(notices.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn importable_module_yields_markitdown_converter() {
        // `true` succeeds at the probe, so no install happens.
        let config = WorkerConfig::builder().python("true").build().unwrap();
        let conv = acquire_backend(&config, None).await.unwrap();
        assert_eq!(conv.name(), "markitdown");
    }
}
