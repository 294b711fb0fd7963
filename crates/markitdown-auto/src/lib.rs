//! # markitdown-auto
//!
//! Make sure the [markitdown](https://github.com/microsoft/markitdown) Python
//! package is importable before anything tries to use it, installing it with
//! `pip` on first use.
//!
//! ## How it works
//!
//! On a call to [`ensure_markitdown`]:
//!
//! 1. Runs `<python> -c "import markitdown"` to probe the interpreter.
//! 2. If the import fails, runs `<python> -m pip install markitdown[all] --quiet`.
//! 3. Probes exactly once more. If the module is still missing the call fails;
//!    there is no second install attempt.
//!
//! The resolved interpreter is remembered for the rest of the process, so
//! later calls with the same interpreter skip the subprocesses entirely.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use markitdown_auto::{ensure_markitdown, EnsureOptions};
//!
//! let runtime = ensure_markitdown(&EnsureOptions::default(), Some(&|package| {
//!     eprintln!("installing {package}");
//! }))
//! .expect("markitdown unavailable");
//! println!("using {}", runtime.python.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `MARKITDOWN_PYTHON` — interpreter to probe and install into.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// The pip requirement installed when the module is missing.
pub const MARKITDOWN_PACKAGE: &str = "markitdown[all]";

/// Python module name used for the import probe.
pub const MARKITDOWN_MODULE: &str = "markitdown";

/// Environment variable naming the Python interpreter.
pub const PYTHON_ENV: &str = "MARKITDOWN_PYTHON";

/// Line announced on the diagnostics stream before installing.
pub const INSTALL_NOTICE: &str = "markitdown module not found. Installing...";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by markitdown-auto operations.
#[derive(Error, Debug)]
pub enum MarkItDownAutoError {
    /// The interpreter could not be started at all.
    #[error("Failed to launch Python interpreter '{python}': {source}")]
    Launch {
        python: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `pip install` ran but exited unsuccessfully.
    #[error("pip install of '{package}' failed ({status}): {detail}")]
    Install {
        package: String,
        status: String,
        detail: String,
    },

    /// The install step succeeded but the module still does not import.
    #[error("'{module}' is still not importable with '{python}' after installing '{package}'")]
    StillMissing {
        module: &'static str,
        python: PathBuf,
        package: String,
    },

    /// The module is missing and installing was not allowed.
    #[error("'{module}' is not installed for '{python}' and auto-install is disabled")]
    NotInstalled {
        module: &'static str,
        python: PathBuf,
    },
}

// ── Options / result ─────────────────────────────────────────────────────────

/// Inputs to [`ensure_markitdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureOptions {
    /// Interpreter used for both the probe and the install.
    pub python: PathBuf,
    /// pip requirement to install when the probe fails.
    pub package: String,
    /// When `false`, a failed probe is reported instead of installing.
    pub auto_install: bool,
}

impl Default for EnsureOptions {
    fn default() -> Self {
        Self {
            python: default_python(),
            package: MARKITDOWN_PACKAGE.to_string(),
            auto_install: true,
        }
    }
}

/// A Python interpreter that is known to import markitdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkItDownRuntime {
    pub python: PathBuf,
    /// `true` when this process ran the install step.
    pub installed_now: bool,
}

/// Returns the interpreter to use when none is configured explicitly.
///
/// `MARKITDOWN_PYTHON` wins; otherwise `python3` (or `python` on Windows,
/// where the `python3` alias is often a store shim).
pub fn default_python() -> PathBuf {
    match std::env::var_os(PYTHON_ENV) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ if cfg!(windows) => PathBuf::from("python"),
        _ => PathBuf::from("python3"),
    }
}

// ── Process-wide cache ───────────────────────────────────────────────────────

static RESOLVED: OnceLock<MarkItDownRuntime> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns `true` if `import markitdown` succeeds under `python`.
///
/// An `Err` means the interpreter itself could not be launched.
pub fn is_markitdown_installed(python: &Path) -> Result<bool, MarkItDownAutoError> {
    let status = quiet_python(python)
        .arg("-c")
        .arg(format!("import {MARKITDOWN_MODULE}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| MarkItDownAutoError::Launch {
            python: python.to_path_buf(),
            source,
        })?;

    Ok(status.success())
}

/// Runs `<python> -m pip install <package> --quiet`.
///
/// pip's stdout is discarded; its stderr is captured so a failure carries the
/// last line pip printed.
pub fn install_markitdown(python: &Path, package: &str) -> Result<(), MarkItDownAutoError> {
    let output = quiet_python(python)
        .args(["-m", "pip", "install", package, "--quiet"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| MarkItDownAutoError::Launch {
            python: python.to_path_buf(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }

    Err(MarkItDownAutoError::Install {
        package: package.to_string(),
        status: describe_status(output.status),
        detail: last_line(&output.stderr).unwrap_or_else(|| "no output from pip".to_string()),
    })
}

/// Ensures markitdown is importable, installing it once if necessary.
///
/// `on_install` is invoked with the pip requirement right before the install
/// subprocess starts. It is never called when the module is already present.
pub fn ensure_markitdown(
    options: &EnsureOptions,
    on_install: Option<&dyn Fn(&str)>,
) -> Result<MarkItDownRuntime, MarkItDownAutoError> {
    // Fast path: already resolved in this process for the same interpreter.
    if let Some(rt) = RESOLVED.get() {
        if rt.python == options.python {
            return Ok(rt.clone());
        }
    }

    let rt = ensure_with(
        options,
        || is_markitdown_installed(&options.python),
        || install_markitdown(&options.python, &options.package),
        on_install,
    )?;

    let _ = RESOLVED.set(rt.clone());
    Ok(rt)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Probe → install → probe, with the subprocesses abstracted away.
fn ensure_with(
    options: &EnsureOptions,
    mut probe: impl FnMut() -> Result<bool, MarkItDownAutoError>,
    install: impl FnOnce() -> Result<(), MarkItDownAutoError>,
    on_install: Option<&dyn Fn(&str)>,
) -> Result<MarkItDownRuntime, MarkItDownAutoError> {
    if probe()? {
        return Ok(MarkItDownRuntime {
            python: options.python.clone(),
            installed_now: false,
        });
    }

    if !options.auto_install {
        return Err(MarkItDownAutoError::NotInstalled {
            module: MARKITDOWN_MODULE,
            python: options.python.clone(),
        });
    }

    if let Some(cb) = on_install {
        cb(&options.package);
    }
    install()?;

    if probe()? {
        Ok(MarkItDownRuntime {
            python: options.python.clone(),
            installed_now: true,
        })
    } else {
        Err(MarkItDownAutoError::StillMissing {
            module: MARKITDOWN_MODULE,
            python: options.python.clone(),
            package: options.package.clone(),
        })
    }
}

fn quiet_python(python: &Path) -> Command {
    let mut cmd = Command::new(python);
    cmd.env("PYTHONWARNINGS", "ignore").stdin(Stdio::null());
    cmd
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Last non-blank line of a subprocess stream.
fn last_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn options(auto_install: bool) -> EnsureOptions {
        EnsureOptions {
            python: PathBuf::from("python-under-test"),
            package: MARKITDOWN_PACKAGE.to_string(),
            auto_install,
        }
    }

    #[test]
    fn present_module_skips_install() {
        let probes = Cell::new(0);
        let rt = ensure_with(
            &options(true),
            || {
                probes.set(probes.get() + 1);
                Ok(true)
            },
            || panic!("install must not run"),
            Some(&|_: &str| panic!("notice must not be shown")),
        )
        .unwrap();

        assert_eq!(probes.get(), 1);
        assert!(!rt.installed_now);
    }

    #[test]
    fn missing_module_installs_then_reprobes_once() {
        let probes = Cell::new(0);
        let notices = Cell::new(0);
        let rt = ensure_with(
            &options(true),
            || {
                probes.set(probes.get() + 1);
                Ok(probes.get() > 1)
            },
            || Ok(()),
            Some(&|pkg: &str| {
                assert_eq!(pkg, "markitdown[all]");
                notices.set(notices.get() + 1);
            }),
        )
        .unwrap();

        assert_eq!(probes.get(), 2);
        assert_eq!(notices.get(), 1);
        assert!(rt.installed_now);
    }

    #[test]
    fn still_missing_after_install_is_fatal() {
        let probes = Cell::new(0);
        let err = ensure_with(
            &options(true),
            || {
                probes.set(probes.get() + 1);
                Ok(false)
            },
            || Ok(()),
            None,
        )
        .unwrap_err();

        assert_eq!(probes.get(), 2, "exactly one retry after installing");
        assert!(matches!(err, MarkItDownAutoError::StillMissing { .. }));
    }

    #[test]
    fn install_failure_propagates() {
        let err = ensure_with(
            &options(true),
            || Ok(false),
            || {
                Err(MarkItDownAutoError::Install {
                    package: "markitdown[all]".into(),
                    status: "exit code 1".into(),
                    detail: "No matching distribution".into(),
                })
            },
            None,
        )
        .unwrap_err();

        assert!(err.to_string().contains("No matching distribution"));
    }

    #[test]
    fn auto_install_disabled_reports_missing() {
        let err = ensure_with(&options(false), || Ok(false), || panic!("no install"), None)
            .unwrap_err();
        assert!(matches!(err, MarkItDownAutoError::NotInstalled { .. }));
        assert!(err.to_string().contains("auto-install is disabled"));
    }

    #[test]
    fn unknown_interpreter_is_a_launch_error() {
        let python = Path::new("/nonexistent/markitdown-auto/python");
        let err = is_markitdown_installed(python).unwrap_err();
        assert!(matches!(err, MarkItDownAutoError::Launch { .. }));

        let err = install_markitdown(python, MARKITDOWN_PACKAGE).unwrap_err();
        assert!(matches!(err, MarkItDownAutoError::Launch { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn probe_follows_exit_status() {
        assert!(is_markitdown_installed(Path::new("true")).unwrap());
        assert!(!is_markitdown_installed(Path::new("false")).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn failing_pip_is_an_install_error() {
        let err = install_markitdown(Path::new("false"), MARKITDOWN_PACKAGE).unwrap_err();
        match err {
            MarkItDownAutoError::Install { status, detail, .. } => {
                assert_eq!(status, "exit code 1");
                assert_eq!(detail, "no output from pip");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    /// An interpreter stand-in whose import probe succeeds only after its
    /// `pip install` has run once.
    #[cfg(unix)]
    fn fake_python(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let python = dir.join("python");
        std::fs::write(
            &python,
            "#!/bin/sh\n\
             here=$(dirname \"$0\")\n\
             case \"$1\" in\n\
               -c) [ -f \"$here/installed\" ] ;;\n\
               -m) echo \"$4\" >> \"$here/pip.log\"; touch \"$here/installed\" ;;\n\
               *) exit 2 ;;\n\
             esac\n",
        )
        .unwrap();
        std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();
        python
    }

    #[cfg(unix)]
    #[test]
    fn ensure_installs_through_pip_then_caches() {
        let dir = tempfile::tempdir().unwrap();
        let python = fake_python(dir.path());
        let options = EnsureOptions {
            python: python.clone(),
            package: MARKITDOWN_PACKAGE.to_string(),
            auto_install: true,
        };

        let notices = Cell::new(0);
        let notice = |_: &str| notices.set(notices.get() + 1);
        let rt = ensure_markitdown(&options, Some(&notice)).unwrap();

        assert!(rt.installed_now);
        assert_eq!(rt.python, python);
        assert_eq!(notices.get(), 1);
        let log = std::fs::read_to_string(dir.path().join("pip.log")).unwrap();
        assert_eq!(log, "markitdown[all]\n");

        // Resolved once per process: no further probe or install.
        std::fs::remove_file(dir.path().join("installed")).unwrap();
        let again = ensure_markitdown(&options, Some(&notice)).unwrap();
        assert_eq!(again, rt);
        assert_eq!(notices.get(), 1);
        let log = std::fs::read_to_string(dir.path().join("pip.log")).unwrap();
        assert_eq!(log.lines().count(), 1);
    }

    #[test]
    fn last_line_skips_trailing_blanks() {
        let out = b"Collecting markitdown\nERROR: network unreachable\n\n  \n";
        assert_eq!(last_line(out).as_deref(), Some("ERROR: network unreachable"));
        assert_eq!(last_line(b""), None);
    }

    #[test]
    fn python_override_via_env() {
        std::env::set_var(PYTHON_ENV, "/opt/venv/bin/python");
        let p = default_python();
        std::env::remove_var(PYTHON_ENV);
        assert_eq!(p, PathBuf::from("/opt/venv/bin/python"));
    }
}
