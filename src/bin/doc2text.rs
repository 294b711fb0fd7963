//! CLI binary for edgequake-doc2text.
//!
//! A thin shim over the library crate that maps CLI flags to `WorkerConfig`
//! and wires the worker to stdin, stdout and stderr.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2text::{
    suppress_library_warnings, BackendKind, InstallNotice, StderrPolicy, Worker, WorkerConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Install spinner using indicatif ──────────────────────────────────────────

/// Announces the one-time package install and shows a spinner while pip runs.
///
/// The spinner draws to stderr and is hidden automatically when stderr is
/// not a terminal, which is the normal case when another process drives us.
struct InstallSpinner {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl InstallSpinner {
    fn new(quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            quiet,
        })
    }

    /// The hook handed to the worker's acquisition step.
    fn notice(self: &Arc<Self>) -> InstallNotice {
        let me = Arc::clone(self);
        Arc::new(move |package: &str| me.start(package))
    }

    fn start(&self, package: &str) {
        if self.quiet {
            return;
        }
        eprintln!("{}", markitdown_auto::INSTALL_NOTICE);

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Installing");
        bar.set_message(package.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn finish(&self) {
        let bar = match self.bar.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"PROTOCOL:
  stdin    one file path per line
  stdout   <converted text>\0 per successfully converted path, in input order
  stderr   "Error processing <path>: <reason>" per failed path

EXAMPLES:
  # Convert a list of files, records separated by NUL
  find docs -name '*.pdf' | doc2text > out.bin

  # Split the output back into records
  printf 'a.docx\nb.pdf\n' | doc2text | xargs -0 -n1 printf '%s\n---\n'

  # Text formats only, no Python required
  ls *.md | doc2text --backend native

  # Provision markitdown ahead of time (e.g. in a Dockerfile)
  doc2text --install-only

  # Use a virtualenv interpreter
  doc2text --python ~/.venvs/docs/bin/python < paths.txt

BACKENDS:
  markitdown   Python markitdown package, one child process per path (default).
               PDF, DOCX, PPTX, XLSX, EPUB, HTML, images, audio, ...
               Installed with `pip install markitdown[all]` on first run.
  native       Built-in reader for Markdown, text, HTML and source files,
               including .gz of those.

ENVIRONMENT VARIABLES:
  MARKITDOWN_PYTHON          Python interpreter for the markitdown backend
  DOC2TEXT_BACKEND           markitdown | native
  DOC2TEXT_PACKAGE           pip requirement to install (default markitdown[all])
  DOC2TEXT_BACKEND_STDERR    discard | capture | inherit
  DOC2TEXT_SEPARATOR         record separator (default nul)
  DOC2TEXT_NO_INSTALL        same as --no-install
  DOC2TEXT_KEEP_BLANK_LINES  same as --keep-blank-lines
  DOC2TEXT_INSTALL_ONLY      same as --install-only
  DOC2TEXT_STATS             same as --stats
  DOC2TEXT_VERBOSE           same as --verbose
  DOC2TEXT_QUIET             same as --quiet
  RUST_LOG                   tracing filter, overrides --verbose
  PYTHONWARNINGS             always forced to "ignore"
"#;

/// Convert documents named on stdin to text on stdout.
#[derive(Parser, Debug)]
#[command(
    name = "doc2text",
    version,
    about = "Convert documents named on stdin to NUL-separated text on stdout",
    long_about = "Reads one file path per line from stdin, converts each document to text \
with the selected backend, and writes the text followed by a NUL byte to stdout. \
Failures are reported on stderr, one line per path, and processing continues.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Conversion backend.
    #[arg(long, env = "DOC2TEXT_BACKEND", value_enum, default_value = "markitdown")]
    backend: BackendArg,

    /// Python interpreter used to run markitdown.
    #[arg(long, env = "MARKITDOWN_PYTHON")]
    python: Option<PathBuf>,

    /// pip requirement installed when markitdown is missing.
    #[arg(long, env = "DOC2TEXT_PACKAGE", default_value = markitdown_auto::MARKITDOWN_PACKAGE)]
    package: String,

    /// Fail instead of installing markitdown when it is missing.
    #[arg(long, env = "DOC2TEXT_NO_INSTALL")]
    no_install: bool,

    /// What to do with the backend's own stderr.
    #[arg(long, env = "DOC2TEXT_BACKEND_STDERR", value_enum, default_value = "capture")]
    backend_stderr: StderrArg,

    /// Record separator: nul, rs, us, or a single ASCII character.
    #[arg(long, env = "DOC2TEXT_SEPARATOR", default_value = "nul")]
    separator: String,

    /// Pass blank lines to the backend instead of skipping them.
    #[arg(long, env = "DOC2TEXT_KEEP_BLANK_LINES")]
    keep_blank_lines: bool,

    /// Acquire (and if needed install) the backend, then exit.
    #[arg(long, env = "DOC2TEXT_INSTALL_ONLY")]
    install_only: bool,

    /// Print run statistics as JSON on stderr at end of input.
    #[arg(long, env = "DOC2TEXT_STATS")]
    stats: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2TEXT_VERBOSE")]
    verbose: bool,

    /// Do not announce or animate the markitdown install.
    #[arg(short, long, env = "DOC2TEXT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Markitdown,
    Native,
}

impl From<BackendArg> for BackendKind {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Markitdown => BackendKind::MarkItDown,
            BackendArg::Native => BackendKind::Native,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StderrArg {
    Discard,
    Capture,
    Inherit,
}

impl From<StderrArg> for StderrPolicy {
    fn from(v: StderrArg) -> Self {
        match v {
            StderrArg::Discard => StderrPolicy::Discard,
            StderrArg::Capture => StderrPolicy::Capture,
            StderrArg::Inherit => StderrPolicy::Inherit,
        }
    }
}

fn main() -> Result<()> {
    // Process-wide, before the runtime or any other thread exists.
    suppress_library_warnings();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // stderr doubles as the failure channel, so only errors are logged unless
    // asked otherwise.
    let filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&cli)?;

    // One thread of control: lines are processed strictly in sequence.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: WorkerConfig) -> Result<()> {
    // ── Acquire the conversion backend ───────────────────────────────────
    let mut worker = Worker::new(config);
    let spinner = InstallSpinner::new(cli.quiet);
    let acquired = worker.initialize(Some(spinner.notice())).await;
    spinner.finish();
    acquired.context("Failed to acquire conversion backend")?;

    if cli.install_only {
        return Ok(());
    }

    // ── Line conversion loop ─────────────────────────────────────────────
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();

    let stats = worker
        .run(stdin, &mut stdout, &mut stderr)
        .await
        .context("Conversion loop aborted")?;

    if cli.stats {
        eprintln!(
            "{}",
            serde_json::to_string(&stats).context("Failed to serialise stats")?
        );
    }

    Ok(())
}

/// Map CLI args to `WorkerConfig`.
fn build_config(cli: &Cli) -> Result<WorkerConfig> {
    let separator = parse_separator(&cli.separator)?;

    let mut builder = WorkerConfig::builder()
        .backend(cli.backend.into())
        .package_spec(cli.package.clone())
        .auto_install(!cli.no_install)
        .backend_stderr(cli.backend_stderr.into())
        .record_separator(separator)
        .skip_blank_lines(!cli.keep_blank_lines);

    if let Some(ref python) = cli.python {
        builder = builder.python(python.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--separator` into a single byte.
fn parse_separator(s: &str) -> Result<u8> {
    match s.to_lowercase().as_str() {
        "nul" | "null" | "\\0" => Ok(0x00),
        "rs" => Ok(0x1e),
        "us" => Ok(0x1f),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() && c != '\n' => Ok(c as u8),
                _ => anyhow::bail!(
                    "Invalid separator '{}': use nul, rs, us, or one ASCII character",
                    s
                ),
            }
        }
    }
}
