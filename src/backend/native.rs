//! Native backend: text formats without any external dependency.
//!
//! Markup and prose are returned as-is. Any other UTF-8 file is wrapped in a
//! fenced code block tagged with its extension so structure survives when the
//! output is read as Markdown. `.gz` files are decompressed first and routed
//! by their inner extension (`notes.md.gz` → `md`). Binary document formats
//! need the markitdown backend and are rejected as unsupported.

use super::Converter;
use crate::error::ConversionError;
use flate2::read::GzDecoder;
use futures::future::{BoxFuture, FutureExt};
use std::io::Read;
use std::path::Path;
use tracing::debug;

const BACKEND_NAME: &str = "native";

/// Returned verbatim.
const PASSTHROUGH: &[&str] = &[
    "", "md", "markdown", "mdown", "txt", "text", "html", "htm", "xhtml", "rst", "org", "adoc",
    "asciidoc", "tex", "log",
];

/// Binary containers this backend cannot read.
const BINARY: &[&str] = &[
    "pdf", "doc", "docx", "dotx", "dot", "xls", "xlsx", "xlsm", "ppt", "pptx", "pptm", "odt",
    "ods", "odp", "epub", "rtf", "zip", "tar", "7z", "rar", "png", "jpg", "jpeg", "gif", "webp",
    "bmp", "tif", "tiff", "mp3", "wav", "m4a", "mp4", "mov",
];

/// Reads text-like files directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeConverter;

impl NativeConverter {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, path: &Path) -> Result<String, ConversionError> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| ConversionError::from_io(path, e))?;

        let (bytes, ext) = match extension_of(path).as_str() {
            "gz" | "gzip" => {
                let mut out = Vec::new();
                GzDecoder::new(raw.as_slice())
                    .read_to_end(&mut out)
                    .map_err(|e| ConversionError::from_io(path, e))?;
                let inner = path
                    .file_stem()
                    .map(Path::new)
                    .map(extension_of)
                    .unwrap_or_default();
                (out, inner)
            }
            other => {
                let other = other.to_string();
                (raw, other)
            }
        };

        debug!("native backend reading {} as '{}'", path.display(), ext);
        render(path, bytes, &ext)
    }
}

impl Converter for NativeConverter {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn convert<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, ConversionError>> {
        self.run(path).boxed()
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .unwrap_or_default()
        .to_string_lossy()
        .to_lowercase()
}

fn render(path: &Path, bytes: Vec<u8>, ext: &str) -> Result<String, ConversionError> {
    if BINARY.contains(&ext) {
        return Err(ConversionError::Unsupported {
            path: path.to_path_buf(),
            format: ext.to_string(),
        });
    }

    let text = String::from_utf8(bytes).map_err(|_| ConversionError::InvalidUtf8 {
        path: path.to_path_buf(),
    })?;

    if PASSTHROUGH.contains(&ext) {
        Ok(text)
    } else {
        Ok(format!("```{ext}\n{}\n```", text.trim_end_matches('\n')))
    }
}
