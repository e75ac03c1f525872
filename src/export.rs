//! Writes a document's translation to disk.
//!
//! Only `file_name` and `translated_text` are consumed. Three formats are
//! supported: plain text, Markdown (one paragraph per source line) and a
//! small JSON object.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::Document;

// ---------------------------------------------------------------------------
// ExportFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }
}

// ---------------------------------------------------------------------------
// ExportError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{0} has no translation to export")]
    NothingToExport(String),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialise export: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    file_name: &'a str,
    translated_text: &'a str,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the translation of `doc` in `format`.
pub fn render(doc: &Document, format: ExportFormat) -> Result<String, ExportError> {
    let text = doc.translated_text.trim();
    if text.is_empty() {
        return Err(ExportError::NothingToExport(doc.file_name.clone()));
    }

    let rendered = match format {
        ExportFormat::Text => format!("{text}\n"),
        ExportFormat::Markdown => {
            let paragraphs: Vec<&str> = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            format!("# {}\n\n{}\n", doc.file_name, paragraphs.join("\n\n"))
        }
        ExportFormat::Json => {
            let body = JsonExport {
                file_name: &doc.file_name,
                translated_text: &doc.translated_text,
            };
            serde_json::to_string_pretty(&body)? + "\n"
        }
    };

    Ok(rendered)
}

/// `<file_name>-translation.<ext>` with path separators and other
/// unsafe characters replaced.
pub fn export_file_name(file_name: &str, format: ExportFormat) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let safe = safe.trim_start_matches('.');
    let stem = if safe.is_empty() { "document" } else { safe };
    format!("{stem}-translation.{}", format.extension())
}

/// Render `doc` and write it into `dir`, creating the directory if needed.
/// Returns the written path.
pub fn export_translation(
    doc: &Document,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let rendered = render(doc, format)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(&doc.file_name, format));
    std::fs::write(&path, rendered)?;

    log::info!("export: wrote {}", path.display());
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
