/*!
 * File system operations.
 *
 * Small helpers around reading and writing document files, plus the
 * extension-based format detection used to pick an adapter.
 */

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Document formats the pipeline knows how to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Plain text (`.txt`)
    PlainText,
    /// Markdown (`.md`, `.markdown`)
    Markdown,
    /// JSON (`.json`)
    Json,
    /// XML (`.xml`)
    Xml,
    /// Word document (`.docx`)
    Docx,
    /// Anything else, kept for external adapter dispatch
    Other(String),
}

impl DocumentFormat {
    /// Detect the format from a path's extension, case-insensitively
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => DocumentFormat::PlainText,
            "md" | "markdown" => DocumentFormat::Markdown,
            "json" => DocumentFormat::Json,
            "xml" => DocumentFormat::Xml,
            "docx" => DocumentFormat::Docx,
            other => DocumentFormat::Other(other.to_string()),
        }
    }
}

/// Read a file to a UTF-8 string
pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
}

/// Read a file to raw bytes
pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))
}

/// Write a string to a file, creating parent directories as needed
pub fn write_string<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    write_bytes(path, content.as_bytes())
}

/// Write bytes to a file, creating parent directories as needed
pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    fs::write(path, content).with_context(|| format!("Failed to write file: {:?}", path))
}

/// Create the parent directory of a path if it does not exist
pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }
    Ok(())
}
