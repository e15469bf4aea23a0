//! File I/O helpers carrying operation context in errors.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Read a file to string, attaching context to any failure.
pub fn read_file(path: &Path, context: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::internal_io(
            format!("{}: {}", path.display(), e),
            Some(context.to_string()),
        )
    })
}

/// Write a string to a file, attaching context to any failure.
pub fn write_file(path: &Path, content: &str, context: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| {
        Error::internal_io(
            format!("{}: {}", path.display(), e),
            Some(context.to_string()),
        )
    })
}

/// Append a string to a file, creating it when missing.
pub fn append_file(path: &Path, content: &str, context: &str) -> Result<()> {
    use std::io::Write;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            Error::internal_io(
                format!("{}: {}", path.display(), e),
                Some(context.to_string()),
            )
        })?;

    file.write_all(content.as_bytes()).map_err(|e| {
        Error::internal_io(
            format!("{}: {}", path.display(), e),
            Some(context.to_string()),
        )
    })
}
