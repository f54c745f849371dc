//! Filesystem helpers that attach paths to errors.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use editorial_shared::{EditorialError, Metadata, Result};

pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| EditorialError::io(path, e))
}

/// Read a JSON file whose top level must be an object.
pub fn read_json_object(path: &Path) -> Result<Metadata> {
    let content = read_text(path)?;
    match serde_json::from_str::<Value>(&content).map_err(|e| EditorialError::json(path, e))? {
        Value::Object(map) => Ok(map),
        _ => Err(EditorialError::validation(format!(
            "{} does not contain a JSON object",
            path.display()
        ))),
    }
}

/// Write pretty-printed JSON, creating parent directories.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).map_err(|e| EditorialError::json(path, e))?;
    write_text(path, &content)
}

/// Write a text file, creating parent directories.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| EditorialError::io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| EditorialError::io(path, e))
}

/// Copy `from` into `to`, creating the destination's parent directories.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(EditorialError::Asset(format!(
            "source file not found: {}",
            from.display()
        )));
    }
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EditorialError::io(parent, e))?;
    }
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| EditorialError::io(to, e))
}
