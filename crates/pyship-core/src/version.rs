use std::fs;

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::PyshipError;
use crate::layout::ProjectLayout;

/// Reads the repository-wide release version from `<base>/../VERSION`.
///
/// Returns `Ok(None)` when the file does not exist.
///
/// # Errors
/// Returns an error when the file exists but cannot be read or is blank.
pub fn release_version(layout: &ProjectLayout) -> Result<Option<String>> {
    let Some(path) = layout.version_file() else {
        return Ok(None);
    };
    if !path.is_file() {
        debug!(path = %path.display(), "no VERSION file");
        return Ok(None);
    }
    let contents =
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let version = contents.trim();
    if version.is_empty() {
        return Err(PyshipError::config(&path, "VERSION file is empty").into());
    }
    Ok(Some(version.to_string()))
}
