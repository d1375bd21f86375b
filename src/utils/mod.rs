//! Input path helpers.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Expand file arguments that may contain glob patterns.
///
/// Patterns are expanded in argument order; matches of a single pattern are
/// sorted. Directories matched by a pattern are ignored.
///
/// # Errors
///
/// Returns an error if a pattern is malformed, matches no file, or a
/// matched entry cannot be read.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns {
        resolved_paths.extend(collect_paths_for_pattern(pattern.as_ref())?);
    }

    Ok(resolved_paths)
}

fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern)
        .map_err(|err| Error::invalid_config(format!("Invalid pattern '{pattern}': {err}")))?;

    let mut resolved_paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(std::io::Error::from)?;
        if path.is_file() {
            resolved_paths.push(path);
        }
    }

    if resolved_paths.is_empty() {
        return Err(Error::invalid_config(format!("No files match '{pattern}'")));
    }

    Ok(resolved_paths)
}
