// ABOUTME: Utility functions for the slidesmith application
// ABOUTME: Provides path validation, directory helpers and output filename sanitisation

use crate::errors::{DeckError, Result};
use log::warn;
use std::path::Path;

/// Longest sanitised base name, before the extension is appended
pub const MAX_FILENAME_LEN: usize = 50;

/// Base name used when a title sanitises to nothing
pub const FALLBACK_FILENAME: &str = "presentation";

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DeckError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(DeckError::Validation(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(DeckError::Validation(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Validate write permissions for a directory
pub fn validate_directory_writable(path: &Path) -> Result<()> {
    ensure_directory_exists(path)?;

    let test_file = path.join(format!("test_write_{}.tmp", uuid::Uuid::new_v4()));
    match std::fs::File::create(&test_file) {
        Ok(_) => {
            if let Err(e) = std::fs::remove_file(&test_file) {
                warn!("Failed to clean up test file {:?}: {}", test_file, e);
            }
            Ok(())
        }
        Err(e) => Err(DeckError::Validation(format!(
            "Directory is not writable: {:?} - {}",
            path, e
        ))),
    }
}

/// Turn a presentation title into a safe file base name.
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, runs of `_` collapse
/// to one, the result is cut to [`MAX_FILENAME_LEN`] and trailing `_` are
/// dropped. An empty result falls back to [`FALLBACK_FILENAME`].
pub fn sanitize_filename(title: &str) -> String {
    let mut base = String::with_capacity(title.len());
    for c in title.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && base.ends_with('_') {
            continue;
        }
        base.push(c);
    }

    base.truncate(MAX_FILENAME_LEN);
    let trimmed = base.trim_end_matches('_');

    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether a requested download name is one this service could have produced
pub fn is_served_filename(name: &str) -> bool {
    match name.strip_suffix(".pptx") {
        Some(base) => {
            !base.is_empty() && base.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}
