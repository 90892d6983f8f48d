//! Utility functions for error handling
//!
//! Helpers that attach context to IO failures before the data readers see them.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{CohortError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(io_error(
            io::ErrorKind::NotFound,
            format!("File not found: {} (needed for {purpose})", path.display()),
        ));
    }

    if !path.is_file() {
        return Err(io_error(
            io::ErrorKind::InvalidInput,
            format!("Path is not a file: {} (expected a file for {purpose})", path.display()),
        ));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions",
            io::ErrorKind::NotFound => "File not found - it may have been deleted during operation",
            _ => "Failed to open file",
        };
        io_error(e.kind(), format!("{context}: {} ({e})", path.display()))
    })
}

fn io_error(kind: io::ErrorKind, message: String) -> CohortError {
    CohortError::Io(io::Error::new(kind, message))
}
