//! Markdown file index.
//!
//! Recomputed on every request; nothing is cached between listings.

use std::path::Path;
use walkdir::WalkDir;

use crate::error::Result;
use crate::paths::{is_markdown_file, to_slash};

/// Recursively lists markdown files under `root`.
///
/// Returns root-relative, forward-slash paths sorted byte-wise. Any walk
/// error (unreadable directory, vanished entry) aborts the whole listing.
pub fn list_markdown_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::with_capacity(16);

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_markdown_file(&name) {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        files.push(to_slash(relative));
    }

    files.sort();
    Ok(files)
}
