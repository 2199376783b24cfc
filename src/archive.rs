//! Moving files into per-directory `.archive` folders.

use std::path::Path;

use crate::error::{Result, ViewerError};
use crate::metadata::{update, MetadataRepository};
use crate::paths::{is_markdown_file, sanitize_relative_path, secure_join, split_dir_file};

/// Name of the archive folder created next to archived files.
pub const ARCHIVE_DIR: &str = ".archive";

/// Moves each requested file into `<dir>/.archive/<name>` and forgets its metadata.
///
/// Best-effort: a file that fails validation or cannot be moved is skipped
/// and the rest of the batch continues. Returns how many files moved.
pub fn archive_files<R>(repo: &R, root: &Path, files: &[String]) -> usize
where
    R: MetadataRepository + ?Sized,
{
    let mut moved = 0;
    for requested in files {
        match archive_one(repo, root, requested) {
            Ok(()) => moved += 1,
            Err(e) => log::debug!("archive skipped {:?}: {}", requested, e),
        }
    }
    moved
}

fn archive_one<R>(repo: &R, root: &Path, requested: &str) -> Result<()>
where
    R: MetadataRepository + ?Sized,
{
    let rel_path = sanitize_relative_path(requested)?;
    if !is_markdown_file(&rel_path) {
        return Err(ViewerError::NotMarkdownFile(rel_path));
    }
    let src = secure_join(root, &rel_path)?;

    let (dir_rel, name) = split_dir_file(&rel_path);
    let dir_abs = secure_join(root, dir_rel)?;
    let archive_dir = dir_abs.join(ARCHIVE_DIR);
    std::fs::create_dir_all(&archive_dir)?;
    std::fs::rename(&src, archive_dir.join(name))?;

    // Counted as moved even when the metadata update fails.
    if let Err(e) = update(repo, &dir_abs, |d| d.forget(name)) {
        log::warn!("archived {} but failed to update metadata: {}", rel_path, e);
    }
    Ok(())
}
