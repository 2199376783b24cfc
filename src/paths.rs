//! Path sanitization for user-supplied relative paths.
//!
//! Two independent checks guard every filesystem access driven by a
//! request:
//!
//! 1. [`sanitize_relative_path`] lexically cleans the input and rejects
//!    empty, absolute, and parent-traversing paths.
//! 2. [`secure_join`] joins the cleaned path onto the root and verifies that
//!    the absolute result still lies inside the absolute root.
//!
//! Neither check touches the filesystem.

use path_clean::PathClean;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, ViewerError};

/// File extensions (lower-cased, without the dot) treated as markdown.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Validates a root-relative path and returns its forward-slash form.
///
/// The input is trimmed and lexically cleaned (`.` dropped, `..` folded into
/// the preceding segment). The result must be a non-empty relative path that
/// does not start with `..`.
pub fn sanitize_relative_path(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ViewerError::InvalidPath("path is required".to_string()));
    }

    let cleaned = Path::new(trimmed).clean();
    let mut components = cleaned.components();
    match components.next() {
        None => return Err(ViewerError::InvalidPath(trimmed.to_string())),
        Some(Component::Normal(_)) => {}
        Some(_) => return Err(ViewerError::InvalidPath(trimmed.to_string())),
    }

    Ok(to_slash(&cleaned))
}

/// Joins a sanitized relative path onto `root`, refusing any result outside it.
///
/// Both sides are made absolute against the current directory and cleaned
/// before comparison. `rel` may be `"."`, which yields the root itself.
pub fn secure_join(root: &Path, rel: &str) -> Result<PathBuf> {
    let abs_root = absolutize(root)?;
    let abs_joined = absolutize(&root.join(rel))?;

    if abs_joined.strip_prefix(&abs_root).is_err() {
        return Err(ViewerError::PathEscapesRoot(rel.to_string()));
    }
    Ok(abs_joined)
}

/// Returns true when the final path segment has a markdown extension.
///
/// Case-insensitive, so `README.MD` and `notes.Markdown` both qualify.
pub fn is_markdown_file(path: &str) -> bool {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => {
            let ext = name[idx + 1..].to_ascii_lowercase();
            MARKDOWN_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Splits a sanitized slash path into its directory (`"."` at the root) and file name.
pub fn split_dir_file(rel: &str) -> (&str, &str) {
    match rel.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => (".", rel),
    }
}

/// Renders a relative path with forward slashes regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.clean())
    } else {
        let cwd = std::env::current_dir()?;
        Ok(cwd.join(path).clean())
    }
}
