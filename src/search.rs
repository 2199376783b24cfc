//! Case-insensitive substring search over markdown files.
//!
//! A linear scan: every markdown file under the root is read and checked
//! for the first occurrence of the query. Each hit carries a single-line
//! context snippet of up to [`CONTEXT_CHARS`] characters on either side of
//! the match.

use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::Result;
use crate::paths::{is_markdown_file, to_slash};

/// Characters of context kept on each side of a match.
pub const CONTEXT_CHARS: usize = 60;

/// Marker added where the snippet was cut short.
pub const ELLIPSIS: &str = "…";

/// A file containing the query, with a preview of the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub context: String,
}

/// Searches every markdown file under `root` for `query`, ignoring case.
///
/// Results are sorted by path. Unreadable files are skipped; a failure to
/// walk the tree itself is an error. An empty query matches nothing.
pub fn search_files(root: &Path, query: &str) -> Result<Vec<SearchHit>> {
    let needle = fold_case(query);
    let mut hits = Vec::new();
    if needle.is_empty() {
        return Ok(hits);
    }

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if entry.file_type().is_dir() || !is_markdown_file(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("search skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);

        if let Some(context) = match_context(&text, &needle) {
            let relative = path.strip_prefix(root).unwrap_or(path);
            hits.push(SearchHit {
                path: to_slash(relative),
                context,
            });
        }
    }

    hits.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(hits)
}

/// Lower-cases `s` one char at a time.
///
/// Unlike [`str::to_lowercase`] this never applies context-dependent rules
/// (a word-final `Σ` folds to `σ`, not `ς`), so a query and the text it is
/// searched in always fold identically.
pub fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Finds the first case-insensitive occurrence of `needle` in `text` and
/// returns the surrounding snippet.
pub fn match_context(text: &str, needle: &str) -> Option<String> {
    let needle = fold_case(needle);
    if needle.is_empty() {
        return None;
    }

    // Lower-casing can change byte lengths, so keep a map from every byte of
    // the folded text back to the index of the original char it came from.
    let chars: Vec<char> = text.chars().collect();
    let mut folded = String::with_capacity(text.len());
    let mut origin: Vec<usize> = Vec::with_capacity(text.len());
    for (i, ch) in chars.iter().enumerate() {
        for lower in ch.to_lowercase() {
            folded.push(lower);
            origin.extend(std::iter::repeat(i).take(lower.len_utf8()));
        }
    }

    let start_byte = folded.find(&needle)?;
    let end_byte = start_byte + needle.len();
    let start = origin[start_byte];
    let end = origin
        .get(end_byte)
        .copied()
        .unwrap_or(chars.len())
        .max(start + 1);

    let window_start = start.saturating_sub(CONTEXT_CHARS);
    let window_end = (end + CONTEXT_CHARS).min(chars.len());

    let mut snippet = String::new();
    if window_start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    for &ch in &chars[window_start..window_end] {
        match ch {
            '\r' => {}
            '\n' => snippet.push(' '),
            other => snippet.push(other),
        }
    }
    if window_end < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    Some(snippet)
}
