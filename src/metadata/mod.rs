//! Per-directory tag and "opened" metadata.
//!
//! Each directory that has any state gets one sidecar file named
//! [`SIDECAR_FILE`] holding a [`DirectoryMetadata`]. Storage sits behind the
//! [`MetadataRepository`] trait so the API layer can run against the real
//! sidecar files ([`fs::FsMetadataStore`]) or an in-memory map
//! ([`memory::InMemoryMetadataStore`]).
//!
//! Nothing is cached: every call goes back to the repository, and writers
//! are last-writer-wins. A per-directory lock would slot in around
//! [`update`] if concurrent clients ever become a concern.
//!
//! # Operations
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`MetadataRepository::get`] | Read one directory's state (empty if absent) |
//! | [`MetadataRepository::put`] | Write one directory's state (delete if empty) |
//! | [`update`] | Read, mutate, write back |
//! | [`collect_all`] | Aggregate every directory under a root, keyed by relative path |

pub mod fs;
pub mod memory;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::paths::to_slash;
use crate::tags::{Tag, TagAction};

/// Name of the sidecar file stored in each directory.
pub const SIDECAR_FILE: &str = ".mdviewer";

/// Tags and opened flags for the files of a single directory.
///
/// Keys are bare file names, not paths. A key in `tags` always maps to a
/// non-empty list; only `true` entries in `opened` carry meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMetadata {
    #[serde(default)]
    pub tags: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub opened: BTreeMap<String, bool>,
}

impl DirectoryMetadata {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.opened.is_empty()
    }

    /// Appends `tag` unless the file already carries it.
    pub fn add_tag(&mut self, file: &str, tag: Tag) {
        let tags = self.tags.entry(file.to_string()).or_default();
        if !tags.iter().any(|t| t == tag.as_str()) {
            tags.push(tag.as_str().to_string());
        }
    }

    /// Drops `tag` from the file, removing the entry once no tags remain.
    pub fn remove_tag(&mut self, file: &str, tag: Tag) {
        if let Some(tags) = self.tags.get_mut(file) {
            tags.retain(|t| t != tag.as_str());
            if tags.is_empty() {
                self.tags.remove(file);
            }
        }
    }

    pub fn clear_tags(&mut self, file: &str) {
        self.tags.remove(file);
    }

    /// One-way: there is no operation that marks a file unopened.
    pub fn mark_opened(&mut self, file: &str) {
        self.opened.insert(file.to_string(), true);
    }

    /// Removes every trace of `file`, used when it leaves the directory.
    pub fn forget(&mut self, file: &str) {
        self.tags.remove(file);
        self.opened.remove(file);
    }

    /// Applies a tag request. `Add`/`Remove` without a tag are no-ops.
    pub fn apply_tag_action(&mut self, file: &str, action: TagAction, tag: Option<Tag>) {
        match (action, tag) {
            (TagAction::Clear, _) => self.clear_tags(file),
            (TagAction::Add, Some(tag)) => self.add_tag(file, tag),
            (TagAction::Remove, Some(tag)) => self.remove_tag(file, tag),
            (TagAction::Add | TagAction::Remove, None) => {}
        }
    }
}

/// Storage for [`DirectoryMetadata`], keyed by absolute directory path.
pub trait MetadataRepository: Send + Sync {
    /// Returns the directory's state, or an empty value if none is stored.
    fn get(&self, dir: &Path) -> Result<DirectoryMetadata>;

    /// Stores the directory's state. Empty state removes the entry.
    fn put(&self, dir: &Path, data: &DirectoryMetadata) -> Result<()>;

    /// Lists directories at or below `root` that currently hold state.
    fn directories(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

/// Reads `dir`, applies `mutate`, and writes the result back.
pub fn update<R, F>(repo: &R, dir: &Path, mutate: F) -> Result<DirectoryMetadata>
where
    R: MetadataRepository + ?Sized,
    F: FnOnce(&mut DirectoryMetadata),
{
    let mut data = repo.get(dir)?;
    mutate(&mut data);
    repo.put(dir, &data)?;
    Ok(data)
}

/// Tree-wide view of every directory's metadata.
///
/// Keys are root-relative, forward-slash file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllMetadata {
    pub tags: BTreeMap<String, Vec<String>>,
    pub opened: BTreeMap<String, bool>,
}

/// Aggregates metadata from every directory under `root`.
///
/// Directories whose state cannot be read are skipped with a warning; the
/// aggregate is best-effort.
pub fn collect_all<R>(repo: &R, root: &Path) -> Result<AllMetadata>
where
    R: MetadataRepository + ?Sized,
{
    let mut all = AllMetadata::default();

    for dir in repo.directories(root)? {
        let data = match repo.get(&dir) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("skipping metadata in {}: {}", dir.display(), e);
                continue;
            }
        };
        let rel_dir = match dir.strip_prefix(root) {
            Ok(rel) => to_slash(rel),
            Err(_) => continue,
        };

        for (name, tags) in data.tags {
            all.tags.insert(join_rel(&rel_dir, &name), tags);
        }
        for (name, opened) in data.opened {
            if opened {
                all.opened.insert(join_rel(&rel_dir, &name), true);
            }
        }
    }

    Ok(all)
}

fn join_rel(rel_dir: &str, name: &str) -> String {
    if rel_dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", rel_dir, name)
    }
}
