//! Sidecar-file backed [`MetadataRepository`].
//!
//! On disk the sidecar is pretty-printed JSON:
//!
//! ```json
//! { "tags": { "name.md": ["DONE", "IMPORTANT"] }, "opened": { "name.md": true } }
//! ```
//!
//! Older files stored a single tag string per file
//! (`{"tags": {"name.md": "DONE"}}`). Those are migrated to the list form
//! when read but never rewritten until a mutation writes the directory.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{DirectoryMetadata, MetadataRepository, SIDECAR_FILE};
use crate::error::Result;

/// Reads and writes `.mdviewer` files directly inside each directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMetadataStore;

impl FsMetadataStore {
    pub fn new() -> Self {
        Self
    }

    pub fn sidecar_path(dir: &Path) -> PathBuf {
        dir.join(SIDECAR_FILE)
    }
}

impl MetadataRepository for FsMetadataStore {
    fn get(&self, dir: &Path) -> Result<DirectoryMetadata> {
        let path = Self::sidecar_path(dir);
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DirectoryMetadata::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(parse_sidecar(&content).unwrap_or_else(|| {
            log::warn!("ignoring unreadable metadata file {}", path.display());
            DirectoryMetadata::default()
        }))
    }

    fn put(&self, dir: &Path, data: &DirectoryMetadata) -> Result<()> {
        let path = Self::sidecar_path(dir);
        if data.is_empty() {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => log::warn!("failed to remove {}: {}", path.display(), e),
            }
            return Ok(());
        }
        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    fn directories(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() || entry.file_name() != SIDECAR_FILE {
                continue;
            }
            if let Some(parent) = entry.path().parent() {
                dirs.push(parent.to_path_buf());
            }
        }
        Ok(dirs)
    }
}

/// Current schema with nullable maps, as written by older and newer versions alike.
#[derive(Deserialize)]
struct SidecarFile {
    #[serde(default)]
    tags: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default)]
    opened: Option<BTreeMap<String, bool>>,
}

/// Single-tag schema.
#[derive(Deserialize)]
struct LegacySidecarFile {
    tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    opened: Option<BTreeMap<String, bool>>,
}

/// Parses either schema. Returns `None` when neither fits.
fn parse_sidecar(content: &[u8]) -> Option<DirectoryMetadata> {
    if let Ok(file) = serde_json::from_slice::<SidecarFile>(content) {
        return Some(DirectoryMetadata {
            tags: file.tags.unwrap_or_default(),
            opened: file.opened.unwrap_or_default(),
        });
    }

    let legacy = serde_json::from_slice::<LegacySidecarFile>(content).ok()?;
    let tags = legacy
        .tags?
        .into_iter()
        .filter(|(_, tag)| !tag.is_empty())
        .map(|(name, tag)| (name, vec![tag]))
        .collect();
    Some(DirectoryMetadata {
        tags,
        opened: legacy.opened.unwrap_or_default(),
    })
}
