//! In-memory [`MetadataRepository`] for tests.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Mirrors the sidecar store's
//! rule that empty state is removed rather than kept.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::{DirectoryMetadata, MetadataRepository};
use crate::error::Result;

pub struct InMemoryMetadataStore {
    dirs: RwLock<HashMap<PathBuf, DirectoryMetadata>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            dirs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataRepository for InMemoryMetadataStore {
    fn get(&self, dir: &Path) -> Result<DirectoryMetadata> {
        let dirs = self.dirs.read().unwrap_or_else(|e| e.into_inner());
        Ok(dirs.get(dir).cloned().unwrap_or_default())
    }

    fn put(&self, dir: &Path, data: &DirectoryMetadata) -> Result<()> {
        let mut dirs = self.dirs.write().unwrap_or_else(|e| e.into_inner());
        if data.is_empty() {
            dirs.remove(dir);
        } else {
            dirs.insert(dir.to_path_buf(), data.clone());
        }
        Ok(())
    }

    fn directories(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let dirs = self.dirs.read().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<PathBuf> = dirs
            .keys()
            .filter(|d| d.starts_with(root))
            .cloned()
            .collect();
        found.sort();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::Tag;

    #[test]
    fn test_empty_put_removes_entry() {
        let store = InMemoryMetadataStore::new();
        let dir = Path::new("/r");
        let mut data = DirectoryMetadata::default();
        data.add_tag("a.md", Tag::Done);
        store.put(dir, &data).unwrap();
        assert_eq!(store.directories(dir).unwrap(), vec![PathBuf::from("/r")]);

        store.put(dir, &DirectoryMetadata::default()).unwrap();
        assert!(store.directories(dir).unwrap().is_empty());
        assert!(store.get(dir).unwrap().is_empty());
    }
}
