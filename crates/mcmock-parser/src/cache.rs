//! Cache of pre-parsed included headers
//!
//! Headers included by more than one header-to-mock are pre-parsed once per
//! run and shared read-only between pipelines.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::preparse::PreParsedHeader;

/// Cache entry with metadata
#[derive(Clone)]
struct CacheEntry {
    /// File content hash for change detection
    content_hash: u64,
    header: Arc<PreParsedHeader>,
}

/// Shared cache of pre-parsed headers, keyed by resolved path
#[derive(Default)]
pub struct HeaderCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl HeaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached header if its content is unchanged
    pub fn get(&self, path: &Path, content_hash: u64) -> Option<Arc<PreParsedHeader>> {
        let entries = self.entries.read().ok()?;
        entries
            .get(path)
            .filter(|entry| entry.content_hash == content_hash)
            .map(|entry| entry.header.clone())
    }

    /// Insert or update a cache entry
    ///
    /// When another pipeline cached the same content first, its entry is
    /// kept and returned.
    pub fn insert(
        &self,
        path: PathBuf,
        content_hash: u64,
        header: PreParsedHeader,
    ) -> Arc<PreParsedHeader> {
        let header = Arc::new(header);
        let Ok(mut entries) = self.entries.write() else {
            return header;
        };
        match entries.get(&path) {
            Some(existing) if existing.content_hash == content_hash => existing.header.clone(),
            _ => {
                entries.insert(
                    path,
                    CacheEntry {
                        content_hash,
                        header: header.clone(),
                    },
                );
                header
            }
        }
    }

    /// Clear all entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().map(|e| e.len()).unwrap_or(0);
        CacheStats { entries }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
}

/// Simple hash function for file content
pub fn hash_content(content: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(source: &str) -> PreParsedHeader {
        PreParsedHeader::parse("types.h", source).unwrap()
    }

    #[test]
    fn test_cache_insert_get() {
        let cache = HeaderCache::new();
        let path = PathBuf::from("/test/types.h");
        let source = "#define READY 1";
        let hash = hash_content(source);

        cache.insert(path.clone(), hash, header(source));

        assert!(cache.get(&path, hash).unwrap().defines("READY"));
        assert!(cache.get(&path, hash_content("changed")).is_none());
        assert_eq!(cache.stats(), CacheStats { entries: 1 });
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = HeaderCache::new();
        let path = PathBuf::from("/test/types.h");
        let first = cache.insert(path.clone(), 7, header("#define FIRST"));
        let second = cache.insert(path.clone(), 7, header("#define SECOND"));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.defines("FIRST"));

        cache.clear();
        assert!(cache.get(&path, 7).is_none());
    }
}
