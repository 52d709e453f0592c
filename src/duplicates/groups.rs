//! Size buckets and per-file hash memoization.
//!
//! # Overview
//!
//! Files of different sizes can never be duplicates, so the finder keeps a
//! table from exact byte size to the files seen with that size. Only
//! members of the same bucket are ever compared by content.
//!
//! Each [`FileEntry`] owns two memo cells for its partial and full hash.
//! A hash is computed the first time a comparison needs it and is never
//! recomputed for the same entry within one run.
//!
//! # Example
//!
//! ```
//! use dupestash::duplicates::{FileEntry, SizeBuckets};
//! use std::path::PathBuf;
//!
//! let mut buckets = SizeBuckets::new();
//! buckets.insert(FileEntry::new(PathBuf::from("a.txt"), 1024));
//! buckets.insert(FileEntry::new(PathBuf::from("b.txt"), 1024));
//! buckets.insert(FileEntry::new(PathBuf::from("c.txt"), 2048));
//!
//! assert_eq!(buckets.members(1024).len(), 2);
//! assert_eq!(buckets.bucket_count(), 2);
//! assert_eq!(buckets.len(), 3);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;

use crate::scanner::{ContentHasher, Hash, HashError};

/// A file tracked by the finder, with lazily cached hashes.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Path relative to the scan root
    pub path: PathBuf,
    /// File size in bytes at discovery time
    pub size: u64,
    partial: OnceCell<Hash>,
    full: OnceCell<Hash>,
}

impl FileEntry {
    /// Create an entry with no hashes computed yet.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            partial: OnceCell::new(),
            full: OnceCell::new(),
        }
    }

    /// Partial hash of the first `limit` bytes, computed on first use.
    ///
    /// # Errors
    ///
    /// Returns the hasher's error if the file cannot be read. A failed
    /// attempt leaves the cell empty.
    pub fn partial_hash<H: ContentHasher + ?Sized>(
        &self,
        root: &Path,
        hasher: &H,
        limit: usize,
    ) -> Result<&Hash, HashError> {
        self.partial
            .get_or_try_init(|| hasher.partial_hash(&root.join(&self.path), limit))
    }

    /// Full content hash, computed on first use.
    ///
    /// # Errors
    ///
    /// Returns the hasher's error if the file cannot be read.
    pub fn full_hash<H: ContentHasher + ?Sized>(
        &self,
        root: &Path,
        hasher: &H,
    ) -> Result<&Hash, HashError> {
        self.full
            .get_or_try_init(|| hasher.full_hash(&root.join(&self.path)))
    }

    /// Whether the partial hash has been computed.
    #[must_use]
    pub fn has_partial_hash(&self) -> bool {
        self.partial.get().is_some()
    }

    /// Whether the full hash has been computed.
    #[must_use]
    pub fn has_full_hash(&self) -> bool {
        self.full.get().is_some()
    }
}

/// Table from exact file size to the files seen with that size.
///
/// Members keep discovery order and are addressed by index.
#[derive(Debug, Default)]
pub struct SizeBuckets {
    buckets: HashMap<u64, Vec<FileEntry>>,
}

impl SizeBuckets {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Members of the bucket for `size`, in discovery order.
    #[must_use]
    pub fn members(&self, size: u64) -> &[FileEntry] {
        self.buckets.get(&size).map_or(&[], Vec::as_slice)
    }

    /// Append an entry to its bucket and return its index there.
    pub fn insert(&mut self, entry: FileEntry) -> usize {
        let bucket = self.buckets.entry(entry.size).or_default();
        debug_assert!(bucket.iter().all(|e| e.size == entry.size));
        bucket.push(entry);
        bucket.len() - 1
    }

    /// Number of distinct sizes seen.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of entries across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Whether no entry has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
