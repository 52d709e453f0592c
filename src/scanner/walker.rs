//! Directory walker implementation using walkdir for sequential traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and yielding `(path, size)` entries for duplicate detection.
//!
//! # Guarantees
//!
//! - Depth-first, pre-order traversal on the calling thread
//! - Children of every directory are visited in file-name order, so two
//!   walks of an unchanged tree yield the same sequence
//! - Directories are descended into but never yielded
//! - Symbolic links are never followed; they are yielded as opaque entries
//! - FIFOs, sockets and device nodes are skipped
//!
//! # Example
//!
//! ```no_run
//! use dupestash::scanner::Walker;
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"));
//! let entries: Result<Vec<_>, _> = walker.walk().collect();
//! println!("Found {} files", entries.unwrap().len());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::{ScanEntry, ScanError};

/// Directory walker for sequential file discovery.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupestash::scanner::Walker;
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."));
    /// ```
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
        }
    }

    /// Root directory this walker scans.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Returns a lazy iterator over [`ScanEntry`] results with paths
    /// relative to the root. A missing or non-directory root yields a single
    /// error. Callers are expected to stop at the first error: a disrupted
    /// scan cannot give correct size information.
    pub fn walk(&self) -> impl Iterator<Item = Result<ScanEntry, ScanError>> + '_ {
        let root_error = match fs::metadata(&self.root) {
            Ok(metadata) if metadata.is_dir() => None,
            Ok(_) => Some(Err(ScanError::NotADirectory(self.root.clone()))),
            Err(e) => Some(Err(ScanError::from_io(self.root.clone(), e))),
        };

        let walk_dir = if root_error.is_none() {
            log::debug!("Scanning {}", self.root.display());
            Some(
                WalkDir::new(&self.root)
                    .follow_links(false)
                    .min_depth(1)
                    .sort_by_file_name()
                    .into_iter(),
            )
        } else {
            None
        };

        root_error.into_iter().chain(
            walk_dir
                .into_iter()
                .flatten()
                .filter_map(move |entry_result| match entry_result {
                    Ok(entry) => self.process_entry(&entry),
                    Err(e) => Some(Err(self.handle_walk_error(e))),
                }),
        )
    }

    /// Turn a walkdir entry into a [`ScanEntry`], or skip it.
    fn process_entry(&self, entry: &DirEntry) -> Option<Result<ScanEntry, ScanError>> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            log::trace!("Descending into {}", entry.path().display());
            return None;
        }

        let relative = entry
            .path()
            .strip_prefix(&self.root)
            .map_or_else(|_| entry.path().to_path_buf(), Path::to_path_buf);

        // With follow_links(false) this is the link's own metadata.
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walk_error(e))),
        };

        if file_type.is_symlink() {
            log::trace!("Symlink kept opaque: {}", entry.path().display());
            return Some(Ok(ScanEntry {
                path: relative,
                size: metadata.len(),
                is_symlink: true,
            }));
        }

        if !file_type.is_file() {
            log::debug!("Skipping special file: {}", entry.path().display());
            return None;
        }

        Some(Ok(ScanEntry::new(relative, metadata.len())))
    }

    /// Convert a walkdir error into a [`ScanError`].
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Walker error for {}: {}", path.display(), error);
        let source = error
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        ScanError::from_io(path, source)
    }
}
