//! Duplicate finder implementation with staged detection.
//!
//! # Overview
//!
//! Files arrive one at a time in scan order and are classified on the spot:
//! 1. **Size**: a file whose size bucket is empty is an original; no
//!    content is read
//! 2. **Prehash**: otherwise the first 4 KiB of the file is hashed and
//!    compared with the (lazily computed) prehash of every bucket member
//! 3. **Verify**: a prehash match is confirmed by a full BLAKE3 hash or,
//!    in paranoid mode, by a byte-for-byte comparison
//!
//! A confirmed file is a duplicate of the member it matched and is not
//! added to the bucket. An unconfirmed file joins the bucket as another
//! original, so a bucket may hold several distinct contents of one size.
//!
//! Classification never touches the filesystem beyond reading; relocating
//! duplicates is a separate phase (see [`crate::actions`]).
//!
//! # Example
//!
//! ```no_run
//! use dupestash::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let result = finder.find_duplicates(Path::new(".")).unwrap();
//! for dup in &result.duplicates {
//!     println!("{} duplicates {}", dup.path.display(), dup.original.display());
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::error::ErrorCategory;
use crate::scanner::{ContentHasher, HashError, Hasher, ScanEntry, ScanError, Walker, PREHASH_SIZE};

use super::groups::{FileEntry, SizeBuckets};

/// How a prehash match is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyMode {
    /// Compare full BLAKE3 hashes (cached per file).
    #[default]
    FullHash,
    /// Compare the two files byte by byte.
    ByteCompare,
}

/// Configuration for the duplicate finder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderConfig {
    /// Number of leading bytes covered by the prehash.
    pub prehash_size: usize,
    /// How prehash matches are confirmed.
    pub verify_mode: VerifyMode,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            prehash_size: PREHASH_SIZE,
            verify_mode: VerifyMode::FullHash,
        }
    }
}

impl FinderConfig {
    /// Set the prehash size (at least one byte).
    #[must_use]
    pub fn with_prehash_size(mut self, size: usize) -> Self {
        self.prehash_size = size.max(1);
        self
    }

    /// Set the verification mode.
    #[must_use]
    pub fn with_verify_mode(mut self, mode: VerifyMode) -> Self {
        self.verify_mode = mode;
        self
    }

    /// Enable paranoid mode (byte-by-byte verification).
    #[must_use]
    pub fn with_paranoid(self, enabled: bool) -> Self {
        if enabled {
            self.with_verify_mode(VerifyMode::ByteCompare)
        } else {
            self.with_verify_mode(VerifyMode::FullHash)
        }
    }
}

/// A file confirmed to be byte-identical to an earlier one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    /// Path of the duplicate, relative to the scan root
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Path of the original it matched, relative to the scan root
    pub original: PathBuf,
}

/// Counters collected while classifying.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectStats {
    /// Regular files classified
    pub files_seen: usize,
    /// Symlink entries passed over
    pub symlinks_skipped: usize,
    /// Prehashes computed
    pub prehashes: usize,
    /// Prehash matches sent to verification
    pub verifications: usize,
    /// Confirmed duplicates
    pub duplicates: usize,
    /// Total bytes held by the duplicates
    pub duplicate_bytes: u64,
}

/// Outcome of a classification run.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// First occurrence of every distinct content, in discovery order
    pub originals: Vec<PathBuf>,
    /// Confirmed duplicates, in discovery order
    pub duplicates: Vec<Duplicate>,
    /// Counters for the run
    pub stats: DetectStats,
}

impl Classification {
    /// Paths of the duplicates, in discovery order.
    #[must_use]
    pub fn duplicate_paths(&self) -> Vec<PathBuf> {
        self.duplicates.iter().map(|d| d.path.clone()).collect()
    }

    /// Whether `path` was classified as an original.
    #[must_use]
    pub fn is_original(&self, path: &Path) -> bool {
        self.originals.iter().any(|p| p == path)
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The directory walk failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A file could not be read for hashing or comparison.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl FinderError {
    /// User-facing category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Scan(e) => e.category(),
            Self::Hash(_) => ErrorCategory::Io,
        }
    }
}

/// Duplicate finder over a size-bucket table.
///
/// Each call to [`DuplicateFinder::classify`] owns a fresh bucket table;
/// no hashes are shared between runs.
#[derive(Debug, Clone)]
pub struct DuplicateFinder<H = Hasher> {
    config: FinderConfig,
    hasher: H,
}

impl DuplicateFinder<Hasher> {
    /// Create a finder using the BLAKE3 [`Hasher`].
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self::with_hasher(config, Hasher::new())
    }

    /// Create a finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }
}

impl<H: ContentHasher> DuplicateFinder<H> {
    /// Create a finder with a custom content hasher.
    #[must_use]
    pub fn with_hasher(config: FinderConfig, hasher: H) -> Self {
        Self { config, hasher }
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Walk `root` and classify every file found.
    ///
    /// # Errors
    ///
    /// Fails on the first scan or read error; no partial result is returned.
    pub fn find_duplicates(&self, root: &Path) -> Result<Classification, FinderError> {
        self.classify(root, Walker::new(root).walk())
    }

    /// Classify scan entries (paths relative to `root`) in the given order.
    ///
    /// # Errors
    ///
    /// Fails on the first scan or read error; no partial result is returned.
    pub fn classify<I>(&self, root: &Path, entries: I) -> Result<Classification, FinderError>
    where
        I: IntoIterator<Item = Result<ScanEntry, ScanError>>,
    {
        let mut buckets = SizeBuckets::new();
        let mut result = Classification::default();

        for entry in entries {
            let entry = entry?;

            if entry.is_symlink {
                log::debug!("Skipping symlink: {}", entry.path.display());
                result.stats.symlinks_skipped += 1;
                continue;
            }
            result.stats.files_seen += 1;

            let candidate = FileEntry::new(entry.path, entry.size);
            let matched = self.find_match(
                root,
                buckets.members(candidate.size),
                &candidate,
                &mut result.stats,
            )?;

            match matched {
                Some(original) => {
                    log::info!("Found {}", candidate.path.display());
                    log::debug!(
                        "{} duplicates {}",
                        candidate.path.display(),
                        original.display()
                    );
                    result.stats.duplicates += 1;
                    result.stats.duplicate_bytes += candidate.size;
                    result.duplicates.push(Duplicate {
                        path: candidate.path,
                        size: candidate.size,
                        original,
                    });
                }
                None => {
                    result.originals.push(candidate.path.clone());
                    buckets.insert(candidate);
                }
            }
        }

        log::info!(
            "Classified {} files: {} duplicates across {} sizes",
            result.stats.files_seen,
            result.stats.duplicates,
            buckets.bucket_count()
        );

        Ok(result)
    }

    /// Find the bucket member whose content equals `candidate`'s.
    fn find_match(
        &self,
        root: &Path,
        members: &[FileEntry],
        candidate: &FileEntry,
        stats: &mut DetectStats,
    ) -> Result<Option<PathBuf>, FinderError> {
        if members.is_empty() {
            return Ok(None);
        }

        let prehash = *self.prehash(root, candidate, stats)?;
        for member in members {
            if *self.prehash(root, member, stats)? != prehash {
                continue;
            }
            stats.verifications += 1;
            if self.verify(root, member, candidate)? {
                return Ok(Some(member.path.clone()));
            }
            log::debug!(
                "Prehash collision without equal content: {} vs {}",
                member.path.display(),
                candidate.path.display()
            );
        }
        Ok(None)
    }

    fn prehash<'e>(
        &self,
        root: &Path,
        entry: &'e FileEntry,
        stats: &mut DetectStats,
    ) -> Result<&'e crate::scanner::Hash, HashError> {
        if !entry.has_partial_hash() {
            stats.prehashes += 1;
        }
        entry.partial_hash(root, &self.hasher, self.config.prehash_size)
    }

    /// Definitive comparison of two same-size files with equal prehashes.
    fn verify(
        &self,
        root: &Path,
        member: &FileEntry,
        candidate: &FileEntry,
    ) -> Result<bool, HashError> {
        match self.config.verify_mode {
            // The prehash already covered the whole content.
            VerifyMode::FullHash if candidate.size <= self.config.prehash_size as u64 => Ok(true),
            VerifyMode::FullHash => Ok(member.full_hash(root, &self.hasher)?
                == candidate.full_hash(root, &self.hasher)?),
            VerifyMode::ByteCompare => self
                .hasher
                .contents_equal(&root.join(&member.path), &root.join(&candidate.path)),
        }
    }
}
