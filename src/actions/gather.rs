//! Relocation of duplicates into an archive directory.
//!
//! # Overview
//!
//! The [`Archiver`] places the `i`-th duplicate at `<archive>/<i>` and
//! writes `list.txt` recording each slot's original absolute path (see
//! [`crate::manifest`]).
//!
//! # Safety
//!
//! - The archive may not be the scanned tree or lie inside it; it would
//!   otherwise be picked up by the next scan. Paths are compared after
//!   resolving symlinks and `..`.
//! - An existing archive is never overwritten: the target must be absent
//!   or an empty directory.
//! - If any move or the manifest write fails, the slots placed so far are
//!   moved back and the directories created by this run, parents included,
//!   are removed, so a failed gather leaves the tree as it was.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::duplicates::{DetectStats, DuplicateFinder, FinderError};
use crate::error::ErrorCategory;
use crate::manifest::{Manifest, ManifestError};
use crate::scanner::path_utils::{is_within, resolve_absolute};
use crate::scanner::ContentHasher;

use super::relocate;

/// Errors that can occur while gathering duplicates.
#[derive(thiserror::Error, Debug)]
pub enum GatherError {
    /// The archive target overlaps the scanned tree or an existing archive.
    #[error("cannot use {target} as archive: {reason}")]
    Conflict {
        /// Resolved archive target
        target: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// Duplicate detection failed.
    #[error(transparent)]
    Find(#[from] FinderError),

    /// The manifest could not be built or written.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A duplicate could not be moved into its slot.
    #[error("failed to move {from} to {to}: {source}")]
    Move {
        /// Original location
        from: PathBuf,
        /// Slot location
        to: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl GatherError {
    /// User-facing category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Conflict { .. } => ErrorCategory::Conflict,
            Self::Find(e) => e.category(),
            Self::Manifest(_) | Self::Move { .. } | Self::Io { .. } => ErrorCategory::Io,
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of a completed gather.
#[derive(Debug, Clone)]
pub struct GatherReport {
    /// Resolved archive directory
    pub archive_dir: PathBuf,
    /// Slot → original path mapping that was written
    pub manifest: Manifest,
    /// Detection counters
    pub stats: DetectStats,
}

/// Places duplicates from one scan root into one archive directory.
#[derive(Debug, Clone)]
pub struct Archiver {
    root: PathBuf,
    target: PathBuf,
}

impl Archiver {
    /// Resolve `root` and `target` and check that they may be used together.
    ///
    /// # Errors
    ///
    /// Returns [`GatherError::Conflict`] if the target is the root, lies
    /// inside it, or exists and is not an empty directory. Nothing is
    /// created.
    pub fn new(root: &Path, target: &Path) -> Result<Self, GatherError> {
        let root = resolve_absolute(root).map_err(|e| GatherError::io(root, e))?;
        let target = resolve_absolute(target).map_err(|e| GatherError::io(target, e))?;

        if is_within(&target, &root) {
            return Err(GatherError::Conflict {
                target,
                reason: format!("it lies inside the scanned tree {}", root.display()),
            });
        }

        match fs::symlink_metadata(&target) {
            Ok(metadata) if !metadata.is_dir() => {
                return Err(GatherError::Conflict {
                    target,
                    reason: "it exists and is not a directory".to_string(),
                });
            }
            Ok(_) => {
                let mut entries = fs::read_dir(&target).map_err(|e| GatherError::io(&target, e))?;
                if entries.next().is_some() {
                    return Err(GatherError::Conflict {
                        target,
                        reason: "it is not empty".to_string(),
                    });
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(GatherError::io(&target, e)),
        }

        log::debug!(
            "Archiving duplicates of {} into {}",
            root.display(),
            target.display()
        );
        Ok(Self { root, target })
    }

    /// Resolved scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolved archive directory.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move `duplicates` (relative to the root, in discovery order) into
    /// numbered slots and write the manifest.
    ///
    /// # Errors
    ///
    /// Fails before touching anything if a path cannot be recorded.
    /// Any later failure is rolled back before the error is returned.
    pub fn gather(&self, duplicates: &[PathBuf]) -> Result<Manifest, GatherError> {
        let manifest = Manifest::from_originals(duplicates.iter().map(|p| self.root.join(p)));
        for record in &manifest {
            Manifest::check_representable(&record.original_path)?;
        }

        let created_from = first_missing_ancestor(&self.target);
        fs::create_dir_all(&self.target).map_err(|e| GatherError::io(&self.target, e))?;

        let mut placed = 0;
        if let Err(e) = self.place_all(&manifest, &mut placed) {
            log::error!("Gather failed after {} of {} slots: {}", placed, manifest.len(), e);
            self.rollback(&manifest, placed, created_from.as_deref());
            return Err(e);
        }

        log::info!(
            "Archived {} duplicates into {}",
            manifest.len(),
            self.target.display()
        );
        Ok(manifest)
    }

    fn place_all(&self, manifest: &Manifest, placed: &mut usize) -> Result<(), GatherError> {
        for record in manifest {
            let slot = Manifest::slot_path(&self.target, record.slot);
            relocate(&record.original_path, &slot).map_err(|source| GatherError::Move {
                from: record.original_path.clone(),
                to: slot.clone(),
                source,
            })?;
            log::debug!("Slot {}: {}", record.slot, record.original_path.display());
            *placed += 1;
        }
        manifest.write_to(&self.target)?;
        Ok(())
    }

    /// Undo the first `placed` slots, newest first, then remove the
    /// directories this run created, from the target up to `created_from`.
    fn rollback(&self, manifest: &Manifest, placed: usize, created_from: Option<&Path>) {
        for record in manifest.records()[..placed].iter().rev() {
            let slot = Manifest::slot_path(&self.target, record.slot);
            if let Err(e) = relocate(&slot, &record.original_path) {
                log::warn!(
                    "Rollback could not return slot {} to {}: {}",
                    slot.display(),
                    record.original_path.display(),
                    e
                );
            }
        }

        let manifest_path = Manifest::manifest_path(&self.target);
        if let Err(e) = fs::remove_file(&manifest_path) {
            if e.kind() != io::ErrorKind::NotFound {
                log::warn!("Rollback could not remove {}: {}", manifest_path.display(), e);
            }
        }

        // remove_dir only succeeds on an empty directory, so anything the
        // rollback could not move back stays where it is.
        let Some(created_from) = created_from else {
            return;
        };
        for dir in self.target.ancestors() {
            if let Err(e) = fs::remove_dir(dir) {
                log::warn!("Rollback could not remove {}: {}", dir.display(), e);
                break;
            }
            if dir == created_from {
                break;
            }
        }
    }
}

/// Outermost ancestor of `path` (possibly `path` itself) that does not exist
/// yet, i.e. the first directory `create_dir_all` would create.
fn first_missing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .take_while(|p| fs::symlink_metadata(p).is_err())
        .last()
        .map(Path::to_path_buf)
}

/// Scan `root`, classify its files and archive the duplicates in `target`.
///
/// The target is validated before the scan starts, so a conflicting target
/// fails without reading any file.
///
/// # Errors
///
/// Returns the first conflict, scan, read, or move error.
pub fn gather_duplicates<H: ContentHasher>(
    root: &Path,
    target: &Path,
    finder: &DuplicateFinder<H>,
) -> Result<GatherReport, GatherError> {
    let archiver = Archiver::new(root, target)?;
    let classification = finder.find_duplicates(archiver.root())?;
    let manifest = archiver.gather(&classification.duplicate_paths())?;

    Ok(GatherReport {
        archive_dir: archiver.target().to_path_buf(),
        manifest,
        stats: classification.stats,
    })
}
