//! Restoration of an archive produced by [`super::gather`].
//!
//! The archive is validated in full before the first file is moved:
//! the directory, the manifest and every slot file must exist, and no
//! original location may be occupied. Slots are then moved back in order;
//! the first failure stops the run. Once every slot is back in place the
//! archive directory is deleted.
//!
//! A stopped run can be repeated: slots that are gone from the archive and
//! whose original location exists again are taken as already restored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ErrorCategory;
use crate::manifest::{DuplicateRecord, Manifest, ManifestError};

use super::relocate;

/// Errors that can occur while restoring an archive.
#[derive(thiserror::Error, Debug)]
pub enum RestoreError {
    /// The archive directory does not exist or is not a directory.
    #[error("archive directory not found: {0}")]
    NotFound(PathBuf),

    /// The manifest is missing, malformed or unreadable.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The manifest names a slot the archive does not hold.
    #[error("archive {archive} is missing slot {slot}")]
    MissingSlot {
        /// Archive directory
        archive: PathBuf,
        /// Slot index named by the manifest
        slot: usize,
    },

    /// Something already exists at a slot's original location.
    #[error("cannot restore slot {slot}: {path} already exists")]
    DestinationExists {
        /// Slot index
        slot: usize,
        /// Occupied original location
        path: PathBuf,
    },

    /// A slot could not be moved back.
    #[error("failed to restore slot {slot} to {to}: {source}")]
    Move {
        /// Slot index
        slot: usize,
        /// Original location
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

impl RestoreError {
    /// User-facing category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) | Self::MissingSlot { .. } => ErrorCategory::NotFound,
            Self::Manifest(ManifestError::NotFound(_) | ManifestError::Malformed { .. }) => {
                ErrorCategory::NotFound
            }
            Self::Manifest(_)
            | Self::DestinationExists { .. }
            | Self::Move { .. }
            | Self::Io { .. } => ErrorCategory::Io,
        }
    }
}

/// Moves the slots of one archive back to their original locations.
#[derive(Debug, Clone)]
pub struct Restorer {
    archive_dir: PathBuf,
}

impl Restorer {
    /// Create a restorer for `archive_dir`.
    #[must_use]
    pub fn new(archive_dir: &Path) -> Self {
        Self {
            archive_dir: archive_dir.to_path_buf(),
        }
    }

    /// Archive directory this restorer reads.
    #[must_use]
    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Read the manifest and check that every slot is present.
    ///
    /// A record whose slot is gone while its original location is occupied
    /// counts as already restored, so a run that stopped part way can be
    /// repeated.
    ///
    /// # Errors
    ///
    /// Returns a not-found class error if the archive, its manifest or a
    /// slot is missing, or if the manifest is malformed.
    pub fn load_manifest(&self) -> Result<Manifest, RestoreError> {
        let archive = self.resolve_archive()?;
        let manifest = Manifest::read_from(&archive)?;
        Self::pending_records(&archive, &manifest)?;
        Ok(manifest)
    }

    /// Restore every slot still in the archive and delete the archive
    /// directory.
    ///
    /// Returns the number of files moved back by this call.
    ///
    /// # Errors
    ///
    /// Validation errors leave the filesystem untouched. A move failure
    /// stops the run; slots restored before it stay restored and the
    /// archive keeps the rest.
    pub fn restore(&self) -> Result<usize, RestoreError> {
        let archive = self.resolve_archive()?;
        let manifest = Manifest::read_from(&archive)?;
        let pending = Self::pending_records(&archive, &manifest)?;

        for record in &pending {
            if fs::symlink_metadata(&record.original_path).is_ok() {
                return Err(RestoreError::DestinationExists {
                    slot: record.slot,
                    path: record.original_path.clone(),
                });
            }
        }

        for record in &pending {
            let slot = Manifest::slot_path(&archive, record.slot);
            relocate(&slot, &record.original_path).map_err(|source| RestoreError::Move {
                slot: record.slot,
                to: record.original_path.clone(),
                source,
            })?;
            log::debug!("Restored {}", record.original_path.display());
        }

        fs::remove_dir_all(&archive).map_err(|source| RestoreError::Io {
            path: archive.clone(),
            source,
        })?;
        if self.archive_dir != archive
            && fs::symlink_metadata(&self.archive_dir).is_ok_and(|m| m.file_type().is_symlink())
        {
            fs::remove_file(&self.archive_dir).map_err(|source| RestoreError::Io {
                path: self.archive_dir.clone(),
                source,
            })?;
        }

        let skipped = manifest.len() - pending.len();
        if skipped > 0 {
            log::info!("{} duplicates were already back in place", skipped);
        }
        log::info!(
            "Restored {} duplicates from {}",
            pending.len(),
            archive.display()
        );
        Ok(pending.len())
    }

    /// Check the archive is a directory and resolve symlinks in its path,
    /// so the real directory is read and removed rather than a link to it.
    fn resolve_archive(&self) -> Result<PathBuf, RestoreError> {
        let io_err = |source: io::Error| RestoreError::Io {
            path: self.archive_dir.clone(),
            source,
        };
        match fs::metadata(&self.archive_dir) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(RestoreError::NotFound(self.archive_dir.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(RestoreError::NotFound(self.archive_dir.clone()));
            }
            Err(source) => return Err(io_err(source)),
        }
        fs::canonicalize(&self.archive_dir).map_err(io_err)
    }

    /// Records whose slot file is still in `archive`.
    fn pending_records<'m>(
        archive: &Path,
        manifest: &'m Manifest,
    ) -> Result<Vec<&'m DuplicateRecord>, RestoreError> {
        let mut pending = Vec::with_capacity(manifest.len());
        for record in manifest {
            let slot = Manifest::slot_path(archive, record.slot);
            if fs::symlink_metadata(&slot).is_ok_and(|m| m.is_file()) {
                pending.push(record);
            } else if fs::symlink_metadata(&record.original_path).is_ok() {
                log::debug!("Slot {} already restored", record.slot);
            } else {
                return Err(RestoreError::MissingSlot {
                    archive: archive.to_path_buf(),
                    slot: record.slot,
                });
            }
        }
        Ok(pending)
    }
}

/// Restore the archive at `archive_dir`.
///
/// # Errors
///
/// See [`Restorer::restore`].
pub fn restore(archive_dir: &Path) -> Result<usize, RestoreError> {
    Restorer::new(archive_dir).restore()
}
