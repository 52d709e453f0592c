//! Archive manifest: which slot holds which original file.
//!
//! # Format
//!
//! An archive directory contains:
//! - `list.txt`: UTF-8 text, one absolute path per line, line `i` being the
//!   original location of slot `i`; every line ends with `\n`
//! - one file per slot, named by its decimal index (`0`, `1`, ...)
//!
//! ```text
//! archive/
//! ├── list.txt      /home/me/photos/copy.jpg\n/home/me/docs/a (1).pdf\n
//! ├── 0
//! └── 1
//! ```
//!
//! Slot indices are assigned from zero in discovery order, so the line
//! number is the slot index and no index is stored explicitly.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Name of the manifest file inside an archive directory.
pub const MANIFEST_FILE: &str = "list.txt";

/// One archived duplicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecord {
    /// Absolute path the duplicate was taken from
    pub original_path: PathBuf,
    /// Slot index inside the archive directory
    pub slot: usize,
}

/// Ordered slot → original-path mapping.
///
/// Invariant: `records()[i].slot == i` for every `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<DuplicateRecord>,
}

/// Errors reading or writing a manifest.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    /// The manifest file does not exist.
    #[error("manifest not found: {0}")]
    NotFound(PathBuf),

    /// The manifest exists but cannot be interpreted.
    #[error("malformed manifest {path} (line {line}): {reason}")]
    Malformed {
        /// Manifest file
        path: PathBuf,
        /// 1-based line number, 0 when the whole file is affected
        line: usize,
        /// What is wrong with it
        reason: String,
    },

    /// A path that cannot be written as a single manifest line.
    #[error("path cannot be recorded in a manifest (must be absolute UTF-8 without line breaks): {0}")]
    Unrepresentable(PathBuf),

    /// An I/O error occurred while accessing the manifest.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Manifest file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl Manifest {
    /// Build a manifest assigning slots `0..N` in iteration order.
    #[must_use]
    pub fn from_originals<I>(paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let records = paths
            .into_iter()
            .enumerate()
            .map(|(slot, original_path)| DuplicateRecord {
                original_path,
                slot,
            })
            .collect();
        Self { records }
    }

    /// Records in slot order.
    #[must_use]
    pub fn records(&self) -> &[DuplicateRecord] {
        &self.records
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the manifest has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in slot order.
    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateRecord> {
        self.records.iter()
    }

    /// Location of the manifest file inside `archive_dir`.
    #[must_use]
    pub fn manifest_path(archive_dir: &Path) -> PathBuf {
        archive_dir.join(MANIFEST_FILE)
    }

    /// Location of slot `slot` inside `archive_dir`.
    #[must_use]
    pub fn slot_path(archive_dir: &Path, slot: usize) -> PathBuf {
        archive_dir.join(slot.to_string())
    }

    /// Check that `path` can be stored as one manifest line.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Unrepresentable`] for relative paths,
    /// non-UTF-8 paths and paths containing a line break.
    pub fn check_representable(path: &Path) -> Result<&str, ManifestError> {
        match path.to_str() {
            Some(s) if path.is_absolute() && !s.contains(['\n', '\r']) => Ok(s),
            _ => Err(ManifestError::Unrepresentable(path.to_path_buf())),
        }
    }

    /// Render the manifest as `list.txt` content.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Unrepresentable`] if a path cannot be stored.
    pub fn to_text(&self) -> Result<String, ManifestError> {
        let mut text = String::new();
        for record in &self.records {
            text.push_str(Self::check_representable(&record.original_path)?);
            text.push('\n');
        }
        Ok(text)
    }

    /// Parse `list.txt` content. `source` is only used in error messages.
    ///
    /// A missing final line break is tolerated; blank lines are not.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Malformed`] on a blank or relative line.
    pub fn parse(source: &Path, text: &str) -> Result<Self, ManifestError> {
        let body = text.strip_suffix('\n').unwrap_or(text);
        if body.is_empty() {
            return Ok(Self::default());
        }

        let mut paths = Vec::new();
        for (index, line) in body.split('\n').enumerate() {
            let malformed = |reason: &str| ManifestError::Malformed {
                path: source.to_path_buf(),
                line: index + 1,
                reason: reason.to_string(),
            };
            if line.is_empty() {
                return Err(malformed("blank line"));
            }
            let path = PathBuf::from(line);
            if !path.is_absolute() {
                return Err(malformed("path is not absolute"));
            }
            paths.push(path);
        }
        Ok(Self::from_originals(paths))
    }

    /// Write `list.txt` into `archive_dir`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Fails if a path cannot be stored or the file cannot be written.
    pub fn write_to(&self, archive_dir: &Path) -> Result<(), ManifestError> {
        let path = Self::manifest_path(archive_dir);
        let text = self.to_text()?;
        let io_err = |source: io::Error| ManifestError::Io {
            path: path.clone(),
            source,
        };

        let mut file = File::create(&path).map_err(io_err)?;
        file.write_all(text.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        log::debug!("Wrote manifest {} ({} slots)", path.display(), self.len());
        Ok(())
    }

    /// Read `list.txt` from `archive_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::NotFound`] if the file is absent and
    /// [`ManifestError::Malformed`] if it is not valid UTF-8 or fails
    /// [`Manifest::parse`].
    pub fn read_from(archive_dir: &Path) -> Result<Self, ManifestError> {
        let path = Self::manifest_path(archive_dir);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound(path));
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(ManifestError::Malformed {
                    path,
                    line: 0,
                    reason: "not valid UTF-8".to_string(),
                });
            }
            Err(source) => return Err(ManifestError::Io { path, source }),
        };
        Self::parse(&path, &text)
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a DuplicateRecord;
    type IntoIter = std::slice::Iter<'a, DuplicateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
