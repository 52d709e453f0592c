//! Archive actions module.
//!
//! This module provides the two filesystem-mutating workflows:
//! - [`gather`]: relocate confirmed duplicates into numbered archive slots
//!   and record their original locations in a manifest
//! - [`restore`]: move every slot back to its original location and remove
//!   the archive
//!
//! Both are fail-fast. Detection happens entirely before the first file is
//! moved, so the scan never observes a tree that is being rearranged.
//!
//! ```no_run
//! use dupestash::actions::{gather_duplicates, restore};
//! use dupestash::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let report = gather_duplicates(Path::new("."), Path::new("../dupes"), &finder).unwrap();
//! println!("Gathered {} duplicates", report.manifest.len());
//!
//! let restored = restore(Path::new("../dupes")).unwrap();
//! assert_eq!(restored, report.manifest.len());
//! ```

pub mod gather;
pub mod restore;

use std::fs;
use std::io;
use std::path::Path;

// Re-export commonly used types
pub use gather::{gather_duplicates, Archiver, GatherError, GatherReport};
pub use restore::{restore, RestoreError, Restorer};

/// Move a file from `from` to `to`, refusing to replace an existing entry.
///
/// Uses a rename; when the two paths are on different filesystems the file
/// is copied and the source removed.
pub(crate) fn relocate(from: &Path, to: &Path) -> io::Result<()> {
    if fs::symlink_metadata(to).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "Cross-device move, copying {} to {}",
                from.display(),
                to.display()
            );
            if let Err(copy_err) = fs::copy(from, to) {
                let _ = fs::remove_file(to);
                return Err(copy_err);
            }
            if let Err(remove_err) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(remove_err);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
