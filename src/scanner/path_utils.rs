//! Path resolution utilities.
//!
//! The archiver must decide whether the archive target lies inside the
//! scanned tree before anything is created, so the target usually does not
//! exist yet. [`resolve_absolute`] canonicalizes the longest existing prefix
//! of a path and appends the remaining components, which makes the check
//! robust against relative paths, `..` segments and symlinked ancestors.
//!
//! # Example
//!
//! ```no_run
//! use dupestash::scanner::path_utils::{is_within, resolve_absolute};
//! use std::path::Path;
//!
//! let root = resolve_absolute(Path::new(".")).unwrap();
//! let target = resolve_absolute(Path::new("../archive")).unwrap();
//! assert!(!is_within(&target, &root));
//! ```

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` to an absolute path with symlinks resolved.
///
/// Relative paths are taken from the current working directory. Components
/// that do not exist yet are appended to the canonical form of their
/// deepest existing ancestor.
///
/// # Errors
///
/// Returns an error if the working directory cannot be determined or an
/// existing ancestor cannot be canonicalized.
pub fn resolve_absolute(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let normalized = normalize_lexically(&absolute);

    let mut existing = normalized.as_path();
    let mut missing: Vec<OsString> = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(mut resolved) => {
                for name in missing.iter().rev() {
                    resolved.push(name);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Remove `.` and `..` components without touching the filesystem.
///
/// `..` at the root is dropped, matching how the OS resolves it.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::CurDir | Component::ParentDir) | None => out.push(".."),
            },
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component);
            }
        }
    }
    out
}

/// Whether `path` equals `root` or lies beneath it.
///
/// Both paths are expected to be resolved with [`resolve_absolute`];
/// the comparison is component-wise, so `/data2` is not within `/data`.
#[must_use]
pub fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}
