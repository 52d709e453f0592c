//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-keyed buckets with memoized per-file hashes
//! - Prehash comparison within a bucket
//! - Full hash or byte-by-byte confirmation

pub mod finder;
pub mod groups;

pub use finder::{
    Classification, DetectStats, Duplicate, DuplicateFinder, FinderConfig, FinderError,
    VerifyMode,
};
pub use groups::{FileEntry, SizeBuckets};
