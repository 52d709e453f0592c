//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct, the production
//! implementation of [`ContentHasher`]. It computes:
//! - **Partial hashes** over at most the first [`PREHASH_SIZE`] bytes
//! - **Full hashes** over the entire content, streamed in fixed chunks
//! - **Byte comparisons** of two files for paranoid verification
//!
//! File handles are opened per call and dropped on every exit path.
//!
//! # Example
//!
//! ```no_run
//! use dupestash::scanner::{hash_to_hex, ContentHasher, Hasher, PREHASH_SIZE};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let prehash = hasher.partial_hash(Path::new("a.bin"), PREHASH_SIZE).unwrap();
//! println!("{}", hash_to_hex(&prehash));
//! ```

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use super::HashError;

/// BLAKE3 digest of file content.
pub type Hash = [u8; 32];

/// Number of leading bytes covered by a partial hash.
pub const PREHASH_SIZE: usize = 4096;

/// Read buffer used for streaming full hashes and comparisons.
const BUFFER_SIZE: usize = 64 * 1024;

/// Capability to read and compare file contents.
///
/// The duplicate finder is generic over this trait so tests can observe
/// which files get read.
pub trait ContentHasher {
    /// Hash at most the first `limit` bytes of the file.
    ///
    /// Files shorter than `limit` hash whatever bytes exist, so for them
    /// the partial hash equals the full hash.
    fn partial_hash(&self, path: &Path, limit: usize) -> Result<Hash, HashError>;

    /// Hash the complete file content.
    fn full_hash(&self, path: &Path) -> Result<Hash, HashError>;

    /// Compare the complete contents of two files byte by byte.
    fn contents_equal(&self, a: &Path, b: &Path) -> Result<bool, HashError>;
}

/// Streaming BLAKE3 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default 64 KiB read buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: BUFFER_SIZE,
        }
    }

    /// Use a custom read buffer size (at least one byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    fn open(path: &Path) -> Result<File, HashError> {
        File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))
    }

    fn hash_reader<R: Read>(&self, path: &Path, mut reader: R) -> Result<Hash, HashError> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path.to_path_buf(), e)),
            };
            hasher.update(&buffer[..n]);
        }
        Ok(*hasher.finalize().as_bytes())
    }
}

impl ContentHasher for Hasher {
    fn partial_hash(&self, path: &Path, limit: usize) -> Result<Hash, HashError> {
        let file = Self::open(path)?;
        let hash = self.hash_reader(path, file.take(limit as u64))?;
        log::trace!("Prehash {}: {}", path.display(), hash_to_hex(&hash));
        Ok(hash)
    }

    fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let file = Self::open(path)?;
        let hash = self.hash_reader(path, file)?;
        log::trace!("Full hash {}: {}", path.display(), hash_to_hex(&hash));
        Ok(hash)
    }

    fn contents_equal(&self, a: &Path, b: &Path) -> Result<bool, HashError> {
        let mut reader_a = BufReader::new(Self::open(a)?);
        let mut reader_b = BufReader::new(Self::open(b)?);
        let mut buf_a = vec![0u8; self.buffer_size];
        let mut buf_b = vec![0u8; self.buffer_size];

        loop {
            let n_a = fill(&mut reader_a, &mut buf_a)
                .map_err(|e| HashError::from_io(a.to_path_buf(), e))?;
            let n_b = fill(&mut reader_b, &mut buf_b)
                .map_err(|e| HashError::from_io(b.to_path_buf(), e))?;

            if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
                return Ok(false);
            }
            if n_a == 0 {
                return Ok(true);
            }
        }
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Render a hash as lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}
