//! Memory-mapped file I/O for fast image decoding.
//!
//! Uses OS-level memory mapping to eliminate kernel copy overhead
//! when reading large image files.

use crate::error::LoadError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read file bytes using memory-mapped I/O for large files.
///
/// For files >= 1MB, uses memory mapping which avoids copying data from
/// kernel to user space. For smaller files, uses standard fs::read()
/// which is faster due to lower overhead.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, LoadError> {
    let metadata = std::fs::metadata(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if metadata.len() >= MMAP_THRESHOLD {
        read_mmap(path)
    } else {
        read_standard(path)
    }
}

fn read_mmap(path: &Path) -> Result<FileBytes, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    // SAFETY: We're only reading the file, and we hold the file handle
    // for the lifetime of the mmap.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(FileBytes::Mmap(mmap))
}

fn read_standard(path: &Path) -> Result<FileBytes, LoadError> {
    let bytes = std::fs::read(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(FileBytes::Vec(bytes))
}

/// File bytes that may be either owned or memory-mapped.
///
/// This abstraction allows callers to use the bytes transparently
/// regardless of how they were read.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes (zero-copy from disk)
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}
