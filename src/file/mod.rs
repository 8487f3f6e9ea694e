//! Input abstraction for module images.
//!
//! A [`crate::file::File`] owns the raw bytes of one module image, either memory-mapped
//! from disk or handed over as an owned buffer. The [`crate::file::Backend`] trait hides
//! the difference so the parsing layer sees a plain byte slice either way.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilpatch::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("StartupModule.cmod"))?;
//! println!("{} bytes", file.len());
//! # Ok::<(), cilpatch::Error>(())
//! ```

pub(crate) mod io;
mod parser;

pub use parser::Parser;

use std::{fs, path::Path};

use memmap2::Mmap;

use crate::{Error::OutOfBounds, Result};

/// Backing storage for one loaded module image.
pub trait Backend {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// Input file backed by a memory mapping.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Map the file at `path` into memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: &Path) -> Result<Physical> {
        let file = fs::File::open(path)?;

        // SAFETY: the mapping is read-only and lives as long as `Physical`
        let data = unsafe { Mmap::map(&file)? };
        Ok(Physical { data })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[offset..end])
    }

    fn data(&self) -> &[u8] {
        &self.data
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

/// Input file backed by memory.
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create a new memory backend.
    ///
    /// ## Arguments
    /// * 'data' - The data buffer to consume
    #[must_use]
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[offset..end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

/// One loaded module image, ready for parsing.
pub struct File {
    backend: Box<dyn Backend>,
}

impl File {
    /// Load a module image from disk via memory mapping.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be accessed, or
    /// [`crate::Error::Empty`] if it contains no data.
    pub fn from_file(path: &Path) -> Result<File> {
        let backend = Physical::new(path)?;
        if backend.len() == 0 {
            return Err(crate::Error::Empty);
        }

        Ok(File {
            backend: Box::new(backend),
        })
    }

    /// Wrap an already-loaded byte buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if the buffer contains no data.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        if data.is_empty() {
            return Err(crate::Error::Empty);
        }

        Ok(File {
            backend: Box::new(Memory::new(data)),
        })
    }

    /// Access the full image contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.backend.data()
    }

    /// Bounds-checked slice of the image contents.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the requested range exceeds the image.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.backend.data_slice(offset, len)
    }

    /// Total image size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// `true` if the image holds no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_bounds() {
        let mem = Memory::new(vec![1, 2, 3, 4]);
        assert_eq!(mem.data_slice(1, 2).unwrap(), &[2, 3]);
        assert!(mem.data_slice(3, 2).is_err());
        assert!(mem.data_slice(usize::MAX, 2).is_err());
    }

    #[test]
    fn from_mem_rejects_empty() {
        assert!(matches!(File::from_mem(Vec::new()), Err(crate::Error::Empty)));
    }

    #[test]
    fn from_mem_exposes_data() {
        let file = File::from_mem(vec![0xCA, 0xFE]).unwrap();
        assert_eq!(file.data(), &[0xCA, 0xFE]);
        assert_eq!(file.len(), 2);
        assert!(!file.is_empty());
    }
}
