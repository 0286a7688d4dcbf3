//! Seekable file source abstraction for split-reader
//!
//! This crate provides the byte-stream side of split reading: a small
//! `FileSystem` trait handing out seekable streams, plus source resolution
//! for turning a CLI argument into concrete files.
//!
//! # Source Types
//!
//! - **Local**: Files or directories on the local filesystem
//! - **Memory**: Named in-memory buffers (tests and embedding hosts)
//!
//! # Directory Detection
//!
//! A local source is treated as a directory if it ends with `/`:
//! - `/data/` - Local directory
//!
//! # Example
//!
//! ```ignore
//! use split_reader_file::{FileSource, FileSystem, LocalFileSystem};
//!
//! let source = FileSource::parse("/data/files/")?;
//! let resolved = source.resolve().await?;
//!
//! let fs = LocalFileSystem;
//! for file in resolved.iter().filter(|f| f.extension() == Some("csv")) {
//!     let len = fs.file_len(file.path())?;
//!     let stream = fs.open(file.path())?;
//!     // Seek and read...
//! }
//! ```

mod local;
mod memory;

use anyhow::Result;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

pub use local::{list_directory, LocalFileSystem};
pub use memory::MemoryFileSystem;

/// Default buffer size for buffered decoding (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// A readable, seekable byte stream handed out by a [`FileSystem`].
pub trait SeekableRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekableRead for T {}

/// Filesystem abstraction supplying seekable byte streams.
///
/// Implementations must be shareable across tasks; each `open` call returns
/// an independent stream positioned at offset 0.
pub trait FileSystem: Send + Sync {
    /// Open the named file for reading.
    fn open(&self, path: &Path) -> Result<Box<dyn SeekableRead>>;

    /// Length of the named file in bytes.
    fn file_len(&self, path: &Path) -> Result<u64>;

    /// Short name used in log lines.
    fn scheme(&self) -> &'static str;
}

/// Unified source type representing a file location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Local filesystem path (file or directory if ends with /)
    Local(PathBuf),
}

impl FileSource {
    /// Parse a string into a FileSource
    ///
    /// Remote schemes are rejected since they cannot be opened as seekable
    /// streams here.
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.is_empty() {
            anyhow::bail!("Source must not be empty");
        }
        if let Some((scheme, _)) = uri.split_once("://") {
            anyhow::bail!("Unsupported source scheme '{scheme}': only local paths are supported");
        }
        Ok(FileSource::Local(PathBuf::from(uri)))
    }

    /// Check if this source represents a directory (ends with /)
    pub fn is_directory(&self) -> bool {
        match self {
            FileSource::Local(path) => {
                path.to_string_lossy().ends_with('/')
                    || path.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR)
            }
        }
    }

    /// Resolve this source into concrete file references
    ///
    /// If this is a directory, lists all immediate children (non-recursive).
    /// If this is a single file, returns it directly.
    pub async fn resolve(&self) -> Result<Vec<ResolvedSource>> {
        match self {
            FileSource::Local(path) => {
                if self.is_directory() {
                    list_directory(path).await
                } else {
                    Ok(vec![ResolvedSource::Local(path.clone())])
                }
            }
        }
    }

    /// Get a display name for logging
    pub fn display_name(&self) -> String {
        match self {
            FileSource::Local(path) => path.display().to_string(),
        }
    }
}

/// A resolved single file source ready for splitting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// Local file
    Local(PathBuf),
}

impl ResolvedSource {
    /// Path to hand to a [`FileSystem`]
    pub fn path(&self) -> &Path {
        match self {
            ResolvedSource::Local(path) => path,
        }
    }

    /// Get a display name for logging
    pub fn display_name(&self) -> String {
        match self {
            ResolvedSource::Local(path) => path.display().to_string(),
        }
    }

    /// Get the file extension (without the dot)
    pub fn extension(&self) -> Option<&str> {
        match self {
            ResolvedSource::Local(path) => path.extension().and_then(|e| e.to_str()),
        }
    }
}
