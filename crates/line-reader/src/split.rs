//! File splits and split planning.

use crate::error::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A half-open byte range `[start, start + length)` of a named file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSplit {
    path: PathBuf,
    start: u64,
    length: u64,
}

impl FileSplit {
    /// Create a split, rejecting ranges whose end overflows `u64`.
    pub fn new(path: impl Into<PathBuf>, start: u64, length: u64) -> Result<Self> {
        if start.checked_add(length).is_none() {
            return Err(ReaderError::InvalidSplit(format!(
                "start {start} + length {length} overflows"
            )));
        }
        Ok(Self {
            path: path.into(),
            start,
            length,
        })
    }

    /// A split covering an entire file of `file_len` bytes.
    pub fn whole(path: impl Into<PathBuf>, file_len: u64) -> Self {
        Self {
            path: path.into(),
            start: 0,
            length: file_len,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    /// Exclusive end offset.
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Cut a file into contiguous splits of at most `split_size` bytes.
///
/// Splits are cut on byte boundaries only. The reader does not realign to a
/// line start, so a line crossing a boundary is read whole by the earlier
/// split and its tail is read again by the next one.
pub fn plan_splits(
    path: impl Into<PathBuf>,
    file_len: u64,
    split_size: u64,
) -> Result<Vec<FileSplit>> {
    if split_size == 0 {
        return Err(ReaderError::InvalidSplit(
            "split size must be greater than zero".to_string(),
        ));
    }

    let path = path.into();
    let mut splits = Vec::with_capacity(file_len.div_ceil(split_size) as usize);
    let mut start = 0;
    while start < file_len {
        let length = split_size.min(file_len - start);
        splits.push(FileSplit {
            path: path.clone(),
            start,
            length,
        });
        start += length;
    }

    tracing::debug!(
        "Planned {} splits of up to {} bytes for {}",
        splits.len(),
        split_size,
        path.display()
    );

    Ok(splits)
}
