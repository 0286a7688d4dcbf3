//! In-memory filesystem

use crate::{FileSystem, SeekableRead};
use anyhow::Result;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Named byte buffers served as seekable streams.
///
/// Buffers are shared, so opening a file never copies its contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: HashMap<PathBuf, Arc<[u8]>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files
            .insert(path.into(), Arc::from(contents.into().into_boxed_slice()));
    }

    /// Builder form of [`MemoryFileSystem::insert`].
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    fn get(&self, path: &Path) -> Result<&Arc<[u8]>> {
        self.files
            .get(path)
            .ok_or_else(|| anyhow::anyhow!("No such in-memory file: {}", path.display()))
    }
}

/// `AsRef<[u8]>` wrapper so a shared buffer can back a `Cursor`.
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FileSystem for MemoryFileSystem {
    fn open(&self, path: &Path) -> Result<Box<dyn SeekableRead>> {
        let bytes = self.get(path)?.clone();
        Ok(Box::new(Cursor::new(SharedBytes(bytes))))
    }

    fn file_len(&self, path: &Path) -> Result<u64> {
        Ok(self.get(path)?.len() as u64)
    }

    fn scheme(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom};

    #[test]
    fn test_open_independent_streams() {
        let fs = MemoryFileSystem::new().with_file("/t.csv", "a,b\nc,d\n");

        let mut first = fs.open(Path::new("/t.csv")).unwrap();
        let mut second = fs.open(Path::new("/t.csv")).unwrap();
        first.seek(SeekFrom::Start(4)).unwrap();

        let mut a = String::new();
        first.read_to_string(&mut a).unwrap();
        let mut b = String::new();
        second.read_to_string(&mut b).unwrap();

        assert_eq!(a, "c,d\n");
        assert_eq!(b, "a,b\nc,d\n");
        assert_eq!(fs.file_len(Path::new("/t.csv")).unwrap(), 8);
    }

    #[test]
    fn test_missing_file() {
        let fs = MemoryFileSystem::new();
        assert!(fs.open(Path::new("/missing")).is_err());
        assert!(fs.file_len(Path::new("/missing")).is_err());
    }
}
