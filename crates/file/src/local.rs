//! Local filesystem implementation

use crate::{FileSystem, ResolvedSource, SeekableRead};
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

/// Opens files on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn open(&self, path: &Path) -> Result<Box<dyn SeekableRead>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        Ok(Box::new(file))
    }

    fn file_len(&self, path: &Path) -> Result<u64> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to get metadata for: {}", path.display()))?;
        Ok(metadata.len())
    }

    fn scheme(&self) -> &'static str {
        "file"
    }
}

/// List all files in a directory (non-recursive, immediate children only)
///
/// Returns only files, not subdirectories.
pub async fn list_directory(path: &Path) -> Result<Vec<ResolvedSource>> {
    let mut results = Vec::new();

    let mut entries = tokio::fs::read_dir(path)
        .await
        .with_context(|| format!("Failed to read directory: {}", path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let entry_path = entry.path();
        let metadata = entry
            .metadata()
            .await
            .with_context(|| format!("Failed to get metadata for: {}", entry_path.display()))?;

        if metadata.is_file() {
            results.push(ResolvedSource::Local(entry_path));
        }
    }

    // Sort for consistent ordering
    results.sort_by_key(|a| a.display_name());

    tracing::debug!(
        "Listed {} files in directory: {}",
        results.len(),
        path.display()
    );

    Ok(results)
}
