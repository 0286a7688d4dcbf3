//! Error types for the line record reader.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring or driving a record reader.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The split's file could not be opened.
    #[error("Failed to open '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Seeking to the split start failed.
    #[error("Failed to seek '{}' to offset {offset}: {source}", .path.display())]
    Seek {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// Reading a record failed.
    #[error("Failed to read record at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// `advance` was called before `initialize`.
    #[error("Reader has not been initialized with a split")]
    NotInitialized,

    /// `initialize` was called on a reader that already has a split.
    #[error("Reader is already initialized")]
    AlreadyInitialized,

    /// The reader was closed.
    #[error("Reader is closed")]
    Closed,

    /// Split bounds are unusable.
    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    /// A configuration value could not be interpreted.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("Failed to read configuration '{}': {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T, E = ReaderError> = std::result::Result<T, E>;
