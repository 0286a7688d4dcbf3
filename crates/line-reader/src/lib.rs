//! Split-bounded line record reader
//!
//! A batch host cuts large text files into byte-range splits and hands each
//! split to a task. This crate decodes one split into records, one per line,
//! keyed by the byte offset where the line starts.
//!
//! # Split Boundaries
//!
//! - Reading starts exactly at the split start; a partial first line is not
//!   skipped.
//! - A record is started only while the position is before the split end, but
//!   once started it is read through its newline (or end of file), so the last
//!   record may straddle the end.
//!
//! # Record Boundaries
//!
//! [`QuoteMode::Naive`] ends a record at every newline. [`QuoteMode::QuoteAware`]
//! ignores newlines inside quoted fields, which keeps multi-line CSV values in
//! one record. Naive is the default.
//!
//! # Example
//!
//! ```ignore
//! use split_reader_line::{plan_splits, LineRecordReader, RecordReader, TaskContext};
//!
//! let ctx = TaskContext::default();
//! let len = ctx.file_system().file_len("data.csv".as_ref())?;
//! for split in plan_splits("data.csv", len, 64 * 1024 * 1024)? {
//!     let mut reader = LineRecordReader::new();
//!     reader.initialize(&split, &ctx)?;
//!     for record in reader.records() {
//!         let (offset, line) = record?;
//!         // Process line...
//!     }
//!     reader.close()?;
//! }
//! ```

pub mod config;
mod error;
mod reader;
mod record;
mod scan;
mod split;

pub use config::{JobConfig, QuoteMode, ReaderOptions, TaskContext};
pub use error::{ReaderError, Result};
pub use reader::{LineRecordReader, ReaderCloser, Records};
pub use record::LineRecord;
pub use split::{plan_splits, FileSplit};

// Re-export file source types for convenience
pub use split_reader_file::{
    FileSource, FileSystem, LocalFileSystem, MemoryFileSystem, ResolvedSource,
};

/// Pull-based record reader driven by a batch host.
///
/// The host calls `initialize` once, then `advance` until it returns
/// `false`, reading `current_key`/`current_value` after each `true`, and
/// finally `close`.
pub trait RecordReader {
    type Key;
    type Value;

    /// Bind the reader to a split and open its stream.
    fn initialize(&mut self, split: &FileSplit, context: &TaskContext) -> Result<()>;

    /// Move to the next record. Returns `false` when the split is exhausted.
    fn advance(&mut self) -> Result<bool>;

    /// Key of the current record, if any.
    fn current_key(&self) -> Option<Self::Key>;

    /// Value of the current record, if any.
    fn current_value(&self) -> Option<&Self::Value>;

    /// Fraction of the split consumed, in `[0, 1]`.
    fn progress(&self) -> f32;

    /// Release the underlying stream. Safe to call more than once.
    fn close(&mut self) -> Result<()>;
}
