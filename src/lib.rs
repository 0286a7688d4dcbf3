//! split-reader Library
//!
//! Decodes byte-range splits of large text files into offset-keyed line
//! records, the way a batch host's record reader would.
//!
//! # Crates
//!
//! - `split_reader_file` - Seekable file sources (local, in-memory)
//! - `split_reader_line` - The line record reader, splits, job configuration
//!
//! # CLI Usage
//!
//! ```bash
//! # Read a whole file as a single split
//! split-reader read data.csv
//!
//! # Read one explicit split
//! split-reader read data.csv --start 1048576 --length 1048576
//!
//! # Read every file in a directory, 64MB splits, keeping quoted newlines
//! split-reader read /data/exports/ --split-size 67108864 --quote-aware
//!
//! # Show how a file would be split
//! split-reader plan data.csv --split-size 67108864
//! ```

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use split_reader_file as file;
pub use split_reader_line as line;

use split_reader_file::ResolvedSource;
use split_reader_line::config::{BUFFER_SIZE_KEY, QUOTE_CHAR_KEY, QUOTE_MODE_KEY};
use split_reader_line::{
    plan_splits, FileSplit, JobConfig, LineRecord, LineRecordReader, RecordReader, TaskContext,
};

/// Which byte ranges of each file to read
#[derive(Args, Clone, Debug, Default)]
pub struct SplitOpts {
    /// Start offset of a single explicit split
    #[arg(long, conflicts_with = "split_size")]
    pub start: Option<u64>,

    /// Length of a single explicit split (default: to end of file)
    #[arg(long, conflicts_with = "split_size")]
    pub length: Option<u64>,

    /// Cut each file into splits of this many bytes
    #[arg(long)]
    pub split_size: Option<u64>,
}

/// Reader configuration
#[derive(Args, Clone, Debug, Default)]
pub struct ReaderOpts {
    /// YAML job configuration file
    #[arg(long, env = "SPLIT_READER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep newlines inside quoted fields within one record
    #[arg(long)]
    pub quote_aware: bool,

    /// Quote character for --quote-aware
    #[arg(long)]
    pub quote_char: Option<char>,

    /// Decoder buffer size in bytes
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Only read files with this extension when the source is a directory
    #[arg(long)]
    pub extension: Option<String>,
}

impl ReaderOpts {
    /// Build the job configuration: file values first, then CLI overrides.
    pub fn job_config(&self) -> Result<JobConfig> {
        let mut config = match &self.config {
            Some(path) => JobConfig::from_file(path)
                .with_context(|| format!("Failed to load job configuration from {path:?}"))?,
            None => JobConfig::new(),
        };
        if self.quote_aware {
            config.set(QUOTE_MODE_KEY, "quote-aware");
        }
        if let Some(quote) = self.quote_char {
            config.set(QUOTE_CHAR_KEY, quote.to_string());
        }
        if let Some(size) = self.buffer_size {
            config.set(BUFFER_SIZE_KEY, size.to_string());
        }
        Ok(config)
    }

    /// Apply the extension filter.
    pub fn select(&self, files: Vec<ResolvedSource>) -> Vec<ResolvedSource> {
        match &self.extension {
            Some(ext) => files
                .into_iter()
                .filter(|f| f.extension() == Some(ext.as_str()))
                .collect(),
            None => files,
        }
    }
}

/// Compute the splits to read for one file.
pub fn splits_for(path: &Path, file_len: u64, opts: &SplitOpts) -> Result<Vec<FileSplit>> {
    if let Some(split_size) = opts.split_size {
        return Ok(plan_splits(path, file_len, split_size)?);
    }

    let start = opts.start.unwrap_or(0);
    let length = match opts.length {
        Some(length) => length,
        None => file_len.saturating_sub(start),
    };
    Ok(vec![FileSplit::new(path, start, length)?])
}

/// One output line
#[derive(Debug, Serialize)]
pub struct OutputRecord<'a> {
    pub path: &'a Path,
    pub offset: u64,
    pub value: &'a LineRecord,
}

/// Totals for a read run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    pub files: usize,
    pub splits: usize,
    pub records: u64,
}

/// Read one split and write each record as a JSON line.
///
/// Returns the number of records written.
pub fn read_split<W: Write>(split: &FileSplit, ctx: &TaskContext, out: &mut W) -> Result<u64> {
    let mut reader = LineRecordReader::new();
    reader
        .initialize(split, ctx)
        .with_context(|| format!("Failed to initialize reader for {split:?}"))?;

    while reader.advance()? {
        let (Some(offset), Some(value)) = (reader.current_key(), reader.current_value()) else {
            break;
        };
        let record = OutputRecord {
            path: split.path(),
            offset,
            value,
        };
        serde_json::to_writer(&mut *out, &record)?;
        out.write_all(b"\n")?;
    }

    let records = reader.records_read();
    debug!(
        "Split {} [{}, {}) produced {} records (progress {:.2})",
        split.path().display(),
        split.start(),
        split.end(),
        records,
        reader.progress()
    );
    reader.close()?;
    Ok(records)
}

/// Read every split of every file, writing JSON lines to `out`.
pub fn read_files<W: Write>(
    files: &[ResolvedSource],
    split_opts: &SplitOpts,
    ctx: &TaskContext,
    out: &mut W,
) -> Result<ReadSummary> {
    let mut summary = ReadSummary::default();

    for file in files {
        let path = file.path();
        let file_len = ctx
            .file_system()
            .file_len(path)
            .with_context(|| format!("Failed to stat {}", file.display_name()))?;
        let splits = splits_for(path, file_len, split_opts)?;
        info!(
            "Reading {} ({} bytes) in {} splits",
            file.display_name(),
            file_len,
            splits.len()
        );

        for split in &splits {
            summary.records += read_split(split, ctx, out)?;
        }
        summary.files += 1;
        summary.splits += splits.len();
    }

    out.flush()?;
    info!(
        "Completed reading {} records from {} splits across {} files",
        summary.records, summary.splits, summary.files
    );
    Ok(summary)
}

/// Plan splits for every file.
pub fn plan_files(
    files: &[ResolvedSource],
    split_size: u64,
    ctx: &TaskContext,
) -> Result<Vec<FileSplit>> {
    let mut all = Vec::new();
    for file in files {
        let file_len = ctx
            .file_system()
            .file_len(file.path())
            .with_context(|| format!("Failed to stat {}", file.display_name()))?;
        all.extend(plan_splits(file.path(), file_len, split_size)?);
    }
    Ok(all)
}
