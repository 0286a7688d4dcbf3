//! Split-bounded line record reader.

use crate::config::{ReaderOptions, TaskContext};
use crate::error::{ReaderError, Result};
use crate::record::LineRecord;
use crate::scan::read_record;
use crate::split::FileSplit;
use crate::RecordReader;
use split_reader_file::SeekableRead;
use std::io::{BufReader, Seek, SeekFrom};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

type Stream = BufReader<Box<dyn SeekableRead>>;

/// Shared slot holding the open stream. `None` once closed.
type StreamSlot = Arc<Mutex<Option<Stream>>>;

fn lock(slot: &StreamSlot) -> MutexGuard<'_, Option<Stream>> {
    // A panic mid-read leaves the stream in an unknown position, but releasing
    // it is still correct, so poisoning is ignored.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reads one record per line from a byte-range split of a file.
///
/// Keys are absolute byte offsets of each record's first byte. Values are
/// freshly built [`LineRecord`]s, so callers may keep clones across calls.
///
/// The reader starts exactly at the split start, without skipping a partial
/// first line, and keeps reading past the split end to finish the last
/// record it started.
///
/// A failed read releases the stream; later `advance` calls return
/// [`ReaderError::Closed`].
///
/// # Example
///
/// ```ignore
/// use split_reader_line::{FileSplit, LineRecordReader, RecordReader, TaskContext};
///
/// let split = FileSplit::new("/data/events.csv", 0, 1 << 20)?;
/// let mut reader = LineRecordReader::new();
/// reader.initialize(&split, &TaskContext::default())?;
/// while reader.advance()? {
///     let offset = reader.current_key().unwrap();
///     let line = reader.current_value().unwrap();
///     println!("{offset}: {}", line.text);
/// }
/// reader.close()?;
/// ```
pub struct LineRecordReader {
    split: Option<FileSplit>,
    options: ReaderOptions,
    start: u64,
    end: u64,
    pos: u64,
    stream: StreamSlot,
    key: Option<u64>,
    value: Option<LineRecord>,
    buf: Vec<u8>,
    records_read: u64,
}

impl Default for LineRecordReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineRecordReader {
    /// Create an empty reader; call [`RecordReader::initialize`] before use.
    pub fn new() -> Self {
        Self {
            split: None,
            options: ReaderOptions::default(),
            start: 0,
            end: 0,
            pos: 0,
            stream: Arc::new(Mutex::new(None)),
            key: None,
            value: None,
            buf: Vec::new(),
            records_read: 0,
        }
    }

    /// Handle that can close this reader from another thread.
    pub fn closer(&self) -> ReaderCloser {
        ReaderCloser {
            stream: Arc::clone(&self.stream),
        }
    }

    /// The split this reader was initialized with.
    pub fn split(&self) -> Option<&FileSplit> {
        self.split.as_ref()
    }

    /// Options resolved at initialization.
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Current byte position. May exceed the split end after a straddling record.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Number of records produced so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Whether the stream has been released.
    pub fn is_closed(&self) -> bool {
        self.split.is_some() && lock(&self.stream).is_none()
    }

    /// Iterate over the remaining records as owned `(offset, record)` pairs.
    pub fn records(&mut self) -> Records<'_> {
        Records {
            reader: self,
            done: false,
        }
    }

    fn clear_current(&mut self) {
        self.key = None;
        self.value = None;
    }
}

impl RecordReader for LineRecordReader {
    type Key = u64;
    type Value = LineRecord;

    fn initialize(&mut self, split: &FileSplit, context: &TaskContext) -> Result<()> {
        if self.split.is_some() {
            return Err(ReaderError::AlreadyInitialized);
        }

        let options = ReaderOptions::from_config(context.config())?;
        let start = split.start();
        let end = split.end();
        let path = split.path();

        let mut file = context
            .file_system()
            .open(path)
            .map_err(|e| ReaderError::Open {
                path: path.to_path_buf(),
                source: e.into(),
            })?;

        if start != 0 {
            file.seek(SeekFrom::Start(start))
                .map_err(|source| ReaderError::Seek {
                    path: path.to_path_buf(),
                    offset: start,
                    source,
                })?;
        }

        *lock(&self.stream) = Some(BufReader::with_capacity(options.buffer_size, file));
        self.split = Some(split.clone());
        self.options = options;
        self.start = start;
        self.end = end;
        self.pos = start;

        debug!(
            "Task {} reading {}://{} [{}, {}) in {} mode",
            context.task_id(),
            context.file_system().scheme(),
            path.display(),
            start,
            end,
            options.quote_mode
        );

        Ok(())
    }

    fn advance(&mut self) -> Result<bool> {
        if self.split.is_none() {
            return Err(ReaderError::NotInitialized);
        }

        let stream = Arc::clone(&self.stream);
        let mut guard = lock(&stream);
        let Some(reader) = guard.as_mut() else {
            return Err(ReaderError::Closed);
        };

        if self.pos >= self.end {
            self.clear_current();
            return Ok(false);
        }

        let offset = self.pos;
        self.buf.clear();
        let consumed = match read_record(reader, self.options.quote_mode, &mut self.buf) {
            Ok(consumed) => consumed,
            Err(source) => {
                // Bytes of the partial record are already gone from the stream,
                // so the split cannot continue.
                guard.take();
                drop(guard);
                self.clear_current();
                debug!("Read failed at offset {}, releasing stream", offset);
                return Err(ReaderError::Read { offset, source });
            }
        };
        drop(guard);

        if consumed == 0 {
            self.clear_current();
            return Ok(false);
        }

        self.pos += consumed as u64;
        self.records_read += 1;
        self.key = Some(offset);
        self.value = Some(LineRecord::from_bytes(&self.buf));

        if self.pos > self.end {
            trace!(
                "Record at {} straddles split end {} by {} bytes",
                offset,
                self.end,
                self.pos - self.end
            );
        }

        Ok(true)
    }

    fn current_key(&self) -> Option<u64> {
        self.key
    }

    fn current_value(&self) -> Option<&LineRecord> {
        self.value.as_ref()
    }

    fn progress(&self) -> f32 {
        if self.start == self.end {
            0.0
        } else {
            let done = (self.pos - self.start) as f64 / (self.end - self.start) as f64;
            done.min(1.0) as f32
        }
    }

    fn close(&mut self) -> Result<()> {
        if lock(&self.stream).take().is_some() {
            debug!(
                "Closed reader after {} records at offset {}",
                self.records_read, self.pos
            );
        }
        Ok(())
    }
}

impl Drop for LineRecordReader {
    fn drop(&mut self) {
        lock(&self.stream).take();
    }
}

/// Closes a [`LineRecordReader`] from outside the reading thread.
///
/// Closing waits for an in-flight `advance` to finish its record, then
/// releases the stream. Closing more than once is a no-op.
///
/// `advance` holds the stream lock for the whole blocking read, so close
/// cannot interrupt a blocked read: a close issued on timeout returns only
/// after the hung read completes or fails.
#[derive(Clone)]
pub struct ReaderCloser {
    stream: StreamSlot,
}

impl ReaderCloser {
    /// Release the stream. Returns whether this call did the release.
    pub fn close(&self) -> bool {
        let released = lock(&self.stream).take().is_some();
        if released {
            debug!("Reader closed by external handle");
        }
        released
    }
}

impl std::fmt::Debug for ReaderCloser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderCloser")
            .field("open", &lock(&self.stream).is_some())
            .finish()
    }
}

/// Iterator over the remaining records of a [`LineRecordReader`].
///
/// Yields at most one error, then stops.
pub struct Records<'a> {
    reader: &'a mut LineRecordReader,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<(u64, LineRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.advance() {
            Ok(true) => {
                let key = self.reader.key?;
                let value = self.reader.value.clone()?;
                Some(Ok((key, value)))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
