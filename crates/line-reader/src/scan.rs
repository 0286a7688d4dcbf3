//! Record boundary scanning over a buffered byte stream.

use crate::config::QuoteMode;
use std::io::{self, BufRead, ErrorKind};

/// Append the next record's bytes to `buf` and return how many bytes were
/// consumed. Returns 0 only at end of stream.
pub(crate) fn read_record<R: BufRead + ?Sized>(
    reader: &mut R,
    mode: QuoteMode,
    buf: &mut Vec<u8>,
) -> io::Result<usize> {
    match mode {
        QuoteMode::Naive => reader.read_until(b'\n', buf),
        QuoteMode::QuoteAware { quote } => read_quoted(reader, quote, buf),
    }
}

fn read_quoted<R: BufRead + ?Sized>(
    reader: &mut R,
    quote: u8,
    buf: &mut Vec<u8>,
) -> io::Result<usize> {
    let mut in_quotes = false;
    let mut total = 0;
    loop {
        let (done, used) = {
            let available = match reader.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                return Ok(total);
            }

            let mut terminator = None;
            for (i, &byte) in available.iter().enumerate() {
                if byte == quote {
                    in_quotes = !in_quotes;
                } else if byte == b'\n' && !in_quotes {
                    terminator = Some(i + 1);
                    break;
                }
            }

            match terminator {
                Some(n) => {
                    buf.extend_from_slice(&available[..n]);
                    (true, n)
                }
                None => {
                    buf.extend_from_slice(available);
                    (false, available.len())
                }
            }
        };
        reader.consume(used);
        total += used;
        if done {
            return Ok(total);
        }
    }
}
