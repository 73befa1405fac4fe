//! Byte-based line reading over subprocess output (non-UTF8-safe).
//!
//! Monitored processes can emit arbitrary bytes on stdout, and
//! `BufReader::lines()` would end the stream on the first invalid
//! UTF-8 sequence. [`LineReader`] splits on raw newline bytes and
//! decodes each line lossily, so log streaming stays robust.
//!
//! ## Overlong lines
//!
//! A line longer than the configured cap is delivered truncated to the
//! cap, the remainder up to the next newline is discarded, and a
//! warning is logged. The session keeps streaming. The default cap of
//! 64 KiB matches the hard limit the original platform scanner
//! imposed, where an overlong line would have killed the stream
//! instead.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::warn;

use crate::error::ReadError;

/// Default cap on the length of a single log line, in bytes.
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// Lazy, non-restartable sequence of log lines over a byte stream.
///
/// Lines are yielded in production order with the trailing `\n` (and a
/// preceding `\r`, if any) stripped. The sequence ends with `Ok(None)`
/// at end-of-file; a final unterminated line is still yielded.
pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_line_bytes: usize,
    /// Set while skipping the tail of a line that exceeded the cap.
    discarding: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wrap a byte stream with the given line-length cap.
    pub fn new(stream: R, max_line_bytes: usize) -> Self {
        Self {
            reader: BufReader::new(stream),
            buf: Vec::with_capacity(1024),
            max_line_bytes,
            discarding: false,
        }
    }

    /// Produce the next line, suspending until the source has one.
    ///
    /// # Errors
    /// [`ReadError`] on underlying I/O failure; the error is not
    /// retried and the reader should be discarded.
    pub async fn next_line(&mut self) -> Result<Option<String>, ReadError> {
        loop {
            let available = self.reader.fill_buf().await?;

            if available.is_empty() {
                // EOF. Yield whatever is buffered as a final line.
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_line(false)));
            }

            match available.iter().position(|&b| b == b'\n') {
                Some(newline_at) => {
                    if !self.discarding {
                        push_capped(
                            &mut self.buf,
                            self.max_line_bytes,
                            &mut self.discarding,
                            &available[..newline_at],
                        );
                    }
                    self.reader.consume(newline_at + 1);
                    // A truncated line keeps its cap-boundary byte even
                    // if it is `\r`: the delimiter was discarded along
                    // with the overflow, so the byte is data.
                    let truncated = self.discarding;
                    self.discarding = false;
                    return Ok(Some(self.take_line(!truncated)));
                }
                None => {
                    let len = available.len();
                    if !self.discarding {
                        push_capped(
                            &mut self.buf,
                            self.max_line_bytes,
                            &mut self.discarding,
                            available,
                        );
                    }
                    self.reader.consume(len);
                }
            }
        }
    }

    /// Drain the buffer into a lossily-decoded line.
    fn take_line(&mut self, terminated: bool) -> String {
        // A carriage return only belongs to the delimiter when a
        // newline actually terminated the line.
        if terminated && self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}

/// Append bytes to `buf` up to the cap; flag discard mode once hit.
fn push_capped(buf: &mut Vec<u8>, max_line_bytes: usize, discarding: &mut bool, bytes: &[u8]) {
    let room = max_line_bytes.saturating_sub(buf.len());
    if bytes.len() > room {
        warn!(cap = max_line_bytes, "log line exceeds cap, truncating");
        *discarding = true;
    }
    buf.extend_from_slice(&bytes[..bytes.len().min(room)]);
}
