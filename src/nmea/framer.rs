//! # Sentence Framer
//!
//! Accumulates raw serial bytes and yields complete sentences.
//!
//! A sentence runs from a `$` up to the next line feed. Bytes before the
//! first `$` are discarded. A partial sentence is kept for the next read
//! until the buffer reaches its capacity, at which point it is dropped.

use bytes::{Buf, BytesMut};
use tracing::debug;

use super::protocol::{LINE_TERMINATOR, SENTENCE_START};

/// Default framing buffer size in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Byte-stream to sentence splitter
#[derive(Debug)]
pub struct SentenceFramer {
    buf: BytesMut,
    capacity: usize,
    dropped: u64,
}

impl SentenceFramer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append freshly read bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop the next complete sentence, without its line terminator
    ///
    /// Returns `None` once no complete sentence remains. Sentences that are
    /// not valid UTF-8 are skipped.
    pub fn next_sentence(&mut self) -> Option<String> {
        loop {
            let Some(start) = self.buf.iter().position(|&b| b == SENTENCE_START) else {
                self.buf.clear();
                return None;
            };
            self.buf.advance(start);

            let Some(end) = self.buf.iter().position(|&b| b == LINE_TERMINATOR) else {
                if self.buf.len() >= self.capacity {
                    debug!(
                        "Dropping {} byte partial sentence without terminator",
                        self.buf.len()
                    );
                    self.buf.clear();
                    self.dropped += 1;
                }
                return None;
            };

            let line = self.buf.split_to(end + 1);
            let line = &line[..end];

            // A sentence cut short by line noise is followed by the next `$`
            let last_start = line
                .iter()
                .rposition(|&b| b == SENTENCE_START)
                .unwrap_or(0);

            match std::str::from_utf8(&line[last_start..]) {
                Ok(text) => return Some(text.trim_end_matches('\r').to_string()),
                Err(e) => {
                    debug!("Skipping non-UTF-8 sentence: {}", e);
                    continue;
                }
            }
        }
    }

    /// Bytes currently held for an incomplete sentence
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Free space before a partial sentence would be dropped
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.buf.len())
    }

    /// Number of partial sentences dropped for exceeding capacity
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for SentenceFramer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}
