//! Incremental decoder for OpenAI-style Server-Sent Events bodies.
//!
//! The decoder is fed raw body fragments exactly as the network delivers
//! them. Fragment boundaries carry no meaning: a fragment may end in the
//! middle of a line, of a JSON payload or of a multi-byte UTF-8 sequence.
//! Only complete `\n`-terminated lines are interpreted.
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//!
//! : keep-alive
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//!
//! data: [DONE]
//! ```

use std::fmt;

use serde_json::Value;

use crate::chunk::Chunk;

const DATA_PREFIX: &[u8] = b"data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// A single `data:` line that could not be turned into a [`Chunk`].
///
/// Decode errors are per-event and non-fatal: the decoder keeps going with
/// the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    payload: String,
    reason: String,
}

impl DecodeError {
    fn new(payload: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            reason: reason.into(),
        }
    }

    /// The offending payload (the text after `data: `)
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to parse JSON chunk: {}", self.reason)
    }
}

impl std::error::Error for DecodeError {}

enum Line {
    Ignored,
    Done,
    Event(Result<Chunk, DecodeError>),
}

/// Stateful SSE line decoder, one per streaming request.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    finished: bool,
}

impl SseDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one body fragment and return the events it completes, in order.
    ///
    /// The `[DONE]` sentinel yields [`Chunk::terminal`] as the last element and
    /// finishes the decoder: whatever follows it, in this fragment or in later
    /// ones, is dropped.
    pub fn feed(&mut self, fragment: &[u8]) -> Vec<Result<Chunk, DecodeError>> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        self.pending.extend_from_slice(fragment);

        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let line = &self.pending[consumed..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            consumed = end + 1;

            match decode_line(line) {
                Line::Ignored => {}
                Line::Event(event) => events.push(event),
                Line::Done => {
                    self.finished = true;
                    events.push(Ok(Chunk::terminal()));
                    break;
                }
            }
        }

        if self.finished {
            self.pending.clear();
        } else {
            self.pending.drain(..consumed);
        }

        tracing::trace!(
            fragment_len = fragment.len(),
            events = events.len(),
            pending = self.pending.len(),
            "decoded SSE fragment"
        );
        events
    }

    /// Whether the `[DONE]` sentinel has been seen
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of buffered bytes not yet terminated by a newline
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Close the decoder at end of body.
    ///
    /// An unterminated trailing line is never decoded; it is discarded and
    /// `true` is returned so the caller can report it.
    pub fn finish(&mut self) -> bool {
        let had_pending = !self.pending.is_empty();
        self.pending.clear();
        had_pending
    }

    /// Reset to a fresh state for a new request
    pub fn reset(&mut self) {
        self.pending.clear();
        self.finished = false;
    }
}

fn decode_line(line: &[u8]) -> Line {
    // event:, id:, retry:, comments and blank separators
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Line::Ignored;
    };

    let payload = match std::str::from_utf8(payload) {
        Ok(payload) => payload,
        Err(e) => {
            return Line::Event(Err(DecodeError::new(
                String::from_utf8_lossy(payload),
                format!("invalid UTF-8: {e}"),
            )));
        }
    };

    if payload == DONE_SENTINEL {
        return Line::Done;
    }
    if payload.is_empty() {
        return Line::Ignored;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => Line::Event(Ok(Chunk::from_json(value))),
        Err(e) => Line::Event(Err(DecodeError::new(payload, e.to_string()))),
    }
}
