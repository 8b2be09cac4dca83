//! Consumers of a decoded chunk stream.
//!
//! The transport pushes every decoded chunk into a [`StreamSink`] on the
//! calling thread, before it reads the next fragment from the network. Two
//! sinks are provided:
//!
//! - [`MaterializingSink`] collects everything and is frozen into a
//!   [`MaterializedStream`] once the call returns.
//! - [`PushSink`] forwards each chunk to caller-supplied handlers as soon as
//!   it is decoded.

use crate::chunk::Chunk;
use crate::error::ClientError;
use crate::sse::DecodeError;

/// Receiver of the events produced by one streaming call
pub trait StreamSink {
    /// A non-terminal chunk, in arrival order
    fn on_chunk(&mut self, chunk: Chunk);

    /// Called exactly once when the call succeeds, either because `[DONE]` was
    /// seen or because the body ended.
    fn on_complete(&mut self);

    /// One `data:` event could not be decoded. The stream continues.
    fn on_decode_error(&mut self, error: DecodeError);

    /// The transport failed after the response started streaming.
    ///
    /// The call returns the same error right after this hook; `on_complete`
    /// is not called.
    fn on_transport_error(&mut self, _error: &ClientError) {}
}

/// Sink that accumulates the whole stream in memory
#[derive(Debug, Default)]
pub struct MaterializingSink {
    chunks: Vec<Chunk>,
    text: String,
    complete: bool,
    decode_errors: Vec<DecodeError>,
}

impl MaterializingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk.
    ///
    /// Text of non-terminal chunks is accumulated; a terminal chunk marks the
    /// stream complete.
    pub fn add(&mut self, chunk: Chunk) {
        if chunk.is_terminal() {
            self.complete = true;
        } else {
            self.text.push_str(chunk.text());
        }
        self.chunks.push(chunk);
    }

    /// Mark the stream complete, appending a terminal chunk unless the last
    /// recorded chunk already is one. Safe to call more than once.
    pub fn finish(&mut self) {
        self.complete = true;
        if !self.chunks.last().is_some_and(Chunk::is_terminal) {
            self.chunks.push(Chunk::terminal());
        }
    }

    /// Freeze into an immutable, repeatedly iterable stream
    #[must_use]
    pub fn into_stream(self) -> MaterializedStream {
        MaterializedStream {
            chunks: self.chunks,
            text: self.text,
            complete: self.complete,
            decode_errors: self.decode_errors,
        }
    }
}

impl StreamSink for MaterializingSink {
    fn on_chunk(&mut self, chunk: Chunk) {
        self.add(chunk);
    }

    fn on_complete(&mut self) {
        self.finish();
    }

    fn on_decode_error(&mut self, error: DecodeError) {
        self.decode_errors.push(error);
    }
}

/// Frozen result of a streaming call.
///
/// `full_text()` is the ordered concatenation of every non-terminal chunk's
/// text, and a finished stream always ends with exactly one terminal chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializedStream {
    chunks: Vec<Chunk>,
    text: String,
    complete: bool,
    decode_errors: Vec<DecodeError>,
}

impl MaterializedStream {
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// All delta text, concatenated in arrival order
    #[must_use]
    pub fn full_text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Events that were skipped because they failed to decode
    #[must_use]
    pub fn decode_errors(&self) -> &[DecodeError] {
        &self.decode_errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }
}

impl<'a> IntoIterator for &'a MaterializedStream {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

impl IntoIterator for MaterializedStream {
    type Item = Chunk;
    type IntoIter = std::vec::IntoIter<Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

type ChunkHandler<'a> = Box<dyn FnMut(&Chunk) + 'a>;
type CompleteHandler<'a> = Box<dyn FnMut() + 'a>;
type ErrorHandler<'a> = Box<dyn FnMut(&str) + 'a>;

/// Sink that forwards every event to caller-supplied handlers.
///
/// All handlers are optional and run synchronously on the thread that issued
/// the request.
///
/// ```
/// use agentix::PushSink;
///
/// let mut text = String::new();
/// let sink = PushSink::new()
///     .on_chunk(|chunk| text.push_str(chunk.text()))
///     .on_error(|message| eprintln!("stream error: {message}"));
/// # drop(sink);
/// ```
#[derive(Default)]
pub struct PushSink<'a> {
    on_chunk: Option<ChunkHandler<'a>>,
    on_complete: Option<CompleteHandler<'a>>,
    on_error: Option<ErrorHandler<'a>>,
    delivered: usize,
}

impl std::fmt::Debug for PushSink<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushSink")
            .field("on_chunk", &self.on_chunk.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("delivered", &self.delivered)
            .finish()
    }
}

impl<'a> PushSink<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler invoked once per decoded chunk
    #[must_use]
    pub fn on_chunk(mut self, handler: impl FnMut(&Chunk) + 'a) -> Self {
        self.on_chunk = Some(Box::new(handler));
        self
    }

    /// Handler invoked once when the stream completes
    #[must_use]
    pub fn on_complete(mut self, handler: impl FnMut() + 'a) -> Self {
        self.on_complete = Some(Box::new(handler));
        self
    }

    /// Handler invoked for every undecodable event, and once more if the
    /// transport fails after chunks were delivered
    #[must_use]
    pub fn on_error(mut self, handler: impl FnMut(&str) + 'a) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Number of chunks handed to `on_chunk` so far
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    fn report(&mut self, message: &str) {
        if let Some(handler) = self.on_error.as_mut() {
            handler(message);
        }
    }
}

impl StreamSink for PushSink<'_> {
    fn on_chunk(&mut self, chunk: Chunk) {
        self.delivered += 1;
        if let Some(handler) = self.on_chunk.as_mut() {
            handler(&chunk);
        }
    }

    fn on_complete(&mut self) {
        if let Some(handler) = self.on_complete.as_mut() {
            handler();
        }
    }

    fn on_decode_error(&mut self, error: DecodeError) {
        self.report(&error.to_string());
    }

    fn on_transport_error(&mut self, error: &ClientError) {
        if self.delivered > 0 {
            self.report(&error.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkErrorKind;
    use crate::sse::SseDecoder;
    use serde_json::json;
    use std::cell::RefCell;

    fn delta(text: &str) -> Chunk {
        Chunk::from_json(json!({"choices": [{"delta": {"content": text}}]}))
    }

    fn drive(sink: &mut dyn StreamSink, body: &[u8]) {
        let mut decoder = SseDecoder::new();
        for event in decoder.feed(body) {
            match event {
                Ok(chunk) if chunk.is_terminal() => break,
                Ok(chunk) => sink.on_chunk(chunk),
                Err(e) => sink.on_decode_error(e),
            }
        }
        sink.on_complete();
    }

    #[test]
    fn test_text_accumulates_in_order() {
        let mut sink = MaterializingSink::new();
        sink.add(delta("Hel"));
        sink.add(delta("lo"));
        sink.finish();
        let stream = sink.into_stream();

        assert_eq!(stream.full_text(), "Hello");
        assert!(stream.is_complete());
        assert_eq!(stream.len(), 3);
        assert!(stream.chunks()[2].is_terminal());
    }

    #[test]
    fn test_finish_synthesizes_terminal_once() {
        let mut sink = MaterializingSink::new();
        sink.add(delta("a"));
        sink.finish();
        sink.finish();
        let stream = sink.into_stream();

        let terminals = stream.iter().filter(|c| c.is_terminal()).count();
        assert_eq!(terminals, 1);
        assert!(stream.chunks().last().unwrap().is_terminal());
    }

    #[test]
    fn test_explicit_terminal_is_not_duplicated() {
        let mut sink = MaterializingSink::new();
        sink.add(delta("a"));
        sink.add(Chunk::terminal());
        sink.finish();
        let stream = sink.into_stream();

        assert_eq!(stream.len(), 2);
        assert_eq!(stream.full_text(), "a");
    }

    #[test]
    fn test_empty_stream_still_ends_with_terminal() {
        let mut sink = MaterializingSink::new();
        sink.finish();
        let stream = sink.into_stream();
        assert_eq!(stream.len(), 1);
        assert_eq!(stream.full_text(), "");
        assert!(stream.is_complete());
    }

    #[test]
    fn test_materialized_stream_is_restartable() {
        let mut sink = MaterializingSink::new();
        sink.add(delta("x"));
        sink.add(delta("y"));
        sink.finish();
        let stream = sink.into_stream();

        let first: Vec<&str> = (&stream).into_iter().map(Chunk::text).collect();
        let second: Vec<&str> = stream.iter().map(Chunk::text).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["x", "y", ""]);
    }

    #[test]
    fn test_materializing_sink_keeps_decode_errors() {
        let mut sink = MaterializingSink::new();
        drive(
            &mut sink,
            b"data: not-json\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n",
        );
        let stream = sink.into_stream();

        assert_eq!(stream.decode_errors().len(), 1);
        assert_eq!(stream.full_text(), "ok");
        assert!(stream.is_complete());
    }

    #[test]
    fn test_push_sink_reports_error_before_next_chunk() {
        let log = RefCell::new(Vec::new());
        let mut sink = PushSink::new()
            .on_chunk(|c| log.borrow_mut().push(format!("chunk:{}", c.text())))
            .on_complete(|| log.borrow_mut().push("complete".to_owned()))
            .on_error(|_| log.borrow_mut().push("error".to_owned()));

        drive(
            &mut sink,
            b"data: not-json\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\ndata: [DONE]\n",
        );
        assert_eq!(sink.delivered(), 1);
        drop(sink);

        assert_eq!(log.into_inner(), vec!["error", "chunk:ok", "complete"]);
    }

    #[test]
    fn test_push_sink_handlers_are_optional() {
        let mut sink = PushSink::new();
        drive(&mut sink, b"data: {\"choices\":[]}\ndata: nope\n");
        assert_eq!(sink.delivered(), 1);
    }

    #[test]
    fn test_transport_error_reported_only_after_delivery() {
        let errors = RefCell::new(Vec::new());
        let failure = ClientError::network(NetworkErrorKind::Transfer, "connection reset");

        let mut sink = PushSink::new().on_error(|m| errors.borrow_mut().push(m.to_owned()));
        sink.on_transport_error(&failure);
        StreamSink::on_chunk(&mut sink, delta("partial"));
        sink.on_transport_error(&failure);
        drop(sink);

        assert_eq!(
            errors.into_inner(),
            vec!["Network error (transfer): connection reset"]
        );
    }
}
