//! Agentix: blocking client for OpenAI-compatible chat/completion endpoints
//!
//! Every call is a single blocking HTTP exchange on the calling thread. The
//! streaming mode decodes the Server-Sent Events body while it arrives and
//! hands each chunk to a [`StreamSink`] before the next network read:
//!
//! - [`MaterializingSink`] / [`MaterializedStream`]: the whole stream,
//!   available after the call returns and iterable any number of times
//! - [`PushSink`]: caller callbacks invoked as chunks are decoded
//!
//! A malformed event never aborts a stream; it is reported through
//! [`StreamSink::on_decode_error`] and decoding resumes with the next line.
//! Only transport, API and final-body parse failures surface as
//! [`ClientError`].
//!
//! # Examples
//!
//! ## Chat
//!
//! ```no_run
//! use agentix::{ClientConfig, LlmAdapter, Message, OpenAiAdapter};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let mut llm = OpenAiAdapter::new(config, "gpt-4o-mini")?;
//!
//! let response = llm.chat(&[Message::user("What is Rust?")])?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```
//!
//! ## Materialized streaming
//!
//! ```no_run
//! use agentix::{ClientConfig, LlmAdapter, Message, OpenAiAdapter};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut llm = OpenAiAdapter::with_default_model(ClientConfig::from_env()?)?;
//!
//! let stream = llm.chat_stream(&[Message::user("Count to five")])?;
//! for chunk in &stream {
//!     print!("{}", chunk.text());
//! }
//! assert_eq!(stream.chunks().last().map(|c| c.is_terminal()), Some(true));
//! # Ok(())
//! # }
//! ```
//!
//! ## Real-time streaming
//!
//! ```no_run
//! use agentix::{ClientConfig, Message, OpenAiAdapter, PushSink};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut llm = OpenAiAdapter::with_default_model(ClientConfig::from_env()?)?;
//!
//! let mut sink = PushSink::new()
//!     .on_chunk(|chunk| print!("{}", chunk.text()))
//!     .on_complete(|| println!())
//!     .on_error(|message| eprintln!("skipped event: {message}"));
//! llm.chat_stream_realtime(&[Message::user("Tell me a joke")], &mut sink)?;
//! # Ok(())
//! # }
//! ```

mod adapter;
mod chunk;
mod config;
mod error;
mod message;
mod response;
mod sink;
mod sse;
mod transport;

// Re-export public API
pub use adapter::{ChatOptions, DEFAULT_MODEL, LlmAdapter, OpenAiAdapter};
pub use chunk::Chunk;
pub use config::{API_KEY_ENV, BASE_URL_ENV, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ClientError, NetworkErrorKind};
pub use message::{Message, Role};
pub use response::Response;
pub use sink::{MaterializedStream, MaterializingSink, PushSink, StreamSink};
pub use sse::{DecodeError, SseDecoder};
pub use transport::{HttpResponse, HttpTransport, Transport};

// Re-export commonly used types from dependencies
pub use http::{HeaderMap, HeaderValue, Method, StatusCode};
