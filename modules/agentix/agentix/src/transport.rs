//! Blocking HTTP transport.
//!
//! A streaming call is not concurrent streaming: it occupies the calling
//! thread until the body ends, and every sink callback runs on that thread,
//! interleaved with the network reads.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, CACHE_CONTROL};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::sink::StreamSink;
use crate::sse::SseDecoder;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Buffered response of a completed exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, with invalid UTF-8 replaced
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as JSON
    ///
    /// # Errors
    /// [`ClientError::Parse`] when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// One blocking HTTP exchange at a time.
///
/// Methods take `&mut self`, so an instance cannot have two calls in flight.
pub trait Transport {
    /// Perform one request and buffer the whole body.
    ///
    /// # Errors
    /// [`ClientError::Network`] when the exchange could not complete,
    /// [`ClientError::Api`] for a status outside 200-299.
    fn request(
        &mut self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&str>,
    ) -> Result<HttpResponse, ClientError>;

    /// POST `body` and decode the response as Server-Sent Events, pushing
    /// every event into `sink` before the next fragment is read.
    ///
    /// Returns after the `[DONE]` sentinel or the end of the body; in both
    /// cases `sink.on_complete()` has been called exactly once.
    ///
    /// # Errors
    /// Same as [`Transport::request`]. A failure after streaming started is
    /// reported to `sink.on_transport_error` first.
    fn request_stream(
        &mut self,
        url: &str,
        headers: &HeaderMap,
        body: &str,
        sink: &mut dyn StreamSink,
    ) -> Result<(), ClientError>;
}

/// [`Transport`] backed by the reqwest blocking client.
///
/// The client is created once in the constructor and released when the
/// transport is dropped.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
    default_headers: HeaderMap,
}

impl HttpTransport {
    /// Create a transport
    ///
    /// # Errors
    /// [`ClientError::Network`] when the HTTP client cannot be initialized
    /// (for example, no TLS backend is available).
    pub fn new(timeout: Duration, default_headers: HeaderMap) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder().build()?;

        Ok(Self {
            client,
            timeout,
            default_headers,
        })
    }

    /// Create a transport using the timeout and default headers of `config`
    ///
    /// # Errors
    /// See [`HttpTransport::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.timeout, config.default_headers.clone())
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    #[must_use]
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn set_default_headers(&mut self, headers: HeaderMap) {
        self.default_headers = headers;
    }

    /// Blocking GET
    ///
    /// # Errors
    /// See [`Transport::request`].
    pub fn get(&mut self, url: &str, headers: &HeaderMap) -> Result<HttpResponse, ClientError> {
        self.request(Method::GET, url, headers, None)
    }

    /// Blocking POST
    ///
    /// # Errors
    /// See [`Transport::request`].
    pub fn post(
        &mut self,
        url: &str,
        body: &str,
        headers: &HeaderMap,
    ) -> Result<HttpResponse, ClientError> {
        self.request(Method::POST, url, headers, Some(body))
    }

    fn merge_headers(&self, headers: &HeaderMap) -> HeaderMap {
        merge_headers(&self.default_headers, headers)
    }
}

impl Transport for HttpTransport {
    fn request(
        &mut self,
        method: Method,
        url: &str,
        headers: &HeaderMap,
        body: Option<&str>,
    ) -> Result<HttpResponse, ClientError> {
        tracing::debug!(%method, url, "sending request");

        let mut req_builder = self
            .client
            .request(method, url)
            .headers(self.merge_headers(headers))
            .timeout(self.timeout);
        if let Some(body) = body {
            req_builder = req_builder.body(body.to_owned());
        }

        let resp = req_builder.send()?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes()?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "request completed");

        if !status.is_success() {
            return Err(ClientError::from_status(status, &body));
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn request_stream(
        &mut self,
        url: &str,
        headers: &HeaderMap,
        body: &str,
        sink: &mut dyn StreamSink,
    ) -> Result<(), ClientError> {
        tracing::debug!(url, "sending streaming request");

        let mut headers = self.merge_headers(headers);
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let mut resp = self
            .client
            .post(url)
            .headers(headers)
            .timeout(self.timeout)
            .body(body.to_owned())
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes()?;
            return Err(ClientError::from_status(status, &body));
        }

        let mut decoder = SseDecoder::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        let mut delivered = 0usize;

        loop {
            let read = match resp.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    let err = ClientError::from(e);
                    tracing::debug!(error = %err, delivered, "stream aborted");
                    sink.on_transport_error(&err);
                    return Err(err);
                }
            };

            for event in decoder.feed(&buffer[..read]) {
                match event {
                    Ok(chunk) if chunk.is_terminal() => {}
                    Ok(chunk) => {
                        delivered += 1;
                        sink.on_chunk(chunk);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "undecodable stream event");
                        sink.on_decode_error(e);
                    }
                }
            }

            if decoder.is_finished() {
                break;
            }
        }

        if !decoder.is_finished() {
            if decoder.finish() {
                tracing::warn!("discarding unterminated line at end of stream");
            }
            tracing::warn!("stream ended without [DONE]");
        }

        tracing::debug!(status = status.as_u16(), delivered, "stream completed");
        sink.on_complete();
        Ok(())
    }
}

/// Defaults overlaid with per-call headers; a per-call header replaces every
/// default value of the same name.
fn merge_headers(defaults: &HeaderMap, headers: &HeaderMap) -> HeaderMap {
    let mut merged = defaults.clone();
    for name in headers.keys() {
        merged.remove(name);
    }
    for (name, value) in headers {
        merged.append(name.clone(), value.clone());
    }
    merged
}
