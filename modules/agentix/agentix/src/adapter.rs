//! Model adapters on top of a [`Transport`].

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use secrecy::ExposeSecret;
use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::error::{ClientError, NetworkErrorKind};
use crate::message::Message;
use crate::response::Response;
use crate::sink::{MaterializedStream, MaterializingSink, StreamSink};
use crate::transport::{HttpTransport, Transport};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const COMPLETIONS_PATH: &str = "/completions";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

const COMPLETION_MAX_TOKENS: u32 = 150;
const COMPLETION_TEMPERATURE: f64 = 0.7;

const ORGANIZATION_HEADER: HeaderName = HeaderName::from_static("openai-organization");
const PROJECT_HEADER: HeaderName = HeaderName::from_static("openai-project");

/// The operations every model adapter provides
pub trait LlmAdapter {
    /// Plain text completion
    ///
    /// # Errors
    /// Any [`ClientError`] raised by the call.
    fn complete(&mut self, prompt: &str) -> Result<Response, ClientError>;

    /// Chat completion over a message history
    ///
    /// # Errors
    /// Any [`ClientError`] raised by the call.
    fn chat(&mut self, messages: &[Message]) -> Result<Response, ClientError>;

    /// Streaming text completion, materialized once the stream ends
    ///
    /// # Errors
    /// Any [`ClientError`] raised by the call.
    fn complete_stream(&mut self, prompt: &str) -> Result<MaterializedStream, ClientError>;

    /// Streaming chat completion, materialized once the stream ends
    ///
    /// # Errors
    /// Any [`ClientError`] raised by the call.
    fn chat_stream(&mut self, messages: &[Message]) -> Result<MaterializedStream, ClientError>;

    fn model_name(&self) -> &str;
}

/// Sampling options for chat calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: f64,
    /// Omitted from the request when `None`
    pub max_tokens: Option<u32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            max_tokens: None,
        }
    }
}

/// Adapter for OpenAI-compatible endpoints (OpenAI, `DeepSeek`, local servers)
#[derive(Debug)]
pub struct OpenAiAdapter<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
    model: String,
}

impl OpenAiAdapter<HttpTransport> {
    /// Create an adapter with its own HTTP transport
    ///
    /// # Errors
    /// [`ClientError::Api`] with status 401 when the API key is empty, or a
    /// [`ClientError::Network`] if the transport cannot be created.
    pub fn new(config: ClientConfig, model: impl Into<String>) -> Result<Self, ClientError> {
        let transport = HttpTransport::from_config(&config)?;
        Self::with_transport(config, model, transport)
    }

    /// Create an adapter for [`DEFAULT_MODEL`]
    ///
    /// # Errors
    /// See [`OpenAiAdapter::new`].
    pub fn with_default_model(config: ClientConfig) -> Result<Self, ClientError> {
        Self::new(config, DEFAULT_MODEL)
    }
}

impl<T: Transport> OpenAiAdapter<T> {
    /// Create an adapter over an existing transport
    ///
    /// # Errors
    /// [`ClientError::Api`] with status 401 when the API key is empty.
    pub fn with_transport(
        config: ClientConfig,
        model: impl Into<String>,
        transport: T,
    ) -> Result<Self, ClientError> {
        ensure_api_key(&config)?;
        Ok(Self {
            config,
            transport,
            model: model.into(),
        })
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Chat completion with explicit sampling options
    ///
    /// # Errors
    /// Any [`ClientError`] raised by the call.
    pub fn chat_with_options(
        &mut self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<Response, ClientError> {
        let body = self.chat_options_body(messages, options, false);
        self.post_json(CHAT_COMPLETIONS_PATH, &body)
    }

    /// Streaming chat completion with explicit sampling options
    ///
    /// # Errors
    /// Any [`ClientError`] raised by the call.
    pub fn chat_stream_with_options(
        &mut self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<MaterializedStream, ClientError> {
        let body = self.chat_options_body(messages, options, true);
        self.materialize(CHAT_COMPLETIONS_PATH, &body)
    }

    /// Streaming chat completion delivered to `sink` while it is received
    ///
    /// # Errors
    /// Any [`ClientError`] raised by the call.
    pub fn chat_stream_realtime(
        &mut self,
        messages: &[Message],
        sink: &mut dyn StreamSink,
    ) -> Result<(), ClientError> {
        let body = self.chat_body(messages, true);
        self.stream_json(CHAT_COMPLETIONS_PATH, &body, sink)
    }

    fn completion_body(&self, prompt: &str, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": COMPLETION_MAX_TOKENS,
            "temperature": COMPLETION_TEMPERATURE,
        });
        if stream {
            body["stream"] = Value::Bool(true);
        }
        body
    }

    fn chat_body(&self, messages: &[Message], stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if stream {
            body["stream"] = Value::Bool(true);
        }
        body
    }

    fn chat_options_body(&self, messages: &[Message], options: &ChatOptions, stream: bool) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": options.temperature,
        });
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if stream {
            body["stream"] = Value::Bool(true);
        }
        body
    }

    fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();

        let mut auth = header_value(&format!("Bearer {}", self.config.api_key.expose_secret()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(organization) = &self.config.organization {
            headers.insert(ORGANIZATION_HEADER, header_value(organization)?);
        }
        if let Some(project) = &self.config.project {
            headers.insert(PROJECT_HEADER, header_value(project)?);
        }
        Ok(headers)
    }

    fn post_json(&mut self, path: &str, body: &Value) -> Result<Response, ClientError> {
        let url = self.config.endpoint(path);
        let headers = self.headers()?;
        let body = body.to_string();

        let resp = self
            .transport
            .request(Method::POST, &url, &headers, Some(body.as_str()))?;

        let value: Value = serde_json::from_slice(&resp.body)
            .map_err(|e| ClientError::Parse(format!("Failed to parse response: {e}")))?;
        Ok(Response::Success(value))
    }

    fn stream_json(
        &mut self,
        path: &str,
        body: &Value,
        sink: &mut dyn StreamSink,
    ) -> Result<(), ClientError> {
        let url = self.config.endpoint(path);
        let headers = self.headers()?;
        self.transport
            .request_stream(&url, &headers, &body.to_string(), sink)
    }

    fn materialize(&mut self, path: &str, body: &Value) -> Result<MaterializedStream, ClientError> {
        let mut sink = MaterializingSink::new();
        self.stream_json(path, body, &mut sink)?;
        Ok(sink.into_stream())
    }
}

impl<T: Transport> LlmAdapter for OpenAiAdapter<T> {
    fn complete(&mut self, prompt: &str) -> Result<Response, ClientError> {
        let body = self.completion_body(prompt, false);
        self.post_json(COMPLETIONS_PATH, &body)
    }

    fn chat(&mut self, messages: &[Message]) -> Result<Response, ClientError> {
        let body = self.chat_body(messages, false);
        self.post_json(CHAT_COMPLETIONS_PATH, &body)
    }

    fn complete_stream(&mut self, prompt: &str) -> Result<MaterializedStream, ClientError> {
        let body = self.completion_body(prompt, true);
        self.materialize(COMPLETIONS_PATH, &body)
    }

    fn chat_stream(&mut self, messages: &[Message]) -> Result<MaterializedStream, ClientError> {
        let body = self.chat_body(messages, true);
        self.materialize(CHAT_COMPLETIONS_PATH, &body)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn ensure_api_key(config: &ClientConfig) -> Result<(), ClientError> {
    if config.has_api_key() {
        Ok(())
    } else {
        Err(ClientError::Api {
            status: StatusCode::UNAUTHORIZED,
            message: "API key is required".to_owned(),
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value).map_err(|e| {
        ClientError::network(NetworkErrorKind::Request, format!("Invalid header value: {e}"))
    })
}
