use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;

/// Result of a non-streaming model call
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Parsed JSON body of a successful call
    Success(Value),
    /// Error message in place of a body
    Error(String),
}

impl Response {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// The JSON payload of a successful response
    #[must_use]
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Response::Success(value) => Some(value),
            Response::Error(_) => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Error(message) => Some(message.as_str()),
        }
    }

    /// Best-effort extraction of the generated text.
    ///
    /// Tries, in order: `choices[0].message.content` (chat),
    /// `choices[0].text` (legacy completion), a bare string payload and a
    /// top-level `content` field. A path holding something other than a
    /// string is skipped. When nothing matches, the whole payload is returned
    /// as pretty-printed JSON.
    #[must_use]
    pub fn text(&self) -> String {
        let value = match self {
            Response::Success(value) => value,
            Response::Error(message) => return message.clone(),
        };

        let candidates = [
            value.pointer("/choices/0/message/content"),
            value.pointer("/choices/0/text"),
            Some(value),
            value.get("content"),
        ];
        if let Some(text) = candidates.into_iter().flatten().find_map(Value::as_str) {
            return text.to_owned();
        }

        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }

    /// Look up a top-level field and convert it to `T`.
    ///
    /// Returns `None` for an error response, a missing key or a value of the
    /// wrong shape.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let field = self.raw()?.get(key)?;
        serde_json::from_value(field.clone()).ok()
    }

    /// Whether a successful payload has the given top-level key
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.raw().is_some_and(|value| value.get(key).is_some())
    }

    /// Convert the whole payload into `T`.
    ///
    /// # Errors
    /// [`ClientError::Parse`] when this is an error response or the payload
    /// does not have the shape of `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        match self {
            Response::Success(value) => Ok(serde_json::from_value(value.clone())?),
            Response::Error(message) => Err(ClientError::Parse(format!(
                "Cannot parse response with error: {message}"
            ))),
        }
    }
}

impl From<Value> for Response {
    fn from(value: Value) -> Self {
        Response::Success(value)
    }
}
