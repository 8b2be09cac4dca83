use serde_json::Value;

/// One decoded model-output delta of a streaming response.
///
/// A terminal chunk is only ever produced by the SSE decoder when it sees the
/// `[DONE]` sentinel (or synthesized by a sink when the body ended without
/// one); payload content never marks a chunk as terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    text: String,
    raw: Value,
    is_terminal: bool,
}

impl Chunk {
    /// Build a content chunk from one event's JSON payload.
    ///
    /// The text is taken from `choices[0].delta.content` when that path holds
    /// a string, and is empty otherwise. The full payload is kept in `raw`.
    #[must_use]
    pub fn from_json(raw: Value) -> Self {
        let text = raw
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        Self {
            text,
            raw,
            is_terminal: false,
        }
    }

    /// The end-of-stream marker
    #[must_use]
    pub fn terminal() -> Self {
        Self {
            text: String::new(),
            raw: Value::Null,
            is_terminal: true,
        }
    }

    /// Incremental text carried by this chunk
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The event payload as received
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delta_content_is_extracted() {
        let chunk = Chunk::from_json(json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "delta": {"content": "Hel"}}]
        }));
        assert_eq!(chunk.text(), "Hel");
        assert!(!chunk.is_terminal());
        assert_eq!(chunk.raw()["id"], json!("chatcmpl-1"));
    }

    #[test]
    fn test_role_only_delta_has_empty_text() {
        let chunk = Chunk::from_json(json!({
            "choices": [{"delta": {"role": "assistant"}}]
        }));
        assert_eq!(chunk.text(), "");
        assert_eq!(chunk.raw()["choices"][0]["delta"]["role"], json!("assistant"));
    }

    #[test]
    fn test_non_string_content_is_ignored() {
        let chunk = Chunk::from_json(json!({"choices": [{"delta": {"content": null}}]}));
        assert_eq!(chunk.text(), "");

        let chunk = Chunk::from_json(json!({"choices": []}));
        assert_eq!(chunk.text(), "");
    }

    #[test]
    fn test_payload_cannot_mark_itself_terminal() {
        let chunk = Chunk::from_json(json!({"done": true, "is_terminal": true}));
        assert!(!chunk.is_terminal());
    }

    #[test]
    fn test_terminal_chunk() {
        let chunk = Chunk::terminal();
        assert!(chunk.is_terminal());
        assert_eq!(chunk.text(), "");
        assert!(chunk.raw().is_null());
    }
}
