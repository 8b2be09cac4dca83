use http::StatusCode;
use thiserror::Error;

/// Which stage of the exchange a [`ClientError::Network`] failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The request could not be built (malformed URL, invalid header)
    Request,
    /// DNS resolution, TCP connect or TLS handshake failed
    Connect,
    /// The whole-call deadline elapsed
    Timeout,
    /// The connection broke while the body was being transferred
    Transfer,
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NetworkErrorKind::Request => "request",
            NetworkErrorKind::Connect => "connect",
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

/// Fatal errors returned from a client call.
///
/// Per-event decode failures of a streaming body are not represented here;
/// they travel through [`crate::StreamSink::on_decode_error`] and never abort
/// the stream.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ClientError {
    pub(crate) fn network(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        ClientError::Network {
            kind,
            message: message.into(),
        }
    }

    /// HTTP status of an [`ClientError::Api`] error
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build an API error from a completed non-2xx exchange
    pub(crate) fn from_status(status: StatusCode, body: &[u8]) -> Self {
        ClientError::Api {
            status,
            message: extract_error_message(status, body),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::network(network_kind(&err), err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        // Body reads of the blocking client surface reqwest errors as io::Error
        let kind = if let Some(inner) = err
            .get_ref()
            .and_then(|e| e.downcast_ref::<reqwest::Error>())
        {
            network_kind(inner)
        } else if err.kind() == std::io::ErrorKind::TimedOut {
            NetworkErrorKind::Timeout
        } else {
            NetworkErrorKind::Transfer
        };
        ClientError::network(kind, err.to_string())
    }
}

fn network_kind(err: &reqwest::Error) -> NetworkErrorKind {
    if err.is_timeout() {
        NetworkErrorKind::Timeout
    } else if err.is_connect() {
        NetworkErrorKind::Connect
    } else if err.is_builder() {
        NetworkErrorKind::Request
    } else {
        NetworkErrorKind::Transfer
    }
}

/// Extract a human readable message from an error response body.
///
/// Looks for the conventional `{"error": {"message": "..."}}` envelope and
/// falls back to the raw body, or to the status reason when the body is empty.
pub(crate) fn extract_error_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body)
        && let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(serde_json::Value::as_str)
    {
        return message.to_owned();
    }

    let raw = String::from_utf8_lossy(body);
    let raw = raw.trim();
    if raw.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_owned()
    } else {
        raw.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_message_is_extracted() {
        let body = br#"{"error":{"message":"bad key","type":"invalid_request_error"}}"#;
        assert_eq!(extract_error_message(StatusCode::NOT_FOUND, body), "bad key");
    }

    #[test]
    fn test_non_json_body_is_returned_raw() {
        let body = b"  upstream exploded\n";
        assert_eq!(
            extract_error_message(StatusCode::BAD_GATEWAY, body),
            "upstream exploded"
        );
    }

    #[test]
    fn test_json_without_envelope_is_returned_raw() {
        let body = br#"{"detail":"nope"}"#;
        assert_eq!(
            extract_error_message(StatusCode::BAD_REQUEST, body),
            r#"{"detail":"nope"}"#
        );
    }

    #[test]
    fn test_empty_body_uses_reason_phrase() {
        assert_eq!(
            extract_error_message(StatusCode::SERVICE_UNAVAILABLE, b""),
            "Service Unavailable"
        );
    }

    #[test]
    fn test_from_status_builds_api_error() {
        let err = ClientError::from_status(
            StatusCode::NOT_FOUND,
            br#"{"error":{"message":"bad key"}}"#,
        );
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.to_string(), "API error (404 Not Found): bad key");
    }

    #[test]
    fn test_other_io_errors_map_to_transfer_kind() {
        let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let wrapped = std::io::Error::other(ClientError::Parse("not a transport error".to_owned()));
        for err in [reset, wrapped] {
            assert!(matches!(
                ClientError::from(err),
                ClientError::Network {
                    kind: NetworkErrorKind::Transfer,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_io_timeout_maps_to_timeout_kind() {
        let err = ClientError::from(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        assert!(matches!(
            err,
            ClientError::Network {
                kind: NetworkErrorKind::Timeout,
                ..
            }
        ));
    }
}
