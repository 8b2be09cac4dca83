use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ClientError, NetworkErrorKind};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

pub const API_KEY_ENV: &str = "AGENT_API_KEY";
pub const BASE_URL_ENV: &str = "AGENT_BASE_URL";

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug)]
pub struct ClientConfig {
    pub api_key: SecretString,
    pub base_url: String,
    /// Sent as `OpenAI-Organization` when set
    pub organization: Option<String>,
    /// Sent as `OpenAI-Project` when set
    pub project: Option<String>,
    /// Deadline for a whole call: connect plus full body transfer
    pub timeout: Duration,
    /// Headers sent with every request; per-call headers win on collision
    pub default_headers: HeaderMap,
}

impl ClientConfig {
    /// Create configuration for the default OpenAI endpoint
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_owned(),
            organization: None,
            project: None,
            timeout: DEFAULT_TIMEOUT,
            default_headers: HeaderMap::new(),
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expects:
    /// - `AGENT_API_KEY`: API key (required)
    /// - `AGENT_BASE_URL`: endpoint base URL (default: `https://api.openai.com/v1`)
    ///
    /// # Errors
    /// [`ClientError::Api`] with status 401 when `AGENT_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| ClientError::Api {
            status: StatusCode::UNAUTHORIZED,
            message: format!("{API_KEY_ENV} not set"),
        })?;
        Ok(Self::new(api_key).with_env())
    }

    /// Override fields from environment variables that are set, keeping the
    /// current values for the ones that are not
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            self.api_key = SecretString::from(api_key);
        }
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            self.base_url = base_url;
        }
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header sent with every request
    ///
    /// # Errors
    /// [`ClientError::Network`] of kind `Request` for an invalid header name
    /// or value.
    pub fn with_default_header<K, V>(mut self, key: K, value: V) -> Result<Self, ClientError>
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
        K::Error: std::fmt::Display,
        V::Error: std::fmt::Display,
    {
        let key = key.try_into().map_err(|e| {
            ClientError::network(NetworkErrorKind::Request, format!("Invalid header name: {e}"))
        })?;
        let value = value.try_into().map_err(|e| {
            ClientError::network(NetworkErrorKind::Request, format!("Invalid header value: {e}"))
        })?;
        self.default_headers.insert(key, value);
        Ok(self)
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.expose_secret().is_empty()
    }

    /// Join `path` onto the base URL
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert!(config.organization.is_none());
        assert!(config.has_api_key());
        assert!(!ClientConfig::new("").has_api_key());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::new("sk-very-secret");
        assert!(!format!("{config:?}").contains("sk-very-secret"));
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new("sk-test")
            .with_base_url("https://api.deepseek.com")
            .with_organization("org-1")
            .with_project("proj-1")
            .with_timeout(Duration::from_secs(5))
            .with_default_header("X-Trace", "abc")
            .unwrap();

        assert_eq!(config.base_url, "https://api.deepseek.com");
        assert_eq!(config.organization.as_deref(), Some("org-1"));
        assert_eq!(config.project.as_deref(), Some("proj-1"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.default_headers["x-trace"], "abc");
    }

    #[test]
    fn test_invalid_default_header() {
        let err = ClientConfig::new("sk-test")
            .with_default_header("bad header", "v")
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Network {
                kind: NetworkErrorKind::Request,
                ..
            }
        ));
    }

    #[test]
    fn test_endpoint_joining() {
        let config = ClientConfig::new("k").with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            config.endpoint("/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            ClientConfig::new("k").endpoint("completions"),
            "https://api.openai.com/v1/completions"
        );
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                (API_KEY_ENV, Some("sk-env")),
                (BASE_URL_ENV, Some("http://localhost:9000")),
            ],
            || {
                let config = ClientConfig::from_env().unwrap();
                assert_eq!(config.api_key.expose_secret(), "sk-env");
                assert_eq!(config.base_url, "http://localhost:9000");
            },
        );
    }

    #[test]
    fn test_from_env_requires_api_key() {
        temp_env::with_var_unset(API_KEY_ENV, || {
            let err = ClientConfig::from_env().unwrap_err();
            assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        });
    }

    #[test]
    fn test_with_env_keeps_unset_values() {
        temp_env::with_vars(
            [(API_KEY_ENV, None::<&str>), (BASE_URL_ENV, Some("http://override"))],
            || {
                let config = ClientConfig::new("sk-explicit")
                    .with_base_url("http://original")
                    .with_env();
                assert_eq!(config.api_key.expose_secret(), "sk-explicit");
                assert_eq!(config.base_url, "http://override");
            },
        );
    }
}
