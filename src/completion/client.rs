//! Blocking HTTP client for a hosted chat-completion API.
//!
//! Provides `CompletionClient` for making synchronous requests to a
//! Perplexity-style `/chat/completions` endpoint, along with the transport
//! error taxonomy and a builder for configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// Errors raised by the outbound completion call.
///
/// Every failure is terminal for that invocation: there is no retry, no
/// backoff, and nothing is swallowed. Callers decide whether to re-prompt.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level failures (connection refused, DNS, timeouts).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The API answered with a non-200 status. Carries both the status code
    /// and the response body for diagnostics.
    #[error("Completion API returned status {status}: {body}")]
    Http { status: u16, body: String },

    /// The API answered 200 but the body did not expose generated text at
    /// `choices[0].message.content`.
    #[error("Malformed completion response: {message}")]
    MalformedResponse { message: String },

    /// Invalid base URL configuration.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Returns the HTTP status code if this is an `Http` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A single role/content message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// Creates a user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for one completion call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    /// Builds a single-message request with no sampling override.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::user(prompt)],
            temperature: None,
        }
    }

    /// Sets the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Trait for completion API operations.
///
/// This is the seam between the LLM-backed components and the network:
/// `QueryExtractor` and `FollowupAnswerer` only see this trait, so tests can
/// substitute a canned or counting transport.
pub trait CompletionApi: Send + Sync {
    /// Submits one completion request and returns the generated text.
    fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError>;
}

/// Builder for constructing `CompletionClient` instances.
///
/// # Examples
///
/// ```
/// use verdant::completion::CompletionClientBuilder;
///
/// let client = CompletionClientBuilder::new()
///     .base_url("https://api.perplexity.ai")
///     .api_key("pplx-test")
///     .build()
///     .expect("failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct CompletionClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
}

impl CompletionClientBuilder {
    /// Creates a new builder with no settings applied.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL (e.g. "https://api.perplexity.ai").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer token used for authorization.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Applies base URL and API key from a resolved `Config`.
    pub fn from_config(self, config: &Config) -> Self {
        self.base_url(config.base_url.clone())
            .api_key(config.api_key.clone())
    }

    /// Builds the `CompletionClient`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` if the base URL does not parse,
    /// or `TransportError::Network` if the underlying HTTP client cannot be
    /// constructed.
    pub fn build(self) -> Result<CompletionClient, TransportError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| crate::config::DEFAULT_BASE_URL.to_string());
        let api_key = self.api_key.unwrap_or_default();

        reqwest::Url::parse(&base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(TransportError::Network)?;

        Ok(CompletionClient {
            client,
            base_url,
            api_key,
        })
    }
}

/// Synchronous HTTP client for the chat-completion API.
///
/// One invocation is one blocking POST; the caller's thread suspends for the
/// duration of the call. Construct via `CompletionClientBuilder`.
pub struct CompletionClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl CompletionClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn complete_internal(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(TransportError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            response
                .json()
                .map_err(|e| TransportError::MalformedResponse {
                    message: format!("body is not valid completion JSON: {}", e),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| TransportError::MalformedResponse {
                message: "response contained no choices".to_string(),
            })
    }
}

impl CompletionApi for CompletionClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        self.complete_internal(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_carries_status_and_body() {
        let err = TransportError::Http {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.status(), Some(429));
        let msg = format!("{}", err);
        assert!(msg.contains("429"));
        assert!(msg.contains("rate limited"));
    }

    #[test]
    fn non_http_errors_have_no_status() {
        let err = TransportError::InvalidUrl("nope".to_string());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn builder_rejects_invalid_url() {
        let result = CompletionClientBuilder::new()
            .base_url("not-a-valid-url")
            .api_key("k")
            .build();
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn builder_defaults_to_hosted_endpoint() {
        let client = CompletionClientBuilder::new().api_key("k").build().unwrap();
        assert_eq!(client.base_url(), "https://api.perplexity.ai");
    }

    #[test]
    fn request_serializes_without_temperature_when_unset() {
        let request = CompletionRequest::new("sonar", "hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "sonar");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn request_serializes_temperature_when_set() {
        let request = CompletionRequest::new("sonar-reasoning", "hi").with_temperature(0.5);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["temperature"], 0.5);
    }

    #[test]
    fn response_content_parses_from_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Generated text"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Generated text");
    }

    #[test]
    fn trait_can_be_implemented_by_mock_struct() {
        struct MockClient {
            response: String,
        }

        impl CompletionApi for MockClient {
            fn complete(&self, _request: &CompletionRequest) -> Result<String, TransportError> {
                Ok(self.response.clone())
            }
        }

        let mock = MockClient {
            response: "canned".to_string(),
        };
        let request = CompletionRequest::new("m", "p");
        assert_eq!(mock.complete(&request).unwrap(), "canned");
    }
}
