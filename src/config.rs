//! Runtime configuration for the completion API.
//!
//! The environment is consulted in exactly one place (`Config::from_env`);
//! everything downstream receives an explicit `Config` value, so tests can
//! inject fake credentials and endpoints without touching process state.

use thiserror::Error;

/// Hosted completion endpoint used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

/// Fast model used for selector extraction.
pub const DEFAULT_QUERY_MODEL: &str = "sonar";

/// Reasoning model used for follow-up answering.
pub const DEFAULT_ANSWER_MODEL: &str = "sonar-reasoning";

/// Environment variable holding the required API key.
pub const API_KEY_VAR: &str = "PERPLEXITY_API_KEY";

/// Optional environment overrides.
pub const BASE_URL_VAR: &str = "VERDANT_API_URL";
pub const QUERY_MODEL_VAR: &str = "VERDANT_QUERY_MODEL";
pub const ANSWER_MODEL_VAR: &str = "VERDANT_ANSWER_MODEL";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing or empty.
    #[error("Missing required environment variable: {0}")]
    MissingKey(&'static str),
}

/// Resolved configuration for the completion API.
///
/// Required key: `PERPLEXITY_API_KEY`. Optional overrides: `VERDANT_API_URL`,
/// `VERDANT_QUERY_MODEL`, `VERDANT_ANSWER_MODEL`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token for the completion API.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
    /// Model used by `QueryExtractor`.
    pub query_model: String,
    /// Model used by `FollowupAnswerer`.
    pub answer_model: String,
}

impl Config {
    /// Creates a config with the given API key and default endpoint/models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            query_model: DEFAULT_QUERY_MODEL.to_string(),
            answer_model: DEFAULT_ANSWER_MODEL.to_string(),
        }
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Overrides the extraction model.
    pub fn with_query_model(mut self, model: impl Into<String>) -> Self {
        self.query_model = model.into();
        self
    }

    /// Overrides the answering model.
    pub fn with_answer_model(mut self, model: impl Into<String>) -> Self {
        self.answer_model = model.into();
        self
    }

    /// Resolves configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if `PERPLEXITY_API_KEY` is unset or
    /// empty. Optional variables fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingKey(API_KEY_VAR))?;

        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var(BASE_URL_VAR)
            && !url.trim().is_empty()
        {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var(QUERY_MODEL_VAR)
            && !model.trim().is_empty()
        {
            config.query_model = model;
        }
        if let Ok(model) = std::env::var(ANSWER_MODEL_VAR)
            && !model.trim().is_empty()
        {
            config.answer_model = model;
        }
        Ok(config)
    }
}
