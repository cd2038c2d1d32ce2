//! Natural-language to selector extraction.
//!
//! `QueryExtractor` turns a free-text question plus the reference dataset
//! into a list of `(state, month, year)` selectors by prompting a completion
//! model for a JSON array and pulling that array out of whatever prose
//! surrounds it. Selectors are returned exactly as parsed; validating
//! individual entries is the caller's job.

use std::sync::Arc;

use thiserror::Error;

use crate::completion::{CompletionApi, CompletionRequest, TransportError};
use crate::dataset::Dataset;
use crate::models::QuerySelector;

/// Prompt template constraining the model to the supplied dataset and a
/// bare JSON-array reply.
const PROMPT_TEMPLATE: &str = r#"You are a data assistant. Only use the following NDVI dataset to answer the question.
Do not guess. Do not use outside knowledge. If information is not in this JSON, say "Data not available".

JSON Data:
{json_context}

Answer this user query: "{user_input}"

Return a list of JSON objects with:
- "state": lowercase state name from JSON
- "month": e.g. "January"
- "year": e.g. 2025

Format:
[
  {"state": "andhrapradesh", "month": "January", "year": 2025},
  ...
]
Only output this JSON. No explanation."#;

/// Errors raised by selector extraction.
///
/// Transport failures pass through; everything else keeps the raw completion
/// text so a failed parse can be diagnosed from the error alone.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The outbound completion call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The completion contained no array-of-objects shaped substring.
    #[error("No JSON array of selectors found in model output")]
    NoArrayFound { raw: String },

    /// An array was located but did not parse as JSON.
    #[error("Extracted text is not valid JSON: {source}")]
    InvalidJson {
        source: serde_json::Error,
        raw: String,
    },

    /// The located payload parsed, but not to a list of selector objects.
    #[error("Extracted JSON is not a list of selectors: {source}")]
    NotSelectorList {
        source: serde_json::Error,
        raw: String,
    },
}

impl ExtractError {
    /// Raw model output for diagnostics, when extraction got that far.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::Transport(_) => None,
            Self::NoArrayFound { raw }
            | Self::InvalidJson { raw, .. }
            | Self::NotSelectorList { raw, .. } => Some(raw),
        }
    }
}

/// Builder for constructing `QueryExtractor` instances.
#[derive(Default)]
pub struct QueryExtractorBuilder {
    client: Option<Arc<dyn CompletionApi>>,
    model: Option<String>,
}

impl QueryExtractorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the completion client to use.
    pub fn client(mut self, client: Arc<dyn CompletionApi>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the model identifier (defaults to the fast `sonar` variant).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `QueryExtractor`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called.
    #[must_use]
    pub fn build(self) -> QueryExtractor {
        QueryExtractor {
            client: self.client.expect("client must be set via client() method"),
            model: self
                .model
                .unwrap_or_else(|| crate::config::DEFAULT_QUERY_MODEL.to_string()),
        }
    }
}

/// Translates free-text questions into structured record selectors.
///
/// Stateless: each call is one synchronous completion request with no retry
/// and no shared mutable state, so concurrent use is safe.
pub struct QueryExtractor {
    client: Arc<dyn CompletionApi>,
    model: String,
}

impl QueryExtractor {
    /// Creates a new `QueryExtractor` with the given client and model.
    #[must_use]
    pub fn new(client: Arc<dyn CompletionApi>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Extracts record selectors for `question` against `dataset`.
    ///
    /// The returned list is the parsed completion payload verbatim; entries
    /// may be incomplete (see `QuerySelector::is_complete`) and the caller
    /// decides what to skip.
    ///
    /// # Errors
    ///
    /// `ExtractError::Transport` on a failed outbound call; other variants
    /// when the completion text does not contain a parseable selector array.
    pub fn extract(
        &self,
        question: &str,
        dataset: &Dataset,
    ) -> Result<Vec<QuerySelector>, ExtractError> {
        let prompt = PROMPT_TEMPLATE
            .replace("{json_context}", &dataset.to_context_json())
            .replace("{user_input}", question);

        let request = CompletionRequest::new(self.model.clone(), prompt);
        let completion = self.client.complete(&request)?;

        let array = find_selector_array(&completion).ok_or_else(|| ExtractError::NoArrayFound {
            raw: completion.clone(),
        })?;

        let value: serde_json::Value =
            serde_json::from_str(array).map_err(|source| ExtractError::InvalidJson {
                source,
                raw: completion.clone(),
            })?;

        serde_json::from_value(value).map_err(|source| ExtractError::NotSelectorList {
            source,
            raw: completion.clone(),
        })
    }
}

/// Locates the first top-level JSON array of objects in `text`.
///
/// Bracket-depth scanner, aware of strings and escapes, so nested arrays,
/// nested objects, and brackets inside string values do not break the scan.
/// A candidate array qualifies only if its first non-whitespace element
/// starts with `{`.
fn find_selector_array(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('[') {
        let start = search_from + offset;

        // The array must open directly onto an object.
        let mut first = start + 1;
        while first < bytes.len() && bytes[first].is_ascii_whitespace() {
            first += 1;
        }
        if first >= bytes.len() || bytes[first] != b'{' {
            search_from = start + 1;
            continue;
        }

        if let Some(end) = matching_bracket(bytes, start) {
            return Some(&text[start..=end]);
        }
        search_from = start + 1;
    }

    None
}

/// Finds the index of the `]` closing the `[` at `start`, or `None` if the
/// text ends first. Tracks both bracket kinds and skips string contents.
fn matching_bracket(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    // Only the outermost bracket terminates the scan; it must
                    // be the `]` matching our opening `[`.
                    return if b == b']' { Some(i) } else { None };
                }
            }
            _ => {}
        }
    }

    None
}
