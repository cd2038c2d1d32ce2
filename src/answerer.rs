//! Follow-up question answering over accumulated results.
//!
//! `FollowupAnswerer` turns a free-text question plus an already-assembled
//! textual data context into a single prose answer. The context is opaque to
//! this module and passed through verbatim; the one built-in guard is the
//! empty-context short-circuit, which avoids wasting a completion call when
//! there is nothing to reason over.

use std::sync::Arc;

use thiserror::Error;

use crate::completion::{CompletionApi, CompletionRequest, TransportError};

/// Marker the prompt asks the model to place its final answer after.
const ANSWER_MARKER: &str = "Answer:";

/// Sampling temperature balancing fluency and determinism.
const ANSWER_TEMPERATURE: f64 = 0.5;

/// Fixed advisory returned when there is no context to reason over.
pub const NO_CONTEXT_ADVISORY: &str =
    "No data available. Please run a query first so I can use the results to answer your question.";

/// Prompt template for analytical follow-up answers.
const PROMPT_TEMPLATE: &str = r#"You are a skilled data analyst responding to questions using only the NDVI dataset provided.

Instructions:
- You may reason internally if you need to, but place the final answer **after 'Answer:'**
- The final answer should be a fluent, 3-5 sentence paragraph drawing comparisons and conclusions
- Do not make up values or use external knowledge

NDVI Data:
{context}

User's Question:
{user_query}

Answer:"#;

/// Errors raised by follow-up answering.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The outbound completion call failed; carries the original cause.
    #[error("Follow-up answering failed: {0}")]
    Transport(#[from] TransportError),
}

/// Builder for constructing `FollowupAnswerer` instances.
#[derive(Default)]
pub struct FollowupAnswererBuilder {
    client: Option<Arc<dyn CompletionApi>>,
    model: Option<String>,
}

impl FollowupAnswererBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the completion client to use.
    pub fn client(mut self, client: Arc<dyn CompletionApi>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the model identifier (defaults to the reasoning variant).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the `FollowupAnswerer`.
    ///
    /// # Panics
    ///
    /// Panics if `client()` was not called.
    #[must_use]
    pub fn build(self) -> FollowupAnswerer {
        FollowupAnswerer {
            client: self.client.expect("client must be set via client() method"),
            model: self
                .model
                .unwrap_or_else(|| crate::config::DEFAULT_ANSWER_MODEL.to_string()),
        }
    }
}

/// Answers follow-up questions over a caller-assembled data context.
///
/// Stateless request/response: one synchronous completion call per
/// invocation, no retry, safe to use concurrently.
pub struct FollowupAnswerer {
    client: Arc<dyn CompletionApi>,
    model: String,
}

impl FollowupAnswerer {
    /// Creates a new `FollowupAnswerer` with the given client and model.
    #[must_use]
    pub fn new(client: Arc<dyn CompletionApi>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Answers `question` using only `context`.
    ///
    /// A whitespace-only question or context returns `NO_CONTEXT_ADVISORY`
    /// without any outbound call. Otherwise the completion is reduced to the
    /// text after the last `Answer:` marker, falling back to the last
    /// non-empty paragraph when the marker is absent.
    ///
    /// # Errors
    ///
    /// `AnswerError::Transport` when the outbound call fails.
    pub fn answer(&self, question: &str, context: &str) -> Result<String, AnswerError> {
        if question.trim().is_empty() || context.trim().is_empty() {
            return Ok(NO_CONTEXT_ADVISORY.to_string());
        }

        let prompt = PROMPT_TEMPLATE
            .replace("{context}", context)
            .replace("{user_query}", question);

        let request =
            CompletionRequest::new(self.model.clone(), prompt).with_temperature(ANSWER_TEMPERATURE);
        let completion = self.client.complete(&request)?;

        Ok(extract_final_answer(&completion))
    }
}

/// Reduces a raw completion to the final answer text.
///
/// Takes everything after the last `Answer:` marker, trimmed. Without a
/// marker, takes the last non-empty blank-line-separated paragraph.
fn extract_final_answer(completion: &str) -> String {
    let trimmed = completion.trim();

    if let Some(idx) = trimmed.rfind(ANSWER_MARKER) {
        return trimmed[idx + ANSWER_MARKER.len()..].trim().to_string();
    }

    trimmed
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .last()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_takes_text_after_last_occurrence() {
        let completion = "Thinking about Answer: formats...\n\nAnswer: The NDVI rose steadily.";
        assert_eq!(
            extract_final_answer(completion),
            "The NDVI rose steadily."
        );
    }

    #[test]
    fn marker_result_is_trimmed() {
        assert_eq!(
            extract_final_answer("Answer:   spaced out.  \n"),
            "spaced out."
        );
    }

    #[test]
    fn fallback_takes_last_paragraph() {
        let completion = "First paragraph of reasoning.\n\nSecond paragraph conclusion.";
        assert_eq!(
            extract_final_answer(completion),
            "Second paragraph conclusion."
        );
    }

    #[test]
    fn fallback_ignores_blank_paragraphs() {
        let completion = "Only paragraph.\n\n\n\n   \n";
        assert_eq!(extract_final_answer(completion), "Only paragraph.");
    }

    #[test]
    fn empty_completion_yields_empty_answer() {
        assert_eq!(extract_final_answer(""), "");
        assert_eq!(extract_final_answer("   \n  "), "");
    }
}
