//! Session layer owning accumulated history.
//!
//! Sits between the LLM components, the record store, and the UIs: runs the
//! extract-then-lookup pipeline, accumulates observations and insights, and
//! assembles the textual context the follow-up answerer consumes. The LLM
//! components themselves stay stateless; all bookkeeping lives here.

use std::fmt;

use anyhow::Result;
use time::OffsetDateTime;

use crate::answerer::{FollowupAnswerer, NO_CONTEXT_ADVISORY};
use crate::extractor::QueryExtractor;
use crate::models::{NdviRecord, QuerySelector};
use crate::store::NdviStore;

/// One entry in the session history.
///
/// Retrieved records and generated answers live in the same timeline, so
/// the list view can show both in the order they arrived.
#[derive(Debug, Clone)]
pub enum HistoryEntry {
    /// A dataset record retrieved by a query.
    Observation {
        record: NdviRecord,
        fetched_at: OffsetDateTime,
    },
    /// A follow-up question and its generated answer.
    Insight {
        question: String,
        answer: String,
        created_at: OffsetDateTime,
    },
}

impl HistoryEntry {
    /// Short label for list display.
    pub fn label(&self) -> String {
        match self {
            Self::Observation { record, .. } => {
                format!("{} ({} {})", record.state, record.month, record.year)
            }
            Self::Insight { question, .. } => format!("Q: {question}"),
        }
    }
}

/// Per-selector notices produced while running a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNotice {
    /// The model returned a selector missing state, month, or a usable year.
    IncompleteSelector { index: usize },
    /// A complete selector matched nothing in the store.
    NoData { selector: QuerySelector },
}

impl fmt::Display for QueryNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteSelector { index } => {
                write!(f, "Skipping incomplete selector #{index}")
            }
            Self::NoData { selector } => write!(f, "No data for {selector}"),
        }
    }
}

/// Result of one `run_query` call: how many observations were added and
/// which selectors were skipped or missed.
#[derive(Debug, Default)]
pub struct QueryOutcome {
    pub added: usize,
    pub notices: Vec<QueryNotice>,
}

/// A user session: LLM components, record store, and accumulated history.
pub struct Session {
    extractor: QueryExtractor,
    answerer: FollowupAnswerer,
    store: NdviStore,
    dataset: crate::dataset::Dataset,
    history: Vec<HistoryEntry>,
}

impl Session {
    /// Creates a session over the given components and store.
    pub fn new(
        extractor: QueryExtractor,
        answerer: FollowupAnswerer,
        store: NdviStore,
        dataset: crate::dataset::Dataset,
    ) -> Self {
        Self {
            extractor,
            answerer,
            store,
            dataset,
            history: Vec::new(),
        }
    }

    /// Returns the accumulated history, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Runs the natural-language query pipeline.
    ///
    /// Extracts selectors for `question`, skips incomplete ones with a
    /// notice, looks up the rest in the store, and appends an observation
    /// per hit. Selector validation happens here, not in the extractor.
    pub fn run_query(&mut self, question: &str) -> Result<QueryOutcome> {
        if question.trim().is_empty() {
            anyhow::bail!("Query cannot be empty");
        }

        let selectors = self.extractor.extract(question, &self.dataset)?;

        let mut outcome = QueryOutcome::default();
        for (i, selector) in selectors.iter().enumerate() {
            let selector = selector.normalized();
            if !selector.is_complete() {
                outcome
                    .notices
                    .push(QueryNotice::IncompleteSelector { index: i + 1 });
                continue;
            }

            match self
                .store
                .lookup(&selector.state, selector.year, &selector.month)?
            {
                Some(record) => {
                    self.history.push(HistoryEntry::Observation {
                        record,
                        fetched_at: OffsetDateTime::now_utc(),
                    });
                    outcome.added += 1;
                }
                None => outcome.notices.push(QueryNotice::NoData { selector }),
            }
        }

        Ok(outcome)
    }

    /// Assembles the follow-up context from observation history.
    ///
    /// One `State=..` line per observation; insights are excluded so the
    /// answerer never reasons over its own prior output.
    pub fn context(&self) -> String {
        self.history
            .iter()
            .filter_map(|entry| match entry {
                HistoryEntry::Observation { record, .. } => Some(record.context_line()),
                HistoryEntry::Insight { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Asks a follow-up question over the accumulated observations.
    ///
    /// With no observations in history, returns the fixed advisory without
    /// an outbound call and without recording an insight.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            anyhow::bail!("Question cannot be empty");
        }

        let context = self.context();
        if context.trim().is_empty() {
            return Ok(NO_CONTEXT_ADVISORY.to_string());
        }

        let answer = self.answerer.answer(question, &context)?;
        self.history.push(HistoryEntry::Insight {
            question: question.to_string(),
            answer: answer.clone(),
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(answer)
    }
}
