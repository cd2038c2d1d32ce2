//! Chat-completion HTTP client module.
//!
//! Wraps a hosted chat-completion API (Perplexity-style `/chat/completions`)
//! behind a blocking client and a mockable trait.

mod client;

pub use client::{
    CompletionApi, CompletionClient, CompletionClientBuilder, CompletionRequest, Message,
    TransportError,
};
