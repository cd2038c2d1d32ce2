pub mod answerer;
pub mod completion;
pub mod config;
pub mod dataset;
pub mod extractor;
pub mod models;
pub mod session;
pub mod store;
pub mod tui;

pub use answerer::{AnswerError, FollowupAnswerer, FollowupAnswererBuilder, NO_CONTEXT_ADVISORY};
pub use completion::{CompletionApi, CompletionClient, CompletionClientBuilder, TransportError};
pub use config::{Config, ConfigError};
pub use dataset::Dataset;
pub use extractor::{ExtractError, QueryExtractor, QueryExtractorBuilder};
pub use models::{NdviRecord, QuerySelector};
pub use session::{HistoryEntry, QueryNotice, QueryOutcome, Session};
pub use store::NdviStore;
