//! Core value types: dataset records and query selectors.

mod record;
mod selector;

pub use record::NdviRecord;
pub use selector::QuerySelector;
