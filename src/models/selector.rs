use serde::{Deserialize, Deserializer, Serialize};

/// A structured `(state, month, year)` key identifying one dataset record.
///
/// Selectors come back from the extraction model, which does not always fill
/// every field. Deserialization is therefore deliberately lenient: missing
/// fields default, and `year` accepts either a JSON number or a numeric
/// string. Callers use `is_complete` to decide whether a selector is usable;
/// incomplete selectors are skipped downstream, not rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySelector {
    /// Lowercase state name from the dataset.
    #[serde(default)]
    pub state: String,
    /// Month name, e.g. "January".
    #[serde(default)]
    pub month: String,
    /// Calendar year, e.g. 2025.
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: i64,
}

impl QuerySelector {
    /// Creates a selector from explicit parts.
    pub fn new(state: impl Into<String>, month: impl Into<String>, year: i64) -> Self {
        Self {
            state: state.into(),
            month: month.into(),
            year,
        }
    }

    /// True when all three fields are present and usable downstream.
    pub fn is_complete(&self) -> bool {
        !self.state.trim().is_empty() && !self.month.trim().is_empty() && self.year > 0
    }

    /// Returns a copy with `state` lowercased and space-stripped and `month`
    /// trimmed, matching the store's key normalization.
    pub fn normalized(&self) -> Self {
        Self {
            state: self.state.replace(' ', "").to_lowercase(),
            month: self.month.trim().to_string(),
            year: self.year,
        }
    }
}

impl std::fmt::Display for QuerySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.state, self.month, self.year)
    }
}

/// Accepts a year as an integer, a float with no fractional part, or a
/// numeric string. Anything else deserializes to 0 (incomplete).
fn lenient_year<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}
