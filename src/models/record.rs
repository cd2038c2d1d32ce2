use serde::{Deserialize, Serialize};

/// One NDVI observation for a state in a given month and year.
///
/// Records are the unit of the reference dataset and of the backing store.
/// `state` is stored lowercase and space-free (e.g. "andhrapradesh").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdviRecord {
    /// Lowercase, space-free state name.
    pub state: String,
    /// Month name, e.g. "January".
    pub month: String,
    /// Calendar year, e.g. 2025.
    pub year: i64,
    /// Normalized Difference Vegetation Index value.
    pub ndvi_value: f64,
    /// Mean temperature in degrees Celsius.
    pub temperature: f64,
    /// Rainfall in millimeters.
    pub rainfall: f64,
    /// Soil moisture percentage.
    pub soilmoisture: f64,
    /// URL of the rendered NDVI image for this record.
    pub ndvi_url: String,
}

impl NdviRecord {
    /// One-line prose summary of this record, suitable for display.
    pub fn summary(&self) -> String {
        format!(
            "In {} {}, {} had an NDVI value of {}, a temperature of {}°C, \
             rainfall of {}mm, and soil moisture of {}%.",
            self.month,
            self.year,
            title_case(&self.state),
            self.ndvi_value,
            self.temperature,
            self.rainfall,
            self.soilmoisture
        )
    }

    /// Context line used when assembling follow-up answer input.
    ///
    /// Matches the `State=.., Month=..` layout the answerer prompt expects.
    pub fn context_line(&self) -> String {
        format!(
            "State={}, Month={}, Year={}, NDVI={}, Temperature={}°C, \
             Rainfall={}mm, Soil Moisture={}%",
            self.state,
            self.month,
            self.year,
            self.ndvi_value,
            self.temperature,
            self.rainfall,
            self.soilmoisture
        )
    }
}

/// Uppercases the first character of a (lowercase) state name for display.
fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
