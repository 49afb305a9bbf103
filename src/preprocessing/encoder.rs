//! One-hot encoding for string columns

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One-hot encoder with the first (sorted) category as the dropped reference level.
///
/// Dropping the reference level keeps the encoded columns linearly
/// independent of the intercept. The reference category, unknown categories
/// and nulls all encode as zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    /// Fit on a string column
    pub fn fit(values: &StringChunked) -> Self {
        let mut categories: Vec<String> = values
            .into_iter()
            .flatten()
            .map(|s| s.to_string())
            .collect();
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    /// Categories seen during fitting, sorted
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of indicator columns produced
    pub fn n_outputs(&self) -> usize {
        self.categories.len().saturating_sub(1)
    }

    /// Names of the indicator columns (`column=category`)
    pub fn output_names(&self, column: &str) -> Vec<String> {
        self.categories
            .iter()
            .skip(1)
            .map(|c| format!("{}={}", column, c))
            .collect()
    }

    /// Position of the indicator set for `value`, if any
    pub fn indicator(&self, value: Option<&str>) -> Option<usize> {
        let value = value?;
        match self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(0) | Err(_) => None,
            Ok(pos) => Some(pos - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proximity() -> StringChunked {
        StringChunked::from_iter_options(
            "ocean_proximity".into(),
            [Some("NEAR BAY"), Some("INLAND"), None, Some("<1H OCEAN"), Some("INLAND")].into_iter(),
        )
    }

    #[test]
    fn test_categories_sorted_and_deduplicated() {
        let encoder = OneHotEncoder::fit(&proximity());
        assert_eq!(encoder.categories(), &["<1H OCEAN", "INLAND", "NEAR BAY"]);
        assert_eq!(encoder.n_outputs(), 2);
        assert_eq!(
            encoder.output_names("ocean_proximity"),
            vec!["ocean_proximity=INLAND", "ocean_proximity=NEAR BAY"]
        );
    }

    #[test]
    fn test_indicator_positions() {
        let encoder = OneHotEncoder::fit(&proximity());
        assert_eq!(encoder.indicator(Some("<1H OCEAN")), None);
        assert_eq!(encoder.indicator(Some("INLAND")), Some(0));
        assert_eq!(encoder.indicator(Some("NEAR BAY")), Some(1));
        assert_eq!(encoder.indicator(Some("ISLAND")), None);
        assert_eq!(encoder.indicator(None), None);
    }
}
