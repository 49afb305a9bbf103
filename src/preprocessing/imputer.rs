//! Missing value imputation for numeric columns

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Replaces missing numeric values with the median seen during fitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    fill_value: f64,
}

impl MedianImputer {
    /// Fit on a numeric column; nulls and NaN are ignored.
    /// A column with no observed values imputes 0.0.
    pub fn fit(values: &Float64Chunked) -> Self {
        let observed: Vec<f64> = values
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect();

        Self {
            fill_value: median(observed).unwrap_or(0.0),
        }
    }

    /// Value substituted for missing entries
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Fill missing entries
    pub fn transform(&self, values: &Float64Chunked) -> Vec<f64> {
        values
            .into_iter()
            .map(|v| match v {
                Some(x) if !x.is_nan() => x,
                _ => self.fill_value,
            })
            .collect()
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
