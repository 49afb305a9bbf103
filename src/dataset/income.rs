//! Income categories
//!
//! Median income is bucketed into five categories so that train and
//! validation sets can be checked (or forced) to share the same income mix.

use super::{has_column, INCOME_COLUMN};
use crate::error::{HousingError, Result};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Upper bin edges for categories 1..=4; category 5 is everything above the last edge
pub const INCOME_BIN_EDGES: [f64; 4] = [1.5, 3.0, 4.5, 6.0];

/// Income category (1..=5) for a median income value.
///
/// Bins are right-closed: `(0, 1.5]` is 1, `(1.5, 3.0]` is 2 and so on.
/// Non-positive and NaN incomes have no category.
pub fn income_category(median_income: f64) -> Option<u8> {
    if median_income.is_nan() || median_income <= 0.0 {
        return None;
    }

    let category = INCOME_BIN_EDGES
        .iter()
        .position(|&edge| median_income <= edge)
        .unwrap_or(INCOME_BIN_EDGES.len());

    Some(category as u8 + 1)
}

/// Income category of every row, in row order
pub fn income_categories(df: &DataFrame) -> Result<Vec<Option<u8>>> {
    if !has_column(df, INCOME_COLUMN) {
        return Err(HousingError::ColumnNotFound(INCOME_COLUMN.to_string()));
    }

    let income = df
        .column(INCOME_COLUMN)?
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .map_err(|e| HousingError::SchemaError(format!("{}: {}", INCOME_COLUMN, e)))?;

    Ok(income
        .f64()?
        .into_iter()
        .map(|v| v.and_then(income_category))
        .collect())
}

/// Fraction of rows falling in each income category.
///
/// Rows without a category are left out, so the fractions sum to 1 whenever
/// at least one row has a category.
pub fn income_cat_proportions(df: &DataFrame) -> Result<BTreeMap<u8, f64>> {
    let categories = income_categories(df)?;

    let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
    for category in categories.into_iter().flatten() {
        *counts.entry(category).or_insert(0) += 1;
    }

    let total: usize = counts.values().sum();
    Ok(counts
        .into_iter()
        .map(|(category, count)| (category, count as f64 / total as f64))
        .collect())
}
