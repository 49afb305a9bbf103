//! Housing dataset schema and row partitioning
//!
//! - [`split`] - seeded train/validation partitions (plain and stratified)
//! - [`income`] - income category buckets used for stratification

pub mod income;
pub mod split;

pub use income::{income_cat_proportions, income_category, INCOME_BIN_EDGES};
pub use split::{stratified_split, train_val_split, SplitIndices};

use crate::error::{HousingError, Result};
use ndarray::Array1;
use polars::prelude::*;

/// Column holding the prediction target
pub const TARGET_COLUMN: &str = "median_house_value";

/// Column used to derive income categories
pub const INCOME_COLUMN: &str = "median_income";

/// Separate a labelled dataset into its feature frame and target vector.
///
/// Fails with a schema error when the target column is absent, not numeric,
/// or contains missing values.
pub fn separate_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Array1<f64>)> {
    if !has_column(df, target) {
        return Err(HousingError::SchemaError(format!(
            "target column '{}' not found (columns: {:?})",
            target,
            column_names(df)
        )));
    }

    let column = df.column(target)?;
    if matches!(column.dtype(), DataType::String) {
        return Err(HousingError::SchemaError(format!(
            "target column '{}' must be numeric, found {}",
            target,
            column.dtype()
        )));
    }

    let values = column
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .map_err(|e| HousingError::SchemaError(format!("target column '{}': {}", target, e)))?;

    let y = values
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                HousingError::SchemaError(format!(
                    "target column '{}' has a missing value at row {}",
                    target, row
                ))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    let features = df.drop(target)?;
    Ok((features, Array1::from_vec(y)))
}

/// Whether `df` has a column called `name`
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Owned column names of `df` in frame order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|c| c.to_string())
        .collect()
}

/// Select rows of `df` by position, preserving the given order
pub fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = rows.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), idx);
    Ok(df.take(&idx)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separate_target() {
        let df = df!(
            "median_income" => &[1.0, 2.0],
            "median_house_value" => &[100000i64, 200000]
        )
        .unwrap();

        let (features, y) = separate_target(&df, TARGET_COLUMN).unwrap();
        assert_eq!(column_names(&features), vec!["median_income"]);
        assert_eq!(y.to_vec(), vec![100000.0, 200000.0]);
    }

    #[test]
    fn test_missing_target_is_schema_error() {
        let df = df!("median_income" => &[1.0, 2.0]).unwrap();
        let err = separate_target(&df, TARGET_COLUMN).unwrap_err();
        assert!(matches!(err, HousingError::SchemaError(_)));
    }

    #[test]
    fn test_string_target_is_schema_error() {
        let df = df!(
            "median_income" => &[1.0],
            "median_house_value" => &["cheap"]
        )
        .unwrap();
        assert!(separate_target(&df, TARGET_COLUMN).unwrap_err().is_schema_error());
    }

    #[test]
    fn test_null_target_is_schema_error() {
        let df = df!(
            "median_income" => &[1.0, 2.0],
            "median_house_value" => &[Some(1.0), None]
        )
        .unwrap();
        assert!(separate_target(&df, TARGET_COLUMN).is_err());
    }

    #[test]
    fn test_take_rows_order() {
        let df = df!("a" => &[10i64, 20, 30]).unwrap();
        let taken = take_rows(&df, &[2, 0]).unwrap();
        let values: Vec<Option<i64>> = taken.column("a").unwrap().i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(30), Some(10)]);
    }
}
