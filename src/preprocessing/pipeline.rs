//! Feature pipeline: turns a feature frame into the numeric matrix estimators consume

use super::encoder::OneHotEncoder;
use super::imputer::MedianImputer;
use crate::dataset::column_names;
use crate::error::{HousingError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a raw column is turned into features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnTransform {
    /// Numeric column, missing values replaced by the training median
    Numeric(MedianImputer),
    /// String column, one-hot encoded
    Categorical(OneHotEncoder),
}

/// A fitted raw column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub transform: ColumnTransform,
}

impl FeatureColumn {
    fn n_outputs(&self) -> usize {
        match &self.transform {
            ColumnTransform::Numeric(_) => 1,
            ColumnTransform::Categorical(encoder) => encoder.n_outputs(),
        }
    }
}

/// Fitted description of the raw feature columns a model expects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeaturePipeline {
    columns: Vec<FeatureColumn>,
    is_fitted: bool,
}

impl FeaturePipeline {
    /// Create an unfitted pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn column kinds, medians and categories from a feature frame
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        if df.width() == 0 {
            return Err(HousingError::SchemaError(
                "dataset has no feature columns".to_string(),
            ));
        }

        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let name = column.name().to_string();
            // An all-empty column carries no type information and is kept numeric
            let all_null = column.len() > 0 && column.null_count() == column.len();
            let transform = match column.dtype() {
                DataType::String if !all_null => {
                    ColumnTransform::Categorical(OneHotEncoder::fit(column.str()?))
                }
                _ => {
                    let values = numeric_values(column)?;
                    ColumnTransform::Numeric(MedianImputer::fit(values.f64()?))
                }
            };
            columns.push(FeatureColumn { name, transform });
        }

        self.columns = columns;
        self.is_fitted = true;
        Ok(self)
    }

    /// Build the feature matrix for `df`.
    ///
    /// `df` must hold exactly the fitted columns, in any order.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(HousingError::ModelNotFitted);
        }
        self.check_columns(df)?;

        let mut x = Array2::zeros((df.height(), self.n_features()));
        let mut offset = 0;

        for feature in &self.columns {
            let column = df.column(&feature.name)?;
            match &feature.transform {
                ColumnTransform::Numeric(imputer) => {
                    // An all-empty CSV column is read back as strings
                    if column.null_count() == column.len() {
                        x.column_mut(offset).fill(imputer.fill_value());
                        offset += 1;
                        continue;
                    }
                    if matches!(column.dtype(), DataType::String) {
                        return Err(HousingError::SchemaError(format!(
                            "column '{}' must be numeric, found {}",
                            feature.name,
                            column.dtype()
                        )));
                    }
                    let values = numeric_values(column)?;
                    for (row, v) in imputer.transform(values.f64()?).into_iter().enumerate() {
                        x[[row, offset]] = v;
                    }
                }
                ColumnTransform::Categorical(encoder) => {
                    if !matches!(column.dtype(), DataType::String) {
                        return Err(HousingError::SchemaError(format!(
                            "column '{}' must be a string column, found {}",
                            feature.name,
                            column.dtype()
                        )));
                    }
                    for (row, v) in column.str()?.into_iter().enumerate() {
                        if let Some(pos) = encoder.indicator(v) {
                            x[[row, offset + pos]] = 1.0;
                        }
                    }
                }
            }
            offset += feature.n_outputs();
        }

        Ok(x)
    }

    /// Fit and transform in one pass
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Raw columns the pipeline expects, in fitted order
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Raw column names, in fitted order
    pub fn input_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of the encoded features, in matrix column order
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| match &c.transform {
                ColumnTransform::Numeric(_) => vec![c.name.clone()],
                ColumnTransform::Categorical(encoder) => encoder.output_names(&c.name),
            })
            .collect()
    }

    /// Width of the encoded feature matrix
    pub fn n_features(&self) -> usize {
        self.columns.iter().map(FeatureColumn::n_outputs).sum()
    }

    fn check_columns(&self, df: &DataFrame) -> Result<()> {
        let present: HashSet<String> = column_names(df).into_iter().collect();
        let expected: HashSet<String> = self.input_names().into_iter().collect();

        let missing: Vec<String> = self
            .input_names()
            .into_iter()
            .filter(|name| !present.contains(name))
            .collect();
        let unexpected: Vec<String> = column_names(df)
            .into_iter()
            .filter(|name| !expected.contains(name))
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(HousingError::FeatureMismatch {
                missing,
                unexpected,
            })
        }
    }
}

fn numeric_values(column: &Column) -> Result<Series> {
    column
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .map_err(|e| {
            HousingError::SchemaError(format!("column '{}' is not numeric: {}", column.name(), e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn housing_features() -> DataFrame {
        df!(
            "median_income" => &[8.3, 7.2, 5.6, 3.8],
            "total_bedrooms" => &[Some(129.0), None, Some(190.0), Some(235.0)],
            "ocean_proximity" => &["NEAR BAY", "INLAND", "<1H OCEAN", "INLAND"]
        )
        .unwrap()
    }

    #[test]
    fn test_fit_transform_shape_and_names() {
        let df = housing_features();
        let mut pipeline = FeaturePipeline::new();
        let x = pipeline.fit_transform(&df).unwrap();

        assert_eq!(x.dim(), (4, 4));
        assert_eq!(
            pipeline.feature_names(),
            vec![
                "median_income",
                "total_bedrooms",
                "ocean_proximity=INLAND",
                "ocean_proximity=NEAR BAY"
            ]
        );
        // Missing bedroom count takes the median of 129, 190, 235
        assert_eq!(x[[1, 1]], 190.0);
        // "<1H OCEAN" is the reference level
        assert_eq!(x[[2, 2]], 0.0);
        assert_eq!(x[[2, 3]], 0.0);
        assert_eq!(x[[0, 3]], 1.0);
        assert_eq!(x[[1, 2]], 1.0);
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let df = housing_features();
        let mut pipeline = FeaturePipeline::new();
        let x = pipeline.fit_transform(&df).unwrap();

        let reordered = df
            .select(["ocean_proximity", "total_bedrooms", "median_income"])
            .unwrap();
        assert_eq!(pipeline.transform(&reordered).unwrap(), x);
    }

    #[test]
    fn test_missing_and_unexpected_columns() {
        let mut pipeline = FeaturePipeline::new();
        pipeline.fit(&housing_features()).unwrap();

        let other = df!(
            "median_income" => &[1.0],
            "total_bedrooms" => &[1.0],
            "population" => &[1.0]
        )
        .unwrap();

        match pipeline.transform(&other) {
            Err(HousingError::FeatureMismatch { missing, unexpected }) => {
                assert_eq!(missing, vec!["ocean_proximity"]);
                assert_eq!(unexpected, vec!["population"]);
            }
            other => panic!("expected feature mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_type_is_schema_error() {
        let mut pipeline = FeaturePipeline::new();
        pipeline.fit(&housing_features()).unwrap();

        let bad = df!(
            "median_income" => &["high"],
            "total_bedrooms" => &[1.0],
            "ocean_proximity" => &["INLAND"]
        )
        .unwrap();
        assert!(matches!(pipeline.transform(&bad), Err(HousingError::SchemaError(_))));
    }

    #[test]
    fn test_unknown_category_encodes_as_zeros() {
        let mut pipeline = FeaturePipeline::new();
        pipeline.fit(&housing_features()).unwrap();

        let island = df!(
            "median_income" => &[2.0],
            "total_bedrooms" => &[100.0],
            "ocean_proximity" => &["ISLAND"]
        )
        .unwrap();
        let x = pipeline.transform(&island).unwrap();
        assert_eq!(x.row(0).to_vec(), vec![2.0, 100.0, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_training_column_stays_numeric() {
        let train = df!(
            "median_income" => &[8.3, 7.2],
            "total_bedrooms" => &[None::<&str>, None]
        )
        .unwrap();
        let mut pipeline = FeaturePipeline::new();
        let x = pipeline.fit_transform(&train).unwrap();
        assert!(matches!(
            pipeline.columns()[1].transform,
            ColumnTransform::Numeric(_)
        ));
        assert_eq!(x.column(1).to_vec(), vec![0.0, 0.0]);

        let scored = df!(
            "median_income" => &[3.1, 4.2],
            "total_bedrooms" => &[Some(120.0), None]
        )
        .unwrap();
        let x = pipeline.transform(&scored).unwrap();
        assert_eq!(x.column(1).to_vec(), vec![120.0, 0.0]);
    }

    #[test]
    fn test_unfitted() {
        let pipeline = FeaturePipeline::new();
        assert!(matches!(
            pipeline.transform(&housing_features()),
            Err(HousingError::ModelNotFitted)
        ));
    }
}
