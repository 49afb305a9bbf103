//! Seeded train/validation partitions

use super::income::income_categories;
use super::take_rows;
use crate::error::{HousingError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Row positions of a train/validation partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

fn validate_test_fraction(test_fraction: f64) -> Result<()> {
    if !test_fraction.is_finite() || !(0.0..=1.0).contains(&test_fraction) {
        return Err(HousingError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: test_fraction.to_string(),
            reason: "must lie in [0, 1]".to_string(),
        });
    }
    Ok(())
}

/// Number of training rows for `n_samples` rows: `round((1 - test_fraction) * n)`
pub fn train_size(n_samples: usize, test_fraction: f64) -> usize {
    let n_train = ((1.0 - test_fraction) * n_samples as f64).round() as usize;
    n_train.min(n_samples)
}

/// Shuffle `0..n_samples` with a seeded generator and cut it into train and validation positions
pub fn split_indices(n_samples: usize, test_fraction: f64, seed: u64) -> Result<SplitIndices> {
    validate_test_fraction(test_fraction)?;

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let validation = indices.split_off(train_size(n_samples, test_fraction));
    Ok(SplitIndices {
        train: indices,
        validation,
    })
}

/// Partition positions within each stratum so both subsets keep the stratum mix.
///
/// Training quotas per stratum are allocated with the largest-remainder
/// method, so the train size is exactly [`train_size`].
pub fn stratified_indices<K: Ord + Clone>(
    strata: &[K],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices> {
    validate_test_fraction(test_fraction)?;

    let n_samples = strata.len();
    let n_train = train_size(n_samples, test_fraction);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut groups: BTreeMap<K, Vec<usize>> = BTreeMap::new();
    for (row, key) in strata.iter().enumerate() {
        groups.entry(key.clone()).or_default().push(row);
    }
    for rows in groups.values_mut() {
        rows.shuffle(&mut rng);
    }

    // (group position, floor quota, remainder) using exact integer shares
    let mut quotas: Vec<(usize, usize, usize)> = groups
        .values()
        .enumerate()
        .map(|(g, rows)| {
            let share = rows.len() * n_train;
            (g, share / n_samples.max(1), share % n_samples.max(1))
        })
        .collect();

    let assigned: usize = quotas.iter().map(|q| q.1).sum();
    let mut leftover = n_train - assigned;

    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&a, &b| quotas[b].2.cmp(&quotas[a].2).then(a.cmp(&b)));
    for g in order {
        if leftover == 0 {
            break;
        }
        if quotas[g].2 > 0 {
            quotas[g].1 += 1;
            leftover -= 1;
        }
    }

    let mut train = Vec::with_capacity(n_train);
    let mut validation = Vec::with_capacity(n_samples - n_train);
    for ((_, quota, _), rows) in quotas.iter().zip(groups.values()) {
        train.extend_from_slice(&rows[..*quota]);
        validation.extend_from_slice(&rows[*quota..]);
    }

    train.shuffle(&mut rng);
    validation.shuffle(&mut rng);

    Ok(SplitIndices { train, validation })
}

/// Split a dataset into (train, validation) frames.
///
/// The same input, fraction and seed always produce the same partition.
pub fn train_val_split(
    df: &DataFrame,
    test_fraction: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    let split = split_indices(df.height(), test_fraction, seed)?;
    Ok((take_rows(df, &split.train)?, take_rows(df, &split.validation)?))
}

/// Split a dataset into (train, validation) frames stratified by income category
pub fn stratified_split(
    df: &DataFrame,
    test_fraction: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    let strata = income_categories(df)?;
    let split = stratified_indices(&strata, test_fraction, seed)?;
    Ok((take_rows(df, &split.train)?, take_rows(df, &split.validation)?))
}
