//! Integration tests for dataset loading, saving and splitting

use housing_pipeline::dataset::{income_cat_proportions, stratified_split, train_val_split};
use housing_pipeline::stages::ingest;
use housing_pipeline::utils::{DataLoader, DataSaver};
use polars::prelude::*;
use std::collections::HashSet;
use tempfile::TempDir;

fn housing_frame(n: usize) -> DataFrame {
    let ids: Vec<i64> = (0..n as i64).collect();
    let income: Vec<f64> = (0..n).map(|i| 0.5 + (i % 17) as f64 * 0.55).collect();
    let bedrooms: Vec<Option<f64>> = (0..n)
        .map(|i| if i % 11 == 0 { None } else { Some(100.0 + i as f64) })
        .collect();
    let proximity: Vec<&str> = (0..n)
        .map(|i| ["<1H OCEAN", "INLAND", "NEAR BAY", "NEAR OCEAN"][i % 4])
        .collect();
    let value: Vec<f64> = (0..n).map(|i| 50000.0 + 1000.0 * i as f64).collect();

    df!(
        "id" => ids,
        "median_income" => income,
        "total_bedrooms" => bedrooms,
        "ocean_proximity" => proximity,
        "median_house_value" => value
    )
    .unwrap()
}

fn ids(df: &DataFrame) -> Vec<i64> {
    df.column("id").unwrap().i64().unwrap().into_no_null_iter().collect()
}

// ============================================================================
// Split properties
// ============================================================================

#[test]
fn test_split_sizes_and_partition() {
    for n in [1usize, 5, 10, 99, 100, 1001] {
        let df = housing_frame(n);
        let (train, val) = train_val_split(&df, 0.2, 42).unwrap();

        let expected_train = (0.8 * n as f64).round() as usize;
        assert_eq!(train.height(), expected_train, "n = {}", n);
        assert_eq!(val.height(), n - expected_train, "n = {}", n);

        let train_ids: HashSet<i64> = ids(&train).into_iter().collect();
        let val_ids: HashSet<i64> = ids(&val).into_iter().collect();
        assert!(train_ids.is_disjoint(&val_ids));
        assert_eq!(train_ids.len() + val_ids.len(), n);
    }
}

#[test]
fn test_split_is_byte_identical_across_runs() {
    let df = housing_frame(250);
    let dir = TempDir::new().unwrap();

    let mut outputs = Vec::new();
    for run in 0..2 {
        let out = dir.path().join(format!("run{}", run));
        std::fs::create_dir_all(&out).unwrap();
        let (mut train, mut val) = ingest::split(&df, 0.2, 42).unwrap();
        ingest::save(&mut train, &out, ingest::TRAIN_FILE).unwrap();
        ingest::save(&mut val, &out, ingest::VALIDATION_FILE).unwrap();
        outputs.push((
            std::fs::read(out.join(ingest::TRAIN_FILE)).unwrap(),
            std::fs::read(out.join(ingest::VALIDATION_FILE)).unwrap(),
        ));
    }

    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_different_seeds_differ() {
    let df = housing_frame(200);
    let (a, _) = train_val_split(&df, 0.2, 42).unwrap();
    let (b, _) = train_val_split(&df, 0.2, 7).unwrap();
    assert_ne!(ids(&a), ids(&b));
}

#[test]
fn test_stratified_split_preserves_proportions() {
    let df = housing_frame(1000);
    let (train, val) = stratified_split(&df, 0.2, 42).unwrap();

    assert_eq!(train.height(), 800);
    assert_eq!(val.height(), 200);

    let full = income_cat_proportions(&df).unwrap();
    let train_props = income_cat_proportions(&train).unwrap();
    let val_props = income_cat_proportions(&val).unwrap();

    assert!((full.values().sum::<f64>() - 1.0).abs() < 1e-12);
    for (cat, p) in &full {
        assert!((train_props[cat] - p).abs() < 0.01, "category {}", cat);
        assert!((val_props[cat] - p).abs() < 0.01, "category {}", cat);
    }
}

#[test]
fn test_invalid_fraction() {
    let df = housing_frame(10);
    assert!(train_val_split(&df, -0.1, 42).is_err());
    assert!(train_val_split(&df, 1.1, 42).is_err());
    assert!(stratified_split(&df, f64::NAN, 42).is_err());
}

// ============================================================================
// CSV round trip
// ============================================================================

#[test]
fn test_save_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut df = housing_frame(30);

    let path = ingest::save(&mut df, dir.path(), "train.csv").unwrap();
    let loaded = DataLoader::new().load_csv(&path).unwrap();

    assert_eq!(loaded.get_column_names(), df.get_column_names());
    assert!(loaded.equals_missing(&df));
}

#[test]
fn test_saved_csv_has_header_and_no_index() {
    let dir = TempDir::new().unwrap();
    let mut df = housing_frame(3);
    let path = dir.path().join("val.csv");
    DataSaver::save_csv(&mut df, &path).unwrap();

    let header = DataLoader::new().read_header(&path).unwrap();
    assert_eq!(
        header,
        vec!["id", "median_income", "total_bedrooms", "ocean_proximity", "median_house_value"]
    );
}

#[test]
fn test_load_malformed_csv() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.csv");
    std::fs::write(&path, "a,b\n1,2\n3,4,5,6\n").unwrap();
    assert!(DataLoader::new().load_csv(&path).is_err());
}
