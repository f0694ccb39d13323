//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::path::PathBuf;

use eda_report::pipeline::{CorrelationMatrix, VariablePair};
use eda_report::report::{ArtifactEmitter, ArtifactError, ArtifactHandle};
use polars::prelude::*;
use tempfile::TempDir;

/// Create the small sales-style DataFrame used across the pipeline tests
///
/// This DataFrame includes:
/// - `price`: Strictly increasing
/// - `qty`: Exactly 2 * price (correlation 1.0 with price)
/// - `rating`: Constant (undefined correlation with everything)
pub fn create_sales_dataframe() -> DataFrame {
    df! {
        "price" => [1.0f64, 2.0, 3.0, 4.0],
        "qty" => [2.0f64, 4.0, 6.0, 8.0],
        "rating" => [5.0f64, 5.0, 5.0, 5.0],
    }
    .unwrap()
}

/// Three perfectly linear columns: every pair has |r| = 1, so ranking is
/// decided by the canonical name tie-break alone
pub fn create_tied_sales_dataframe() -> DataFrame {
    df! {
        "price" => [10.0f64, 20.0, 30.0],
        "qty" => [1.0f64, 2.0, 3.0],
        "rating" => [5.0f64, 4.0, 3.0],
    }
    .unwrap()
}

/// Create a DataFrame with known correlation patterns
pub fn create_correlation_test_dataframe() -> DataFrame {
    df! {
        "a" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
        "b" => [2.0f64, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0], // Perfectly correlated with a (b = 2*a)
        "c" => [10.0f64, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0], // Perfectly anti-correlated with a
        "d" => [5.0f64, 1.0, 8.0, 2.0, 9.0, 3.0, 7.0, 4.0, 6.0, 0.0], // Weakly related noise
    }
    .unwrap()
}

/// Numeric and non-numeric columns side by side
pub fn create_mixed_type_dataframe() -> DataFrame {
    df! {
        "city" => ["Oslo", "Lima", "Pune", "Kobe", "Nice"],
        "delivery_time" => [30i64, 45, 25, 60, 35],
        "distance" => [3.0f64, 6.5, 2.0, 9.0, 4.0],
        "express" => [true, false, true, false, true],
    }
    .unwrap()
}

/// Only a single numeric column; correlation is impossible
pub fn create_single_numeric_dataframe() -> DataFrame {
    df! {
        "name" => ["a", "b", "c"],
        "score" => [3.0f64, 1.0, 2.0],
    }
    .unwrap()
}

/// Messy headers, one exact duplicate row and one row with a null
///
/// Cleaning should remove 1 duplicate and 1 null row, leaving 4 rows.
pub fn create_dirty_dataframe() -> DataFrame {
    df! {
        " Order ID" => [Some(1i64), Some(2), Some(2), Some(3), Some(4), Some(5)],
        "Delivery Time " => [Some(30.0f64), Some(45.0), Some(45.0), None, Some(25.0), Some(60.0)],
        "Agent Rating" => [Some(4.5f64), Some(3.0), Some(3.0), Some(4.0), Some(5.0), Some(2.5)],
    }
    .unwrap()
}

/// Create a larger random DataFrame for performance/stress tests
pub fn create_large_test_dataframe(rows: usize, cols: usize) -> DataFrame {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);

    let columns: Vec<Column> = (0..cols)
        .map(|i| {
            let values: Vec<f64> = (0..rows).map(|_| rng.gen::<f64>()).collect();
            Column::new(format!("feature_{}", i).into(), values)
        })
        .collect();

    DataFrame::new(columns).unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Write raw CSV text to a temporary file
pub fn write_temp_csv_text(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("raw.csv");
    std::fs::write(&csv_path, contents).unwrap();
    (temp_dir, csv_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(
        rows, expected_rows,
        "Row count mismatch: expected {}, got {}",
        expected_rows, rows
    );
    assert_eq!(
        cols, expected_cols,
        "Column count mismatch: expected {}, got {}",
        expected_cols, cols
    );
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert two floats agree to within `tol`
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "Expected {} (±{}), got {}",
        expected,
        tol,
        actual
    );
}

/// A rendering request seen by [`RecordingEmitter`]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderRequest {
    Matrix(Vec<String>),
    Pair(String, String),
}

/// Emitter that records requests and hands out fake paths, optionally
/// failing on the nth call (0-based)
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    pub requests: Vec<RenderRequest>,
    pub fail_on: Option<usize>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            requests: Vec::new(),
            fail_on: Some(call),
        }
    }

    fn record(&mut self, request: RenderRequest, file: String) -> Result<ArtifactHandle, ArtifactError> {
        let call = self.requests.len();
        self.requests.push(request);
        if self.fail_on == Some(call) {
            return Err(ArtifactError::Other(format!("render call {} failed", call)));
        }
        Ok(ArtifactHandle::new(PathBuf::from("plots").join(file)))
    }
}

impl ArtifactEmitter for RecordingEmitter {
    fn render_matrix(
        &mut self,
        matrix: &CorrelationMatrix,
    ) -> Result<ArtifactHandle, ArtifactError> {
        self.record(
            RenderRequest::Matrix(matrix.columns().to_vec()),
            "heatmap.png".to_string(),
        )
    }

    fn render_pair(
        &mut self,
        _data: &DataFrame,
        pair: &VariablePair,
    ) -> Result<ArtifactHandle, ArtifactError> {
        self.record(
            RenderRequest::Pair(pair.first.clone(), pair.second.clone()),
            format!("{}_vs_{}.png", pair.first, pair.second),
        )
    }
}
