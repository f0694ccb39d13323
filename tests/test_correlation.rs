//! Unit tests for correlation matrix construction

use eda_report::pipeline::{
    build_matrix, build_matrix_with, column_values, numeric_columns, AnalysisError,
    CorrelationMatrix, CorrelationMethod,
};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_perfect_linear_relationships_are_exact() {
    let df = create_correlation_test_dataframe();

    let matrix = build_matrix_with(&df, CorrelationMethod::Pairwise).unwrap();

    assert_eq!(matrix.get("a", "b"), Some(1.0), "b = 2a should correlate exactly");
    assert_eq!(matrix.get("a", "c"), Some(-1.0), "c is a reversed");
}

#[test]
fn test_matrix_is_symmetric_with_unit_diagonal() {
    let df = create_correlation_test_dataframe();
    let matrix = build_matrix(&df).unwrap();

    assert_eq!(matrix.columns(), &["a", "b", "c", "d"]);
    for i in 0..matrix.len() {
        assert_eq!(matrix.value(i, i), 1.0, "diagonal at {} should be 1.0", i);
        for j in 0..matrix.len() {
            assert_eq!(
                matrix.value(i, j).to_bits(),
                matrix.value(j, i).to_bits(),
                "cell ({}, {}) should mirror ({}, {})",
                i,
                j,
                j,
                i
            );
        }
    }
}

#[test]
fn test_values_stay_within_bounds() {
    let df = create_large_test_dataframe(200, 12);
    let matrix = build_matrix(&df).unwrap();

    for i in 0..matrix.len() {
        for j in 0..matrix.len() {
            let r = matrix.value(i, j);
            assert!((-1.0..=1.0).contains(&r), "r={} out of bounds", r);
        }
    }
}

#[test]
fn test_constant_column_yields_nan_cells() {
    let df = create_sales_dataframe();
    let matrix = build_matrix(&df).unwrap();

    assert_eq!(matrix.get("price", "qty"), Some(1.0));
    assert!(matrix.get("price", "rating").unwrap().is_nan());
    assert!(matrix.get("rating", "qty").unwrap().is_nan());
    assert!(
        matrix.get("rating", "rating").unwrap().is_nan(),
        "undefined column should have an undefined diagonal"
    );
}

#[test]
fn test_rows_map_nan_to_none() {
    let df = create_sales_dataframe();
    let rows = build_matrix(&df).unwrap().rows();

    assert_eq!(rows[0][0], Some(1.0));
    assert_eq!(rows[0][1], Some(1.0));
    assert_eq!(rows[0][2], None);
    assert_eq!(rows[2][2], None);
}

#[test]
fn test_non_numeric_columns_are_skipped() {
    let df = create_mixed_type_dataframe();

    assert_eq!(numeric_columns(&df), vec!["delivery_time", "distance"]);

    let matrix = build_matrix(&df).unwrap();
    assert_eq!(matrix.columns(), &["delivery_time", "distance"]);
    assert!(matrix.index_of("city").is_none());
    assert!(matrix.index_of("express").is_none(), "booleans are not numeric");
}

#[test]
fn test_fewer_than_two_numeric_columns_is_empty() {
    let single = create_single_numeric_dataframe();
    let matrix = build_matrix(&single).unwrap();
    assert!(matrix.is_empty());
    assert_eq!(matrix.len(), 0);

    let text_only = df! { "name" => ["x", "y"] }.unwrap();
    assert!(build_matrix(&text_only).unwrap().is_empty());

    assert!(build_matrix(&DataFrame::empty()).unwrap().is_empty());
}

#[test]
fn test_zero_rows_is_all_undefined() {
    let df = DataFrame::new(vec![
        Series::new("x".into(), Vec::<f64>::new()).into(),
        Series::new("y".into(), Vec::<f64>::new()).into(),
    ])
    .unwrap();

    let matrix = build_matrix(&df).unwrap();
    assert_eq!(matrix.len(), 2);
    assert!(matrix.get("x", "y").unwrap().is_nan());
    assert!(matrix.get("x", "x").unwrap().is_nan());
}

#[test]
fn test_single_row_is_all_undefined() {
    let df = df! {
        "x" => [1.0f64],
        "y" => [2.0f64],
    }
    .unwrap();

    let matrix = build_matrix(&df).unwrap();
    assert!(matrix.get("x", "y").unwrap().is_nan());
}

#[test]
fn test_null_values_are_rejected() {
    let df = df! {
        "x" => [Some(1.0f64), None, Some(3.0)],
        "y" => [1.0f64, 2.0, 3.0],
    }
    .unwrap();

    let result = build_matrix(&df);
    match result {
        Err(AnalysisError::NullValues { column, count }) => {
            assert_eq!(column, "x");
            assert_eq!(count, 1);
        }
        other => panic!("Expected NullValues error, got {:?}", other),
    }
}

#[test]
fn test_column_values_casts_integers() {
    let df = create_mixed_type_dataframe();
    let values = column_values(&df, "delivery_time").unwrap();
    assert_eq!(values, vec![30.0, 45.0, 25.0, 60.0, 35.0]);

    assert!(matches!(
        column_values(&df, "missing"),
        Err(AnalysisError::MissingColumn(_))
    ));
}

#[test]
fn test_pairwise_and_matrix_methods_agree() {
    let df = create_large_test_dataframe(500, 20);

    let pairwise = build_matrix_with(&df, CorrelationMethod::Pairwise).unwrap();
    let matrix = build_matrix_with(&df, CorrelationMethod::Matrix).unwrap();

    assert_eq!(pairwise.columns(), matrix.columns());
    for i in 0..pairwise.len() {
        for j in 0..pairwise.len() {
            assert_close(matrix.value(i, j), pairwise.value(i, j), 1e-10);
        }
    }
}

#[test]
fn test_matrix_method_marks_undefined_columns() {
    let df = create_sales_dataframe();
    let matrix = build_matrix_with(&df, CorrelationMethod::Matrix).unwrap();

    assert_close(matrix.get("price", "qty").unwrap(), 1.0, 1e-12);
    assert!(matrix.get("rating", "price").unwrap().is_nan());
    assert!(matrix.get("rating", "rating").unwrap().is_nan());
}

#[test]
fn test_from_rows_validates_shape() {
    let names = vec!["a".to_string(), "b".to_string()];

    let ok = CorrelationMatrix::from_rows(names.clone(), &[vec![1.0, 0.3], vec![0.3, 1.0]]);
    assert_eq!(ok.unwrap().get("b", "a"), Some(0.3));

    let ragged = CorrelationMatrix::from_rows(names.clone(), &[vec![1.0, 0.3], vec![0.3]]);
    assert!(matches!(ragged, Err(AnalysisError::NotSquare { .. })));

    let short = CorrelationMatrix::from_rows(names, &[vec![1.0, 0.3]]);
    assert!(matches!(short, Err(AnalysisError::NotSquare { .. })));
}

#[test]
fn test_from_rows_accepts_symmetric_nan() {
    let matrix = CorrelationMatrix::from_rows(
        vec!["a".to_string(), "b".to_string()],
        &[vec![f64::NAN, f64::NAN], vec![f64::NAN, 1.0]],
    )
    .unwrap();
    assert!(matrix.value(0, 1).is_nan());
}

#[test]
fn test_matrix_method_is_exact_for_linear_data() {
    let df = create_tied_sales_dataframe();

    let matrix = build_matrix_with(&df, CorrelationMethod::Matrix).unwrap();

    assert_eq!(matrix.get("price", "qty"), Some(1.0));
    assert_eq!(matrix.get("price", "rating"), Some(-1.0));
    assert_eq!(matrix.get("qty", "rating"), Some(-1.0));
}
