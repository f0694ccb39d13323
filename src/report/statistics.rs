//! Per-column summary statistics for the report

use polars::prelude::DataFrame;
use serde::Serialize;

use crate::pipeline::{column_values, numeric_columns, AnalysisError};

/// Count, moments and quartiles of one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); NaN below two values
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarise every numeric column, in dataset order
pub fn describe(df: &DataFrame) -> Result<Vec<ColumnSummary>, AnalysisError> {
    numeric_columns(df)
        .into_iter()
        .map(|name| {
            let values = column_values(df, &name)?;
            Ok(summarize(name, values))
        })
        .collect()
}

fn summarize(name: String, mut values: Vec<f64>) -> ColumnSummary {
    let count = values.len();
    if count == 0 {
        return ColumnSummary {
            name,
            count,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        };
    }

    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count < 2 {
        f64::NAN
    } else {
        let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (count - 1) as f64).sqrt()
    };

    values.sort_by(|a, b| a.total_cmp(b));

    ColumnSummary {
        name,
        count,
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[count - 1],
    }
}

/// Linear-interpolated quantile of sorted, non-empty data
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&data, 0.0), 1.0);
        assert_eq!(quantile(&data, 0.25), 1.75);
        assert_eq!(quantile(&data, 0.5), 2.5);
        assert_eq!(quantile(&data, 1.0), 4.0);
    }

    #[test]
    fn test_summarize_single_value() {
        let summary = summarize("x".to_string(), vec![7.0]);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.mean, 7.0);
        assert!(summary.std.is_nan());
        assert_eq!(summary.median, 7.0);
    }
}
