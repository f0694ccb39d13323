//! Duplicate/null removal and column-name normalisation

use std::collections::HashMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

/// What the cleaning stage removed or renamed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleaningStats {
    pub rows_before: usize,
    pub duplicates_removed: usize,
    /// Rows dropped for holding a null or a float NaN
    pub null_rows_removed: usize,
    pub rows_after: usize,
    /// (original, normalised) for every header that changed
    pub renamed_columns: Vec<(String, String)>,
}

/// Trim, lowercase and replace spaces with underscores
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Remove exact duplicate rows (first occurrence kept, order preserved), then
/// rows containing any null or float NaN, then normalise headers.
///
/// Returns a new frame; the input is left untouched. Two headers that
/// normalise to the same name are an error.
pub fn clean_dataset(df: &DataFrame) -> Result<(DataFrame, CleaningStats)> {
    let rows_before = df.height();

    let deduped = df
        .unique_stable(None, UniqueKeepStrategy::First, None)
        .context("Failed to remove duplicate rows")?;
    let rows_deduped = deduped.height();

    let without_nulls = deduped
        .drop_nulls::<String>(None)
        .context("Failed to remove rows with null values")?;
    let mut cleaned =
        drop_nan_rows(&without_nulls).context("Failed to remove rows with NaN values")?;
    let rows_after = cleaned.height();

    let original: Vec<String> = cleaned
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let normalised: Vec<String> = original.iter().map(|s| normalize_column_name(s)).collect();

    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (orig, norm) in original.iter().zip(normalised.iter()) {
        if let Some(previous) = seen.insert(norm.as_str(), orig.as_str()) {
            anyhow::bail!(
                "Columns '{}' and '{}' both normalise to '{}'",
                previous,
                orig,
                norm
            );
        }
    }

    cleaned
        .set_column_names(normalised.iter().map(|s| s.as_str()))
        .context("Failed to rename columns")?;

    let renamed_columns: Vec<(String, String)> = original
        .into_iter()
        .zip(normalised)
        .filter(|(orig, norm)| orig != norm)
        .collect();

    let stats = CleaningStats {
        rows_before,
        duplicates_removed: rows_before - rows_deduped,
        null_rows_removed: rows_deduped - rows_after,
        rows_after,
        renamed_columns,
    };

    log::info!(
        "Cleaning removed {} duplicate and {} null row(s); {} rows remain",
        stats.duplicates_removed,
        stats.null_rows_removed,
        stats.rows_after
    );

    Ok((cleaned, stats))
}

/// Keep only rows where every float column is a number. NaN counts as missing.
fn drop_nan_rows(df: &DataFrame) -> PolarsResult<DataFrame> {
    let mut keep: Option<BooleanChunked> = None;
    for column in df.get_columns().iter().filter(|c| c.dtype().is_float()) {
        let values = column.cast(&DataType::Float64)?;
        let not_nan = values.f64()?.is_not_nan();
        keep = Some(match keep {
            Some(mask) => &mask & &not_nan,
            None => not_nan,
        });
    }

    match keep {
        Some(mask) => df.filter(&mask),
        None => Ok(df.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("  Delivery Time "), "delivery_time");
        assert_eq!(normalize_column_name("Agent Rating"), "agent_rating");
        assert_eq!(normalize_column_name("already_clean"), "already_clean");
    }

    #[test]
    fn test_drop_nan_rows_checks_every_float_column() {
        let df = df! {
            "x" => [1.0f64, f64::NAN, 3.0, 4.0],
            "y" => [1.0f32, 2.0, f32::NAN, 4.0],
            "id" => [1i64, 2, 3, 4],
        }
        .unwrap();

        let kept = drop_nan_rows(&df).unwrap();

        let ids: Vec<i64> = kept.column("id").unwrap().i64().unwrap().into_no_null_iter().collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_normalize_keeps_inner_runs_of_spaces() {
        assert_eq!(normalize_column_name("Order  ID"), "order__id");
    }
}
