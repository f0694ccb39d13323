//! Ordering the cleaned dataset

use anyhow::{Context, Result};
use polars::prelude::*;

use super::correlation::numeric_columns;

/// Stable ascending sort by the first numeric column.
///
/// Returns the sorted frame and the column used. With no numeric column the
/// frame is returned unchanged alongside `None`.
pub fn sort_dataset(df: &DataFrame) -> Result<(DataFrame, Option<String>)> {
    let Some(column) = numeric_columns(df).into_iter().next() else {
        log::info!("No numeric columns found to sort");
        return Ok((df.clone(), None));
    };

    let sorted = df
        .sort(
            [column.as_str()],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .with_context(|| format!("Failed to sort by column '{}'", column))?;

    log::info!("Sorted {} rows by '{}'", sorted.height(), column);

    Ok((sorted, Some(column)))
}
