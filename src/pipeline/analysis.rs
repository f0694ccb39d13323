//! Analysis stage: matrix, ranking and artifact requests

use anyhow::{Context, Result};
use polars::prelude::*;

use super::correlation::{build_matrix_with, numeric_columns, CorrelationMatrix, CorrelationMethod};
use super::ranking::{rank_pairs, RankedPairs};
use crate::report::{emit_artifacts, AnalysisArtifacts, ArtifactEmitter};

/// Result of the analysis stage
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// At least two numeric columns were correlated
    Correlated {
        matrix: CorrelationMatrix,
        ranked: RankedPairs,
        artifacts: AnalysisArtifacts,
    },
    /// Fewer than two numeric columns; nothing was rendered
    InsufficientData { numeric_columns: Vec<String> },
}

impl AnalysisOutcome {
    pub fn is_correlated(&self) -> bool {
        matches!(self, AnalysisOutcome::Correlated { .. })
    }

    pub fn ranked(&self) -> Option<&RankedPairs> {
        match self {
            AnalysisOutcome::Correlated { ranked, .. } => Some(ranked),
            AnalysisOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn matrix(&self) -> Option<&CorrelationMatrix> {
        match self {
            AnalysisOutcome::Correlated { matrix, .. } => Some(matrix),
            AnalysisOutcome::InsufficientData { .. } => None,
        }
    }

    pub fn artifacts(&self) -> Option<&AnalysisArtifacts> {
        match self {
            AnalysisOutcome::Correlated { artifacts, .. } => Some(artifacts),
            AnalysisOutcome::InsufficientData { .. } => None,
        }
    }
}

/// Build the matrix, rank its pairs and request one heatmap plus one scatter per pair.
///
/// An empty matrix short-circuits to [`AnalysisOutcome::InsufficientData`]
/// without calling the emitter. A rendering failure is returned as an error.
pub fn analyze_dataset(
    df: &DataFrame,
    top_k: usize,
    method: CorrelationMethod,
    emitter: &mut dyn ArtifactEmitter,
) -> Result<AnalysisOutcome> {
    let matrix = build_matrix_with(df, method).context("Failed to build correlation matrix")?;

    if matrix.is_empty() {
        let numeric = numeric_columns(df);
        log::warn!(
            "Only {} numeric column(s); skipping correlation analysis",
            numeric.len()
        );
        return Ok(AnalysisOutcome::InsufficientData {
            numeric_columns: numeric,
        });
    }

    let ranked = rank_pairs(&matrix, top_k).context("Failed to rank correlated pairs")?;
    let artifacts =
        emit_artifacts(emitter, df, &matrix, &ranked).context("Failed to render plots")?;

    Ok(AnalysisOutcome::Correlated {
        matrix,
        ranked,
        artifacts,
    })
}
