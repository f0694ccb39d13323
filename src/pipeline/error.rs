//! Error types for the analysis core and the stage orchestrator.

use thiserror::Error;

use super::workspace::Stage;

/// Errors raised by the matrix builder and pair ranker.
///
/// Fewer than two numeric columns and zero-variance columns are *not* errors:
/// the first yields an empty matrix, the second a NaN sentinel cell.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The selection bound must be at least one.
    #[error("top_k must be a positive integer, got {0}")]
    InvalidTopK(usize),

    /// A numeric column still holds nulls; cleaning runs upstream of analysis.
    #[error("numeric column '{column}' contains {count} null value(s); clean the dataset first")]
    NullValues { column: String, count: usize },

    /// A referenced column does not exist in the dataset.
    #[error("column '{0}' not found in dataset")]
    MissingColumn(String),

    /// A hand-built matrix was not square.
    #[error("matrix has {columns} column name(s) but row {row} has {len} value(s)")]
    NotSquare {
        columns: usize,
        row: usize,
        len: usize,
    },

    /// A hand-built matrix disagreed with its mirror cell.
    #[error("matrix is not symmetric at ('{first}', '{second}')")]
    NotSymmetric { first: String, second: String },

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

/// Errors raised by the [`Workspace`](super::Workspace) state machine.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage was invoked before the view it consumes exists.
    #[error("cannot run the {stage} stage before the {requires} stage has completed")]
    OutOfOrder { stage: Stage, requires: Stage },

    /// A stage failed; the pipeline halts here.
    #[error("{stage} stage failed: {source:#}")]
    StageFailed {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// The stage that was being run when the error occurred.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::OutOfOrder { stage, .. } | PipelineError::StageFailed { stage, .. } => {
                *stage
            }
        }
    }
}
