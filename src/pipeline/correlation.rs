//! Numeric correlation matrix construction

use std::fmt;
use std::str::FromStr;

use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::error::AnalysisError;

/// Threshold for auto-selecting matrix vs pairwise correlation computation.
/// Matrix multiplication is more efficient when there are many columns.
const MATRIX_METHOD_COLUMN_THRESHOLD: usize = 15;

/// Perfectly linear columns land within rounding noise of ±1; such values snap to ±1
/// so they tie exactly under ranking.
const UNIT_SNAP_TOLERANCE: f64 = 1e-12;

/// Strategy used to fill the correlation matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    /// Matrix method at 15+ numeric columns, pairwise otherwise
    #[default]
    Auto,
    /// One centred dot product per unordered pair, in parallel
    Pairwise,
    /// R = Zᵀ Z over the standardised data matrix
    Matrix,
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CorrelationMethod::Auto => "auto",
            CorrelationMethod::Pairwise => "pairwise",
            CorrelationMethod::Matrix => "matrix",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CorrelationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(CorrelationMethod::Auto),
            "pairwise" => Ok(CorrelationMethod::Pairwise),
            "matrix" => Ok(CorrelationMethod::Matrix),
            other => Err(format!(
                "Unknown correlation method '{}'. Options: auto, pairwise, matrix",
                other
            )),
        }
    }
}

/// Square, symmetric Pearson correlation matrix keyed by column name.
///
/// Undefined cells (a zero-variance column, or fewer than two rows) hold NaN.
/// A matrix with fewer than two columns is "empty": no analysis is possible.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    values: Mat<f64>,
}

impl CorrelationMatrix {
    /// The "no analysis possible" matrix
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            values: Mat::zeros(0, 0),
        }
    }

    /// Build a matrix from explicit rows, rejecting non-square or asymmetric input.
    pub fn from_rows(columns: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, AnalysisError> {
        let n = columns.len();
        if rows.len() != n {
            return Err(AnalysisError::NotSquare {
                columns: n,
                row: rows.len(),
                len: 0,
            });
        }
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n {
                return Err(AnalysisError::NotSquare {
                    columns: n,
                    row,
                    len: values.len(),
                });
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (rows[i][j], rows[j][i]);
                let same = a == b || (a.is_nan() && b.is_nan());
                if !same {
                    return Err(AnalysisError::NotSymmetric {
                        first: columns[i].clone(),
                        second: columns[j].clone(),
                    });
                }
            }
        }

        let values = Mat::from_fn(n, n, |i, j| rows[i][j]);
        Ok(Self { columns, values })
    }

    /// True when fewer than two columns are present
    pub fn is_empty(&self) -> bool {
        self.columns.len() < 2
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Cell value by index; NaN marks an undefined correlation
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell value by column names
    pub fn get(&self, first: &str, second: &str) -> Option<f64> {
        let i = self.index_of(first)?;
        let j = self.index_of(second)?;
        Some(self.value(i, j))
    }

    /// Nested rows with sentinel cells mapped to `None`, for serialization
    pub fn rows(&self) -> Vec<Vec<Option<f64>>> {
        (0..self.len())
            .map(|i| {
                (0..self.len())
                    .map(|j| {
                        let v = self.value(i, j);
                        if v.is_nan() {
                            None
                        } else {
                            Some(v)
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Names of the numeric-typed columns, in dataset order
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| col.dtype().is_primitive_numeric())
        .map(|col| col.name().to_string())
        .collect()
}

/// Extract a numeric column as `f64` values. Nulls are rejected rather than imputed.
pub fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, AnalysisError> {
    let column = df
        .column(name)
        .map_err(|_| AnalysisError::MissingColumn(name.to_string()))?;

    let nulls = column.null_count();
    if nulls > 0 {
        return Err(AnalysisError::NullValues {
            column: name.to_string(),
            count: nulls,
        });
    }

    let float_col = column.cast(&DataType::Float64)?;
    let ca = float_col.f64()?;
    Ok(ca.iter().flatten().collect())
}

/// Build the correlation matrix for every numeric column, auto-selecting the method
pub fn build_matrix(df: &DataFrame) -> Result<CorrelationMatrix, AnalysisError> {
    build_matrix_with(df, CorrelationMethod::Auto)
}

/// Build the correlation matrix using an explicit computation strategy.
///
/// Non-numeric columns are skipped silently. With fewer than two numeric
/// columns the result is [`CorrelationMatrix::empty`]. Every unordered pair is
/// computed once and written to both cells.
pub fn build_matrix_with(
    df: &DataFrame,
    method: CorrelationMethod,
) -> Result<CorrelationMatrix, AnalysisError> {
    let columns = numeric_columns(df);
    if columns.len() < 2 {
        log::debug!(
            "{} numeric column(s) found; correlation matrix is empty",
            columns.len()
        );
        return Ok(CorrelationMatrix::empty());
    }

    let centred: Vec<CentredColumn> = columns
        .iter()
        .map(|name| column_values(df, name).map(|v| CentredColumn::new(&v)))
        .collect::<Result<_, _>>()?;

    let method = match method {
        CorrelationMethod::Auto if columns.len() >= MATRIX_METHOD_COLUMN_THRESHOLD => {
            CorrelationMethod::Matrix
        }
        CorrelationMethod::Auto => CorrelationMethod::Pairwise,
        explicit => explicit,
    };
    log::debug!(
        "Computing {}x{} correlation matrix ({} method)",
        columns.len(),
        columns.len(),
        method
    );

    let values = match method {
        CorrelationMethod::Matrix => standardized_matrix(&centred, df.height()),
        _ => pairwise_matrix(&centred),
    };

    Ok(CorrelationMatrix { columns, values })
}

/// Column values shifted to zero mean, with the sum of squared deviations
struct CentredColumn {
    deviations: Vec<f64>,
    sum_sq: f64,
    defined: bool,
}

impl CentredColumn {
    fn new(values: &[f64]) -> Self {
        let n = values.len();
        let constant = n < 2 || values.iter().all(|v| *v == values[0]);
        let mean = if n == 0 {
            0.0
        } else {
            values.iter().sum::<f64>() / n as f64
        };

        let deviations: Vec<f64> = values.iter().map(|x| x - mean).collect();
        let sum_sq: f64 = deviations.iter().map(|d| d * d).sum();

        // NaN input leaves sum_sq NaN, which also fails this check
        let defined = !constant && sum_sq > 0.0 && sum_sq.is_finite();

        Self {
            deviations,
            sum_sq,
            defined,
        }
    }

    fn diagonal(&self) -> f64 {
        if self.defined {
            1.0
        } else {
            f64::NAN
        }
    }
}

/// Two-pass Pearson correlation on pre-centred columns
fn pearson(x: &CentredColumn, y: &CentredColumn) -> f64 {
    if !x.defined || !y.defined {
        return f64::NAN;
    }

    let cov: f64 = x
        .deviations
        .iter()
        .zip(y.deviations.iter())
        .map(|(dx, dy)| dx * dy)
        .sum();

    bound_correlation(cov / (x.sum_sq * y.sum_sq).sqrt())
}

/// Clamp to [-1, 1] and snap near-unit values to exactly ±1. NaN passes through.
fn bound_correlation(r: f64) -> f64 {
    let r = r.clamp(-1.0, 1.0);
    if 1.0 - r.abs() <= UNIT_SNAP_TOLERANCE {
        r.signum()
    } else {
        r
    }
}

/// Fill the matrix one unordered pair at a time, in parallel via Rayon
fn pairwise_matrix(columns: &[CentredColumn]) -> Mat<f64> {
    let n = columns.len();

    // Upper triangle, row-major
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    // Indexed collect keeps results aligned with `pairs` regardless of scheduling
    let correlations: Vec<f64> = pairs
        .par_iter()
        .map(|&(i, j)| pearson(&columns[i], &columns[j]))
        .collect();

    let mut matrix = Mat::<f64>::zeros(n, n);
    for (i, col) in columns.iter().enumerate() {
        matrix[(i, i)] = col.diagonal();
    }
    for (&(i, j), &r) in pairs.iter().zip(correlations.iter()) {
        matrix[(i, j)] = r;
        matrix[(j, i)] = r;
    }

    matrix
}

/// Compute correlation matrix using matrix operations (much faster for many columns).
///
/// Algorithm:
/// 1. Standardize each defined column to unit norm: z = (x - mean) / ||x - mean||
/// 2. Compute Gram matrix: R = Z^T * Z
/// 3. Scatter R back into the full matrix, NaN for undefined columns
fn standardized_matrix(columns: &[CentredColumn], n_rows: usize) -> Mat<f64> {
    let n = columns.len();

    let valid: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, col)| col.defined)
        .map(|(i, _)| i)
        .collect();

    let mut z = Mat::<f64>::zeros(n_rows, valid.len());
    for (k, &idx) in valid.iter().enumerate() {
        let col = &columns[idx];
        let norm = col.sum_sq.sqrt();
        for (row, d) in col.deviations.iter().enumerate() {
            z[(row, k)] = d / norm;
        }
    }

    let gram = z.transpose() * &z;

    let mut matrix = Mat::from_fn(n, n, |_, _| f64::NAN);
    for (a, &i) in valid.iter().enumerate() {
        matrix[(i, i)] = 1.0;
        for (b, &j) in valid.iter().enumerate().skip(a + 1) {
            let r = bound_correlation(gram[(a, b)]);
            matrix[(i, j)] = r;
            matrix[(j, i)] = r;
        }
    }

    matrix
}
