//! Ranking of unordered variable pairs by correlation strength

use std::collections::BTreeMap;

use serde::Serialize;

use super::correlation::CorrelationMatrix;
use super::error::AnalysisError;

/// Default number of pairs selected for scatter plots
pub const DEFAULT_TOP_K: usize = 3;

/// An unordered pair of distinct columns with their correlation.
///
/// Names are stored in canonical (lexicographic) order, so `first <= second`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariablePair {
    pub first: String,
    pub second: String,
    pub correlation: f64,
}

impl VariablePair {
    /// Create a pair, sorting the two names into canonical order
    pub fn new(a: &str, b: &str, correlation: f64) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first: first.to_string(),
            second: second.to_string(),
            correlation,
        }
    }

    /// Ranking key: absolute correlation
    pub fn strength(&self) -> f64 {
        self.correlation.abs()
    }

    pub fn canonical_key(&self) -> (&str, &str) {
        (self.first.as_str(), self.second.as_str())
    }

    /// `first_second`, used for artifact names and display
    pub fn label(&self) -> String {
        format!("{}_{}", self.first, self.second)
    }
}

/// Pairs sorted by descending strength, truncated to `top_k`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedPairs {
    pub pairs: Vec<VariablePair>,
    /// Distinct, defined pairs available before truncation
    pub qualifying: usize,
    pub top_k: usize,
}

impl RankedPairs {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariablePair> {
        self.pairs.iter()
    }
}

/// Rank the matrix's unordered pairs by |r| and keep the top `k`.
///
/// Cells are visited row-major. Diagonal and NaN cells are skipped, and
/// mirrored cells fold onto one key derived by sorting the two names, so the
/// result never depends on column order. Ties on |r| are broken by ascending
/// canonical key. An empty matrix ranks to an empty list.
pub fn rank_pairs(matrix: &CorrelationMatrix, k: usize) -> Result<RankedPairs, AnalysisError> {
    if k == 0 {
        return Err(AnalysisError::InvalidTopK(k));
    }

    let columns = matrix.columns();
    let mut unique: BTreeMap<(String, String), VariablePair> = BTreeMap::new();

    for i in 0..matrix.len() {
        for j in 0..matrix.len() {
            if i == j {
                continue;
            }
            let r = matrix.value(i, j);
            if r.is_nan() {
                continue;
            }

            let pair = VariablePair::new(&columns[i], &columns[j], r);
            unique
                .entry((pair.first.clone(), pair.second.clone()))
                .or_insert(pair);
        }
    }

    let mut pairs: Vec<VariablePair> = unique.into_values().collect();
    pairs.sort_by(|a, b| {
        b.strength()
            .total_cmp(&a.strength())
            .then_with(|| a.canonical_key().cmp(&b.canonical_key()))
    });

    let qualifying = pairs.len();
    pairs.truncate(k);

    log::debug!(
        "Ranked {} qualifying pair(s), keeping {}",
        qualifying,
        pairs.len()
    );

    Ok(RankedPairs {
        pairs,
        qualifying,
        top_k: k,
    })
}
