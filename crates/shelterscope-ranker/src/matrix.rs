//! Pairwise comparison matrix and its structural validation.

use serde::{Deserialize, Serialize};

use crate::error::{RankerError, Result};

/// Allowed deviation of a diagonal entry from 1.0.
pub const DIAGONAL_TOLERANCE: f64 = 1e-6;
/// Allowed relative deviation of `a[i][j] * a[j][i]` from 1.0.
pub const RECIPROCAL_TOLERANCE: f64 = 1e-3;

/// n×n matrix of judgments: entry (i, j) is the importance of criterion i over j.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairwiseMatrix {
    rows: Vec<Vec<f64>>,
}

impl PairwiseMatrix {
    /// Wrap hand-authored rows. Call [`validate`](Self::validate) before use;
    /// the AHP engine does so itself.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Build the perfectly consistent matrix `a[i][j] = w[i] / w[j]`.
    pub fn from_ratios(weights: &[f64]) -> Self {
        let rows = weights
            .iter()
            .map(|wi| weights.iter().map(|wj| wi / wj).collect())
            .collect();
        Self { rows }
    }

    pub fn dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    /// Check shape, unit diagonal and reciprocity, returning the first violation.
    pub fn validate(&self) -> Result<()> {
        validate(&self.rows)
    }
}

/// Validate raw matrix rows.
pub fn validate(rows: &[Vec<f64>]) -> Result<()> {
    let n = rows.len();
    if n == 0 {
        return Err(RankerError::InvalidMatrixShape { rows: 0, row: 0, cols: 0 });
    }
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != n) {
        return Err(RankerError::InvalidMatrixShape { rows: n, row, cols: r.len() });
    }

    for (index, row) in rows.iter().enumerate() {
        let value = row[index];
        if !value.is_finite() || (value - 1.0).abs() > DIAGONAL_TOLERANCE {
            return Err(RankerError::InvalidMatrixDiagonal { index, value });
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let (a_ij, a_ji) = (rows[i][j], rows[j][i]);
            let positive = a_ij.is_finite() && a_ji.is_finite() && a_ij > 0.0 && a_ji > 0.0;
            if !positive || (a_ij * a_ji - 1.0).abs() > RECIPROCAL_TOLERANCE {
                return Err(RankerError::NonReciprocalMatrix { i, j, a_ij, a_ji });
            }
        }
    }

    Ok(())
}
