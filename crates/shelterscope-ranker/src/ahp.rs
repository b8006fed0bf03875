//! Analytic Hierarchy Process: criteria weights from pairwise judgments.
//!
//! Weights are the row averages of the column-normalised matrix. Consistency
//! is judged with Saaty's consistency ratio CR = CI / RI, where
//! CI = (λmax − n) / (n − 1) and RI is the random index for a matrix of size n.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RankerError, Result};
use crate::matrix::PairwiseMatrix;

/// Judgments with a consistency ratio above this are too inconsistent to trust.
pub const DEFAULT_CONSISTENCY_THRESHOLD: f64 = 0.1;

/// Saaty random index for n = 1..=10; larger matrices use the last value.
const RANDOM_INDEX: [f64; 10] = [0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49];

pub fn random_index(n: usize) -> f64 {
    match n {
        0 => 0.0,
        n if n <= RANDOM_INDEX.len() => RANDOM_INDEX[n - 1],
        _ => RANDOM_INDEX[RANDOM_INDEX.len() - 1],
    }
}

/// Output of one AHP run. Weights are kept at full precision and aligned by
/// index with `criteria`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AhpResult {
    pub criteria: Vec<String>,
    pub weights: Vec<f64>,
    pub lambda_max: f64,
    pub ci: f64,
    pub cr: f64,
}

impl AhpResult {
    pub fn is_consistent(&self) -> bool {
        self.is_consistent_at(DEFAULT_CONSISTENCY_THRESHOLD)
    }

    pub fn is_consistent_at(&self, threshold: f64) -> bool {
        self.cr <= threshold
    }

    /// (criterion, weight) pairs rounded for presentation.
    pub fn rounded_weights(&self, decimals: u32) -> Vec<(String, f64)> {
        self.criteria
            .iter()
            .cloned()
            .zip(self.weights.iter().map(|w| round_to(*w, decimals)))
            .collect()
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// AHP engine with a configurable consistency threshold for the warning.
#[derive(Debug, Clone)]
pub struct AhpEngine {
    pub consistency_threshold: f64,
}

impl Default for AhpEngine {
    fn default() -> Self {
        Self { consistency_threshold: DEFAULT_CONSISTENCY_THRESHOLD }
    }
}

impl AhpEngine {
    pub fn new(consistency_threshold: f64) -> Self {
        Self { consistency_threshold }
    }

    /// Derive weights and consistency metrics from a pairwise matrix.
    ///
    /// An inconsistent matrix is not an error: the result is returned and a
    /// warning logged, leaving the decision to the caller.
    pub fn compute_weights(&self, matrix: &PairwiseMatrix, criteria_names: &[String]) -> Result<AhpResult> {
        matrix.validate()?;
        let n = matrix.dimension();
        if criteria_names.len() != n {
            return Err(RankerError::CriteriaCountMismatch { expected: n, actual: criteria_names.len() });
        }
        let mut seen = HashSet::with_capacity(n);
        if let Some(dup) = criteria_names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(RankerError::DuplicateCriterion(dup.clone()));
        }

        info!(criteria = n, "Starting AHP calculation");

        let normalised = normalise_columns(matrix);
        let weights = row_means(&normalised);
        let (lambda_max, ci, cr) = consistency(matrix, &weights);

        debug!(lambda_max, ci, cr, "AHP consistency metrics");
        if cr > self.consistency_threshold {
            warn!(
                "High consistency ratio detected: CR = {:.3} (> {}); revisit the pairwise judgments",
                cr, self.consistency_threshold
            );
        } else {
            info!("Consistency ratio is acceptable: CR = {:.3}", cr);
        }

        Ok(AhpResult {
            criteria: criteria_names.to_vec(),
            weights,
            lambda_max,
            ci,
            cr,
        })
    }
}

/// Convenience wrapper using the default 0.1 threshold.
pub fn compute_weights(matrix: &PairwiseMatrix, criteria_names: &[String]) -> Result<AhpResult> {
    AhpEngine::default().compute_weights(matrix, criteria_names)
}

/// Divide every entry by its column sum.
fn normalise_columns(matrix: &PairwiseMatrix) -> Vec<Vec<f64>> {
    let n = matrix.dimension();
    let col_sums: Vec<f64> = (0..n)
        .map(|j| (0..n).map(|i| matrix.get(i, j)).sum())
        .collect();
    matrix
        .rows()
        .iter()
        .map(|row| row.iter().zip(&col_sums).map(|(v, s)| v / s).collect())
        .collect()
}

fn row_means(rows: &[Vec<f64>]) -> Vec<f64> {
    rows.iter()
        .map(|row| row.iter().sum::<f64>() / row.len() as f64)
        .collect()
}

/// Returns (λmax, CI, CR).
fn consistency(matrix: &PairwiseMatrix, weights: &[f64]) -> (f64, f64, f64) {
    let n = matrix.dimension();
    let weighted_sum: Vec<f64> = matrix
        .rows()
        .iter()
        .map(|row| row.iter().zip(weights).map(|(a, w)| a * w).sum())
        .collect();
    let lambda_max = weighted_sum
        .iter()
        .zip(weights)
        .map(|(ws, w)| ws / w)
        .sum::<f64>()
        / n as f64;

    let ci = if n > 1 { (lambda_max - n as f64) / (n as f64 - 1.0) } else { 0.0 };
    let ri = random_index(n);
    let cr = if ri == 0.0 { 0.0 } else { ci / ri };
    (lambda_max, ci, cr)
}
