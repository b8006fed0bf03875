//! Criterion normalisation.
//!
//! Min-max normalisation maps each raw criterion onto [0, 1]. By default the
//! bounds are the min and max of the current candidate batch, so adding or
//! removing a site can shift every other site's normalised value. Fixed
//! bounds can be supplied per criterion for comparability across runs.
//! Negative criteria are inverted afterwards so that 1.0 is always best.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{RankerError, Result};
use crate::sites::{norm_column, SiteTable};
use crate::weights::{Direction, WeightSet};

/// Guards the denominator when every site has the same raw value.
pub const NORMALISATION_EPSILON: f64 = 1e-9;

/// Fixed normalisation range for one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

/// `(value - min) / (max - min + ε)`. Every term is halved first so the
/// range of two finite values near `f64::MAX` cannot overflow to infinity.
fn scaled(value: f64, min_val: f64, max_val: f64) -> f64 {
    (value / 2.0 - min_val / 2.0) / (max_val / 2.0 - min_val / 2.0 + NORMALISATION_EPSILON / 2.0)
}

/// Min-max normalisation within a given range [min_val, max_val], clamped to [0, 1].
pub fn minmax_normalise(value: f64, min_val: f64, max_val: f64) -> f64 {
    scaled(value, min_val, max_val).clamp(0.0, 1.0)
}

/// Batch-relative min-max normalisation of a whole column.
/// A constant column maps to all zeros.
pub fn minmax_normalise_column(values: &[f64]) -> Vec<f64> {
    let (min, max) = column_bounds(values);
    values.iter().map(|v| scaled(*v, min, max)).collect()
}

fn column_bounds(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Apply the direction: negative criteria become `1 - norm`.
pub fn apply_direction(normalised: &mut [f64], direction: Direction) {
    if direction == Direction::Negative {
        for v in normalised.iter_mut() {
            *v = 1.0 - *v;
        }
    }
}

/// Writes `<criterion>_norm` for every weighted criterion.
#[derive(Debug, Clone, Default)]
pub struct Normaliser {
    bounds: HashMap<String, Bounds>,
}

impl Normaliser {
    /// Normalise against the current batch only.
    pub fn batch_relative() -> Self {
        Self::default()
    }

    /// Use fixed bounds for the listed criteria; others stay batch-relative.
    pub fn with_bounds(bounds: HashMap<String, Bounds>) -> Self {
        Self { bounds }
    }

    /// Normalise every criterion in `weights`, mutating the table.
    ///
    /// All columns are read and validated before anything is written, so a
    /// failure leaves the table untouched.
    pub fn normalize(&self, table: &mut SiteTable, weights: &WeightSet) -> Result<()> {
        if table.is_empty() {
            warn!("Site table is empty, nothing to normalise");
            return Ok(());
        }

        let mut columns = Vec::with_capacity(weights.len());
        for criterion in weights {
            let raw = table.numeric_column(&criterion.name)?;
            let mut normalised = match self.bounds.get(&criterion.name) {
                Some(b) => {
                    debug!(criterion = %criterion.name, min = b.min, max = b.max, "Fixed-bound normalisation");
                    raw.iter().map(|v| minmax_normalise(*v, b.min, b.max)).collect()
                }
                None => {
                    let (min, max) = column_bounds(&raw);
                    debug!(criterion = %criterion.name, min, max, "Batch-relative normalisation");
                    minmax_normalise_column(&raw)
                }
            };
            apply_direction(&mut normalised, criterion.direction);
            if let Some(i) = normalised.iter().position(|v| !v.is_finite()) {
                return Err(RankerError::NonFiniteNormalized {
                    column: criterion.name.clone(),
                    site: table.sites()[i].id.clone(),
                });
            }
            columns.push((norm_column(&criterion.name), normalised));
        }

        for (name, values) in &columns {
            table.set_column(name, values);
        }
        Ok(())
    }
}

/// Batch-relative normalisation of every weighted criterion.
pub fn normalize(table: &mut SiteTable, weights: &WeightSet) -> Result<()> {
    Normaliser::batch_relative().normalize(table, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::CandidateSite;
    use crate::weights::CriterionWeight;

    fn table(column: &str, values: &[f64]) -> SiteTable {
        SiteTable::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| CandidateSite::new(format!("s{i}")).with_value(column, *v))
                .collect(),
        )
    }

    fn weights(name: &str, direction: Direction) -> WeightSet {
        WeightSet::new(vec![CriterionWeight::new(name, 1.0, direction)]).unwrap()
    }

    fn norms(table: &SiteTable, column: &str) -> Vec<f64> {
        table.numeric_column(&norm_column(column)).unwrap()
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "got {actual:?}, expected {expected:?}");
        }
    }

    #[test]
    fn test_positive_direction() {
        let mut t = table("Slope", &[10.0, 20.0, 30.0]);
        normalize(&mut t, &weights("Slope", Direction::Positive)).unwrap();
        assert_close(&norms(&t, "Slope"), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_negative_direction_inverts() {
        let mut t = table("Slope", &[10.0, 20.0, 30.0]);
        normalize(&mut t, &weights("Slope", Direction::Negative)).unwrap();
        assert_close(&norms(&t, "Slope"), &[1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_constant_column_is_zero() {
        let mut t = table("Slope", &[5.0, 5.0, 5.0]);
        normalize(&mut t, &weights("Slope", Direction::Positive)).unwrap();
        assert_eq!(norms(&t, "Slope"), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_batch_relative_bounds_shift_with_batch() {
        let mut small = table("Slope", &[10.0, 20.0]);
        let mut large = table("Slope", &[10.0, 20.0, 110.0]);
        let w = weights("Slope", Direction::Positive);
        normalize(&mut small, &w).unwrap();
        normalize(&mut large, &w).unwrap();
        // The same raw value 20.0 normalises differently once a new maximum joins the batch.
        assert!((norms(&small, "Slope")[1] - 1.0).abs() < 1e-6);
        assert!((norms(&large, "Slope")[1] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_bounds_are_stable_and_clamped() {
        let bounds = HashMap::from([("Slope".to_string(), Bounds { min: 0.0, max: 100.0 })]);
        let mut t = table("Slope", &[20.0, 150.0, -5.0]);
        Normaliser::with_bounds(bounds).normalize(&mut t, &weights("Slope", Direction::Positive)).unwrap();
        assert_close(&norms(&t, "Slope"), &[0.2, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_column_leaves_table_untouched() {
        let mut t = table("Slope", &[1.0, 2.0]);
        let before = t.clone();
        let w = WeightSet::new(vec![
            CriterionWeight::new("Slope", 0.5, Direction::Positive),
            CriterionWeight::new("Distance_to_Faults", 0.5, Direction::Positive),
        ])
        .unwrap();
        let err = normalize(&mut t, &w).unwrap_err();
        assert!(matches!(err, RankerError::MissingCriterionColumn(ref c) if c == "Distance_to_Faults"));
        assert_eq!(t, before);
    }

    #[test]
    fn test_empty_table_is_noop() {
        let mut t = SiteTable::default();
        normalize(&mut t, &weights("Slope", Direction::Positive)).unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn test_extreme_range_does_not_overflow() {
        let mut t = table("x", &[-1e308, 1e308, 0.0]);
        normalize(&mut t, &weights("x", Direction::Positive)).unwrap();
        assert_close(&norms(&t, "x"), &[0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_non_finite_bounds_fail_the_stage() {
        let bounds = HashMap::from([("x".to_string(), Bounds { min: 0.0, max: f64::NAN })]);
        let mut t = table("x", &[1.0, 2.0]);
        let before = t.clone();
        let err = Normaliser::with_bounds(bounds)
            .normalize(&mut t, &weights("x", Direction::Positive))
            .unwrap_err();
        assert!(matches!(err, RankerError::NonFiniteNormalized { ref column, ref site } if column == "x" && site == "s0"));
        assert_eq!(t, before);
    }

    #[test]
    fn test_minmax_normalise_degenerate_range() {
        assert_eq!(minmax_normalise(5.0, 5.0, 5.0), 0.0);
    }
}
