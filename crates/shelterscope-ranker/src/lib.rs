//! shelterscope-ranker — Shelter site suitability scoring engine.
//!
//! Pairwise judgments go through the AHP engine to produce criteria weights,
//! which are persisted by the weight store and then applied to min-max
//! normalised site criteria by the MCDA scorer.

pub mod ahp;
pub mod error;
pub mod export;
pub mod matrix;
pub mod normalise;
pub mod scorer;
pub mod sites;
pub mod weights;

pub use ahp::{compute_weights, AhpEngine, AhpResult};
pub use error::{RankerError, Result};
pub use matrix::PairwiseMatrix;
pub use normalise::{normalize, Bounds, Normaliser};
pub use scorer::score;
pub use sites::{CandidateSite, SiteTable};
pub use weights::{load_weights, CriterionWeight, Direction, WeightSet, WeightStore};
