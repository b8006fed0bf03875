//! Criterion sources: each one derives a single raw criterion column for
//! every candidate site from an auxiliary layer.

pub mod distance;
pub mod landuse;
pub mod population;

use shelterscope_common::Result;
use shelterscope_ranker::SiteTable;

pub use distance::NearestDistance;
pub use landuse::LandUseScore;
pub use population::{MissingValuePolicy, PopulationDensity};

/// Common interface for all criterion sources.
pub trait CriterionSource {
    /// Name of the property this source writes.
    fn column(&self) -> &str;

    /// Add the column to every site in the table.
    fn enrich(&self, table: &mut SiteTable) -> Result<()>;
}
