//! Candidate-site enrichment.
//!
//! Turns a raw shelter GeoJSON into a `SiteTable` carrying every criterion
//! the ranker expects:
//!   1. Distance to the nearest road (metres)
//!   2. Distance to the nearest fault line (metres)
//!   3. Land-use score of the containing polygon
//!   4. Population density of the nearest population point
//!
//! Existing properties on the shelters are kept; derived columns overwrite
//! properties of the same name.

use shelterscope_common::{FeatureCollection, Result, ShelterError};
use shelterscope_ranker::SiteTable;
use tracing::{info, instrument, warn};

use crate::layers::Layers;
use crate::sources::{CriterionSource, LandUseScore, MissingValuePolicy, NearestDistance, PopulationDensity};

pub const DISTANCE_TO_ROADS: &str = "Distance_to_Roads";
pub const DISTANCE_TO_FAULTS: &str = "Distance_to_Faults";
pub const LANDUSE_SCORE: &str = "LandUse_Score";
pub const POPULATION_DENSITY: &str = "Population_Density";

/// Build the enriched site table from raw shelters and loaded layers.
#[instrument(skip_all, fields(sites = shelters.features.len()))]
pub fn enrich_sites(shelters: FeatureCollection, layers: &Layers, policy: MissingValuePolicy) -> Result<SiteTable> {
    let mut table = SiteTable::from_feature_collection(shelters).map_err(|e| ShelterError::InvalidGeoJson {
        source_name: "shelters".into(),
        reason: e.to_string(),
    })?;
    if table.is_empty() {
        warn!("No candidate shelters to enrich");
        return Ok(table);
    }

    let sources: Vec<Box<dyn CriterionSource + '_>> = vec![
        Box::new(NearestDistance::new(DISTANCE_TO_ROADS, &layers.roads)),
        Box::new(NearestDistance::new(DISTANCE_TO_FAULTS, &layers.faults)),
        Box::new(LandUseScore::new(LANDUSE_SCORE, &layers.landuse)),
        Box::new(PopulationDensity::new(POPULATION_DENSITY, &layers.population, policy)),
    ];

    // Sources write straight into the table, so work on a copy and only
    // commit once every source has succeeded.
    let mut staged = table.clone();
    for source in &sources {
        source.enrich(&mut staged)?;
    }
    table = staged;

    info!(sites = table.len(), criteria = sources.len(), "Site enrichment complete");
    Ok(table)
}
