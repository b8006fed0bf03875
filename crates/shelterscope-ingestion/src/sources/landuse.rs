//! Land-use suitability score from the polygon containing each site.
//!
//! | landuse class        | score |
//! |----------------------|-------|
//! | park                 | 0.9   |
//! | residential          | 0.5   |
//! | industrial           | 0.3   |
//! | any other            | 0.2   |
//! | outside every polygon| 0.1   |

use serde_json::Value;
use shelterscope_common::{FeatureCollection, Result};
use shelterscope_ranker::SiteTable;
use tracing::info;

use super::CriterionSource;

pub const LANDUSE_PROPERTY: &str = "landuse";
pub const OUTSIDE_SCORE: f64 = 0.1;

/// Score for a `landuse` tag. Matching is case-insensitive and by substring,
/// so `"Public Park"` counts as a park.
pub fn categorize_landuse(tag: Option<&str>) -> f64 {
    let tag = tag.unwrap_or_default().to_lowercase();
    if tag.contains("park") {
        0.9
    } else if tag.contains("residential") {
        0.5
    } else if tag.contains("industrial") {
        0.3
    } else {
        0.2
    }
}

pub struct LandUseScore<'a> {
    column: String,
    layer: &'a FeatureCollection,
}

impl<'a> LandUseScore<'a> {
    pub fn new(column: impl Into<String>, layer: &'a FeatureCollection) -> Self {
        Self { column: column.into(), layer }
    }
}

impl CriterionSource for LandUseScore<'_> {
    fn column(&self) -> &str {
        &self.column
    }

    fn enrich(&self, table: &mut SiteTable) -> Result<()> {
        let mut outside = 0usize;
        for site in table.sites_mut() {
            // First containing polygon wins.
            let polygon = site.centroid().and_then(|c| {
                self.layer
                    .features
                    .iter()
                    .find(|f| f.geometry.as_ref().is_some_and(|g| g.contains(&c)))
            });
            let value = match polygon {
                Some(f) => categorize_landuse(f.properties.get(LANDUSE_PROPERTY).and_then(Value::as_str)),
                None => {
                    outside += 1;
                    OUTSIDE_SCORE
                }
            };
            site.set_number(&self.column, value);
        }
        info!(column = %self.column, outside, "Land-use criterion computed");
        Ok(())
    }
}
