//! Distance from each site to the nearest feature of a line layer
//! (roads, fault lines).

use shelterscope_common::{FeatureCollection, Geometry, Result};
use shelterscope_ranker::SiteTable;
use tracing::{info, warn};

use super::CriterionSource;

/// Minimum distance in metres from the site centroid to any geometry of `layer`.
pub struct NearestDistance<'a> {
    column: String,
    layer: &'a FeatureCollection,
}

impl<'a> NearestDistance<'a> {
    pub fn new(column: impl Into<String>, layer: &'a FeatureCollection) -> Self {
        Self { column: column.into(), layer }
    }
}

impl CriterionSource for NearestDistance<'_> {
    fn column(&self) -> &str {
        &self.column
    }

    fn enrich(&self, table: &mut SiteTable) -> Result<()> {
        let geometries: Vec<&Geometry> = self.layer.features.iter().filter_map(|f| f.geometry.as_ref()).collect();
        if geometries.is_empty() {
            warn!(column = %self.column, "Layer has no geometries; distances left empty");
        }

        let mut unresolved = 0usize;
        for site in table.sites_mut() {
            let distance = site.centroid().and_then(|c| {
                geometries
                    .iter()
                    .filter_map(|g| g.distance_m(&c))
                    .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |m| m.min(d))))
            });
            match distance {
                Some(d) => site.set_number(&self.column, d),
                None => {
                    unresolved += 1;
                    site.properties.insert(self.column.clone(), serde_json::Value::Null);
                }
            }
        }

        if unresolved > 0 {
            warn!(column = %self.column, sites = unresolved, "Could not compute distance for some sites");
        }
        info!(column = %self.column, features = geometries.len(), "Distance criterion computed");
        Ok(())
    }
}
