//! Population density from the nearest population point.
//!
//! The value is read from `population_density`, falling back to
//! `population_estimate`. Sites whose nearest point carries neither are
//! handled according to [`MissingValuePolicy`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelterscope_common::{FeatureCollection, Geometry, Position, Result, ShelterError};
use shelterscope_common::geo::haversine_m;
use shelterscope_ranker::SiteTable;
use tracing::{info, warn};

use super::CriterionSource;

pub const DENSITY_FIELDS: [&str; 2] = ["population_density", "population_estimate"];

/// What to do when the nearest population point has no usable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// Substitute the mean of the values that were found.
    #[default]
    Mean,
    /// Abort with `MissingPopulationValue`.
    Fail,
}

pub struct PopulationDensity<'a> {
    column: String,
    layer: &'a FeatureCollection,
    policy: MissingValuePolicy,
}

impl<'a> PopulationDensity<'a> {
    pub fn new(column: impl Into<String>, layer: &'a FeatureCollection, policy: MissingValuePolicy) -> Self {
        Self { column: column.into(), layer, policy }
    }

    /// Population points with their density value, if any.
    fn points(&self) -> Result<Vec<(Position, Option<f64>)>> {
        self.layer
            .features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| match &f.geometry {
                None => None,
                Some(Geometry::Point(p)) => {
                    let value = DENSITY_FIELDS.iter().find_map(|k| f.properties.get(*k).and_then(Value::as_f64));
                    Some(Ok((*p, value)))
                }
                Some(_) => Some(Err(ShelterError::InvalidGeoJson {
                    source_name: "population".to_string(),
                    reason: format!("feature {i} is not a Point"),
                })),
            })
            .collect()
    }
}

impl CriterionSource for PopulationDensity<'_> {
    fn column(&self) -> &str {
        &self.column
    }

    fn enrich(&self, table: &mut SiteTable) -> Result<()> {
        let points = self.points()?;
        if points.iter().all(|(_, v)| v.is_none()) {
            warn!(
                column = %self.column,
                "Population layer carries no {} field; using 0 for every site",
                DENSITY_FIELDS.join(" or ")
            );
            for site in table.sites_mut() {
                site.set_number(&self.column, 0.0);
            }
            return Ok(());
        }

        let mut matched: Vec<Option<f64>> = Vec::with_capacity(table.len());
        for site in table.sites() {
            let nearest = site.centroid().and_then(|c| {
                points
                    .iter()
                    .map(|(p, v)| (haversine_m(&c, p), *v))
                    .min_by(|a, b| a.0.total_cmp(&b.0))
            });
            let value = nearest.and_then(|(_, v)| v);
            if value.is_none() && self.policy == MissingValuePolicy::Fail {
                return Err(ShelterError::MissingPopulationValue { site: site.id.clone() });
            }
            matched.push(value);
        }

        let found: Vec<f64> = matched.iter().flatten().copied().collect();
        let mean = if found.is_empty() { 0.0 } else { found.iter().sum::<f64>() / found.len() as f64 };
        let filled = matched.iter().filter(|v| v.is_none()).count();
        if filled > 0 {
            warn!(column = %self.column, sites = filled, mean, "Filled missing population values with the mean");
        }

        for (site, value) in table.sites_mut().iter_mut().zip(matched) {
            site.set_number(&self.column, value.unwrap_or(mean));
        }
        info!(column = %self.column, points = points.len(), "Population criterion computed");
        Ok(())
    }
}
