//! Candidate sites and the table the normaliser and scorer operate on.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};
use shelterscope_common::geo::{Feature, FeatureCollection, Geometry, Position};

use crate::error::{RankerError, Result};

/// Property name of the final weighted sum.
pub const SCORE_COLUMN: &str = "score";
/// Property name of the dense rank (1 = best).
pub const RANK_COLUMN: &str = "rank";

pub fn norm_column(criterion: &str) -> String {
    format!("{criterion}_norm")
}

pub fn weighted_column(criterion: &str) -> String {
    format!("{criterion}_w")
}

/// One candidate shelter: identifier, optional geometry and flat properties.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSite {
    pub id: String,
    pub geometry: Option<Geometry>,
    pub properties: Map<String, Value>,
}

impl CandidateSite {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), geometry: None, properties: Map::new() }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_value(mut self, name: &str, value: f64) -> Self {
        self.set_number(name, value);
        self
    }

    /// Numeric property value, `None` when absent, null or not a number.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.properties.get(name).and_then(Value::as_f64)
    }

    /// Store a numeric property. Non-finite values are stored as null since
    /// JSON cannot carry them.
    pub fn set_number(&mut self, name: &str, value: f64) {
        let v = Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null);
        self.properties.insert(name.to_string(), v);
    }

    pub fn score(&self) -> Option<f64> {
        self.number(SCORE_COLUMN)
    }

    pub fn rank(&self) -> Option<u64> {
        self.properties.get(RANK_COLUMN).and_then(Value::as_u64)
    }

    /// Representative point (polygon centroid, or the point itself).
    pub fn centroid(&self) -> Option<Position> {
        self.geometry.as_ref().and_then(Geometry::centroid)
    }
}

/// Ordered collection of candidate sites. Row order is significant: it is
/// the tie-break order for ranking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteTable {
    sites: Vec<CandidateSite>,
}

impl SiteTable {
    pub fn new(sites: Vec<CandidateSite>) -> Self {
        Self { sites }
    }

    /// Build from GeoJSON features. The site id comes from the feature `id`,
    /// then `properties.id`, then the 1-based row position. Ids must be
    /// unique across the table; rows are reported 1-based.
    pub fn from_feature_collection(fc: FeatureCollection) -> Result<Self> {
        let mut seen: HashMap<String, usize> = HashMap::with_capacity(fc.features.len());
        let mut sites = Vec::with_capacity(fc.features.len());
        for (i, f) in fc.features.into_iter().enumerate() {
            let id = f
                .id
                .as_ref()
                .or_else(|| f.properties.get("id"))
                .and_then(id_to_string)
                .unwrap_or_else(|| (i + 1).to_string());
            if let Some(first) = seen.insert(id.clone(), i + 1) {
                return Err(RankerError::DuplicateSite { id, first, second: i + 1 });
            }
            sites.push(CandidateSite { id, geometry: f.geometry, properties: f.properties });
        }
        Ok(Self { sites })
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .sites
            .iter()
            .map(|s| Feature {
                id: Some(Value::String(s.id.clone())),
                geometry: s.geometry.clone(),
                properties: s.properties.clone(),
            })
            .collect();
        FeatureCollection { features }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn sites(&self) -> &[CandidateSite] {
        &self.sites
    }

    pub fn sites_mut(&mut self) -> &mut [CandidateSite] {
        &mut self.sites
    }

    pub fn get(&self, id: &str) -> Option<&CandidateSite> {
        self.sites.iter().find(|s| s.id == id)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.sites.iter().any(|s| s.properties.contains_key(name))
    }

    /// Read a numeric criterion column, one value per site in row order.
    ///
    /// Fails with `MissingCriterionColumn` when no site carries the property
    /// and with `NonNumericCriterion` when any site's value is absent, null or
    /// not a number.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        if !self.has_column(name) {
            return Err(RankerError::MissingCriterionColumn(name.to_string()));
        }
        self.sites
            .iter()
            .map(|s| {
                s.number(name).ok_or_else(|| RankerError::NonNumericCriterion {
                    column: name.to_string(),
                    site: s.id.clone(),
                })
            })
            .collect()
    }

    /// Write one value per site (row order) into `name`.
    pub fn set_column(&mut self, name: &str, values: &[f64]) {
        debug_assert_eq!(values.len(), self.sites.len());
        for (site, v) in self.sites.iter_mut().zip(values) {
            site.set_number(name, *v);
        }
    }

    /// The `k` best ranked sites, ties kept in row order. Unscored sites are skipped.
    pub fn top(&self, k: usize) -> Vec<&CandidateSite> {
        let mut ranked: Vec<&CandidateSite> = self.sites.iter().filter(|s| s.rank().is_some()).collect();
        ranked.sort_by_key(|s| s.rank());
        ranked.truncate(k);
        ranked
    }

    /// (min, max, mean) of `score`, `None` if nothing is scored.
    pub fn score_summary(&self) -> Option<(f64, f64, f64)> {
        let scores: Vec<f64> = self.sites.iter().filter_map(CandidateSite::score).collect();
        if scores.is_empty() {
            return None;
        }
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Some((min, max, mean))
    }
}

fn id_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
