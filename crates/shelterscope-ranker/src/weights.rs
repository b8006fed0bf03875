//! Criterion weights and their persisted form.
//!
//! On disk the weights are a JSON object keyed by criterion name:
//!
//! ```json
//! { "Distance_to_Roads": { "weight": 0.5579, "direction": "negative" } }
//! ```
//!
//! The older flat form `{ "Distance_to_Roads": 0.5579 }` is still accepted;
//! every entry read that way is treated as `positive`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::ahp::{round_to, AhpResult};
use crate::error::{RankerError, Result};

/// Decimal places kept when weights are written to disk.
pub const PERSISTED_DECIMALS: u32 = 4;

/// Whether a larger raw value makes a site more (`Positive`) or less
/// (`Negative`) suitable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Positive,
    Negative,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Positive => f.write_str("positive"),
            Direction::Negative => f.write_str("negative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeight {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub direction: Direction,
}

impl CriterionWeight {
    pub fn new(name: impl Into<String>, weight: f64, direction: Direction) -> Self {
        Self { name: name.into(), weight, direction }
    }
}

/// Ordered set of criterion weights with unique names.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct WeightSet {
    entries: Vec<CriterionWeight>,
}

impl WeightSet {
    pub fn new(entries: Vec<CriterionWeight>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(RankerError::DuplicateCriterion(entry.name.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Pair AHP weights with directions; criteria absent from `directions`
    /// default to positive.
    pub fn from_ahp(result: &AhpResult, directions: &HashMap<String, Direction>) -> Self {
        let entries = result
            .criteria
            .iter()
            .zip(&result.weights)
            .map(|(name, weight)| CriterionWeight {
                name: name.clone(),
                weight: *weight,
                direction: directions.get(name).copied().unwrap_or_default(),
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&CriterionWeight> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CriterionWeight> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    /// Whether the weights sum to ~1.0 (tolerance covers 4-decimal rounding).
    pub fn validate(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-3
    }

    /// Copy with every weight rounded to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|e| CriterionWeight { weight: round_to(e.weight, decimals), ..e.clone() })
            .collect();
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a WeightSet {
    type Item = &'a CriterionWeight;
    type IntoIter = std::slice::Iter<'a, CriterionWeight>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct StructuredEntry {
    weight: f64,
    #[serde(default)]
    direction: Direction,
}

/// The two accepted shapes of a weights document.
#[derive(Debug)]
enum WeightsDocument {
    Legacy(Vec<(String, f64)>),
    Structured(Vec<(String, StructuredEntry)>),
}

impl WeightsDocument {
    fn parse(value: Value) -> std::result::Result<Self, String> {
        let Value::Object(map) = value else {
            return Err("top level must be a JSON object".to_string());
        };
        if map.is_empty() {
            return Err("no criteria defined".to_string());
        }

        if map.values().all(Value::is_number) {
            let entries = map
                .into_iter()
                .map(|(name, v)| {
                    let weight = v.as_f64().ok_or_else(|| format!("weight for '{name}' is not a float"))?;
                    Ok((name, weight))
                })
                .collect::<std::result::Result<_, String>>()?;
            return Ok(Self::Legacy(entries));
        }

        if map.values().all(Value::is_object) {
            let entries = map
                .into_iter()
                .map(|(name, v)| {
                    serde_json::from_value::<StructuredEntry>(v)
                        .map(|entry| (name.clone(), entry))
                        .map_err(|e| format!("criterion '{name}': {e}"))
                })
                .collect::<std::result::Result<_, String>>()?;
            return Ok(Self::Structured(entries));
        }

        Err("entries must be all numbers (legacy) or all {weight, direction} objects".to_string())
    }

    fn into_weight_set(self) -> std::result::Result<WeightSet, String> {
        let entries: Vec<CriterionWeight> = match self {
            Self::Legacy(entries) => entries
                .into_iter()
                .map(|(name, weight)| CriterionWeight::new(name, weight, Direction::Positive))
                .collect(),
            Self::Structured(entries) => entries
                .into_iter()
                .map(|(name, e)| CriterionWeight::new(name, e.weight, e.direction))
                .collect(),
        };
        if let Some(bad) = entries.iter().find(|e| !e.weight.is_finite() || e.weight < 0.0) {
            return Err(format!("weight for '{}' must be a non-negative number, got {}", bad.name, bad.weight));
        }
        WeightSet::new(entries).map_err(|e| e.to_string())
    }
}

fn to_document(set: &WeightSet) -> Result<Value> {
    let mut map = Map::with_capacity(set.len());
    for e in set {
        let entry = StructuredEntry { weight: e.weight, direction: e.direction };
        map.insert(e.name.clone(), serde_json::to_value(entry)?);
    }
    Ok(Value::Object(map))
}

// ── Store ───────────────────────────────────────────────────────────────────

/// Reads and writes a weights JSON file.
#[derive(Debug, Clone)]
pub struct WeightStore {
    path: PathBuf,
}

impl WeightStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist an AHP result with every criterion marked positive.
    pub fn save(&self, result: &AhpResult) -> Result<WeightSet> {
        self.save_with_directions(result, &HashMap::new())
    }

    /// Persist an AHP result with explicit directions. Returns the weight set
    /// exactly as written (rounded).
    pub fn save_with_directions(
        &self,
        result: &AhpResult,
        directions: &HashMap<String, Direction>,
    ) -> Result<WeightSet> {
        let set = WeightSet::from_ahp(result, directions);
        self.save_weight_set(&set)
    }

    pub fn save_weight_set(&self, set: &WeightSet) -> Result<WeightSet> {
        let rounded = set.rounded(PERSISTED_DECIMALS);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&to_document(&rounded)?)?;
        std::fs::write(&self.path, content)?;
        info!(path = %self.path.display(), criteria = rounded.len(), "Weights saved");
        Ok(rounded)
    }

    pub fn load(&self) -> Result<WeightSet> {
        load_weights(&self.path)
    }

    /// Write the human-readable companion table
    /// `criterion,weight,direction,lambda_max,ci,cr`.
    pub fn save_summary_csv(
        &self,
        result: &AhpResult,
        directions: &HashMap<String, Direction>,
        csv_path: impl AsRef<Path>,
    ) -> Result<()> {
        let csv_path = csv_path.as_ref();
        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(csv_path)?;
        for e in &WeightSet::from_ahp(result, directions).rounded(PERSISTED_DECIMALS) {
            writer.serialize(SummaryRow {
                criterion: &e.name,
                weight: e.weight,
                direction: e.direction,
                lambda_max: result.lambda_max,
                ci: result.ci,
                cr: result.cr,
            })?;
        }
        writer.flush()?;
        debug!(path = %csv_path.display(), "AHP summary written");
        Ok(())
    }
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    criterion: &'a str,
    weight: f64,
    direction: Direction,
    lambda_max: f64,
    ci: f64,
    cr: f64,
}

/// Load a weights file in either the structured or the legacy flat form.
pub fn load_weights(path: impl AsRef<Path>) -> Result<WeightSet> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RankerError::WeightsFileNotFound(path.display().to_string()));
    }
    let malformed = |reason: String| RankerError::MalformedWeightsFile {
        path: path.display().to_string(),
        reason,
    };
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;
    let document = WeightsDocument::parse(value).map_err(malformed)?;
    if matches!(document, WeightsDocument::Legacy(_)) {
        debug!(path = %path.display(), "Legacy flat weights file, defaulting directions to positive");
    }
    let set = document.into_weight_set().map_err(malformed)?;
    info!(path = %path.display(), criteria = set.len(), "Weights loaded");
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ahp_result() -> AhpResult {
        AhpResult {
            criteria: vec!["Distance_to_Roads".into(), "Population_Density".into()],
            weights: vec![0.666666666, 0.333333334],
            lambda_max: 2.0,
            ci: 0.0,
            cr: 0.0,
        }
    }

    #[test]
    fn test_round_trip_defaults_to_positive() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeightStore::new(dir.path().join("weights.json"));
        let saved = store.save(&ahp_result()).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, saved);
        assert_eq!(loaded.get("Distance_to_Roads").unwrap().weight, 0.6667);
        assert_eq!(loaded.get("Population_Density").unwrap().weight, 0.3333);
        assert!(loaded.iter().all(|e| e.direction == Direction::Positive));
        assert!(loaded.validate());
    }

    #[test]
    fn test_round_trip_keeps_directions_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeightStore::new(dir.path().join("nested/weights.json"));
        let directions = HashMap::from([("Distance_to_Roads".to_string(), Direction::Negative)]);
        store.save_with_directions(&ahp_result(), &directions).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.names().collect::<Vec<_>>(), vec!["Distance_to_Roads", "Population_Density"]);
        assert_eq!(loaded.get("Distance_to_Roads").unwrap().direction, Direction::Negative);
        assert_eq!(loaded.get("Population_Density").unwrap().direction, Direction::Positive);
    }

    #[test]
    fn test_wire_format_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        let directions = HashMap::from([("Distance_to_Roads".to_string(), Direction::Negative)]);
        WeightStore::new(&path).save_with_directions(&ahp_result(), &directions).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({
                "Distance_to_Roads": {"weight": 0.6667, "direction": "negative"},
                "Population_Density": {"weight": 0.3333, "direction": "positive"}
            })
        );
    }

    #[test]
    fn test_legacy_flat_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(&path, r#"{"Slope": 0.4, "LandUse_Score": 0.6}"#).unwrap();

        let set = load_weights(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("LandUse_Score").unwrap().weight, 0.6);
        assert!(set.iter().all(|e| e.direction == Direction::Positive));
    }

    #[test]
    fn test_missing_direction_defaults_positive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"Slope": {"weight": 1.0}}"#).unwrap();
        assert_eq!(load_weights(&path).unwrap().get("Slope").unwrap().direction, Direction::Positive);
    }

    #[test]
    fn test_missing_file() {
        let err = load_weights("/definitely/not/here/weights.json").unwrap_err();
        assert!(matches!(err, RankerError::WeightsFileNotFound(p) if p.contains("weights.json")));
    }

    #[test]
    fn test_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            ("not json", "{oops"),
            ("array", "[1, 2]"),
            ("empty", "{}"),
            ("mixed", r#"{"a": 0.5, "b": {"weight": 0.5}}"#),
            ("bad direction", r#"{"a": {"weight": 0.5, "direction": "sideways"}}"#),
            ("negative", r#"{"a": -0.5}"#),
            ("string weight", r#"{"a": {"weight": "heavy"}}"#),
        ];
        for (label, content) in cases {
            let path = dir.path().join(format!("{}.json", label.replace(' ', "_")));
            std::fs::write(&path, content).unwrap();
            let err = load_weights(&path).unwrap_err();
            assert!(
                matches!(err, RankerError::MalformedWeightsFile { .. }),
                "{label}: expected MalformedWeightsFile, got {err:?}"
            );
        }
    }

    #[test]
    fn test_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let store = WeightStore::new(dir.path().join("weights.json"));
        let csv_path = dir.path().join("ahp_summary.csv");
        store.save_summary_csv(&ahp_result(), &HashMap::new(), &csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("criterion,weight,direction,lambda_max,ci,cr"));
        assert_eq!(lines.next(), Some("Distance_to_Roads,0.6667,positive,2.0,0.0,0.0"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = WeightSet::new(vec![
            CriterionWeight::new("a", 0.5, Direction::Positive),
            CriterionWeight::new("a", 0.5, Direction::Negative),
        ])
        .unwrap_err();
        assert!(matches!(err, RankerError::DuplicateCriterion(_)));
    }
}
