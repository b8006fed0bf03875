//! Configuration loading for Shelterscope.
//! Reads shelterscope.toml from the current directory or path in SHELTERSCOPE_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use shelterscope_ingestion::{LayerPaths, MissingValuePolicy};
use shelterscope_ranker::{Bounds, Direction, PairwiseMatrix};

pub const CONFIG_ENV: &str = "SHELTERSCOPE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "shelterscope.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    pub ahp: AhpConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
    pub enrichment: Option<EnrichmentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_weights")]
    pub weights: PathBuf,
    #[serde(default = "default_weights_summary")]
    pub weights_summary: PathBuf,
    #[serde(default = "default_sites")]
    pub sites: PathBuf,
    #[serde(default = "default_scored")]
    pub scored: PathBuf,
    #[serde(default = "default_csv")]
    pub csv: PathBuf,
    #[serde(default = "default_map")]
    pub map: PathBuf,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

fn default_weights()         -> PathBuf { PathBuf::from("data/criteria_weights.json") }
fn default_weights_summary() -> PathBuf { PathBuf::from("data/criteria_weights.csv") }
fn default_sites()           -> PathBuf { PathBuf::from("data/processed/shelters_with_criteria.geojson") }
fn default_scored()          -> PathBuf { PathBuf::from("outputs/results.geojson") }
fn default_csv()             -> PathBuf { PathBuf::from("outputs/results.csv") }
fn default_map()             -> PathBuf { PathBuf::from("outputs/maps/shelter_map.html") }
fn default_reports_dir()     -> PathBuf { PathBuf::from("outputs/reports") }

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            weights_summary: default_weights_summary(),
            sites: default_sites(),
            scored: default_scored(),
            csv: default_csv(),
            map: default_map(),
            reports_dir: default_reports_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionConfig {
    pub name: String,
    #[serde(default)]
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AhpConfig {
    pub criteria: Vec<CriterionConfig>,
    /// Row-major pairwise comparison matrix, one row per criterion.
    pub matrix: Vec<Vec<f64>>,
    #[serde(default = "default_consistency_threshold")]
    pub consistency_threshold: f64,
    #[serde(default)]
    pub abort_on_inconsistent: bool,
}

fn default_consistency_threshold() -> f64 { shelterscope_ranker::ahp::DEFAULT_CONSISTENCY_THRESHOLD }

impl AhpConfig {
    pub fn criteria_names(&self) -> Vec<String> {
        self.criteria.iter().map(|c| c.name.clone()).collect()
    }

    pub fn directions(&self) -> HashMap<String, Direction> {
        self.criteria.iter().map(|c| (c.name.clone(), c.direction)).collect()
    }

    pub fn pairwise_matrix(&self) -> PairwiseMatrix {
        PairwiseMatrix::from_rows(self.matrix.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Fixed normalisation bounds per criterion; others use the batch min/max.
    #[serde(default)]
    pub bounds: HashMap<String, Bounds>,
    #[serde(default = "default_true")]
    pub export_csv: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { bounds: HashMap::new(), export_csv: true }
    }
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsConfig {
    #[serde(default = "default_true")]
    pub map: bool,
    #[serde(default = "default_true")]
    pub reports: bool,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    /// Draw the enrichment road and fault layers on the map when available.
    #[serde(default = "default_true")]
    pub overlays: bool,
}

fn default_zoom() -> u8 { shelterscope_report::map::DEFAULT_ZOOM }

impl Default for OutputsConfig {
    fn default() -> Self {
        Self { map: true, reports: true, zoom: default_zoom(), overlays: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Run enrichment as the first step of `run`.
    #[serde(default)]
    pub enabled: bool,
    /// Raw shelter candidates, before any criterion is attached.
    pub shelters: PathBuf,
    pub layers: LayerPaths,
    #[serde(default)]
    pub missing_population: MissingValuePolicy,
}

impl Config {
    /// Load configuration from shelterscope.toml.
    /// Checks SHELTERSCOPE_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy shelterscope.example.toml to shelterscope.toml and edit it.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Fixed normalisation bounds for scoring a standalone file.
    ///
    /// An explicit config path must load. Without one, the default file is
    /// used when present; when it is absent every criterion is batch-relative.
    pub fn scoring_bounds(explicit: Option<&Path>, default: &Path) -> anyhow::Result<HashMap<String, Bounds>> {
        let path = match explicit {
            Some(path) => path,
            None if default.exists() => default,
            None => return Ok(HashMap::new()),
        };
        Ok(Self::load_from(path)?.scoring.bounds)
    }

    /// Structural checks the ranker cannot make on its own.
    pub fn check(&self) -> anyhow::Result<()> {
        if self.ahp.criteria.is_empty() {
            anyhow::bail!("[ahp] criteria must not be empty");
        }
        if !self.ahp.consistency_threshold.is_finite() || self.ahp.consistency_threshold <= 0.0 {
            anyhow::bail!(
                "[ahp] consistency_threshold must be positive, got {}",
                self.ahp.consistency_threshold
            );
        }
        for (name, b) in &self.scoring.bounds {
            if !b.min.is_finite() || !b.max.is_finite() || b.max <= b.min {
                anyhow::bail!("[scoring.bounds.{name}] max ({}) must exceed min ({})", b.max, b.min);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
