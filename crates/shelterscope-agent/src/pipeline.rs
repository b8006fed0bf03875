//! End-to-end shelter suitability pipeline.
//!
//! Orchestrates a full run from one configuration:
//!   1. Enrich raw shelters with criterion columns (when enabled)
//!   2. Derive criterion weights with AHP and check consistency
//!   3. Persist weights (JSON + summary CSV) and reload them
//!   4. Normalise criteria and compute the weighted score and rank
//!   5. Write scored GeoJSON, flattened CSV, overview map, site reports
//!
//! Every CLI subcommand is one or more of these steps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use shelterscope_common::FeatureCollection;
use shelterscope_ingestion::{enrich_sites, Layers, Overlays};
use shelterscope_ranker::export::write_csv;
use shelterscope_ranker::{AhpEngine, AhpResult, Bounds, Normaliser, SiteTable, WeightSet, WeightStore};
use shelterscope_report::{write_map, write_reports, MapOptions};
use tracing::{info, instrument, warn};

use crate::config::{Config, EnrichmentConfig};

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub generated_at: DateTime<Utc>,
    pub sites: usize,
    pub lambda_max: f64,
    pub ci: f64,
    pub cr: f64,
    pub consistent: bool,
    pub weights: WeightSet,
    pub best_site: Option<BestSite>,
    pub outputs: OutputPaths,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestSite {
    pub id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputPaths {
    pub weights: PathBuf,
    pub weights_summary: PathBuf,
    pub scored: PathBuf,
    pub csv: Option<PathBuf>,
    pub map: Option<PathBuf>,
    pub reports: Vec<PathBuf>,
}

// ── Steps ─────────────────────────────────────────────────────────────────────

/// AHP over the configured matrix. An inconsistent matrix is only logged
/// unless `abort_on_inconsistent` is set.
#[instrument(skip_all, fields(criteria = config.ahp.criteria.len()))]
pub fn derive_weights(config: &Config) -> anyhow::Result<AhpResult> {
    let engine = AhpEngine::new(config.ahp.consistency_threshold);
    let result = engine
        .compute_weights(&config.ahp.pairwise_matrix(), &config.ahp.criteria_names())
        .context("AHP weight derivation failed")?;

    if !result.is_consistent_at(config.ahp.consistency_threshold) && config.ahp.abort_on_inconsistent {
        anyhow::bail!(
            "Pairwise matrix is inconsistent: CR = {:.3} exceeds {}; revise the judgments or unset abort_on_inconsistent",
            result.cr,
            config.ahp.consistency_threshold
        );
    }
    Ok(result)
}

/// Persist weights and the summary CSV, then read the weights back so the
/// scorer uses exactly what is on disk.
#[instrument(skip_all)]
pub fn persist_weights(config: &Config, result: &AhpResult) -> anyhow::Result<WeightSet> {
    let store = WeightStore::new(&config.paths.weights);
    let directions = config.ahp.directions();
    store
        .save_with_directions(result, &directions)
        .with_context(|| format!("Could not write {}", config.paths.weights.display()))?;
    store
        .save_summary_csv(result, &directions, &config.paths.weights_summary)
        .with_context(|| format!("Could not write {}", config.paths.weights_summary.display()))?;
    let weights = store.load()?;
    if !weights.validate() {
        warn!(sum = weights.sum(), "Persisted weights do not sum to 1");
    }
    Ok(weights)
}

/// Build the candidate table from raw shelters and layers and write it to
/// `paths.sites`.
#[instrument(skip_all)]
pub fn enrich(config: &Config, enrichment: &EnrichmentConfig) -> anyhow::Result<(SiteTable, Layers)> {
    let layers = enrichment.layers.load().context("Could not load enrichment layers")?;
    let shelters = FeatureCollection::read(&enrichment.shelters)
        .with_context(|| format!("Could not read shelters from {}", enrichment.shelters.display()))?;
    let table = enrich_sites(shelters, &layers, enrichment.missing_population)?;
    table.to_feature_collection().write(&config.paths.sites)?;
    info!(path = %config.paths.sites.display(), sites = table.len(), "Enriched sites written");
    Ok((table, layers))
}

/// Normalise and score a table in place.
#[instrument(skip_all, fields(sites = table.len()))]
pub fn score_table(
    bounds: &HashMap<String, Bounds>,
    table: &mut SiteTable,
    weights: &WeightSet,
) -> anyhow::Result<()> {
    Normaliser::with_bounds(bounds.clone())
        .normalize(table, weights)
        .context("Normalisation failed")?;
    shelterscope_ranker::score(table, weights).context("Scoring failed")?;
    Ok(())
}

/// Score a GeoJSON file against an existing weights file.
pub fn score_file(
    input: &Path,
    output: &Path,
    weights_path: &Path,
    csv: Option<&Path>,
    bounds: &HashMap<String, Bounds>,
) -> anyhow::Result<SiteTable> {
    let weights = shelterscope_ranker::load_weights(weights_path)?;
    let sites = FeatureCollection::read(input)
        .with_context(|| format!("Could not read sites from {}", input.display()))?;
    let mut table = SiteTable::from_feature_collection(sites)?;
    score_table(bounds, &mut table, &weights)?;
    table.to_feature_collection().write(output)?;
    info!(path = %output.display(), sites = table.len(), "Scored sites written");
    if let Some(csv) = csv {
        write_csv(&table, csv)?;
    }
    Ok(table)
}

// ── Full run ──────────────────────────────────────────────────────────────────

pub struct Pipeline;

impl Pipeline {
    #[instrument(skip_all)]
    pub fn run(config: &Config) -> anyhow::Result<PipelineReport> {
        let started = Instant::now();

        let enriched = match &config.enrichment {
            Some(e) if e.enabled => Some(enrich(config, e)?),
            _ => None,
        };

        let result = derive_weights(config)?;
        let weights = persist_weights(config, &result)?;

        let (mut table, layers) = match enriched {
            Some((table, layers)) => (table, Some(layers)),
            None => {
                let sites = FeatureCollection::read(&config.paths.sites)
                    .with_context(|| format!("Could not read sites from {}", config.paths.sites.display()))?;
                (SiteTable::from_feature_collection(sites)?, None)
            }
        };
        score_table(&config.scoring.bounds, &mut table, &weights)?;

        let mut outputs = OutputPaths {
            weights: config.paths.weights.clone(),
            weights_summary: config.paths.weights_summary.clone(),
            scored: config.paths.scored.clone(),
            ..Default::default()
        };
        table.to_feature_collection().write(&config.paths.scored)?;
        info!(path = %config.paths.scored.display(), "Scored sites written");

        if config.scoring.export_csv {
            write_csv(&table, &config.paths.csv)?;
            outputs.csv = Some(config.paths.csv.clone());
        }

        if config.outputs.map {
            let overlays = if config.outputs.overlays { map_overlays(config, layers)? } else { Overlays::default() };
            let options = MapOptions {
                zoom: config.outputs.zoom,
                roads: overlays.roads.as_ref(),
                faults: overlays.faults.as_ref(),
                reports_href: config
                    .outputs
                    .reports
                    .then(|| reports_href(&config.paths.map, &config.paths.reports_dir)),
                ..Default::default()
            };
            write_map(&table, &options, &config.paths.map)?;
            outputs.map = Some(config.paths.map.clone());
        }

        if config.outputs.reports {
            outputs.reports = write_reports(&table, &config.paths.reports_dir)?;
        }

        let best_site = table
            .top(1)
            .first()
            .and_then(|s| s.score().map(|score| BestSite { id: s.id.clone(), score }));
        if let Some((min, max, mean)) = table.score_summary() {
            info!("Score range {:.4} to {:.4}, mean {:.4}", min, max, mean);
        }
        info!(
            sites = table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline complete"
        );

        Ok(PipelineReport {
            generated_at: Utc::now(),
            sites: table.len(),
            lambda_max: result.lambda_max,
            ci: result.ci,
            cr: result.cr,
            consistent: result.is_consistent_at(config.ahp.consistency_threshold),
            weights,
            best_site,
            outputs,
        })
    }
}

/// Roads and faults for the map: the layers enrichment already loaded, or
/// the configured layer files when enrichment did not run this time.
fn map_overlays(config: &Config, loaded: Option<Layers>) -> anyhow::Result<Overlays> {
    if let Some(layers) = loaded {
        return Ok(layers.into());
    }
    match &config.enrichment {
        Some(e) => e.layers.load_overlays().context("Could not load map overlays"),
        None => Ok(Overlays::default()),
    }
}

/// Link from the map document to the reports directory. Both default to
/// siblings under `outputs/`, giving `../reports/`.
fn reports_href(map: &Path, reports_dir: &Path) -> String {
    let map_dir = map.parent().unwrap_or(Path::new(""));
    let mut up = String::new();
    let mut base = map_dir;
    while !reports_dir.starts_with(base) {
        up.push_str("../");
        match base.parent() {
            Some(p) => base = p,
            None => break,
        }
    }
    let rest = reports_dir.strip_prefix(base).unwrap_or(reports_dir);
    let mut href = format!("{up}{}", rest.display());
    if !href.is_empty() && !href.ends_with('/') {
        href.push('/');
    }
    href
}
