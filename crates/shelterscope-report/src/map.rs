//! Overview map: every scored site on a Leaflet base map, coloured by score.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use shelterscope_common::{FeatureCollection, Position, Result, ShelterError};
use shelterscope_ranker::SiteTable;
use tracing::{info, warn};

use crate::report::{criteria_of, report_file_names};
use crate::templates::{render, script_json, MAP_TEMPLATE};

/// Used when no site has a usable location (Elazığ city centre).
pub const DEFAULT_CENTER: Position = Position { lon: 39.2230, lat: 38.6740, alt: None };
pub const DEFAULT_ZOOM: u8 = 12;

/// Red → yellow → green, worst to best.
pub const SCORE_COLORS: [&str; 5] = ["#d7191c", "#fdae61", "#ffffbf", "#a6d96a", "#1a9641"];

/// Optional layers and settings for the overview map.
#[derive(Debug, Clone)]
pub struct MapOptions<'a> {
    pub title: String,
    pub zoom: u8,
    pub roads: Option<&'a FeatureCollection>,
    pub faults: Option<&'a FeatureCollection>,
    /// Relative link from the map to the per-site reports directory.
    pub reports_href: Option<String>,
}

impl Default for MapOptions<'_> {
    fn default() -> Self {
        Self {
            title: "Shelter suitability".to_string(),
            zoom: DEFAULT_ZOOM,
            roads: None,
            faults: None,
            reports_href: None,
        }
    }
}

#[derive(Serialize)]
struct Overlay {
    name: &'static str,
    color: &'static str,
    geojson: String,
}

#[derive(Serialize)]
struct LegendBucket {
    color: &'static str,
    label: String,
}

/// Bucket index of `score` among `SCORE_COLORS` over the range [min, max].
pub fn score_bucket(score: f64, min: f64, max: f64) -> usize {
    let n = SCORE_COLORS.len();
    if max - min <= f64::EPSILON {
        return n - 1;
    }
    let t = ((score - min) / (max - min)).clamp(0.0, 1.0);
    ((t * n as f64) as usize).min(n - 1)
}

/// Render the overview map as a standalone HTML document.
///
/// Every site must carry a `score`; otherwise `MissingScore` names the
/// first unscored site.
pub fn render_map(table: &SiteTable, options: &MapOptions<'_>) -> Result<String> {
    if let Some(site) = table.sites().iter().find(|s| s.score().is_none()) {
        return Err(ShelterError::MissingScore(site.id.clone()));
    }
    let (min, max) = match table.score_summary() {
        Some((min, max, _)) => (min, max),
        None => {
            warn!("Rendering a map with no sites");
            (0.0, 1.0)
        }
    };

    let mut sites = table.to_feature_collection();
    let files = report_file_names(table);
    for ((feature, site), file) in sites.features.iter_mut().zip(table.sites()).zip(files) {
        let color = SCORE_COLORS[score_bucket(site.score().unwrap_or(min), min, max)];
        feature.properties.insert("marker_color".into(), Value::String(color.into()));
        feature.properties.insert("report_file".into(), Value::String(file));
    }

    // Raw criterion values shown in the popups, first-seen order.
    let mut criteria: Vec<String> = Vec::new();
    for c in table.sites().iter().flat_map(criteria_of) {
        if !criteria.contains(&c) {
            criteria.push(c);
        }
    }

    let mut overlays = Vec::new();
    if let Some(roads) = options.roads {
        overlays.push(Overlay { name: "Roads", color: "#555555", geojson: script_json(roads)? });
    }
    if let Some(faults) = options.faults {
        overlays.push(Overlay { name: "Fault lines", color: "#8b0000", geojson: script_json(faults)? });
    }

    let step = (max - min) / SCORE_COLORS.len() as f64;
    let legend: Vec<LegendBucket> = SCORE_COLORS
        .iter()
        .copied()
        .enumerate()
        .map(|(i, color)| {
            let lo = min + step * i as f64;
            LegendBucket { color, label: format!("{:.3} - {:.3}", lo, lo + step) }
        })
        .collect();

    let center = map_center(table);
    let html = render(
        MAP_TEMPLATE,
        serde_json::json!({
            "title": options.title,
            "zoom": options.zoom,
            "center_lat": center.lat,
            "center_lon": center.lon,
            "overlays": overlays,
            "sites_geojson": script_json(&sites)?,
            "reports_href": script_json(&options.reports_href)?,
            "criteria_json": script_json(&criteria)?,
            "legend": legend,
        }),
    )?;
    Ok(html)
}

/// Render and write the map, creating parent directories.
pub fn write_map(table: &SiteTable, options: &MapOptions<'_>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let html = render_map(table, options)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    info!(path = %path.display(), sites = table.len(), "Map written");
    Ok(())
}

/// Mean of the site centroids.
fn map_center(table: &SiteTable) -> Position {
    let centroids: Vec<Position> = table.sites().iter().filter_map(|s| s.centroid()).collect();
    if centroids.is_empty() {
        return DEFAULT_CENTER;
    }
    let n = centroids.len() as f64;
    Position::new(
        centroids.iter().map(|p| p.lon).sum::<f64>() / n,
        centroids.iter().map(|p| p.lat).sum::<f64>() / n,
    )
}
