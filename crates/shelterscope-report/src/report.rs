//! Per-site HTML reports.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use shelterscope_common::{Result, ShelterError};
use shelterscope_ranker::sites::{norm_column, weighted_column, RANK_COLUMN, SCORE_COLUMN};
use shelterscope_ranker::{CandidateSite, SiteTable};
use tracing::info;

use crate::templates::{render, SITE_REPORT_TEMPLATE};

const NORM_SUFFIX: &str = "_norm";

#[derive(Serialize)]
struct CriterionRow {
    name: String,
    raw: String,
    norm: String,
    weighted: String,
}

#[derive(Serialize)]
struct Attribute {
    name: String,
    value: String,
}

#[derive(Serialize)]
struct Location {
    lon: String,
    lat: String,
}

/// File-name-safe form of a site id.
fn report_name(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Report file name for every site, in row order: `shelter_<id>.html`.
///
/// Ids that sanitise to a name already taken (compared case-insensitively)
/// get their 1-based row appended, then a counter until the name is free.
pub fn report_file_names(table: &SiteTable) -> Vec<String> {
    let mut taken = HashSet::with_capacity(table.len());
    table
        .sites()
        .iter()
        .enumerate()
        .map(|(i, site)| {
            let base = report_name(&site.id);
            let mut name = base.clone();
            let mut n = i + 1;
            while !taken.insert(name.to_ascii_lowercase()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            format!("shelter_{name}.html")
        })
        .collect()
}

/// Criteria of a scored site, in property order, found through their `_norm` columns.
pub(crate) fn criteria_of(site: &CandidateSite) -> Vec<String> {
    site.properties
        .keys()
        .filter_map(|k| k.strip_suffix(NORM_SUFFIX))
        .map(str::to_string)
        .collect()
}

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => format!("{f:.4}"),
            _ => n.to_string(),
        },
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render one site's report.
pub fn render_site_report(site: &CandidateSite) -> Result<String> {
    let score = site.score().ok_or_else(|| ShelterError::MissingScore(site.id.clone()))?;
    let criteria = criteria_of(site);

    let rows: Vec<CriterionRow> = criteria
        .iter()
        .map(|c| CriterionRow {
            name: c.clone(),
            raw: display(site.properties.get(c)),
            norm: display(site.properties.get(&norm_column(c))),
            weighted: display(site.properties.get(&weighted_column(c))),
        })
        .collect();

    let derived = |key: &str| {
        key == SCORE_COLUMN
            || key == RANK_COLUMN
            || key == "id"
            || criteria.iter().any(|c| key == c.as_str() || key == norm_column(c) || key == weighted_column(c))
    };
    let attributes: Vec<Attribute> = site
        .properties
        .iter()
        .filter(|(k, _)| !derived(k.as_str()))
        .map(|(k, v)| Attribute { name: k.clone(), value: display(Some(v)) })
        .collect();

    let centroid = site.centroid().map(|c| Location { lon: format!("{:.6}", c.lon), lat: format!("{:.6}", c.lat) });

    render(
        SITE_REPORT_TEMPLATE,
        serde_json::json!({
            "site_id": site.id,
            "score": format!("{score:.4}"),
            "rank": site.rank().map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            "centroid": centroid,
            "criteria": rows,
            "attributes": attributes,
        }),
    )
}

/// Write one report per site into `dir`. Returns the written paths in row order.
pub fn write_reports(table: &SiteTable, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    // Render everything first so an unscored table writes nothing.
    let rendered = table
        .sites()
        .iter()
        .zip(report_file_names(table))
        .map(|(site, name)| Ok((name, render_site_report(site)?)))
        .collect::<Result<Vec<_>>>()?;

    std::fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(rendered.len());
    for (name, html) in rendered {
        let path = dir.join(name);
        std::fs::write(&path, html)?;
        paths.push(path);
    }
    info!(dir = %dir.display(), reports = paths.len(), "Site reports written");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shelterscope_common::{Geometry, Position};

    fn scored_site(id: &str) -> CandidateSite {
        let mut site = CandidateSite::new(id)
            .with_geometry(Geometry::Point(Position::new(39.223, 38.674)))
            .with_value("Distance_to_Roads", 120.0)
            .with_value("Distance_to_Roads_norm", 0.25)
            .with_value("Distance_to_Roads_w", 0.125)
            .with_value("score", 0.625);
        site.properties.insert("rank".into(), Value::from(3u64));
        site.properties.insert("name".into(), Value::String("Stadium".into()));
        site
    }

    #[test]
    fn test_report_contains_criteria_breakdown() {
        let html = render_site_report(&scored_site("7")).unwrap();
        assert!(html.contains("Shelter 7"));
        assert!(html.contains("0.6250"));
        assert!(html.contains("<td>Distance_to_Roads</td><td>120.0000</td><td>0.2500</td><td>0.1250</td>"));
        assert!(html.contains("<td>name</td><td>Stadium</td>"));
        assert!(html.contains("38.674000, 39.223000"));
        assert!(html.contains("<strong>3</strong>"));
    }

    #[test]
    fn test_criteria_detected_from_norm_columns() {
        assert_eq!(criteria_of(&scored_site("a")), vec!["Distance_to_Roads".to_string()]);
    }

    #[test]
    fn test_report_names_are_path_safe() {
        let table = SiteTable::new(vec![CandidateSite::new("osm/way 12"), CandidateSite::new("42")]);
        assert_eq!(report_file_names(&table), vec!["shelter_osm_way_12.html", "shelter_42.html"]);
    }

    #[test]
    fn test_colliding_report_names_get_row_suffix() {
        let table = SiteTable::new(vec![
            CandidateSite::new("osm/1"),
            CandidateSite::new("osm_1"),
            CandidateSite::new("OSM_1"),
            CandidateSite::new("osm_1_2"),
        ]);
        assert_eq!(
            report_file_names(&table),
            vec!["shelter_osm_1.html", "shelter_osm_1_2.html", "shelter_OSM_1_3.html", "shelter_osm_1_2_4.html"]
        );
    }

    #[test]
    fn test_colliding_ids_write_separate_reports() {
        let dir = tempfile::tempdir().unwrap();
        let table = SiteTable::new(vec![scored_site("osm.1"), scored_site("osm_1")]);
        let paths = write_reports(&table, dir.path()).unwrap();
        assert_ne!(paths[0], paths[1]);
        assert!(std::fs::read_to_string(&paths[0]).unwrap().contains("Shelter osm.1"));
        assert!(std::fs::read_to_string(&paths[1]).unwrap().contains("Shelter osm_1"));
    }

    #[test]
    fn test_write_reports_one_file_per_site() {
        let dir = tempfile::tempdir().unwrap();
        let table = SiteTable::new(vec![scored_site("1"), scored_site("2")]);
        let paths = write_reports(&table, dir.path().join("reports")).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("shelter_1.html"));
        assert!(paths[1].exists());
    }

    #[test]
    fn test_unscored_site_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let table = SiteTable::new(vec![scored_site("1"), CandidateSite::new("2")]);
        let err = write_reports(&table, &out).unwrap_err();
        assert!(matches!(err, ShelterError::MissingScore(ref id) if id == "2"));
        assert!(!out.exists());
    }
}
