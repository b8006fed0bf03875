use super::*;
use pretty_assertions::assert_eq;

const MINIMAL: &str = r#"
[ahp]
criteria = [
    { name = "Distance_to_Roads", direction = "negative" },
    { name = "Population_Density" },
]
matrix = [[1.0, 3.0], [0.3333333333, 1.0]]
"#;

#[test]
fn test_minimal_config_fills_defaults() {
    let config: Config = toml::from_str(MINIMAL).unwrap();
    assert_eq!(config.paths.weights, PathBuf::from("data/criteria_weights.json"));
    assert_eq!(config.paths.scored, PathBuf::from("outputs/results.geojson"));
    assert_eq!(config.ahp.consistency_threshold, 0.1);
    assert!(!config.ahp.abort_on_inconsistent);
    assert!(config.scoring.export_csv);
    assert!(config.scoring.bounds.is_empty());
    assert!(config.outputs.map && config.outputs.reports);
    assert_eq!(config.outputs.zoom, 12);
    assert!(config.enrichment.is_none());
}

#[test]
fn test_directions_default_to_positive() {
    let config: Config = toml::from_str(MINIMAL).unwrap();
    let directions = config.ahp.directions();
    assert_eq!(directions["Distance_to_Roads"], Direction::Negative);
    assert_eq!(directions["Population_Density"], Direction::Positive);
    assert_eq!(config.ahp.criteria_names(), vec!["Distance_to_Roads", "Population_Density"]);
    assert_eq!(config.ahp.pairwise_matrix().dimension(), 2);
}

#[test]
fn test_bounds_and_enrichment_sections() {
    let text = format!(
        "{MINIMAL}
[scoring]
export_csv = false
[scoring.bounds.Distance_to_Roads]
min = 0.0
max = 5000.0

[enrichment]
enabled = true
shelters = \"data/raw/shelters.geojson\"
missing_population = \"fail\"
[enrichment.layers]
roads = \"data/raw/roads.geojson\"
faults = \"data/raw/faults.geojson\"
landuse = \"data/raw/landuse.geojson\"
population = \"data/raw/population.geojson\"
"
    );
    let config: Config = toml::from_str(&text).unwrap();
    assert!(!config.scoring.export_csv);
    assert_eq!(config.scoring.bounds["Distance_to_Roads"], Bounds { min: 0.0, max: 5000.0 });
    let enrichment = config.enrichment.unwrap();
    assert!(enrichment.enabled);
    assert_eq!(enrichment.missing_population, MissingValuePolicy::Fail);
    assert_eq!(enrichment.layers.faults, PathBuf::from("data/raw/faults.geojson"));
}

#[test]
fn test_load_from_missing_file() {
    let err = Config::load_from("/nonexistent/shelterscope.toml").unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}

#[test]
fn test_load_from_rejects_inverted_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shelterscope.toml");
    std::fs::write(
        &path,
        format!("{MINIMAL}\n[scoring.bounds.Population_Density]\nmin = 10.0\nmax = 1.0\n"),
    )
    .unwrap();
    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Population_Density"));
}

#[test]
fn test_scoring_bounds_without_any_config_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let bounds = Config::scoring_bounds(None, &dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
    assert!(bounds.is_empty());
}

#[test]
fn test_scoring_bounds_from_default_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    std::fs::write(&path, format!("{MINIMAL}\n[scoring.bounds.Population_Density]\nmin = 0.0\nmax = 9.0\n")).unwrap();
    let bounds = Config::scoring_bounds(None, &path).unwrap();
    assert_eq!(bounds["Population_Density"], Bounds { min: 0.0, max: 9.0 });
}

#[test]
fn test_scoring_bounds_propagate_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let default = dir.path().join(DEFAULT_CONFIG_FILE);
    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[ahp\ncriteria = ").unwrap();
    assert!(Config::scoring_bounds(Some(&broken), &default).is_err());

    let missing = dir.path().join("missing.toml");
    let err = Config::scoring_bounds(Some(&missing), &default).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));

    // A default file that exists but is invalid is not skipped either.
    std::fs::write(&default, format!("{MINIMAL}\n[scoring.bounds.Population_Density]\nmin = 10.0\nmax = 1.0\n")).unwrap();
    assert!(Config::scoring_bounds(None, &default).is_err());
}

#[test]
fn test_example_config_parses() {
    let text = include_str!("../../../../shelterscope.example.toml");
    let config: Config = toml::from_str(text).unwrap();
    config.check().unwrap();
    assert_eq!(config.ahp.criteria.len(), config.ahp.matrix.len());
}
