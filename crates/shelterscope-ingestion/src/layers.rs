//! Auxiliary GeoJSON layers used to derive criteria.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shelterscope_common::{FeatureCollection, Result};
use tracing::{info, warn};

/// Where each auxiliary layer lives on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPaths {
    pub roads: PathBuf,
    pub faults: PathBuf,
    pub landuse: PathBuf,
    pub population: PathBuf,
}

/// All auxiliary layers, loaded.
#[derive(Debug, Clone, Default)]
pub struct Layers {
    pub roads: FeatureCollection,
    pub faults: FeatureCollection,
    pub landuse: FeatureCollection,
    pub population: FeatureCollection,
}

/// Line layers drawn over the sites on the overview map.
#[derive(Debug, Clone, Default)]
pub struct Overlays {
    pub roads: Option<FeatureCollection>,
    pub faults: Option<FeatureCollection>,
}

impl From<Layers> for Overlays {
    fn from(layers: Layers) -> Self {
        Self { roads: Some(layers.roads), faults: Some(layers.faults) }
    }
}

fn read_if_present(path: &Path) -> Result<Option<FeatureCollection>> {
    if !path.exists() {
        warn!(path = %path.display(), "Overlay layer not found; leaving it off the map");
        return Ok(None);
    }
    FeatureCollection::read(path).map(Some)
}

impl LayerPaths {
    /// Read the roads and fault lines for the map without the other layers.
    /// A missing file drops that overlay; a malformed one is an error.
    pub fn load_overlays(&self) -> Result<Overlays> {
        Ok(Overlays { roads: read_if_present(&self.roads)?, faults: read_if_present(&self.faults)? })
    }

    /// Read every layer. Fails with `LayerNotFound` on the first missing file.
    pub fn load(&self) -> Result<Layers> {
        let layers = Layers {
            roads: FeatureCollection::read(&self.roads)?,
            faults: FeatureCollection::read(&self.faults)?,
            landuse: FeatureCollection::read(&self.landuse)?,
            population: FeatureCollection::read(&self.population)?,
        };
        info!(
            roads = layers.roads.features.len(),
            faults = layers.faults.features.len(),
            landuse = layers.landuse.features.len(),
            population = layers.population.features.len(),
            "Auxiliary layers loaded"
        );
        Ok(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelterscope_common::ShelterError;

    #[test]
    fn test_missing_layer_is_reported_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let empty = r#"{"type":"FeatureCollection","features":[]}"#;
        for name in ["roads", "faults", "landuse"] {
            std::fs::write(dir.path().join(format!("{name}.geojson")), empty).unwrap();
        }
        let paths = LayerPaths {
            roads: dir.path().join("roads.geojson"),
            faults: dir.path().join("faults.geojson"),
            landuse: dir.path().join("landuse.geojson"),
            population: dir.path().join("population.geojson"),
        };
        let err = paths.load().unwrap_err();
        assert!(matches!(err, ShelterError::LayerNotFound(ref p) if p.ends_with("population.geojson")));
    }

    #[test]
    fn test_overlays_load_whatever_is_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("roads.geojson"),
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]},"properties":{}}]}"#,
        )
        .unwrap();
        let paths = LayerPaths {
            roads: dir.path().join("roads.geojson"),
            faults: dir.path().join("faults.geojson"),
            landuse: dir.path().join("landuse.geojson"),
            population: dir.path().join("population.geojson"),
        };
        let overlays = paths.load_overlays().unwrap();
        assert_eq!(overlays.roads.unwrap().features.len(), 1);
        assert!(overlays.faults.is_none());

        std::fs::write(dir.path().join("faults.geojson"), "not json").unwrap();
        assert!(paths.load_overlays().is_err());
    }
}
