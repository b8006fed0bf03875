//! Minimal GeoJSON model plus the geometry queries the scoring pipeline
//! needs: representative points (centroids), point-in-polygon and distances
//! in metres.
//!
//! Coordinates are WGS84 longitude/latitude. The geometry itself is computed
//! with the `geo` crate: planar centroids and containment on lon/lat, and
//! great-circle (haversine) distance to the closest point of a geometry.

use std::path::Path;

use geo::{
    Centroid, Closest, Contains, HaversineClosestPoint, HaversineDistance, LineString, MultiLineString,
    MultiPoint, MultiPolygon, Point, Polygon,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, ShelterError};

/// A GeoJSON position. Altitude is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
    pub alt: Option<f64>,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat, alt: None }
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(coords: Vec<f64>) -> std::result::Result<Self, Self::Error> {
        match coords.as_slice() {
            [lon, lat] => Ok(Self::new(*lon, *lat)),
            [lon, lat, alt, ..] => Ok(Self { lon: *lon, lat: *lat, alt: Some(*alt) }),
            _ => Err(format!("position needs at least 2 coordinates, got {}", coords.len())),
        }
    }
}

impl From<Position> for Vec<f64> {
    fn from(p: Position) -> Self {
        match p.alt {
            Some(alt) => vec![p.lon, p.lat, alt],
            None => vec![p.lon, p.lat],
        }
    }
}

impl From<Position> for Point<f64> {
    fn from(p: Position) -> Self {
        Point::new(p.lon, p.lat)
    }
}

impl From<Point<f64>> for Position {
    fn from(p: Point<f64>) -> Self {
        Position::new(p.x(), p.y())
    }
}

fn line_string(positions: &[Position]) -> LineString<f64> {
    positions.iter().map(|p| (p.lon, p.lat)).collect::<Vec<_>>().into()
}

fn polygon(rings: &[Vec<Position>]) -> Polygon<f64> {
    match rings.split_first() {
        Some((exterior, holes)) => Polygon::new(line_string(exterior), holes.iter().map(|h| line_string(h)).collect()),
        None => Polygon::new(LineString::new(Vec::new()), Vec::new()),
    }
}

/// GeoJSON geometry object. `GeometryCollection` is not supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// The same shape as a `geo` geometry.
    pub fn to_geo(&self) -> geo::Geometry<f64> {
        match self {
            Geometry::Point(p) => geo::Geometry::Point((*p).into()),
            Geometry::MultiPoint(points) => {
                geo::Geometry::MultiPoint(MultiPoint::new(points.iter().map(|p| Point::from(*p)).collect()))
            }
            Geometry::LineString(line) => geo::Geometry::LineString(line_string(line)),
            Geometry::MultiLineString(lines) => {
                geo::Geometry::MultiLineString(MultiLineString::new(lines.iter().map(|l| line_string(l)).collect()))
            }
            Geometry::Polygon(rings) => geo::Geometry::Polygon(polygon(rings)),
            Geometry::MultiPolygon(polygons) => {
                geo::Geometry::MultiPolygon(MultiPolygon::new(polygons.iter().map(|r| polygon(r)).collect()))
            }
        }
    }

    /// Representative point used for display and distance queries: the
    /// point itself, or the `geo` centroid (length-weighted for lines,
    /// area-weighted with holes removed for polygons).
    pub fn centroid(&self) -> Option<Position> {
        match self {
            Geometry::Point(p) => Some(*p),
            _ => self.to_geo().centroid().map(Position::from),
        }
    }

    /// Whether `point` lies strictly inside this geometry. Only areal
    /// geometries contain points.
    pub fn contains(&self, point: &Position) -> bool {
        let point = Point::from(*point);
        match self {
            Geometry::Polygon(rings) => polygon(rings).contains(&point),
            Geometry::MultiPolygon(polygons) => {
                MultiPolygon::new(polygons.iter().map(|r| polygon(r)).collect()).contains(&point)
            }
            _ => false,
        }
    }

    /// Great-circle distance in metres from `point` to the closest point of
    /// this geometry. Zero when a polygon contains the point, `None` for an
    /// empty geometry.
    pub fn distance_m(&self, point: &Position) -> Option<f64> {
        if self.contains(point) {
            return Some(0.0);
        }
        let from = Point::from(*point);
        match self {
            Geometry::Point(p) => Some(from.haversine_distance(&Point::from(*p))),
            Geometry::MultiPoint(points) => nearest(points.iter().map(|p| Some(from.haversine_distance(&Point::from(*p))))),
            Geometry::LineString(line) => line_distance_m(&from, line),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                nearest(lines.iter().map(|l| line_distance_m(&from, l)))
            }
            Geometry::MultiPolygon(polygons) => {
                nearest(polygons.iter().flatten().map(|l| line_distance_m(&from, l)))
            }
        }
    }
}

/// Distance to the closest point of a polyline (or ring) on the sphere.
fn line_distance_m(from: &Point<f64>, line: &[Position]) -> Option<f64> {
    match line {
        [] => None,
        [only] => Some(from.haversine_distance(&Point::from(*only))),
        _ => match line_string(line).haversine_closest_point(from) {
            Closest::Intersection(_) => Some(0.0),
            Closest::SinglePoint(p) => Some(from.haversine_distance(&p)),
            Closest::Indeterminate => None,
        },
    }
}

fn nearest(distances: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    distances.flatten().reduce(f64::min)
}

/// A GeoJSON feature. `properties: null` is read as an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Read a GeoJSON FeatureCollection from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ShelterError::LayerNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let fc: Self = serde_json::from_str(&content).map_err(|e| ShelterError::InvalidGeoJson {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), features = fc.features.len(), "GeoJSON read");
        Ok(fc)
    }

    /// Write as pretty-printed GeoJSON, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), features = self.features.len(), "GeoJSON written");
        Ok(())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Great-circle distance in metres.
pub fn haversine_m(a: &Position, b: &Position) -> f64 {
    Point::from(*a).haversine_distance(&Point::from(*b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Position> {
        vec![
            Position::new(x0, y0),
            Position::new(x0 + size, y0),
            Position::new(x0 + size, y0 + size),
            Position::new(x0, y0 + size),
            Position::new(x0, y0),
        ]
    }

    #[test]
    fn test_feature_collection_parses_points_and_polygons() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": 7, "geometry": {"type": "Point", "coordinates": [39.2, 38.6]},
                 "properties": {"name": "school"}},
                {"type": "Feature", "geometry": {"type": "Polygon",
                 "coordinates": [[[0,0],[2,0],[2,2],[0,2],[0,0]]]}, "properties": null}
            ]
        }"#;
        let fc: FeatureCollection = serde_json::from_str(raw).unwrap();
        assert_eq!(fc.features.len(), 2);
        assert_eq!(fc.features[0].id, Some(Value::from(7)));
        assert_eq!(fc.features[0].geometry, Some(Geometry::Point(Position::new(39.2, 38.6))));
        assert!(fc.features[1].properties.is_empty());
    }

    #[test]
    fn test_centroids() {
        let line = Geometry::LineString(vec![Position::new(0.0, 0.0), Position::new(4.0, 0.0)]);
        assert_eq!(line.centroid(), Some(Position::new(2.0, 0.0)));
        assert_eq!(Geometry::LineString(vec![]).centroid(), None);
    }

    #[test]
    fn test_polygon_centroid_is_area_weighted() {
        let poly = Geometry::Polygon(vec![square(0.0, 0.0, 2.0)]);
        let c = poly.centroid().unwrap();
        assert!((c.lon - 1.0).abs() < 1e-12);
        assert!((c.lat - 1.0).abs() < 1e-12);

        // Larger square dominates the multipolygon centroid.
        let multi = Geometry::MultiPolygon(vec![vec![square(0.0, 0.0, 1.0)], vec![square(10.0, 0.0, 3.0)]]);
        let c = multi.centroid().unwrap();
        assert!(c.lon > 9.0, "centroid lon {} should lean to the big square", c.lon);
    }

    #[test]
    fn test_contains_respects_holes() {
        let poly = Geometry::Polygon(vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)]);
        assert!(poly.contains(&Position::new(1.0, 1.0)));
        assert!(!poly.contains(&Position::new(5.0, 5.0)));
        assert!(!poly.contains(&Position::new(11.0, 1.0)));
    }

    #[test]
    fn test_distance_to_line_matches_meridian_arc() {
        // A north-south road one hundredth of a degree of longitude east of the site, at the equator.
        let road = Geometry::LineString(vec![Position::new(0.01, -1.0), Position::new(0.01, 1.0)]);
        let d = road.distance_m(&Position::new(0.0, 0.0)).unwrap();
        let expected = haversine_m(&Position::new(0.0, 0.0), &Position::new(0.01, 0.0));
        assert!((d - expected).abs() < 1.0, "got {d}, expected {expected}");
    }

    #[test]
    fn test_distance_to_polygon_edge_and_inside() {
        let park = Geometry::Polygon(vec![square(0.0, 0.0, 1.0)]);
        assert_eq!(park.distance_m(&Position::new(0.5, 0.5)), Some(0.0));
        let d = park.distance_m(&Position::new(0.5, 2.0)).unwrap();
        let expected = haversine_m(&Position::new(0.5, 2.0), &Position::new(0.5, 1.0));
        // The great-circle edge bows a few metres north of the parallel.
        assert!((d - expected).abs() < 10.0, "got {d}, expected {expected}");
    }

    #[test]
    fn test_empty_geometry_has_no_distance() {
        assert_eq!(Geometry::MultiLineString(vec![]).distance_m(&Position::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_m(&Position::new(39.0, 38.0), &Position::new(39.0, 39.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_short_position_rejected() {
        let err = serde_json::from_str::<Geometry>(r#"{"type":"Point","coordinates":[1.0]}"#);
        assert!(err.is_err());
    }
}
