//! GeoJSON types for drawn shapes and reference boundaries.
//!
//! The map's edit layer reports its content as a FeatureCollection and the
//! catchment boundary dataset is a FeatureCollection too. Only the geometry
//! kinds the dashboard draws or loads are modelled:
//! Point, LineString, Polygon and MultiPolygon.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bbox::BoundingBox;

/// A coordinate pair as [longitude, latitude].
pub type Position = [f64; 2];

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Features in insertion order; the last one is the most recently drawn.
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    /// Add a feature to the collection.
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// The most recently added feature.
    pub fn last_feature(&self) -> Option<&Feature> {
        self.features.last()
    }

    /// The most recently added feature, but only if its geometry is of `kind`.
    ///
    /// Recency wins: an older feature of the right kind is never picked up
    /// when a newer feature of another kind was drawn after it.
    pub fn last_of_kind(&self, kind: GeometryKind) -> Option<&Feature> {
        self.last_feature().filter(|f| f.kind() == Some(kind))
    }

    /// Find a feature by its identifier, falling back to a property lookup.
    pub fn find_by_id(&self, id: &str, id_property: Option<&str>) -> Option<&Feature> {
        self.features.iter().find(|f| f.identifier(id_property).as_deref() == Some(id))
    }

    /// Bounding box enclosing every feature geometry.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref().and_then(Geometry::bounds))
            .reduce(|a, b| a.union(&b))
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON feature identifier (string or number).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    Text(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{}", n),
            FeatureId::Text(s) => f.write_str(s),
        }
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Optional feature identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,

    /// The geometry of this feature (GeoJSON allows null).
    pub geometry: Option<Geometry>,

    /// Free-form properties.
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Feature {
    /// Create a feature wrapping a geometry, with no id and no properties.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            type_: "Feature".to_string(),
            id: None,
            geometry: Some(geometry),
            properties: serde_json::Map::new(),
        }
    }

    /// Set the feature ID.
    pub fn with_id(mut self, id: FeatureId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set a single property.
    pub fn with_property(mut self, key: &str, value: serde_json::Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    /// Kind of the geometry, read from its `type` field.
    pub fn kind(&self) -> Option<GeometryKind> {
        self.geometry.as_ref().map(Geometry::kind)
    }

    /// Identifier as a string: the feature id, or `id_property` when given.
    pub fn identifier(&self, id_property: Option<&str>) -> Option<String> {
        if let Some(prop) = id_property {
            return match self.properties.get(prop)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
        }
        self.id.as_ref().map(|id| id.to_string())
    }

    /// Numeric property value, if present.
    pub fn number_property(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(serde_json::Value::as_f64)
    }
}

/// The geometry kinds distinguished by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPolygon,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
        };
        f.write_str(name)
    }
}

/// GeoJSON geometry, tagged by its `type` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A point geometry.
    Point {
        /// Coordinates as [longitude, latitude].
        coordinates: Position,
    },

    /// A line string geometry.
    LineString {
        coordinates: Vec<Position>,
    },

    /// A polygon geometry.
    Polygon {
        /// Linear rings; the first is the exterior, the rest are holes.
        coordinates: Vec<Vec<Position>>,
    },

    /// A set of polygons.
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }

    pub fn line_string(coordinates: Vec<Position>) -> Self {
        Geometry::LineString { coordinates }
    }

    pub fn polygon(coordinates: Vec<Vec<Position>>) -> Self {
        Geometry::Polygon { coordinates }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point { .. } => GeometryKind::Point,
            Geometry::LineString { .. } => GeometryKind::LineString,
            Geometry::Polygon { .. } => GeometryKind::Polygon,
            Geometry::MultiPolygon { .. } => GeometryKind::MultiPolygon,
        }
    }

    /// Every position of the geometry, rings flattened.
    pub fn positions(&self) -> Vec<Position> {
        match self {
            Geometry::Point { coordinates } => vec![*coordinates],
            Geometry::LineString { coordinates } => coordinates.clone(),
            Geometry::Polygon { coordinates } => coordinates.iter().flatten().copied().collect(),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().copied().collect()
            }
        }
    }

    /// Polygons of the geometry; empty for points and lines.
    pub fn polygons(&self) -> Vec<&[Vec<Position>]> {
        match self {
            Geometry::Polygon { coordinates } => vec![coordinates.as_slice()],
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().map(|p| p.as_slice()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Bounding box of all positions.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let positions = self.positions();
        let first = positions.first()?;
        let init = BoundingBox::new(first[0], first[1], first[0], first[1]);
        Some(
            positions
                .iter()
                .fold(init, |bbox, p| bbox.expand_to(p[0], p[1])),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leaflet_draw_polygon() {
        let json = r#"{
            "type": "Feature",
            "properties": {"_leaflet_id": 42},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[146.3,-30.0],[146.4,-30.0],[146.4,-30.1],[146.3,-30.0]]]
            }
        }"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(feature.kind(), Some(GeometryKind::Polygon));
        assert_eq!(feature.number_property("_leaflet_id"), Some(42.0));
    }

    #[test]
    fn test_null_geometry() {
        let json = r#"{"type": "Feature", "geometry": null, "properties": {}}"#;
        let feature: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(feature.kind(), None);
    }

    #[test]
    fn test_feature_id_variants() {
        let numeric: Feature =
            serde_json::from_str(r#"{"type":"Feature","id":7,"geometry":null}"#).unwrap();
        let text: Feature =
            serde_json::from_str(r#"{"type":"Feature","id":"a7","geometry":null}"#).unwrap();
        assert_eq!(numeric.identifier(None).as_deref(), Some("7"));
        assert_eq!(text.identifier(None).as_deref(), Some("a7"));
    }

    #[test]
    fn test_geometry_bounds() {
        let geom = Geometry::line_string(vec![[146.0, -30.5], [147.0, -29.5], [146.5, -31.0]]);
        let bbox = geom.bounds().unwrap();
        assert_eq!(bbox.min_x, 146.0);
        assert_eq!(bbox.max_x, 147.0);
        assert_eq!(bbox.min_y, -31.0);
        assert_eq!(bbox.max_y, -29.5);
    }
}
