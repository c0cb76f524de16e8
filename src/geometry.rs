//! Geometry model for the standard feature-collection document.
//!
//! Kind labels are kept verbatim: kinds this crate does not know about still parse
//! into [`GeometryKind::Other`] so they can be counted.

use crate::geodesic::{path_length, Coordinate};
use crate::{DataError, Result};
use geo::{BoundingRect, MultiPoint, Point, Rect};
use serde_json::Value;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
    Other(String),
}

impl GeometryKind {
    pub fn label(&self) -> &str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::LineString => "LineString",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
            GeometryKind::Other(label) => label,
        }
    }

    /// Whether geometries of this kind are measured.
    ///
    /// Deliberately a substring test on the label rather than a match on the known
    /// variants: "MultiLineString" and any unknown label containing "LineString"
    /// are measured too.
    pub fn is_line_shaped(&self) -> bool {
        self.label().contains("LineString")
    }
}

impl From<&str> for GeometryKind {
    fn from(label: &str) -> Self {
        match label {
            "Point" => GeometryKind::Point,
            "MultiPoint" => GeometryKind::MultiPoint,
            "LineString" => GeometryKind::LineString,
            "MultiLineString" => GeometryKind::MultiLineString,
            "Polygon" => GeometryKind::Polygon,
            "MultiPolygon" => GeometryKind::MultiPolygon,
            "GeometryCollection" => GeometryKind::GeometryCollection,
            other => GeometryKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Nested coordinate data of a geometry.
#[derive(Clone, Debug, PartialEq)]
pub enum Coordinates {
    Position(Coordinate),
    List(Vec<Coordinates>),
}

impl Coordinates {
    fn parse(value: &Value) -> std::result::Result<Self, String> {
        let items = value
            .as_array()
            .ok_or_else(|| format!("expected an array of coordinates, found {}", value))?;

        if let Some(Value::Number(_)) = items.first() {
            if items.len() < 2 {
                return Err(format!("position {} needs a longitude and a latitude", value));
            }
            let mut numbers = items.iter().take(2).map(Value::as_f64);
            return match (numbers.next().flatten(), numbers.next().flatten()) {
                (Some(lon), Some(lat)) => Ok(Coordinates::Position(Coordinate::new(lon, lat))),
                _ => Err(format!("position {} is not numeric", value)),
            };
        }

        items
            .iter()
            .map(Coordinates::parse)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Coordinates::List)
    }

    /// Every innermost list of positions, in document order.
    pub fn paths(&self) -> Vec<Vec<Coordinate>> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths(&self, paths: &mut Vec<Vec<Coordinate>>) {
        let items = match self {
            Coordinates::Position(_) => return,
            Coordinates::List(items) => items,
        };

        let positions: Vec<Coordinate> = items
            .iter()
            .filter_map(|item| match item {
                Coordinates::Position(coordinate) => Some(*coordinate),
                Coordinates::List(_) => None,
            })
            .collect();

        if !positions.is_empty() && positions.len() == items.len() {
            paths.push(positions);
        } else {
            for item in items {
                item.collect_paths(paths);
            }
        }
    }

    pub fn positions(&self) -> Vec<Coordinate> {
        match self {
            Coordinates::Position(coordinate) => vec![*coordinate],
            Coordinates::List(items) => items.iter().flat_map(Coordinates::positions).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub coordinates: Option<Coordinates>,
}

impl Geometry {
    pub fn new(kind: impl Into<GeometryKind>, coordinates: Option<Coordinates>) -> Self {
        Geometry {
            kind: kind.into(),
            coordinates,
        }
    }

    pub fn paths(&self) -> Vec<Vec<Coordinate>> {
        self.coordinates
            .as_ref()
            .map(Coordinates::paths)
            .unwrap_or_default()
    }

    /// Summed length of all paths of this geometry in kilometers.
    pub fn length_km(&self) -> f64 {
        self.paths().iter().map(|path| path_length(path)).sum()
    }

    fn parse(index: usize, feature: &Value) -> Result<Self> {
        let invalid =
            |reason: String| DataError::InvalidCollection(format!("feature {}: {}", index, reason));

        let feature = feature
            .as_object()
            .ok_or_else(|| invalid("not an object".to_string()))?;
        let geometry = match feature.get("geometry") {
            Some(Value::Object(geometry)) => geometry,
            Some(Value::Null) | None => return Err(invalid("missing geometry".to_string())),
            Some(other) => return Err(invalid(format!("geometry is not an object: {}", other))),
        };
        let kind = geometry
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("geometry type is missing or not a string".to_string()))?;
        let coordinates = match geometry.get("coordinates") {
            None | Some(Value::Null) => None,
            Some(value) => Some(Coordinates::parse(value).map_err(invalid)?),
        };

        Ok(Geometry::new(kind, coordinates))
    }
}

/// Ordered geometries of one feature-collection document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryCollection {
    pub geometries: Vec<Geometry>,
}

impl GeometryCollection {
    pub fn new(geometries: Vec<Geometry>) -> Self {
        GeometryCollection { geometries }
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let document: Value = serde_json::from_reader(reader)?;
        GeometryCollection::try_from(&document)
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Geometry> {
        self.geometries.iter()
    }

    /// Extent of every position in the collection, `None` if there is none.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        let points: MultiPoint<f64> = self
            .geometries
            .iter()
            .filter_map(|geometry| geometry.coordinates.as_ref())
            .flat_map(Coordinates::positions)
            .map(|position| Point::from(geo::Coord::from(position)))
            .collect();
        points.bounding_rect()
    }
}

impl TryFrom<&Value> for GeometryCollection {
    type Error = DataError;

    fn try_from(document: &Value) -> Result<Self> {
        let document = document.as_object().ok_or_else(|| {
            DataError::InvalidCollection("document is not a JSON object".to_string())
        })?;
        let features = document
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                DataError::InvalidCollection("missing \"features\" array".to_string())
            })?;

        let geometries = features
            .iter()
            .enumerate()
            .map(|(index, feature)| Geometry::parse(index, feature))
            .collect::<Result<Vec<_>>>()?;

        Ok(GeometryCollection { geometries })
    }
}

impl FromStr for GeometryCollection {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(s)?;
        GeometryCollection::try_from(&document)
    }
}

impl<'a> IntoIterator for &'a GeometryCollection {
    type Item = &'a Geometry;
    type IntoIter = std::slice::Iter<'a, Geometry>;

    fn into_iter(self) -> Self::IntoIter {
        self.geometries.iter()
    }
}
