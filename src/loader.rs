use crate::geometry::GeometryCollection;
use crate::{DataError, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, Polygon};
use geojson::{Feature, FeatureCollection, Geometry as GeoJsonGeometry, Value as GeoJsonValue};
use kml::types::{Element, Geometry as KmlGeometry};
use kml::Kml;
use std::fs::{create_dir_all, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    GeoJson,
    Kml,
}

impl InputFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());
        match extension.as_deref() {
            Some("kml") => Ok(InputFormat::Kml),
            Some("geojson") | Some("json") => Ok(InputFormat::GeoJson),
            _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A feature-collection document together with the geometries read from it.
#[derive(Debug)]
pub struct LoadedDocument {
    pub document: serde_json::Value,
    pub collection: GeometryCollection,
}

impl LoadedDocument {
    pub fn from_document(document: serde_json::Value) -> Result<Self> {
        let collection = GeometryCollection::try_from(&document)?;
        Ok(LoadedDocument {
            document,
            collection,
        })
    }
}

pub fn load_document(path: &Path, format: InputFormat) -> Result<LoadedDocument> {
    tracing::info!("Loading file: {}", path.display());
    let loaded = match format {
        InputFormat::GeoJson => load_geojson(path)?,
        InputFormat::Kml => load_kml(path)?,
    };
    tracing::info!(
        "Found {} features in {}",
        loaded.collection.len(),
        path.display()
    );
    Ok(loaded)
}

pub fn load_geojson(path: &Path) -> Result<LoadedDocument> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let document: serde_json::Value = serde_json::from_reader(reader)?;
    LoadedDocument::from_document(document)
}

pub fn load_kml(path: &Path) -> Result<LoadedDocument> {
    let content = std::fs::read_to_string(path)?;
    let feature_collection = kml_to_feature_collection(&content)?;
    LoadedDocument::from_document(serde_json::to_value(&feature_collection)?)
}

/// Convert a KML document into a feature collection with one feature per geometry.
///
/// `gx:Track` and `gx:MultiTrack` extension elements become a LineString and a
/// MultiLineString, the same way placemark geometries do.
pub fn kml_to_feature_collection(content: &str) -> Result<FeatureCollection> {
    let kml: Kml<f64> = content.parse()?;
    let mut geometries = Vec::new();
    collect_kml_geometries(kml, &mut geometries)?;
    tracing::debug!("KML document holds {} geometries", geometries.len());

    let features = geometries
        .iter()
        .map(|geometry| Feature {
            bbox: None,
            geometry: Some(GeoJsonGeometry::new(to_geojson_value(geometry))),
            id: None,
            properties: Some(serde_json::Map::new()),
            foreign_members: None,
        })
        .collect();

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn collect_kml_geometries(kml: Kml<f64>, geometries: &mut Vec<Geometry<f64>>) -> Result<()> {
    match kml {
        Kml::KmlDocument(document) => {
            for element in document.elements {
                collect_kml_geometries(element, geometries)?;
            }
        }
        Kml::Document { elements, .. } | Kml::Folder { elements, .. } => {
            for element in elements {
                collect_kml_geometries(element, geometries)?;
            }
        }
        Kml::Placemark(placemark) => {
            let name = placemark.name.as_deref().unwrap_or("unnamed");
            match placemark.geometry {
                Some(KmlGeometry::Element(element)) => {
                    tracing::warn!("Skipping <{}> geometry of placemark {}", element.name, name);
                }
                Some(geometry) => geometries.push(Geometry::try_from(geometry)?),
                None => {}
            }
            for child in &placemark.children {
                match track_geometry(child)? {
                    Some(track) => geometries.push(track),
                    None => tracing::trace!("Ignoring <{}> of placemark {}", child.name, name),
                }
            }
        }
        Kml::Element(element) => match track_geometry(&element)? {
            Some(track) => geometries.push(track),
            None => tracing::debug!("Skipping <{}> element", element.name),
        },
        kml @ (Kml::Point(_)
        | Kml::LineString(_)
        | Kml::LinearRing(_)
        | Kml::Polygon(_)
        | Kml::MultiGeometry(_)) => {
            geometries.extend(Vec::<Geometry<f64>>::try_from(kml)?);
        }
        _ => {}
    }
    Ok(())
}

/// Geometry of a `gx:Track` or `gx:MultiTrack` element, `None` for any other element.
fn track_geometry(element: &Element) -> Result<Option<Geometry<f64>>> {
    match element.name.as_str() {
        "Track" => Ok(Some(Geometry::LineString(track_line(element)?))),
        "MultiTrack" => {
            let lines = element
                .children
                .iter()
                .filter(|child| child.name == "Track")
                .map(track_line)
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(Geometry::MultiLineString(MultiLineString(lines))))
        }
        _ => Ok(None),
    }
}

/// Line through the `gx:coord` children of a track, each "lon lat [alt]".
fn track_line(track: &Element) -> Result<LineString<f64>> {
    let coords = track
        .children
        .iter()
        .filter(|child| child.name == "coord")
        .map(|child| {
            let text = child.content.as_deref().unwrap_or("");
            let mut values = text.split_whitespace().map(str::parse::<f64>);
            match (values.next(), values.next()) {
                (Some(Ok(x)), Some(Ok(y))) => Ok(Coord { x, y }),
                _ => Err(DataError::InvalidTrack(format!("bad gx:coord {:?}", text))),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString(coords))
}

fn position(coord: &Coord<f64>) -> Vec<f64> {
    vec![coord.x, coord.y]
}

fn line_positions(line: &LineString<f64>) -> Vec<Vec<f64>> {
    line.0.iter().map(position).collect()
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    let mut rings = vec![line_positions(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(line_positions));
    rings
}

fn to_geojson_value(geometry: &Geometry<f64>) -> GeoJsonValue {
    match geometry {
        Geometry::Point(point) => GeoJsonValue::Point(position(&point.0)),
        Geometry::Line(line) => {
            GeoJsonValue::LineString(vec![position(&line.start), position(&line.end)])
        }
        Geometry::LineString(line) => GeoJsonValue::LineString(line_positions(line)),
        Geometry::Polygon(polygon) => GeoJsonValue::Polygon(polygon_rings(polygon)),
        Geometry::MultiPoint(points) => {
            GeoJsonValue::MultiPoint(points.0.iter().map(|p| position(&p.0)).collect())
        }
        Geometry::MultiLineString(lines) => {
            GeoJsonValue::MultiLineString(lines.0.iter().map(line_positions).collect())
        }
        Geometry::MultiPolygon(polygons) => {
            GeoJsonValue::MultiPolygon(polygons.0.iter().map(polygon_rings).collect())
        }
        Geometry::GeometryCollection(collection) => GeoJsonValue::GeometryCollection(
            collection
                .0
                .iter()
                .map(|g| GeoJsonGeometry::new(to_geojson_value(g)))
                .collect(),
        ),
        Geometry::Rect(rect) => GeoJsonValue::Polygon(polygon_rings(&rect.to_polygon())),
        Geometry::Triangle(triangle) => {
            GeoJsonValue::Polygon(polygon_rings(&triangle.to_polygon()))
        }
    }
}

/// Write the loaded document to `<output_dir>/<file stem>.geojson`.
pub fn export_document(
    loaded: &LoadedDocument,
    output_dir: &Path,
    original_file: &Path,
) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let file_stem = original_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    let output_path = output_dir.join(format!("{}.geojson", file_stem));
    let file = File::create(&output_path)?;
    serde_json::to_writer_pretty(file, &loaded.document)?;
    tracing::info!("Written {}", output_path.display());

    Ok(output_path)
}
