//! Geometry statistics for KML and GeoJSON track files.
//!
//! A file is read into a feature-collection document, every feature's geometry is
//! classified by its kind label, and two mappings are produced: how many geometries
//! of each kind exist, and the accumulated great-circle length of line-shaped kinds.

use std::path::Path;

pub mod aggregator;
pub mod geodesic;
pub mod geometry;
pub mod loader;
pub mod report;

pub use aggregator::{aggregate, AggregationResult};
pub use geodesic::{path_length, point_distance, Coordinate};
pub use geometry::{Coordinates, Geometry, GeometryCollection, GeometryKind};
pub use loader::{InputFormat, LoadedDocument};
pub use report::FileReport;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("invalid geometry collection: {0}")]
    InvalidCollection(String),

    #[error("invalid gx:Track: {0}")]
    InvalidTrack(String),

    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("KML error: {0}")]
    Kml(#[from] kml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;

/// Load one file and aggregate its geometries.
///
/// `format` of `None` picks the format from the file extension.
pub fn process_file(path: &Path, format: Option<InputFormat>) -> Result<FileReport> {
    let format = match format {
        Some(format) => format,
        None => InputFormat::from_path(path)?,
    };
    let loaded = loader::load_document(path, format)?;
    Ok(FileReport::new(path, &loaded.collection))
}
