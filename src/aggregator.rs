//! Per-kind counts and line lengths of a geometry collection.

use crate::geometry::{Geometry, GeometryCollection};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of decimals every distance increment is rounded to.
pub const DISTANCE_PRECISION: i32 = 2;

/// Round a distance in kilometers to [`DISTANCE_PRECISION`] decimals.
pub fn round_distance(km: f64) -> f64 {
    let factor = 10f64.powi(DISTANCE_PRECISION);
    (km * factor).round() / factor
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregationResult {
    /// Kind label -> number of geometries with exactly that label.
    pub counts: BTreeMap<String, usize>,
    /// Kind label -> accumulated length in kilometers, line-shaped kinds only.
    pub distances: BTreeMap<String, f64>,
}

impl AggregationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one geometry and, if it is line-shaped, add its length.
    pub fn add(&mut self, geometry: &Geometry) {
        let label = geometry.kind.label();
        *self.counts.entry(label.to_string()).or_insert(0) += 1;

        if geometry.kind.is_line_shaped() {
            if geometry.coordinates.is_none() {
                tracing::warn!("{} without coordinates, counting it as zero length", label);
            }
            self.add_distance(label, geometry.length_km());
        }
    }

    /// Add `km`, rounded on its own, to the running total of `label`.
    ///
    /// The running total is never rounded again, so many small increments can sum
    /// to less than their unrounded total would round to.
    pub fn add_distance(&mut self, label: &str, km: f64) {
        *self.distances.entry(label.to_string()).or_insert(0.0) += round_distance(km);
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn distance(&self, label: &str) -> Option<f64> {
        self.distances.get(label).copied()
    }

    pub fn total_count(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Count every geometry by kind label and sum the lengths of line-shaped kinds.
///
/// Always starts from empty mappings; nothing is carried over between calls.
pub fn aggregate(collection: &GeometryCollection) -> AggregationResult {
    let mut result = AggregationResult::new();
    for geometry in collection {
        result.add(geometry);
    }

    for (label, count) in &result.counts {
        match result.distances.get(label) {
            Some(km) => tracing::debug!("{}: {} geometries, {:.2} km", label, count, km),
            None => tracing::debug!("{}: {} geometries", label, count),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesic::Coordinate;
    use crate::geometry::{Coordinates, GeometryKind};
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    fn line(kind: &str, coordinates: &[(f64, f64)]) -> Geometry {
        let positions = coordinates
            .iter()
            .map(|&c| Coordinates::Position(Coordinate::from(c)))
            .collect();
        Geometry::new(kind, Some(Coordinates::List(positions)))
    }

    fn point(lon: f64, lat: f64) -> Geometry {
        Geometry::new(
            GeometryKind::Point,
            Some(Coordinates::Position(Coordinate::new(lon, lat))),
        )
    }

    #[test]
    fn round_distance_keeps_two_decimals() {
        assert_eq!(round_distance(10.004), 10.0);
        assert_eq!(round_distance(5.001), 5.0);
        assert_eq!(round_distance(111.194_926), 111.19);
        assert_eq!(round_distance(0.0), 0.0);
    }

    #[test]
    fn points_only() {
        let collection = GeometryCollection::new(vec![
            point(0.0, 0.0),
            point(1.0, 1.0),
            point(2.0, 2.0),
        ]);
        let result = aggregate(&collection);
        assert_eq!(result.counts.len(), 1);
        assert_eq!(result.count("Point"), 3);
        assert!(result.distances.is_empty());
    }

    #[test]
    fn one_degree_line_string() {
        let collection = GeometryCollection::new(vec![line("LineString", &[(0.0, 0.0), (0.0, 1.0)])]);
        let result = aggregate(&collection);
        assert_eq!(result.count("LineString"), 1);
        assert_abs_diff_eq!(result.distance("LineString").unwrap(), 111.19, epsilon = 1e-9);
    }

    #[test]
    fn increments_are_rounded_before_accumulating() {
        let mut result = AggregationResult::new();
        result.add_distance("LineString", 10.004);
        result.add_distance("LineString", 5.001);
        assert_abs_diff_eq!(result.distance("LineString").unwrap(), 15.0, epsilon = 1e-9);

        // 3 x 0.004 rounds to 0.00 per step, while the plain sum 0.012 would round to 0.01
        let mut result = AggregationResult::new();
        for _ in 0..3 {
            result.add_distance("LineString", 0.004);
        }
        assert_eq!(result.distance("LineString"), Some(0.0));
    }

    #[test]
    fn short_lines_vanish_through_per_step_rounding() {
        // each line is about 4.4 m long
        let collection = GeometryCollection::new(vec![
            line("LineString", &[(0.0, 0.0), (0.0, 0.00004)]),
            line("LineString", &[(1.0, 0.0), (1.0, 0.00004)]),
            line("LineString", &[(2.0, 0.0), (2.0, 0.00004)]),
        ]);
        let unrounded: f64 = collection.iter().map(Geometry::length_km).sum();
        assert_eq!(round_distance(unrounded), 0.01);

        let result = aggregate(&collection);
        assert_eq!(result.count("LineString"), 3);
        assert_eq!(result.distance("LineString"), Some(0.0));
    }

    #[test]
    fn polygon_is_counted_but_not_measured() {
        let ring = vec![
            Coordinates::Position(Coordinate::new(0.0, 0.0)),
            Coordinates::Position(Coordinate::new(1.0, 0.0)),
            Coordinates::Position(Coordinate::new(1.0, 1.0)),
            Coordinates::Position(Coordinate::new(0.0, 0.0)),
        ];
        let polygon = Geometry::new("Polygon", Some(Coordinates::List(vec![Coordinates::List(ring)])));
        let result = aggregate(&GeometryCollection::new(vec![polygon]));
        assert_eq!(result.count("Polygon"), 1);
        assert!(result.distances.is_empty());
    }

    #[test]
    fn multi_line_string_is_measured_across_all_lines() {
        let collection: GeometryCollection = json!({"features": [{"geometry": {
            "type": "MultiLineString",
            "coordinates": [[[0.0, 0.0], [0.0, 1.0]], [[10.0, 0.0], [10.0, 1.0]]]
        }}]})
        .to_string()
        .parse()
        .unwrap();

        let result = aggregate(&collection);
        assert_eq!(result.count("MultiLineString"), 1);
        assert_abs_diff_eq!(result.distance("MultiLineString").unwrap(), 222.39, epsilon = 1e-9);
        assert_eq!(result.distance("LineString"), None);
    }

    #[test]
    fn unknown_kinds_are_counted_verbatim() {
        let collection = GeometryCollection::new(vec![
            Geometry::new("Track", None),
            Geometry::new("Track", None),
            line("gx:LineStringTrack", &[(0.0, 0.0), (0.0, 1.0)]),
        ]);
        let result = aggregate(&collection);
        assert_eq!(result.count("Track"), 2);
        assert_eq!(result.distance("Track"), None);
        assert_abs_diff_eq!(result.distance("gx:LineStringTrack").unwrap(), 111.19, epsilon = 1e-9);
    }

    #[test]
    fn line_string_without_coordinates_is_zero_length() {
        let result = aggregate(&GeometryCollection::new(vec![Geometry::new("LineString", None)]));
        assert_eq!(result.count("LineString"), 1);
        assert_eq!(result.distance("LineString"), Some(0.0));
    }

    #[test]
    fn order_does_not_matter() {
        let mut geometries = vec![
            point(3.0, 4.0),
            line("LineString", &[(9.0, 50.0), (9.0, 51.0), (10.0, 51.0)]),
            line("LineString", &[(0.0, 0.0), (0.5, 0.5)]),
            Geometry::new("Polygon", None),
            line("MultiLineString", &[(1.0, 1.0), (2.0, 2.0)]),
        ];
        let forward = aggregate(&GeometryCollection::new(geometries.clone()));
        geometries.reverse();
        let backward = aggregate(&GeometryCollection::new(geometries.clone()));
        geometries.rotate_left(2);
        let rotated = aggregate(&GeometryCollection::new(geometries));

        assert_eq!(forward.counts, backward.counts);
        assert_eq!(forward.counts, rotated.counts);
        for (label, km) in &forward.distances {
            assert_abs_diff_eq!(*km, backward.distances[label], epsilon = 1e-9);
            assert_abs_diff_eq!(*km, rotated.distances[label], epsilon = 1e-9);
        }
    }

    #[test]
    fn every_call_starts_fresh() {
        let collection = GeometryCollection::new(vec![point(0.0, 0.0)]);
        assert_eq!(aggregate(&collection), aggregate(&collection));
        assert_eq!(aggregate(&collection).total_count(), 1);
        assert_eq!(aggregate(&GeometryCollection::default()), AggregationResult::new());
    }
}
