//! Great-circle distances on a spherical earth.

/// Mean earth radius used for every distance, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A (longitude, latitude) pair in decimal degrees. Altitude is never carried.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Coordinate { lon, lat }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from(coordinates: (f64, f64)) -> Self {
        Coordinate {
            lon: coordinates.0,
            lat: coordinates.1,
        }
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    fn from(coord: geo::Coord<f64>) -> Self {
        Coordinate {
            lon: coord.x,
            lat: coord.y,
        }
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(coordinate: Coordinate) -> Self {
        geo::Coord {
            x: coordinate.lon,
            y: coordinate.lat,
        }
    }
}

fn to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// Haversine distance between two coordinates in kilometers.
///
/// Total over all finite inputs; out-of-range degrees just produce whatever the
/// formula yields.
pub fn point_distance(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = to_rad(b.lat - a.lat);
    let d_lon = to_rad(b.lon - a.lon);
    let h = (d_lat / 2.0).sin().powi(2)
        + to_rad(a.lat).cos() * to_rad(b.lat).cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Sum of `point_distance` over consecutive pairs of `path`, in kilometers.
///
/// Paths with fewer than two coordinates have zero length.
pub fn path_length(path: &[Coordinate]) -> f64 {
    path.windows(2)
        .map(|pair| point_distance(pair[0], pair[1]))
        .sum()
}
