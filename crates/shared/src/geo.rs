//! Geospatial helpers for zone containment and movement detection.

use geo::{Contains, HaversineDistance, LineString, Point, Polygon};

/// Great-circle distance in meters between two WGS84 coordinates.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = Point::new(lon1, lat1);
    let b = Point::new(lon2, lat2);
    a.haversine_distance(&b)
}

/// Whether a point lies within a circle given as center + radius in meters.
pub fn within_radius_m(lat: f64, lon: f64, center_lat: f64, center_lon: f64, radius_m: f64) -> bool {
    haversine_distance_m(lat, lon, center_lat, center_lon) <= radius_m
}

/// Whether a point lies inside a polygon given as an ordered (lat, lon)
/// vertex list. Uses the geo crate's ray-casting containment test; the
/// polygon is closed implicitly.
pub fn point_in_polygon(lat: f64, lon: f64, vertices: &[(f64, f64)]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let ring: Vec<(f64, f64)> = vertices.iter().map(|&(vlat, vlon)| (vlon, vlat)).collect();
    let polygon = Polygon::new(LineString::from(ring), vec![]);
    polygon.contains(&Point::new(lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance_zero() {
        let d = haversine_distance_m(48.1486, 17.1077, 48.1486, 17.1077);
        assert!(d < 0.001);
    }

    #[test]
    fn test_haversine_distance_known_pair() {
        // Bratislava -> Vienna is roughly 55 km.
        let d = haversine_distance_m(48.1486, 17.1077, 48.2082, 16.3738);
        assert!(d > 54_000.0 && d < 57_000.0, "got {}", d);
    }

    #[test]
    fn test_haversine_distance_small_offset() {
        // ~0.00045 degrees of latitude is close to 50 m.
        let d = haversine_distance_m(48.0, 17.0, 48.00045, 17.0);
        assert!(d > 45.0 && d < 55.0, "got {}", d);
    }

    #[test]
    fn test_within_radius() {
        assert!(within_radius_m(48.0004, 17.0, 48.0, 17.0, 100.0));
        assert!(!within_radius_m(48.002, 17.0, 48.0, 17.0, 100.0));
    }

    #[test]
    fn test_point_in_polygon_square() {
        let square = vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
        assert!(point_in_polygon(0.5, 0.5, &square));
        assert!(!point_in_polygon(1.5, 0.5, &square));
        assert!(!point_in_polygon(-0.5, 0.5, &square));
    }

    #[test]
    fn test_point_in_polygon_concave() {
        // L-shape; the notch at the top-right is outside.
        let shape = vec![
            (0.0, 0.0),
            (0.0, 2.0),
            (1.0, 2.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (2.0, 0.0),
        ];
        assert!(point_in_polygon(0.5, 1.5, &shape));
        assert!(!point_in_polygon(1.5, 1.5, &shape));
    }

    #[test]
    fn test_point_in_polygon_degenerate() {
        assert!(!point_in_polygon(0.5, 0.5, &[(0.0, 0.0), (1.0, 1.0)]));
        assert!(!point_in_polygon(0.5, 0.5, &[]));
    }
}
