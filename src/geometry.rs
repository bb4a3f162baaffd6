//! Planar primitives over lat/lng degrees, plus the few spherical helpers the
//! pipeline needs for metric spacing.

use crate::data::{Bounds, Coordinate};

pub mod clip;
pub mod ring_assembler;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// One side of the tile rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    North,
    South,
    East,
    West,
}

impl Edge {
    /// Order in which the clippers visit the edges.
    pub const CLIP_ORDER: [Edge; 4] = [Edge::North, Edge::South, Edge::East, Edge::West];

    /// Value of the bound this edge lies on.
    pub fn bound(&self, bounds: &Bounds) -> f64 {
        match self {
            Edge::North => bounds.north,
            Edge::South => bounds.south,
            Edge::East => bounds.east,
            Edge::West => bounds.west,
        }
    }

    /// True for edges of constant latitude.
    pub fn is_horizontal(&self) -> bool {
        matches!(self, Edge::North | Edge::South)
    }
}

pub fn half_plane_contains(point: &Coordinate, bounds: &Bounds, edge: Edge) -> bool {
    match edge {
        Edge::North => point.lat <= bounds.north,
        Edge::South => point.lat >= bounds.south,
        Edge::East => point.lng <= bounds.east,
        Edge::West => point.lng >= bounds.west,
    }
}

/// Where segment `a -> b` meets the boundary line of `edge`. The result always
/// lies exactly on that line; a segment parallel to it keeps `a`'s other coordinate.
pub fn boundary_intersection(a: &Coordinate, b: &Coordinate, bounds: &Bounds, edge: Edge) -> Coordinate {
    let bound = edge.bound(bounds);
    if edge.is_horizontal() {
        let d_lat = b.lat - a.lat;
        if d_lat == 0.0 {
            return Coordinate::new(bound, a.lng);
        }
        let t = (bound - a.lat) / d_lat;
        Coordinate::new(bound, a.lng + t * (b.lng - a.lng))
    } else {
        let d_lng = b.lng - a.lng;
        if d_lng == 0.0 {
            return Coordinate::new(a.lat, bound);
        }
        let t = (bound - a.lng) / d_lng;
        Coordinate::new(a.lat + t * (b.lat - a.lat), bound)
    }
}

/// Even-odd crossing test. Works for open and closed rings alike.
pub fn point_in_polygon(point: &Coordinate, ring: &[Coordinate]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let pi = &ring[i];
        let pj = &ring[j];
        if (pi.lat > point.lat) != (pj.lat > point.lat) {
            let crossing_lng = pi.lng + (point.lat - pi.lat) / (pj.lat - pi.lat) * (pj.lng - pi.lng);
            if point.lng < crossing_lng {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Closed means first equals last with more than two points.
pub fn is_closed(chain: &[Coordinate]) -> bool {
    chain.len() > 2 && chain.first() == chain.last()
}

/// Great-circle distance in meters.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

pub fn interpolate(a: &Coordinate, b: &Coordinate, t: f64) -> Coordinate {
    Coordinate::new(a.lat + (b.lat - a.lat) * t, a.lng + (b.lng - a.lng) * t)
}

/// Shoelace area in square meters of `ring` projected equirectangularly at `ref_lat`.
pub fn planar_area_m2(ring: &[Coordinate], ref_lat: f64) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let x_scale = METERS_PER_DEGREE * ref_lat.to_radians().cos();
    let y_scale = METERS_PER_DEGREE;
    let mut twice_area = 0.0;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].lng * x_scale, ring[i].lat * y_scale);
        let (xj, yj) = (ring[j].lng * x_scale, ring[j].lat * y_scale);
        twice_area += xj * yi - xi * yj;
        j = i;
    }
    (twice_area / 2.0).abs()
}

/// Lat/lng bounding box of a non-empty coordinate list.
pub fn bounding_box(points: &[Coordinate]) -> Option<Bounds> {
    let first = points.first()?;
    let mut bounds = Bounds::new(first.lat, first.lat, first.lng, first.lng);
    for point in &points[1..] {
        bounds.north = bounds.north.max(point.lat);
        bounds.south = bounds.south.min(point.lat);
        bounds.east = bounds.east.max(point.lng);
        bounds.west = bounds.west.min(point.lng);
    }
    Some(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> Bounds {
        Bounds::new(1.0, 0.0, 1.0, 0.0)
    }

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(0.0, 0.0),
        ]
    }

    #[test]
    fn test_half_plane_contains_is_exact() {
        let bounds = unit_bounds();
        assert!(half_plane_contains(&Coordinate::new(1.0, 5.0), &bounds, Edge::North));
        assert!(!half_plane_contains(&Coordinate::new(1.0 + 1e-12, 5.0), &bounds, Edge::North));
        assert!(half_plane_contains(&Coordinate::new(-3.0, 0.0), &bounds, Edge::West));
        assert!(!half_plane_contains(&Coordinate::new(0.5, 1.5), &bounds, Edge::East));
        assert!(!half_plane_contains(&Coordinate::new(-0.5, 0.5), &bounds, Edge::South));
    }

    #[test]
    fn test_boundary_intersection_interpolates() {
        let bounds = unit_bounds();
        let hit = boundary_intersection(
            &Coordinate::new(0.5, 0.5),
            &Coordinate::new(0.5, 1.5),
            &bounds,
            Edge::East,
        );
        assert_eq!(hit, Coordinate::new(0.5, 1.0));

        let hit = boundary_intersection(
            &Coordinate::new(0.0, 0.0),
            &Coordinate::new(2.0, 1.0),
            &bounds,
            Edge::North,
        );
        assert_eq!(hit.lat, 1.0);
        assert!((hit.lng - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_intersection_parallel_keeps_a() {
        let bounds = unit_bounds();
        let hit = boundary_intersection(
            &Coordinate::new(2.0, 0.25),
            &Coordinate::new(2.0, 0.75),
            &bounds,
            Edge::North,
        );
        assert_eq!(hit, Coordinate::new(1.0, 0.25));
    }

    #[test]
    fn test_point_in_polygon() {
        let ring = square();
        assert!(point_in_polygon(&Coordinate::new(0.5, 0.5), &ring));
        assert!(!point_in_polygon(&Coordinate::new(1.5, 0.5), &ring));
        assert!(!point_in_polygon(&Coordinate::new(0.5, 0.5), &ring[..2]));
    }

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        let d = haversine_distance(&Coordinate::new(0.0, 0.0), &Coordinate::new(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 1.0);
    }

    #[test]
    fn test_planar_area_of_small_square() {
        let side = 0.001;
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, side),
            Coordinate::new(side, side),
            Coordinate::new(side, 0.0),
            Coordinate::new(0.0, 0.0),
        ];
        let expected = (side * METERS_PER_DEGREE).powi(2);
        assert!((planar_area_m2(&ring, 0.0) - expected).abs() < 1e-6 * expected);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = bounding_box(&square()).unwrap();
        assert_eq!(bbox, unit_bounds());
        assert!(bounding_box(&[]).is_none());
    }
}
