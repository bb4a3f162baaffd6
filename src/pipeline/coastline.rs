//! Closes clipped coastline chains into water polygons.
//!
//! OSM coastlines keep land on the left of their direction of travel, so the
//! probe point used to tell water from land is offset to the right.

use log::{debug, trace};

use crate::data::{
    feature::{Feature, FeatureType},
    Bounds, Coordinate, Tags,
};
use crate::geometry::{interpolate, is_closed, point_in_polygon, Edge};

/// Probe offset as a fraction of the tile's smaller span.
pub const SAMPLE_OFFSET_FRACTION: f64 = 0.003;
/// "Already on the boundary" tolerance as a fraction of the tile's larger span.
pub const BOUNDARY_EPSILON_FRACTION: f64 = 0.001;
const MAX_EDGE_TRANSITIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Anchor {
    point: Coordinate,
    edge: Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    /// Edge reached when leaving `edge`, with the corner crossed on the way.
    fn next(&self, edge: Edge, bounds: &Bounds) -> (Edge, Coordinate) {
        match (self, edge) {
            (Rotation::Clockwise, Edge::North) => (Edge::East, bounds.north_east()),
            (Rotation::Clockwise, Edge::East) => (Edge::South, bounds.south_east()),
            (Rotation::Clockwise, Edge::South) => (Edge::West, bounds.south_west()),
            (Rotation::Clockwise, Edge::West) => (Edge::North, bounds.north_west()),
            (Rotation::CounterClockwise, Edge::North) => (Edge::West, bounds.north_west()),
            (Rotation::CounterClockwise, Edge::West) => (Edge::South, bounds.south_west()),
            (Rotation::CounterClockwise, Edge::South) => (Edge::East, bounds.south_east()),
            (Rotation::CounterClockwise, Edge::East) => (Edge::North, bounds.north_east()),
        }
    }

    /// Whether `to` lies ahead of `from` when travelling along `edge`.
    fn is_ahead(&self, from: &Coordinate, to: &Coordinate, edge: Edge) -> bool {
        let clockwise_ahead = match edge {
            Edge::North => to.lng >= from.lng,
            Edge::East => to.lat <= from.lat,
            Edge::South => to.lng <= from.lng,
            Edge::West => to.lat >= from.lat,
        };
        match self {
            Rotation::Clockwise => clockwise_ahead,
            Rotation::CounterClockwise => !clockwise_ahead || from == to,
        }
    }
}

/// Point offset to the right of the segment nearest the middle of `chain`.
pub fn seaward_sample_point(chain: &[Coordinate], bounds: &Bounds) -> Option<Coordinate> {
    if chain.len() < 2 {
        return None;
    }
    let offset = SAMPLE_OFFSET_FRACTION * bounds.min_span();
    let middle = (chain.len() - 1) / 2;
    let segments = (middle..chain.len() - 1).chain((0..middle).rev());
    for i in segments {
        let (a, b) = (&chain[i], &chain[i + 1]);
        let d_lat = b.lat - a.lat;
        let d_lng = b.lng - a.lng;
        let length = d_lat.hypot(d_lng);
        if length == 0.0 {
            continue;
        }
        let midpoint = interpolate(a, b, 0.5);
        return Some(Coordinate::new(
            midpoint.lat - d_lng / length * offset,
            midpoint.lng + d_lat / length * offset,
        ));
    }
    None
}

fn nearest_edge(point: &Coordinate, bounds: &Bounds) -> (Edge, f64) {
    Edge::CLIP_ORDER
        .iter()
        .map(|edge| {
            let distance = if edge.is_horizontal() {
                (point.lat - edge.bound(bounds)).abs()
            } else {
                (point.lng - edge.bound(bounds)).abs()
            };
            (*edge, distance)
        })
        .fold((Edge::North, f64::INFINITY), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
}

/// Perpendicular projection onto one edge, clamped to the tile.
fn snap_to_edge(point: &Coordinate, edge: Edge, bounds: &Bounds) -> Coordinate {
    if edge.is_horizontal() {
        Coordinate::new(edge.bound(bounds), point.lng.clamp(bounds.west, bounds.east))
    } else {
        Coordinate::new(point.lat.clamp(bounds.south, bounds.north), edge.bound(bounds))
    }
}

/// Extends the ray `from -> through` to the first boundary line it meets.
fn ray_cast(from: &Coordinate, through: &Coordinate, bounds: &Bounds) -> Option<Anchor> {
    let d_lat = through.lat - from.lat;
    let d_lng = through.lng - from.lng;
    let mut nearest: Option<(f64, Edge)> = None;
    for edge in Edge::CLIP_ORDER {
        let delta = if edge.is_horizontal() { d_lat } else { d_lng };
        if delta == 0.0 {
            continue;
        }
        let origin = if edge.is_horizontal() { from.lat } else { from.lng };
        let t = (edge.bound(bounds) - origin) / delta;
        if t > 0.0 && nearest.map_or(true, |(best, _)| t < best) {
            nearest = Some((t, edge));
        }
    }
    let (t, edge) = nearest?;
    let hit = Coordinate::new(from.lat + t * d_lat, from.lng + t * d_lng);
    Some(Anchor { point: snap_to_edge(&hit, edge, bounds), edge })
}

fn boundary_anchor(endpoint: &Coordinate, adjacent: &Coordinate, bounds: &Bounds) -> Option<Anchor> {
    let epsilon = BOUNDARY_EPSILON_FRACTION * bounds.max_span();
    let (edge, distance) = nearest_edge(endpoint, bounds);
    if distance <= epsilon {
        return Some(Anchor { point: snap_to_edge(endpoint, edge, bounds), edge });
    }
    ray_cast(adjacent, endpoint, bounds)
}

/// Tile corners passed when walking the boundary from `from` to `to`.
fn boundary_walk(from: &Anchor, to: &Anchor, bounds: &Bounds, rotation: Rotation) -> Vec<Coordinate> {
    let mut corners = Vec::new();
    if from.edge == to.edge && rotation.is_ahead(&from.point, &to.point, from.edge) {
        return corners;
    }
    let mut edge = from.edge;
    for _ in 0..MAX_EDGE_TRANSITIONS {
        let (next, corner) = rotation.next(edge, bounds);
        corners.push(corner);
        edge = next;
        if edge == to.edge {
            break;
        }
    }
    corners
}

fn candidate_ring(chain: &[Coordinate], start: &Anchor, end: &Anchor, bounds: &Bounds, rotation: Rotation) -> Vec<Coordinate> {
    let mut ring = chain.to_vec();
    ring.push(end.point);
    ring.extend(boundary_walk(end, start, bounds, rotation));
    ring.push(start.point);
    ring.push(chain[0]);
    ring.dedup();
    ring
}

fn water_tags() -> Tags {
    let mut tags = Tags::new();
    tags.insert("natural".to_string(), "water".to_string());
    tags.insert("water".to_string(), "sea".to_string());
    tags
}

fn water_from_closed(coastline: &Feature, sample: &Coordinate, bounds: &Bounds) -> Feature {
    let id = format!("{}-water", coastline.id);
    if point_in_polygon(sample, &coastline.geometry) {
        Feature::new(id, FeatureType::Water, coastline.geometry.clone(), water_tags())
    } else {
        Feature::new(id, FeatureType::Water, bounds.to_ring(), water_tags())
            .with_holes(vec![coastline.geometry.clone()])
    }
}

fn water_from_open(coastline: &Feature, sample: &Coordinate, bounds: &Bounds) -> Option<Feature> {
    let chain = &coastline.geometry;
    let n = chain.len();
    let Some(start) = boundary_anchor(&chain[0], &chain[1], bounds) else {
        debug!(feature_id = coastline.id.as_str(); "Coastline start has no boundary crossing");
        return None;
    };
    let Some(end) = boundary_anchor(&chain[n - 1], &chain[n - 2], bounds) else {
        debug!(feature_id = coastline.id.as_str(); "Coastline end has no boundary crossing");
        return None;
    };

    for rotation in [Rotation::Clockwise, Rotation::CounterClockwise] {
        let ring = candidate_ring(chain, &start, &end, bounds, rotation);
        if ring.len() <= 3 {
            continue;
        }
        if point_in_polygon(sample, &ring) {
            return Some(Feature::new(format!("{}-water", coastline.id), FeatureType::Water, ring, water_tags()));
        }
    }
    trace!(feature_id = coastline.id.as_str(); "No candidate ring holds the seaward sample");
    None
}

/// Water polygons for every clipped coastline in `features`. The coastlines
/// themselves are left untouched.
pub fn reconstruct_water(features: &[Feature], bounds: &Bounds) -> Vec<Feature> {
    let mut water = Vec::new();
    for coastline in features.iter().filter(|f| f.feature_type == FeatureType::Coastline) {
        if coastline.geometry.len() < 2 {
            continue;
        }
        let Some(sample) = seaward_sample_point(&coastline.geometry, bounds) else {
            continue;
        };
        if is_closed(&coastline.geometry) {
            water.push(water_from_closed(coastline, &sample, bounds));
        } else if let Some(feature) = water_from_open(coastline, &sample, bounds) {
            water.push(feature);
        }
    }
    debug!(water = water.len(); "Reconstructed water from coastlines");
    water
}
