//! Clipping of rings and open chains against the tile rectangle.

use crate::data::{feature::Ring, Bounds, Coordinate};

use super::{boundary_intersection, half_plane_contains, is_closed, Edge};

/// Result of clipping an outer ring together with its holes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedPolygon {
    pub outer: Ring,
    pub holes: Vec<Ring>,
}

/// Sutherland-Hodgman clip of a single ring. The ring is treated as a vertex
/// cycle and returned closed, or `None` when fewer than 3 vertices survive.
pub fn clip_ring(ring: &[Coordinate], bounds: &Bounds) -> Option<Ring> {
    let mut vertices: Vec<Coordinate> = if is_closed(ring) {
        ring[..ring.len() - 1].to_vec()
    } else {
        ring.to_vec()
    };

    for edge in Edge::CLIP_ORDER {
        if vertices.is_empty() {
            break;
        }
        vertices = clip_ring_at_edge(&vertices, bounds, edge);
    }

    vertices.dedup();
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    if vertices.len() < 3 {
        return None;
    }
    vertices.push(vertices[0]);
    Some(vertices)
}

fn clip_ring_at_edge(vertices: &[Coordinate], bounds: &Bounds, edge: Edge) -> Vec<Coordinate> {
    let mut clipped = Vec::with_capacity(vertices.len() + 2);
    let mut previous = vertices[vertices.len() - 1];
    let mut previous_inside = half_plane_contains(&previous, bounds, edge);

    for current in vertices {
        let current_inside = half_plane_contains(current, bounds, edge);
        if current_inside {
            if !previous_inside {
                clipped.push(boundary_intersection(&previous, current, bounds, edge));
            }
            clipped.push(*current);
        } else if previous_inside {
            clipped.push(boundary_intersection(&previous, current, bounds, edge));
        }
        previous = *current;
        previous_inside = current_inside;
    }

    clipped
}

/// Clips an outer ring and each hole independently. Holes that collapse are
/// dropped; a collapsed outer ring drops the whole polygon.
pub fn clip_polygon(outer: &[Coordinate], holes: &[Ring], bounds: &Bounds) -> Option<ClippedPolygon> {
    let outer = clip_ring(outer, bounds)?;
    let holes = holes
        .iter()
        .filter_map(|hole| clip_ring(hole, bounds))
        .collect();
    Some(ClippedPolygon { outer, holes })
}

/// Splits an open chain into the sub-chains that lie inside `bounds`.
/// Sub-chains shorter than 2 points are discarded.
pub fn clip_line(line: &[Coordinate], bounds: &Bounds) -> Vec<Vec<Coordinate>> {
    let mut segments = vec![line.to_vec()];

    for edge in Edge::CLIP_ORDER {
        let mut split = Vec::with_capacity(segments.len());
        for segment in &segments {
            split_at_edge(segment, bounds, edge, &mut split);
        }
        segments = split;
    }

    segments.retain(|segment| segment.len() >= 2);
    segments
}

fn split_at_edge(segment: &[Coordinate], bounds: &Bounds, edge: Edge, out: &mut Vec<Vec<Coordinate>>) {
    let mut current: Vec<Coordinate> = Vec::new();
    let mut previous: Option<(Coordinate, bool)> = None;

    for point in segment {
        let inside = half_plane_contains(point, bounds, edge);
        if let Some((prev, prev_inside)) = previous {
            if prev_inside && !inside {
                push_distinct(&mut current, boundary_intersection(&prev, point, bounds, edge));
                out.push(std::mem::take(&mut current));
            } else if !prev_inside && inside {
                push_distinct(&mut current, boundary_intersection(&prev, point, bounds, edge));
            }
        }
        if inside {
            push_distinct(&mut current, *point);
        }
        previous = Some((*point, inside));
    }

    if !current.is_empty() {
        out.push(current);
    }
}

fn push_distinct(chain: &mut Vec<Coordinate>, point: Coordinate) {
    if chain.last() != Some(&point) {
        chain.push(point);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    fn unit_bounds() -> Bounds {
        Bounds::new(1.0, 0.0, 1.0, 0.0)
    }

    fn inside_all_edges(point: &Coordinate, bounds: &Bounds) -> bool {
        Edge::CLIP_ORDER.iter().all(|edge| half_plane_contains(point, bounds, *edge))
    }

    fn keys(ring: &[Coordinate]) -> HashSet<(u64, u64)> {
        ring.iter().map(|p| (p.lat.to_bits(), p.lng.to_bits())).collect()
    }

    #[test]
    fn test_ring_inside_is_unchanged() {
        let ring = vec![c(0.2, 0.2), c(0.2, 0.8), c(0.8, 0.8), c(0.8, 0.2), c(0.2, 0.2)];
        let clipped = clip_ring(&ring, &unit_bounds()).unwrap();
        assert_eq!(keys(&clipped), keys(&ring));
        assert_eq!(clipped.len(), ring.len());
    }

    #[test]
    fn test_ring_is_contained_after_clip() {
        let bounds = unit_bounds();
        let ring = vec![c(-0.5, -0.5), c(-0.5, 1.5), c(1.5, 1.5), c(0.5, 0.5), c(-0.5, -0.5)];
        let clipped = clip_ring(&ring, &bounds).unwrap();
        assert!(clipped.len() >= 4);
        assert!(clipped.iter().all(|p| inside_all_edges(p, &bounds)));
        assert_eq!(clipped.first(), clipped.last());
    }

    #[test]
    fn test_ring_outside_is_dropped() {
        let ring = vec![c(2.0, 2.0), c(2.0, 3.0), c(3.0, 3.0), c(2.0, 2.0)];
        assert_eq!(clip_ring(&ring, &unit_bounds()), None);
    }

    #[test]
    fn test_polygon_drops_collapsed_hole_only() {
        let outer = vec![c(0.1, 0.1), c(0.1, 1.5), c(0.9, 1.5), c(0.9, 0.1), c(0.1, 0.1)];
        let kept_hole = vec![c(0.4, 0.4), c(0.4, 0.6), c(0.6, 0.6), c(0.6, 0.4), c(0.4, 0.4)];
        let outside_hole = vec![c(0.4, 1.2), c(0.4, 1.4), c(0.6, 1.4), c(0.4, 1.2)];
        let clipped = clip_polygon(&outer, &[kept_hole.clone(), outside_hole], &unit_bounds()).unwrap();
        assert_eq!(clipped.holes, vec![kept_hole]);
        assert!(clipped.outer.iter().all(|p| p.lng <= 1.0));
    }

    #[test]
    fn test_line_inside_is_unchanged() {
        let line = vec![c(0.1, 0.1), c(0.2, 0.5), c(0.9, 0.9)];
        assert_eq!(clip_line(&line, &unit_bounds()), vec![line]);
    }

    #[test]
    fn test_line_exit_and_reentry_splits_in_two() {
        let line = vec![c(0.2, 0.5), c(0.4, 1.5), c(0.6, 1.5), c(0.8, 0.5)];
        let segments = clip_line(&line, &unit_bounds());
        assert_eq!(segments.len(), 2);

        let exit = segments[0].last().unwrap();
        assert!((exit.lng - 1.0).abs() < EPSILON);
        assert!((exit.lat - 0.3).abs() < EPSILON);

        let entry = segments[1].first().unwrap();
        assert!((entry.lng - 1.0).abs() < EPSILON);
        assert!((entry.lat - 0.7).abs() < EPSILON);
    }

    #[test]
    fn test_line_crossing_both_horizontal_edges() {
        let bounds = unit_bounds();
        let line = vec![c(-0.5, 0.5), c(1.5, 0.5)];
        let segments = clip_line(&line, &bounds);
        assert_eq!(segments, vec![vec![c(0.0, 0.5), c(1.0, 0.5)]]);
    }

    #[test]
    fn test_line_outside_is_dropped() {
        let line = vec![c(2.0, 2.0), c(3.0, 3.0)];
        assert!(clip_line(&line, &unit_bounds()).is_empty());
    }
}
