use log::{debug, trace};

use crate::data::{
    feature::{Feature, FeatureType},
    Bounds,
};
use crate::geometry::clip::{clip_line, clip_polygon};

/// Line kinds, plus water that never closed into a ring (rivers, streams).
fn is_line_geometry(feature: &Feature) -> bool {
    feature.feature_type.is_line() || (feature.feature_type == FeatureType::Water && !feature.is_closed())
}

/// Replaces every feature by its part inside `bounds`. Points are kept or
/// dropped whole; lines may split into several features with suffixed ids.
pub fn clip_features(features: Vec<Feature>, bounds: &Bounds) -> Vec<Feature> {
    let input_count = features.len();
    let mut clipped = Vec::with_capacity(input_count);

    for feature in features {
        if feature.is_point() {
            if bounds.contains(&feature.geometry[0]) {
                clipped.push(feature);
            }
        } else if is_line_geometry(&feature) {
            for (k, segment) in clip_line(&feature.geometry, bounds).into_iter().enumerate() {
                clipped.push(feature.derive(format!("{}-{}", feature.id, k), segment, Vec::new()));
            }
        } else if let Some(polygon) = clip_polygon(&feature.geometry, feature.holes(), bounds) {
            clipped.push(feature.derive(feature.id.clone(), polygon.outer, polygon.holes));
        } else {
            trace!(feature_id = feature.id.as_str(); "Polygon fell outside tile");
        }
    }

    debug!(input = input_count, output = clipped.len(); "Clipped features to tile");
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Coordinate, Tags};

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng)
    }

    fn unit_bounds() -> Bounds {
        Bounds::new(1.0, 0.0, 1.0, 0.0)
    }

    #[test]
    fn test_points_use_containment_only() {
        let features = vec![
            Feature::point("in".to_string(), FeatureType::Vegetation, c(0.5, 0.5), Tags::new()),
            Feature::point("out".to_string(), FeatureType::Vegetation, c(1.5, 0.5), Tags::new()),
        ];
        let clipped = clip_features(features, &unit_bounds());
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].id, "in");
    }

    #[test]
    fn test_open_water_is_line_clipped() {
        let river = Feature::new(
            "way-1".to_string(),
            FeatureType::Water,
            vec![c(0.5, -0.5), c(0.5, 0.5), c(0.5, 1.5)],
            Tags::new(),
        );
        let clipped = clip_features(vec![river], &unit_bounds());
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].id, "way-1-0");
        assert_eq!(clipped[0].geometry, vec![c(0.5, 0.0), c(0.5, 0.5), c(0.5, 1.0)]);
    }

    #[test]
    fn test_area_keeps_id_and_holes() {
        let outer = vec![c(0.1, 0.1), c(0.1, 0.9), c(0.9, 0.9), c(0.9, 0.1), c(0.1, 0.1)];
        let hole = vec![c(0.4, 0.4), c(0.4, 0.6), c(0.6, 0.6), c(0.4, 0.4)];
        let feature = Feature::new("relation-1-0".to_string(), FeatureType::Landuse, outer.clone(), Tags::new())
            .with_holes(vec![hole.clone()]);
        let clipped = clip_features(vec![feature], &unit_bounds());
        assert_eq!(clipped.len(), 1);
        assert_eq!(clipped[0].id, "relation-1-0");
        assert_eq!(clipped[0].geometry, outer);
        assert_eq!(clipped[0].holes(), &[hole][..]);
    }
}
