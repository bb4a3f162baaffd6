use log::debug;
use rand::Rng;

use crate::data::{
    feature::{Feature, FeatureType},
    has_key, has_kv_pair, Coordinate, Tags,
};
use crate::geometry::{bounding_box, planar_area_m2, point_in_polygon};

pub const MAX_POINTS_PER_POLYGON: usize = 2000;
const MAX_ATTEMPTS_PER_POINT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VegetationKind {
    DenseForest,
    Wood,
    Scrub,
    Wetland,
}

impl VegetationKind {
    pub fn of(tags: &Tags) -> Option<Self> {
        if has_kv_pair(tags, "landuse", "forest") {
            Some(VegetationKind::DenseForest)
        } else if has_kv_pair(tags, "natural", "wood") {
            Some(VegetationKind::Wood)
        } else if has_kv_pair(tags, "natural", "scrub") {
            Some(VegetationKind::Scrub)
        } else if has_kv_pair(tags, "natural", "wetland") || has_key(tags, "wetland") {
            Some(VegetationKind::Wetland)
        } else {
            None
        }
    }

    /// Mean distance between plants in meters.
    pub fn spacing_m(&self) -> f64 {
        match self {
            VegetationKind::DenseForest => 12.0,
            VegetationKind::Wood => 15.0,
            VegetationKind::Scrub => 20.0,
            VegetationKind::Wetland => 25.0,
        }
    }

    fn plant(&self) -> &'static str {
        match self {
            VegetationKind::DenseForest | VegetationKind::Wood => "tree",
            VegetationKind::Scrub => "shrub",
            VegetationKind::Wetland => "reed",
        }
    }
}

fn qualifying_kind(feature: &Feature) -> Option<VegetationKind> {
    if feature.feature_type.is_line() || feature.geometry.len() <= 2 {
        return None;
    }
    VegetationKind::of(&feature.tags)
}

/// Number of plants for a polygon of `area_m2`, capped per polygon.
pub fn target_count(area_m2: f64, kind: VegetationKind) -> usize {
    let spacing = kind.spacing_m();
    ((area_m2 / (spacing * spacing)).floor() as usize).min(MAX_POINTS_PER_POLYGON)
}

fn scatter_in_polygon<R: Rng>(feature: &Feature, kind: VegetationKind, rng: &mut R) -> Vec<Feature> {
    let Some(bbox) = bounding_box(&feature.geometry) else {
        return Vec::new();
    };
    let ref_lat = (bbox.north + bbox.south) / 2.0;
    let target = target_count(planar_area_m2(&feature.geometry, ref_lat), kind);
    if target == 0 {
        return Vec::new();
    }

    let mut positions = Vec::with_capacity(target);
    let max_attempts = target * MAX_ATTEMPTS_PER_POINT;
    let mut attempts = 0;
    while positions.len() < target && attempts < max_attempts {
        attempts += 1;
        let candidate = Coordinate::new(
            rng.gen_range(bbox.south..=bbox.north),
            rng.gen_range(bbox.west..=bbox.east),
        );
        if point_in_polygon(&candidate, &feature.geometry)
            && !feature.holes().iter().any(|hole| point_in_polygon(&candidate, hole))
        {
            positions.push(candidate);
        }
    }

    let mut tags = Tags::new();
    tags.insert("vegetation".to_string(), kind.plant().to_string());
    tags.insert("procedural".to_string(), "yes".to_string());
    positions
        .into_iter()
        .enumerate()
        .map(|(k, position)| Feature::point(format!("{}-veg-{}", feature.id, k), FeatureType::Vegetation, position, tags.clone()))
        .collect()
}

/// Synthetic plant points for every wood, forest, scrub or wetland polygon.
pub fn scatter_vegetation<R: Rng>(features: &[Feature], rng: &mut R) -> Vec<Feature> {
    let mut points = Vec::new();
    for feature in features {
        if let Some(kind) = qualifying_kind(feature) {
            let scattered = scatter_in_polygon(feature, kind, rng);
            debug!(feature_id = feature.id.as_str(), points = scattered.len(); "Scattered vegetation");
            points.extend(scattered);
        }
    }
    points
}
