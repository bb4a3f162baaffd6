//! Provider response in, clipped typed features out.

use log::info;
use rand::Rng;

use crate::data::{feature::Feature, provider::ProviderResponse, Bounds};

pub mod classify;
pub mod coastline;
pub mod topology;
pub mod vegetation;
pub mod viewport;

/// Runs the whole tile pipeline. Output order: relation features, merged roads
/// and coastlines, other standalone features, reconstructed water, then
/// procedural vegetation. The same `rng` state yields the same output.
pub fn build_tile_features<R: Rng>(response: &ProviderResponse, bounds: &Bounds, rng: &mut R) -> Vec<Feature> {
    let raw = topology::build_raw_features(response);
    let raw_count = raw.len();

    let mut features = viewport::clip_features(raw, bounds);
    let clipped_count = features.len();

    let water = coastline::reconstruct_water(&features, bounds);
    let water_count = water.len();
    features.extend(water);

    let vegetation = vegetation::scatter_vegetation(&features, rng);
    let vegetation_count = vegetation.len();
    features.extend(vegetation);

    info!(
        elements = response.elements.len(),
        raw = raw_count,
        clipped = clipped_count,
        water = water_count,
        vegetation = vegetation_count;
        "Built tile features"
    );
    features
}
