//! Turns provider elements into unclipped typed features.
//!
//! Steps run in a fixed order because later ones depend on earlier mutation:
//! indexing, tag inheritance from route and site relations, multipolygon
//! resolution, then processing of the ways no relation consumed.

use std::collections::{HashMap, HashSet};

use log::{debug, info, trace};

use crate::data::{
    feature::{Feature, FeatureType, Ring},
    has_any_value, has_key, has_kv_pair,
    provider::{MemberType, OsmId, ProviderResponse, RawElement, RawRelation, RawWay},
    Coordinate, Tags,
};
use crate::geometry::{haversine_distance, interpolate, is_closed, ring_assembler::assemble_rings};

use super::classify::classify;

/// Way ids absorbed into relation features; local to one call.
pub type ConsumedWays = HashSet<OsmId>;

pub const TREE_ROW_SPACING_M: f64 = 8.0;
const TREE_ROW_EPSILON_M: f64 = 1e-3;

const INHERITED_KEYS: &[&str] = &["highway", "name", "lanes", "oneway", "surface", "layer", "bridge", "tunnel"];

const STREET_FURNITURE: &[(&str, &[&str])] = &[
    ("amenity", &[
        "bench", "waste_basket", "bicycle_parking", "post_box", "drinking_water",
        "telephone", "vending_machine", "recycling", "clock",
    ]),
    ("highway", &["street_lamp", "bus_stop", "traffic_signals"]),
    ("emergency", &["fire_hydrant"]),
    ("man_made", &["street_cabinet", "flagpole"]),
    ("leisure", &["picnic_table"]),
    ("advertising", &["column"]),
];

const AREA_KEYS: &[&str] = &[
    "building", "building:part", "landuse", "leisure", "amenity", "natural", "aeroway",
    "tourism", "man_made", "shop", "military", "place", "historic", "water", "wetland",
    "public_transport", "power", "sport", "area:highway",
];

const CLOSED_WATERWAYS: &[&str] = &["riverbank", "dock", "boatyard", "dam"];

const AREA_NATURALS: &[&str] = &["beach", "sand", "rock", "bare_rock", "scrub", "wetland", "wood"];

/// A way with its node references resolved to coordinates.
#[derive(Debug, Clone)]
pub struct Way {
    pub id: OsmId,
    pub nodes: Vec<Coordinate>,
    pub tags: Tags,
}

struct ElementIndex<'a> {
    ways: Vec<Way>,
    way_positions: HashMap<OsmId, usize>,
    relations: Vec<&'a RawRelation>,
    points: Vec<Feature>,
}

impl<'a> ElementIndex<'a> {
    fn new(response: &'a ProviderResponse) -> Self {
        let mut nodes: HashMap<OsmId, Coordinate> = HashMap::new();
        let mut points = Vec::new();
        for element in &response.elements {
            if let RawElement::Node(node) = element {
                nodes.insert(node.id, node.coordinate());
                if let Some(feature_type) = point_feature_type(&node.tags) {
                    points.push(Feature::point(
                        format!("node-{}", node.id),
                        feature_type,
                        node.coordinate(),
                        node.tags.clone(),
                    ));
                }
            }
        }

        let mut ways = Vec::new();
        let mut way_positions = HashMap::new();
        let mut relations = Vec::new();
        for element in &response.elements {
            match element {
                RawElement::Way(raw) => {
                    let resolved = resolve_way(raw, &nodes);
                    if resolved.len() < 2 {
                        trace!(way_id = raw.id, nodes = resolved.len(); "Dropping unresolvable way");
                        continue;
                    }
                    way_positions.insert(raw.id, ways.len());
                    ways.push(Way { id: raw.id, nodes: resolved, tags: raw.tags.clone() });
                },
                RawElement::Relation(relation) => relations.push(relation),
                RawElement::Node(_) => (),
            }
        }

        ElementIndex { ways, way_positions, relations, points }
    }

    fn way(&self, id: OsmId) -> Option<&Way> {
        self.way_positions.get(&id).map(|&position| &self.ways[position])
    }
}

fn resolve_way(raw: &RawWay, nodes: &HashMap<OsmId, Coordinate>) -> Vec<Coordinate> {
    if let Some(geometry) = &raw.geometry {
        return geometry.clone();
    }
    raw.node_ids
        .iter()
        .flatten()
        .filter_map(|id| nodes.get(id).copied())
        .collect()
}

fn point_feature_type(tags: &Tags) -> Option<FeatureType> {
    if has_kv_pair(tags, "natural", "tree") {
        return Some(FeatureType::Vegetation);
    }
    STREET_FURNITURE
        .iter()
        .any(|(key, values)| has_any_value(tags, key, values))
        .then_some(FeatureType::StreetFurniture)
}

fn is_route(tags: &Tags) -> bool {
    has_any_value(tags, "type", &["route", "superroute"])
}

fn is_heritage_site(tags: &Tags) -> bool {
    has_kv_pair(tags, "type", "site") && (has_key(tags, "historic") || has_key(tags, "heritage"))
}

/// Copies whitelisted attributes of route and heritage-site relations onto their
/// member ways. Keys the way already has are left alone.
fn inherit_relation_tags(index: &mut ElementIndex) {
    for relation in &index.relations {
        if !is_route(&relation.tags) && !is_heritage_site(&relation.tags) {
            continue;
        }
        for member in &relation.members {
            if member.member_type != MemberType::Way {
                continue;
            }
            let Some(&position) = index.way_positions.get(&member.reference) else {
                continue;
            };
            let way = &mut index.ways[position];
            for key in INHERITED_KEYS {
                if let Some(value) = relation.tags.get(*key) {
                    way.tags.entry(key.to_string()).or_insert_with(|| value.clone());
                }
            }
        }
    }
}

/// Builds features from multipolygon-like relations and reports the outer ways
/// they absorbed.
fn resolve_relations(index: &ElementIndex) -> (Vec<Feature>, ConsumedWays) {
    let mut features = Vec::new();
    let mut consumed = ConsumedWays::new();

    for relation in &index.relations {
        if is_route(&relation.tags) {
            continue;
        }
        let Some(feature_type) = classify(&relation.tags) else {
            trace!(relation_id = relation.id; "Dropping unclassified relation");
            continue;
        };

        let mut outer_chains = Vec::new();
        let mut inner_chains = Vec::new();
        let mut outer_ways = Vec::new();
        for member in &relation.members {
            if member.member_type != MemberType::Way {
                continue;
            }
            let way = index.way(member.reference);
            let chain = match (way, &member.geometry) {
                (Some(way), _) => way.nodes.clone(),
                (None, Some(geometry)) => geometry.clone(),
                (None, None) => continue,
            };
            if chain.len() < 2 {
                continue;
            }
            match member.role.as_str() {
                "outer" | "" => {
                    outer_chains.push(chain);
                    outer_ways.extend(way);
                },
                "inner" => inner_chains.push(chain),
                _ => (),
            }
        }

        let outers: Vec<Ring> = assemble_rings(&outer_chains)
            .into_iter()
            .filter(|ring| feature_type.is_line() || (is_closed(ring) && ring.len() >= 4))
            .collect();
        if outers.is_empty() {
            debug!(relation_id = relation.id; "Relation has no usable outer ring");
            continue;
        }

        // Every inner ring goes to every outer ring; see DESIGN.md.
        let holes: Vec<Ring> = if feature_type.is_line() {
            Vec::new()
        } else {
            assemble_rings(&inner_chains)
                .into_iter()
                .filter(|ring| is_closed(ring) && ring.len() >= 4)
                .collect()
        };

        for (k, ring) in outers.into_iter().enumerate() {
            features.push(
                Feature::new(format!("relation-{}-{}", relation.id, k), feature_type, ring, relation.tags.clone())
                    .with_holes(holes.clone()),
            );
        }

        for way in outer_ways {
            if !has_key(&way.tags, "highway") && !has_key(&way.tags, "barrier") {
                consumed.insert(way.id);
            }
        }
    }

    (features, consumed)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RoadSignature {
    highway: Option<String>,
    name: Option<String>,
    lanes: Option<String>,
    oneway: Option<String>,
    layer: Option<String>,
}

impl RoadSignature {
    fn of(tags: &Tags) -> Self {
        RoadSignature {
            highway: tags.get("highway").cloned(),
            name: tags.get("name").cloned(),
            lanes: tags.get("lanes").cloned(),
            oneway: tags.get("oneway").cloned(),
            layer: tags.get("layer").cloned(),
        }
    }
}

/// Road ways grouped by signature, in order of first appearance.
#[derive(Default)]
struct RoadBuckets<'a> {
    positions: HashMap<RoadSignature, usize>,
    buckets: Vec<Vec<&'a Way>>,
}

impl<'a> RoadBuckets<'a> {
    fn push(&mut self, way: &'a Way) {
        let signature = RoadSignature::of(&way.tags);
        let next = self.buckets.len();
        let position = *self.positions.entry(signature).or_insert(next);
        if position == next {
            self.buckets.push(Vec::new());
        }
        self.buckets[position].push(way);
    }

    fn merge(self) -> Vec<Feature> {
        let mut roads = Vec::new();
        for (bucket_id, bucket) in self.buckets.iter().enumerate() {
            let chains: Vec<Vec<Coordinate>> = bucket.iter().map(|way| way.nodes.clone()).collect();
            let tags = &bucket[0].tags;
            for (k, chain) in assemble_rings(&chains).into_iter().enumerate() {
                roads.push(Feature::new(format!("road-{}-{}", bucket_id, k), FeatureType::Road, chain, tags.clone()));
            }
        }
        roads
    }
}

/// Trees at whole multiples of `TREE_ROW_SPACING_M` from each segment start,
/// plus the segment end. An end within `TREE_ROW_EPSILON_M` of the last tree
/// replaces it.
fn interpolate_tree_row(way: &Way) -> Vec<Feature> {
    let mut positions = Vec::new();
    for (i, pair) in way.nodes.windows(2).enumerate() {
        if i == 0 {
            positions.push(pair[0]);
        }
        let distance = haversine_distance(&pair[0], &pair[1]);
        if distance <= TREE_ROW_EPSILON_M {
            continue;
        }
        let whole_steps = (distance / TREE_ROW_SPACING_M).floor() as usize;
        for step in 1..=whole_steps {
            let offset = step as f64 * TREE_ROW_SPACING_M;
            if distance - offset <= TREE_ROW_EPSILON_M {
                break;
            }
            positions.push(interpolate(&pair[0], &pair[1], offset / distance));
        }
        positions.push(pair[1]);
    }

    let mut tags = way.tags.clone();
    tags.insert("natural".to_string(), "tree".to_string());
    positions
        .into_iter()
        .enumerate()
        .map(|(k, position)| {
            Feature::point(format!("way-{}-tree-{}", way.id, k), FeatureType::Vegetation, position, tags.clone())
        })
        .collect()
}

fn is_area_like(tags: &Tags, nodes: &[Coordinate]) -> bool {
    if has_kv_pair(tags, "area", "yes") {
        return true;
    }
    if has_kv_pair(tags, "area", "no") {
        return false;
    }
    if !is_closed(nodes) {
        return false;
    }
    if has_key(tags, "highway") || has_key(tags, "railway") || has_key(tags, "barrier") {
        return false;
    }
    has_any_value(tags, "waterway", CLOSED_WATERWAYS) || AREA_KEYS.iter().any(|key| has_key(tags, key))
}

fn implies_area(tags: &Tags) -> bool {
    has_any_value(tags, "natural", AREA_NATURALS)
        || has_any_value(tags, "leisure", &["park", "garden"])
        || has_key(tags, "landuse")
}

fn standalone_feature(way: &Way) -> Option<Feature> {
    let Some(feature_type) = classify(&way.tags) else {
        trace!(way_id = way.id; "Dropping unclassified way");
        return None;
    };

    let mut nodes = way.nodes.clone();
    let mut area_like = is_area_like(&way.tags, &nodes);
    if !area_like
        && !has_key(&way.tags, "area")
        && implies_area(&way.tags)
        && !has_key(&way.tags, "highway")
        && !has_key(&way.tags, "barrier")
    {
        area_like = true;
    }

    let linear_waterway = !area_like && has_key(&way.tags, "waterway");
    if !area_like && !linear_waterway && !feature_type.is_line() {
        trace!(way_id = way.id; "Dropping open way with area tags");
        return None;
    }
    if area_like && !is_closed(&nodes) {
        nodes.push(nodes[0]);
    }

    Some(Feature::new(format!("way-{}", way.id), feature_type, nodes, way.tags.clone()))
}

#[derive(Default)]
struct StandaloneFeatures {
    roads: Vec<Feature>,
    coastlines: Vec<Feature>,
    features: Vec<Feature>,
}

fn process_ways(ways: &[Way], consumed: &ConsumedWays) -> StandaloneFeatures {
    let mut road_buckets = RoadBuckets::default();
    let mut coastline_chains = Vec::new();
    let mut output = StandaloneFeatures::default();

    for way in ways {
        if consumed.contains(&way.id) {
            continue;
        }
        if has_key(&way.tags, "highway") || has_key(&way.tags, "bridge") {
            road_buckets.push(way);
        } else if has_kv_pair(&way.tags, "natural", "tree_row") {
            output.features.extend(interpolate_tree_row(way));
        } else if has_kv_pair(&way.tags, "natural", "coastline") {
            coastline_chains.push(way.nodes.clone());
        } else if let Some(feature) = standalone_feature(way) {
            output.features.push(feature);
        }
    }

    output.roads = road_buckets.merge();

    let mut coastline_tags = Tags::new();
    coastline_tags.insert("natural".to_string(), "coastline".to_string());
    output.coastlines = assemble_rings(&coastline_chains)
        .into_iter()
        .enumerate()
        .map(|(k, chain)| Feature::new(format!("coastline-{}", k), FeatureType::Coastline, chain, coastline_tags.clone()))
        .collect();

    output
}

/// Relation features, merged roads, joined coastlines, then the remaining
/// standalone node and way features.
pub fn build_raw_features(response: &ProviderResponse) -> Vec<Feature> {
    let mut index = ElementIndex::new(response);
    inherit_relation_tags(&mut index);
    let (relation_features, consumed) = resolve_relations(&index);
    let standalone = process_ways(&index.ways, &consumed);

    info!(
        relations = relation_features.len(),
        roads = standalone.roads.len(),
        coastlines = standalone.coastlines.len(),
        points = index.points.len(),
        ways = standalone.features.len(),
        consumed_ways = consumed.len();
        "Built raw features"
    );

    let mut features = relation_features;
    features.extend(standalone.roads);
    features.extend(standalone.coastlines);
    features.extend(index.points);
    features.extend(standalone.features);
    features
}
