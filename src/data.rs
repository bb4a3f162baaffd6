use std::{collections::HashMap, hash::Hash};

pub mod feature;
pub mod provider;

/// OSM-style tag set of an element or feature.
pub type Tags = HashMap<String, String>;

pub fn has_key(tags: &Tags, key: &str) -> bool {
    tags.contains_key(key)
}

/// True when `key` carries `value`, including inside `;`-separated multi-values.
pub fn has_kv_pair(tags: &Tags, key: &str, value: &str) -> bool {
    if let Some(tag_value) = tags.get(key) {
        tag_value.split(';')
            .any(|tag| tag.trim() == value)
    } else {
        false
    }
}

pub fn has_any_value(tags: &Tags, key: &str, values: &[&str]) -> bool {
    values.iter().any(|value| has_kv_pair(tags, key, value))
}

/// WGS84 position in degrees.
#[derive(
    rkyv::Archive, rkyv::Deserialize, rkyv::Serialize,
    serde::Deserialize, serde::Serialize,
    Debug, Clone, Copy,
)]
pub struct Coordinate {
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Coordinate { lat, lng }
    }
}

// Endpoint indexes match on exact values; no tolerance is applied here.
// Adding 0.0 folds -0.0 into 0.0 so equal coordinates hash alike.
impl Hash for Coordinate {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.lat + 0.0).to_bits().hash(state);
        (self.lng + 0.0).to_bits().hash(state);
    }
}

impl Eq for Coordinate { }

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }
}

/// Axis-aligned tile rectangle. Callers guarantee `north > south` and `east > west`.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Bounds { north, south, east, west }
    }

    pub fn is_valid(&self) -> bool {
        self.north > self.south && self.east > self.west
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        point.lat <= self.north
            && point.lat >= self.south
            && point.lng <= self.east
            && point.lng >= self.west
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn min_span(&self) -> f64 {
        self.lat_span().min(self.lng_span())
    }

    pub fn max_span(&self) -> f64 {
        self.lat_span().max(self.lng_span())
    }

    pub fn north_west(&self) -> Coordinate {
        Coordinate::new(self.north, self.west)
    }

    pub fn north_east(&self) -> Coordinate {
        Coordinate::new(self.north, self.east)
    }

    pub fn south_east(&self) -> Coordinate {
        Coordinate::new(self.south, self.east)
    }

    pub fn south_west(&self) -> Coordinate {
        Coordinate::new(self.south, self.west)
    }

    /// The whole tile as a closed clockwise ring starting at the north-west corner.
    pub fn to_ring(&self) -> Vec<Coordinate> {
        vec![
            self.north_west(),
            self.north_east(),
            self.south_east(),
            self.south_west(),
            self.north_west(),
        ]
    }
}
