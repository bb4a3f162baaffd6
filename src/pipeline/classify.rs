use crate::data::{feature::FeatureType, has_any_value, has_key, has_kv_pair, Tags};

/// One entry of the priority-ordered classification table.
pub struct ClassifierRule {
    pub name: &'static str,
    pub matches: fn(&Tags) -> bool,
    pub feature_type: FeatureType,
}

/// Keys that on their own mark an element as some kind of land cover or site.
pub const LANDUSE_KEYS: &[&str] = &[
    "landuse",
    "natural",
    "leisure",
    "amenity",
    "aeroway",
    "tourism",
    "man_made",
    "public_transport",
    "power",
    "military",
    "place",
    "historic",
    "wetland",
    "surface",
    "material",
    "sport",
    "shop",
    "area:highway",
];

fn is_building(tags: &Tags) -> bool {
    has_key(tags, "building")
        || has_key(tags, "building:part")
        || has_any_value(tags, "historic", &["monument", "memorial", "castle"])
}

fn is_coastline(tags: &Tags) -> bool {
    has_kv_pair(tags, "natural", "coastline")
}

fn is_water(tags: &Tags) -> bool {
    has_kv_pair(tags, "natural", "water")
        || has_key(tags, "waterway")
        || has_any_value(tags, "landuse", &["reservoir", "basin"])
}

fn is_barrier(tags: &Tags) -> bool {
    has_key(tags, "barrier")
}

fn is_landuse(tags: &Tags) -> bool {
    LANDUSE_KEYS.iter().any(|key| has_key(tags, key))
}

/// First matching rule wins.
pub const CLASSIFIER_RULES: &[ClassifierRule] = &[
    ClassifierRule { name: "building", matches: is_building, feature_type: FeatureType::Building },
    ClassifierRule { name: "coastline", matches: is_coastline, feature_type: FeatureType::Coastline },
    ClassifierRule { name: "water", matches: is_water, feature_type: FeatureType::Water },
    ClassifierRule { name: "barrier", matches: is_barrier, feature_type: FeatureType::Barrier },
    ClassifierRule { name: "landuse", matches: is_landuse, feature_type: FeatureType::Landuse },
];

pub fn classify(tags: &Tags) -> Option<FeatureType> {
    CLASSIFIER_RULES
        .iter()
        .find(|rule| (rule.matches)(tags))
        .map(|rule| rule.feature_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_building_beats_everything() {
        let t = tags(&[("building", "yes"), ("natural", "water"), ("barrier", "wall")]);
        assert_eq!(classify(&t), Some(FeatureType::Building));
        assert_eq!(classify(&tags(&[("historic", "monument")])), Some(FeatureType::Building));
    }

    #[test]
    fn test_coastline_beats_generic_natural() {
        assert_eq!(classify(&tags(&[("natural", "coastline")])), Some(FeatureType::Coastline));
    }

    #[test]
    fn test_water_beats_landuse() {
        assert_eq!(classify(&tags(&[("landuse", "reservoir")])), Some(FeatureType::Water));
        assert_eq!(classify(&tags(&[("waterway", "stream")])), Some(FeatureType::Water));
        assert_eq!(classify(&tags(&[("natural", "water")])), Some(FeatureType::Water));
    }

    #[test]
    fn test_barrier_beats_landuse() {
        let t = tags(&[("barrier", "fence"), ("landuse", "grass")]);
        assert_eq!(classify(&t), Some(FeatureType::Barrier));
    }

    #[test]
    fn test_broad_landuse_keys() {
        for key in ["landuse", "leisure", "amenity", "surface", "place"] {
            assert_eq!(classify(&tags(&[(key, "something")])), Some(FeatureType::Landuse), "{}", key);
        }
    }

    #[test]
    fn test_unclassified_is_none() {
        assert_eq!(classify(&tags(&[("highway", "residential")])), None);
        assert_eq!(classify(&tags(&[("name", "Nowhere")])), None);
        assert_eq!(classify(&Tags::new()), None);
    }

    #[test]
    fn test_rule_order_is_stable() {
        let names: Vec<&str> = CLASSIFIER_RULES.iter().map(|rule| rule.name).collect();
        assert_eq!(names, vec!["building", "coastline", "water", "barrier", "landuse"]);
    }
}
