use super::{Coordinate, Tags};

/// Kind of a typed map feature handed to the texture and mesh stages.
#[derive(
    rkyv::Archive, rkyv::Deserialize, rkyv::Serialize,
    serde::Deserialize, serde::Serialize,
    Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Building,
    Water,
    Coastline,
    Barrier,
    Road,
    Landuse,
    Vegetation,
    StreetFurniture,
}

impl FeatureType {
    /// Kinds whose geometry is always an open chain rather than a ring.
    pub fn is_line(&self) -> bool {
        matches!(self, FeatureType::Road | FeatureType::Barrier | FeatureType::Coastline)
    }
}

pub type Ring = Vec<Coordinate>;

#[derive(
    rkyv::Archive, rkyv::Deserialize, rkyv::Serialize,
    serde::Deserialize, serde::Serialize,
    Debug, Clone, PartialEq,
)]
pub struct Feature {
    pub id: String,
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    pub geometry: Vec<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holes: Option<Vec<Ring>>,
    pub tags: Tags,
}

impl Feature {
    pub fn new(id: String, feature_type: FeatureType, geometry: Vec<Coordinate>, tags: Tags) -> Self {
        Feature {
            id,
            feature_type,
            geometry,
            holes: None,
            tags,
        }
    }

    pub fn point(id: String, feature_type: FeatureType, position: Coordinate, tags: Tags) -> Self {
        Feature::new(id, feature_type, vec![position], tags)
    }

    pub fn with_holes(mut self, holes: Vec<Ring>) -> Self {
        self.holes = if holes.is_empty() { None } else { Some(holes) };
        self
    }

    pub fn is_point(&self) -> bool {
        self.geometry.len() == 1
    }

    pub fn is_closed(&self) -> bool {
        crate::geometry::is_closed(&self.geometry)
    }

    pub fn holes(&self) -> &[Ring] {
        self.holes.as_deref().unwrap_or(&[])
    }

    /// Replacement feature carrying a new id and geometry; tags and kind are kept.
    pub fn derive(&self, id: String, geometry: Vec<Coordinate>, holes: Vec<Ring>) -> Self {
        Feature::new(id, self.feature_type, geometry, self.tags.clone()).with_holes(holes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_serializes_kind_as_type() {
        let feature = Feature::point(
            "node-1".to_string(),
            FeatureType::StreetFurniture,
            Coordinate::new(1.0, 2.0),
            Tags::new(),
        );
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "street_furniture");
        assert!(json.get("holes").is_none());
    }

    #[test]
    fn test_empty_holes_are_none() {
        let feature = Feature::new("a".to_string(), FeatureType::Building, Vec::new(), Tags::new())
            .with_holes(Vec::new());
        assert_eq!(feature.holes, None);
        assert!(feature.holes().is_empty());
    }
}
