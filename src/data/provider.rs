use serde::Deserialize;

use super::{Coordinate, Tags};

pub type OsmId = i64;

/// Already-parsed answer of the feature source for one tile request.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct ProviderResponse {
    #[serde(default)]
    pub elements: Vec<RawElement>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawElement {
    Node(RawNode),
    Way(RawWay),
    Relation(RawRelation),
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawNode {
    pub id: OsmId,
    pub lat: f64,
    #[serde(alias = "lon")]
    pub lng: f64,
    #[serde(default)]
    pub tags: Tags,
}

impl RawNode {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// A way either carries resolved geometry or references nodes by id.
#[derive(Deserialize, Debug, Clone)]
pub struct RawWay {
    pub id: OsmId,
    #[serde(default)]
    pub geometry: Option<Vec<Coordinate>>,
    #[serde(default, rename = "nodeIds", alias = "nodes")]
    pub node_ids: Option<Vec<OsmId>>,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawRelation {
    pub id: OsmId,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default)]
    pub members: Vec<RawMember>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawMember {
    #[serde(rename = "type")]
    pub member_type: MemberType,
    #[serde(rename = "ref")]
    pub reference: OsmId,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Option<Vec<Coordinate>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_elements() {
        let json = r#"{"elements": [
            {"type": "node", "id": 1, "lat": 51.5, "lon": -0.1, "tags": {"natural": "tree"}},
            {"type": "way", "id": 2, "nodes": [1, 3], "tags": {"highway": "residential"}},
            {"type": "way", "id": 4, "geometry": [{"lat": 1.0, "lng": 2.0}, {"lat": 1.5, "lng": 2.5}]},
            {"type": "relation", "id": 5, "tags": {"type": "multipolygon"},
             "members": [{"type": "way", "ref": 2, "role": "outer"}]}
        ]}"#;
        let response: ProviderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.elements.len(), 4);
        match &response.elements[1] {
            RawElement::Way(way) => assert_eq!(way.node_ids, Some(vec![1, 3])),
            other => panic!("unexpected element {:?}", other),
        }
        match &response.elements[3] {
            RawElement::Relation(relation) => {
                assert_eq!(relation.members[0].member_type, MemberType::Way);
                assert_eq!(relation.members[0].role, "outer");
            }
            other => panic!("unexpected element {:?}", other),
        }
    }

    #[test]
    fn test_reject_unknown_discriminant() {
        let json = r#"{"elements": [{"type": "area", "id": 1}]}"#;
        assert!(serde_json::from_str::<ProviderResponse>(json).is_err());
    }
}
