//! Reads a saved provider response from disk.
//!
//! `.json` files hold the provider's JSON answer; `.osm` files hold OSM XML,
//! which is mapped onto the same element model. Either may be `.xz` compressed.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use log::{debug, trace};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::provider::{MemberType, ProviderResponse, RawElement, RawMember, RawNode, RawRelation, RawWay};
use crate::data::{Coordinate, Tags};
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFormat {
    Json,
    OsmXml,
}

impl ProviderFormat {
    /// Format and compression of `path`, judged by its extensions.
    pub fn detect(path: &Path) -> Result<(ProviderFormat, bool)> {
        let compressed = path.extension().is_some_and(|ext| ext == "xz");
        let inner = if compressed { Path::new(path.file_stem().unwrap_or_default()) } else { path };
        match inner.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok((ProviderFormat::Json, compressed)),
            Some("osm") | Some("xml") => Ok((ProviderFormat::OsmXml, compressed)),
            _ => Err(format!("Unsupported provider file {}", path.display()).into()),
        }
    }
}

pub fn read_provider_response(path: &Path) -> Result<ProviderResponse> {
    let (format, compressed) = ProviderFormat::detect(path)?;
    let file_reader = BufReader::new(fs::File::open(path)?);
    let reader: Box<dyn BufRead> = if compressed {
        Box::new(BufReader::new(XzDecoder::new(file_reader)))
    } else {
        Box::new(file_reader)
    };

    let response = match format {
        ProviderFormat::Json => serde_json::from_reader(reader)?,
        ProviderFormat::OsmXml => parse_osm_xml(reader)?,
    };
    debug!(path = path.to_str().unwrap_or_default(), elements = response.elements.len(); "Read provider response");
    Ok(response)
}

struct Attributes(HashMap<String, String>);

impl Attributes {
    fn of(el: &BytesStart) -> Result<Self> {
        let mut values = HashMap::new();
        for attribute_res in el.attributes() {
            let attribute = attribute_res?;
            let key = str::from_utf8(attribute.key.as_ref())?.to_string();
            values.insert(key, attribute.unescape_value()?.into_owned());
        }
        Ok(Attributes(values))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn require(&self, key: &str, element: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| Error::from(format!("<{}> without '{}' attribute", element, key)))
    }

    fn coordinate(&self) -> Result<Option<Coordinate>> {
        match (self.get("lat"), self.get("lon")) {
            (Some(lat), Some(lon)) => Ok(Some(Coordinate::new(lat.parse()?, lon.parse()?))),
            _ => Ok(None),
        }
    }
}

fn tags_mut(element: &mut RawElement) -> &mut Tags {
    match element {
        RawElement::Node(node) => &mut node.tags,
        RawElement::Way(way) => &mut way.tags,
        RawElement::Relation(relation) => &mut relation.tags,
    }
}

fn open_element(el: &BytesStart) -> Result<Option<RawElement>> {
    let element = match el.name().as_ref() {
        b"node" => {
            let attributes = Attributes::of(el)?;
            let coordinate = attributes.coordinate()?.ok_or("<node> without coordinates")?;
            RawElement::Node(RawNode {
                id: attributes.require("id", "node")?.parse()?,
                lat: coordinate.lat,
                lng: coordinate.lng,
                tags: Tags::new(),
            })
        },
        b"way" => RawElement::Way(RawWay {
            id: Attributes::of(el)?.require("id", "way")?.parse()?,
            geometry: None,
            node_ids: Some(Vec::new()),
            tags: Tags::new(),
        }),
        b"relation" => RawElement::Relation(RawRelation {
            id: Attributes::of(el)?.require("id", "relation")?.parse()?,
            tags: Tags::new(),
            members: Vec::new(),
        }),
        _ => return Ok(None),
    };
    Ok(Some(element))
}

fn member_type(value: &str) -> Result<MemberType> {
    match value {
        "node" => Ok(MemberType::Node),
        "way" => Ok(MemberType::Way),
        "relation" => Ok(MemberType::Relation),
        other => Err(format!("Unknown member type '{}'", other).into()),
    }
}

/// Attaches a `tag`, `nd` or `member` child to the element being read.
fn add_child(el: &BytesStart, current: &mut Option<RawElement>) -> Result<()> {
    let Some(element) = current.as_mut() else {
        return Ok(());
    };
    match el.name().as_ref() {
        b"tag" => {
            let attributes = Attributes::of(el)?;
            let key = attributes.require("k", "tag")?.to_string();
            let value = attributes.require("v", "tag")?.to_string();
            tags_mut(element).insert(key, value);
        },
        b"nd" => {
            let attributes = Attributes::of(el)?;
            let coordinate = attributes.coordinate()?;
            match element {
                RawElement::Way(way) => {
                    if let Some(reference) = attributes.get("ref") {
                        way.node_ids.get_or_insert_with(Vec::new).push(reference.parse()?);
                    }
                    if let Some(coordinate) = coordinate {
                        way.geometry.get_or_insert_with(Vec::new).push(coordinate);
                    }
                },
                RawElement::Relation(relation) => {
                    if let (Some(member), Some(coordinate)) = (relation.members.last_mut(), coordinate) {
                        member.geometry.get_or_insert_with(Vec::new).push(coordinate);
                    }
                },
                RawElement::Node(_) => (),
            }
        },
        b"member" => {
            if let RawElement::Relation(relation) = element {
                let attributes = Attributes::of(el)?;
                relation.members.push(RawMember {
                    member_type: member_type(attributes.require("type", "member")?)?,
                    reference: attributes.require("ref", "member")?.parse()?,
                    role: attributes.get("role").unwrap_or_default().to_string(),
                    geometry: None,
                });
            }
        },
        other => trace!(element = str::from_utf8(other).unwrap_or("?"); "Ignoring XML child"),
    }
    Ok(())
}

/// Maps OSM XML onto the provider element model.
pub fn parse_osm_xml<R: BufRead>(input: R) -> Result<ProviderResponse> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut elements = Vec::new();
    let mut current: Option<RawElement> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                if let Some(element) = open_element(&e)? {
                    current = Some(element);
                } else {
                    add_child(&e, &mut current)?;
                }
            },
            Event::Empty(e) => {
                if let Some(element) = open_element(&e)? {
                    elements.push(element);
                } else {
                    add_child(&e, &mut current)?;
                }
            },
            Event::End(e) => {
                if matches!(e.name().as_ref(), b"node" | b"way" | b"relation") {
                    elements.extend(current.take());
                }
            },
            _ => (),
        }
        // if we don't keep a borrow elsewhere, we can clear the buffer to keep memory usage low
        buf.clear();
    }

    // Ways that carried inline coordinates keep them; the node id list is dropped.
    for element in &mut elements {
        if let RawElement::Way(way) = element {
            if way.geometry.is_some() {
                way.node_ids = None;
            }
        }
    }

    Ok(ProviderResponse { elements })
}
