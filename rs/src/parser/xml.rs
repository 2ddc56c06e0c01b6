use crate::core::errors::{GraphError, Result};
use crate::core::types::{RawNode, RawRelation, RawWay, RelationMember};
use crate::parser::RawOsm;
use std::collections::HashMap;
use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, XmlEvent};

/// Reads OSM XML into raw primitives, mirroring the teacher's `parse_osm_xml`
/// state machine (current node/way/relation carried across events).
pub fn parse_xml(bytes: &[u8]) -> Result<RawOsm> {
    let parser = EventReader::new(bytes);

    let mut nodes = HashMap::new();
    let mut ways = HashMap::new();
    let mut relations = HashMap::new();

    let mut current_node: Option<RawNode> = None;
    let mut current_way: Option<RawWay> = None;
    let mut current_relation: Option<RawRelation> = None;

    for event in parser.into_iter() {
        match event.map_err(GraphError::XmlParsing)? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => match name.local_name.as_str() {
                "node" => {
                    let id = attr(&attributes, "id", "node id")?;
                    let lat = attr(&attributes, "lat", "node lat")?;
                    let lon = attr(&attributes, "lon", "node lon")?;
                    current_node = Some(RawNode {
                        id,
                        lat,
                        lon,
                        tags: HashMap::new(),
                    });
                }
                "way" => {
                    let id = attr(&attributes, "id", "way id")?;
                    current_way = Some(RawWay {
                        id,
                        node_refs: Vec::new(),
                        tags: HashMap::new(),
                    });
                }
                "relation" => {
                    let id = attr(&attributes, "id", "relation id")?;
                    current_relation = Some(RawRelation {
                        id,
                        members: Vec::new(),
                        tags: HashMap::new(),
                    });
                }
                "tag" => {
                    let k = opt_attr(&attributes, "k").unwrap_or_default();
                    let v = opt_attr(&attributes, "v").unwrap_or_default();
                    if let Some(node) = &mut current_node {
                        node.tags.insert(k, v);
                    } else if let Some(way) = &mut current_way {
                        way.tags.insert(k, v);
                    } else if let Some(rel) = &mut current_relation {
                        rel.tags.insert(k, v);
                    }
                }
                "nd" => {
                    if let Some(way) = &mut current_way {
                        way.node_refs.push(attr(&attributes, "ref", "way nd ref")?);
                    }
                }
                "member" => {
                    if let Some(rel) = &mut current_relation {
                        let member_type = opt_attr(&attributes, "type").unwrap_or_default();
                        let ref_id = attr(&attributes, "ref", "relation member ref")?;
                        let role = opt_attr(&attributes, "role").unwrap_or_default();
                        rel.members.push(RelationMember {
                            member_type,
                            ref_id,
                            role,
                        });
                    }
                }
                _ => {}
            },
            XmlEvent::EndElement { name } => match name.local_name.as_str() {
                "node" => {
                    if let Some(node) = current_node.take() {
                        nodes.insert(node.id, node);
                    }
                }
                "way" => {
                    if let Some(way) = current_way.take() {
                        ways.insert(way.id, way);
                    }
                }
                "relation" => {
                    if let Some(rel) = current_relation.take() {
                        relations.insert(rel.id, rel);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    Ok(RawOsm {
        nodes,
        ways,
        relations,
    })
}

fn attr<T: std::str::FromStr>(
    attributes: &[OwnedAttribute],
    name: &str,
    feature: &str,
) -> Result<T> {
    opt_attr(attributes, name)
        .and_then(|v| v.parse::<T>().ok())
        .ok_or_else(|| {
            GraphError::InputInvalid(format!(
                "attribute '{}' missing or invalid for {}",
                name, feature
            ))
        })
}

fn opt_attr(attributes: &[OwnedAttribute], name: &str) -> Option<String> {
    attributes
        .iter()
        .find(|a| a.name.local_name == name)
        .map(|a| a.value.clone())
}
