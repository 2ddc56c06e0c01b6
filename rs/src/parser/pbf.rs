use crate::core::errors::{GraphError, Result};
use crate::core::types::{RawNode, RawRelation, RawWay, RelationMember};
use crate::parser::RawOsm;
use osmpbf::{Element, ElementReader};
use std::collections::HashMap;
use std::io::Cursor;

/// Reads OSM PBF into raw primitives, mirroring the teacher's
/// `parse_osm_pbf` fan-out over `ElementReader::par_map_reduce`.
pub fn parse_pbf(bytes: &[u8]) -> Result<RawOsm> {
    let reader = ElementReader::new(Cursor::new(bytes));

    let (nodes, ways, relations) = reader
        .par_map_reduce(
            |element| {
                let mut nodes = HashMap::new();
                let mut ways = HashMap::new();
                let mut relations = HashMap::new();

                match element {
                    Element::Node(n) => {
                        nodes.insert(
                            n.id(),
                            RawNode {
                                id: n.id(),
                                lat: n.lat(),
                                lon: n.lon(),
                                tags: n.tags().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                            },
                        );
                    }
                    Element::DenseNode(n) => {
                        nodes.insert(
                            n.id(),
                            RawNode {
                                id: n.id(),
                                lat: n.lat(),
                                lon: n.lon(),
                                tags: n.tags().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                            },
                        );
                    }
                    Element::Way(w) => {
                        ways.insert(
                            w.id(),
                            RawWay {
                                id: w.id(),
                                node_refs: w.refs().collect(),
                                tags: w.tags().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                            },
                        );
                    }
                    Element::Relation(r) => {
                        relations.insert(
                            r.id(),
                            RawRelation {
                                id: r.id(),
                                members: r
                                    .members()
                                    .map(|m| RelationMember {
                                        member_type: match m.member_type {
                                            osmpbf::RelMemberType::Node => "node".to_string(),
                                            osmpbf::RelMemberType::Way => "way".to_string(),
                                            osmpbf::RelMemberType::Relation => "relation".to_string(),
                                        },
                                        ref_id: m.member_id,
                                        role: m.role().unwrap_or("").to_string(),
                                    })
                                    .collect(),
                                tags: r.tags().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                            },
                        );
                    }
                }
                (nodes, ways, relations)
            },
            || (HashMap::new(), HashMap::new(), HashMap::new()),
            |mut a, b| {
                a.0.extend(b.0);
                a.1.extend(b.1);
                a.2.extend(b.2);
                a
            },
        )
        .map_err(GraphError::PbfParsing)?;

    Ok(RawOsm {
        nodes,
        ways,
        relations,
    })
}
