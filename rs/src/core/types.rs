use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A raw OSM node as produced by the reader, before a profile is applied.
///
/// This is ingestion-only: it never survives into the routing [`crate::graph::Graph`],
/// whose own `Node` type (id/osm_id/lat/lon) is a different, much smaller shape.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawNode {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawWay {
    pub id: i64,
    pub node_refs: Vec<i64>,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelationMember {
    pub member_type: String,
    pub ref_id: i64,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RawRelation {
    pub id: i64,
    pub members: Vec<RelationMember>,
    pub tags: HashMap<String, String>,
}

/// A rectangular filter over WGS-84 coordinates. The all-zero box disables
/// filtering entirely (every node is eligible) per spec.md §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const DISABLED: BoundingBox = BoundingBox {
        min_lat: 0.0,
        min_lon: 0.0,
        max_lat: 0.0,
        max_lon: 0.0,
    };

    pub fn is_disabled(&self) -> bool {
        *self == Self::DISABLED
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.is_disabled()
            || (lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon)
    }
}

/// Source format for an OSM byte stream. Detection from bytes is a cheap
/// magic-byte sniff only — unwrapping gzip/bzip2 is the out-of-scope
/// producer's job (spec.md §1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsmFormat {
    Xml,
    Pbf,
    Unknown,
}

impl OsmFormat {
    pub fn resolve(self, bytes: &[u8]) -> OsmFormat {
        match self {
            OsmFormat::Unknown => {
                let head = &bytes[..bytes.len().min(16)];
                let looks_like_xml = head.iter().any(|&b| b == b'<');
                if looks_like_xml {
                    OsmFormat::Xml
                } else {
                    OsmFormat::Pbf
                }
            }
            other => other,
        }
    }
}
