mod pbf;
mod xml;

use crate::core::errors::Result;
use crate::core::types::{OsmFormat, RawNode, RawRelation, RawWay};
use std::collections::HashMap;

/// Everything the reader extracted from an OSM byte stream, before a
/// profile is applied (spec.md §3, "Ambient — raw OSM primitives").
pub struct RawOsm {
    pub nodes: HashMap<i64, RawNode>,
    pub ways: HashMap<i64, RawWay>,
    pub relations: HashMap<i64, RawRelation>,
}

/// Dispatches to the XML or PBF reader after resolving `format` against the
/// byte stream's magic bytes (spec.md §4.4).
pub fn parse(bytes: &[u8], format: OsmFormat) -> Result<RawOsm> {
    match format.resolve(bytes) {
        OsmFormat::Xml => xml::parse_xml(bytes),
        OsmFormat::Pbf => pbf::parse_pbf(bytes),
        OsmFormat::Unknown => unreachable!("OsmFormat::resolve never returns Unknown"),
    }
}
