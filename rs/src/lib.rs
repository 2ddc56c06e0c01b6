mod core;
mod graph;
mod parser;
mod processing;
mod profile;
mod routing;
mod spatial;

pub use crate::core::errors::{GraphError, Result};
pub use crate::core::types::{BoundingBox, OsmFormat, RawNode, RawRelation, RawWay, RelationMember};
pub use crate::graph::{Edge, Graph, Node, PHANTOM_ID_FLOOR};
pub use crate::profile::{
    bicycle, bus, car, foot, railway, registry, subway, tram, PenaltyRule, Profile,
    RestrictionKind, WayDecision, DENY_ACCESS_VALUES,
};
pub use crate::routing::{find_route, find_route_without_turn_around};
pub use crate::spatial::{earth_distance, KdTree};

use crate::processing::GraphBuilder;

/// Options governing a single `add_from_osm` ingestion call (spec.md §6).
pub struct LoadOptions<'a> {
    pub profile: &'a Profile,
    pub format: OsmFormat,
    pub bbox: BoundingBox,
}

/// Parses `source` under `options.format` and builds the resulting ways and
/// restrictions directly into `graph` under `options.profile` (spec.md
/// §4.4-§4.5, §6). Ingestion failures of every flavor collapse to a single
/// `GraphError::InputInvalid` at this boundary, with the underlying cause
/// logged via `log::error!`; per-element problems are logged as warnings
/// rather than failing the whole load.
pub fn add_from_osm(graph: &mut Graph, source: &[u8], options: LoadOptions) -> Result<()> {
    let raw = parser::parse(source, options.format).map_err(|e| {
        log::error!("OSM ingestion failed: {e}");
        GraphError::InputInvalid(e.to_string())
    })?;

    GraphBuilder::new(options.profile, &raw, options.bbox, graph).build();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_XML: &str = r#"<?xml version="1.0"?>
<osm version="0.6">
  <node id="1" lat="52.2300" lon="21.0100" />
  <node id="2" lat="52.2310" lon="21.0110" />
  <node id="3" lat="52.2320" lon="21.0120" />
  <node id="4" lat="52.2330" lon="21.0130" />
  <node id="5" lat="52.2340" lon="21.0140" />
  <way id="10"><nd ref="1" /><nd ref="2" /><tag k="highway" v="tertiary" /></way>
  <way id="11"><nd ref="2" /><nd ref="3" /><tag k="highway" v="tertiary" /></way>
  <way id="12"><nd ref="3" /><nd ref="4" /><tag k="highway" v="tertiary" /></way>
  <way id="13"><nd ref="4" /><nd ref="5" /><tag k="highway" v="residential" /></way>
  <way id="14"><nd ref="2" /><nd ref="4" /><tag k="highway" v="service" /></way>
  <relation id="100">
    <member type="way" ref="10" role="from" />
    <member type="node" ref="2" role="via" />
    <member type="way" ref="11" role="to" />
    <tag k="type" v="restriction" />
    <tag k="restriction" v="only_left_turn" />
  </relation>
</osm>"#;

    #[test]
    fn s6_built_in_car_profile_counts_phantom_node() {
        let car = car();
        let mut graph = Graph::new();
        add_from_osm(
            &mut graph,
            FIXTURE_XML.as_bytes(),
            LoadOptions { profile: &car, format: OsmFormat::Unknown, bbox: BoundingBox::DISABLED },
        )
        .unwrap();

        assert_eq!(graph.node_count(), 6);
    }

    /// A malformed XML stream raises `GraphError::XmlParsing` deep inside the
    /// reader; `add_from_osm` must collapse it to `InputInvalid` rather than
    /// leak the parser's internal error variant (spec.md §6-§7).
    #[test]
    fn malformed_xml_collapses_to_input_invalid() {
        let car = car();
        let mut graph = Graph::new();
        let err = add_from_osm(
            &mut graph,
            b"<osm><node id=\"1\" lat=\"1.0\" lon=\"2.0\"",
            LoadOptions { profile: &car, format: OsmFormat::Xml, bbox: BoundingBox::DISABLED },
        )
        .unwrap_err();

        assert!(matches!(err, GraphError::InputInvalid(_)));
    }

    #[test]
    fn s6_custom_profile_without_service_or_restrictions() {
        let limited = Profile {
            name: "limited".to_string(),
            penalties: vec![
                PenaltyRule { key: "highway".to_string(), value: "tertiary".to_string(), multiplier: 1.0 },
                PenaltyRule { key: "highway".to_string(), value: "residential".to_string(), multiplier: 1.0 },
            ],
            access: vec!["access".to_string()],
            disallow_motorroad: false,
            disable_restrictions: true,
        };

        let mut graph = Graph::new();
        add_from_osm(
            &mut graph,
            FIXTURE_XML.as_bytes(),
            LoadOptions { profile: &limited, format: OsmFormat::Unknown, bbox: BoundingBox::DISABLED },
        )
        .unwrap();

        assert_eq!(graph.node_count(), 4);
    }
}
