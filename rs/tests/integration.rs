//! End-to-end scenarios from SPEC_FULL.md §8, exercised against the public
//! crate surface rather than any module-private state.

use sparkling_osm_router::{
    add_from_osm, car, earth_distance, find_route, find_route_without_turn_around, registry,
    BoundingBox, Edge, Graph, GraphError, KdTree, LoadOptions, Node, OsmFormat,
};

/// S1 — node/edge CRUD.
#[test]
fn s1_node_crud() {
    let mut g = Graph::new();
    g.set_node(Node { id: 1, osm_id: 1, lat: 0.01, lon: 0.01 });
    g.set_node(Node { id: 2, osm_id: 2, lat: 0.01, lon: 0.05 });
    g.set_node(Node { id: 3, osm_id: 3, lat: 0.03, lon: 0.09 });

    assert_eq!(g.get_node(2).id, 2);
    assert!(g.delete_node(3));
    assert_eq!(g.get_node(3).id, 0);
    assert_eq!(g.node_count(), 2);
}

const S2_NODES: [(i64, f32, f32); 9] = [
    (1, 0.01, 0.01),
    (2, 0.01, 0.05),
    (3, 0.03, 0.09),
    (4, 0.04, 0.03),
    (5, 0.04, 0.07),
    (6, 0.07, 0.03),
    (7, 0.07, 0.01),
    (8, 0.08, 0.05),
    (9, 0.08, 0.09),
];

/// S2 — nearest neighbor must agree between the linear scan and the k-d tree.
#[test]
fn s2_nearest_neighbor_linear_and_kdtree_agree() {
    let mut g = Graph::new();
    for (id, lat, lon) in S2_NODES {
        g.set_node(Node { id, osm_id: id, lat, lon });
    }
    let tree = KdTree::build(&g);

    for (query, expected) in [
        ((0.02, 0.02), 1),
        ((0.05, 0.03), 4),
        ((0.05, 0.08), 5),
        ((0.09, 0.06), 8),
    ] {
        assert_eq!(g.find_nearest_node(query.0, query.1).id, expected);
        assert_eq!(tree.nearest(query.0, query.1).id, expected);
    }
}

fn diamond() -> Graph {
    let mut g = Graph::new();
    for (id, lat, lon) in [(1, 0.0, 0.0), (2, 0.01, 0.01), (3, 0.02, 0.02), (4, 0.03, 0.0), (5, 0.02, -0.01)] {
        g.set_node(Node { id, osm_id: id, lat, lon });
    }
    for (a, b, cost) in [(1, 2, 200.0), (3, 4, 200.0), (2, 5, 100.0), (5, 4, 100.0), (2, 3, 1.0)] {
        g.set_edge(a, Edge { to: b, cost });
        g.set_edge(b, Edge { to: a, cost });
    }
    g
}

/// S3 — plain A* takes the cheaper shortcut over the direct diamond edge.
#[test]
fn s3_plain_astar_shortcut() {
    let g = diamond();
    assert_eq!(find_route(&g, 1, 4, 100).unwrap(), vec![1, 2, 5, 4]);
}

/// S4 — a mandatory turn restriction forces A* without turn-around awareness
/// to detour rather than bypass the restriction by reversing.
#[test]
fn s4_mandatory_turn_restriction() {
    let mut g = Graph::new();
    for (id, osm_id, lat, lon) in [
        (1, 1, 0.0, 0.0),
        (2, 2, 0.01, 0.01),
        (20, 2, 0.01, 0.01),
        (3, 3, 0.02, 0.0),
        (4, 4, 0.01, 0.02),
        (5, 5, 0.02, 0.02),
    ] {
        g.set_node(Node { id, osm_id, lat, lon });
    }
    for (a, b, cost) in [
        (1, 20, 10.0),
        (20, 4, 10.0),
        (2, 1, 10.0),
        (2, 3, 10.0),
        (2, 4, 10.0),
        (3, 2, 10.0),
        (3, 5, 10.0),
        (4, 2, 10.0),
        (4, 5, 100.0),
        (5, 3, 10.0),
        (5, 4, 100.0),
    ] {
        g.set_edge(a, Edge { to: b, cost });
    }

    assert_eq!(find_route(&g, 1, 3, 100).unwrap(), vec![1, 2, 4, 2, 3]);
    assert_eq!(find_route_without_turn_around(&g, 1, 3, 100).unwrap(), vec![1, 2, 4, 5, 3]);
}

/// S5 — a step limit too small to reach the goal reports `StepLimitExceeded`.
#[test]
fn s5_step_limit_exceeded() {
    let g = diamond();
    assert!(matches!(find_route(&g, 1, 4, 2).unwrap_err(), GraphError::StepLimitExceeded));
}

const S6_XML: &str = r#"<?xml version="1.0"?>
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

/// S6 — OSM ingest with the built-in `car` profile counts the phantom node.
#[test]
fn s6_osm_ingest_with_built_in_car_profile() {
    let profiles = registry();
    let car = profiles.get("car").unwrap();
    let mut graph = Graph::new();
    add_from_osm(
        &mut graph,
        S6_XML.as_bytes(),
        LoadOptions { profile: car, format: OsmFormat::Unknown, bbox: BoundingBox::DISABLED },
    )
    .unwrap();

    assert_eq!(graph.node_count(), 6, "5 OSM nodes + 1 phantom from the restriction");
}

/// S7 — haversine spot values against known coordinate pairs, to ±1e-6.
#[test]
fn s7_haversine_spot_values() {
    let d1 = earth_distance(52.23024, 21.01062, 52.23852, 21.0446);
    assert!((d1 - 2.49049).abs() < 1e-5, "got {d1}");

    let d2 = earth_distance(52.23024, 21.01062, 52.16125, 21.21147);
    assert!((d2 - 15.692483).abs() < 1e-5, "got {d2}");
}

/// S8 — a way referencing an unknown node does not fail ingestion; it's
/// logged and the way still contributes whatever eligible pairs remain.
#[test]
fn s8_unknown_node_reference_does_not_fail_ingestion() {
    let xml = r#"<?xml version="1.0"?>
<osm version="0.6">
  <node id="1" lat="52.0" lon="21.0" />
  <node id="2" lat="52.001" lon="21.001" />
  <way id="10"><nd ref="1" /><nd ref="2" /><nd ref="999" /><tag k="highway" v="residential" /></way>
</osm>"#;
    let car = car();
    let mut graph = Graph::new();
    add_from_osm(
        &mut graph,
        xml.as_bytes(),
        LoadOptions { profile: &car, format: OsmFormat::Unknown, bbox: BoundingBox::DISABLED },
    )
    .unwrap();

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.get_edges(1).len(), 1);
}

/// S9 — when both endpoints are missing, `from` is reported, not `to`.
#[test]
fn s9_missing_from_reported_over_missing_to() {
    let g = diamond();
    let err = find_route(&g, 999, 998, 100).unwrap_err();
    assert!(matches!(err, GraphError::InvalidReference(999)));
}
