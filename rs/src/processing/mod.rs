use crate::core::errors::{GraphError, Result};
use crate::core::types::{BoundingBox, RawRelation, RawWay, RelationMember};
use crate::graph::{Edge, Graph, Node};
use crate::parser::RawOsm;
use crate::profile::{Profile, RestrictionKind};
use crate::spatial::earth_distance;
use rustc_hash::FxHashMap;

/// Turns raw OSM primitives into a routing [`Graph`] under a [`Profile`],
/// applying a bounding-box filter and compiling turn restrictions
/// (spec.md §4.4, §4.5). Mirrors the teacher's `GraphBuilder`, generalized
/// from the teacher's CSR `ProcessedGraph` to the CRUD-backed `Graph`.
pub struct GraphBuilder<'a> {
    profile: &'a Profile,
    raw: &'a RawOsm,
    bbox: BoundingBox,
    graph: &'a mut Graph,
    way_node_chains: FxHashMap<i64, Vec<i64>>,
}

impl<'a> GraphBuilder<'a> {
    /// Builds directly into `graph` rather than into a fresh, isolated one —
    /// a second `add_from_osm` call on the same persistent `Graph` must see
    /// its already-advanced phantom counter, not restart from
    /// `PHANTOM_ID_FLOOR` and collide with phantom nodes minted by the first.
    pub fn new(profile: &'a Profile, raw: &'a RawOsm, bbox: BoundingBox, graph: &'a mut Graph) -> GraphBuilder<'a> {
        GraphBuilder {
            profile,
            raw,
            bbox,
            graph,
            way_node_chains: FxHashMap::default(),
        }
    }

    pub fn build(mut self) {
        for way in self.raw.ways.values() {
            self.add_way(way);
        }
        for relation in self.raw.relations.values() {
            if let Err(e) = self.add_relation(relation) {
                log::warn!(target: "osm", "skipping restriction {}: {}", relation.id, e);
            }
        }
    }

    /// Materializes a way's edges one consecutive OSM node pair at a time
    /// (spec.md §4.4: "a way contributes an edge only between two eligible,
    /// known nodes"). A pair is skipped, not reconnected around, when either
    /// node is unknown or outside the bounding box — bridging across a
    /// dropped node would fabricate an edge between nodes that were never
    /// adjacent on the original way.
    fn add_way(&mut self, way: &RawWay) {
        let Some(decision) = self.profile.evaluate_way(&way.tags) else {
            return;
        };

        if way.node_refs.len() < 2 {
            log::warn!(target: "osm", "way {} has fewer than 2 nodes, skipping", way.id);
            return;
        }

        let known_refs: Vec<i64> = way
            .node_refs
            .iter()
            .filter(|&&id| {
                let known = self.raw.nodes.contains_key(&id);
                if !known {
                    log::warn!(target: "osm", "way {} references unknown node {}", way.id, id);
                }
                known
            })
            .copied()
            .collect();
        if known_refs.len() >= 2 {
            self.way_node_chains.insert(way.id, known_refs);
        }

        let mut contributed_edge = false;

        for window in way.node_refs.windows(2) {
            let (a, b) = (window[0], window[1]);
            let (Some(na), Some(nb)) = (self.raw.nodes.get(&a), self.raw.nodes.get(&b)) else {
                continue; // unknown node reference, already warned above
            };
            if !self.bbox.contains(na.lat, na.lon) || !self.bbox.contains(nb.lat, nb.lon) {
                continue;
            }

            self.graph.set_node(Node { id: a, osm_id: a, lat: na.lat as f32, lon: na.lon as f32 });
            self.graph.set_node(Node { id: b, osm_id: b, lat: nb.lat as f32, lon: nb.lon as f32 });

            let cost =
                (earth_distance(na.lat, na.lon, nb.lat, nb.lon) * decision.multiplier as f64) as f32;
            if decision.forward {
                self.graph.set_edge(a, Edge { to: b, cost });
            }
            if decision.backward {
                self.graph.set_edge(b, Edge { to: a, cost });
            }
            contributed_edge = true;
        }

        if !contributed_edge {
            log::warn!(target: "osm", "way {} contributed no eligible edges inside the bounding box, skipping", way.id);
        }
    }

    fn add_relation(&mut self, rel: &RawRelation) -> Result<()> {
        if rel.tags.get("type").map(String::as_str) != Some("restriction") {
            return Ok(());
        }
        if self.profile.disable_restrictions {
            return Ok(());
        }
        if self.profile.is_exempted(&rel.tags) {
            return Ok(());
        }
        let Some(kind) = self.profile.restriction_kind(&rel.tags) else {
            return Ok(());
        };

        let members = Self::ordered_members(rel)?;
        let mut chains = Vec::with_capacity(members.len());
        for m in &members {
            chains.push(self.member_to_nodes(m)?);
        }
        let path = Self::flatten_chain(chains)?;
        if path.len() < 3 {
            return Err(GraphError::InputInvalid("restriction path too short".into()));
        }

        self.compile_restriction(&path, kind)
    }

    fn ordered_members(rel: &RawRelation) -> Result<Vec<&RelationMember>> {
        let mut from = None;
        let mut to = None;
        let mut via = Vec::new();

        for m in &rel.members {
            match m.role.as_str() {
                "from" => from = Some(m),
                "to" => to = Some(m),
                "via" => via.push(m),
                _ => {}
            }
        }

        let from = from.ok_or_else(|| GraphError::InputInvalid("restriction missing 'from'".into()))?;
        let to = to.ok_or_else(|| GraphError::InputInvalid("restriction missing 'to'".into()))?;
        if via.is_empty() {
            return Err(GraphError::InputInvalid("restriction missing 'via'".into()));
        }

        let mut ordered = vec![from];
        ordered.extend(via);
        ordered.push(to);
        Ok(ordered)
    }

    fn member_to_nodes(&self, m: &RelationMember) -> Result<Vec<i64>> {
        match (m.member_type.as_str(), m.role.as_str()) {
            ("node", "via") => {
                if !self.raw.nodes.contains_key(&m.ref_id) {
                    return Err(GraphError::InputInvalid(format!(
                        "restriction via node {} unknown",
                        m.ref_id
                    )));
                }
                Ok(vec![m.ref_id])
            }
            ("way", _) => self.way_node_chains.get(&m.ref_id).cloned().ok_or_else(|| {
                GraphError::InputInvalid(format!("restriction way {} not usable", m.ref_id))
            }),
            _ => Err(GraphError::InputInvalid(format!(
                "unsupported restriction member {}/{}",
                m.member_type, m.role
            ))),
        }
    }

    /// Stitches `from`/`via`/`to` node chains into one path, reversing
    /// segments as needed so each one connects to the next (teacher's
    /// `flatten_restriction_nodes`).
    fn flatten_chain(mut chains: Vec<Vec<i64>>) -> Result<Vec<i64>> {
        if chains.len() < 2 {
            return Err(GraphError::InputInvalid(
                "restriction has too few members".into(),
            ));
        }

        let mut from_chain = chains.remove(0);
        let next_start = *chains[0].first().unwrap();
        let next_end = *chains[0].last().unwrap();

        if *from_chain.first().unwrap() == next_start || *from_chain.first().unwrap() == next_end {
            from_chain.reverse();
        }
        if *from_chain.last().unwrap() != next_start && *from_chain.last().unwrap() != next_end {
            return Err(GraphError::InputInvalid(
                "restriction 'from' member disjoint from 'via'".into(),
            ));
        }

        let mut path = if from_chain.len() >= 2 {
            from_chain[from_chain.len() - 2..].to_vec()
        } else {
            from_chain
        };

        for mut chain in chains {
            if *path.last().unwrap() == *chain.last().unwrap() {
                chain.reverse();
            }
            if *path.last().unwrap() != *chain.first().unwrap() {
                return Err(GraphError::InputInvalid(
                    "restriction member chain disjoint".into(),
                ));
            }
            path.extend_from_slice(&chain[1..]);
        }

        Ok(path)
    }

    /// Node-splitting compilation (spec.md §4.5). Walks the via chain one
    /// hop at a time, minting a phantom per via node and redirecting the
    /// approach edge onto it; only the final hop applies the actual
    /// `no_*`/`only_*` fan-out, intermediate hops simply continue along
    /// the mandated via path.
    fn compile_restriction(&mut self, path: &[i64], kind: RestrictionKind) -> Result<()> {
        let mut from_id = path[0];
        let mut approach_cost = self.graph.get_edge(from_id, path[1]);
        if !approach_cost.is_finite() {
            return Err(GraphError::InputInvalid(
                "restriction 'from->via' edge not found".into(),
            ));
        }

        let last_via_index = path.len() - 2;

        for i in 1..=last_via_index {
            let via_id = path[i];
            let via_node = self.graph.get_node(via_id);
            if via_node.is_zero() {
                return Err(GraphError::InputInvalid(
                    "restriction via node not in graph".into(),
                ));
            }

            let phantom_id = self.graph.allocate_phantom_id();
            self.graph.set_node(Node {
                id: phantom_id,
                osm_id: via_id,
                lat: via_node.lat,
                lon: via_node.lon,
            });

            if i == 1 {
                self.graph.delete_edge(from_id, via_id);
            }
            self.graph.set_edge(from_id, Edge { to: phantom_id, cost: approach_cost });

            let via_edges: Vec<Edge> = self.graph.get_edges(via_id).to_vec();
            let next_id = path[i + 1];

            if i == last_via_index {
                match kind {
                    RestrictionKind::Mandatory => {
                        let target = via_edges.iter().find(|e| e.to == next_id).copied().ok_or_else(|| {
                            GraphError::InputInvalid(
                                "restriction 'via->to' edge not found for mandatory turn".into(),
                            )
                        })?;
                        self.graph.set_edge(phantom_id, target);
                    }
                    RestrictionKind::Prohibitory => {
                        for edge in via_edges.into_iter().filter(|e| e.to != next_id) {
                            self.graph.set_edge(phantom_id, edge);
                        }
                    }
                }
            } else {
                let target = via_edges.iter().find(|e| e.to == next_id).copied().ok_or_else(|| {
                    GraphError::InputInvalid("restriction via chain is disconnected".into())
                })?;
                approach_cost = target.cost;
                self.graph.set_edge(phantom_id, target);
            }

            from_id = phantom_id;
        }

        Ok(())
    }
}
