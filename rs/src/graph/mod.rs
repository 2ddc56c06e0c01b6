use crate::spatial::geometry::earth_distance;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A vertex in the routing graph (spec.md §3).
///
/// `id == osm_id` marks a *canonical* node (an original OSM location).
/// `id != osm_id` marks a *phantom* node minted by the restriction compiler
/// to encode "arrived here from a specific predecessor" — it shares
/// `osm_id` and coordinates with the canonical node it shadows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: i64,
    pub osm_id: i64,
    pub lat: f32,
    pub lon: f32,
}

impl Node {
    /// The sentinel "no node" value returned wherever a lookup misses.
    pub fn zero() -> Node {
        Node {
            id: 0,
            osm_id: 0,
            lat: 0.0,
            lon: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.id == 0
    }

    pub fn is_canonical(&self) -> bool {
        self.id == self.osm_id
    }
}

/// A directed edge. `cost` is kilometers times the profile's penalty
/// multiplier and must be `>= earth_distance(from, to)` for every edge the
/// core itself produces (the A* admissibility invariant, spec.md §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub to: i64,
    pub cost: f32,
}

/// Ids at or above this value are reserved for phantom nodes minted during
/// restriction compilation; real OSM ids never reach it in practice, but the
/// graph also tracks the true running maximum to stay correct if they ever did.
pub const PHANTOM_ID_FLOOR: i64 = 0x0008_0000_0000_0000;

/// The routing graph: a directed multigraph of [`Node`]s and [`Edge`]s with
/// insertion-ordered per-source adjacency lists (spec.md §3, §4.2).
///
/// The graph exclusively owns its nodes and edge lists. Iteration and edge
/// views borrow from it and are invalidated by the next mutation — the
/// compiler enforces this through ordinary borrow checking rather than a
/// runtime generation counter.
///
/// Nodes live in an insertion-ordered `slots` vector (the teacher's `Vec<RouteNode>`
/// CSR storage, generalized to tolerate deletion): a deleted node's slot
/// becomes `None` rather than being removed, so ids already handed out never
/// shift and `get_nodes()` keeps yielding the survivors in first-insert order.
/// `index` is the `id -> slot` lookup the `FxHashMap` alone used to provide.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    index: FxHashMap<i64, usize>,
    slots: Vec<Option<Node>>,
    edges: FxHashMap<i64, Vec<Edge>>,
    next_phantom_id: i64,
}

impl Graph {
    pub fn new() -> Graph {
        Graph {
            index: FxHashMap::default(),
            slots: Vec::new(),
            edges: FxHashMap::default(),
            next_phantom_id: PHANTOM_ID_FLOOR,
        }
    }

    /// Node count and an insertion-order iterator, per spec.md §4.2. Unlike
    /// the original C iterator this borrows from the graph instead of being
    /// terminated by a sentinel node — the borrow checker is the contract.
    pub fn get_nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn get_node(&self, id: i64) -> Node {
        self.index
            .get(&id)
            .and_then(|&idx| self.slots[idx])
            .unwrap_or_else(Node::zero)
    }

    /// Upserts a node. Returns `true` iff a *live* node with this id already
    /// existed. Adjacency is untouched either way. Re-inserting a previously
    /// deleted id reuses its original slot, which keeps `get_nodes()`
    /// emitting that id at its first-ever insertion position rather than at
    /// the end.
    pub fn set_node(&mut self, node: Node) -> bool {
        if node.osm_id >= self.next_phantom_id {
            self.next_phantom_id = node.osm_id + 1;
        }
        if let Some(&idx) = self.index.get(&node.id) {
            let existed = self.slots[idx].is_some();
            self.slots[idx] = Some(node);
            existed
        } else {
            let idx = self.slots.len();
            self.slots.push(Some(node));
            self.index.insert(node.id, idx);
            false
        }
    }

    /// Removes a node and its outgoing edges. Incoming edges from other
    /// sources are deliberately left dangling (spec.md §3: an O(1) delete
    /// beats an O(E) reverse scan; reusing a deleted id is a caller hazard).
    pub fn delete_node(&mut self, id: i64) -> bool {
        self.edges.remove(&id);
        match self.index.get(&id) {
            Some(&idx) if self.slots[idx].is_some() => {
                self.slots[idx] = None;
                true
            }
            _ => false,
        }
    }

    pub fn get_edges(&self, from: i64) -> &[Edge] {
        self.edges.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_edge(&self, from: i64, to: i64) -> f32 {
        self.get_edges(from)
            .iter()
            .find(|e| e.to == to)
            .map(|e| e.cost)
            .unwrap_or(f32::INFINITY)
    }

    /// Upserts an edge. Replacing preserves position in the adjacency list;
    /// a new edge is appended. Returns `true` iff an edge to the same
    /// target already existed.
    pub fn set_edge(&mut self, from: i64, edge: Edge) -> bool {
        let list = self.edges.entry(from).or_default();
        if let Some(existing) = list.iter_mut().find(|e| e.to == edge.to) {
            *existing = edge;
            true
        } else {
            list.push(edge);
            false
        }
    }

    pub fn delete_edge(&mut self, from: i64, to: i64) -> bool {
        match self.edges.get_mut(&from) {
            Some(list) => {
                let before = list.len();
                list.retain(|e| e.to != to);
                list.len() != before
            }
            None => false,
        }
    }

    /// Linear scan over canonical nodes only, breaking ties by lower id
    /// (spec.md §4.2). This is the reference implementation the k-d tree
    /// must agree with (invariant 4).
    pub fn find_nearest_node(&self, lat: f32, lon: f32) -> Node {
        let mut best: Option<(f64, Node)> = None;
        for node in self.get_nodes().filter(|n| n.is_canonical()) {
            let d = earth_distance(lat as f64, lon as f64, node.lat as f64, node.lon as f64);
            let replace = match &best {
                None => true,
                Some((best_d, best_node)) => d < *best_d || (d == *best_d && node.id < best_node.id),
            };
            if replace {
                best = Some((d, *node));
            }
        }
        best.map(|(_, n)| n).unwrap_or_else(Node::zero)
    }

    /// Mints a fresh phantom node id for the restriction compiler: strictly
    /// greater than every OSM id this graph has ever seen via `set_node`.
    pub fn allocate_phantom_id(&mut self) -> i64 {
        let id = self.next_phantom_id;
        self.next_phantom_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crud_s1() {
        let mut g = Graph::new();
        g.set_node(Node { id: 1, osm_id: 1, lat: 0.01, lon: 0.01 });
        g.set_node(Node { id: 2, osm_id: 2, lat: 0.01, lon: 0.05 });
        g.set_node(Node { id: 3, osm_id: 3, lat: 0.03, lon: 0.09 });

        assert_eq!(g.get_node(2).id, 2);
        assert!(g.delete_node(3));
        assert_eq!(g.get_node(3).id, 0);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn delete_node_clears_outgoing_but_not_incoming() {
        let mut g = Graph::new();
        g.set_node(Node { id: 1, osm_id: 1, lat: 0.0, lon: 0.0 });
        g.set_node(Node { id: 2, osm_id: 2, lat: 0.0, lon: 0.01 });
        g.set_edge(1, Edge { to: 2, cost: 1.0 });
        g.set_edge(2, Edge { to: 1, cost: 1.0 });

        g.delete_node(1);
        assert!(g.get_edges(1).is_empty());
        assert_eq!(g.get_edges(2).len(), 1, "incoming edges from 2 into 1 are preserved");
    }

    #[test]
    fn set_edge_overwrite_preserves_order() {
        let mut g = Graph::new();
        g.set_edge(1, Edge { to: 2, cost: 5.0 });
        g.set_edge(1, Edge { to: 3, cost: 7.0 });
        assert!(g.set_edge(1, Edge { to: 2, cost: 1.0 }));

        let edges = g.get_edges(1);
        assert_eq!(edges[0].to, 2);
        assert_eq!(edges[0].cost, 1.0);
        assert_eq!(edges[1].to, 3);
    }

    #[test]
    fn missing_edge_cost_is_infinite() {
        let g = Graph::new();
        assert_eq!(g.get_edge(1, 2), f32::INFINITY);
    }

    #[test]
    fn find_nearest_node_tie_break_by_lower_id() {
        let mut g = Graph::new();
        g.set_node(Node { id: 5, osm_id: 5, lat: 0.0, lon: 0.0 });
        g.set_node(Node { id: 2, osm_id: 2, lat: 0.0, lon: 0.0 });
        assert_eq!(g.find_nearest_node(0.0, 0.0).id, 2);
    }

    #[test]
    fn get_nodes_yields_insertion_order() {
        let mut g = Graph::new();
        g.set_node(Node { id: 5, osm_id: 5, lat: 0.0, lon: 0.0 });
        g.set_node(Node { id: 1, osm_id: 1, lat: 0.0, lon: 0.0 });
        g.set_node(Node { id: 3, osm_id: 3, lat: 0.0, lon: 0.0 });
        g.delete_node(1);
        g.set_node(Node { id: 3, osm_id: 3, lat: 1.0, lon: 1.0 }); // overwrite, not a re-insert

        let ids: Vec<i64> = g.get_nodes().map(|n| n.id).collect();
        assert_eq!(ids, vec![5, 3]);
    }

    #[test]
    fn phantom_ids_never_collide_with_seen_osm_ids() {
        let mut g = Graph::new();
        g.set_node(Node { id: 1, osm_id: 1, lat: 0.0, lon: 0.0 });
        g.set_node(Node {
            id: PHANTOM_ID_FLOOR + 100,
            osm_id: PHANTOM_ID_FLOOR + 100,
            lat: 0.0,
            lon: 0.0,
        });
        let phantom = g.allocate_phantom_id();
        assert!(phantom > PHANTOM_ID_FLOOR + 100);
    }
}
