use crate::graph::{Graph, Node};
use crate::spatial::geometry::{earth_distance, km_per_degree_lat, km_per_degree_lon};

struct Arena {
    node: Node,
    left: Option<usize>,
    right: Option<usize>,
}

/// A static 2-d tree over a graph's canonical nodes (spec.md §4.3).
///
/// Built once via `build`; never mutated. Subsequent mutations to the
/// source graph are not reflected — the tree holds a copy of node
/// positions and ids, not a reference back into the graph.
pub struct KdTree {
    arena: Vec<Arena>,
    root: Option<usize>,
}

impl KdTree {
    pub fn build(graph: &Graph) -> KdTree {
        let mut points: Vec<Node> = graph
            .get_nodes()
            .filter(|n| n.id == n.osm_id)
            .cloned()
            .collect();

        if points.is_empty() {
            return KdTree {
                arena: Vec::new(),
                root: None,
            };
        }

        let mut arena = Vec::with_capacity(points.len());
        let root = Self::build_subtree(&mut points, 0, &mut arena);
        KdTree {
            arena,
            root: Some(root),
        }
    }

    fn build_subtree(points: &mut [Node], depth: usize, arena: &mut Vec<Arena>) -> usize {
        let axis_is_lat = depth % 2 == 0;
        let mid = points.len() / 2;

        points.select_nth_unstable_by(mid, |a, b| {
            let (ka, kb) = if axis_is_lat {
                (a.lat, b.lat)
            } else {
                (a.lon, b.lon)
            };
            ka.partial_cmp(&kb).unwrap()
        });

        let median = points[mid].clone();
        let (left_slice, rest) = points.split_at_mut(mid);
        let right_slice = &mut rest[1..];

        let left = (!left_slice.is_empty()).then(|| Self::build_subtree(left_slice, depth + 1, arena));
        let right = (!right_slice.is_empty()).then(|| Self::build_subtree(right_slice, depth + 1, arena));

        arena.push(Arena {
            node: median,
            left,
            right,
        });
        arena.len() - 1
    }

    /// Nearest canonical node to `(lat, lon)`, or the zero node if the tree is empty.
    /// Must agree with [`Graph::find_nearest_node`] for every query (invariant 4).
    pub fn nearest(&self, lat: f32, lon: f32) -> Node {
        let Some(root) = self.root else {
            return Node::zero();
        };

        let mut best: Option<(f64, usize)> = None;
        self.search(root, lat as f64, lon as f64, 0, &mut best);
        best.map(|(_, idx)| self.arena[idx].node.clone())
            .unwrap_or_else(Node::zero)
    }

    fn search(&self, idx: usize, qlat: f64, qlon: f64, depth: usize, best: &mut Option<(f64, usize)>) {
        let entry = &self.arena[idx];
        let d = earth_distance(qlat, qlon, entry.node.lat as f64, entry.node.lon as f64);
        self.consider(idx, d, best);

        let axis_is_lat = depth % 2 == 0;
        let (query_coord, node_coord) = if axis_is_lat {
            (qlat, entry.node.lat as f64)
        } else {
            (qlon, entry.node.lon as f64)
        };
        let delta = query_coord - node_coord;

        let (near, far) = if delta <= 0.0 {
            (entry.left, entry.right)
        } else {
            (entry.right, entry.left)
        };

        if let Some(near_idx) = near {
            self.search(near_idx, qlat, qlon, depth + 1, best);
        }

        if let Some(far_idx) = far {
            let gap_km = if axis_is_lat {
                km_per_degree_lat() * delta.abs()
            } else {
                let min_abs_lat = qlat.abs().min((entry.node.lat as f64).abs());
                km_per_degree_lon(min_abs_lat) * delta.abs()
            };

            let cannot_beat_best = match best {
                Some((best_d, _)) => gap_km >= *best_d,
                None => false,
            };

            if !cannot_beat_best {
                self.search(far_idx, qlat, qlon, depth + 1, best);
            }
        }
    }

    fn consider(&self, idx: usize, distance: f64, best: &mut Option<(f64, usize)>) {
        let candidate_id = self.arena[idx].node.id;
        let is_better = match best {
            None => true,
            Some((best_d, best_idx)) => {
                distance < *best_d
                    || (distance == *best_d && candidate_id < self.arena[*best_idx].node.id)
            }
        };
        if is_better {
            *best = Some((distance, idx));
        }
    }
}
