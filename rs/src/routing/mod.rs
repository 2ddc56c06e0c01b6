use crate::core::errors::{GraphError, Result};
use crate::graph::Graph;
use crate::spatial::earth_distance;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Copy, Clone, PartialEq)]
struct QueueEntry<S> {
    state: S,
    f: f32,
    g: f32,
}

impl<S: PartialEq> Eq for QueueEntry<S> {}

impl<S: PartialEq> Ord for QueueEntry<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the smallest f (then g) pops first.
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.g.partial_cmp(&self.g).unwrap_or(Ordering::Equal))
    }
}

impl<S: PartialEq> PartialOrd for QueueEntry<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn heuristic(graph: &Graph, from: i64, to_lat: f32, to_lon: f32) -> f32 {
    let node = graph.get_node(from);
    earth_distance(node.lat as f64, node.lon as f64, to_lat as f64, to_lon as f64) as f32
}

/// Replaces every phantom node id in `path` with its canonical `osm_id`
/// (spec.md §4.6, "Canonicalization of output").
fn canonicalize(graph: &Graph, path: Vec<i64>) -> Vec<i64> {
    path.into_iter().map(|id| graph.get_node(id).osm_id).collect()
}

fn validate_endpoints(graph: &Graph, from: i64, to: i64) -> Result<()> {
    if graph.get_node(from).is_zero() {
        return Err(GraphError::InvalidReference(from));
    }
    if graph.get_node(to).is_zero() {
        return Err(GraphError::InvalidReference(to));
    }
    Ok(())
}

/// Plain A* over node ids (spec.md §4.6, "plain variant").
pub fn find_route(graph: &Graph, from: i64, to: i64, step_limit: usize) -> Result<Vec<i64>> {
    validate_endpoints(graph, from, to)?;
    if from == to {
        return Ok(vec![from]);
    }

    let target = graph.get_node(to);
    let mut g_score: FxHashMap<i64, f32> = FxHashMap::default();
    let mut came_from: FxHashMap<i64, i64> = FxHashMap::default();
    let mut heap = BinaryHeap::new();

    g_score.insert(from, 0.0);
    heap.push(QueueEntry {
        state: from,
        f: heuristic(graph, from, target.lat, target.lon),
        g: 0.0,
    });

    let mut steps = 0usize;

    while let Some(entry) = heap.pop() {
        let u = entry.state;
        let best_g = *g_score.get(&u).unwrap_or(&f32::INFINITY);
        if entry.g > best_g {
            continue; // stale entry
        }

        if u == to {
            return Ok(canonicalize(graph, reconstruct(&came_from, u)));
        }

        steps += 1;
        if steps > step_limit {
            return Err(GraphError::StepLimitExceeded);
        }

        for edge in graph.get_edges(u) {
            let tentative_g = best_g + edge.cost;
            let existing = *g_score.get(&edge.to).unwrap_or(&f32::INFINITY);
            if tentative_g < existing {
                g_score.insert(edge.to, tentative_g);
                came_from.insert(edge.to, u);
                let f = tentative_g + heuristic(graph, edge.to, target.lat, target.lon);
                heap.push(QueueEntry { state: edge.to, f, g: tentative_g });
            }
        }
    }

    Ok(Vec::new())
}

fn reconstruct(came_from: &FxHashMap<i64, i64>, mut current: i64) -> Vec<i64> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// A* whose state is `(current, predecessor)`, forbidding the immediate
/// reversal `u -> p` (spec.md §4.6, "without turn around"). Required
/// whenever restrictions are present: phantom-node splitting alone does not
/// stop a route from leaving `v` and immediately returning to bypass it.
pub fn find_route_without_turn_around(
    graph: &Graph,
    from: i64,
    to: i64,
    step_limit: usize,
) -> Result<Vec<i64>> {
    validate_endpoints(graph, from, to)?;
    if from == to {
        return Ok(vec![from]);
    }

    let target = graph.get_node(to);
    let start_state = (from, 0i64);

    let mut g_score: FxHashMap<(i64, i64), f32> = FxHashMap::default();
    let mut came_from: FxHashMap<(i64, i64), (i64, i64)> = FxHashMap::default();
    let mut heap = BinaryHeap::new();

    g_score.insert(start_state, 0.0);
    heap.push(QueueEntry {
        state: start_state,
        f: heuristic(graph, from, target.lat, target.lon),
        g: 0.0,
    });

    let mut steps = 0usize;

    while let Some(entry) = heap.pop() {
        let (u, pred) = entry.state;
        let best_g = *g_score.get(&entry.state).unwrap_or(&f32::INFINITY);
        if entry.g > best_g {
            continue;
        }

        if u == to {
            let states = reconstruct_states(&came_from, entry.state);
            let path = states.into_iter().map(|(node, _)| node).collect();
            return Ok(canonicalize(graph, path));
        }

        steps += 1;
        if steps > step_limit {
            return Err(GraphError::StepLimitExceeded);
        }

        for edge in graph.get_edges(u) {
            if edge.to == pred {
                continue; // no immediate reversal
            }
            let tentative_g = best_g + edge.cost;
            let next_state = (edge.to, u);
            let existing = *g_score.get(&next_state).unwrap_or(&f32::INFINITY);
            if tentative_g < existing {
                g_score.insert(next_state, tentative_g);
                came_from.insert(next_state, entry.state);
                let f = tentative_g + heuristic(graph, edge.to, target.lat, target.lon);
                heap.push(QueueEntry { state: next_state, f, g: tentative_g });
            }
        }
    }

    Ok(Vec::new())
}

fn reconstruct_states(
    came_from: &FxHashMap<(i64, i64), (i64, i64)>,
    mut current: (i64, i64),
) -> Vec<(i64, i64)> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
