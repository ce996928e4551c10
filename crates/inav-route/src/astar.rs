//! A* shortest path over the routing graph.
//!
//! Priority-queue search with an admissible heuristic: geodesic distance to
//! the goal plus a [`FLOOR_CHANGE_PENALTY_M`] tie-breaker when the node is
//! on a different floor than the goal.  The penalty never overestimates —
//! any real cross-floor traversal costs more than 10 m once connector
//! weights are counted — so it only nudges the search toward staying on the
//! goal floor between otherwise-equal candidates.
//!
//! Re-expansion is prevented lazily: popped nodes enter a closed set, and a
//! node re-reached with a smaller cost is simply pushed again (stale heap
//! entries are skipped on pop).

use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use inav_core::Coord;
use inav_graph::{Edge, EdgeKind, Graph, Node, NodeKind};

use crate::error::{RouteError, RouteResult};

/// Heuristic surcharge for being on a different floor than the goal.
pub const FLOOR_CHANGE_PENALTY_M: f64 = 10.0;

// ── Options ───────────────────────────────────────────────────────────────────

/// Constraints and tuning for one search.
pub struct SearchOptions<'a> {
    /// Reject edges with `accessible == false` (stairs).
    pub accessible_only: bool,
    /// Reject edges of kind `stairs` regardless of accessibility.
    pub avoid_stairs: bool,
    /// Scalar on the heuristic.  1.0 is exact A*; > 1 is weighted A*
    /// (faster, possibly suboptimal).
    pub heuristic_weight: f64,
    /// Room-traversal whitelist; see [`Self::disallow_other_rooms`].
    pub allowed_room_ids: Option<&'a FxHashSet<String>>,
    /// When set together with `allowed_room_ids`, a non-door non-connector
    /// node is traversable only if its `room_ids` is empty (public walkway)
    /// or intersects the whitelist.
    pub disallow_other_rooms: bool,
    /// Arbitrary node predicate, e.g. rejecting locked doors.
    pub node_filter: Option<&'a dyn Fn(&Node) -> bool>,
}

impl Default for SearchOptions<'_> {
    fn default() -> Self {
        Self {
            accessible_only: false,
            avoid_stairs: false,
            heuristic_weight: 1.0,
            allowed_room_ids: None,
            disallow_other_rooms: false,
            node_filter: None,
        }
    }
}

pub(crate) fn edge_allowed(edge: &Edge, opts: &SearchOptions) -> bool {
    if opts.accessible_only && !edge.accessible {
        return false;
    }
    if opts.avoid_stairs && edge.kind == EdgeKind::Stairs {
        return false;
    }
    true
}

pub(crate) fn node_allowed(node: &Node, opts: &SearchOptions) -> bool {
    if let Some(filter) = opts.node_filter {
        if !filter(node) {
            return false;
        }
    }
    if opts.disallow_other_rooms {
        if let Some(allowed) = opts.allowed_room_ids {
            let exempt = matches!(
                node.kind,
                NodeKind::Door | NodeKind::Stairs | NodeKind::Elevator
            );
            if !exempt
                && !node.meta.room_ids.is_empty()
                && !node.meta.room_ids.iter().any(|r| allowed.contains(r))
            {
                return false;
            }
        }
    }
    true
}

pub(crate) fn heuristic_m(node: &Node, goal: &Node) -> f64 {
    let mut h = node.coord.distance_m(goal.coord);
    if node.floor_id != goal.floor_id {
        h += FLOOR_CHANGE_PENALTY_M;
    }
    h
}

// ── Results ───────────────────────────────────────────────────────────────────

/// One hop of a found path.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub from: String,
    pub to: String,
    pub from_coord: Coord,
    pub to_coord: Coord,
    pub distance_m: f64,
    pub from_floor: String,
    pub to_floor: String,
    pub floor_change: bool,
}

/// A found path through the graph.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathResult {
    pub node_ids: Vec<String>,
    pub coords: Vec<Coord>,
    pub floors: Vec<String>,
    pub distance_m: f64,
    pub segments: Vec<Segment>,
}

/// Build a [`PathResult`] from the start node and the path edges in travel
/// order.
pub(crate) fn build_result(graph: &Graph, start_id: &str, edges: &[Edge]) -> PathResult {
    let start = graph.node(start_id).expect("path start resolved before build");

    let mut result = PathResult {
        node_ids: vec![start.id.clone()],
        coords: vec![start.coord],
        floors: vec![start.floor_id.clone()],
        distance_m: 0.0,
        segments: Vec::with_capacity(edges.len()),
    };

    let mut prev: &Node = start;
    for edge in edges {
        let next = graph.node(&edge.to).expect("path edge endpoint resolved");
        let distance_m = if edge.weight_m.is_finite() {
            edge.weight_m
        } else {
            prev.coord.distance_m(next.coord)
        };
        result.segments.push(Segment {
            from: prev.id.clone(),
            to: next.id.clone(),
            from_coord: prev.coord,
            to_coord: next.coord,
            distance_m,
            from_floor: prev.floor_id.clone(),
            to_floor: next.floor_id.clone(),
            floor_change: prev.floor_id != next.floor_id,
        });
        result.node_ids.push(next.id.clone());
        result.coords.push(next.coord);
        result.floors.push(next.floor_id.clone());
        result.distance_m += distance_m;
        prev = next;
    }
    result
}

// ── Heap entry ────────────────────────────────────────────────────────────────

/// Min-heap entry: `BinaryHeap` is a max-heap, so the ordering is inverted
/// here.  Ties break on node id for deterministic expansion order.
#[derive(Clone, Debug)]
pub(crate) struct OpenEntry {
    pub f: f64,
    pub id: String,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for OpenEntry {}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

// ── Search ────────────────────────────────────────────────────────────────────

/// A* from `from` to `to`.  `Ok(None)` means no path under the given
/// constraints; `Err` only for unknown node ids.
pub fn find_path(
    graph: &Graph,
    from: &str,
    to: &str,
    opts: &SearchOptions,
) -> RouteResult<Option<PathResult>> {
    graph
        .node(from)
        .ok_or_else(|| RouteError::NodeNotFound(from.to_string()))?;
    let goal = graph
        .node(to)
        .ok_or_else(|| RouteError::NodeNotFound(to.to_string()))?;

    if from == to {
        return Ok(Some(build_result(graph, from, &[])));
    }

    let mut g_score: FxHashMap<String, f64> = FxHashMap::default();
    let mut came_from: FxHashMap<String, Edge> = FxHashMap::default();
    let mut closed: FxHashSet<String> = FxHashSet::default();
    let mut open = BinaryHeap::new();

    g_score.insert(from.to_string(), 0.0);
    open.push(OpenEntry { f: 0.0, id: from.to_string() });

    while let Some(OpenEntry { id, .. }) = open.pop() {
        if id == to {
            return Ok(Some(reconstruct(graph, &came_from, from, to)));
        }
        if !closed.insert(id.clone()) {
            continue;
        }

        let g_here = g_score[&id];
        let here = graph.node(&id).expect("open-set ids resolve");

        for edge in graph.edges_from(&id) {
            if !edge_allowed(edge, opts) {
                continue;
            }
            let Some(next) = graph.node(&edge.to) else {
                continue;
            };
            if !node_allowed(next, opts) {
                continue;
            }

            let weight = if edge.weight_m.is_finite() {
                edge.weight_m
            } else {
                here.coord.distance_m(next.coord)
            };
            let tentative = g_here + weight;
            if tentative < *g_score.get(&edge.to).unwrap_or(&f64::INFINITY) {
                g_score.insert(edge.to.clone(), tentative);
                came_from.insert(edge.to.clone(), edge.clone());
                open.push(OpenEntry {
                    f: tentative + heuristic_m(next, goal) * opts.heuristic_weight,
                    id: edge.to.clone(),
                });
            }
        }
    }
    Ok(None)
}

fn reconstruct(
    graph: &Graph,
    came_from: &FxHashMap<String, Edge>,
    from: &str,
    to: &str,
) -> PathResult {
    let mut edges: Vec<Edge> = Vec::new();
    let mut cur = to;
    while cur != from {
        let edge = &came_from[cur];
        edges.push(edge.clone());
        cur = &edge.from;
    }
    edges.reverse();
    build_result(graph, from, &edges)
}
