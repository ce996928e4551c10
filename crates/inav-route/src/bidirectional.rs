//! Bidirectional A*.
//!
//! Alternates one expansion on the forward and backward frontier and tracks
//! the best meeting node.  The search terminates when the best meeting total
//! is no greater than the sum of the two heap-top priorities — a valid lower
//! bound with admissible, unweighted heuristics.  With
//! `heuristic_weight > 1` the bound is only approximate and the result may
//! be slightly suboptimal; that behavior is retained deliberately.
//!
//! The backward frontier reuses `edges_out`: the edge builder materializes
//! every visibility and connector edge as a symmetric pair, so forward
//! adjacency doubles as reverse adjacency.  A future one-way connector
//! would need an `edges_in` mirror here.

use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use inav_graph::{Edge, Graph};

use crate::astar::{OpenEntry, PathResult, SearchOptions, build_result, edge_allowed, heuristic_m, node_allowed};
use crate::error::{RouteError, RouteResult};

struct Frontier {
    open: BinaryHeap<OpenEntry>,
    g: FxHashMap<String, f64>,
    came: FxHashMap<String, Edge>,
    closed: FxHashSet<String>,
}

impl Frontier {
    fn seeded(id: &str) -> Self {
        let mut f = Self {
            open: BinaryHeap::new(),
            g: FxHashMap::default(),
            came: FxHashMap::default(),
            closed: FxHashSet::default(),
        };
        f.g.insert(id.to_string(), 0.0);
        f.open.push(OpenEntry { f: 0.0, id: id.to_string() });
        f
    }

    fn top_priority(&self) -> Option<f64> {
        self.open.peek().map(|e| e.f)
    }
}

/// Bidirectional A* from `from` to `to` under the same option set as
/// [`find_path`](crate::astar::find_path).
pub fn find_path_bidirectional(
    graph: &Graph,
    from: &str,
    to: &str,
    opts: &SearchOptions,
) -> RouteResult<Option<PathResult>> {
    let start = graph
        .node(from)
        .ok_or_else(|| RouteError::NodeNotFound(from.to_string()))?;
    let goal = graph
        .node(to)
        .ok_or_else(|| RouteError::NodeNotFound(to.to_string()))?;

    if from == to {
        return Ok(Some(build_result(graph, from, &[])));
    }

    let mut fwd = Frontier::seeded(from);
    let mut bwd = Frontier::seeded(to);
    let mut best: Option<(String, f64)> = None;
    let mut expand_forward = true;

    loop {
        match (fwd.top_priority(), bwd.top_priority()) {
            (None, None) => break,
            (Some(ft), Some(bt)) => {
                if let Some((_, total)) = &best {
                    if *total <= ft + bt {
                        break;
                    }
                }
            }
            // One side exhausted: its settled set can no longer grow, so the
            // current best meeting (if any) is final.
            (None, Some(_)) | (Some(_), None) => {
                if best.is_some() {
                    break;
                }
            }
        }

        let side_forward = match (expand_forward, fwd.open.is_empty(), bwd.open.is_empty()) {
            (_, true, true) => break,
            (_, true, false) => false,
            (_, false, true) => true,
            (want, false, false) => want,
        };
        expand_forward = !side_forward;

        let (this, other, target) = if side_forward {
            (&mut fwd, &bwd, goal)
        } else {
            (&mut bwd, &fwd, start)
        };

        let Some(OpenEntry { id, .. }) = this.open.pop() else {
            continue;
        };
        if !this.closed.insert(id.clone()) {
            continue;
        }

        let g_here = this.g[&id];
        if let Some(g_other) = other.g.get(&id) {
            let total = g_here + g_other;
            if best.as_ref().is_none_or(|(_, t)| total < *t) {
                best = Some((id.clone(), total));
            }
        }

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
            if tentative < *this.g.get(&edge.to).unwrap_or(&f64::INFINITY) {
                this.g.insert(edge.to.clone(), tentative);
                // Stored in travel order for this side: forward edges point
                // toward the goal, backward edges are reversed on storage so
                // reconstruction always walks start → goal.
                let stored = if side_forward { edge.clone() } else { edge.reversed() };
                this.came.insert(edge.to.clone(), stored);
                this.open.push(OpenEntry {
                    f: tentative + heuristic_m(next, target) * opts.heuristic_weight,
                    id: edge.to.clone(),
                });
            }
        }
    }

    let Some((meeting, _)) = best else {
        return Ok(None);
    };

    // Forward half: walk came-from links back to the start.
    let mut edges: Vec<Edge> = Vec::new();
    let mut cur = meeting.as_str();
    while cur != from {
        let edge = &fwd.came[cur];
        edges.push(edge.clone());
        cur = &edge.from;
    }
    edges.reverse();

    // Backward half: stored edges already run meeting → goal.
    let mut cur = meeting.as_str();
    while cur != to {
        let edge = &bwd.came[cur];
        edges.push(edge.clone());
        cur = &edge.to;
    }

    Ok(Some(build_result(graph, from, &edges)))
}
