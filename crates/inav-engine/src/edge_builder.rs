//! Visibility-edge construction.
//!
//! Per floor, every node queries its spatial neighborhood, oversamples
//! candidates, and accepts the nearest ones that pass line-of-sight.  The
//! oversampling matters: truncating to the `max_neighbors` nearest *before*
//! the line-of-sight filter fragments the graph whenever the nearest
//! candidates all sit on the wrong side of a wall.  So the pool is capped at
//! [`OVERSAMPLE_FACTOR`]`·max_neighbors`, then edges are accepted in
//! ascending distance order until the per-node cap is reached.
//!
//! The build is long-running and cooperative: it yields every
//! `yield_every` nodes or `yield_after_ms` milliseconds, and checks the
//! cancellation flag at each yield point.  Edge output is deterministic
//! under identical inputs regardless of yield scheduling — floors and nodes
//! are processed in sorted order, and the `parallel` feature merges
//! per-floor results back in floor order.

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::debug;

use inav_core::{Coord, M_PER_DEG_LAT, m_per_deg_lng};
use inav_graph::{Edge, EdgeKind, Graph};
use inav_model::CollisionDetector;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Candidate pools are capped at this multiple of `max_neighbors` before
/// line-of-sight filtering.  Chosen empirically; what must not change is
/// the accept-in-ascending-distance-order semantics.
const OVERSAMPLE_FACTOR: usize = 6;

/// Hooks into a running build: cancellation, a yield hook (defaults to
/// `std::thread::yield_now`), and a per-floor completion callback.
#[derive(Default)]
pub struct BuildControl<'a> {
    pub cancel: Option<&'a AtomicBool>,
    pub yield_hook: Option<&'a (dyn Fn() + Sync)>,
    pub on_floor_done: Option<&'a mut (dyn FnMut(usize, &str, usize) + Send)>,
}

struct YieldBudget {
    every: usize,
    after: Duration,
    processed: usize,
    last: Instant,
}

impl YieldBudget {
    fn new(config: &EngineConfig) -> Self {
        Self {
            every: config.yield_every.max(1),
            after: Duration::from_millis(config.yield_after_ms),
            processed: 0,
            last: Instant::now(),
        }
    }

    /// True when a yield is due; resets the counters.
    fn due(&mut self) -> bool {
        self.processed += 1;
        if self.processed >= self.every || self.last.elapsed() >= self.after {
            self.processed = 0;
            self.last = Instant::now();
            true
        } else {
            false
        }
    }
}

fn cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|c| c.load(Ordering::Relaxed))
}

/// Build all visibility edges for the graph.
///
/// Returned edges are in deterministic order: floors ascending, source
/// nodes ascending, candidates by ascending distance.  Every accepted pair
/// appears as both directed edges with identical weight.
pub fn build_visibility_edges(
    graph: &Graph,
    collision: &CollisionDetector,
    config: &EngineConfig,
    ctl: &mut BuildControl,
) -> EngineResult<Vec<Edge>> {
    if cancelled(ctl.cancel) {
        return Err(EngineError::Cancelled);
    }
    let floors: Vec<&str> = graph.floors();

    #[cfg(not(feature = "parallel"))]
    let per_floor: Vec<Vec<Edge>> = {
        let mut budget = YieldBudget::new(config);
        let cancel = ctl.cancel;
        let hook = ctl.yield_hook;
        let mut out = Vec::with_capacity(floors.len());
        for floor_id in &floors {
            let edges = build_floor_edges(graph, collision, config, floor_id, &mut || {
                if budget.due() {
                    if cancelled(cancel) {
                        return Err(EngineError::Cancelled);
                    }
                    match hook {
                        Some(h) => h(),
                        None => std::thread::yield_now(),
                    }
                }
                Ok(())
            })?;
            out.push(edges);
        }
        out
    };

    #[cfg(feature = "parallel")]
    let per_floor: Vec<Vec<Edge>> = {
        use rayon::prelude::*;
        let cancel = ctl.cancel;
        floors
            .par_iter()
            .map(|floor_id| {
                build_floor_edges(graph, collision, config, floor_id, &mut || {
                    if cancelled(cancel) {
                        return Err(EngineError::Cancelled);
                    }
                    Ok(())
                })
            })
            .collect::<EngineResult<Vec<_>>>()?
    };

    let mut edges = Vec::new();
    for (index, (floor_id, floor_edges)) in floors.iter().zip(per_floor).enumerate() {
        debug!("floor {index} ({floor_id}): {} visibility edges", floor_edges.len());
        if let Some(done) = ctl.on_floor_done.as_mut() {
            done(index, floor_id, floor_edges.len());
        }
        edges.extend(floor_edges);
    }
    Ok(edges)
}

/// Bounded-heap candidate: max-heap entry so pushing past capacity pops the
/// farthest.
struct Cand<'s> {
    sq_deg: f64,
    id: &'s str,
    coord: Coord,
}

impl Ord for Cand<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sq_deg
            .total_cmp(&other.sq_deg)
            .then_with(|| self.id.cmp(other.id))
    }
}

impl PartialOrd for Cand<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Cand<'_> {}

impl PartialEq for Cand<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

/// Push into the bounded selection heap, evicting the farthest candidate
/// once the pool is over capacity.
fn push_candidate<'s>(
    pool: &mut BinaryHeap<Cand<'s>>,
    cap: usize,
    from: Coord,
    self_id: &str,
    id: &'s str,
    coord: Coord,
) {
    if id == self_id {
        return;
    }
    pool.push(Cand { sq_deg: from.sq_deg(coord), id, coord });
    if pool.len() > cap {
        pool.pop();
    }
}

fn build_floor_edges(
    graph: &Graph,
    collision: &CollisionDetector,
    config: &EngineConfig,
    floor_id: &str,
    pause: &mut dyn FnMut() -> EngineResult<()>,
) -> EngineResult<Vec<Edge>> {
    let ids = graph.floor_nodes(floor_id);
    let pool_cap = config.max_neighbors.max(OVERSAMPLE_FACTOR * config.max_neighbors);

    let mut edges: Vec<Edge> = Vec::new();

    for id_a in ids {
        pause()?;
        let a = graph.node(id_a).expect("floor partition ids resolve");

        // Degree box around A: metres converted at A's latitude.
        let d_lat = config.max_distance_m / M_PER_DEG_LAT;
        let d_lng = config.max_distance_m / m_per_deg_lng(a.coord.lat);
        let min = Coord::new(a.coord.lng - d_lng, a.coord.lat - d_lat);
        let max = Coord::new(a.coord.lng + d_lng, a.coord.lat + d_lat);

        // Spatial query with a linear bbox fallback for index-less floors.
        let mut pool: BinaryHeap<Cand> = BinaryHeap::with_capacity(pool_cap + 1);
        match graph.spatial(floor_id) {
            Some(index) => {
                for entry in index.query(min, max) {
                    push_candidate(&mut pool, pool_cap, a.coord, id_a, entry.id(), entry.coord());
                }
            }
            None => {
                for id in ids {
                    let node = graph.node(id).expect("floor partition ids resolve");
                    let c = node.coord;
                    if c.lng >= min.lng && c.lng <= max.lng && c.lat >= min.lat && c.lat <= max.lat
                    {
                        push_candidate(&mut pool, pool_cap, a.coord, id_a, id.as_str(), c);
                    }
                }
            }
        }

        let mut candidates = pool.into_vec();
        candidates.sort_unstable_by(|x, y| {
            x.sq_deg.total_cmp(&y.sq_deg).then_with(|| x.id.cmp(y.id))
        });

        // Accept the first `max_neighbors` candidates that pass
        // line-of-sight, in ascending distance order.
        let mut accepted = 0;
        for cand in &candidates {
            if accepted >= config.max_neighbors {
                break;
            }
            // Each unordered pair is considered exactly once, by its
            // lower-id member.
            if cand.id <= id_a.as_str() {
                continue;
            }
            let distance = a.coord.distance_m(cand.coord);
            if distance > config.max_distance_m {
                continue;
            }
            if !collision.has_line_of_sight(a.coord, cand.coord, floor_id) {
                continue;
            }
            edges.push(Edge::new(id_a, cand.id, distance, EdgeKind::Walkable, true));
            edges.push(Edge::new(cand.id, id_a, distance, EdgeKind::Walkable, true));
            accepted += 1;
        }
    }
    Ok(edges)
}
