//! Engine configuration.

use inav_model::RoomThresholds;

/// Above this node count the edge-build knobs tighten automatically.
pub const LARGE_GRAPH_NODES: usize = 8000;

/// Tunables for graph construction and querying.
///
/// | Field                    | Default | Large graph |
/// |--------------------------|---------|-------------|
/// | `max_distance_m`         | 15      | 8           |
/// | `max_neighbors`          | 8       | 6           |
/// | `yield_every`            | 50      | 10          |
/// | `yield_after_ms`         | 16      | 12          |
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Maximum visibility-edge length in metres.
    pub max_distance_m: f64,
    /// Maximum accepted visibility edges per node.
    pub max_neighbors: usize,
    /// Yield after this many nodes processed during the edge build.
    pub yield_every: usize,
    /// Yield after this much wall-clock work since the last yield.
    pub yield_after_ms: u64,
    /// LRU capacity of the query-result cache.
    pub path_cache_size: usize,
    /// `P` in the public-room rule (§ room classification).
    pub public_room_door_count: usize,
    /// `A` in m² in the public-room rule.
    pub public_room_area_m2: f64,
    /// Additive vertical-travel constant on connector edges, metres.
    pub vertical_travel_m: f64,
    /// A* heuristic multiplier; 1.0 = exact.
    pub heuristic_weight: f64,
    /// Use the bidirectional A* variant for queries.
    pub use_bidirectional: bool,
    /// How many nearest walkable nodes to consider per endpoint.
    pub endpoint_candidates: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_distance_m: 15.0,
            max_neighbors: 8,
            yield_every: 50,
            yield_after_ms: 16,
            path_cache_size: 100,
            public_room_door_count: 2,
            public_room_area_m2: 80.0,
            vertical_travel_m: 5.0,
            heuristic_weight: 1.0,
            use_bidirectional: false,
            endpoint_candidates: 5,
        }
    }
}

impl EngineConfig {
    /// The configuration actually used for a graph of `node_count` nodes:
    /// unchanged below [`LARGE_GRAPH_NODES`], tightened above it so the
    /// O(n·k) edge build stays responsive.
    pub fn tightened_for(&self, node_count: usize) -> EngineConfig {
        if node_count <= LARGE_GRAPH_NODES {
            return self.clone();
        }
        EngineConfig {
            max_distance_m: self.max_distance_m.min(8.0),
            max_neighbors: self.max_neighbors.min(6),
            yield_every: 10,
            yield_after_ms: 12,
            ..self.clone()
        }
    }

    pub fn room_thresholds(&self) -> RoomThresholds {
        RoomThresholds {
            min_public_doors: self.public_room_door_count,
            min_area_m2: self.public_room_area_m2,
        }
    }
}
