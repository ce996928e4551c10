//! The routing graph: an arena of string-keyed nodes with directed weighted
//! adjacency, partitioned by floor.
//!
//! # Why string ids
//!
//! Nodes reference each other by stable string id rather than by direct
//! references: no back-pointer cycles, and the cached edge format
//! `(from, to, weight)` serializes trivially.  Adjacency lives in
//! `edges_out` rather than embedded in nodes, so nodes stay immutable while
//! edges accumulate during the build.

use rustc_hash::FxHashMap;

use inav_core::Coord;

use crate::edge::{Edge, EdgeKind};
use crate::error::{GraphError, GraphResult};
use crate::node::Node;
use crate::spatial::SpatialIndex;

/// Default expanding-radius schedule (degrees) for nearest-node queries;
/// the last step is ≈ 200 m.
pub const EXPANDING_RADII_DEG: [f64; 4] = [0.00025, 0.0005, 0.001, 0.002];

#[derive(Default)]
pub struct Graph {
    nodes: FxHashMap<String, Node>,
    edges_out: FxHashMap<String, Vec<Edge>>,
    per_floor: FxHashMap<String, Vec<String>>,
    spatial: FxHashMap<String, SpatialIndex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Nodes ─────────────────────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node) -> GraphResult<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.per_floor
            .entry(node.floor_id.clone())
            .or_default()
            .push(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    #[inline]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable node access.  Used only for the late `room_ids` assignment;
    /// everything else about a node is fixed once added.
    #[inline]
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ── Edges ─────────────────────────────────────────────────────────────

    /// Insert a directed edge.  Both endpoints must already exist and the
    /// weight must be finite and non-negative.
    pub fn add_edge(&mut self, edge: Edge) -> GraphResult<()> {
        if !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to) {
            return Err(GraphError::MissingEndpoint { from: edge.from, to: edge.to });
        }
        if !edge.weight_m.is_finite() || edge.weight_m < 0.0 {
            return Err(GraphError::InvalidWeight {
                from: edge.from,
                to: edge.to,
                weight: edge.weight_m,
            });
        }
        self.edges_out.entry(edge.from.clone()).or_default().push(edge);
        Ok(())
    }

    /// Insert the edge and its reverse.
    pub fn add_edge_pair(
        &mut self,
        from: &str,
        to: &str,
        weight_m: f64,
        kind: EdgeKind,
        accessible: bool,
    ) -> GraphResult<()> {
        let forward = Edge::new(from, to, weight_m, kind, accessible);
        self.add_edge(forward.reversed())?;
        self.add_edge(forward)
    }

    /// Outgoing edges of `id`; empty for unknown or isolated nodes.
    pub fn edges_from(&self, id: &str) -> &[Edge] {
        self.edges_out.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges_out.values().flatten()
    }

    pub fn edge_count(&self) -> usize {
        self.edges_out.values().map(Vec::len).sum()
    }

    pub fn degree(&self, id: &str) -> usize {
        self.edges_from(id).len()
    }

    // ── Floors ────────────────────────────────────────────────────────────

    /// Floor ids, sorted for deterministic iteration.
    pub fn floors(&self) -> Vec<&str> {
        let mut floors: Vec<&str> = self.per_floor.keys().map(String::as_str).collect();
        floors.sort_unstable();
        floors
    }

    /// Node ids on a floor.  Sorted after
    /// [`build_spatial_indexes`](Self::build_spatial_indexes); insertion
    /// order before.
    pub fn floor_nodes(&self, floor_id: &str) -> &[String] {
        self.per_floor.get(floor_id).map(Vec::as_slice).unwrap_or(&[])
    }

    // ── Spatial ───────────────────────────────────────────────────────────

    /// Build one spatial index per floor and sort the per-floor node lists.
    /// Call once after all nodes are added, before edge building.
    pub fn build_spatial_indexes(&mut self) {
        self.spatial.clear();
        for (floor_id, ids) in self.per_floor.iter_mut() {
            ids.sort_unstable();
            let entries = ids
                .iter()
                .map(|id| (id.clone(), self.nodes[id].coord))
                .collect();
            self.spatial.insert(floor_id.clone(), SpatialIndex::bulk_load(entries));
        }
    }

    pub fn spatial(&self, floor_id: &str) -> Option<&SpatialIndex> {
        self.spatial.get(floor_id)
    }

    /// Nodes whose coords fall in the inclusive box of `radius_deg` around
    /// `at`.  Falls back to a linear bbox scan when the floor has no index.
    pub fn nodes_within_box(&self, at: Coord, floor_id: &str, radius_deg: f64) -> Vec<&Node> {
        let min = Coord::new(at.lng - radius_deg, at.lat - radius_deg);
        let max = Coord::new(at.lng + radius_deg, at.lat + radius_deg);

        match self.spatial.get(floor_id) {
            Some(index) => index
                .query(min, max)
                .filter_map(|e| self.nodes.get(e.id()))
                .collect(),
            None => self
                .floor_nodes(floor_id)
                .iter()
                .filter_map(|id| self.nodes.get(id))
                .filter(|n| {
                    n.coord.lng >= min.lng
                        && n.coord.lng <= max.lng
                        && n.coord.lat >= min.lat
                        && n.coord.lat <= max.lat
                })
                .collect(),
        }
    }

    /// Nearest node on a floor passing `filter`.
    pub fn nearest_node<F>(&self, at: Coord, floor_id: &str, filter: F) -> Option<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        let index = self.spatial.get(floor_id)?;
        index
            .nearest_iter(at)
            .filter_map(|(e, _)| self.nodes.get(e.id()))
            .find(|n| filter(n))
    }

    /// Up to `k` nearest nodes passing `filter`, ascending distance.
    pub fn k_nearest_nodes<F>(&self, at: Coord, floor_id: &str, k: usize, filter: F) -> Vec<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        let Some(index) = self.spatial.get(floor_id) else {
            return Vec::new();
        };
        index
            .nearest_iter(at)
            .filter_map(|(e, _)| self.nodes.get(e.id()))
            .filter(|n| filter(n))
            .take(k)
            .collect()
    }

    /// Nearest node within an expanding radius schedule: the first radius
    /// step that yields any match wins, keeping the search bounded instead
    /// of floor-global.
    pub fn expanding_nearest<F>(
        &self,
        at: Coord,
        floor_id: &str,
        radii_deg: &[f64],
        filter: F,
    ) -> Option<&Node>
    where
        F: Fn(&Node) -> bool,
    {
        for &radius in radii_deg {
            let mut best: Option<(&Node, f64)> = None;
            for node in self.nodes_within_box(at, floor_id, radius) {
                if !filter(node) {
                    continue;
                }
                let d = at.fast_distance_m(node.coord);
                if best.is_none_or(|(_, bd)| d < bd) {
                    best = Some((node, d));
                }
            }
            if let Some((node, _)) = best {
                return Some(node);
            }
        }
        None
    }
}
