//! Per-floor 2-D point index.
//!
//! An R-tree (via `rstar`) over `(lng, lat)` mapping to node ids.  Bulk load
//! is O(n log n); inclusive axis-aligned range queries and nearest-neighbor
//! iteration are O(log n + k) expected.  Queries never mutate the tree, so
//! repeated calls are stable.

use inav_core::Coord;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// Entry stored in the R-tree: a 2-D `[lng, lat]` point plus the node id.
#[derive(Clone, Debug)]
pub struct SpatialEntry {
    point: [f64; 2],
    id: String,
}

impl SpatialEntry {
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn coord(&self) -> Coord {
        Coord::new(self.point[0], self.point[1])
    }
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for SpatialEntry {
    /// Squared distance in degrees².  Fine for ranking within one building;
    /// exact metre distances are recomputed by callers where they matter.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Immutable-after-build spatial index of one floor's nodes.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk load; preferred over repeated [`insert`](Self::insert).
    pub fn bulk_load(entries: Vec<(String, Coord)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(id, c)| SpatialEntry { point: [c.lng, c.lat], id })
            .collect();
        Self { tree: RTree::bulk_load(entries) }
    }

    pub fn insert(&mut self, id: String, at: Coord) {
        self.tree.insert(SpatialEntry { point: [at.lng, at.lat], id });
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// All entries whose coordinates fall in the inclusive rectangle
    /// `[min, max]`.
    pub fn query(&self, min: Coord, max: Coord) -> impl Iterator<Item = &SpatialEntry> {
        self.tree
            .locate_in_envelope(&AABB::from_corners([min.lng, min.lat], [max.lng, max.lat]))
    }

    /// Nearest entry to `at`, with its squared-degree distance.
    pub fn nearest(&self, at: Coord) -> Option<(&SpatialEntry, f64)> {
        self.tree
            .nearest_neighbor_iter_with_distance_2(&[at.lng, at.lat])
            .next()
    }

    /// Entries in ascending distance from `at`.
    pub fn nearest_iter(&self, at: Coord) -> impl Iterator<Item = (&SpatialEntry, f64)> {
        self.tree.nearest_neighbor_iter_with_distance_2(&[at.lng, at.lat])
    }
}
