//! Unit tests for inav-graph.

#[cfg(test)]
mod helpers {
    use inav_core::{Coord, M_PER_DEG_LAT};

    use crate::{Graph, Node, NodeKind};

    pub fn m(x: f64, y: f64) -> Coord {
        Coord::new(x / M_PER_DEG_LAT, y / M_PER_DEG_LAT)
    }

    /// 3×3 walkable grid on "floor0" at 1 m spacing, ids `n<x><y>`.
    pub fn grid_graph() -> Graph {
        let mut g = Graph::new();
        for x in 0..3 {
            for y in 0..3 {
                let node = Node::new(
                    format!("n{x}{y}"),
                    m(x as f64, y as f64),
                    "floor0",
                    NodeKind::Walkable,
                );
                g.add_node(node).unwrap();
            }
        }
        g.build_spatial_indexes();
        g
    }
}

#[cfg(test)]
mod nodes_and_edges {
    use super::helpers::{grid_graph, m};
    use crate::{Edge, EdgeKind, GraphError, Node, NodeKind};

    #[test]
    fn duplicate_node_rejected() {
        let mut g = grid_graph();
        let dup = Node::new("n00", m(0.0, 0.0), "floor0", NodeKind::Walkable);
        assert!(matches!(g.add_node(dup), Err(GraphError::DuplicateNode(_))));
    }

    #[test]
    fn edge_requires_both_endpoints() {
        let mut g = grid_graph();
        let bad = Edge::new("n00", "ghost", 1.0, EdgeKind::Walkable, true);
        assert!(matches!(g.add_edge(bad), Err(GraphError::MissingEndpoint { .. })));
    }

    #[test]
    fn edge_weight_must_be_finite_and_non_negative() {
        let mut g = grid_graph();
        for w in [f64::NAN, f64::INFINITY, -1.0] {
            let bad = Edge::new("n00", "n01", w, EdgeKind::Walkable, true);
            assert!(matches!(g.add_edge(bad), Err(GraphError::InvalidWeight { .. })));
        }
    }

    #[test]
    fn edge_pair_is_bidirectional() {
        let mut g = grid_graph();
        g.add_edge_pair("n00", "n01", 1.0, EdgeKind::Walkable, true).unwrap();
        assert_eq!(g.degree("n00"), 1);
        assert_eq!(g.degree("n01"), 1);
        assert_eq!(g.edges_from("n01")[0].to, "n00");
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn door_node_lock_invariant() {
        let locked = Node::door("door_a", m(0.0, 0.0), "floor0", false, 0, "a");
        assert!(locked.meta.is_door && locked.meta.is_locked && !locked.meta.is_public);
        let open = Node::door("door_b", m(0.0, 0.0), "floor0", true, 1, "b");
        assert!(!open.meta.is_locked && open.meta.is_public);
    }

    #[test]
    fn stairs_node_not_accessible() {
        let s = Node::new("s1", m(0.0, 0.0), "floor0", NodeKind::Stairs);
        assert!(s.meta.is_stairs && !s.meta.accessible);
        let e = Node::new("e1", m(0.0, 0.0), "floor0", NodeKind::Elevator);
        assert!(e.meta.is_elevator && e.meta.accessible);
    }
}

#[cfg(test)]
mod floors {
    use super::helpers::{grid_graph, m};
    use crate::{Node, NodeKind};

    #[test]
    fn per_floor_partition() {
        let mut g = grid_graph();
        g.add_node(Node::new("up1", m(0.0, 0.0), "floor1", NodeKind::Walkable)).unwrap();
        g.build_spatial_indexes();

        assert_eq!(g.floors(), ["floor0", "floor1"]);
        assert_eq!(g.floor_nodes("floor0").len(), 9);
        assert_eq!(g.floor_nodes("floor1"), ["up1"]);
        assert!(g.floor_nodes("missing").is_empty());
    }

    #[test]
    fn floor_node_lists_sorted_after_index_build() {
        let g = grid_graph();
        let ids = g.floor_nodes("floor0");
        let mut sorted = ids.to_vec();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}

#[cfg(test)]
mod spatial {
    use super::helpers::{grid_graph, m};
    use inav_core::M_PER_DEG_LAT;

    #[test]
    fn box_query_is_inclusive() {
        let g = grid_graph();
        // 1 m box around (1, 1) catches the cross neighbours and itself.
        let hits = g.nodes_within_box(m(1.0, 1.0), "floor0", 1.0 / M_PER_DEG_LAT);
        assert_eq!(hits.len(), 9); // corners included: inclusive rectangle
    }

    #[test]
    fn box_query_without_index_falls_back_to_scan() {
        let mut g = crate::Graph::new();
        g.add_node(crate::Node::new("a", m(0.0, 0.0), "floor0", crate::NodeKind::Walkable))
            .unwrap();
        // No build_spatial_indexes() on purpose.
        let hits = g.nodes_within_box(m(0.0, 0.0), "floor0", 1.0 / M_PER_DEG_LAT);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn nearest_respects_filter() {
        let g = grid_graph();
        let nearest = g.nearest_node(m(0.1, 0.1), "floor0", |_| true).unwrap();
        assert_eq!(nearest.id, "n00");
        let skipped = g
            .nearest_node(m(0.1, 0.1), "floor0", |n| n.id != "n00")
            .unwrap();
        assert!(skipped.id == "n01" || skipped.id == "n10");
    }

    #[test]
    fn k_nearest_ascending() {
        let g = grid_graph();
        let near = g.k_nearest_nodes(m(0.0, 0.0), "floor0", 3, |_| true);
        assert_eq!(near[0].id, "n00");
        assert_eq!(near.len(), 3);
    }

    #[test]
    fn expanding_nearest_stops_at_first_hit() {
        let g = grid_graph();
        let radii = [0.5 / M_PER_DEG_LAT, 5.0 / M_PER_DEG_LAT];
        // Nothing within 0.5 m of (5, 5); second step finds the grid corner.
        let found = g.expanding_nearest(m(5.0, 5.0), "floor0", &radii, |_| true);
        assert_eq!(found.unwrap().id, "n22");
        // Filter that rejects everything yields None.
        assert!(g.expanding_nearest(m(5.0, 5.0), "floor0", &radii, |_| false).is_none());
    }
}
