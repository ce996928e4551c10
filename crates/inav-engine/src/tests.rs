//! Engine tests: the end-to-end boundary scenarios.
//!
//! All worlds are synthetic, authored in local metres around (0, 0) and
//! converted to lng/lat, so expected distances are small exact numbers.

#[cfg(test)]
mod helpers {
    use inav_core::{
        Connection, ConnectionKind, Coord, Entrance, Feature, FlagBit, Geometry, GeometryProps,
        M_PER_DEG_LAT, NavigationFlags, NodeProps, Position,
    };

    use crate::engine::{MapData, RouteOptions, RouteRequest};

    pub fn m(x: f64, y: f64) -> Coord {
        Coord::new(x / M_PER_DEG_LAT, y / M_PER_DEG_LAT)
    }

    pub fn pos(x: f64, y: f64) -> Position {
        m(x, y).into()
    }

    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry {
        Geometry::Polygon {
            coordinates: vec![vec![
                pos(x0, y0),
                pos(x1, y0),
                pos(x1, y1),
                pos(x0, y1),
                pos(x0, y0),
            ]],
        }
    }

    pub fn geometry(id: &str, floor: &str, geom: Geometry) -> Feature<GeometryProps> {
        Feature {
            properties: GeometryProps { id: id.into(), floor_id: floor.into() },
            geometry: geom,
        }
    }

    pub fn sample_node(id: &str, floor: &str, x: f64, y: f64) -> Feature<NodeProps> {
        Feature {
            properties: NodeProps {
                id: id.into(),
                floor_id: floor.into(),
                geometry_ids: Vec::new(),
                node_type: Some("walkable".into()),
            },
            geometry: Geometry::Point { coordinates: pos(x, y) },
        }
    }

    pub fn connector_node(id: &str, floor: &str, x: f64, y: f64, geometry_id: &str) -> Feature<NodeProps> {
        Feature {
            properties: NodeProps {
                id: id.into(),
                floor_id: floor.into(),
                geometry_ids: vec![geometry_id.into()],
                node_type: None,
            },
            geometry: Geometry::Point { coordinates: pos(x, y) },
        }
    }

    pub fn request(start: (f64, f64), start_floor: &str, end: (f64, f64), end_floor: &str) -> RouteRequest {
        RouteRequest {
            start: m(start.0, start.1),
            start_floor: start_floor.into(),
            end: m(end.0, end.1),
            end_floor: end_floor.into(),
            options: RouteOptions::default(),
        }
    }

    /// Scenario world: a single 10 × 2 m corridor on "floor0", walkable
    /// nodes on a 1 m grid, no obstacles.
    pub fn corridor_world() -> MapData {
        let mut data = MapData {
            map_id: "corridor".into(),
            map_time: 7,
            ..MapData::default()
        };
        data.geometry.push(geometry("corridor", "floor0", rect(0.0, 0.0, 10.0, 2.0)));
        data.walkable_set.insert("corridor".into());
        for x in 0..=10 {
            for y in 0..=2 {
                data.walkable_nodes.push(sample_node(
                    &format!("w_{x:02}_{y}"),
                    "floor0",
                    x as f64,
                    y as f64,
                ));
            }
        }
        data
    }

    /// Scenario world: a 10 × 10 m area with a 5 × 5 m blocking square at
    /// (3, 3)–(8, 8).  Nodes cover the 1 m grid outside the block.
    pub fn blocked_world() -> MapData {
        let mut data = MapData {
            map_id: "blocked".into(),
            map_time: 7,
            ..MapData::default()
        };
        data.geometry.push(geometry("area", "floor0", rect(0.0, 0.0, 10.0, 10.0)));
        data.walkable_set.insert("area".into());
        data.geometry.push(geometry("block", "floor0", rect(3.0, 3.0, 8.0, 8.0)));
        data.nonwalkable_set.insert("block".into());
        for x in 0..=10_i32 {
            for y in 0..=10_i32 {
                if (3..=8).contains(&x) && (3..=8).contains(&y) {
                    continue;
                }
                data.walkable_nodes.push(sample_node(
                    &format!("w_{x:02}_{y:02}"),
                    "floor0",
                    x as f64,
                    y as f64,
                ));
            }
        }
        data
    }

    /// Scenario world: private room R1 (5 × 5 m) walled off from a corridor,
    /// joined by a single door on the east wall.  `door_flags` is the raw
    /// flag word of the door entrance; bit 1 is the public bit.
    pub fn room_world(door_flags: u32) -> MapData {
        let mut data = MapData {
            map_id: "room".into(),
            map_time: 7,
            ..MapData::default()
        };
        data.geometry.push(geometry("R1", "floor0", rect(0.0, 0.0, 5.0, 5.0)));
        data.kinds.insert("R1".into(), "room".into());
        data.geometry.push(geometry(
            "wall1",
            "floor0",
            Geometry::LineString {
                coordinates: vec![
                    pos(0.0, 0.0),
                    pos(5.0, 0.0),
                    pos(5.0, 5.0),
                    pos(0.0, 5.0),
                    pos(0.0, 0.0),
                ],
            },
        ));
        data.kinds.insert("wall1".into(), "wall".into());
        data.geometry.push(geometry(
            "R1_D1",
            "floor0",
            Geometry::LineString { coordinates: vec![pos(5.0, 2.4), pos(5.0, 2.6)] },
        ));
        data.connections.push(Connection {
            kind: ConnectionKind::Door,
            entrances: vec![Entrance {
                geometry_id: "R1_D1".into(),
                floor_id: "floor0".into(),
                flags: door_flags,
            }],
        });
        data.navigation_flags = NavigationFlags { public: Some(FlagBit { bit: 1 }) };

        data.walkable_nodes.push(sample_node("r1", "floor0", 2.5, 3.5));
        data.walkable_nodes.push(sample_node("c1", "floor0", 7.0, 2.5));
        data.walkable_nodes.push(sample_node("c2", "floor0", 8.0, 2.5));
        data
    }

    /// Scenario world: two identical small floors joined by one connector
    /// of the given kind.
    pub fn two_floor_world(kind: ConnectionKind) -> MapData {
        let mut data = MapData {
            map_id: "floors".into(),
            map_time: 7,
            ..MapData::default()
        };
        for (floor, prefix) in [("floor0", "a"), ("floor1", "b")] {
            data.walkable_nodes.push(sample_node(&format!("{prefix}0"), floor, 0.0, 0.0));
            data.walkable_nodes.push(sample_node(&format!("{prefix}1"), floor, 1.0, 0.0));
        }
        let nodes = match kind {
            ConnectionKind::Stairs => &mut data.stairs_nodes,
            _ => &mut data.elevator_nodes,
        };
        nodes.push(connector_node("lift0", "floor0", 2.0, 0.0, "CN1"));
        nodes.push(connector_node("lift1", "floor1", 2.0, 0.0, "CN1"));
        data.connections.push(Connection {
            kind,
            entrances: vec![
                Entrance { geometry_id: "CN1".into(), floor_id: "floor0".into(), flags: 0 },
                Entrance { geometry_id: "CN1".into(), floor_id: "floor1".into(), flags: 0 },
            ],
        });
        data
    }

    /// Scenario world: a lone wall at x = 5 with two walkable nodes east of
    /// it.
    pub fn wall_world() -> MapData {
        let mut data = MapData {
            map_id: "wall".into(),
            map_time: 7,
            ..MapData::default()
        };
        data.geometry.push(geometry(
            "w1",
            "floor0",
            Geometry::LineString { coordinates: vec![pos(5.0, 0.0), pos(5.0, 10.0)] },
        ));
        data.kinds.insert("w1".into(), "wall".into());
        data.walkable_nodes.push(sample_node("n1", "floor0", 6.5, 5.0));
        data.walkable_nodes.push(sample_node("n2", "floor0", 8.0, 5.0));
        data
    }

    pub fn initialized(data: &MapData) -> crate::engine::PathfindingEngine {
        let mut engine = crate::engine::PathfindingEngine::new(crate::config::EngineConfig::default());
        engine
            .initialize(data, None, &crate::engine::InitOptions::default(), None)
            .expect("initialize");
        engine
    }
}

#[cfg(test)]
mod lifecycle {
    use std::sync::atomic::AtomicBool;

    use super::helpers::{corridor_world, request};
    use crate::config::EngineConfig;
    use crate::engine::{InitOptions, PathfindingEngine};
    use crate::error::EngineError;

    #[test]
    fn query_before_initialize_fails_fast() {
        let engine = PathfindingEngine::new(EngineConfig::default());
        let err = engine
            .find_route(&request((0.0, 0.0), "floor0", (1.0, 0.0), "floor0"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotInitialized));
        let info = engine.get_last_route_error().unwrap();
        assert_eq!(info.code, "not-initialized");
    }

    #[test]
    fn cancellation_leaves_engine_uninitialized() {
        let mut engine = PathfindingEngine::new(EngineConfig::default());
        let cancel = AtomicBool::new(true);
        let err = engine
            .initialize(&corridor_world(), None, &InitOptions::default(), Some(&cancel))
            .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        assert!(!engine.is_initialized());
    }

    #[test]
    fn initialize_reports_stats() {
        let data = corridor_world();
        let mut engine = PathfindingEngine::new(EngineConfig::default());
        let stats = engine.initialize(&data, None, &InitOptions::default(), None).unwrap();
        assert_eq!(stats.node_count, 33);
        assert_eq!(stats.floor_count, 1);
        assert!(stats.edge_count > 0);
        assert!(!stats.cache_hit);
        assert!(engine.is_initialized());
    }
}

#[cfg(test)]
mod straight_corridor {
    use super::helpers::{corridor_world, initialized, request};

    #[test]
    fn route_along_the_corridor() {
        let engine = initialized(&corridor_world());
        let route = engine
            .find_route(&request((0.5, 1.0), "floor0", (9.5, 1.0), "floor0"))
            .unwrap();

        assert!((route.distance_m - 9.0).abs() < 0.25, "got {}", route.distance_m);
        assert!(route.floors.iter().all(|f| f == "floor0"));
        assert_eq!(route.path.len(), route.floors.len());
        assert!(route.warnings.is_empty());
        assert!(!route.segments.iter().any(|s| s.floor_change));

        // distance equals the segment sum.
        let sum: f64 = route.segments.iter().map(|s| s.distance_m).sum();
        assert!((sum - route.distance_m).abs() < 1e-6);

        // The raw endpoints bracket the path.
        assert!(route.path[0].distance_m(super::helpers::m(0.5, 1.0)) < 0.01);
        assert!(route.path.last().unwrap().distance_m(super::helpers::m(9.5, 1.0)) < 0.01);
    }

    #[test]
    fn identical_queries_are_idempotent_and_cached() {
        let engine = initialized(&corridor_world());
        let req = request((0.5, 1.0), "floor0", (9.5, 1.0), "floor0");
        let first = engine.find_route(&req).unwrap();
        let second = engine.find_route(&req).unwrap();
        assert_eq!(first.path, second.path);
        assert!(!first.meta.from_cache);
        assert!(second.meta.from_cache);
    }

    #[test]
    fn reversal_symmetry() {
        let engine = initialized(&corridor_world());
        let forward = engine
            .find_route(&request((0.5, 1.0), "floor0", (9.5, 1.0), "floor0"))
            .unwrap();
        let backward = engine
            .find_route(&request((9.5, 1.0), "floor0", (0.5, 1.0), "floor0"))
            .unwrap();

        let mut reversed = backward.path.clone();
        reversed.reverse();
        assert_eq!(forward.path.len(), reversed.len());
        for (a, b) in forward.path.iter().zip(&reversed) {
            assert!(a.distance_m(*b) < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn instructions_for_a_straight_route() {
        let engine = initialized(&corridor_world());
        let route = engine
            .find_route(&request((0.5, 1.0), "floor0", (9.5, 1.0), "floor0"))
            .unwrap();
        let instructions = route.instructions();
        assert!(instructions.len() >= 2);
        assert_eq!(instructions.first().unwrap().kind, inav_route::InstructionKind::Start);
        assert_eq!(
            instructions.last().unwrap().kind,
            inav_route::InstructionKind::Destination
        );
    }
}

#[cfg(test)]
mod obstacle_avoidance {
    use super::helpers::{blocked_world, initialized, m, request};

    #[test]
    fn route_never_crosses_the_obstacle() {
        let engine = initialized(&blocked_world());
        let route = engine
            .find_route(&request((1.0, 1.0), "floor0", (9.0, 9.0), "floor0"))
            .unwrap();

        for pair in route.path.windows(2) {
            assert!(
                !engine.collision().line_intersects_obstacle(pair[0], pair[1], "floor0"),
                "segment {} -> {} crosses the block",
                pair[0],
                pair[1]
            );
        }

        // Strictly longer than the (blocked) straight line.
        let euclidean = m(1.0, 1.0).distance_m(m(9.0, 9.0));
        assert!(route.distance_m > euclidean, "{} <= {euclidean}", route.distance_m);
    }
}

#[cfg(test)]
mod locked_doors {
    use super::helpers::{initialized, request, room_world};
    use crate::engine::RouteRequest;
    use crate::error::EngineError;

    fn room_request() -> RouteRequest {
        request((2.5, 3.3), "floor0", (8.0, 2.5), "floor0")
    }

    #[test]
    fn locked_door_blocks_private_room_exit() {
        // Flag word 0: the public bit (bit 1) is unset → door is locked.
        let engine = initialized(&room_world(0));
        let err = engine.find_route(&room_request()).unwrap_err();
        assert!(matches!(err, EngineError::NoDoor { .. }));
        let info = engine.get_last_route_error().unwrap();
        assert_eq!(info.code, "no-door");
        assert!(info.message.contains("R1"));
    }

    #[test]
    fn allow_locked_doors_routes_through_the_door() {
        let engine = initialized(&room_world(0));
        let mut req = room_request();
        req.options.allow_locked_doors = true;
        let route = engine.find_route(&req).unwrap();
        assert!(
            route.node_ids.iter().any(|id| id == "door_R1_D1"),
            "route skips the door: {:?}",
            route.node_ids
        );
    }

    #[test]
    fn public_door_needs_no_override() {
        // Bit 1 set → public, unlocked.
        let engine = initialized(&room_world(0b10));
        let route = engine.find_route(&room_request()).unwrap();
        assert!(route.node_ids.iter().any(|id| id == "door_R1_D1"));
    }

    #[test]
    fn same_room_clear_line_is_a_trivial_route() {
        let engine = initialized(&room_world(0));
        let route = engine
            .find_route(&request((1.5, 1.5), "floor0", (3.5, 1.5), "floor0"))
            .unwrap();
        assert_eq!(route.path.len(), 2);
        assert!(route.node_ids.is_empty());
        assert!((route.distance_m - 2.0).abs() < 0.05, "got {}", route.distance_m);
    }
}

#[cfg(test)]
mod multi_floor {
    use inav_core::ConnectionKind;
    use inav_graph::EdgeKind;

    use super::helpers::{initialized, request, two_floor_world};
    use crate::error::EngineError;

    #[test]
    fn elevator_route_crosses_exactly_one_connector_edge() {
        let engine = initialized(&two_floor_world(ConnectionKind::Elevator));
        let mut req = request((0.0, 0.0), "floor0", (1.0, 0.0), "floor1");
        req.options.accessible_only = true;
        let route = engine.find_route(&req).unwrap();

        let changes = route.segments.iter().filter(|s| s.floor_change).count();
        assert_eq!(changes, 1);
        assert!(route.node_ids.contains(&"lift0".to_string()));
        assert!(route.node_ids.contains(&"lift1".to_string()));

        // The connector edge really is an elevator edge.
        let kinds: Vec<EdgeKind> = engine
            .graph()
            .edges_from("lift0")
            .iter()
            .filter(|e| e.to == "lift1")
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, [EdgeKind::Elevator]);
    }

    #[test]
    fn stairs_only_world_fails_under_avoid_stairs() {
        let engine = initialized(&two_floor_world(ConnectionKind::Stairs));
        let mut req = request((0.0, 0.0), "floor0", (1.0, 0.0), "floor1");
        req.options.avoid_stairs = true;
        let err = engine.find_route(&req).unwrap_err();
        assert!(matches!(err, EngineError::NoPath));
        assert_eq!(engine.get_last_route_error().unwrap().code, "no-path");
    }

    #[test]
    fn stairs_only_world_fails_under_accessible_only() {
        let engine = initialized(&two_floor_world(ConnectionKind::Stairs));
        let mut req = request((0.0, 0.0), "floor0", (1.0, 0.0), "floor1");
        req.options.accessible_only = true;
        assert!(matches!(engine.find_route(&req).unwrap_err(), EngineError::NoPath));
    }

    #[test]
    fn stairs_route_works_when_allowed() {
        let engine = initialized(&two_floor_world(ConnectionKind::Stairs));
        let route = engine
            .find_route(&request((0.0, 0.0), "floor0", (1.0, 0.0), "floor1"))
            .unwrap();
        assert_eq!(route.segments.iter().filter(|s| s.floor_change).count(), 1);
    }
}

#[cfg(test)]
mod relaxed_endpoints {
    use super::helpers::{geometry, initialized, m, rect, request, sample_node, wall_world};
    use crate::engine::MapData;

    #[test]
    fn endpoint_inside_a_wall_buffer_still_routes() {
        let engine = initialized(&wall_world());
        // (5.3, 5) is inside the 0.5 m buffer of the wall at x = 5.
        let route = engine
            .find_route(&request((5.3, 5.0), "floor0", (8.0, 5.0), "floor0"))
            .unwrap();
        // Relaxed clearance accepted the connector: the raw start is kept
        // and no warning is attached.
        assert!(route.path[0].distance_m(m(5.3, 5.0)) < 0.01);
        assert!(route.warnings.is_empty());
    }

    #[test]
    fn deeply_blocked_endpoint_warns_and_starts_at_a_node() {
        let mut data = MapData {
            map_id: "slab".into(),
            map_time: 7,
            ..MapData::default()
        };
        data.geometry.push(geometry("slab", "floor0", rect(0.0, 0.0, 20.0, 20.0)));
        data.nonwalkable_set.insert("slab".into());
        data.walkable_nodes.push(sample_node("n1", "floor0", 25.0, 10.0));
        data.walkable_nodes.push(sample_node("n2", "floor0", 26.0, 10.0));

        let engine = initialized(&data);
        let route = engine
            .find_route(&request((10.0, 10.0), "floor0", (26.0, 10.0), "floor0"))
            .unwrap();
        assert!(!route.warnings.is_empty());
        // The path begins at the anchor node, not the blocked endpoint.
        assert!(route.path[0].distance_m(m(25.0, 10.0)) < 0.01);
    }
}

#[cfg(test)]
mod cache_round_trip {
    use super::helpers::{corridor_world, request};
    use crate::cache::{EdgeStore, MemoryEdgeStore};
    use crate::config::EngineConfig;
    use crate::engine::{InitOptions, PathfindingEngine};
    use inav_graph::EdgeKind;

    fn edge_set(engine: &PathfindingEngine) -> Vec<(String, String, i64)> {
        let mut edges: Vec<(String, String, i64)> = engine
            .graph()
            .all_edges()
            .filter(|e| e.kind == EdgeKind::Walkable)
            .map(|e| (e.from.clone(), e.to.clone(), (e.weight_m * 1e6).round() as i64))
            .collect();
        edges.sort();
        edges
    }

    #[test]
    fn second_initialize_hits_the_cache_and_matches() {
        let data = corridor_world();
        let store = MemoryEdgeStore::new();

        let mut first = PathfindingEngine::new(EngineConfig::default());
        let stats1 = first.initialize(&data, Some(&store), &InitOptions::default(), None).unwrap();
        assert!(!stats1.cache_hit);
        assert_eq!(store.len(), 1);

        let mut second = PathfindingEngine::new(EngineConfig::default());
        let stats2 = second.initialize(&data, Some(&store), &InitOptions::default(), None).unwrap();
        assert!(stats2.cache_hit);

        // Edge-set equality, ignoring order.
        assert_eq!(edge_set(&first), edge_set(&second));

        // Identical query results.
        let req = request((0.5, 1.0), "floor0", (9.5, 1.0), "floor0");
        let r1 = first.find_route(&req).unwrap();
        let r2 = second.find_route(&req).unwrap();
        assert_eq!(r1.path, r2.path);
        assert_eq!(r1.node_ids, r2.node_ids);
        assert!((r1.distance_m - r2.distance_m).abs() < 1e-9);
    }

    #[test]
    fn rebuild_flag_skips_the_read() {
        let data = corridor_world();
        let store = MemoryEdgeStore::new();

        let mut warm = PathfindingEngine::new(EngineConfig::default());
        warm.initialize(&data, Some(&store), &InitOptions::default(), None).unwrap();

        let mut rebuilt = PathfindingEngine::new(EngineConfig::default());
        let opts = InitOptions { rebuild_graph: true, ..InitOptions::default() };
        let stats = rebuilt.initialize(&data, Some(&store), &opts, None).unwrap();
        assert!(!stats.cache_hit);
    }

    #[test]
    fn no_cache_flag_skips_read_and_write() {
        let data = corridor_world();
        let store = MemoryEdgeStore::new();

        let mut engine = PathfindingEngine::new(EngineConfig::default());
        let opts = InitOptions { no_graph_cache: true, ..InitOptions::default() };
        let stats = engine.initialize(&data, Some(&store), &opts, None).unwrap();
        assert!(!stats.cache_hit);
        assert!(store.is_empty());
    }

    #[test]
    fn cache_key_encodes_parameters() {
        let config = EngineConfig::default();
        let key = crate::cache::cache_key("mall", 42, &config);
        assert_eq!(key, "visibilityEdges:v3:mall:42:d15:k8");

        let tight = config.tightened_for(10_000);
        let key = crate::cache::cache_key("mall", 42, &tight);
        assert_eq!(key, "visibilityEdges:v3:mall:42:d8:k6");
    }

    #[test]
    fn corrupt_cache_entry_is_ignored() {
        // A record whose edges reference unknown nodes must not abort
        // initialization; the bad edges are dropped.
        let data = corridor_world();
        let store = MemoryEdgeStore::new();
        let key = crate::cache::cache_key(&data.map_id, data.map_time, &EngineConfig::default());
        store
            .put(&key, &crate::cache::CachedEdgeSet {
                edges: vec![crate::cache::CachedEdge {
                    from: "ghost-a".into(),
                    to: "ghost-b".into(),
                    weight_m: 1.0,
                }],
                meta: crate::cache::CacheMeta::default(),
                created_at: 0,
            })
            .unwrap();

        let mut engine = PathfindingEngine::new(EngineConfig::default());
        let stats = engine.initialize(&data, Some(&store), &InitOptions::default(), None).unwrap();
        assert!(stats.cache_hit);
        assert_eq!(stats.edge_count, 0); // all cached edges were bogus
    }
}

#[cfg(test)]
mod visibility_invariants {
    use super::helpers::{blocked_world, initialized};
    use inav_graph::EdgeKind;

    #[test]
    fn every_visibility_edge_has_line_of_sight_and_stays_on_floor() {
        let engine = initialized(&blocked_world());
        let graph = engine.graph();
        for edge in graph.all_edges().filter(|e| e.kind == EdgeKind::Walkable) {
            let a = graph.node(&edge.from).unwrap();
            let b = graph.node(&edge.to).unwrap();
            assert_eq!(a.floor_id, b.floor_id);
            assert!(
                engine.collision().has_line_of_sight(a.coord, b.coord, &a.floor_id),
                "edge {} -> {} lacks line of sight",
                edge.from,
                edge.to
            );
            assert!((edge.weight_m - a.coord.distance_m(b.coord)).abs() < 1e-6);
        }
    }

    #[test]
    fn edge_build_is_deterministic() {
        let first = initialized(&blocked_world());
        let second = initialized(&blocked_world());
        let collect = |engine: &crate::engine::PathfindingEngine| {
            let mut v: Vec<String> = engine
                .graph()
                .all_edges()
                .map(|e| format!("{}->{}", e.from, e.to))
                .collect();
            v.sort();
            v
        };
        assert_eq!(collect(&first), collect(&second));
    }
}
