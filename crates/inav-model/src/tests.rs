//! Unit tests for inav-model.

#[cfg(test)]
mod helpers {
    use rustc_hash::{FxHashMap, FxHashSet};

    use inav_core::{Coord, Feature, Geometry, GeometryProps, M_PER_DEG_LAT, Position};

    pub fn m(x: f64, y: f64) -> Coord {
        Coord::new(x / M_PER_DEG_LAT, y / M_PER_DEG_LAT)
    }

    pub fn pos(x: f64, y: f64) -> Position {
        m(x, y).into()
    }

    pub fn feature(id: &str, floor: &str, geometry: Geometry) -> Feature<GeometryProps> {
        Feature {
            properties: GeometryProps { id: id.into(), floor_id: floor.into() },
            geometry,
        }
    }

    pub fn wall(id: &str, floor: &str, from: (f64, f64), to: (f64, f64)) -> Feature<GeometryProps> {
        feature(
            id,
            floor,
            Geometry::LineString { coordinates: vec![pos(from.0, from.1), pos(to.0, to.1)] },
        )
    }

    pub fn room_square(id: &str, floor: &str, x0: f64, y0: f64, size: f64) -> Feature<GeometryProps> {
        feature(
            id,
            floor,
            Geometry::Polygon {
                coordinates: vec![vec![
                    pos(x0, y0),
                    pos(x0 + size, y0),
                    pos(x0 + size, y0 + size),
                    pos(x0, y0 + size),
                    pos(x0, y0),
                ]],
            },
        )
    }

    pub fn kinds(entries: &[(&str, &str)]) -> FxHashMap<String, String> {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    pub fn id_set(ids: &[&str]) -> FxHashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod collision {
    use rustc_hash::FxHashSet;

    use super::helpers::{feature, id_set, kinds, m, pos, wall};
    use crate::CollisionDetector;
    use inav_core::Geometry;

    fn detector_with_wall() -> CollisionDetector {
        let mut detector = CollisionDetector::new();
        // Vertical wall at x = 5, from y = 0 to y = 10.
        let features = vec![wall("w1", "floor0", (5.0, 0.0), (5.0, 10.0))];
        detector.ingest(&features, &kinds(&[("w1", "wall")]), &FxHashSet::default());
        detector
    }

    #[test]
    fn wall_linestring_becomes_buffered_obstacle() {
        let detector = detector_with_wall();
        assert_eq!(detector.obstacle_count("floor0"), 1);
        // Inside the 0.5 m buffer.
        assert!(detector.point_in_obstacle(m(5.3, 5.0), "floor0"));
        assert!(!detector.point_in_obstacle(m(6.0, 5.0), "floor0"));
        assert!(!detector.point_in_obstacle(m(5.3, 5.0), "floor1"));
    }

    #[test]
    fn multilinestring_sub_lines_are_separate_obstacles() {
        let mut detector = CollisionDetector::new();
        let features = vec![feature(
            "w2",
            "floor0",
            Geometry::MultiLineString {
                coordinates: vec![
                    vec![pos(0.0, 0.0), pos(10.0, 0.0)],
                    vec![pos(0.0, 20.0), pos(10.0, 20.0)],
                ],
            },
        )];
        detector.ingest(&features, &kinds(&[("w2", "wall")]), &FxHashSet::default());
        assert_eq!(detector.obstacle_count("floor0"), 2);
    }

    #[test]
    fn nonwalkable_polygon_is_an_obstacle() {
        let mut detector = CollisionDetector::new();
        let features = vec![super::helpers::room_square("blob", "floor0", 0.0, 0.0, 4.0)];
        detector.ingest(&features, &kinds(&[]), &id_set(&["blob"]));
        assert!(detector.point_in_obstacle(m(2.0, 2.0), "floor0"));
    }

    #[test]
    fn line_crossing_a_wall_is_blocked() {
        let detector = detector_with_wall();
        assert!(detector.line_intersects_obstacle(m(3.0, 5.0), m(7.0, 5.0), "floor0"));
        assert!(!detector.has_line_of_sight(m(3.0, 5.0), m(7.0, 5.0), "floor0"));
        // Parallel to the wall, no crossing.
        assert!(detector.has_line_of_sight(m(3.0, 1.0), m(3.0, 9.0), "floor0"));
    }

    #[test]
    fn door_segment_forgives_crossing() {
        let mut detector = detector_with_wall();
        // Door spanning the wall at y = 5.
        detector.add_door_feature(
            "floor0",
            &Geometry::LineString { coordinates: vec![pos(5.0, 4.5), pos(5.0, 5.5)] },
        );
        assert_eq!(detector.door_segment_count("floor0"), 1);
        // Crossing at the door: allowed.
        assert!(detector.has_line_of_sight(m(3.0, 5.0), m(7.0, 5.0), "floor0"));
        // Crossing 3 m away from the door: still blocked.
        assert!(detector.line_intersects_obstacle(m(3.0, 8.0), m(7.0, 8.0), "floor0"));
        // Point inside the wall buffer but at the door is not "in obstacle".
        assert!(!detector.point_in_obstacle(m(5.1, 5.0), "floor0"));
    }

    #[test]
    fn is_path_clear_checks_endpoints_and_segment() {
        let detector = detector_with_wall();
        assert!(detector.is_path_clear(m(1.0, 1.0), m(3.0, 1.0), "floor0"));
        // Endpoint inside the wall buffer.
        assert!(!detector.is_path_clear(m(5.2, 5.0), m(3.0, 5.0), "floor0"));
        // Crossing segment.
        assert!(!detector.is_path_clear(m(3.0, 5.0), m(7.0, 5.0), "floor0"));
    }

    #[test]
    fn relaxed_clearance_tiers() {
        let mut detector = CollisionDetector::new();
        // A 12 × 30 m non-walkable slab: points inside it never cross its
        // boundary as long as both endpoints stay inside.
        let features = vec![super::helpers::feature(
            "slab",
            "floor0",
            Geometry::Polygon {
                coordinates: vec![vec![
                    pos(0.0, 0.0),
                    pos(12.0, 0.0),
                    pos(12.0, 30.0),
                    pos(0.0, 30.0),
                    pos(0.0, 0.0),
                ]],
            },
        )];
        detector.ingest(&features, &kinds(&[]), &id_set(&["slab"]));

        // < 2 m: unconditionally clear, even crossing the boundary.
        assert!(detector.is_path_clear_relaxed(m(-0.5, 5.0), m(0.5, 5.0), "floor0"));
        // 2–10 m, fully inside the slab: no boundary crossing, endpoint
        // checks skipped → clear, although strict says blocked.
        assert!(detector.is_path_clear_relaxed(m(6.0, 5.0), m(6.0, 10.0), "floor0"));
        assert!(!detector.is_path_clear(m(6.0, 5.0), m(6.0, 10.0), "floor0"));
        // 2–10 m crossing the boundary: blocked.
        assert!(!detector.is_path_clear_relaxed(m(6.0, 5.0), m(6.0, -3.0), "floor0"));
        // ≥ 10 m: strict again, endpoints inside → blocked.
        assert!(!detector.is_path_clear_relaxed(m(6.0, 5.0), m(6.0, 17.0), "floor0"));
    }
}

#[cfg(test)]
mod rooms {
    use rustc_hash::FxHashMap;

    use super::helpers::{kinds, m, pos, room_square};
    use crate::{RoomDoorModel, RoomThresholds};
    use inav_core::{Connection, ConnectionKind, Entrance, Feature, FlagBit, Geometry, NavigationFlags};

    fn model_with(features: Vec<Feature<inav_core::GeometryProps>>, room_ids: &[&str]) -> RoomDoorModel {
        let entries: Vec<(&str, &str)> = room_ids.iter().map(|id| (*id, "room")).collect();
        RoomDoorModel::build(&features, &kinds(&entries), RoomThresholds::default())
    }

    #[test]
    fn buffered_containment() {
        let model = model_with(vec![room_square("R1", "floor0", 0.0, 0.0, 5.0)], &["R1"]);
        assert_eq!(model.room_count(), 1);
        let inside = model.find_room_at(m(2.5, 2.5), "floor0").unwrap();
        assert_eq!(inside.geometry_id, "R1");
        // Within the 0.3 m buffer outside the polygon proper.
        assert!(model.find_room_at(m(-0.2, 2.5), "floor0").is_some());
        assert!(model.find_room_at(m(-0.6, 2.5), "floor0").is_none());
        assert!(model.find_room_at(m(2.5, 2.5), "floor1").is_none());
    }

    #[test]
    fn nested_rooms_resolve_to_smallest() {
        let model = model_with(
            vec![
                room_square("outer", "floor0", 0.0, 0.0, 20.0),
                room_square("inner", "floor0", 5.0, 5.0, 4.0),
            ],
            &["outer", "inner"],
        );
        assert_eq!(model.find_room_at(m(6.0, 6.0), "floor0").unwrap().geometry_id, "inner");
        assert_eq!(model.find_room_at(m(1.0, 1.0), "floor0").unwrap().geometry_id, "outer");
    }

    #[test]
    fn area_threshold_makes_rooms_public() {
        let model = model_with(
            vec![
                room_square("small", "floor0", 0.0, 0.0, 5.0),   // 25 m²
                room_square("lobby", "floor0", 10.0, 0.0, 10.0), // 100 m²
            ],
            &["small", "lobby"],
        );
        assert!(!model.is_public("small"));
        assert!(model.is_public("lobby"));
        let meta = model.meta("lobby").unwrap();
        assert!((meta.area_m2 - 100.0).abs() < 1.0, "got {}", meta.area_m2);
    }

    fn door_connection(geometry_id: &str, floor: &str, flags: u32) -> Connection {
        Connection {
            kind: ConnectionKind::Door,
            entrances: vec![Entrance {
                geometry_id: geometry_id.into(),
                floor_id: floor.into(),
                flags,
            }],
        }
    }

    #[test]
    fn door_nodes_merge_flags_and_position_on_feature() {
        let door_feature = super::helpers::feature(
            "D1",
            "floor0",
            Geometry::LineString { coordinates: vec![pos(2.0, 0.0), pos(3.0, 0.0)] },
        );
        let mut features_by_id: FxHashMap<&str, &Feature<inav_core::GeometryProps>> =
            FxHashMap::default();
        features_by_id.insert("D1", &door_feature);

        let connections = vec![
            door_connection("D1", "floor0", 0b01),
            door_connection("D1", "floor0", 0b10),
            door_connection("missing", "floor0", 0),
        ];
        let nav = NavigationFlags { public: Some(FlagBit { bit: 1 }) };
        let set = RoomDoorModel::build_door_nodes(&connections, &features_by_id, &nav);

        // One node per distinct geometry id; the unresolvable one is skipped.
        assert_eq!(set.nodes.len(), 1);
        let door = &set.nodes[0];
        assert_eq!(door.id, "door_D1");
        assert_eq!(door.meta.flags, 0b11);
        assert!(door.meta.is_public && !door.meta.is_locked);
        assert!(door.coord.distance_m(m(2.5, 0.0)) < 0.01);
        // The linestring is exported for collision registration.
        assert_eq!(set.line_features.len(), 1);
    }

    #[test]
    fn absent_public_bit_means_every_door_public() {
        let door_feature = super::helpers::feature(
            "D2",
            "floor0",
            Geometry::Point { coordinates: pos(0.0, 0.0) },
        );
        let mut features_by_id: FxHashMap<&str, &Feature<inav_core::GeometryProps>> =
            FxHashMap::default();
        features_by_id.insert("D2", &door_feature);

        let set = RoomDoorModel::build_door_nodes(
            &[door_connection("D2", "floor0", 0)],
            &features_by_id,
            &NavigationFlags::default(),
        );
        assert!(set.nodes[0].meta.is_public);
    }

    #[test]
    fn assign_doors_builds_room_door_index() {
        let mut model = model_with(vec![room_square("R1", "floor0", 0.0, 0.0, 5.0)], &["R1"]);

        let mut doors = vec![
            inav_graph::Node::door("door_D1", m(2.5, 0.0), "floor0", true, 1, "D1"),
            inav_graph::Node::door("door_far", m(50.0, 50.0), "floor0", false, 0, "far"),
        ];
        model.assign_doors(&mut doors);

        assert_eq!(doors[0].meta.room_ids, ["R1"]);
        assert!(doors[1].meta.room_ids.is_empty());
        assert_eq!(model.doors_of("R1"), ["door_D1"]);
        let meta = model.meta("R1").unwrap();
        assert_eq!((meta.door_count, meta.public_door_count), (1, 1));
        // One public door < P=2, 25 m² < 80: still private.
        assert!(!model.is_public("R1"));
    }

    #[test]
    fn tag_nodes_with_rooms_skips_doors_and_corridors() {
        let model = model_with(vec![room_square("R1", "floor0", 0.0, 0.0, 5.0)], &["R1"]);
        let mut graph = inav_graph::Graph::new();
        graph
            .add_node(inav_graph::Node::new("w1", m(2.0, 2.0), "floor0", inav_graph::NodeKind::Walkable))
            .unwrap();
        graph
            .add_node(inav_graph::Node::new("w2", m(40.0, 40.0), "floor0", inav_graph::NodeKind::Walkable))
            .unwrap();

        model.tag_nodes_with_rooms(&mut graph);
        assert_eq!(graph.node("w1").unwrap().meta.room_ids, ["R1"]);
        assert!(graph.node("w2").unwrap().meta.room_ids.is_empty());
    }
}
