//! Room index, door nodes, and room↔door assignment.
//!
//! Rooms are polygons with a +0.3 m buffered copy; a point is "in" a room
//! iff it lies in the buffered polygon, which tolerates numeric slop along
//! room boundaries.  Door nodes are synthesized from `connections` entries
//! of type `door`, one node per distinct geometry id with OR-merged flags.
//!
//! Room assignment is late-bound: walkable nodes get their `room_ids` only
//! after the full room index exists, and doors are assigned first and win
//! over any later pass.

use geo::MultiPolygon;
use log::warn;
use rustc_hash::FxHashMap;

use inav_core::geom::{self, BBox};
use inav_core::{Connection, ConnectionKind, Coord, Feature, Geometry, GeometryProps, NavigationFlags};
use inav_graph::{Graph, Node};

/// Room polygons are buffered outward by this much for containment tests.
pub const ROOM_BUFFER_M: f64 = 0.3;

/// One room: source polygon, its buffered copy, and the buffered hull.
pub struct Room {
    pub geometry_id: String,
    pub floor_id: String,
    pub polygon: MultiPolygon<f64>,
    pub buffered: MultiPolygon<f64>,
    pub bbox: BBox,
    area_m2: f64,
}

impl Room {
    /// Buffered, edge-inclusive containment with bbox pre-rejection.
    pub fn contains(&self, p: Coord) -> bool {
        geom::bbox_contains(&self.bbox, p) && geom::point_in_polygon(p, &self.buffered)
    }
}

/// Derived per-room statistics used for public/private classification.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RoomMeta {
    pub area_m2: f64,
    pub door_count: usize,
    pub public_door_count: usize,
}

/// Thresholds for classifying a room as public (lobby, corridor) versus
/// private (office).  Private rooms require door anchoring when routing.
#[derive(Copy, Clone, Debug)]
pub struct RoomThresholds {
    /// `P`: public-door count at or above which a room is public.
    pub min_public_doors: usize,
    /// `A`: area in m² at or above which a room is public.
    pub min_area_m2: f64,
}

impl Default for RoomThresholds {
    fn default() -> Self {
        Self { min_public_doors: 2, min_area_m2: 80.0 }
    }
}

impl RoomThresholds {
    /// Public iff `public_door_count >= P`, or `door_count >= max(2, P)`,
    /// or `area >= A`.
    pub fn is_public(&self, meta: &RoomMeta) -> bool {
        meta.public_door_count >= self.min_public_doors
            || meta.door_count >= self.min_public_doors.max(2)
            || meta.area_m2 >= self.min_area_m2
    }
}

/// Output of door-node synthesis: the nodes plus the door line features to
/// register with the collision detector, keyed by floor.
pub struct DoorSet {
    pub nodes: Vec<Node>,
    pub line_features: Vec<(String, Geometry)>,
}

/// Rooms, room metadata, and the room↔door index for one dataset.
pub struct RoomDoorModel {
    rooms: Vec<Room>,
    index: FxHashMap<String, usize>,
    by_floor: FxHashMap<String, Vec<usize>>,
    meta: FxHashMap<String, RoomMeta>,
    doors_by_room: FxHashMap<String, Vec<String>>,
    thresholds: RoomThresholds,
}

impl RoomDoorModel {
    /// Index every feature with kind `"room"` and area geometry.  Rooms
    /// whose buffer fails are dropped (and logged), per the geometry-kit
    /// failure policy.
    pub fn build(
        features: &[Feature<GeometryProps>],
        kinds: &FxHashMap<String, String>,
        thresholds: RoomThresholds,
    ) -> Self {
        let mut model = Self {
            rooms: Vec::new(),
            index: FxHashMap::default(),
            by_floor: FxHashMap::default(),
            meta: FxHashMap::default(),
            doors_by_room: FxHashMap::default(),
            thresholds,
        };

        for feature in features {
            let id = &feature.properties.id;
            if kinds.get(id).map(String::as_str) != Some("room") || !feature.geometry.is_area() {
                continue;
            }
            let Some(polygon) = feature.geometry.to_multipolygon() else {
                warn!("room {id}: unbuildable polygon, dropped");
                continue;
            };
            let buffered = match geom::buffer(&feature.geometry, ROOM_BUFFER_M) {
                Ok(b) => b,
                Err(e) => {
                    warn!("room {id}: buffer failed ({e}), dropped");
                    continue;
                }
            };
            let Some(bbox) = geom::bbox_of(
                buffered
                    .0
                    .iter()
                    .flat_map(|p| p.exterior().0.iter())
                    .map(|c| Coord::from_geo(*c)),
            ) else {
                continue;
            };

            let area_m2 = geom::polygon_area_m2(&polygon);
            let idx = model.rooms.len();
            model.index.insert(id.clone(), idx);
            model
                .by_floor
                .entry(feature.properties.floor_id.clone())
                .or_default()
                .push(idx);
            model.meta.insert(id.clone(), RoomMeta { area_m2, ..RoomMeta::default() });
            model.rooms.push(Room {
                geometry_id: id.clone(),
                floor_id: feature.properties.floor_id.clone(),
                polygon,
                buffered,
                bbox,
                area_m2,
            });
        }
        model
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room(&self, geometry_id: &str) -> Option<&Room> {
        self.index.get(geometry_id).map(|&i| &self.rooms[i])
    }

    pub fn meta(&self, geometry_id: &str) -> Option<&RoomMeta> {
        self.meta.get(geometry_id)
    }

    pub fn doors_of(&self, geometry_id: &str) -> &[String] {
        self.doors_by_room.get(geometry_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn thresholds(&self) -> RoomThresholds {
        self.thresholds
    }

    pub fn is_public(&self, geometry_id: &str) -> bool {
        self.meta
            .get(geometry_id)
            .is_some_and(|m| self.thresholds.is_public(m))
    }

    /// The room containing `at` on a floor.  Overlapping rooms resolve to
    /// the smallest by area (a nested room beats its parent).
    pub fn find_room_at(&self, at: Coord, floor_id: &str) -> Option<&Room> {
        let idxs = self.by_floor.get(floor_id)?;
        idxs.iter()
            .map(|&i| &self.rooms[i])
            .filter(|r| r.contains(at))
            .min_by(|a, b| a.area_m2.total_cmp(&b.area_m2))
    }

    /// Public-room ids across all floors.
    pub fn public_room_ids(&self) -> impl Iterator<Item = &str> {
        self.rooms
            .iter()
            .filter(|r| self.is_public(&r.geometry_id))
            .map(|r| r.geometry_id.as_str())
    }

    // ── Door synthesis ────────────────────────────────────────────────────

    /// Create one door node per distinct geometry id referenced by `door`
    /// connections, OR-merging flags across entrances.  Position is the
    /// feature center; id is `door_<geometry_id>`.
    pub fn build_door_nodes(
        connections: &[Connection],
        features_by_id: &FxHashMap<&str, &Feature<GeometryProps>>,
        flags: &NavigationFlags,
    ) -> DoorSet {
        // Merge entrances per geometry id, preserving first-seen order.
        let mut order: Vec<String> = Vec::new();
        let mut merged: FxHashMap<String, (String, u32)> = FxHashMap::default();
        for connection in connections {
            if connection.kind != ConnectionKind::Door {
                continue;
            }
            for entrance in &connection.entrances {
                match merged.get_mut(&entrance.geometry_id) {
                    Some((_, word)) => *word |= entrance.flags,
                    None => {
                        order.push(entrance.geometry_id.clone());
                        merged.insert(
                            entrance.geometry_id.clone(),
                            (entrance.floor_id.clone(), entrance.flags),
                        );
                    }
                }
            }
        }

        let mut nodes = Vec::with_capacity(order.len());
        let mut line_features = Vec::new();
        for geometry_id in order {
            let (floor_id, word) = &merged[&geometry_id];
            let Some(feature) = features_by_id.get(geometry_id.as_str()) else {
                warn!("door {geometry_id}: no matching geometry feature, skipped");
                continue;
            };
            let anchor = match geom::feature_anchor(&feature.geometry) {
                Ok(a) => a,
                Err(e) => {
                    warn!("door {geometry_id}: no anchor ({e}), skipped");
                    continue;
                }
            };
            if feature.geometry.is_line() {
                line_features.push((floor_id.clone(), feature.geometry.clone()));
            }
            nodes.push(Node::door(
                format!("door_{geometry_id}"),
                anchor,
                floor_id.clone(),
                flags.is_public(*word),
                *word,
                geometry_id,
            ));
        }
        DoorSet { nodes, line_features }
    }

    /// Assign `room_ids` to door nodes and build the room↔door index plus
    /// per-room door counts.
    pub fn assign_doors(&mut self, door_nodes: &mut [Node]) {
        for node in door_nodes {
            let Some(idxs) = self.by_floor.get(&node.floor_id) else {
                continue;
            };
            let mut room_ids: Vec<String> = idxs
                .iter()
                .map(|&i| &self.rooms[i])
                .filter(|r| r.contains(node.coord))
                .map(|r| r.geometry_id.clone())
                .collect();
            room_ids.sort_unstable();

            for room_id in &room_ids {
                self.doors_by_room.entry(room_id.clone()).or_default().push(node.id.clone());
                if let Some(meta) = self.meta.get_mut(room_id) {
                    meta.door_count += 1;
                    if node.meta.is_public {
                        meta.public_door_count += 1;
                    }
                }
            }
            node.meta.room_ids = room_ids;
        }
    }

    /// Late-bound room tagging: every non-door node without `room_ids`
    /// whose coordinate lies in a buffered room polygon gets that room.
    /// Nodes on public corridors lie in no room and stay unrestricted.
    pub fn tag_nodes_with_rooms(&self, graph: &mut Graph) {
        let pending: Vec<(String, Coord, String)> = graph
            .nodes()
            .filter(|n| !n.meta.is_door && n.meta.room_ids.is_empty())
            .map(|n| (n.id.clone(), n.coord, n.floor_id.clone()))
            .collect();

        for (id, coord, floor_id) in pending {
            if let Some(room) = self.find_room_at(coord, &floor_id) {
                if let Some(node) = graph.node_mut(&id) {
                    node.meta.room_ids = vec![room.geometry_id.clone()];
                }
            }
        }
    }
}
