//! Graph node model.
//!
//! Nodes are keyed by stable string id and are immutable after graph build,
//! with one exception: `meta.room_ids` is assigned late, once the room index
//! exists (room containment cannot be decided before every room polygon has
//! been buffered).

use inav_core::Coord;

/// What a node represents in the building.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NodeKind {
    Walkable,
    Entrance,
    Door,
    Stairs,
    Elevator,
    Waypoint,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Walkable => "walkable",
            NodeKind::Entrance => "entrance",
            NodeKind::Door => "door",
            NodeKind::Stairs => "stairs",
            NodeKind::Elevator => "elevator",
            NodeKind::Waypoint => "waypoint",
        }
    }
}

/// Node metadata.
///
/// `room_ids` empty means the node sits on a public walkway and is never
/// room-restricted.  For door nodes `is_locked == !is_public` always holds.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeMeta {
    pub geometry_ids: Vec<String>,
    pub room_ids: Vec<String>,
    pub is_door: bool,
    pub is_public: bool,
    pub is_locked: bool,
    pub is_stairs: bool,
    pub is_elevator: bool,
    pub accessible: bool,
    pub flags: u32,
}

impl Default for NodeMeta {
    fn default() -> Self {
        Self {
            geometry_ids: Vec::new(),
            room_ids: Vec::new(),
            is_door: false,
            is_public: true,
            is_locked: false,
            is_stairs: false,
            is_elevator: false,
            accessible: true,
            flags: 0,
        }
    }
}

/// A graph node: a walkable sample point, door, connector, or entrance.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: String,
    pub coord: Coord,
    pub floor_id: String,
    pub kind: NodeKind,
    pub meta: NodeMeta,
}

impl Node {
    /// Plain node of the given kind.  Stairs/elevator kinds get their
    /// accessibility metadata set (stairs are not wheelchair-accessible).
    pub fn new(id: impl Into<String>, coord: Coord, floor_id: impl Into<String>, kind: NodeKind) -> Self {
        let mut meta = NodeMeta::default();
        match kind {
            NodeKind::Stairs => {
                meta.is_stairs = true;
                meta.accessible = false;
            }
            NodeKind::Elevator => {
                meta.is_elevator = true;
            }
            _ => {}
        }
        Self {
            id: id.into(),
            coord,
            floor_id: floor_id.into(),
            kind,
            meta,
        }
    }

    /// Door node; upholds `is_locked == !is_public`.
    pub fn door(
        id: impl Into<String>,
        coord: Coord,
        floor_id: impl Into<String>,
        is_public: bool,
        flags: u32,
        geometry_id: impl Into<String>,
    ) -> Self {
        let mut node = Node::new(id, coord, floor_id, NodeKind::Door);
        node.meta.is_door = true;
        node.meta.is_public = is_public;
        node.meta.is_locked = !is_public;
        node.meta.flags = flags;
        node.meta.geometry_ids = vec![geometry_id.into()];
        node
    }

    #[inline]
    pub fn is_connector(&self) -> bool {
        matches!(self.kind, NodeKind::Stairs | NodeKind::Elevator)
    }

    #[inline]
    pub fn in_room(&self, room_id: &str) -> bool {
        self.meta.room_ids.iter().any(|r| r == room_id)
    }
}
