//! Cross-floor stitching and orphan-door linking.
//!
//! Multi-floor connectors (stairs, elevators, escalators) become
//! bidirectional edges between the nodes anchored to each entrance.  Edge
//! weight is the geodesic distance between the endpoints plus a constant
//! vertical-travel surcharge, which disincentivizes gratuitous floor
//! changes without requiring elevation data.
//!
//! A malformed connection (unresolvable geometry id, fewer than two
//! entrances) is logged and skipped; the remaining connections still apply.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use inav_core::{Connection, ConnectionKind, Coord};
use inav_graph::{EdgeKind, Graph};
use inav_model::CollisionDetector;

/// Orphan doors link to their nearest node within this range.
pub const DOOR_LINK_MAX_M: f64 = 6.0;

/// Resolve `(geometry_id, floor_id)` to a node id via node metadata.
fn geometry_index(graph: &Graph) -> FxHashMap<(&str, &str), &str> {
    let mut index: FxHashMap<(&str, &str), &str> = FxHashMap::default();
    for node in graph.nodes() {
        for geometry_id in &node.meta.geometry_ids {
            index
                .entry((geometry_id.as_str(), node.floor_id.as_str()))
                .or_insert(node.id.as_str());
        }
    }
    index
}

/// Apply stairs/elevator/escalator connections as bidirectional edges.
/// Returns the number of directed edges added.
pub fn apply_connections(
    graph: &mut Graph,
    connections: &[Connection],
    vertical_travel_m: f64,
) -> usize {
    struct Planned {
        from: String,
        to: String,
        weight_m: f64,
        kind: EdgeKind,
        accessible: bool,
    }

    let mut planned: Vec<Planned> = Vec::new();
    {
        let index = geometry_index(graph);
        for connection in connections {
            let (kind, accessible) = match connection.kind {
                ConnectionKind::Stairs => (EdgeKind::Stairs, false),
                ConnectionKind::Elevator => (EdgeKind::Elevator, true),
                ConnectionKind::Escalator => (EdgeKind::Escalator, false),
                // Doors are handled by the room/door model.
                ConnectionKind::Door => continue,
            };

            let mut anchors: Vec<(&str, Coord)> = Vec::with_capacity(connection.entrances.len());
            for entrance in &connection.entrances {
                match index.get(&(entrance.geometry_id.as_str(), entrance.floor_id.as_str())) {
                    Some(&node_id) => {
                        let node = graph.node(node_id).expect("indexed ids resolve");
                        anchors.push((node_id, node.coord));
                    }
                    None => warn!(
                        "connection entrance {}@{} has no node, skipped",
                        entrance.geometry_id, entrance.floor_id
                    ),
                }
            }
            if anchors.len() < 2 {
                warn!("{} connection with fewer than 2 resolvable entrances, skipped", kind.as_str());
                continue;
            }

            for i in 0..anchors.len() {
                for j in i + 1..anchors.len() {
                    let (from, from_coord) = anchors[i];
                    let (to, to_coord) = anchors[j];
                    planned.push(Planned {
                        from: from.to_string(),
                        to: to.to_string(),
                        weight_m: from_coord.distance_m(to_coord) + vertical_travel_m,
                        kind,
                        accessible,
                    });
                }
            }
        }
    }

    let mut added = 0;
    for p in planned {
        match graph.add_edge_pair(&p.from, &p.to, p.weight_m, p.kind, p.accessible) {
            Ok(()) => added += 2,
            Err(e) => warn!("connector edge dropped: {e}"),
        }
    }
    added
}

/// Link every door node with zero edges to its nearest neighbor within
/// [`DOOR_LINK_MAX_M`]: line-of-sight preferred, unconditionally nearest as
/// a fallback.  Guarantees doors are never isolated.  Returns the number of
/// doors linked.
pub fn connect_orphan_doors(graph: &mut Graph, collision: &CollisionDetector) -> usize {
    let orphans: Vec<(String, Coord, String)> = graph
        .nodes()
        .filter(|n| n.meta.is_door && graph.degree(&n.id) == 0)
        .map(|n| (n.id.clone(), n.coord, n.floor_id.clone()))
        .collect();

    let mut linked = 0;
    for (door_id, door_coord, floor_id) in orphans {
        let nearby: Vec<(String, Coord, f64)> = graph
            .k_nearest_nodes(door_coord, &floor_id, 16, |n| n.id != door_id)
            .into_iter()
            .map(|n| (n.id.clone(), n.coord, door_coord.distance_m(n.coord)))
            .filter(|(_, _, d)| *d <= DOOR_LINK_MAX_M)
            .collect();
        if nearby.is_empty() {
            debug!("orphan door {door_id}: nothing within {DOOR_LINK_MAX_M} m");
            continue;
        }

        let target = nearby
            .iter()
            .find(|(_, coord, _)| collision.has_line_of_sight(door_coord, *coord, &floor_id))
            .unwrap_or(&nearby[0]);

        match graph.add_edge_pair(&door_id, &target.0, target.2, EdgeKind::DoorLink, true) {
            Ok(()) => linked += 1,
            Err(e) => warn!("orphan door link dropped: {e}"),
        }
    }
    linked
}
