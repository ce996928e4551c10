//! The pathfinding engine: initialization pipeline and route queries.
//!
//! # Initialization order
//!
//! obstacles → rooms → nodes (walkable, connector, entrance, door) →
//! spatial indexes → visibility edges (cache or build) → cross-floor
//! connectors → room/door tagging → orphan-door linking.
//!
//! Everything is built into local state and committed at the end, so a
//! cancellation at any yield point leaves the engine exactly as it was:
//! uninitialized, with no partial state.
//!
//! # Query protocol
//!
//! `find_route` is cache → room detection → endpoint classification →
//! candidate selection → connector clearance (with layered fallbacks) →
//! constrained A* over candidate pairs → assembly.  Queries run to
//! completion without yielding; after initialization the graph, collision
//! model, and room index are immutable, so concurrent queries need no
//! locking beyond the LRU cache's own mutex.

use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use inav_core::{Connection, Coord, Feature, GeometryProps, NavigationFlags, NodeProps};
use inav_graph::{Edge, EdgeKind, Graph, Node, NodeKind};
use inav_model::{CollisionDetector, Room, RoomDoorModel};
use inav_route::{PathResult, SearchOptions, Segment, find_path, find_path_bidirectional};
use inav_route::{Instruction, SPLINE_RESOLUTION, generate, smooth_with_floors};

use crate::cache::{
    CacheMeta, CachedEdge, CachedEdgeSet, EdgeStore, PathCache, cache_key, unix_now_secs,
};
use crate::config::EngineConfig;
use crate::connections::{apply_connections, connect_orphan_doors};
use crate::edge_builder::{BuildControl, build_visibility_edges};
use crate::error::{EngineError, EngineResult};

/// Widening-radius for the spatial fallback when no candidate clears
/// (≈ 200 m).
const WIDENING_RADIUS_DEG: f64 = 0.002;

/// Candidate cap for the widening-radius fallback.
const WIDENING_CANDIDATES: usize = 10;

/// Connectors shorter than this are not materialized as route prefix/suffix.
const COINCIDENT_M: f64 = 1e-6;

// ── Inputs ────────────────────────────────────────────────────────────────────

/// Everything the engine consumes, already parsed.  See the crate docs for
/// the expected feature collections and side tables.
#[derive(Clone, Debug, Default)]
pub struct MapData {
    /// Dataset identity for the visibility-edge cache key.
    pub map_id: String,
    /// Dataset timestamp for the cache key.
    pub map_time: u64,
    pub geometry: Vec<Feature<GeometryProps>>,
    pub kinds: FxHashMap<String, String>,
    pub walkable_set: FxHashSet<String>,
    pub nonwalkable_set: FxHashSet<String>,
    pub walkable_nodes: Vec<Feature<NodeProps>>,
    pub stairs_nodes: Vec<Feature<NodeProps>>,
    pub elevator_nodes: Vec<Feature<NodeProps>>,
    pub entrance_nodes: Vec<Feature<NodeProps>>,
    pub connections: Vec<Connection>,
    pub navigation_flags: NavigationFlags,
}

/// Runtime flags for one initialization.
#[derive(Clone, Debug, Default)]
pub struct InitOptions {
    /// Skip the cache read (always rebuild edges).
    pub rebuild_graph: bool,
    /// Skip both cache read and write.
    pub no_graph_cache: bool,
}

/// How rooms constrain traversal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoomTraversalMode {
    /// Endpoint rooms plus public rooms are traversable.
    #[default]
    Public,
    /// Only the endpoint rooms are traversable.
    Strict,
    /// No room constraints.
    All,
}

impl RoomTraversalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomTraversalMode::Public => "public",
            RoomTraversalMode::Strict => "strict",
            RoomTraversalMode::All => "all",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RouteOptions {
    /// Reject non-accessible edges (stairs).
    pub accessible_only: bool,
    /// Reject stairs edges regardless of accessibility flags.
    pub avoid_stairs: bool,
    /// Allow locked doors as anchors and waypoints.
    pub allow_locked_doors: bool,
    pub room_traversal: RoomTraversalMode,
    /// Apply cosmetic spline smoothing to the returned path.
    pub smooth: bool,
}

#[derive(Clone, Debug)]
pub struct RouteRequest {
    pub start: Coord,
    pub start_floor: String,
    pub end: Coord,
    pub end_floor: String,
    pub options: RouteOptions,
}

// ── Outputs ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct RouteMeta {
    pub from_cache: bool,
    /// Room constraints were dropped after the constrained search failed.
    pub constraints_relaxed: bool,
}

/// A computed route.
///
/// Invariants: `path.len() == floors.len()`, and `distance_m` equals the
/// sum of `segments` distances whenever `segments` is non-empty (trivial
/// two-point routes carry a single synthetic segment).  Synthetic connector
/// segments use `"start"` / `"end"` in place of node ids and are not listed
/// in `node_ids`.
#[derive(Clone, Debug)]
pub struct Route {
    pub path: Vec<Coord>,
    pub node_ids: Vec<String>,
    pub floors: Vec<String>,
    pub segments: Vec<Segment>,
    pub distance_m: f64,
    pub start_node: Option<String>,
    pub end_node: Option<String>,
    pub warnings: Vec<String>,
    pub meta: RouteMeta,
}

impl Route {
    /// Turn-by-turn instructions for this route.
    pub fn instructions(&self) -> Vec<Instruction> {
        generate(&self.path, &self.floors)
    }
}

/// Initialization statistics for operator logging.
#[derive(Clone, Debug, Default)]
pub struct EngineStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub floor_count: usize,
    pub room_count: usize,
    pub door_count: usize,
    pub build_ms: u64,
    pub cache_hit: bool,
}

/// The last route failure, for operator inspection.
#[derive(Clone, Debug)]
pub struct RouteErrorInfo {
    pub code: &'static str,
    pub message: String,
}

// ── Engine ────────────────────────────────────────────────────────────────────

struct Anchor<'g> {
    node: &'g Node,
    connector_m: f64,
}

pub struct PathfindingEngine {
    config: EngineConfig,
    graph: Graph,
    collision: CollisionDetector,
    rooms: RoomDoorModel,
    initialized: bool,
    path_cache: PathCache<Route>,
    last_error: Mutex<Option<RouteErrorInfo>>,
}

impl PathfindingEngine {
    pub fn new(config: EngineConfig) -> Self {
        let rooms = RoomDoorModel::build(&[], &FxHashMap::default(), config.room_thresholds());
        let path_cache = PathCache::new(config.path_cache_size);
        Self {
            config,
            graph: Graph::new(),
            collision: CollisionDetector::new(),
            rooms,
            initialized: false,
            path_cache,
            last_error: Mutex::new(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn collision(&self) -> &CollisionDetector {
        &self.collision
    }

    pub fn rooms(&self) -> &RoomDoorModel {
        &self.rooms
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn get_last_route_error(&self) -> Option<RouteErrorInfo> {
        self.last_error.lock().expect("error slot poisoned").clone()
    }

    // ── Initialization ────────────────────────────────────────────────────

    pub fn initialize(
        &mut self,
        data: &MapData,
        store: Option<&dyn EdgeStore>,
        opts: &InitOptions,
        cancel: Option<&AtomicBool>,
    ) -> EngineResult<EngineStats> {
        let started = Instant::now();
        self.initialized = false;

        // One check up front so prior work can drain before we start.
        check_cancel(cancel)?;

        for id in data.walkable_set.intersection(&data.nonwalkable_set) {
            warn!("geometry {id} is in both the walkable and non-walkable sets");
        }

        // Obstacles.
        let mut collision = CollisionDetector::new();
        collision.ingest(&data.geometry, &data.kinds, &data.nonwalkable_set);

        // Rooms.
        let mut rooms =
            RoomDoorModel::build(&data.geometry, &data.kinds, self.config.room_thresholds());

        // Nodes.
        let mut graph = Graph::new();
        add_point_nodes(&mut graph, &data.walkable_nodes, NodeKind::Walkable);
        add_point_nodes(&mut graph, &data.stairs_nodes, NodeKind::Stairs);
        add_point_nodes(&mut graph, &data.elevator_nodes, NodeKind::Elevator);
        add_point_nodes(&mut graph, &data.entrance_nodes, NodeKind::Entrance);

        // Door nodes; their line features open holes in the collision model
        // and must be registered before any line-of-sight runs.
        let features_by_id: FxHashMap<&str, &Feature<GeometryProps>> = data
            .geometry
            .iter()
            .map(|f| (f.properties.id.as_str(), f))
            .collect();
        let mut door_set =
            RoomDoorModel::build_door_nodes(&data.connections, &features_by_id, &data.navigation_flags);
        for (floor_id, geometry) in &door_set.line_features {
            collision.add_door_feature(floor_id, geometry);
        }
        rooms.assign_doors(&mut door_set.nodes);
        let door_count = door_set.nodes.len();
        for node in door_set.nodes {
            if let Err(e) = graph.add_node(node) {
                warn!("door node dropped: {e}");
            }
        }

        let config = self.config.tightened_for(graph.node_count());

        check_cancel(cancel)?;
        graph.build_spatial_indexes();

        // Visibility edges: cache hit or cooperative build.
        let key = cache_key(&data.map_id, data.map_time, &config);
        let mut cache_hit = false;
        let mut edges: Option<Vec<Edge>> = None;
        if !opts.rebuild_graph && !opts.no_graph_cache {
            if let Some(store) = store {
                match store.get(&key) {
                    Ok(Some(record)) => {
                        debug!("visibility cache hit: {} edges", record.edges.len());
                        edges = Some(
                            record
                                .edges
                                .iter()
                                .map(|e| {
                                    Edge::new(&e.from, &e.to, e.weight_m, EdgeKind::Walkable, true)
                                })
                                .collect(),
                        );
                        cache_hit = true;
                    }
                    Ok(None) => {}
                    Err(e) => warn!("visibility cache read failed: {e}"),
                }
            }
        }

        let edges = match edges {
            Some(edges) => edges,
            None => {
                let mut ctl = BuildControl { cancel, ..BuildControl::default() };
                let built = build_visibility_edges(&graph, &collision, &config, &mut ctl)?;
                if let Some(store) = store {
                    if !opts.no_graph_cache {
                        let record = CachedEdgeSet {
                            edges: built
                                .iter()
                                .map(|e| CachedEdge {
                                    from: e.from.clone(),
                                    to: e.to.clone(),
                                    weight_m: e.weight_m,
                                })
                                .collect(),
                            meta: CacheMeta {
                                node_count: graph.node_count(),
                                floor_count: graph.floors().len(),
                            },
                            created_at: unix_now_secs(),
                        };
                        // Fire-and-forget: a failed write must never fail init.
                        if let Err(e) = store.put(&key, &record) {
                            warn!("visibility cache write failed: {e}");
                        }
                    }
                }
                built
            }
        };
        for edge in edges {
            if let Err(e) = graph.add_edge(edge) {
                warn!("visibility edge dropped: {e}");
            }
        }

        // Cross-floor connectors.
        let connector_edges =
            apply_connections(&mut graph, &data.connections, config.vertical_travel_m);
        debug!("{connector_edges} connector edges added");

        // Late-bound room tagging; doors were assigned first and win.
        rooms.tag_nodes_with_rooms(&mut graph);

        // No door may end up isolated.
        let linked = connect_orphan_doors(&mut graph, &collision);
        if linked > 0 {
            debug!("{linked} orphan doors linked");
        }

        check_cancel(cancel)?;

        // Commit.
        let stats = EngineStats {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            floor_count: graph.floors().len(),
            room_count: rooms.room_count(),
            door_count,
            build_ms: started.elapsed().as_millis() as u64,
            cache_hit,
        };
        self.graph = graph;
        self.collision = collision;
        self.rooms = rooms;
        self.path_cache = PathCache::new(config.path_cache_size);
        self.config = config;
        self.initialized = true;
        Ok(stats)
    }

    // ── Query ─────────────────────────────────────────────────────────────

    pub fn find_route(&self, req: &RouteRequest) -> EngineResult<Route> {
        match self.find_route_inner(req) {
            Ok(route) => {
                *self.last_error.lock().expect("error slot poisoned") = None;
                Ok(route)
            }
            Err(e) => {
                *self.last_error.lock().expect("error slot poisoned") =
                    Some(RouteErrorInfo { code: e.code(), message: e.to_string() });
                Err(e)
            }
        }
    }

    fn find_route_inner(&self, req: &RouteRequest) -> EngineResult<Route> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }

        let cache_key = self.route_cache_key(req);
        if let Some(mut route) = self.path_cache.get(&cache_key) {
            route.meta.from_cache = true;
            return Ok(route);
        }

        let opts = &req.options;
        let start_room = self.rooms.find_room_at(req.start, &req.start_floor);
        let end_room = self.rooms.find_room_at(req.end, &req.end_floor);

        // Same room, clear line between the endpoints: trivial route.
        if let (Some(s), Some(e)) = (start_room, end_room) {
            if s.geometry_id == e.geometry_id
                && req.start_floor == req.end_floor
                && self.collision.is_path_clear(req.start, req.end, &req.start_floor)
            {
                let route = self.trivial_route(req);
                self.path_cache.put(cache_key, route.clone());
                return Ok(route);
            }
        }

        // Candidates (door anchoring for private rooms happens here).
        let start_candidates = self.endpoint_candidates(req.start, &req.start_floor, start_room, opts)?;
        let end_candidates = self.endpoint_candidates(req.end, &req.end_floor, end_room, opts)?;

        // Connector clearance with layered fallbacks.
        let starts =
            self.select_anchors(req.start, &req.start_floor, start_room, start_candidates, "start")?;
        let ends = self.select_anchors(req.end, &req.end_floor, end_room, end_candidates, "end")?;

        // Room constraints.
        let constrained = opts.room_traversal != RoomTraversalMode::All;
        let mut allowed: FxHashSet<String> = FxHashSet::default();
        if constrained {
            if let Some(room) = start_room {
                allowed.insert(room.geometry_id.clone());
            }
            if let Some(room) = end_room {
                allowed.insert(room.geometry_id.clone());
            }
            if opts.room_traversal == RoomTraversalMode::Public {
                allowed.extend(self.rooms.public_room_ids().map(str::to_string));
            }
        }
        let allow_locked = opts.allow_locked_doors;
        let lock_filter = move |n: &Node| allow_locked || !(n.meta.is_door && n.meta.is_locked);

        let search_opts = SearchOptions {
            accessible_only: opts.accessible_only,
            avoid_stairs: opts.avoid_stairs,
            heuristic_weight: self.config.heuristic_weight,
            allowed_room_ids: constrained.then_some(&allowed),
            disallow_other_rooms: constrained,
            node_filter: Some(&lock_filter),
        };

        let mut constraints_relaxed = false;
        let mut best = self.best_pair(&starts, &ends, &search_opts)?;
        if best.is_none() && constrained {
            // Constrained search found nothing: retry as if mode were `all`.
            let fallback = SearchOptions {
                allowed_room_ids: None,
                disallow_other_rooms: false,
                ..search_opts
            };
            best = self.best_pair(&starts, &ends, &fallback)?;
            constraints_relaxed = best.is_some();
        }
        let Some((path, si, ei)) = best else {
            return Err(EngineError::NoPath);
        };

        let route = self.assemble(req, path, &starts[si], &ends[ei], constraints_relaxed);
        self.path_cache.put(cache_key, route.clone());
        Ok(route)
    }

    // ── Query internals ───────────────────────────────────────────────────

    fn route_cache_key(&self, req: &RouteRequest) -> String {
        // Rounded to ~1 m so jittery GPS-ish inputs share entries.
        let r = |v: f64| (v * 1e5).round() as i64;
        format!(
            "{}:{}:{}:{}:{}:{}:a{}:s{}:l{}:m{}:p{}:A{}:sm{}",
            r(req.start.lng),
            r(req.start.lat),
            req.start_floor,
            r(req.end.lng),
            r(req.end.lat),
            req.end_floor,
            req.options.accessible_only,
            req.options.avoid_stairs,
            req.options.allow_locked_doors,
            req.options.room_traversal.as_str(),
            self.config.public_room_door_count,
            self.config.public_room_area_m2,
            req.options.smooth,
        )
    }

    fn trivial_route(&self, req: &RouteRequest) -> Route {
        let distance_m = req.start.distance_m(req.end);
        Route {
            path: vec![req.start, req.end],
            node_ids: Vec::new(),
            floors: vec![req.start_floor.clone(), req.start_floor.clone()],
            segments: vec![Segment {
                from: "start".to_string(),
                to: "end".to_string(),
                from_coord: req.start,
                to_coord: req.end,
                distance_m,
                from_floor: req.start_floor.clone(),
                to_floor: req.start_floor.clone(),
                floor_change: false,
            }],
            distance_m,
            start_node: None,
            end_node: None,
            warnings: Vec::new(),
            meta: RouteMeta::default(),
        }
    }

    /// Nearest walkable nodes plus, for private rooms, the room's usable
    /// doors.  Fails with `no-door` when a private room's doors exist but
    /// none is usable.
    fn endpoint_candidates(
        &self,
        at: Coord,
        floor_id: &str,
        room: Option<&Room>,
        opts: &RouteOptions,
    ) -> EngineResult<Vec<&Node>> {
        let mut candidates = self.graph.k_nearest_nodes(
            at,
            floor_id,
            self.config.endpoint_candidates,
            |n| n.kind == NodeKind::Walkable,
        );

        if let Some(room) = room {
            if !self.rooms.is_public(&room.geometry_id) {
                let door_ids = self.rooms.doors_of(&room.geometry_id);
                if !door_ids.is_empty() {
                    let usable: Vec<&Node> = door_ids
                        .iter()
                        .filter_map(|id| self.graph.node(id))
                        .filter(|d| !d.meta.is_locked || opts.allow_locked_doors)
                        .collect();
                    if usable.is_empty() {
                        return Err(EngineError::NoDoor { room: room.geometry_id.clone() });
                    }
                    candidates.extend(usable);
                }
            }
        }
        Ok(candidates)
    }

    /// The layered connector-clearance fallbacks: strict → relaxed →
    /// in-room doors → widening spatial search → unconditional nearest →
    /// `blocked`.
    fn select_anchors<'g>(
        &'g self,
        at: Coord,
        floor_id: &str,
        room: Option<&Room>,
        candidates: Vec<&'g Node>,
        which: &'static str,
    ) -> EngineResult<Vec<Anchor<'g>>> {
        let anchors = |nodes: Vec<&'g Node>| -> Vec<Anchor<'g>> {
            nodes
                .into_iter()
                .map(|node| Anchor { node, connector_m: at.distance_m(node.coord) })
                .collect()
        };

        let strict: Vec<&Node> = candidates
            .iter()
            .copied()
            .filter(|c| self.collision.is_path_clear(at, c.coord, floor_id))
            .collect();
        if !strict.is_empty() {
            return Ok(anchors(strict));
        }

        let relaxed: Vec<&Node> = candidates
            .iter()
            .copied()
            .filter(|c| self.collision.is_path_clear_relaxed(at, c.coord, floor_id))
            .collect();
        if !relaxed.is_empty() {
            return Ok(anchors(relaxed));
        }

        // Inside a room: its door candidates count without any clearance
        // check (the room geometry itself vouches for reachability).
        if let Some(room) = room {
            let doors: Vec<&Node> = candidates
                .iter()
                .copied()
                .filter(|c| c.meta.is_door && c.in_room(&room.geometry_id))
                .collect();
            if !doors.is_empty() {
                return Ok(anchors(doors));
            }
        }

        // Widening spatial search, relaxed clearance.
        let mut widened: Vec<&Node> = self
            .graph
            .nodes_within_box(at, floor_id, WIDENING_RADIUS_DEG)
            .into_iter()
            .filter(|n| n.kind == NodeKind::Walkable)
            .collect();
        widened.sort_by(|a, b| {
            at.fast_distance_m(a.coord).total_cmp(&at.fast_distance_m(b.coord))
        });
        let widened: Vec<&Node> = widened
            .into_iter()
            .take(WIDENING_CANDIDATES)
            .filter(|n| self.collision.is_path_clear_relaxed(at, n.coord, floor_id))
            .collect();
        if !widened.is_empty() {
            return Ok(anchors(widened));
        }

        // Last resort: trust the precomputed graph and take the nearest
        // node with no clearance check at all.
        if let Some(node) =
            self.graph.expanding_nearest(at, floor_id, &inav_graph::EXPANDING_RADII_DEG, |_| true)
        {
            return Ok(anchors(vec![node]));
        }

        Err(EngineError::Blocked { which })
    }

    /// Run A* for every candidate pair and keep the combination minimizing
    /// `indoor + start connector + end connector`.
    fn best_pair(
        &self,
        starts: &[Anchor],
        ends: &[Anchor],
        search_opts: &SearchOptions,
    ) -> EngineResult<Option<(PathResult, usize, usize)>> {
        let mut best: Option<(PathResult, usize, usize)> = None;
        let mut best_total = f64::INFINITY;

        for (si, s) in starts.iter().enumerate() {
            for (ei, e) in ends.iter().enumerate() {
                let found = if self.config.use_bidirectional {
                    find_path_bidirectional(&self.graph, &s.node.id, &e.node.id, search_opts)?
                } else {
                    find_path(&self.graph, &s.node.id, &e.node.id, search_opts)?
                };
                if let Some(path) = found {
                    let total = path.distance_m + s.connector_m + e.connector_m;
                    if total < best_total {
                        best_total = total;
                        best = Some((path, si, ei));
                    }
                }
            }
        }
        Ok(best)
    }

    fn assemble(
        &self,
        req: &RouteRequest,
        path: PathResult,
        start: &Anchor,
        end: &Anchor,
        constraints_relaxed: bool,
    ) -> Route {
        let mut coords = path.coords;
        let mut floors = path.floors;
        let mut segments = path.segments;
        let mut distance_m = path.distance_m;
        let mut warnings = Vec::new();

        // Prefix/suffix the raw endpoints iff their connectors are clear.
        let start_clear =
            self.collision.is_path_clear_relaxed(req.start, start.node.coord, &req.start_floor);
        if start_clear {
            if start.connector_m > COINCIDENT_M {
                coords.insert(0, req.start);
                floors.insert(0, req.start_floor.clone());
                segments.insert(0, Segment {
                    from: "start".to_string(),
                    to: start.node.id.clone(),
                    from_coord: req.start,
                    to_coord: start.node.coord,
                    distance_m: start.connector_m,
                    from_floor: req.start_floor.clone(),
                    to_floor: start.node.floor_id.clone(),
                    floor_change: false,
                });
                distance_m += start.connector_m;
            }
        } else {
            warnings.push(format!(
                "start endpoint is blocked; route begins at node {}",
                start.node.id
            ));
        }

        let end_clear =
            self.collision.is_path_clear_relaxed(req.end, end.node.coord, &req.end_floor);
        if end_clear {
            if end.connector_m > COINCIDENT_M {
                coords.push(req.end);
                floors.push(req.end_floor.clone());
                segments.push(Segment {
                    from: end.node.id.clone(),
                    to: "end".to_string(),
                    from_coord: end.node.coord,
                    to_coord: req.end,
                    distance_m: end.connector_m,
                    from_floor: end.node.floor_id.clone(),
                    to_floor: req.end_floor.clone(),
                    floor_change: false,
                });
                distance_m += end.connector_m;
            }
        } else {
            warnings.push(format!(
                "end endpoint is blocked; route ends at node {}",
                end.node.id
            ));
        }

        align_floors(&coords, &mut floors, &req.start_floor, &req.end_floor);

        if req.options.smooth {
            let (smooth, smooth_floors) = smooth_with_floors(&coords, &floors, SPLINE_RESOLUTION);
            coords = smooth;
            floors = smooth_floors;
        }

        Route {
            path: coords,
            node_ids: path.node_ids,
            floors,
            segments,
            distance_m,
            start_node: Some(start.node.id.clone()),
            end_node: Some(end.node.id.clone()),
            warnings,
            meta: RouteMeta { from_cache: false, constraints_relaxed },
        }
    }
}

fn check_cancel(cancel: Option<&AtomicBool>) -> EngineResult<()> {
    if cancel.is_some_and(|c| c.load(std::sync::atomic::Ordering::Relaxed)) {
        Err(EngineError::Cancelled)
    } else {
        Ok(())
    }
}

/// Keep `floors` the same length as `coords`.  Shorter floor sequences are
/// backfilled with the start-side floor for middle entries (a convention,
/// not a correctness property); the last entry stays the end floor.
fn align_floors(coords: &[Coord], floors: &mut Vec<String>, start_floor: &str, end_floor: &str) {
    if floors.len() == coords.len() {
        return;
    }
    if floors.len() > coords.len() {
        floors.truncate(coords.len());
        return;
    }
    while floors.len() < coords.len() {
        let insert_at = floors.len().saturating_sub(1);
        floors.insert(insert_at, start_floor.to_string());
    }
    if let (Some(last), false) = (floors.last_mut(), coords.is_empty()) {
        *last = end_floor.to_string();
    }
}

/// Add every point feature of a node collection; malformed features are
/// logged and skipped.
fn add_point_nodes(graph: &mut Graph, features: &[Feature<NodeProps>], kind: NodeKind) {
    for feature in features {
        let coord = match &feature.geometry {
            inav_core::Geometry::Point { coordinates } => Coord::from(*coordinates),
            other => {
                warn!(
                    "node {} has {} geometry, expected Point; skipped",
                    feature.properties.id,
                    other.kind_str()
                );
                continue;
            }
        };
        let mut node = Node::new(&feature.properties.id, coord, &feature.properties.floor_id, kind);
        node.meta.geometry_ids = feature.properties.geometry_ids.clone();
        if let Err(e) = graph.add_node(node) {
            warn!("node dropped: {e}");
        }
    }
}
