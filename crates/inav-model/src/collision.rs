//! Obstacle model and line-of-sight queries.
//!
//! Walls and non-walkable features become per-floor buffered polygons.
//! Doors are *not* obstacles — they are additive permissions, registered as
//! raw line segments: any wall crossing within [`DOOR_CLEARANCE_M`] of a
//! door segment on the same floor is forgiven.  This keeps the wall
//! geometry intact as data and lets door state change without rebuilding
//! obstacles.
//!
//! Failure policy: a geometry op that fails during ingestion is logged and
//! the feature dropped, so broken source geometry never blocks routing.

use geo::MultiPolygon;
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use inav_core::geom::{self, BBox};
use inav_core::{Coord, Feature, Geometry, GeometryProps};

/// Wall linestrings are buffered into polygons of this half-width.
pub const WALL_BUFFER_M: f64 = 0.5;

/// Wall crossings and obstacle containment within this distance of a door
/// segment are forgiven.
pub const DOOR_CLEARANCE_M: f64 = 0.6;

/// Relaxed clearance: segments shorter than this always pass.
const RELAXED_SHORT_M: f64 = 2.0;

/// Relaxed clearance: segments shorter than this skip endpoint checks.
const RELAXED_STRICT_M: f64 = 10.0;

/// One obstacle: a buffered (or native) polygon plus its axis-aligned hull
/// for cheap pre-rejection.
pub struct Obstacle {
    pub source_id: String,
    pub polygon: MultiPolygon<f64>,
    pub bbox: BBox,
}

/// Per-floor obstacle polygons and door segments.
#[derive(Default)]
pub struct CollisionDetector {
    obstacles: FxHashMap<String, Vec<Obstacle>>,
    doors: FxHashMap<String, Vec<(Coord, Coord)>>,
}

impl CollisionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Ingestion ─────────────────────────────────────────────────────────

    /// Build obstacles from source geometry.  A feature becomes an obstacle
    /// when its kind is `"wall"` or its id is in the non-walkable set.
    pub fn ingest(
        &mut self,
        features: &[Feature<GeometryProps>],
        kinds: &FxHashMap<String, String>,
        nonwalkable: &FxHashSet<String>,
    ) {
        for feature in features {
            let id = &feature.properties.id;
            let is_wall = kinds.get(id).is_some_and(|k| k == "wall");
            if !is_wall && !nonwalkable.contains(id) {
                continue;
            }
            let floor = feature.properties.floor_id.clone();

            match &feature.geometry {
                Geometry::Polygon { .. } | Geometry::MultiPolygon { .. } => {
                    match feature.geometry.to_multipolygon() {
                        Some(mp) => self.add_obstacle(&floor, id, mp),
                        None => warn!("obstacle {id}: unbuildable polygon, dropped"),
                    }
                }
                Geometry::LineString { .. } | Geometry::MultiLineString { .. } => {
                    // Each sub-line becomes its own obstacle: tighter bboxes
                    // than one hull around the whole multiline.
                    for path in feature.geometry.line_paths() {
                        match geom::buffer_path(&path, WALL_BUFFER_M) {
                            Ok(poly) => {
                                self.add_obstacle(&floor, id, MultiPolygon::new(vec![poly]));
                            }
                            Err(e) => warn!("obstacle {id}: buffer failed ({e}), dropped"),
                        }
                    }
                }
                Geometry::Point { .. } => {
                    debug!("obstacle {id}: point feature cannot be buffered, dropped");
                }
            }
        }
    }

    fn add_obstacle(&mut self, floor_id: &str, source_id: &str, polygon: MultiPolygon<f64>) {
        let coords = polygon
            .0
            .iter()
            .flat_map(|p| p.exterior().0.iter())
            .map(|c| Coord::from_geo(*c));
        let Some(bbox) = geom::bbox_of(coords) else {
            warn!("obstacle {source_id}: empty polygon, dropped");
            return;
        };
        self.obstacles.entry(floor_id.to_string()).or_default().push(Obstacle {
            source_id: source_id.to_string(),
            polygon,
            bbox,
        });
    }

    /// Register a door feature's line segments on a floor.  Non-line
    /// geometry contributes nothing (a point door still gets its node; it
    /// just cannot forgive wall crossings).
    pub fn add_door_feature(&mut self, floor_id: &str, geometry: &Geometry) {
        let segments = self.doors.entry(floor_id.to_string()).or_default();
        for path in geometry.line_paths() {
            for w in path.windows(2) {
                segments.push((w[0], w[1]));
            }
        }
    }

    pub fn obstacle_count(&self, floor_id: &str) -> usize {
        self.obstacles.get(floor_id).map_or(0, Vec::len)
    }

    pub fn door_segment_count(&self, floor_id: &str) -> usize {
        self.doors.get(floor_id).map_or(0, Vec::len)
    }

    // ── Queries ───────────────────────────────────────────────────────────

    fn near_door(&self, floor_id: &str, p: Coord) -> bool {
        self.doors.get(floor_id).is_some_and(|segments| {
            segments
                .iter()
                .any(|&(a, b)| geom::point_segment_distance_m(p, a, b) <= DOOR_CLEARANCE_M)
        })
    }

    /// `true` iff `p` lies inside an obstacle polygon on the floor and is
    /// not within door clearance of any door segment.
    pub fn point_in_obstacle(&self, p: Coord, floor_id: &str) -> bool {
        let Some(obstacles) = self.obstacles.get(floor_id) else {
            return false;
        };
        let inside = obstacles
            .iter()
            .any(|o| geom::bbox_contains(&o.bbox, p) && geom::point_in_polygon(p, &o.polygon));
        inside && !self.near_door(floor_id, p)
    }

    /// `true` iff segment `[a, b]` crosses an obstacle at a point that is
    /// not forgiven by a nearby door segment.
    pub fn line_intersects_obstacle(&self, a: Coord, b: Coord, floor_id: &str) -> bool {
        let Some(obstacles) = self.obstacles.get(floor_id) else {
            return false;
        };
        let seg_bbox = geom::segment_bbox(a, b);
        for obstacle in obstacles {
            if !geom::bbox_overlaps(&seg_bbox, &obstacle.bbox) {
                continue;
            }
            for hit in geom::line_polygon_intersections(a, b, &obstacle.polygon) {
                if !self.near_door(floor_id, hit) {
                    return true;
                }
            }
        }
        false
    }

    /// Line-of-sight for visibility-edge building: the segment may touch
    /// nothing but door-adjacent wall crossings.
    #[inline]
    pub fn has_line_of_sight(&self, a: Coord, b: Coord, floor_id: &str) -> bool {
        !self.line_intersects_obstacle(a, b, floor_id)
    }

    /// Strict clearance: both endpoints out of obstacles and an unobstructed
    /// segment between them.
    pub fn is_path_clear(&self, a: Coord, b: Coord, floor_id: &str) -> bool {
        !self.point_in_obstacle(a, floor_id)
            && !self.point_in_obstacle(b, floor_id)
            && !self.line_intersects_obstacle(a, b, floor_id)
    }

    /// Relaxed clearance for short user-to-graph connectors: under
    /// [`RELAXED_SHORT_M`] always clear, under [`RELAXED_STRICT_M`] only the
    /// segment is checked (endpoints may sit inside wall buffers), beyond
    /// that identical to [`is_path_clear`](Self::is_path_clear).
    pub fn is_path_clear_relaxed(&self, a: Coord, b: Coord, floor_id: &str) -> bool {
        let d = a.distance_m(b);
        if d < RELAXED_SHORT_M {
            true
        } else if d < RELAXED_STRICT_M {
            !self.line_intersects_obstacle(a, b, floor_id)
        } else {
            self.is_path_clear(a, b, floor_id)
        }
    }
}
