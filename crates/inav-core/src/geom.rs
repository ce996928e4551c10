//! The geometry kit: containment, intersection, buffering, centroids.
//!
//! Pure functions over WGS-84 coordinates.  Angular inputs are degrees,
//! distances are metres unless a name says otherwise.  Metre radii are
//! interpreted geodesically at the feature's centroid latitude via
//! [`LocalFrame`].
//!
//! Failure policy: a degenerate input yields `CoreError::Geometry`.  Callers
//! in the routing stack drop the offending feature and log — broken source
//! geometry must never block routing.

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Intersects, Line, LineString, MultiPolygon, Point, Polygon};

use crate::coord::{Coord, LocalFrame};
use crate::error::{CoreError, CoreResult};
use crate::feature::Geometry;

/// Two intersection points closer than this (per axis, degrees) are the same.
pub const INTERSECTION_DEDUP_DEG: f64 = 1e-9;

/// Miter joins longer than `radius * MITER_LIMIT` are clamped.
const MITER_LIMIT: f64 = 4.0;

/// `[min_lng, min_lat, max_lng, max_lat]`.
pub type BBox = [f64; 4];

// ── Bounding boxes ────────────────────────────────────────────────────────────

/// Axis-aligned hull of a coordinate sequence.  `None` when empty.
pub fn bbox_of(coords: impl IntoIterator<Item = Coord>) -> Option<BBox> {
    let mut it = coords.into_iter();
    let first = it.next()?;
    let mut b = [first.lng, first.lat, first.lng, first.lat];
    for c in it {
        b[0] = b[0].min(c.lng);
        b[1] = b[1].min(c.lat);
        b[2] = b[2].max(c.lng);
        b[3] = b[3].max(c.lat);
    }
    Some(b)
}

/// Axis-aligned hull of a feature geometry.
pub fn bbox(geom: &Geometry) -> Option<BBox> {
    bbox_of(geom.all_coords())
}

pub fn segment_bbox(a: Coord, b: Coord) -> BBox {
    [
        a.lng.min(b.lng),
        a.lat.min(b.lat),
        a.lng.max(b.lng),
        a.lat.max(b.lat),
    ]
}

#[inline]
pub fn bbox_overlaps(a: &BBox, b: &BBox) -> bool {
    a[0] <= b[2] && b[0] <= a[2] && a[1] <= b[3] && b[1] <= a[3]
}

#[inline]
pub fn bbox_contains(b: &BBox, p: Coord) -> bool {
    p.lng >= b[0] && p.lng <= b[2] && p.lat >= b[1] && p.lat <= b[3]
}

/// Grow a bbox by `pad` degrees on every side.
#[inline]
pub fn bbox_expand(b: &BBox, pad: f64) -> BBox {
    [b[0] - pad, b[1] - pad, b[2] + pad, b[3] + pad]
}

// ── Containment ───────────────────────────────────────────────────────────────

/// Edge-inclusive point-in-polygon over a (multi)polygon with holes.
pub fn point_in_polygon(p: Coord, poly: &MultiPolygon<f64>) -> bool {
    // `Intersects` is boundary-inclusive, unlike `Contains`.
    poly.intersects(&Point::new(p.lng, p.lat))
}

// ── Intersection ──────────────────────────────────────────────────────────────

/// Intersection points of segment `[a, b]` with every ring of `poly`
/// (exterior and holes), deduplicated within [`INTERSECTION_DEDUP_DEG`].
/// Collinear overlaps contribute both endpoints of the overlap.
pub fn line_polygon_intersections(a: Coord, b: Coord, poly: &MultiPolygon<f64>) -> Vec<Coord> {
    let seg = Line::new(a.to_geo(), b.to_geo());
    let mut out: Vec<Coord> = Vec::new();

    for polygon in &poly.0 {
        let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors().iter());
        for ring in rings {
            for ring_seg in ring.lines() {
                match line_intersection(seg, ring_seg) {
                    Some(LineIntersection::SinglePoint { intersection, .. }) => {
                        push_dedup(&mut out, Coord::from_geo(intersection));
                    }
                    Some(LineIntersection::Collinear { intersection }) => {
                        push_dedup(&mut out, Coord::from_geo(intersection.start));
                        push_dedup(&mut out, Coord::from_geo(intersection.end));
                    }
                    None => {}
                }
            }
        }
    }
    out
}

fn push_dedup(out: &mut Vec<Coord>, c: Coord) {
    let dup = out.iter().any(|e| {
        (e.lng - c.lng).abs() <= INTERSECTION_DEDUP_DEG
            && (e.lat - c.lat).abs() <= INTERSECTION_DEDUP_DEG
    });
    if !dup {
        out.push(c);
    }
}

// ── Centroid and anchors ──────────────────────────────────────────────────────

/// Centroid of a feature geometry.
pub fn centroid(geom: &Geometry) -> CoreResult<Coord> {
    use geo::Centroid;

    let pt: Option<Point<f64>> = match geom {
        Geometry::Point { coordinates } => return Ok((*coordinates).into()),
        Geometry::LineString { .. } | Geometry::MultiLineString { .. } => {
            let paths = geom.line_paths();
            let mls = geo::MultiLineString::new(
                paths
                    .iter()
                    .map(|p| LineString::new(p.iter().map(|c| c.to_geo()).collect()))
                    .collect(),
            );
            mls.centroid()
        }
        Geometry::Polygon { .. } | Geometry::MultiPolygon { .. } => {
            geom.to_multipolygon().and_then(|mp| mp.centroid())
        }
    };

    pt.map(|p| Coord::new(p.x(), p.y()))
        .ok_or_else(|| CoreError::Geometry(format!("{} has no centroid", geom.kind_str())))
}

/// The "feature center" used to place door nodes: a point's coordinate, the
/// along-length midpoint of the longest sub-line, or a polygon's centroid.
pub fn feature_anchor(geom: &Geometry) -> CoreResult<Coord> {
    match geom {
        Geometry::Point { coordinates } => Ok((*coordinates).into()),
        Geometry::LineString { .. } | Geometry::MultiLineString { .. } => {
            let paths = geom.line_paths();
            let longest = paths
                .iter()
                .max_by(|a, b| path_length_m(a).total_cmp(&path_length_m(b)))
                .ok_or_else(|| CoreError::Geometry("empty multilinestring".into()))?;
            midpoint_along(longest)
        }
        _ => centroid(geom),
    }
}

fn path_length_m(path: &[Coord]) -> f64 {
    path.windows(2).map(|w| w[0].distance_m(w[1])).sum()
}

/// Point halfway along a polyline, by arc length.
pub fn midpoint_along(path: &[Coord]) -> CoreResult<Coord> {
    match path {
        [] => Err(CoreError::Geometry("empty line".into())),
        [only] => Ok(*only),
        _ => {
            let half = path_length_m(path) * 0.5;
            let mut walked = 0.0;
            for w in path.windows(2) {
                let d = w[0].distance_m(w[1]);
                if walked + d >= half && d > 0.0 {
                    let t = (half - walked) / d;
                    return Ok(Coord::new(
                        w[0].lng + (w[1].lng - w[0].lng) * t,
                        w[0].lat + (w[1].lat - w[0].lat) * t,
                    ));
                }
                walked += d;
            }
            Ok(*path.last().unwrap())
        }
    }
}

// ── Distances ─────────────────────────────────────────────────────────────────

/// Distance in metres from `p` to segment `[a, b]`.
pub fn point_segment_distance_m(p: Coord, a: Coord, b: Coord) -> f64 {
    let frame = LocalFrame::at(a);
    let pp = frame.to_local(p);
    let bb = frame.to_local(b);

    let len2 = bb[0] * bb[0] + bb[1] * bb[1];
    let t = if len2 <= f64::EPSILON {
        0.0
    } else {
        ((pp[0] * bb[0] + pp[1] * bb[1]) / len2).clamp(0.0, 1.0)
    };
    let dx = pp[0] - t * bb[0];
    let dy = pp[1] - t * bb[1];
    (dx * dx + dy * dy).sqrt()
}

// ── Area ──────────────────────────────────────────────────────────────────────

/// Area of a (multi)polygon in m², holes subtracted, via a local-frame
/// shoelace.
pub fn polygon_area_m2(poly: &MultiPolygon<f64>) -> f64 {
    let mut total = 0.0;
    for polygon in &poly.0 {
        let Some(origin) = polygon.exterior().0.first() else {
            continue;
        };
        let frame = LocalFrame::at(Coord::from_geo(*origin));
        let outer = ring_area_m2(polygon.exterior(), &frame);
        let holes: f64 = polygon.interiors().iter().map(|r| ring_area_m2(r, &frame)).sum();
        total += (outer - holes).max(0.0);
    }
    total
}

fn ring_area_m2(ring: &LineString<f64>, frame: &LocalFrame) -> f64 {
    let pts: Vec<[f64; 2]> = ring.0.iter().map(|c| frame.to_local(Coord::from_geo(*c))).collect();
    if pts.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..pts.len() {
        let j = (i + 1) % pts.len();
        acc += pts[i][0] * pts[j][1] - pts[j][0] * pts[i][1];
    }
    acc.abs() * 0.5
}

// ── Buffering ─────────────────────────────────────────────────────────────────

/// Polygonal buffer of a feature by `meters`.
///
/// Lines are stroked into a single polygon with square end caps and clamped
/// miter joins; each sub-line of a `MultiLineString` becomes its own polygon.
/// Polygons are offset outward (holes shrink).  Points become squares.
pub fn buffer(geom: &Geometry, meters: f64) -> CoreResult<MultiPolygon<f64>> {
    if !meters.is_finite() || meters <= 0.0 {
        return Err(CoreError::Geometry(format!("invalid buffer radius {meters}")));
    }

    match geom {
        Geometry::Point { coordinates } => {
            Ok(MultiPolygon::new(vec![point_square((*coordinates).into(), meters)]))
        }
        Geometry::LineString { .. } | Geometry::MultiLineString { .. } => {
            let mut polys = Vec::new();
            for path in geom.line_paths() {
                if let Ok(p) = buffer_path(&path, meters) {
                    polys.push(p);
                }
            }
            if polys.is_empty() {
                Err(CoreError::Geometry("no bufferable sub-line".into()))
            } else {
                Ok(MultiPolygon::new(polys))
            }
        }
        Geometry::Polygon { .. } | Geometry::MultiPolygon { .. } => {
            let mp = geom
                .to_multipolygon()
                .ok_or_else(|| CoreError::Geometry("unclosed polygon".into()))?;
            let mut out = Vec::with_capacity(mp.0.len());
            for polygon in &mp.0 {
                out.push(offset_polygon(polygon, meters)?);
            }
            Ok(MultiPolygon::new(out))
        }
    }
}

fn point_square(c: Coord, r: f64) -> Polygon<f64> {
    let frame = LocalFrame::at(c);
    let ring: Vec<geo::Coord<f64>> = [[-r, -r], [r, -r], [r, r], [-r, r], [-r, -r]]
        .iter()
        .map(|p| frame.to_coord(*p).to_geo())
        .collect();
    Polygon::new(LineString::new(ring), vec![])
}

/// Stroke a polyline into a closed polygon of half-width `r` metres.
pub fn buffer_path(path: &[Coord], r: f64) -> CoreResult<Polygon<f64>> {
    let frame = LocalFrame::at(*path.first().ok_or_else(|| CoreError::Geometry("empty line".into()))?);

    // Project and drop zero-length segments.
    let mut pts: Vec<[f64; 2]> = Vec::with_capacity(path.len());
    for c in path {
        let p = frame.to_local(*c);
        if pts.last().is_none_or(|last| hypot(sub(p, *last)) > 1e-6) {
            pts.push(p);
        }
    }
    if pts.len() < 2 {
        return Err(CoreError::Geometry("line collapses to a point".into()));
    }

    let n = pts.len();
    // Per-segment unit directions and left normals.
    let mut dirs = Vec::with_capacity(n - 1);
    let mut normals = Vec::with_capacity(n - 1);
    for w in pts.windows(2) {
        let d = sub(w[1], w[0]);
        let len = hypot(d);
        let u = [d[0] / len, d[1] / len];
        dirs.push(u);
        normals.push([-u[1], u[0]]);
    }

    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);
    for i in 0..n {
        let (off, cap) = if i == 0 {
            (scale(normals[0], r), scale(dirs[0], -r)) // square start cap
        } else if i == n - 1 {
            (scale(normals[n - 2], r), scale(dirs[n - 2], r)) // square end cap
        } else {
            (miter_offset(normals[i - 1], normals[i], r), [0.0, 0.0])
        };
        left.push(add(add(pts[i], off), cap));
        right.push(add(sub(pts[i], off), cap));
    }

    let mut ring: Vec<geo::Coord<f64>> = Vec::with_capacity(2 * n + 1);
    ring.extend(left.iter().map(|p| frame.to_coord(*p).to_geo()));
    ring.extend(right.iter().rev().map(|p| frame.to_coord(*p).to_geo()));
    ring.push(ring[0]);

    Ok(Polygon::new(LineString::new(ring), vec![]))
}

/// Offset vector at a join between two segments with normals `n_prev` and
/// `n_next`, clamped to the miter limit.
fn miter_offset(n_prev: [f64; 2], n_next: [f64; 2], r: f64) -> [f64; 2] {
    let sum = add(n_prev, n_next);
    let len = hypot(sum);
    if len < 1e-9 {
        // 180° reversal: fall back to the incoming normal, clamped.
        return scale(n_next, r * MITER_LIMIT);
    }
    let bisector = [sum[0] / len, sum[1] / len];
    let cos_half = (bisector[0] * n_next[0] + bisector[1] * n_next[1]).max(1.0 / MITER_LIMIT);
    scale(bisector, r / cos_half)
}

/// Offset a polygon outward by `r` metres (holes shrink accordingly).
fn offset_polygon(polygon: &Polygon<f64>, r: f64) -> CoreResult<Polygon<f64>> {
    let origin = polygon
        .exterior()
        .0
        .first()
        .ok_or_else(|| CoreError::Geometry("empty exterior ring".into()))?;
    let frame = LocalFrame::at(Coord::from_geo(*origin));

    let exterior = offset_ring(polygon.exterior(), &frame, r, false)?;
    let mut interiors = Vec::with_capacity(polygon.interiors().len());
    for hole in polygon.interiors() {
        // Shrinking a hole below its size inverts it; such rooms are rare
        // and a 0.3–0.5 m radius keeps this harmless in practice.
        if let Ok(ring) = offset_ring(hole, &frame, r, true) {
            interiors.push(ring);
        }
    }
    Ok(Polygon::new(exterior, interiors))
}

fn offset_ring(
    ring: &LineString<f64>,
    frame: &LocalFrame,
    r: f64,
    is_hole: bool,
) -> CoreResult<LineString<f64>> {
    // Open the ring (drop the closing duplicate) and dedup.
    let mut pts: Vec<[f64; 2]> = Vec::with_capacity(ring.0.len());
    for c in &ring.0 {
        let p = frame.to_local(Coord::from_geo(*c));
        if pts.last().is_none_or(|last| hypot(sub(p, *last)) > 1e-6) {
            pts.push(p);
        }
    }
    if pts.len() > 1 && hypot(sub(pts[0], *pts.last().unwrap())) <= 1e-6 {
        pts.pop();
    }
    if pts.len() < 3 {
        return Err(CoreError::Geometry("ring with fewer than 3 vertices".into()));
    }

    // Right-hand edge normals point outward of the enclosed region for a CCW
    // ring, inward for CW.  The sign flips again for holes, where "growing
    // the solid" means moving into the enclosed region.
    let mut signed = 0.0;
    for i in 0..pts.len() {
        let j = (i + 1) % pts.len();
        signed += pts[i][0] * pts[j][1] - pts[j][0] * pts[i][1];
    }
    let ccw = signed > 0.0;
    let dir = match (ccw, is_hole) {
        (true, false) | (false, true) => 1.0,
        (false, false) | (true, true) => -1.0,
    };

    let n = pts.len();
    let mut normals = Vec::with_capacity(n);
    for i in 0..n {
        let j = (i + 1) % n;
        let d = sub(pts[j], pts[i]);
        let len = hypot(d);
        if len <= f64::EPSILON {
            return Err(CoreError::Geometry("zero-length ring edge".into()));
        }
        normals.push([dir * d[1] / len, dir * -d[0] / len]);
    }

    let mut out: Vec<geo::Coord<f64>> = Vec::with_capacity(n + 1);
    for i in 0..n {
        let prev = normals[(i + n - 1) % n];
        let off = miter_offset(prev, normals[i], r);
        out.push(frame.to_coord(add(pts[i], off)).to_geo());
    }
    out.push(out[0]);
    Ok(LineString::new(out))
}

// ── Tiny 2-vector helpers ─────────────────────────────────────────────────────

#[inline]
fn add(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] + b[0], a[1] + b[1]]
}

#[inline]
fn sub(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
fn hypot(v: [f64; 2]) -> f64 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

#[inline]
fn scale(v: [f64; 2], s: f64) -> [f64; 2] {
    [v[0] * s, v[1] * s]
}
