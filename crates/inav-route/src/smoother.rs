//! Cosmetic path post-processing.
//!
//! Two independent operations: Douglas-Peucker simplification and per-floor
//! spline smoothing.  Both are display-only — smoothed coordinates are never
//! fed back into the graph, and smoothing never crosses a floor boundary.

use inav_core::Coord;

/// Default spline resolution: the virtual duration of the spline, sampled
/// every 10 units, mirroring the timing-based sampling of bezier-spline
/// smoothers (10,000 → 1,000 samples per subpath).
pub const SPLINE_RESOLUTION: usize = 10_000;

/// Subpaths shorter than this many points are left verbatim.
const MIN_SPLINE_POINTS: usize = 4;

// ── Douglas-Peucker ───────────────────────────────────────────────────────────

/// Douglas-Peucker simplification with tolerance in degrees.  First and
/// last points are always preserved.
pub fn simplify(path: &[Coord], epsilon_deg: f64) -> Vec<Coord> {
    if path.len() < 3 || epsilon_deg <= 0.0 {
        return path.to_vec();
    }
    let mut keep = vec![false; path.len()];
    keep[0] = true;
    keep[path.len() - 1] = true;
    dp_mark(path, 0, path.len() - 1, epsilon_deg, &mut keep);
    path.iter()
        .zip(&keep)
        .filter_map(|(c, &k)| k.then_some(*c))
        .collect()
}

fn dp_mark(path: &[Coord], first: usize, last: usize, epsilon: f64, keep: &mut [bool]) {
    if last <= first + 1 {
        return;
    }
    let mut max_dist = 0.0;
    let mut max_idx = first;
    for i in first + 1..last {
        let d = perpendicular_deg(path[i], path[first], path[last]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }
    if max_dist > epsilon {
        keep[max_idx] = true;
        dp_mark(path, first, max_idx, epsilon, keep);
        dp_mark(path, max_idx, last, epsilon, keep);
    }
}

/// Planar point-to-segment distance in degree space.  Consistent with the
/// degree-valued epsilon; not a metric distance.
fn perpendicular_deg(p: Coord, a: Coord, b: Coord) -> f64 {
    let (px, py) = (p.lng - a.lng, p.lat - a.lat);
    let (bx, by) = (b.lng - a.lng, b.lat - a.lat);
    let len2 = bx * bx + by * by;
    let t = if len2 <= f64::EPSILON {
        0.0
    } else {
        ((px * bx + py * by) / len2).clamp(0.0, 1.0)
    };
    let (dx, dy) = (px - t * bx, py - t * by);
    (dx * dx + dy * dy).sqrt()
}

// ── Spline smoothing ──────────────────────────────────────────────────────────

/// Split `path` on floor boundaries, spline-smooth each same-floor subpath
/// of at least [`MIN_SPLINE_POINTS`] points, and concatenate.  Returns the
/// smoothed path together with a floors array of matching length.
///
/// Mismatched input lengths are returned unchanged — the `|path| == |floors|`
/// route invariant is the caller's to uphold, and smoothing must never break
/// it.
pub fn smooth_with_floors(
    path: &[Coord],
    floors: &[String],
    resolution: usize,
) -> (Vec<Coord>, Vec<String>) {
    if path.len() != floors.len() || path.is_empty() {
        return (path.to_vec(), floors.to_vec());
    }

    let samples = (resolution / 10).max(1);
    let mut out_path: Vec<Coord> = Vec::new();
    let mut out_floors: Vec<String> = Vec::new();

    let mut run_start = 0;
    for i in 1..=path.len() {
        let run_ends = i == path.len() || floors[i] != floors[run_start];
        if !run_ends {
            continue;
        }
        let sub = &path[run_start..i];
        let floor = &floors[run_start];
        if sub.len() >= MIN_SPLINE_POINTS {
            let smoothed = catmull_rom(sub, samples);
            out_floors.extend(std::iter::repeat_n(floor.clone(), smoothed.len()));
            out_path.extend(smoothed);
        } else {
            out_path.extend_from_slice(sub);
            out_floors.extend(std::iter::repeat_n(floor.clone(), sub.len()));
        }
        run_start = i;
    }
    (out_path, out_floors)
}

/// Uniform Catmull-Rom spline through the control points, clamped at the
/// ends so the first and last points are reproduced exactly.
fn catmull_rom(pts: &[Coord], samples: usize) -> Vec<Coord> {
    let n = pts.len();
    let span = (n - 1) as f64;
    let mut out = Vec::with_capacity(samples + 1);
    out.push(pts[0]);

    for s in 1..samples {
        let t = s as f64 / samples as f64 * span;
        let seg = (t.floor() as usize).min(n - 2);
        let u = t - seg as f64;

        let p0 = pts[seg.saturating_sub(1)];
        let p1 = pts[seg];
        let p2 = pts[seg + 1];
        let p3 = pts[(seg + 2).min(n - 1)];
        out.push(Coord::new(
            cr_axis(p0.lng, p1.lng, p2.lng, p3.lng, u),
            cr_axis(p0.lat, p1.lat, p2.lat, p3.lat, u),
        ));
    }
    out.push(pts[n - 1]);
    out
}

#[inline]
fn cr_axis(p0: f64, p1: f64, p2: f64, p3: f64, u: f64) -> f64 {
    0.5 * ((2.0 * p1)
        + (p2 - p0) * u
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * u * u
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * u * u * u)
}
