//! Geographic coordinate type and great-circle math.
//!
//! Coordinates are WGS-84 `[lng, lat]` degrees stored as `f64`.  Indoor
//! tolerances (1e-9° intersection dedup, 0.5 m wall buffers) sit well below
//! single-precision resolution, so unlike city-scale simulation there is no
//! f32 option here.
//!
//! Two distance functions are provided: [`Coord::distance_m`] (haversine,
//! the reference) and [`Coord::fast_distance_m`] (equirectangular, used in
//! edge-build inner loops).  At building scale (< 1 km) they agree to well
//! within 0.1 %.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Metres per degree of latitude (and of longitude at the equator).
pub const M_PER_DEG_LAT: f64 = 111_320.0;

/// Metres per degree of longitude at the given latitude.
#[inline]
pub fn m_per_deg_lng(lat: f64) -> f64 {
    lat.to_radians().cos() * M_PER_DEG_LAT
}

/// A WGS-84 geographic coordinate, `[lng, lat]` order as in GeoJSON.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lng: f64,
    pub lat: f64,
}

impl Coord {
    #[inline]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: Coord) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Equirectangular distance in metres.  Cheap approximation for tight
    /// loops; accurate to < 0.1 % of [`distance_m`](Self::distance_m) at
    /// building scale.
    #[inline]
    pub fn fast_distance_m(self, other: Coord) -> f64 {
        let mid_lat = (self.lat + other.lat) * 0.5;
        let dx = (other.lng - self.lng) * m_per_deg_lng(mid_lat);
        let dy = (other.lat - self.lat) * M_PER_DEG_LAT;
        (dx * dx + dy * dy).sqrt()
    }

    /// Squared distance in degrees².  Comparison key only — never a metric.
    #[inline]
    pub fn sq_deg(self, other: Coord) -> f64 {
        let dx = other.lng - self.lng;
        let dy = other.lat - self.lat;
        dx * dx + dy * dy
    }

    /// Forward azimuth from `self` to `other`, degrees in `[0, 360)`.
    pub fn bearing_deg(self, other: Coord) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let y = d_lng.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }

    #[inline]
    pub fn to_geo(self) -> geo::Coord<f64> {
        geo::Coord { x: self.lng, y: self.lat }
    }

    #[inline]
    pub fn from_geo(c: geo::Coord<f64>) -> Self {
        Self { lng: c.x, lat: c.y }
    }
}

impl From<[f64; 2]> for Coord {
    #[inline]
    fn from(a: [f64; 2]) -> Self {
        Self { lng: a[0], lat: a[1] }
    }
}

impl From<Coord> for [f64; 2] {
    #[inline]
    fn from(c: Coord) -> Self {
        [c.lng, c.lat]
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.7}, {:.7}]", self.lng, self.lat)
    }
}

// ── LocalFrame ────────────────────────────────────────────────────────────────

/// Equirectangular tangent-plane projection anchored at an origin coordinate.
///
/// All buffering and point-to-segment math happens in this frame so that
/// metre radii are interpreted geodesically at the feature's latitude.  Only
/// valid for extents of a few kilometres around the origin, which is exactly
/// the indoor case.
#[derive(Copy, Clone, Debug)]
pub struct LocalFrame {
    origin: Coord,
    m_lng: f64,
}

impl LocalFrame {
    pub fn at(origin: Coord) -> Self {
        Self { origin, m_lng: m_per_deg_lng(origin.lat) }
    }

    /// Project to local metres, x east / y north.
    #[inline]
    pub fn to_local(&self, c: Coord) -> [f64; 2] {
        [
            (c.lng - self.origin.lng) * self.m_lng,
            (c.lat - self.origin.lat) * M_PER_DEG_LAT,
        ]
    }

    /// Unproject local metres back to lng/lat.
    #[inline]
    pub fn to_coord(&self, p: [f64; 2]) -> Coord {
        Coord {
            lng: self.origin.lng + p[0] / self.m_lng,
            lat: self.origin.lat + p[1] / M_PER_DEG_LAT,
        }
    }
}
