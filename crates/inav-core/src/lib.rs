//! `inav-core` — foundational types for the `rust_inav` indoor routing
//! engine.
//!
//! This crate is a dependency of every other `inav-*` crate.  It has no
//! `inav-*` dependencies of its own.
//!
//! # What lives here
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`coord`]   | `Coord`, haversine/equirectangular distance, `LocalFrame` |
//! | [`feature`] | GeoJSON geometry/feature model, connections, nav flags    |
//! | [`geom`]    | containment, intersection, buffering, centroid, bbox      |
//! | [`error`]   | `CoreError`, `CoreResult`                                 |

pub mod coord;
pub mod error;
pub mod feature;
pub mod geom;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use coord::{Coord, LocalFrame, M_PER_DEG_LAT, m_per_deg_lng};
pub use error::{CoreError, CoreResult};
pub use feature::{
    Connection, ConnectionKind, Entrance, Feature, FeatureCollection, FlagBit, Geometry,
    GeometryProps, NavigationFlags, NodeProps, Position,
};
pub use geom::BBox;
