//! `inav-engine` — the indoor routing engine.
//!
//! Builds an obstacle-aware visibility graph over walkable sample points,
//! stitches floors through stairs/elevator/escalator connections, treats
//! rooms and doors as first-class routing constraints, and answers
//! shortest-path queries with A* plus layered fallbacks for ill-posed
//! endpoints.  Expensively built visibility edges persist in a
//! content-addressed cache keyed by dataset identity.
//!
//! # Crate layout
//!
//! | Module           | Contents                                           |
//! |------------------|----------------------------------------------------|
//! | [`engine`]       | `PathfindingEngine`, `MapData`, `Route`, queries   |
//! | [`edge_builder`] | visibility edges, cooperative yielding             |
//! | [`connections`]  | cross-floor stitching, orphan-door linking         |
//! | [`cache`]        | `EdgeStore`, cache keys, the query LRU             |
//! | [`config`]       | `EngineConfig` and the large-graph tightening      |
//! | [`error`]        | `EngineError` and the route error taxonomy         |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Rayon-parallel per-floor edge build, deterministic merge |

pub mod cache;
pub mod config;
pub mod connections;
pub mod edge_builder;
pub mod engine;
pub mod error;

#[cfg(test)]
mod tests;

pub use cache::{
    CACHE_SCHEMA_VERSION, CacheMeta, CachedEdge, CachedEdgeSet, EdgeStore, MemoryEdgeStore,
    PathCache, cache_key,
};
pub use config::{EngineConfig, LARGE_GRAPH_NODES};
pub use connections::{DOOR_LINK_MAX_M, apply_connections, connect_orphan_doors};
pub use edge_builder::{BuildControl, build_visibility_edges};
pub use engine::{
    EngineStats, InitOptions, MapData, PathfindingEngine, Route, RouteErrorInfo, RouteMeta,
    RouteOptions, RouteRequest, RoomTraversalMode,
};
pub use error::{EngineError, EngineResult};
