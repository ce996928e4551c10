//! `inav-graph` — the routing graph and spatial indexing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                             |
//! |-------------|------------------------------------------------------|
//! | [`node`]    | `Node`, `NodeKind`, `NodeMeta`                       |
//! | [`edge`]    | `Edge`, `EdgeKind`                                   |
//! | [`graph`]   | `Graph` (arena + adjacency + per-floor partition)    |
//! | [`spatial`] | `SpatialIndex` (R-tree over lng/lat)                 |
//! | [`error`]   | `GraphError`, `GraphResult<T>`                       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                   |
//! |---------|----------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on the node/edge model |

pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod spatial;

#[cfg(test)]
mod tests;

pub use edge::{Edge, EdgeKind};
pub use error::{GraphError, GraphResult};
pub use graph::{EXPANDING_RADII_DEG, Graph};
pub use node::{Node, NodeKind, NodeMeta};
pub use spatial::{SpatialEntry, SpatialIndex};
