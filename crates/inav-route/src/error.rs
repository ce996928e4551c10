//! Routing error type.
//!
//! "No path" is not an error at this layer — the search returns `None` and
//! the engine decides which of its candidate pairs, fallbacks, or error
//! codes apply.

use thiserror::Error;

/// Errors produced by `inav-route`.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("node {0:?} not found in graph")]
    NodeNotFound(String),
}

pub type RouteResult<T> = Result<T, RouteError>;
