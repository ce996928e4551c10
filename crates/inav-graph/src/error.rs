//! Graph-subsystem error type.

use thiserror::Error;

/// Errors produced by `inav-graph`.
///
/// Lookups of absent nodes are not errors — they return `Option` or empty
/// slices; only structural violations at insert time surface here.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0:?} already exists")]
    DuplicateNode(String),

    #[error("edge {from:?} -> {to:?} references a missing node")]
    MissingEndpoint { from: String, to: String },

    #[error("edge {from:?} -> {to:?} has invalid weight {weight}")]
    InvalidWeight { from: String, to: String, weight: f64 },
}

pub type GraphResult<T> = Result<T, GraphError>;
