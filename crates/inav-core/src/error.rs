//! Core error type.
//!
//! Geometry failures are deliberately coarse: callers in the routing stack
//! treat a failed buffer/centroid/intersection as "drop the feature and log",
//! never as a fatal condition, so a message string carries all the detail
//! anyone ever reads.

use thiserror::Error;

/// Errors produced by `inav-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("degenerate geometry: {0}")]
    Geometry(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
