//! Engine error type and the route error taxonomy.
//!
//! Route failures are tagged values, not control-flow exceptions: each
//! carries a stable `code()` string (`not-initialized`, `no-door`,
//! `no-path`, `blocked`) surfaced through the engine's last-error slot for
//! operator inspection, plus a human-readable `Display` message.

use thiserror::Error;

/// Errors produced by `inav-engine`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine not initialized; call initialize() before routing")]
    NotInitialized,

    #[error("room {room} has no usable door")]
    NoDoor { room: String },

    #[error("no path exists between the requested endpoints")]
    NoPath,

    #[error("{which} endpoint is unreachable: no connector clears even under relaxed rules")]
    Blocked { which: &'static str },

    #[error("initialization cancelled")]
    Cancelled,

    #[error("cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Graph(#[from] inav_graph::GraphError),

    #[error(transparent)]
    Search(#[from] inav_route::RouteError),

    #[error(transparent)]
    Core(#[from] inav_core::CoreError),
}

impl EngineError {
    /// Stable error code for the operator-facing error slot.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NotInitialized => "not-initialized",
            EngineError::NoDoor { .. } => "no-door",
            EngineError::NoPath => "no-path",
            EngineError::Blocked { .. } => "blocked",
            EngineError::Cancelled => "cancelled",
            EngineError::Cache(_)
            | EngineError::Graph(_)
            | EngineError::Search(_)
            | EngineError::Core(_) => "internal",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
