//! Error types for `VelesGraph`.
//!
//! A single error enum covers every failure the refinement engine and the
//! router can surface. All of them are detected before parallel work starts;
//! once a run is underway nothing fails.

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for `VelesGraph` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `VelesGraph` operations.
///
/// Error codes follow the pattern `VGRAPH-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing refinement/search parameter (VGRAPH-001).
    #[error("[VGRAPH-001] Configuration error: {0}")]
    Config(String),

    /// Dimension mismatch (VGRAPH-002).
    #[error("[VGRAPH-002] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Initial graph does not cover the base set (VGRAPH-003).
    #[error("[VGRAPH-003] Graph size mismatch: graph has {graph} nodes, base set has {base}")]
    GraphSizeMismatch {
        /// Node count of the supplied graph.
        graph: usize,
        /// Number of base vectors.
        base: usize,
    },

    /// Node id outside `[0, N)` (VGRAPH-004).
    #[error("[VGRAPH-004] Node {id} out of range (N = {len})")]
    NodeOutOfRange {
        /// Offending id.
        id: u32,
        /// Number of nodes.
        len: usize,
    },

    /// Vector data is malformed (VGRAPH-005).
    #[error("[VGRAPH-005] Invalid vector data: {0}")]
    InvalidVector(String),

    /// A finished graph violates a structural invariant (VGRAPH-006).
    #[error("[VGRAPH-006] Graph invariant violated: {0}")]
    GraphInvariant(String),
}

impl Error {
    /// Returns the error code (e.g., "VGRAPH-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "VGRAPH-001",
            Self::DimensionMismatch { .. } => "VGRAPH-002",
            Self::GraphSizeMismatch { .. } => "VGRAPH-003",
            Self::NodeOutOfRange { .. } => "VGRAPH-004",
            Self::InvalidVector(_) => "VGRAPH-005",
            Self::GraphInvariant(_) => "VGRAPH-006",
        }
    }

    /// Returns true if the caller can fix the input and retry the run.
    ///
    /// A violated graph invariant points at a bug and is not recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::GraphInvariant(_))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
