//! Error types for the Galaxy3D spatial subsystem
//!
//! Query paths (raycasts, traversals, frustum queries) never fail: degenerate
//! geometry and stale entity handles simply produce no result. The errors
//! below are reserved for construction-time validation and worker plumbing.

use std::fmt;

/// Result type for Galaxy3D spatial operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D spatial errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Vertex/index buffers that cannot describe a triangle mesh
    InvalidGeometry(String),

    /// Configuration value out of range
    InvalidConfig(String),

    /// The worker pool is shut down or could not be started
    WorkerUnavailable(String),

    /// Entity handle does not resolve to a live entity
    InvalidEntity(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidGeometry(msg) => write!(f, "Invalid geometry: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            Error::WorkerUnavailable(msg) => write!(f, "Worker unavailable: {}", msg),
            Error::InvalidEntity(msg) => write!(f, "Invalid entity: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
