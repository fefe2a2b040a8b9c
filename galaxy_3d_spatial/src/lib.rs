/*!
# Galaxy 3D Spatial

Spatial acceleration for the Galaxy 3D engine: a two-level bounding volume
hierarchy answering world-space ray queries and culling queries.

## Architecture

- **MeshBvh**: per-mesh triangle hierarchy, built once, median split,
  leaves tested 8 triangles at a time with SIMD lanes
- **SceneBvh**: per-scene entity hierarchy, rebuilt every tick on a worker
  with a binned SAH split, published by an atomic swap while readers keep
  querying the previous tree
- **Raycast**: scene BVH candidates refined against each entity's mesh BVH
  in local space, merged nearest first
- **Math**: AABB, ray/box and ray/triangle tests, line clipping, lane trait

All query paths degrade to "no hit" on degenerate input; errors are only
returned by construction and worker plumbing.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod math;
pub mod camera;
pub mod mesh;
pub mod scene;
pub mod utils;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::SpatialConfig;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Math sub-module
    pub mod math {
        pub use crate::math::*;
    }

    // Camera sub-module
    pub mod camera {
        pub use crate::camera::*;
    }

    // Mesh sub-module
    pub mod mesh {
        pub use crate::mesh::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Utility sub-module
    pub mod utils {
        pub use crate::utils::*;
    }
}

// Re-export math library at crate root
pub use glam;
