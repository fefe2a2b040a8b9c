/// Spatial subsystem configuration.
///
/// Tree-construction constants that define the algorithms (SAH bin count,
/// SIMD lane width) are not configurable; see `scene::SAH_BIN_COUNT`
/// and `math::lanes::LANE_COUNT`.

use crate::error::Result;
use crate::engine_bail;

/// Spatial subsystem configuration
#[derive(Debug, Clone)]
pub struct SpatialConfig {
    /// Maximum triangles per mesh BVH leaf
    pub mesh_leaf_size: usize,
    /// Threads in the rebuild worker pool
    pub worker_threads: usize,
    /// Scene raycast: only refine the nearest N candidate entities (None = all)
    pub max_raycast_candidates: Option<usize>,
    /// Scene raycast: stop once a hit is closer than the next candidate's box
    pub early_exit: bool,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            mesh_leaf_size: 4,
            worker_threads: 1,
            max_raycast_candidates: None,
            early_exit: true,
        }
    }
}

impl SpatialConfig {
    /// Check that every field is in range.
    pub fn validate(&self) -> Result<()> {
        if self.mesh_leaf_size == 0 {
            engine_bail!("galaxy3d::SpatialConfig", InvalidConfig,
                "mesh_leaf_size must be >= 1");
        }
        if self.worker_threads == 0 {
            engine_bail!("galaxy3d::SpatialConfig", InvalidConfig,
                "worker_threads must be >= 1");
        }
        if self.max_raycast_candidates == Some(0) {
            engine_bail!("galaxy3d::SpatialConfig", InvalidConfig,
                "max_raycast_candidates must be None or >= 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_default_config_is_valid() {
        let config = SpatialConfig::default();
        assert_eq!(config.mesh_leaf_size, 4);
        assert_eq!(config.worker_threads, 1);
        assert!(config.max_raycast_candidates.is_none());
        assert!(config.early_exit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_leaf_size_rejected() {
        let config = SpatialConfig { mesh_leaf_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = SpatialConfig { worker_threads: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_candidates_rejected() {
        let config = SpatialConfig { max_raycast_candidates: Some(0), ..Default::default() };
        assert!(config.validate().is_err());
    }
}
