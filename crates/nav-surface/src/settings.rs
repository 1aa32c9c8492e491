//! The build profile.
//!
//! Every region is built with the same settings so persisted surfaces stay
//! interchangeable.  Lengths are world units, slopes are degrees.  Fields the
//! triangle-surface engine does not consume (`edge_max_*`, `detail_*`,
//! `verts_per_poly`, `partition`) are kept for engines that voxelise.

use serde::{Deserialize, Serialize};

use crate::{SurfaceError, SurfaceResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PartitionType {
    #[default]
    Watershed,
    Monotone,
    Layers,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub cell_size:               f32,
    pub cell_height:             f32,
    pub agent_height:            f32,
    pub agent_radius:            f32,
    pub agent_max_climb:         f32,
    pub agent_max_slope:         f32,
    /// Islands smaller than `min_region_size²` cells are discarded.
    pub min_region_size:         u32,
    pub merged_region_size:      u32,
    pub edge_max_len:            f32,
    pub edge_max_error:          f32,
    pub verts_per_poly:          u32,
    pub detail_sample_dist:      f32,
    pub detail_sample_max_error: f32,
    pub partition:               PartitionType,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            cell_size:               0.1,
            cell_height:             0.1,
            agent_height:            2.0,
            agent_radius:            0.45,
            agent_max_climb:         0.95,
            agent_max_slope:         50.0,
            min_region_size:         8,
            merged_region_size:      20,
            edge_max_len:            12.0,
            edge_max_error:          1.0,
            verts_per_poly:          6,
            detail_sample_dist:      6.0,
            detail_sample_max_error: 1.0,
            partition:               PartitionType::Watershed,
        }
    }
}

impl BuildSettings {
    pub fn validate(&self) -> SurfaceResult<()> {
        if !(self.cell_size > 0.0 && self.cell_height > 0.0) {
            return Err(SurfaceError::InvalidSettings("cell size and height must be positive".into()));
        }
        if !(0.0..90.0).contains(&self.agent_max_slope) {
            return Err(SurfaceError::InvalidSettings(format!(
                "agent_max_slope {} outside [0, 90)",
                self.agent_max_slope
            )));
        }
        if self.agent_max_climb < 0.0 {
            return Err(SurfaceError::InvalidSettings("agent_max_climb must not be negative".into()));
        }
        if self.verts_per_poly < 3 {
            return Err(SurfaceError::InvalidSettings("verts_per_poly must be at least 3".into()));
        }
        Ok(())
    }

    /// Minimum island area in square world units.
    pub fn min_island_area(&self) -> f32 {
        let side = self.min_region_size as f32 * self.cell_size;
        side * side
    }
}
