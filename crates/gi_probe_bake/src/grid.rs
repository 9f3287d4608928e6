//! BakeGrid - voxel grid layout and the probe-space to cell-space mapping.
//!
//! The longest axis of the probe box receives `2^depth` cells. Each shorter
//! axis halves its cell count while half of the longest size still covers
//! it, so cells stay cubic and the octree root spans a cube of the longest
//! size anchored at the box minimum:
//!
//! ```text
//! extents (10, 2.5, 10), Subdiv64:
//!   longest size 20 -> 64 cells on X and Z
//!   Y size 5: 20/2 >= 5 -> 32, 10/2 >= 5 -> 16, 5/2 < 5 -> stop
//!   grid size = [64, 16, 64], cell size = 20 / 64
//! ```

use glam::{Affine3A, Vec3};

use crate::bounds::Aabb;
use crate::error::BakeError;
use crate::types::Subdiv;

/// Grid layout for one bake.
#[derive(Clone, Debug, PartialEq)]
pub struct BakeGrid {
  /// Probe box in probe-local space.
  pub bounds: Aabb,
  /// Octree depth (cells along the longest axis = `1 << depth`).
  pub depth: u32,
  /// Cell count per axis.
  pub size: [u32; 3],
  /// Edge length of one cell in probe-local units.
  pub cell_size: f32,
  /// Probe-local space to cell space.
  pub to_cell: Affine3A,
}

impl BakeGrid {
  /// Lay out the grid for `bounds` at `subdiv`.
  ///
  /// Fails when any axis of `bounds` has zero, negative or non-finite size,
  /// since the cell-space transform would not be invertible.
  pub fn new(subdiv: Subdiv, bounds: Aabb) -> Result<Self, BakeError> {
    let size = bounds.size();
    if !size.is_finite() || size.cmple(Vec3::ZERO).any() {
      return Err(BakeError::InvalidExtents((size * 0.5).to_array()));
    }

    let depth = subdiv.depth();
    let resolution = subdiv.resolution();
    let longest_axis = bounds.longest_axis();
    let longest = size[longest_axis];

    let mut cells = [resolution; 3];
    for axis in 0..3 {
      if axis == longest_axis {
        continue;
      }
      let mut axis_size = longest;
      while cells[axis] > 1 && axis_size * 0.5 >= size[axis] {
        axis_size *= 0.5;
        cells[axis] >>= 1;
      }
    }

    let scale = resolution as f32 / longest;
    let to_cell = Affine3A::from_scale(Vec3::splat(scale)) * Affine3A::from_translation(-bounds.min);

    Ok(Self {
      bounds,
      depth,
      size: cells,
      cell_size: longest / resolution as f32,
      to_cell,
    })
  }

  /// Cells along the longest axis.
  #[inline]
  pub fn resolution(&self) -> u32 {
    1 << self.depth
  }

  /// Number of octree levels including the root.
  #[inline]
  pub fn level_count(&self) -> usize {
    self.depth as usize + 1
  }

  /// Whether an integer cell coordinate lies inside the grid.
  #[inline]
  pub fn contains_cell(&self, cell: [u32; 3]) -> bool {
    cell[0] < self.size[0] && cell[1] < self.size[1] && cell[2] < self.size[2]
  }

  /// Cell containing a probe-local point, clamped to the grid.
  pub fn cell_of(&self, point: Vec3) -> [u32; 3] {
    let p = self.to_cell.transform_point3(point);
    let mut out = [0u32; 3];
    for axis in 0..3 {
      let max = (self.size[axis] - 1) as f32;
      out[axis] = p[axis].floor().clamp(0.0, max) as u32;
    }
    out
  }

  /// Probe-local position of a cell's center.
  pub fn cell_center(&self, cell: [u32; 3]) -> Vec3 {
    let c = Vec3::new(cell[0] as f32, cell[1] as f32, cell[2] as f32) + Vec3::splat(0.5);
    self.bounds.min + c * self.cell_size
  }
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;
