//! CellCoord - immutable value type naming one octant of the probe octree.
//!
//! Coordinates are in cells of the node's own level. Level 0 is the root,
//! level `depth` is the finest grid.

use crate::constants::{morton_encode, octant_index, MAX_DEPTH};

/// Octree position: grid coordinate at `level`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct CellCoord {
  pub x: u32,
  pub y: u32,
  pub z: u32,
  /// 0 = root, higher = finer.
  pub level: u32,
}

impl CellCoord {
  pub fn new(x: u32, y: u32, z: u32, level: u32) -> Self {
    Self { x, y, z, level }
  }

  /// The root octant.
  pub const ROOT: CellCoord = CellCoord {
    x: 0,
    y: 0,
    z: 0,
    level: 0,
  };

  /// Child in octant `octant` (bit 0: +X, bit 1: +Y, bit 2: +Z).
  ///
  /// Returns None at [`MAX_DEPTH`].
  pub fn child(&self, octant: u8) -> Option<Self> {
    if self.level >= MAX_DEPTH {
      return None;
    }
    Some(Self {
      x: self.x * 2 + (octant & 1) as u32,
      y: self.y * 2 + ((octant >> 1) & 1) as u32,
      z: self.z * 2 + ((octant >> 2) & 1) as u32,
      level: self.level + 1,
    })
  }

  /// Enclosing node one level up. Returns None for the root.
  pub fn parent(&self) -> Option<Self> {
    if self.level == 0 {
      return None;
    }
    Some(Self {
      x: self.x / 2,
      y: self.y / 2,
      z: self.z / 2,
      level: self.level - 1,
    })
  }

  /// Octant of this node inside its parent.
  #[inline]
  pub fn octant(&self) -> u8 {
    octant_index(self.x, self.y, self.z)
  }

  /// Morton code of the coordinate within its level.
  #[inline]
  pub fn morton(&self) -> u32 {
    morton_encode(self.x, self.y, self.z)
  }

  /// Ancestor at `level`, or None when `level` is finer than this node.
  pub fn ancestor(&self, level: u32) -> Option<Self> {
    if level > self.level {
      return None;
    }
    let shift = self.level - level;
    Some(Self::new(self.x >> shift, self.y >> shift, self.z >> shift, level))
  }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
