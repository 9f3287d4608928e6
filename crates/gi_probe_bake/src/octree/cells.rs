//! GPU-facing octree and data cell layouts.
//!
//! Both are plain `#[repr(C)]` words so the exported byte arrays are a
//! `bytemuck` cast of the cell slices (little endian on every supported
//! target).

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::constants::{NO_DATA, POSITION_Y_SHIFT, POSITION_Z_SHIFT};
use crate::types::Color;
use crate::voxelizer::LeafCell;

const POSITION_X_MASK: u32 = (1 << POSITION_Y_SHIFT) - 1;
const POSITION_Y_MASK: u32 = (1 << (POSITION_Z_SHIFT - POSITION_Y_SHIFT)) - 1;

/// One octree node (16 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct OctreeCell {
  /// Bits 0-7: child mask, bits 8-15: level.
  pub header: u32,
  /// First child index minus own index. Zero for leaves.
  pub child_offset: u32,
  /// Index into the data cells, `NO_DATA` for internal nodes.
  pub data_index: u32,
  /// RGBA8 weighted average albedo of the subtree.
  pub lod_albedo: u32,
}

impl OctreeCell {
  pub fn internal(children_mask: u8, level: u32, child_offset: u32, lod_albedo: u32) -> Self {
    Self {
      header: pack_header(children_mask, level),
      child_offset,
      data_index: NO_DATA,
      lod_albedo,
    }
  }

  pub fn leaf(level: u32, data_index: u32, lod_albedo: u32) -> Self {
    Self {
      header: pack_header(0, level),
      child_offset: 0,
      data_index,
      lod_albedo,
    }
  }

  #[inline]
  pub fn children_mask(&self) -> u8 {
    (self.header & 0xFF) as u8
  }

  #[inline]
  pub fn level(&self) -> u32 {
    (self.header >> 8) & 0xFF
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.data_index != NO_DATA
  }

  #[inline]
  pub fn child_count(&self) -> u32 {
    self.children_mask().count_ones()
  }
}

#[inline]
fn pack_header(children_mask: u8, level: u32) -> u32 {
  children_mask as u32 | ((level & 0xFF) << 8)
}

/// Finest-level payload (16 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DataCell {
  /// `x | y << 11 | z << 21`.
  pub position: u32,
  /// RGBA8 albedo, alpha is coverage.
  pub albedo: u32,
  /// RGBE9995 emission.
  pub emission: u32,
  /// snorm8 normal xyz, used-sides mask in the top byte.
  pub normal: u32,
}

impl DataCell {
  pub fn from_leaf(leaf: &LeafCell) -> Self {
    let [x, y, z] = leaf.position;
    let emission = Color::rgb(leaf.emission.x, leaf.emission.y, leaf.emission.z);
    Self {
      position: x | (y << POSITION_Y_SHIFT) | (z << POSITION_Z_SHIFT),
      albedo: leaf.albedo.to_rgba8(),
      emission: emission.to_rgbe9995(),
      normal: pack_snorm8(leaf.normal) | ((leaf.used_sides as u32) << 24),
    }
  }

  pub fn grid_position(&self) -> [u32; 3] {
    [
      self.position & POSITION_X_MASK,
      (self.position >> POSITION_Y_SHIFT) & POSITION_Y_MASK,
      self.position >> POSITION_Z_SHIFT,
    ]
  }

  pub fn albedo(&self) -> Color {
    Color::from_rgba8(self.albedo)
  }

  pub fn emission(&self) -> Vec3 {
    Color::from_rgbe9995(self.emission).rgb_vec()
  }

  pub fn normal(&self) -> Vec3 {
    let c = |shift: u32| ((self.normal >> shift) as u8 as i8) as f32 / 127.0;
    Vec3::new(c(0), c(8), c(16))
  }

  pub fn used_sides(&self) -> u8 {
    (self.normal >> 24) as u8
  }
}

fn pack_snorm8(v: Vec3) -> u32 {
  let q = |c: f32| ((c.clamp(-1.0, 1.0) * 127.0).round() as i8) as u8 as u32;
  q(v.x) | (q(v.y) << 8) | (q(v.z) << 16)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::constants::{sides, DATA_CELL_BYTES, OCTREE_CELL_BYTES};

  #[test]
  fn test_cell_sizes_match_exported_layout() {
    assert_eq!(std::mem::size_of::<OctreeCell>(), OCTREE_CELL_BYTES);
    assert_eq!(std::mem::size_of::<DataCell>(), DATA_CELL_BYTES);
  }

  #[test]
  fn test_header_packs_mask_and_level() {
    let cell = OctreeCell::internal(0b1010_0001, 7, 3, 0);
    assert_eq!(cell.header, 0x07A1);
    assert_eq!(cell.children_mask(), 0b1010_0001);
    assert_eq!(cell.level(), 7);
    assert_eq!(cell.child_count(), 3);
    assert!(!cell.is_leaf());
  }

  #[test]
  fn test_data_cell_packs_leaf() {
    let leaf = LeafCell {
      position: [511, 300, 2],
      albedo: Color::rgba(1.0, 0.0, 0.5, 1.0),
      emission: Vec3::new(2.0, 0.0, 0.0),
      normal: Vec3::new(0.0, -1.0, 0.0),
      used_sides: sides::NEG_Y,
      weight: 1.0,
    };
    let cell = DataCell::from_leaf(&leaf);

    assert_eq!(cell.grid_position(), [511, 300, 2]);
    assert_eq!(cell.albedo & 0xFF, 255);
    assert_eq!((cell.albedo >> 16) & 0xFF, 128);
    assert!(cell.emission().abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-2));
    assert!(cell.normal().abs_diff_eq(Vec3::NEG_Y, 1e-6));
    assert_eq!(cell.used_sides(), sides::NEG_Y);
  }

  #[test]
  fn test_cells_cast_to_bytes() {
    let cells = [OctreeCell::leaf(6, 9, 0xAABBCCDD)];
    let bytes: &[u8] = bytemuck::cast_slice(&cells);
    assert_eq!(bytes.len(), OCTREE_CELL_BYTES);
    assert_eq!(&bytes[8..12], &9u32.to_le_bytes());
    assert_eq!(&bytes[12..16], &0xAABBCCDDu32.to_le_bytes());
  }
}
