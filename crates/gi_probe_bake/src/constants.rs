//! Grid, octant and byte-layout constants for probe bakes.
//!
//! # Octant Ordering
//!
//! ```text
//!         +Y
//!          │
//!          │
//!          │
//!          └───────── +X
//!         /
//!        /
//!       +Z
//!
//! Octant indices (binary: ZYX):
//!   0 = (0,0,0)    4 = (0,0,1)
//!   1 = (1,0,0)    5 = (1,0,1)
//!   2 = (0,1,0)    6 = (0,1,1)
//!   3 = (1,1,0)    7 = (1,1,1)
//! ```
//!
//! Morton codes interleave coordinates with the same ordering, so the three
//! lowest bits of a cell's code are its octant within the parent:
//!
//! ```text
//! code = ... z1 y1 x1 z0 y0 x0
//! parent code = code >> 3
//! ```
//!
//! # Exported Cell Layout
//!
//! ```text
//! Octree cell (16 bytes):
//!   u32 header        bits 0-7: child mask, bits 8-15: level
//!   u32 child_offset  first child index - own index (0 for leaves)
//!   u32 data_index    leaf data index, NO_DATA for internal nodes
//!   u32 lod_albedo    RGBA8 weighted average of the subtree
//!
//! Data cell (16 bytes):
//!   u32 position      x | y << 11 | z << 21
//!   u32 albedo        RGBA8 (R in the low byte)
//!   u32 emission      RGBE9995
//!   u32 normal        snorm8 x | y << 8 | z << 16 | used_sides << 24
//! ```

/// Subdivision depths supported by probes (64, 128, 256, 512 cells).
pub const SUBDIV_DEPTHS: [u32; 4] = [6, 7, 8, 9];

/// Deepest supported octree (512 cells along the longest axis).
pub const MAX_DEPTH: u32 = 9;

/// Marker stored in `data_index` of internal nodes.
pub const NO_DATA: u32 = u32::MAX;

/// Size of one exported octree cell in bytes.
pub const OCTREE_CELL_BYTES: usize = 16;

/// Size of one exported data cell in bytes.
pub const DATA_CELL_BYTES: usize = 16;

/// Bit shift of the Y coordinate in a packed data-cell position.
pub const POSITION_Y_SHIFT: u32 = 11;

/// Bit shift of the Z coordinate in a packed data-cell position.
pub const POSITION_Z_SHIFT: u32 = 21;

/// Octant offsets in the fixed ZYX bit order.
pub const OCTANT_OFFSETS: [[u32; 3]; 8] = [
  [0, 0, 0],
  [1, 0, 0],
  [0, 1, 0],
  [1, 1, 0],
  [0, 0, 1],
  [1, 0, 1],
  [0, 1, 1],
  [1, 1, 1],
];

/// Used-side bits, one per axis direction a surface can face.
pub mod sides {
  pub const POS_X: u8 = 1 << 0;
  pub const NEG_X: u8 = 1 << 1;
  pub const POS_Y: u8 = 1 << 2;
  pub const NEG_Y: u8 = 1 << 3;
  pub const POS_Z: u8 = 1 << 4;
  pub const NEG_Z: u8 = 1 << 5;

  /// All six sides.
  pub const ALL: u8 = 0b11_1111;
}

/// Spread the low 10 bits of `v` so there are two zero bits between each.
#[inline(always)]
fn part_1by2(v: u32) -> u32 {
  let mut x = v & 0x0000_03FF;
  x = (x | (x << 16)) & 0x0300_00FF;
  x = (x | (x << 8)) & 0x0300_F00F;
  x = (x | (x << 4)) & 0x030C_30C3;
  x = (x | (x << 2)) & 0x0924_9249;
  x
}

/// Inverse of [`part_1by2`].
#[inline(always)]
fn compact_1by2(v: u32) -> u32 {
  let mut x = v & 0x0924_9249;
  x = (x | (x >> 2)) & 0x030C_30C3;
  x = (x | (x >> 4)) & 0x0300_F00F;
  x = (x | (x >> 8)) & 0x0300_00FF;
  x = (x | (x >> 16)) & 0x0000_03FF;
  x
}

/// Interleave a grid coordinate into a Morton code (x in bit 0).
#[inline(always)]
pub fn morton_encode(x: u32, y: u32, z: u32) -> u32 {
  part_1by2(x) | (part_1by2(y) << 1) | (part_1by2(z) << 2)
}

/// Recover the grid coordinate of a Morton code.
#[inline(always)]
pub fn morton_decode(code: u32) -> [u32; 3] {
  [
    compact_1by2(code),
    compact_1by2(code >> 1),
    compact_1by2(code >> 2),
  ]
}

/// Octant index of a child offset.
#[inline(always)]
pub fn octant_index(dx: u32, dy: u32, dz: u32) -> u8 {
  ((dx & 1) | ((dy & 1) << 1) | ((dz & 1) << 2)) as u8
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
