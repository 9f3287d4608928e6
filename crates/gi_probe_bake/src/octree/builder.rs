//! Bottom-up sparse octree construction.
//!
//! Leaves arrive sorted by Morton code. Each coarser level is the list of
//! distinct `code >> 3` values of the level below, so every level stays
//! sorted and the children of one node are a contiguous run in octant
//! order. Flattening level by level then yields:
//!
//! ```text
//! nodes = [ level 0 | level 1 ........ | ... | level depth (leaves) ]
//!            root      sorted by Morton         data_index = position
//!
//! child k of node i = i + child_offset + popcount(mask & ((1 << k) - 1))
//! ```

use glam::DVec4;
use rayon::prelude::*;

use super::cells::{DataCell, OctreeCell};
use super::node::CellCoord;
use crate::constants::{morton_encode, NO_DATA};
use crate::types::Color;
use crate::voxelizer::VoxelGrid;

/// One node while a level is being assembled.
#[derive(Clone, Copy, Debug)]
struct LevelNode {
  code: u32,
  mask: u8,
  /// Index of the first child within the next finer level.
  first_child: u32,
  albedo_sum: DVec4,
  weight: f64,
}

impl LevelNode {
  fn lod_albedo(&self) -> u32 {
    if self.weight <= 0.0 {
      return 0;
    }
    Color::from_array((self.albedo_sum / self.weight).as_vec4().to_array()).to_rgba8()
  }
}

/// Flattened sparse octree over the finest-level cells of one bake.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseOctree {
  /// Finest level (log2 of the resolution).
  pub depth: u32,
  /// Cell count per axis at the finest level.
  pub size: [u32; 3],
  /// All nodes, level by level.
  pub nodes: Vec<OctreeCell>,
  /// Leaf payloads, in finest-level node order.
  pub data: Vec<DataCell>,
  /// Node count per level, index = level.
  pub level_counts: Vec<u32>,
}

impl SparseOctree {
  /// Build the octree from voxelizer output.
  ///
  /// An empty grid produces no nodes at all (not even the root) and
  /// all-zero level counts.
  pub fn build(voxels: &VoxelGrid) -> Self {
    let _span = tracing::info_span!("octree_build", leaves = voxels.leaves.len()).entered();

    let depth = voxels.grid.depth;
    let level_count = depth as usize + 1;

    if voxels.leaves.is_empty() {
      return Self {
        depth,
        size: voxels.grid.size,
        nodes: Vec::new(),
        data: Vec::new(),
        level_counts: vec![0; level_count],
      };
    }

    // Finest level straight from the leaves
    let mut levels: Vec<Vec<LevelNode>> = Vec::with_capacity(level_count);
    levels.push(
      voxels
        .leaves
        .iter()
        .map(|leaf| {
          let [x, y, z] = leaf.position;
          LevelNode {
            code: morton_encode(x, y, z),
            mask: 0,
            first_child: 0,
            albedo_sum: DVec4::from_array(leaf.albedo.to_array().map(f64::from)) * leaf.weight,
            weight: leaf.weight,
          }
        })
        .collect(),
    );

    for _ in 0..depth {
      let coarser = aggregate(&levels[levels.len() - 1]);
      levels.push(coarser);
    }
    levels.reverse();

    let level_counts: Vec<u32> = levels.iter().map(|l| l.len() as u32).collect();
    let mut level_start = Vec::with_capacity(level_count + 1);
    let mut total = 0u32;
    for &count in &level_counts {
      level_start.push(total);
      total += count;
    }
    level_start.push(total);

    let mut nodes = Vec::with_capacity(total as usize);
    for (level, entries) in levels.iter().enumerate() {
      for (i, node) in entries.iter().enumerate() {
        let own = level_start[level] + i as u32;
        let cell = if level as u32 == depth {
          OctreeCell::leaf(depth, i as u32, node.lod_albedo())
        } else {
          let first_child = level_start[level + 1] + node.first_child;
          OctreeCell::internal(node.mask, level as u32, first_child - own, node.lod_albedo())
        };
        nodes.push(cell);
      }
    }

    let data: Vec<DataCell> = voxels.leaves.par_iter().map(DataCell::from_leaf).collect();

    tracing::debug!(nodes = nodes.len(), leaves = data.len(), "octree built");

    Self {
      depth,
      size: voxels.grid.size,
      nodes,
      data,
      level_counts,
    }
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Index of the first node of `level`.
  pub fn level_start(&self, level: u32) -> usize {
    self.level_counts[..level as usize]
      .iter()
      .map(|&c| c as usize)
      .sum()
  }

  /// Index of child `octant` of node `index`, if that octant is occupied.
  pub fn child_index(&self, index: usize, octant: u8) -> Option<usize> {
    if octant > 7 {
      return None;
    }
    let node = self.nodes.get(index)?;
    let mask = node.children_mask();
    if mask & (1 << octant) == 0 {
      return None;
    }
    let before = (mask & ((1u8 << octant) - 1)).count_ones() as usize;
    Some(index + node.child_offset as usize + before)
  }

  /// Walk from the root to the leaf holding finest-level cell `cell`.
  pub fn lookup(&self, cell: [u32; 3]) -> Option<&DataCell> {
    let resolution = 1u32 << self.depth;
    if self.nodes.is_empty() || cell.iter().any(|&c| c >= resolution) {
      return None;
    }
    let leaf = CellCoord::new(cell[0], cell[1], cell[2], self.depth);
    let mut index = 0;
    for level in 1..=self.depth {
      let octant = leaf.ancestor(level)?.octant();
      index = self.child_index(index, octant)?;
    }
    let node = &self.nodes[index];
    if node.data_index == NO_DATA {
      return None;
    }
    self.data.get(node.data_index as usize)
  }
}

/// Collapse one sorted level into its parent level.
fn aggregate(finer: &[LevelNode]) -> Vec<LevelNode> {
  let mut out: Vec<LevelNode> = Vec::with_capacity(finer.len() / 2 + 1);
  for (i, child) in finer.iter().enumerate() {
    let code = child.code >> 3;
    let bit = 1u8 << (child.code & 7);
    match out.last_mut() {
      Some(parent) if parent.code == code => {
        parent.mask |= bit;
        parent.albedo_sum += child.albedo_sum;
        parent.weight += child.weight;
      }
      _ => out.push(LevelNode {
        code,
        mask: bit,
        first_child: i as u32,
        albedo_sum: child.albedo_sum,
        weight: child.weight,
      }),
    }
  }
  out
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
