use glam::Vec3;

use super::*;
use crate::constants::{morton_encode, sides};
use crate::grid::BakeGrid;
use crate::test_utils::probe_bounds;
use crate::types::Subdiv;
use crate::voxelizer::{LeafCell, VoxelGrid};

/// Subdiv64 cube grid (depth 6) holding the given cells, sorted by Morton.
fn voxels(positions: &[[u32; 3]]) -> VoxelGrid {
  let grid = BakeGrid::new(Subdiv::Subdiv64, probe_bounds(Vec3::ONE)).unwrap();
  let mut leaves: Vec<LeafCell> = positions
    .iter()
    .map(|&position| LeafCell {
      position,
      albedo: Color::WHITE,
      emission: Vec3::ZERO,
      normal: Vec3::Y,
      used_sides: sides::POS_Y,
      weight: 1.0,
    })
    .collect();
  leaves.sort_by_key(|l| morton_encode(l.position[0], l.position[1], l.position[2]));
  VoxelGrid { grid, leaves }
}

/// Every node at level L > 0 is the child of some node at L - 1.
fn assert_structure(tree: &SparseOctree) {
  assert_eq!(tree.level_counts.len(), tree.depth as usize + 1);
  let total: u32 = tree.level_counts.iter().sum();
  assert_eq!(total as usize, tree.node_count());
  assert_eq!(tree.level_counts[0], 1);
  assert_eq!(*tree.level_counts.last().unwrap() as usize, tree.data.len());

  let mut referenced = vec![false; tree.node_count()];
  referenced[0] = true;
  for (i, node) in tree.nodes.iter().enumerate() {
    if node.is_leaf() {
      assert_eq!(node.children_mask(), 0, "leaf {} has children", i);
      continue;
    }
    assert!(node.child_count() >= 1, "internal node {} has no children", i);
    for octant in 0u8..8 {
      if let Some(child) = tree.child_index(i, octant) {
        assert!(child > i);
        assert_eq!(tree.nodes[child].level(), node.level() + 1);
        assert!(!referenced[child], "node {} referenced twice", child);
        referenced[child] = true;
      }
    }
  }
  assert!(referenced.iter().all(|&r| r), "orphan node");
}

// =========================================================================
// Structure
// =========================================================================

#[test]
fn test_single_leaf_builds_one_chain() {
  let tree = SparseOctree::build(&voxels(&[[5, 9, 63]]));
  assert_eq!(tree.level_counts, vec![1; 7]);
  assert_eq!(tree.node_count(), 7);
  assert_structure(&tree);
  assert_eq!(tree.lookup([5, 9, 63]).unwrap().grid_position(), [5, 9, 63]);
}

#[test]
fn test_empty_grid_has_no_nodes() {
  let tree = SparseOctree::build(&voxels(&[]));
  assert!(tree.is_empty());
  assert_eq!(tree.level_counts, vec![0; 7]);
  assert!(tree.data.is_empty());
  assert!(tree.lookup([0, 0, 0]).is_none());
}

#[test]
fn test_siblings_share_parent_and_are_contiguous() {
  // All 8 cells of the block at (2, 2, 2) at level 5
  let mut cells = Vec::new();
  for octant in 0..8u32 {
    cells.push([4 + (octant & 1), 4 + ((octant >> 1) & 1), 4 + ((octant >> 2) & 1)]);
  }
  let tree = SparseOctree::build(&voxels(&cells));
  assert_structure(&tree);

  assert_eq!(tree.level_counts[5], 1);
  assert_eq!(tree.level_counts[6], 8);
  let parent = tree.level_start(5);
  assert_eq!(tree.nodes[parent].children_mask(), 0xFF);
  let first = tree.child_index(parent, 0).unwrap();
  for octant in 0u8..8 {
    assert_eq!(tree.child_index(parent, octant), Some(first + octant as usize));
  }
}

#[test]
fn test_child_index_rejects_out_of_range_octant() {
  let tree = SparseOctree::build(&voxels(&[[0, 0, 0]]));
  assert!(tree.child_index(0, 0).is_some());
  assert_eq!(tree.child_index(0, 8), None);
  assert_eq!(tree.child_index(0, u8::MAX), None);
  assert_eq!(tree.child_index(tree.node_count(), 0), None);
}

#[test]
fn test_scattered_leaves_are_all_reachable() {
  let cells = [[0, 0, 0], [63, 63, 63], [31, 32, 31], [1, 0, 0], [40, 2, 17]];
  let tree = SparseOctree::build(&voxels(&cells));
  assert_structure(&tree);
  assert_eq!(tree.data.len(), cells.len());
  for cell in cells {
    assert_eq!(tree.lookup(cell).map(|d| d.grid_position()), Some(cell));
  }
  assert!(tree.lookup([2, 2, 2]).is_none());
  assert!(tree.lookup([64, 0, 0]).is_none());
}

#[test]
fn test_leaf_data_follows_finest_level_order() {
  let cells = [[10, 0, 0], [0, 10, 0], [0, 0, 10]];
  let tree = SparseOctree::build(&voxels(&cells));
  let start = tree.level_start(tree.depth);
  for (i, data) in tree.data.iter().enumerate() {
    assert_eq!(tree.nodes[start + i].data_index, i as u32);
    let [x, y, z] = data.grid_position();
    if i > 0 {
      let [px, py, pz] = tree.data[i - 1].grid_position();
      assert!(morton_encode(px, py, pz) < morton_encode(x, y, z));
    }
  }
}

// =========================================================================
// LOD albedo
// =========================================================================

#[test]
fn test_lod_albedo_is_weighted_average() {
  let mut grid = voxels(&[[0, 0, 0], [1, 0, 0]]);
  grid.leaves[0].albedo = Color::rgb(1.0, 0.0, 0.0);
  grid.leaves[0].weight = 3.0;
  grid.leaves[1].albedo = Color::rgb(0.0, 0.0, 1.0);
  grid.leaves[1].weight = 1.0;

  let tree = SparseOctree::build(&grid);
  let root = Color::from_rgba8(tree.nodes[0].lod_albedo);
  assert!((root.r - 0.75).abs() < 1.0 / 255.0);
  assert!((root.b - 0.25).abs() < 1.0 / 255.0);
  assert_eq!(root.g, 0.0);
}

#[test]
fn test_build_is_deterministic() {
  let cells = [[3, 4, 5], [60, 1, 2], [7, 7, 7], [8, 8, 8]];
  let a = SparseOctree::build(&voxels(&cells));
  let b = SparseOctree::build(&voxels(&cells));
  assert_eq!(a, b);
}
