//! Debug visualization: one colored cube per non-empty finest-level cell.

use std::sync::Arc;

use glam::{Affine3A, Quat, Vec3};
use rayon::prelude::*;
use serde::Serialize;

use crate::scene::{primitives, Mesh};
use crate::types::Color;
use crate::voxelizer::VoxelGrid;

/// One cube instance in probe-local space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DebugInstance {
  /// Column-major affine: cell-sized scale, translation to the cell center.
  pub transform: [f32; 12],
  /// Cell albedo, alpha is coverage.
  pub color: Color,
}

/// Instanced unit cube covering every baked cell.
#[derive(Clone, Debug, Serialize)]
pub struct DebugMultiMesh {
  /// Shared unit cube (half extent 0.5).
  #[serde(skip)]
  pub mesh: Arc<Mesh>,
  pub cell_size: f32,
  pub instances: Vec<DebugInstance>,
}

impl DebugMultiMesh {
  pub fn build(voxels: &VoxelGrid) -> Self {
    let _span = tracing::info_span!("debug_multimesh", cells = voxels.leaves.len()).entered();
    let grid = &voxels.grid;
    let scale = Vec3::splat(grid.cell_size);

    let instances = voxels
      .leaves
      .par_iter()
      .map(|leaf| DebugInstance {
        transform: Affine3A::from_scale_rotation_translation(
          scale,
          Quat::IDENTITY,
          grid.cell_center(leaf.position),
        )
        .to_cols_array(),
        color: leaf.albedo,
      })
      .collect();

    Self {
      mesh: Arc::new(primitives::box_mesh(Vec3::splat(0.5))),
      cell_size: grid.cell_size,
      instances,
    }
  }

  pub fn instance_count(&self) -> usize {
    self.instances.len()
  }

  pub fn instance_transform(&self, index: usize) -> Option<Affine3A> {
    self
      .instances
      .get(index)
      .map(|i| Affine3A::from_cols_array(&i.transform))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::*;
  use crate::types::Subdiv;
  use crate::voxelizer::Voxelizer;

  #[test]
  fn test_one_instance_per_leaf_at_cell_center() {
    let mut mesh = one_cell_triangle();
    mesh.surfaces[0].material = Some(material(0.0, 1.0, 0.0));
    let mut vox = Voxelizer::begin(Subdiv::Subdiv64, probe_bounds(Vec3::ONE)).unwrap();
    vox.plot_mesh(&plot(&mesh, Affine3A::IDENTITY));
    let (voxels, _) = vox.finish();

    let debug = DebugMultiMesh::build(&voxels);
    assert_eq!(debug.instance_count(), 1);
    assert!((debug.cell_size - 1.0 / 32.0).abs() < 1e-6);

    let xf = debug.instance_transform(0).unwrap();
    let expected = Vec3::splat(0.5 / 32.0);
    assert!(Vec3::from(xf.translation).abs_diff_eq(expected, 1e-5));
    assert!(xf.transform_vector3(Vec3::X).abs_diff_eq(Vec3::X / 32.0, 1e-6));
    assert_eq!(debug.instances[0].color.to_rgba8(), Color::rgb(0.0, 1.0, 0.0).to_rgba8());
  }
}
