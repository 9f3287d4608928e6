//! Geometry collector: finds the meshes a probe bake has to plot.
//!
//! Walks a scene subtree depth-first (node before children, children in
//! declaration order) and emits one [`PlotMesh`] per mesh that is visible in
//! the tree, opted into baked lighting, non-degenerate, and whose bounds
//! overlap the probe box once moved into probe-local space.

use glam::{Affine3A, Vec3};

use crate::bounds::Aabb;
use crate::scene::{HasDynamicMeshes, HasStaticMesh, Material, Mesh, NodeCursor};

/// Smallest probe basis determinant treated as invertible.
const SINGULAR_EPSILON: f32 = 1e-12;

/// A mesh scheduled for voxelization, in probe-local (bake) space.
#[derive(Clone, Debug)]
pub struct PlotMesh<'a> {
  pub mesh: &'a Mesh,
  /// Mesh space to probe-local space.
  pub local_xform: Affine3A,
  /// Per-surface overrides from the instance, indexed like `mesh.surfaces`.
  pub instance_materials: Vec<Option<&'a Material>>,
  /// Replaces the material of every surface when set.
  pub override_material: Option<&'a Material>,
}

impl<'a> PlotMesh<'a> {
  /// Material for surface `surface`: whole-mesh override, then the
  /// instance's surface override, then the mesh's own material.
  pub fn surface_material(&self, surface: usize) -> Option<&'a Material> {
    self
      .override_material
      .or_else(|| self.instance_materials.get(surface).copied().flatten())
      .or_else(|| {
        self
          .mesh
          .surfaces
          .get(surface)
          .and_then(|s| s.material.as_deref())
      })
  }
}

/// Affine inverse, or identity when the basis is singular.
///
/// Zero-scale probes have no inverse; callers should reject them earlier.
pub fn affine_inverse_or_identity(xform: &Affine3A) -> Affine3A {
  let det = xform.matrix3.determinant();
  if !det.is_finite() || det.abs() <= SINGULAR_EPSILON {
    tracing::warn!(det, "probe transform is singular, using identity");
    return Affine3A::IDENTITY;
  }
  xform.inverse()
}

/// Collect every mesh under `from` that overlaps the probe volume.
///
/// `probe_transform` is the probe's global transform and `extents` its
/// half size; the volume is `Aabb(-extents, extents)` in probe space.
pub fn find_meshes<'a>(
  from: NodeCursor<'a>,
  probe_transform: &Affine3A,
  extents: Vec3,
) -> Vec<PlotMesh<'a>> {
  let _span = tracing::info_span!("find_meshes").entered();

  let to_probe = affine_inverse_or_identity(probe_transform);
  let volume = Aabb::from_center_half_extents(Vec3::ZERO, extents);
  let mut out = Vec::new();
  visit(from, &to_probe, &volume, &mut out);

  tracing::debug!(meshes = out.len(), "collected plot meshes");
  out
}

fn visit<'a>(cursor: NodeCursor<'a>, to_probe: &Affine3A, volume: &Aabb, out: &mut Vec<PlotMesh<'a>>) {
  let visible = cursor.is_visible_in_tree();
  let node_xform = cursor.global_transform();

  if visible {
    if let Some(instance) = cursor.node.kind.as_static_mesh() {
      plot_static(instance, &node_xform, to_probe, volume, out);
    }
    if let Some(provider) = cursor.node.kind.as_dynamic_meshes() {
      plot_dynamic(provider, &node_xform, to_probe, volume, out);
    }
  }

  for child in cursor.children() {
    visit(child, to_probe, volume, out);
  }
}

fn plot_static<'a>(
  instance: &'a dyn HasStaticMesh,
  node_xform: &Affine3A,
  to_probe: &Affine3A,
  volume: &Aabb,
  out: &mut Vec<PlotMesh<'a>>,
) {
  if !instance.use_in_baked_light() {
    return;
  }
  let Some(mesh) = instance.mesh() else {
    return;
  };

  let xf = *to_probe * *node_xform;
  if !overlaps_volume(mesh, &xf, volume) {
    return;
  }

  out.push(PlotMesh {
    mesh,
    local_xform: xf,
    instance_materials: (0..mesh.surface_count())
      .map(|i| instance.surface_override(i))
      .collect(),
    override_material: instance.material_override(),
  });
}

fn plot_dynamic<'a>(
  provider: &'a dyn HasDynamicMeshes,
  node_xform: &Affine3A,
  to_probe: &Affine3A,
  volume: &Aabb,
  out: &mut Vec<PlotMesh<'a>>,
) {
  if !provider.use_in_baked_light() {
    return;
  }

  for (mesh_xform, mesh) in provider.meshes() {
    let xf = *to_probe * (*node_xform * mesh_xform);
    if !overlaps_volume(mesh, &xf, volume) {
      continue;
    }
    out.push(PlotMesh {
      mesh,
      local_xform: xf,
      instance_materials: Vec::new(),
      override_material: None,
    });
  }
}

fn overlaps_volume(mesh: &Mesh, xf: &Affine3A, volume: &Aabb) -> bool {
  if mesh.is_degenerate() {
    return false;
  }
  volume.overlaps(&mesh.aabb().transformed(xf))
}

#[cfg(test)]
#[path = "collector_test.rs"]
mod collector_test;
