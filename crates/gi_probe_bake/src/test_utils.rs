//! Shared fixtures for unit tests.

use std::sync::Arc;

use glam::{Affine3A, Vec3};

use crate::bounds::Aabb;
use crate::collector::PlotMesh;
use crate::progress::{BakeEvent, BakeObserver};
use crate::scene::{primitives, Material, Mesh, MeshInstance, SceneNode, Surface};
use crate::types::Color;

/// Probe box centered at the origin.
pub fn probe_bounds(extents: Vec3) -> Aabb {
  Aabb::from_center_half_extents(Vec3::ZERO, extents)
}

/// Single-triangle mesh.
pub fn triangle_mesh(a: Vec3, b: Vec3, c: Vec3) -> Mesh {
  Mesh::new(vec![Surface::triangles(vec![a, b, c], vec![0, 1, 2])])
}

/// Small +Z facing triangle inside probe cell `[32, 32, 32]` of a
/// `Subdiv64` bake over `probe_bounds(Vec3::ONE)`.
pub fn one_cell_triangle() -> Mesh {
  triangle_mesh(
    Vec3::new(0.005, 0.005, 0.015),
    Vec3::new(0.025, 0.005, 0.015),
    Vec3::new(0.005, 0.025, 0.015),
  )
}

/// Plot record with no material overrides.
pub fn plot(mesh: &Mesh, xform: Affine3A) -> PlotMesh<'_> {
  PlotMesh {
    mesh,
    local_xform: xform,
    instance_materials: Vec::new(),
    override_material: None,
  }
}

pub fn material(r: f32, g: f32, b: f32) -> Arc<Material> {
  Arc::new(Material::new(Color::rgb(r, g, b)))
}

/// Mesh-instance node with a box of the given half size.
pub fn cube_node(name: &str, half_extents: Vec3, translation: Vec3) -> SceneNode {
  let mesh = Arc::new(primitives::box_mesh(half_extents));
  SceneNode::mesh_instance(name, MeshInstance::new(mesh))
    .with_transform(Affine3A::from_translation(translation))
}

/// Scene root holding one unit-half-size cube at `translation`.
pub fn cube_scene(translation: Vec3) -> SceneNode {
  SceneNode::new("root").with_child(cube_node("cube", Vec3::splat(0.5), translation))
}

/// Records events in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
  pub events: Vec<BakeEvent>,
}

impl BakeObserver for RecordingObserver {
  fn begin(&mut self, total_steps: usize) {
    self.events.push(BakeEvent::Begin { total_steps });
  }

  fn step(&mut self, step: usize, label: &str) {
    self.events.push(BakeEvent::Step {
      step,
      label: label.to_string(),
    });
  }

  fn end(&mut self) {
    self.events.push(BakeEvent::End);
  }
}
