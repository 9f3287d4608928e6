//! Procedural meshes used by scene descriptions, the debug view and tests.

use glam::Vec3;

use super::mesh::{Mesh, Surface};

/// Axis-aligned box centered on the origin.
///
/// Eight shared corners, twelve outward-facing triangles.
pub fn box_mesh(half_extents: Vec3) -> Mesh {
  let h = half_extents;
  let positions = vec![
    Vec3::new(-h.x, -h.y, -h.z),
    Vec3::new(h.x, -h.y, -h.z),
    Vec3::new(-h.x, h.y, -h.z),
    Vec3::new(h.x, h.y, -h.z),
    Vec3::new(-h.x, -h.y, h.z),
    Vec3::new(h.x, -h.y, h.z),
    Vec3::new(-h.x, h.y, h.z),
    Vec3::new(h.x, h.y, h.z),
  ];
  // Corner ids follow the octant bit order (x: bit 0, y: bit 1, z: bit 2)
  let indices = vec![
    1, 3, 7, 1, 7, 5, // +X
    0, 4, 6, 0, 6, 2, // -X
    2, 6, 7, 2, 7, 3, // +Y
    0, 1, 5, 0, 5, 4, // -Y
    4, 5, 7, 4, 7, 6, // +Z
    0, 2, 3, 0, 3, 1, // -Z
  ];
  Mesh::new(vec![Surface::triangles(positions, indices)])
}

/// Horizontal quad in the XZ plane facing +Y.
pub fn plane_mesh(half_size_x: f32, half_size_z: f32) -> Mesh {
  let positions = vec![
    Vec3::new(-half_size_x, 0.0, -half_size_z),
    Vec3::new(half_size_x, 0.0, -half_size_z),
    Vec3::new(-half_size_x, 0.0, half_size_z),
    Vec3::new(half_size_x, 0.0, half_size_z),
  ];
  let indices = vec![0, 2, 3, 0, 3, 1];
  Mesh::new(vec![Surface::triangles(positions, indices)])
}
