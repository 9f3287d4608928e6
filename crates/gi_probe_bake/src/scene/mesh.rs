//! Mesh resources read by the voxelizer.

use std::sync::Arc;

use glam::Vec3;

use crate::bounds::Aabb;
use crate::error::MeshError;
use crate::types::Color;

/// Primitive topology of a surface. Only `Triangles` can be voxelized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveType {
  Points,
  Lines,
  LineStrip,
  #[default]
  Triangles,
  TriangleStrip,
}

/// Surface material as seen by the baker.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
  /// Base color; alpha is coverage.
  pub albedo: Color,
  /// Emitted light color.
  pub emission: Color,
  /// Multiplier applied to `emission`.
  pub emission_energy: f32,
}

impl Material {
  pub fn new(albedo: Color) -> Self {
    Self {
      albedo,
      ..Default::default()
    }
  }

  pub fn with_emission(mut self, emission: Color, energy: f32) -> Self {
    self.emission = emission;
    self.emission_energy = energy;
    self
  }

  /// Emitted radiance (emission color scaled by energy).
  pub fn emitted(&self) -> Vec3 {
    self.emission.rgb_vec() * self.emission_energy
  }
}

impl Default for Material {
  fn default() -> Self {
    Self {
      albedo: Color::WHITE,
      emission: Color::BLACK,
      emission_energy: 0.0,
    }
  }
}

/// One draw surface of a mesh.
#[derive(Clone, Debug, Default)]
pub struct Surface {
  pub primitive: PrimitiveType,
  /// Vertex positions in mesh space.
  pub positions: Vec<Vec3>,
  /// Per-vertex colors. Empty means white.
  pub colors: Vec<Color>,
  /// Triangle indices. `None` means consecutive vertex triples.
  pub indices: Option<Vec<u32>>,
  /// Material baked into the mesh resource.
  pub material: Option<Arc<Material>>,
}

impl Surface {
  /// Indexed triangle list.
  pub fn triangles(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
    Self {
      primitive: PrimitiveType::Triangles,
      positions,
      colors: Vec::new(),
      indices: Some(indices),
      material: None,
    }
  }

  pub fn with_colors(mut self, colors: Vec<Color>) -> Self {
    self.colors = colors;
    self
  }

  pub fn with_material(mut self, material: Arc<Material>) -> Self {
    self.material = Some(material);
    self
  }

  /// Number of index (or vertex) entries that form triangles.
  pub fn element_count(&self) -> usize {
    self.indices.as_ref().map_or(self.positions.len(), Vec::len)
  }

  /// Check that this surface can be voxelized.
  ///
  /// Runs before any cell is touched so a bad surface contributes nothing.
  pub fn validate(&self) -> Result<(), MeshError> {
    if self.primitive != PrimitiveType::Triangles {
      return Err(MeshError::UnsupportedPrimitive(self.primitive));
    }

    let vertex_count = self.positions.len();
    if !self.colors.is_empty() && self.colors.len() != vertex_count {
      return Err(MeshError::AttributeLengthMismatch {
        attribute: "colors",
        len: self.colors.len(),
        vertex_count,
      });
    }

    let elements = self.element_count();
    if elements % 3 != 0 {
      return Err(MeshError::IncompleteTriangle(elements));
    }

    if let Some(indices) = &self.indices {
      if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(MeshError::IndexOutOfRange {
          index,
          vertex_count,
        });
      }
    }

    Ok(())
  }

  /// Vertex ids of triangle `tri`. Call only after [`Surface::validate`].
  #[inline]
  pub fn triangle(&self, tri: usize) -> [usize; 3] {
    match &self.indices {
      Some(indices) => [
        indices[tri * 3] as usize,
        indices[tri * 3 + 1] as usize,
        indices[tri * 3 + 2] as usize,
      ],
      None => [tri * 3, tri * 3 + 1, tri * 3 + 2],
    }
  }

  /// Vertex color or white when the surface has none.
  #[inline]
  pub fn color(&self, vertex: usize) -> Color {
    self.colors.get(vertex).copied().unwrap_or(Color::WHITE)
  }
}

/// Mesh resource: a list of surfaces.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
  pub surfaces: Vec<Surface>,
}

impl Mesh {
  pub fn new(surfaces: Vec<Surface>) -> Self {
    Self { surfaces }
  }

  pub fn surface_count(&self) -> usize {
    self.surfaces.len()
  }

  /// Bounding box of all vertex positions.
  pub fn aabb(&self) -> Aabb {
    let mut aabb = Aabb::empty();
    for surface in &self.surfaces {
      for &p in &surface.positions {
        aabb.encapsulate(p);
      }
    }
    aabb
  }

  /// A mesh without any vertex cannot be baked.
  pub fn is_degenerate(&self) -> bool {
    self.surfaces.iter().all(|s| s.positions.is_empty())
  }
}
