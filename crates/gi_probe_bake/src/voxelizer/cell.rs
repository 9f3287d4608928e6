//! Finest-level cell accumulator and its resolved form.

use glam::{DVec3, Vec3};

use crate::constants::sides;
use crate::types::Color;

/// Weighted sums collected for one grid cell while plotting.
///
/// Sums are kept in f64 so the plotting order only changes results by
/// rounding.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VoxelCell {
  pub albedo: DVec3,
  pub alpha: f64,
  pub emission: DVec3,
  pub normal: DVec3,
  pub weight: f64,
  pub used_sides: u8,
}

impl VoxelCell {
  /// Add one triangle's contribution with weight `w`.
  #[inline]
  pub fn accumulate(&mut self, w: f64, albedo: Color, emission: Vec3, normal: Vec3) {
    self.albedo += albedo.rgb_vec().as_dvec3() * w;
    self.alpha += albedo.a as f64 * w;
    self.emission += emission.as_dvec3() * w;
    self.normal += normal.as_dvec3() * w;
    self.weight += w;
    self.used_sides |= sides_facing(normal);
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.weight <= 0.0
  }

  /// Weighted averages, or `None` for a cell nothing contributed to.
  pub fn resolve(&self, position: [u32; 3]) -> Option<LeafCell> {
    if self.is_empty() {
      return None;
    }
    let inv = 1.0 / self.weight;
    let albedo = (self.albedo * inv).as_vec3();
    Some(LeafCell {
      position,
      albedo: Color::rgba(albedo.x, albedo.y, albedo.z, (self.alpha * inv) as f32),
      emission: (self.emission * inv).as_vec3(),
      normal: self.normal.normalize_or_zero().as_vec3(),
      used_sides: self.used_sides,
      weight: self.weight,
    })
  }
}

/// Resolved finest-level cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafCell {
  /// Grid coordinate.
  pub position: [u32; 3],
  /// Average albedo; alpha is coverage.
  pub albedo: Color,
  pub emission: Vec3,
  /// Unit average normal, zero when contributions cancel out.
  pub normal: Vec3,
  /// Mask of [`sides`] faced by contributing surfaces.
  pub used_sides: u8,
  /// Total contributing area in cell units.
  pub weight: f64,
}

/// Axis directions whose dot product with `normal` is positive.
pub fn sides_facing(normal: Vec3) -> u8 {
  let mut mask = 0;
  for (component, pos, neg) in [
    (normal.x, sides::POS_X, sides::NEG_X),
    (normal.y, sides::POS_Y, sides::NEG_Y),
    (normal.z, sides::POS_Z, sides::NEG_Z),
  ] {
    if component > 0.0 {
      mask |= pos;
    } else if component < 0.0 {
      mask |= neg;
    }
  }
  mask
}
