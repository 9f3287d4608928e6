//! Core value types shared by the bake pipeline.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::SUBDIV_DEPTHS;
use crate::error::BakeError;

/// Linear RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
  pub r: f32,
  pub g: f32,
  pub b: f32,
  pub a: f32,
}

impl Color {
  pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
  pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

  pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
    Self { r, g, b, a }
  }

  pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
    Self::rgba(r, g, b, 1.0)
  }

  pub fn from_array(v: [f32; 4]) -> Self {
    Self::rgba(v[0], v[1], v[2], v[3])
  }

  pub fn to_array(self) -> [f32; 4] {
    [self.r, self.g, self.b, self.a]
  }

  /// RGB channels as a vector (alpha dropped).
  pub fn rgb_vec(self) -> Vec3 {
    Vec3::new(self.r, self.g, self.b)
  }

  /// Component-wise product.
  pub fn modulate(self, other: Color) -> Color {
    Color::rgba(
      self.r * other.r,
      self.g * other.g,
      self.b * other.b,
      self.a * other.a,
    )
  }

  /// Pack into RGBA8 with R in the low byte. Channels are clamped to [0, 1].
  pub fn to_rgba8(self) -> u32 {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    q(self.r) | (q(self.g) << 8) | (q(self.b) << 16) | (q(self.a) << 24)
  }

  /// Unpack an RGBA8 value produced by [`Color::to_rgba8`].
  pub fn from_rgba8(v: u32) -> Color {
    let c = |shift: u32| ((v >> shift) & 0xFF) as f32 / 255.0;
    Color::rgba(c(0), c(8), c(16), c(24))
  }

  /// Pack RGB into the shared-exponent RGBE9995 format (alpha dropped).
  ///
  /// Three 9-bit mantissas share one 5-bit exponent (bias 15). Negative
  /// channels clamp to zero; values above 65408 saturate.
  pub fn to_rgbe9995(self) -> u32 {
    const POW2_TO_9: f32 = 512.0;
    const B: f32 = 15.0;
    const N: f32 = 9.0;
    const SHARED_EXP_MAX: f32 = 65408.0;

    let r = self.r.max(0.0).min(SHARED_EXP_MAX);
    let g = self.g.max(0.0).min(SHARED_EXP_MAX);
    let b = self.b.max(0.0).min(SHARED_EXP_MAX);

    let c_max = r.max(g).max(b);
    let exp_p = (-B - 1.0).max(c_max.log2().floor()) + 1.0 + B;
    let s_max = (c_max / 2f32.powf(exp_p - B - N) + 0.5).floor();
    let exp_s = if s_max < POW2_TO_9 { exp_p } else { exp_p + 1.0 };

    let scale = 2f32.powf(exp_s - B - N);
    let s_r = (r / scale + 0.5).floor() as u32;
    let s_g = (g / scale + 0.5).floor() as u32;
    let s_b = (b / scale + 0.5).floor() as u32;

    (s_r & 0x1FF) | ((s_g & 0x1FF) << 9) | ((s_b & 0x1FF) << 18) | (((exp_s as u32) & 0x1F) << 27)
  }

  /// Unpack an RGBE9995 value (alpha = 1).
  pub fn from_rgbe9995(v: u32) -> Color {
    let exponent = ((v >> 27) & 0x1F) as f32;
    let scale = 2f32.powf(exponent - 15.0 - 9.0);
    Color::rgb(
      (v & 0x1FF) as f32 * scale,
      ((v >> 9) & 0x1FF) as f32 * scale,
      ((v >> 18) & 0x1FF) as f32 * scale,
    )
  }
}

impl Default for Color {
  fn default() -> Self {
    Color::WHITE
  }
}

/// Probe grid subdivision: cell count along the probe's longest axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Subdiv {
  Subdiv64,
  #[default]
  Subdiv128,
  Subdiv256,
  Subdiv512,
}

impl Subdiv {
  pub const ALL: [Subdiv; 4] = [
    Subdiv::Subdiv64,
    Subdiv::Subdiv128,
    Subdiv::Subdiv256,
    Subdiv::Subdiv512,
  ];

  /// Octree depth (log2 of the resolution).
  #[inline]
  pub fn depth(self) -> u32 {
    SUBDIV_DEPTHS[self as usize]
  }

  /// Cells along the longest axis.
  #[inline]
  pub fn resolution(self) -> u32 {
    1 << self.depth()
  }

  /// Parse a resolution value (64, 128, 256 or 512).
  pub fn from_resolution(resolution: u32) -> Result<Self, BakeError> {
    Self::ALL
      .into_iter()
      .find(|s| s.resolution() == resolution)
      .ok_or(BakeError::UnsupportedSubdiv(resolution))
  }
}

impl TryFrom<u32> for Subdiv {
  type Error = BakeError;

  fn try_from(value: u32) -> Result<Self, Self::Error> {
    Subdiv::from_resolution(value)
  }
}

impl From<Subdiv> for u32 {
  fn from(value: Subdiv) -> Self {
    value.resolution()
  }
}

/// Post-bake parameters forwarded to the rendering backend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeTunables {
  /// Maximum light value stored in the probe (0-8).
  pub dynamic_range: f32,
  /// Energy multiplier applied to the probe's lighting (0-64).
  pub energy: f32,
  /// Offset along the view direction to avoid self-lighting (0-8).
  pub bias: f32,
  /// Offset along the surface normal (0-8).
  pub normal_bias: f32,
  /// Light propagation factor between cells (0-1).
  pub propagation: f32,
  /// Strength of the per-axis (anisotropic) data (0-1).
  pub anisotropy_strength: f32,
  /// Interior probes ignore sky light.
  pub interior: bool,
  /// Accumulate a second light bounce.
  pub use_two_bounces: bool,
}

impl Default for ProbeTunables {
  fn default() -> Self {
    Self {
      dynamic_range: 4.0,
      energy: 1.0,
      bias: 1.5,
      normal_bias: 0.0,
      propagation: 0.7,
      anisotropy_strength: 0.5,
      interior: false,
      use_two_bounces: true,
    }
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
