//! Error taxonomy for probe bakes.
//!
//! [`BakeError`] covers configuration problems. They are reported before any
//! geometry is touched and leave no partial state behind.
//!
//! [`MeshError`] covers a single bad surface. The voxelizer logs it, skips
//! the surface and keeps going.

use thiserror::Error;

/// Configuration error raised before a bake (or record load) does any work.
#[derive(Debug, Error)]
pub enum BakeError {
  /// Probe extents must be finite and strictly positive on every axis.
  #[error("probe extents must be positive and finite on every axis, got {0:?}")]
  InvalidExtents([f32; 3]),

  /// Only 64, 128, 256 and 512 cells per axis are supported.
  #[error("unsupported subdivision resolution {0} (expected 64, 128, 256 or 512)")]
  UnsupportedSubdiv(u32),

  /// The requested bake root does not exist in the scene.
  #[error("bake root node '{0}' not found in scene")]
  UnknownRootNode(String),

  /// A persisted probe record lacks one of its required keys.
  #[error("probe record is missing required key '{0}'")]
  MissingKey(&'static str),

  /// A persisted probe record has all keys but inconsistent contents.
  #[error("invalid probe record: {0}")]
  InvalidRecord(String),

  /// The persisted probe record is not valid JSON.
  #[error("failed to parse probe record: {0}")]
  Json(#[from] serde_json::Error),
}

/// Recoverable per-surface error. The offending surface is skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
  /// Only triangle lists can be voxelized.
  #[error("unsupported primitive topology {0:?}")]
  UnsupportedPrimitive(crate::scene::PrimitiveType),

  /// An index refers past the end of the vertex arrays.
  #[error("index {index} out of range for {vertex_count} vertices")]
  IndexOutOfRange { index: u32, vertex_count: usize },

  /// Per-vertex attribute array length differs from the position count.
  #[error("{attribute} has {len} entries but surface has {vertex_count} vertices")]
  AttributeLengthMismatch {
    attribute: &'static str,
    len: usize,
    vertex_count: usize,
  },

  /// Vertex or index count is not a multiple of three.
  #[error("triangle list has {0} elements, not a multiple of 3")]
  IncompleteTriangle(usize),
}
