//! Bake counters and per-stage timings.

/// Counters and timings collected during one bake.
///
/// Timings are wall-clock microseconds measured with `web_time::Instant`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BakeStats {
  /// Meshes handed to the voxelizer.
  pub meshes_plotted: usize,
  /// Surfaces rasterized.
  pub surfaces_plotted: usize,
  /// Surfaces rejected by validation.
  pub surfaces_skipped: usize,
  /// Triangles visited, including degenerate and fully clipped ones.
  pub triangles: usize,
  /// Triangle/cell hits, counting a cell once per triangle touching it.
  pub cell_hits: usize,
  /// Non-empty finest-level cells.
  pub leaf_cells: usize,
  /// Octree nodes over all levels.
  pub octree_nodes: usize,

  pub collect_us: u64,
  pub plot_us: u64,
  pub octree_us: u64,
  pub export_us: u64,
}

impl BakeStats {
  /// Sum of all stage timings.
  pub fn total_us(&self) -> u64 {
    self.collect_us + self.plot_us + self.octree_us + self.export_us
  }

  /// Emit a one-line summary at debug level.
  pub fn log_summary(&self) {
    tracing::debug!(
      meshes = self.meshes_plotted,
      surfaces = self.surfaces_plotted,
      skipped = self.surfaces_skipped,
      triangles = self.triangles,
      leaves = self.leaf_cells,
      nodes = self.octree_nodes,
      total_us = self.total_us(),
      "bake finished"
    );
  }
}
