//! Voxelizer - plots meshes into the finest-level cell grid.
//!
//! ```text
//! PlotMesh ──► validate surface ──► to cell space ──► rasterize triangle
//!                   │ MeshError                               │
//!                   ▼                                         ▼
//!              warn + skip                      accumulate into VoxelCell
//!                                                             │
//!                                       finish() ──► sorted LeafCells
//! ```
//!
//! Each touched cell receives weight `area / touched_cells` for the triangle,
//! where area is measured in cell units.

pub mod cell;
pub mod raster;

use std::collections::HashMap;

use glam::{Vec3, Vec4};
use rayon::prelude::*;

pub use cell::{LeafCell, VoxelCell};
pub use raster::{rasterize_triangle, CellList};

use crate::bounds::Aabb;
use crate::collector::PlotMesh;
use crate::constants::{morton_decode, morton_encode};
use crate::error::BakeError;
use crate::grid::BakeGrid;
use crate::scene::Surface;
use crate::stats::BakeStats;
use crate::types::{Color, Subdiv};

/// Finest-level output of a voxelization pass.
#[derive(Clone, Debug)]
pub struct VoxelGrid {
  pub grid: BakeGrid,
  /// Non-empty cells in ascending Morton order.
  pub leaves: Vec<LeafCell>,
}

/// Accumulates plotted meshes into a sparse cell map.
pub struct Voxelizer {
  grid: BakeGrid,
  cells: HashMap<u32, VoxelCell>,
  scratch: CellList,
  stats: BakeStats,
}

impl Voxelizer {
  /// Start a bake over `bounds` (probe-local space).
  pub fn begin(subdiv: Subdiv, bounds: Aabb) -> Result<Self, BakeError> {
    let grid = BakeGrid::new(subdiv, bounds)?;
    tracing::debug!(size = ?grid.size, cell_size = grid.cell_size, "voxelizer begin");
    Ok(Self {
      grid,
      cells: HashMap::new(),
      scratch: CellList::new(),
      stats: BakeStats::default(),
    })
  }

  pub fn grid(&self) -> &BakeGrid {
    &self.grid
  }

  pub fn stats(&self) -> &BakeStats {
    &self.stats
  }

  /// Number of cells touched so far.
  pub fn cell_count(&self) -> usize {
    self.cells.len()
  }

  /// Rasterize every valid surface of `plot`.
  ///
  /// Invalid surfaces are logged and skipped; they contribute nothing.
  pub fn plot_mesh(&mut self, plot: &PlotMesh<'_>) {
    let to_cell = self.grid.to_cell * plot.local_xform;

    for (index, surface) in plot.mesh.surfaces.iter().enumerate() {
      if let Err(err) = surface.validate() {
        tracing::warn!(surface = index, error = %err, "skipping surface");
        self.stats.surfaces_skipped += 1;
        continue;
      }

      let (albedo, emission) = plot
        .surface_material(index)
        .map_or((Color::WHITE, Vec3::ZERO), |m| (m.albedo, m.emitted()));

      let positions: Vec<Vec3> = surface
        .positions
        .iter()
        .map(|&p| to_cell.transform_point3(p))
        .collect();

      self.plot_surface(surface, &positions, albedo, emission);
      self.stats.surfaces_plotted += 1;
    }

    self.stats.meshes_plotted += 1;
  }

  fn plot_surface(&mut self, surface: &Surface, positions: &[Vec3], albedo: Color, emission: Vec3) {
    let mut touched = std::mem::take(&mut self.scratch);

    for tri in 0..surface.element_count() / 3 {
      self.stats.triangles += 1;
      let ids = surface.triangle(tri);
      let verts = [positions[ids[0]], positions[ids[1]], positions[ids[2]]];

      rasterize_triangle(&verts, self.grid.size, &mut touched);
      if touched.is_empty() {
        continue;
      }

      let cross = (verts[1] - verts[0]).cross(verts[2] - verts[0]);
      let normal = cross.normalize_or_zero();
      let weight = 0.5 * cross.length() as f64 / touched.len() as f64;
      let colors = [
        surface.color(ids[0]),
        surface.color(ids[1]),
        surface.color(ids[2]),
      ];

      for &cell in &touched {
        let center = Vec3::new(cell[0] as f32, cell[1] as f32, cell[2] as f32) + Vec3::splat(0.5);
        let bary = raster::clamped_barycentric(center, &verts);
        let vertex_color = interpolate_color(&colors, bary);

        self
          .cells
          .entry(morton_encode(cell[0], cell[1], cell[2]))
          .or_default()
          .accumulate(weight, albedo.modulate(vertex_color), emission, normal);
      }
      self.stats.cell_hits += touched.len();
    }

    self.scratch = touched;
  }

  /// Resolve accumulated cells into leaves sorted by Morton code.
  pub fn finish(self) -> (VoxelGrid, BakeStats) {
    let _span = tracing::info_span!("voxelizer_finish", cells = self.cells.len()).entered();

    let mut entries: Vec<(u32, VoxelCell)> = self.cells.into_iter().collect();
    entries.par_sort_unstable_by_key(|(code, _)| *code);

    let leaves: Vec<LeafCell> = entries
      .into_par_iter()
      .filter_map(|(code, cell)| cell.resolve(morton_decode(code)))
      .collect();

    let mut stats = self.stats;
    stats.leaf_cells = leaves.len();

    (
      VoxelGrid {
        grid: self.grid,
        leaves,
      },
      stats,
    )
  }
}

/// Barycentric blend of three vertex colors.
#[inline]
fn interpolate_color(colors: &[Color; 3], bary: Vec3) -> Color {
  let v = Vec4::from_array(colors[0].to_array()) * bary.x
    + Vec4::from_array(colors[1].to_array()) * bary.y
    + Vec4::from_array(colors[2].to_array()) * bary.z;
  Color::from_array(v.to_array())
}
