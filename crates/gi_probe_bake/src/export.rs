//! Bake results and their persisted form.
//!
//! [`BakeResult`] is what the backend receives: flat little-endian byte
//! arrays plus the metadata needed to address them. [`ProbeRecord`] is the
//! serialized probe resource (JSON via `serde_json`).

use glam::Affine3A;
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::constants::{DATA_CELL_BYTES, MAX_DEPTH, OCTREE_CELL_BYTES, SUBDIV_DEPTHS};
use crate::error::BakeError;
use crate::grid::BakeGrid;
use crate::octree::{DataCell, OctreeCell, SparseOctree};
use crate::types::ProbeTunables;

/// Keys a persisted record must carry before it is decoded.
pub const REQUIRED_KEYS: [&str; 6] = [
  "bounds",
  "octree_size",
  "octree_cells",
  "octree_data",
  "level_counts",
  "to_cell_xform",
];

/// Exported output of one bake.
#[derive(Clone, Debug, PartialEq)]
pub struct BakeResult {
  /// Probe box in probe-local space.
  pub bounds: Aabb,
  /// Cell count per axis.
  pub octree_size: [u32; 3],
  /// [`OctreeCell`] array, 16 bytes per node.
  pub octree_cells: Vec<u8>,
  /// [`DataCell`] array, 16 bytes per leaf.
  pub data_cells: Vec<u8>,
  /// Node count per level, index = level.
  pub level_counts: Vec<u32>,
  /// Probe-local space to cell space.
  pub to_cell_xform: Affine3A,
}

impl BakeResult {
  pub fn new(grid: &BakeGrid, octree: &SparseOctree) -> Self {
    let _span = tracing::info_span!("export").entered();
    Self {
      bounds: grid.bounds,
      octree_size: grid.size,
      octree_cells: bytemuck::cast_slice(&octree.nodes).to_vec(),
      data_cells: bytemuck::cast_slice(&octree.data).to_vec(),
      level_counts: octree.level_counts.clone(),
      to_cell_xform: grid.to_cell,
    }
  }

  pub fn node_count(&self) -> usize {
    self.octree_cells.len() / OCTREE_CELL_BYTES
  }

  pub fn data_cell_count(&self) -> usize {
    self.data_cells.len() / DATA_CELL_BYTES
  }

  /// Decoded copy of the node array.
  pub fn nodes(&self) -> Vec<OctreeCell> {
    self
      .octree_cells
      .chunks_exact(OCTREE_CELL_BYTES)
      .map(bytemuck::pod_read_unaligned)
      .collect()
  }

  /// Decoded copy of the leaf data array.
  pub fn data(&self) -> Vec<DataCell> {
    self
      .data_cells
      .chunks_exact(DATA_CELL_BYTES)
      .map(bytemuck::pod_read_unaligned)
      .collect()
  }
}

/// Persisted probe resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProbeRecord {
  pub bounds: Aabb,
  pub octree_size: [u32; 3],
  pub octree_cells: Vec<u8>,
  pub octree_data: Vec<u8>,
  pub level_counts: Vec<u32>,
  /// Column-major affine (3x3 basis then translation).
  pub to_cell_xform: [f32; 12],
  #[serde(flatten)]
  pub tunables: ProbeTunables,
}

impl ProbeRecord {
  pub fn new(result: &BakeResult, tunables: ProbeTunables) -> Self {
    Self {
      bounds: result.bounds,
      octree_size: result.octree_size,
      octree_cells: result.octree_cells.clone(),
      octree_data: result.data_cells.clone(),
      level_counts: result.level_counts.clone(),
      to_cell_xform: result.to_cell_xform.to_cols_array(),
      tunables,
    }
  }

  /// Bake payload carried by this record.
  pub fn bake_result(&self) -> BakeResult {
    BakeResult {
      bounds: self.bounds,
      octree_size: self.octree_size,
      octree_cells: self.octree_cells.clone(),
      data_cells: self.octree_data.clone(),
      level_counts: self.level_counts.clone(),
      to_cell_xform: Affine3A::from_cols_array(&self.to_cell_xform),
    }
  }

  /// Parse and validate a JSON record.
  ///
  /// Required keys are checked before decoding so a missing key reports
  /// its name instead of a generic parse error.
  pub fn from_json(json: &str) -> Result<Self, BakeError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let Some(object) = value.as_object() else {
      return Err(BakeError::InvalidRecord("expected a JSON object".into()));
    };
    if let Some(key) = REQUIRED_KEYS.iter().find(|k| !object.contains_key(**k)) {
      return Err(BakeError::MissingKey(*key));
    }

    let record: ProbeRecord = serde_json::from_value(value)?;
    record.validate()?;
    Ok(record)
  }

  pub fn to_json(&self) -> Result<String, BakeError> {
    Ok(serde_json::to_string(self)?)
  }

  pub fn to_json_pretty(&self) -> Result<String, BakeError> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Check that sizes and counts describe one consistent octree.
  pub fn validate(&self) -> Result<(), BakeError> {
    let invalid = |msg: String| Err(BakeError::InvalidRecord(msg));

    let levels = self.level_counts.len() as u32;
    if !SUBDIV_DEPTHS.iter().any(|&d| d + 1 == levels) {
      return invalid(format!(
        "level_counts has {} entries, expected {}..={}",
        levels,
        SUBDIV_DEPTHS[0] + 1,
        MAX_DEPTH + 1
      ));
    }
    if self.octree_cells.len() % OCTREE_CELL_BYTES != 0 {
      return invalid(format!(
        "octree_cells length {} is not a multiple of {}",
        self.octree_cells.len(),
        OCTREE_CELL_BYTES
      ));
    }
    if self.octree_data.len() % DATA_CELL_BYTES != 0 {
      return invalid(format!(
        "octree_data length {} is not a multiple of {}",
        self.octree_data.len(),
        DATA_CELL_BYTES
      ));
    }

    let nodes: u64 = self.level_counts.iter().map(|&c| c as u64).sum();
    if nodes as usize * OCTREE_CELL_BYTES != self.octree_cells.len() {
      return invalid(format!(
        "level_counts sum to {} nodes but octree_cells holds {}",
        nodes,
        self.octree_cells.len() / OCTREE_CELL_BYTES
      ));
    }
    let leaves = self.level_counts.last().copied().unwrap_or(0) as usize;
    if leaves * DATA_CELL_BYTES != self.octree_data.len() {
      return invalid(format!(
        "finest level has {} nodes but octree_data holds {} cells",
        leaves,
        self.octree_data.len() / DATA_CELL_BYTES
      ));
    }

    let resolution = 1u32 << (levels - 1);
    if self.octree_size.iter().any(|&s| s == 0 || s > resolution) {
      return invalid(format!(
        "octree_size {:?} exceeds resolution {}",
        self.octree_size, resolution
      ));
    }
    if !self.bounds.is_valid() {
      return invalid("bounds min exceeds max".into());
    }
    Ok(())
  }
}

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;
