//! ProbeData - baked probe resource living on a rendering backend.
//!
//! Owns exactly one backend handle: created in [`ProbeData::new`], freed on
//! drop. Baked arrays are read back from the backend on demand; metadata and
//! tunables are cached locally and forwarded on every change.

use std::sync::Arc;

use glam::{Affine3A, Vec3};

use crate::backend::{ProbeHandle, RenderBackend};
use crate::bounds::Aabb;
use crate::error::BakeError;
use crate::export::{BakeResult, ProbeRecord};
use crate::types::ProbeTunables;

pub struct ProbeData<B: RenderBackend> {
  backend: Arc<B>,
  handle: ProbeHandle,
  bounds: Aabb,
  octree_size: [u32; 3],
  to_cell_xform: Affine3A,
  tunables: ProbeTunables,
}

impl<B: RenderBackend> ProbeData<B> {
  /// Create an empty resource with default tunables.
  pub fn new(backend: Arc<B>) -> Self {
    let handle = backend.probe_create();
    let data = Self {
      backend,
      handle,
      bounds: Aabb::new(Vec3::ZERO, Vec3::ZERO),
      octree_size: [0; 3],
      to_cell_xform: Affine3A::IDENTITY,
      tunables: ProbeTunables::default(),
    };
    data.push_tunables();
    data
  }

  /// Rebuild a resource from its persisted form.
  pub fn from_record(backend: Arc<B>, record: &ProbeRecord) -> Result<Self, BakeError> {
    record.validate()?;
    let mut data = Self::new(backend);
    data.allocate_result(&record.bake_result());
    data.set_tunables(record.tunables);
    Ok(data)
  }

  /// Parse a JSON record and rebuild the resource from it.
  pub fn from_json(backend: Arc<B>, json: &str) -> Result<Self, BakeError> {
    let record = ProbeRecord::from_json(json)?;
    Self::from_record(backend, &record)
  }

  /// Upload baked arrays to the backend and cache their metadata.
  pub fn allocate(
    &mut self,
    to_cell_xform: Affine3A,
    bounds: Aabb,
    octree_size: [u32; 3],
    octree_cells: &[u8],
    data_cells: &[u8],
    level_counts: &[u32],
  ) {
    self.backend.probe_allocate(
      self.handle,
      to_cell_xform,
      bounds,
      octree_size,
      octree_cells,
      data_cells,
      level_counts,
    );
    self.bounds = bounds;
    self.octree_size = octree_size;
    self.to_cell_xform = to_cell_xform;
  }

  pub fn allocate_result(&mut self, result: &BakeResult) {
    self.allocate(
      result.to_cell_xform,
      result.bounds,
      result.octree_size,
      &result.octree_cells,
      &result.data_cells,
      &result.level_counts,
    );
  }

  /// Persisted form, with arrays read back from the backend.
  pub fn to_record(&self) -> ProbeRecord {
    ProbeRecord {
      bounds: self.bounds,
      octree_size: self.octree_size,
      octree_cells: self.octree_cells(),
      octree_data: self.data_cells(),
      level_counts: self.level_counts(),
      to_cell_xform: self.to_cell_xform.to_cols_array(),
      tunables: self.tunables,
    }
  }

  pub fn handle(&self) -> ProbeHandle {
    self.handle
  }

  pub fn backend(&self) -> &Arc<B> {
    &self.backend
  }

  pub fn bounds(&self) -> Aabb {
    self.bounds
  }

  pub fn octree_size(&self) -> [u32; 3] {
    self.octree_size
  }

  pub fn to_cell_xform(&self) -> Affine3A {
    self.to_cell_xform
  }

  pub fn octree_cells(&self) -> Vec<u8> {
    self.backend.probe_octree_cells(self.handle)
  }

  pub fn data_cells(&self) -> Vec<u8> {
    self.backend.probe_data_cells(self.handle)
  }

  pub fn level_counts(&self) -> Vec<u32> {
    self.backend.probe_level_counts(self.handle)
  }

  // -- tunables --

  pub fn tunables(&self) -> ProbeTunables {
    self.tunables
  }

  pub fn set_tunables(&mut self, tunables: ProbeTunables) {
    self.tunables = tunables;
    self.push_tunables();
  }

  fn push_tunables(&self) {
    let t = &self.tunables;
    let backend = &self.backend;
    backend.probe_set_dynamic_range(self.handle, t.dynamic_range);
    backend.probe_set_energy(self.handle, t.energy);
    backend.probe_set_bias(self.handle, t.bias);
    backend.probe_set_normal_bias(self.handle, t.normal_bias);
    backend.probe_set_propagation(self.handle, t.propagation);
    backend.probe_set_anisotropy_strength(self.handle, t.anisotropy_strength);
    backend.probe_set_interior(self.handle, t.interior);
    backend.probe_set_use_two_bounces(self.handle, t.use_two_bounces);
  }

  pub fn dynamic_range(&self) -> f32 {
    self.tunables.dynamic_range
  }

  pub fn set_dynamic_range(&mut self, range: f32) {
    self.backend.probe_set_dynamic_range(self.handle, range);
    self.tunables.dynamic_range = range;
  }

  pub fn energy(&self) -> f32 {
    self.tunables.energy
  }

  pub fn set_energy(&mut self, energy: f32) {
    self.backend.probe_set_energy(self.handle, energy);
    self.tunables.energy = energy;
  }

  pub fn bias(&self) -> f32 {
    self.tunables.bias
  }

  pub fn set_bias(&mut self, bias: f32) {
    self.backend.probe_set_bias(self.handle, bias);
    self.tunables.bias = bias;
  }

  pub fn normal_bias(&self) -> f32 {
    self.tunables.normal_bias
  }

  pub fn set_normal_bias(&mut self, bias: f32) {
    self.backend.probe_set_normal_bias(self.handle, bias);
    self.tunables.normal_bias = bias;
  }

  pub fn propagation(&self) -> f32 {
    self.tunables.propagation
  }

  pub fn set_propagation(&mut self, propagation: f32) {
    self.backend.probe_set_propagation(self.handle, propagation);
    self.tunables.propagation = propagation;
  }

  pub fn anisotropy_strength(&self) -> f32 {
    self.tunables.anisotropy_strength
  }

  pub fn set_anisotropy_strength(&mut self, strength: f32) {
    self.backend.probe_set_anisotropy_strength(self.handle, strength);
    self.tunables.anisotropy_strength = strength;
  }

  pub fn is_interior(&self) -> bool {
    self.tunables.interior
  }

  pub fn set_interior(&mut self, interior: bool) {
    self.backend.probe_set_interior(self.handle, interior);
    self.tunables.interior = interior;
  }

  pub fn is_using_two_bounces(&self) -> bool {
    self.tunables.use_two_bounces
  }

  pub fn set_use_two_bounces(&mut self, enable: bool) {
    self.backend.probe_set_use_two_bounces(self.handle, enable);
    self.tunables.use_two_bounces = enable;
  }
}

impl<B: RenderBackend> Drop for ProbeData<B> {
  fn drop(&mut self) {
    self.backend.free(self.handle);
  }
}

impl<B: RenderBackend> std::fmt::Debug for ProbeData<B> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ProbeData")
      .field("handle", &self.handle)
      .field("bounds", &self.bounds)
      .field("octree_size", &self.octree_size)
      .field("tunables", &self.tunables)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::backend::MemoryBackend;

  fn sample_record() -> ProbeRecord {
    // One leaf at cell (0, 0, 0) of a depth-6 tree: 7 nodes, 1 data cell
    ProbeRecord {
      bounds: Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE),
      octree_size: [64, 64, 64],
      octree_cells: vec![0; 7 * 16],
      octree_data: vec![0; 16],
      level_counts: vec![1; 7],
      to_cell_xform: Affine3A::from_scale(Vec3::splat(32.0)).to_cols_array(),
      tunables: ProbeTunables {
        energy: 2.0,
        ..Default::default()
      },
    }
  }

  #[test]
  fn test_new_pushes_default_tunables() {
    let backend = Arc::new(MemoryBackend::new());
    let data = ProbeData::new(backend.clone());
    assert_eq!(backend.stored(data.handle()).tunables, ProbeTunables::default());
  }

  #[test]
  fn test_drop_frees_handle_once() {
    let backend = Arc::new(MemoryBackend::new());
    let data = ProbeData::new(backend.clone());
    let handle = data.handle();
    assert!(backend.is_live(handle));
    drop(data);
    assert!(!backend.is_live(handle));
    assert_eq!(backend.live_probes(), 0);
  }

  #[test]
  fn test_setters_forward_to_backend() {
    let backend = Arc::new(MemoryBackend::new());
    let mut data = ProbeData::new(backend.clone());
    data.set_dynamic_range(8.0);
    data.set_propagation(0.25);
    data.set_use_two_bounces(false);

    let stored = backend.stored(data.handle()).tunables;
    assert_eq!(stored.dynamic_range, 8.0);
    assert_eq!(stored.propagation, 0.25);
    assert!(!stored.use_two_bounces);
    assert_eq!(data.tunables(), stored);
  }

  #[test]
  fn test_record_roundtrip_through_backend() {
    let backend = Arc::new(MemoryBackend::new());
    let record = sample_record();
    let data = ProbeData::from_record(backend.clone(), &record).unwrap();

    assert_eq!(data.octree_size(), [64, 64, 64]);
    assert_eq!(data.level_counts(), vec![1; 7]);
    assert_eq!(data.energy(), 2.0);
    assert_eq!(data.to_record(), record);
    assert_eq!(backend.stored(data.handle()).allocations, 1);
  }

  #[test]
  fn test_invalid_record_allocates_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    let mut record = sample_record();
    record.octree_data.clear();
    let err = ProbeData::from_record(backend.clone(), &record).unwrap_err();
    assert!(matches!(err, BakeError::InvalidRecord(_)));
    assert_eq!(backend.live_probes(), 0);
  }

  #[test]
  fn test_from_json_reports_missing_key() {
    let backend = Arc::new(MemoryBackend::new());
    let mut value = serde_json::to_value(sample_record()).unwrap();
    value.as_object_mut().unwrap().remove("level_counts");
    let err = ProbeData::from_json(backend, &value.to_string()).unwrap_err();
    assert!(matches!(err, BakeError::MissingKey("level_counts")));
  }
}
