//! Rendering backend seam.
//!
//! A probe resource lives on the backend behind an opaque [`ProbeHandle`].
//! Backends are shared (`Arc<B>`) and take `&self`, so implementations keep
//! their state behind interior mutability.
//!
//! Freeing a handle twice or using it after free is a contract violation and
//! [`MemoryBackend`] panics on it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::Affine3A;

use crate::bounds::Aabb;
use crate::types::ProbeTunables;

/// Opaque backend resource id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProbeHandle(pub u64);

/// Probe storage operations a renderer has to provide.
pub trait RenderBackend: Send + Sync {
  /// Create an empty probe resource.
  fn probe_create(&self) -> ProbeHandle;

  /// Replace the probe's baked payload.
  #[allow(clippy::too_many_arguments)]
  fn probe_allocate(
    &self,
    probe: ProbeHandle,
    to_cell_xform: Affine3A,
    bounds: Aabb,
    octree_size: [u32; 3],
    octree_cells: &[u8],
    data_cells: &[u8],
    level_counts: &[u32],
  );

  fn probe_bounds(&self, probe: ProbeHandle) -> Aabb;
  fn probe_octree_size(&self, probe: ProbeHandle) -> [u32; 3];
  fn probe_to_cell_xform(&self, probe: ProbeHandle) -> Affine3A;
  fn probe_octree_cells(&self, probe: ProbeHandle) -> Vec<u8>;
  fn probe_data_cells(&self, probe: ProbeHandle) -> Vec<u8>;
  fn probe_level_counts(&self, probe: ProbeHandle) -> Vec<u32>;

  fn probe_set_dynamic_range(&self, probe: ProbeHandle, range: f32);
  fn probe_set_energy(&self, probe: ProbeHandle, energy: f32);
  fn probe_set_bias(&self, probe: ProbeHandle, bias: f32);
  fn probe_set_normal_bias(&self, probe: ProbeHandle, bias: f32);
  fn probe_set_propagation(&self, probe: ProbeHandle, propagation: f32);
  fn probe_set_anisotropy_strength(&self, probe: ProbeHandle, strength: f32);
  fn probe_set_interior(&self, probe: ProbeHandle, interior: bool);
  fn probe_set_use_two_bounces(&self, probe: ProbeHandle, enable: bool);

  /// Release the resource. The handle is invalid afterwards.
  fn free(&self, probe: ProbeHandle);

  /// Whether the active renderer can display GI probes at all.
  fn supports_gi_probes(&self) -> bool {
    true
  }
}

/// Backend-side copy of one probe.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoredProbe {
  pub to_cell_xform: Affine3A,
  pub bounds: Aabb,
  pub octree_size: [u32; 3],
  pub octree_cells: Vec<u8>,
  pub data_cells: Vec<u8>,
  pub level_counts: Vec<u32>,
  pub tunables: ProbeTunables,
  /// Number of `probe_allocate` calls received.
  pub allocations: usize,
}

#[derive(Default)]
struct MemoryState {
  next_id: u64,
  probes: HashMap<ProbeHandle, StoredProbe>,
}

/// In-process backend that keeps probe payloads in memory.
pub struct MemoryBackend {
  state: Mutex<MemoryState>,
  gi_probes_supported: AtomicBool,
}

impl Default for MemoryBackend {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryBackend {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(MemoryState::default()),
      gi_probes_supported: AtomicBool::new(true),
    }
  }

  /// Simulate a renderer without GI probe support.
  pub fn set_gi_probes_supported(&self, supported: bool) {
    self.gi_probes_supported.store(supported, Ordering::Relaxed);
  }

  /// Number of live probe resources.
  pub fn live_probes(&self) -> usize {
    self.state().probes.len()
  }

  /// Whether `probe` has been created and not yet freed.
  pub fn is_live(&self, probe: ProbeHandle) -> bool {
    self.state().probes.contains_key(&probe)
  }

  /// Snapshot of a live probe.
  pub fn stored(&self, probe: ProbeHandle) -> StoredProbe {
    self.with_probe(probe, |p| p.clone())
  }

  fn state(&self) -> MutexGuard<'_, MemoryState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn with_probe<R>(&self, probe: ProbeHandle, f: impl FnOnce(&mut StoredProbe) -> R) -> R {
    let mut state = self.state();
    match state.probes.get_mut(&probe) {
      Some(stored) => f(stored),
      None => panic!("use of freed or unknown probe handle {:?}", probe),
    }
  }
}

impl RenderBackend for MemoryBackend {
  fn probe_create(&self) -> ProbeHandle {
    let mut state = self.state();
    state.next_id += 1;
    let handle = ProbeHandle(state.next_id);
    state.probes.insert(handle, StoredProbe::default());
    handle
  }

  fn probe_allocate(
    &self,
    probe: ProbeHandle,
    to_cell_xform: Affine3A,
    bounds: Aabb,
    octree_size: [u32; 3],
    octree_cells: &[u8],
    data_cells: &[u8],
    level_counts: &[u32],
  ) {
    self.with_probe(probe, |p| {
      p.to_cell_xform = to_cell_xform;
      p.bounds = bounds;
      p.octree_size = octree_size;
      p.octree_cells = octree_cells.to_vec();
      p.data_cells = data_cells.to_vec();
      p.level_counts = level_counts.to_vec();
      p.allocations += 1;
    });
  }

  fn probe_bounds(&self, probe: ProbeHandle) -> Aabb {
    self.with_probe(probe, |p| p.bounds)
  }

  fn probe_octree_size(&self, probe: ProbeHandle) -> [u32; 3] {
    self.with_probe(probe, |p| p.octree_size)
  }

  fn probe_to_cell_xform(&self, probe: ProbeHandle) -> Affine3A {
    self.with_probe(probe, |p| p.to_cell_xform)
  }

  fn probe_octree_cells(&self, probe: ProbeHandle) -> Vec<u8> {
    self.with_probe(probe, |p| p.octree_cells.clone())
  }

  fn probe_data_cells(&self, probe: ProbeHandle) -> Vec<u8> {
    self.with_probe(probe, |p| p.data_cells.clone())
  }

  fn probe_level_counts(&self, probe: ProbeHandle) -> Vec<u32> {
    self.with_probe(probe, |p| p.level_counts.clone())
  }

  fn probe_set_dynamic_range(&self, probe: ProbeHandle, range: f32) {
    self.with_probe(probe, |p| p.tunables.dynamic_range = range);
  }

  fn probe_set_energy(&self, probe: ProbeHandle, energy: f32) {
    self.with_probe(probe, |p| p.tunables.energy = energy);
  }

  fn probe_set_bias(&self, probe: ProbeHandle, bias: f32) {
    self.with_probe(probe, |p| p.tunables.bias = bias);
  }

  fn probe_set_normal_bias(&self, probe: ProbeHandle, bias: f32) {
    self.with_probe(probe, |p| p.tunables.normal_bias = bias);
  }

  fn probe_set_propagation(&self, probe: ProbeHandle, propagation: f32) {
    self.with_probe(probe, |p| p.tunables.propagation = propagation);
  }

  fn probe_set_anisotropy_strength(&self, probe: ProbeHandle, strength: f32) {
    self.with_probe(probe, |p| p.tunables.anisotropy_strength = strength);
  }

  fn probe_set_interior(&self, probe: ProbeHandle, interior: bool) {
    self.with_probe(probe, |p| p.tunables.interior = interior);
  }

  fn probe_set_use_two_bounces(&self, probe: ProbeHandle, enable: bool) {
    self.with_probe(probe, |p| p.tunables.use_two_bounces = enable);
  }

  fn free(&self, probe: ProbeHandle) {
    if self.state().probes.remove(&probe).is_none() {
      panic!("double free of probe handle {:?}", probe);
    }
  }

  fn supports_gi_probes(&self) -> bool {
    self.gi_probes_supported.load(Ordering::Relaxed)
  }
}
