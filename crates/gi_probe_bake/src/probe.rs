//! GiProbe - the bake driver.
//!
//! ```text
//! bake(scene, from_node, create_debug, observer)
//!   ├─ validate extents, resolve root            (BakeError, nothing mutated)
//!   ├─ collect PlotMeshes                         collector::find_meshes
//!   ├─ begin(n + 1), plot each mesh, step(i)      Voxelizer
//!   ├─ step(n, "Finishing Plot"), finish
//!   ├─ create_debug ? DebugMultiMesh
//!   │               : SparseOctree ─► BakeResult ─► ProbeData::allocate
//!   └─ end()
//! ```

use std::sync::Arc;

use glam::{Affine3A, Vec3};
use web_time::Instant;

use crate::backend::RenderBackend;
use crate::bounds::Aabb;
use crate::collector::find_meshes;
use crate::debug_mesh::DebugMultiMesh;
use crate::error::BakeError;
use crate::export::BakeResult;
use crate::octree::SparseOctree;
use crate::probe_data::ProbeData;
use crate::progress::BakeObserver;
use crate::scene::SceneNode;
use crate::stats::BakeStats;
use crate::types::Subdiv;
use crate::voxelizer::Voxelizer;

/// Default probe half size.
pub const DEFAULT_EXTENTS: Vec3 = Vec3::splat(10.0);

/// What a bake produced.
#[derive(Debug)]
pub enum BakeOutcome {
  /// Baked data was uploaded to the probe's [`ProbeData`].
  Allocated { stats: BakeStats },
  /// Debug visualization was built instead of probe data.
  Debug {
    multimesh: DebugMultiMesh,
    stats: BakeStats,
  },
}

impl BakeOutcome {
  pub fn stats(&self) -> &BakeStats {
    match self {
      BakeOutcome::Allocated { stats } => stats,
      BakeOutcome::Debug { stats, .. } => stats,
    }
  }
}

/// A GI probe volume and its baked data.
pub struct GiProbe<B: RenderBackend> {
  backend: Arc<B>,
  extents: Vec3,
  subdiv: Subdiv,
  /// Global transform of the probe.
  transform: Affine3A,
  probe_data: Option<ProbeData<B>>,
}

impl<B: RenderBackend> GiProbe<B> {
  pub fn new(backend: Arc<B>) -> Self {
    Self {
      backend,
      extents: DEFAULT_EXTENTS,
      subdiv: Subdiv::default(),
      transform: Affine3A::IDENTITY,
      probe_data: None,
    }
  }

  pub fn with_extents(mut self, extents: Vec3) -> Self {
    self.extents = extents;
    self
  }

  pub fn with_subdiv(mut self, subdiv: Subdiv) -> Self {
    self.subdiv = subdiv;
    self
  }

  pub fn with_transform(mut self, transform: Affine3A) -> Self {
    self.transform = transform;
    self
  }

  pub fn extents(&self) -> Vec3 {
    self.extents
  }

  /// Takes effect at the next bake.
  pub fn set_extents(&mut self, extents: Vec3) {
    self.extents = extents;
  }

  pub fn subdiv(&self) -> Subdiv {
    self.subdiv
  }

  pub fn set_subdiv(&mut self, subdiv: Subdiv) {
    self.subdiv = subdiv;
  }

  pub fn transform(&self) -> Affine3A {
    self.transform
  }

  pub fn set_transform(&mut self, transform: Affine3A) {
    self.transform = transform;
  }

  /// Probe volume in probe-local space.
  pub fn aabb(&self) -> Aabb {
    Aabb::from_center_half_extents(Vec3::ZERO, self.extents)
  }

  pub fn probe_data(&self) -> Option<&ProbeData<B>> {
    self.probe_data.as_ref()
  }

  pub fn probe_data_mut(&mut self) -> Option<&mut ProbeData<B>> {
    self.probe_data.as_mut()
  }

  /// Replace the baked data. The previous resource, if any, is freed.
  pub fn set_probe_data(&mut self, data: Option<ProbeData<B>>) {
    self.probe_data = data;
  }

  pub fn take_probe_data(&mut self) -> Option<ProbeData<B>> {
    self.probe_data.take()
  }

  /// Advisory message when the backend cannot display GI probes.
  pub fn configuration_warning(&self) -> Option<String> {
    if self.backend.supports_gi_probes() {
      return None;
    }
    Some(
      "GI probes are not supported by the active renderer; baked data will not be displayed. \
       Use baked lightmaps instead."
        .to_string(),
    )
  }

  /// Bake every contributing mesh under `scene` (or under the node named
  /// `from_node`) into this probe.
  ///
  /// `scene` is the tree the probe lives in, with the probe's global
  /// transform given by [`GiProbe::transform`]. Configuration errors are
  /// returned before any observer call or state change.
  pub fn bake(
    &mut self,
    scene: &SceneNode,
    from_node: Option<&str>,
    create_debug: bool,
    observer: &mut dyn BakeObserver,
  ) -> Result<BakeOutcome, BakeError> {
    let _span = tracing::info_span!("gi_probe_bake", subdiv = self.subdiv.resolution()).entered();

    let extents = self.extents;
    if !extents.is_finite() || extents.cmple(Vec3::ZERO).any() {
      return Err(BakeError::InvalidExtents(extents.to_array()));
    }
    let root = match from_node {
      Some(name) => scene
        .find(name)
        .ok_or_else(|| BakeError::UnknownRootNode(name.to_string()))?,
      None => scene.cursor(),
    };
    let mut voxelizer = Voxelizer::begin(self.subdiv, self.aabb())?;

    let start = Instant::now();
    let meshes = find_meshes(root, &self.transform, extents);
    let collect_us = start.elapsed().as_micros() as u64;

    let total = meshes.len();
    observer.begin(total + 1);

    let start = Instant::now();
    for (i, plot) in meshes.iter().enumerate() {
      observer.step(i, &format!("Plotting Meshes {}/{}", i, total));
      voxelizer.plot_mesh(plot);
    }
    observer.step(total, "Finishing Plot");
    let (voxels, mut stats) = voxelizer.finish();
    stats.collect_us = collect_us;
    stats.plot_us = start.elapsed().as_micros() as u64;

    let outcome = if create_debug {
      let start = Instant::now();
      let multimesh = DebugMultiMesh::build(&voxels);
      stats.export_us = start.elapsed().as_micros() as u64;
      BakeOutcome::Debug { multimesh, stats }
    } else {
      let start = Instant::now();
      let octree = SparseOctree::build(&voxels);
      stats.octree_nodes = octree.node_count();
      stats.octree_us = start.elapsed().as_micros() as u64;

      let start = Instant::now();
      let result = BakeResult::new(&voxels.grid, &octree);
      let backend = &self.backend;
      self
        .probe_data
        .get_or_insert_with(|| ProbeData::new(backend.clone()))
        .allocate_result(&result);
      stats.export_us = start.elapsed().as_micros() as u64;
      BakeOutcome::Allocated { stats }
    };

    observer.end();
    outcome.stats().log_summary();
    Ok(outcome)
  }

  /// Bake the whole scene into a debug visualization.
  pub fn debug_bake(&mut self, scene: &SceneNode) -> Result<BakeOutcome, BakeError> {
    self.bake(scene, None, true, &mut ())
  }
}

#[cfg(test)]
#[path = "probe_test.rs"]
mod probe_test;
