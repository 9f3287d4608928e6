//! gi_probe_bake - GI probe voxelization and sparse octree baking
//!
//! Turns the static geometry around a global-illumination probe into a
//! sparse voxel octree a renderer can upload. The pipeline runs once per
//! bake, synchronously, on the caller's thread:
//!
//! ```text
//! scene ──► collector ──► voxelizer ──► octree ──► export ──► ProbeData
//!          (PlotMesh)    (LeafCell)   (nodes)    (bytes)    (backend)
//!                             │
//!                             └──► debug_mesh (DebugMultiMesh)
//! ```
//!
//! # Features
//!
//! - **Conservative rasterization**: triangle/box separating axis test so
//!   thin and axis-aligned triangles mark every cell they touch
//! - **Area-weighted blending**: albedo, emission and normal averaged by the
//!   triangle area falling in each cell
//! - **Sparse octree**: Morton-sorted levels with contiguous siblings and
//!   relative child offsets
//! - **Backend seam**: probe data lives behind `RenderBackend`;
//!   `MemoryBackend` keeps it in process
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gi_probe_bake::{GiProbe, MemoryBackend, SceneNode, Subdiv};
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let mut probe = GiProbe::new(backend).with_subdiv(Subdiv::Subdiv64);
//! let outcome = probe.bake(&scene, None, false, &mut ())?;
//! let record = probe.probe_data().unwrap().to_record();
//! std::fs::write("probe.json", record.to_json()?)?;
//! ```

pub mod bounds;
pub mod constants;
pub mod error;
pub mod grid;
pub mod types;

pub use bounds::Aabb;
pub use error::{BakeError, MeshError};
pub use grid::BakeGrid;
pub use types::{Color, ProbeTunables, Subdiv};

// Scene collaborator model
pub mod scene;
pub use scene::{
  HasDynamicMeshes, HasStaticMesh, Material, Mesh, MeshInstance, MeshProvider, NodeKind,
  PrimitiveType, SceneNode, Surface,
};

// Pipeline stages
pub mod collector;
pub mod debug_mesh;
pub mod export;
pub mod octree;
pub mod voxelizer;

pub use collector::{find_meshes, PlotMesh};
pub use debug_mesh::{DebugInstance, DebugMultiMesh};
pub use export::{BakeResult, ProbeRecord};
pub use octree::{DataCell, OctreeCell, SparseOctree};
pub use voxelizer::{LeafCell, VoxelGrid, Voxelizer};

// Probe resource and driver
pub mod backend;
pub mod probe;
pub mod probe_data;
pub mod progress;
pub mod stats;

pub use backend::{MemoryBackend, ProbeHandle, RenderBackend};
pub use probe::{BakeOutcome, GiProbe};
pub use probe_data::ProbeData;
pub use progress::{BakeEvent, BakeObserver, ChannelObserver};
pub use stats::BakeStats;

#[cfg(test)]
mod test_utils;
