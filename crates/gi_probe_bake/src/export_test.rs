use glam::{Affine3A, Vec3};

use super::*;
use crate::test_utils::*;
use crate::types::Subdiv;
use crate::voxelizer::Voxelizer;

fn baked_cube() -> (BakeResult, SparseOctree) {
  let mesh = crate::scene::primitives::box_mesh(Vec3::splat(0.3));
  let mut vox = Voxelizer::begin(Subdiv::Subdiv64, probe_bounds(Vec3::ONE)).unwrap();
  vox.plot_mesh(&plot(&mesh, Affine3A::IDENTITY));
  let (voxels, _) = vox.finish();
  let octree = SparseOctree::build(&voxels);
  (BakeResult::new(&voxels.grid, &octree), octree)
}

fn record_value(record: &ProbeRecord) -> serde_json::Value {
  serde_json::from_str(&record.to_json().unwrap()).unwrap()
}

// =========================================================================
// BakeResult
// =========================================================================

#[test]
fn test_bake_result_bytes_decode_to_octree() {
  let (result, octree) = baked_cube();
  assert_eq!(result.node_count(), octree.node_count());
  assert_eq!(result.data_cell_count(), octree.data.len());
  assert_eq!(result.nodes(), octree.nodes);
  assert_eq!(result.data(), octree.data);
  assert_eq!(result.octree_cells.len(), octree.node_count() * OCTREE_CELL_BYTES);
}

#[test]
fn test_reloaded_bytes_decode_cell_by_cell() {
  let (result, octree) = baked_cube();
  let json = ProbeRecord::new(&result, ProbeTunables::default()).to_json().unwrap();
  let reloaded = ProbeRecord::from_json(&json).unwrap().bake_result();

  let nodes = reloaded.nodes();
  assert_eq!(nodes.len(), octree.node_count());
  for (i, node) in nodes.iter().enumerate() {
    let bytes = &reloaded.octree_cells[i * OCTREE_CELL_BYTES..(i + 1) * OCTREE_CELL_BYTES];
    assert_eq!(bytemuck::bytes_of(node), bytes);
  }

  let data = reloaded.data();
  assert_eq!(data.len(), octree.data.len());
  assert_eq!(data.first(), octree.data.first());
  assert_eq!(data.last(), octree.data.last());
}

#[test]
fn test_trailing_partial_cell_is_not_decoded() {
  let (mut result, octree) = baked_cube();
  result.octree_cells.extend_from_slice(&[0xAB; 5]);
  result.data_cells.push(0xCD);
  assert_eq!(result.nodes(), octree.nodes);
  assert_eq!(result.data(), octree.data);
}

// =========================================================================
// ProbeRecord
// =========================================================================

#[test]
fn test_record_json_roundtrip() {
  let (result, _) = baked_cube();
  let tunables = ProbeTunables {
    energy: 2.5,
    interior: true,
    ..Default::default()
  };
  let record = ProbeRecord::new(&result, tunables);

  let back = ProbeRecord::from_json(&record.to_json().unwrap()).unwrap();
  assert_eq!(back, record);
  assert_eq!(back.bake_result(), result);
  assert_eq!(back.tunables.energy, 2.5);
  assert!(back.tunables.interior);
}

#[test]
fn test_each_missing_key_is_reported() {
  let (result, _) = baked_cube();
  let record = ProbeRecord::new(&result, ProbeTunables::default());

  for key in REQUIRED_KEYS {
    let mut value = record_value(&record);
    value.as_object_mut().unwrap().remove(key);
    let err = ProbeRecord::from_json(&value.to_string()).unwrap_err();
    assert!(
      matches!(err, BakeError::MissingKey(k) if k == key),
      "expected MissingKey({}), got {:?}",
      key,
      err
    );
  }
}

#[test]
fn test_missing_tunables_fall_back_to_defaults() {
  let (result, _) = baked_cube();
  let record = ProbeRecord::new(&result, ProbeTunables::default());
  let mut value = record_value(&record);
  let object = value.as_object_mut().unwrap();
  object.remove("energy");
  object.remove("propagation");

  let back = ProbeRecord::from_json(&value.to_string()).unwrap();
  assert_eq!(back.tunables, ProbeTunables::default());
}

#[test]
fn test_inconsistent_level_counts_are_rejected() {
  let (result, _) = baked_cube();
  let mut record = ProbeRecord::new(&result, ProbeTunables::default());
  record.level_counts[1] += 1;
  let err = ProbeRecord::from_json(&record.to_json().unwrap()).unwrap_err();
  assert!(matches!(err, BakeError::InvalidRecord(_)), "{:?}", err);
}

#[test]
fn test_truncated_cells_are_rejected() {
  let (result, _) = baked_cube();
  let mut record = ProbeRecord::new(&result, ProbeTunables::default());
  record.octree_data.pop();
  assert!(matches!(record.validate(), Err(BakeError::InvalidRecord(_))));
}

#[test]
fn test_unsupported_depth_is_rejected() {
  let (result, _) = baked_cube();
  let mut record = ProbeRecord::new(&result, ProbeTunables::default());
  record.level_counts.insert(0, 0);
  record.level_counts.insert(0, 0);
  record.level_counts.insert(0, 0);
  record.level_counts.insert(0, 0);
  assert!(matches!(record.validate(), Err(BakeError::InvalidRecord(_))));
}

#[test]
fn test_non_object_and_garbage_input() {
  assert!(matches!(
    ProbeRecord::from_json("[1, 2, 3]"),
    Err(BakeError::InvalidRecord(_))
  ));
  assert!(matches!(ProbeRecord::from_json("{not json"), Err(BakeError::Json(_))));
}

#[test]
fn test_empty_bake_record_is_valid() {
  let mut vox = Voxelizer::begin(Subdiv::Subdiv64, probe_bounds(Vec3::ONE)).unwrap();
  let mesh = one_cell_triangle();
  vox.plot_mesh(&plot(&mesh, Affine3A::from_translation(Vec3::splat(10.0))));
  let (voxels, _) = vox.finish();
  let result = BakeResult::new(&voxels.grid, &SparseOctree::build(&voxels));

  let record = ProbeRecord::new(&result, ProbeTunables::default());
  let back = ProbeRecord::from_json(&record.to_json().unwrap()).unwrap();
  assert!(back.octree_cells.is_empty());
  assert_eq!(back.level_counts, vec![0; 7]);
}
