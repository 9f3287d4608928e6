use super::*;

#[test]
fn test_morton_origin_is_zero() {
  assert_eq!(morton_encode(0, 0, 0), 0);
}

#[test]
fn test_morton_unit_axes_match_octant_bits() {
  assert_eq!(morton_encode(1, 0, 0), 0b001);
  assert_eq!(morton_encode(0, 1, 0), 0b010);
  assert_eq!(morton_encode(0, 0, 1), 0b100);
}

#[test]
fn test_morton_octant_offsets_agree() {
  for (octant, offset) in OCTANT_OFFSETS.iter().enumerate() {
    assert_eq!(
      morton_encode(offset[0], offset[1], offset[2]),
      octant as u32,
      "Octant {} offset disagrees with its Morton code",
      octant
    );
    assert_eq!(octant_index(offset[0], offset[1], offset[2]) as usize, octant);
  }
}

#[test]
fn test_morton_decode_inverts_encode_at_max_depth() {
  let max = (1 << MAX_DEPTH) - 1;
  for &(x, y, z) in &[(0, 0, 0), (max, 0, 0), (0, max, 0), (0, 0, max), (max, max, max), (37, 300, 511)] {
    assert_eq!(morton_decode(morton_encode(x, y, z)), [x, y, z]);
  }
}

/// Parent code is code >> 3 and equals the Morton code of halved coordinates.
#[test]
fn test_morton_parent_is_shift() {
  let code = morton_encode(13, 6, 9);
  assert_eq!(code >> 3, morton_encode(6, 3, 4));
  assert_eq!(code & 7, octant_index(13, 6, 9) as u32);
}

#[test]
fn test_sides_all_covers_every_bit() {
  let combined = sides::POS_X | sides::NEG_X | sides::POS_Y | sides::NEG_Y | sides::POS_Z | sides::NEG_Z;
  assert_eq!(combined, sides::ALL);
}

#[test]
fn test_subdiv_depths_within_position_packing() {
  // Packed positions reserve 10 bits for Y (bits 11-20)
  for depth in SUBDIV_DEPTHS {
    assert!(depth <= MAX_DEPTH);
    assert!((1u32 << depth) - 1 < (1 << (POSITION_Z_SHIFT - POSITION_Y_SHIFT)));
  }
}
