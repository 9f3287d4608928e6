//! Conservative triangle rasterization in cell space.
//!
//! A cell is touched when the triangle intersects its closed box, decided by
//! the separating axis test over 13 axes (3 box normals, the triangle
//! normal, and 9 edge cross products). The box is grown by [`CELL_EPSILON`]
//! so triangles lying exactly on cell faces touch both neighbours.
//!
//! Candidate cells are found by recursively halving the triangle's cell
//! range and discarding sub-ranges whose box misses the triangle, so large
//! triangles cost roughly O(touched cells) tests instead of O(range volume).

use glam::Vec3;
use smallvec::SmallVec;

/// Box inflation applied to every overlap test, in cells.
pub const CELL_EPSILON: f32 = 1e-4;

/// Twice-area threshold below which a triangle is treated as degenerate.
pub const DEGENERATE_AREA: f32 = 1e-10;

/// Touched cells of one triangle.
pub type CellList = SmallVec<[[u32; 3]; 32]>;

/// Separating axis test of a triangle against a box.
#[inline]
fn axis_separates(axis: Vec3, v0: Vec3, v1: Vec3, v2: Vec3, half: Vec3) -> bool {
  let p0 = v0.dot(axis);
  let p1 = v1.dot(axis);
  let p2 = v2.dot(axis);
  let r = half.dot(axis.abs());
  p0.min(p1).min(p2) > r || p0.max(p1).max(p2) < -r
}

/// Whether triangle `tri` intersects the box at `center` with half size `half`.
pub fn triangle_box_overlap(center: Vec3, half: Vec3, tri: &[Vec3; 3]) -> bool {
  let v0 = tri[0] - center;
  let v1 = tri[1] - center;
  let v2 = tri[2] - center;

  // Box face normals: triangle AABB against box
  let tri_min = v0.min(v1).min(v2);
  let tri_max = v0.max(v1).max(v2);
  if tri_min.cmpgt(half).any() || tri_max.cmplt(-half).any() {
    return false;
  }

  // Triangle plane
  let e0 = v1 - v0;
  let e1 = v2 - v1;
  let e2 = v0 - v2;
  let normal = e0.cross(e1);
  let d = normal.dot(v0);
  let r = half.dot(normal.abs());
  if d.abs() > r {
    return false;
  }

  // Edge cross products
  for edge in [e0, e1, e2] {
    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
      let a = axis.cross(edge);
      if a.length_squared() > 0.0 && axis_separates(a, v0, v1, v2, half) {
        return false;
      }
    }
  }

  true
}

/// Twice the area of a triangle.
#[inline]
pub fn double_area(tri: &[Vec3; 3]) -> f32 {
  (tri[1] - tri[0]).cross(tri[2] - tri[0]).length()
}

/// Collect every grid cell a cell-space triangle touches.
///
/// `grid_size` clips the result; cells outside `[0, size)` are never
/// reported. Degenerate triangles touch nothing. Cells are reported in a
/// deterministic order for a given triangle.
pub fn rasterize_triangle(tri: &[Vec3; 3], grid_size: [u32; 3], out: &mut CellList) {
  out.clear();
  if double_area(tri) <= DEGENERATE_AREA {
    return;
  }

  let raw_min = tri[0].min(tri[1]).min(tri[2]);
  let raw_max = tri[0].max(tri[1]).max(tri[2]);
  let tri_min = raw_min - Vec3::splat(CELL_EPSILON);
  let tri_max = raw_max + Vec3::splat(CELL_EPSILON);

  let mut lo = [0u32; 3];
  let mut hi = [0u32; 3];
  for axis in 0..3 {
    // Cells are half-open, so the far grid face belongs to no cell
    let size = grid_size[axis] as f32;
    if raw_max[axis] < 0.0 || raw_min[axis] >= size {
      return;
    }
    lo[axis] = tri_min[axis].floor().max(0.0) as u32;
    hi[axis] = (tri_max[axis].floor() as u32).min(grid_size[axis] - 1);
  }

  subdivide(tri, lo, hi, out);
}

/// Recursively split the inclusive cell range `[lo, hi]` along its longest
/// axis, keeping only ranges whose box overlaps the triangle.
fn subdivide(tri: &[Vec3; 3], lo: [u32; 3], hi: [u32; 3], out: &mut CellList) {
  let min = Vec3::new(lo[0] as f32, lo[1] as f32, lo[2] as f32);
  let max = Vec3::new(hi[0] as f32, hi[1] as f32, hi[2] as f32) + Vec3::ONE;
  let half = (max - min) * 0.5 + Vec3::splat(CELL_EPSILON);
  if !triangle_box_overlap((min + max) * 0.5, half, tri) {
    return;
  }

  let extent = [hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]];
  if extent == [0, 0, 0] {
    out.push(lo);
    return;
  }

  let axis = if extent[0] >= extent[1] && extent[0] >= extent[2] {
    0
  } else if extent[1] >= extent[2] {
    1
  } else {
    2
  };
  let mid = lo[axis] + extent[axis] / 2;

  let mut first_hi = hi;
  first_hi[axis] = mid;
  let mut second_lo = lo;
  second_lo[axis] = mid + 1;

  subdivide(tri, lo, first_hi, out);
  subdivide(tri, second_lo, hi, out);
}

/// Barycentric weights of `p` projected onto the triangle plane, clamped to
/// the triangle and renormalized.
pub fn clamped_barycentric(p: Vec3, tri: &[Vec3; 3]) -> Vec3 {
  let v0 = tri[1] - tri[0];
  let v1 = tri[2] - tri[0];
  let v2 = p - tri[0];
  let d00 = v0.dot(v0);
  let d01 = v0.dot(v1);
  let d11 = v1.dot(v1);
  let d20 = v2.dot(v0);
  let d21 = v2.dot(v1);
  let denom = d00 * d11 - d01 * d01;
  if denom.abs() <= f32::EPSILON {
    return Vec3::splat(1.0 / 3.0);
  }
  let v = (d11 * d20 - d01 * d21) / denom;
  let w = (d00 * d21 - d01 * d20) / denom;
  let bary = Vec3::new(1.0 - v - w, v, w).max(Vec3::ZERO);
  let sum = bary.x + bary.y + bary.z;
  if sum > 0.0 {
    bary / sum
  } else {
    Vec3::splat(1.0 / 3.0)
  }
}

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;
