//! Sparse octree over the finest-level probe cells.
//!
//! # Level Convention
//!
//! Level 0 = root (one cube spanning the longest probe axis), level `depth`
//! = finest grid. A node exists only where at least one leaf below it holds
//! data.
//!
//! # Module Structure
//!
//! - [`node`]: `CellCoord` - octree position math
//! - [`cells`]: `OctreeCell` / `DataCell` - exported 16-byte layouts
//! - [`builder`]: `SparseOctree` - bottom-up construction and traversal

pub mod builder;
pub mod cells;
pub mod node;

pub use builder::SparseOctree;
pub use cells::{DataCell, OctreeCell};
pub use node::CellCoord;
