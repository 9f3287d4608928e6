//! Scene collaborator model.
//!
//! The baker only needs a small view of a scene: a tree of nodes with local
//! transforms and visibility, where some nodes carry geometry. Geometry comes
//! in two shapes, each behind a capability trait:
//!
//! - [`HasStaticMesh`]: a single mesh with per-surface material overrides
//!   (a mesh instance).
//! - [`HasDynamicMeshes`]: a node that enumerates `(transform, mesh)` pairs
//!   on demand (grid maps, CSG shapes, multimeshes).
//!
//! [`NodeKind`] is the closed set of node variants the collector dispatches
//! over.

pub mod mesh;
pub mod primitives;

use std::sync::Arc;

use glam::Affine3A;
use smallvec::SmallVec;

pub use mesh::{Material, Mesh, PrimitiveType, Surface};

/// Single mesh with per-surface material overrides.
pub trait HasStaticMesh {
  /// Attached mesh resource, if any.
  fn mesh(&self) -> Option<&Mesh>;
  /// Material override for surface `surface`, if set.
  fn surface_override(&self, surface: usize) -> Option<&Material>;
  /// Material replacing every surface's material, if set.
  fn material_override(&self) -> Option<&Material>;
  /// Whether this geometry contributes to baked lighting.
  fn use_in_baked_light(&self) -> bool;
}

/// Geometry enumerated on demand as `(local transform, mesh)` pairs.
pub trait HasDynamicMeshes {
  /// Meshes relative to the node. Entries without a mesh are omitted.
  fn meshes(&self) -> SmallVec<[(Affine3A, &Mesh); 4]>;
  /// Whether this geometry contributes to baked lighting.
  fn use_in_baked_light(&self) -> bool;
}

/// Mesh instance node payload.
#[derive(Clone, Debug)]
pub struct MeshInstance {
  pub mesh: Option<Arc<Mesh>>,
  /// Per-surface overrides, indexed like `mesh.surfaces`.
  pub surface_materials: Vec<Option<Arc<Material>>>,
  pub material_override: Option<Arc<Material>>,
  pub use_in_baked_light: bool,
}

impl MeshInstance {
  pub fn new(mesh: Arc<Mesh>) -> Self {
    Self {
      mesh: Some(mesh),
      surface_materials: Vec::new(),
      material_override: None,
      use_in_baked_light: true,
    }
  }

  pub fn with_surface_material(mut self, surface: usize, material: Arc<Material>) -> Self {
    if self.surface_materials.len() <= surface {
      self.surface_materials.resize(surface + 1, None);
    }
    self.surface_materials[surface] = Some(material);
    self
  }

  pub fn with_material_override(mut self, material: Arc<Material>) -> Self {
    self.material_override = Some(material);
    self
  }

  pub fn with_baked_light(mut self, enabled: bool) -> Self {
    self.use_in_baked_light = enabled;
    self
  }
}

impl HasStaticMesh for MeshInstance {
  fn mesh(&self) -> Option<&Mesh> {
    self.mesh.as_deref()
  }

  fn surface_override(&self, surface: usize) -> Option<&Material> {
    self.surface_materials.get(surface).and_then(|m| m.as_deref())
  }

  fn material_override(&self) -> Option<&Material> {
    self.material_override.as_deref()
  }

  fn use_in_baked_light(&self) -> bool {
    self.use_in_baked_light
  }
}

/// Node that provides several meshes, each with its own local transform.
#[derive(Clone, Debug)]
pub struct MeshProvider {
  pub entries: Vec<(Affine3A, Option<Arc<Mesh>>)>,
  pub use_in_baked_light: bool,
}

impl MeshProvider {
  pub fn new(entries: Vec<(Affine3A, Option<Arc<Mesh>>)>) -> Self {
    Self {
      entries,
      use_in_baked_light: true,
    }
  }
}

impl HasDynamicMeshes for MeshProvider {
  fn meshes(&self) -> SmallVec<[(Affine3A, &Mesh); 4]> {
    self
      .entries
      .iter()
      .filter_map(|(xf, mesh)| mesh.as_deref().map(|m| (*xf, m)))
      .collect()
  }

  fn use_in_baked_light(&self) -> bool {
    self.use_in_baked_light
  }
}

/// Closed set of node variants.
#[derive(Clone, Debug)]
pub enum NodeKind {
  /// Plain transform node.
  Spatial,
  MeshInstance(MeshInstance),
  MeshProvider(MeshProvider),
}

impl NodeKind {
  pub fn as_static_mesh(&self) -> Option<&dyn HasStaticMesh> {
    match self {
      NodeKind::MeshInstance(mi) => Some(mi),
      _ => None,
    }
  }

  pub fn as_dynamic_meshes(&self) -> Option<&dyn HasDynamicMeshes> {
    match self {
      NodeKind::MeshProvider(mp) => Some(mp),
      _ => None,
    }
  }
}

/// Scene tree node.
#[derive(Clone, Debug)]
pub struct SceneNode {
  pub name: String,
  /// Transform relative to the parent node.
  pub transform: Affine3A,
  /// Own visibility flag. A node is visible in the tree only if all its
  /// ancestors are visible too.
  pub visible: bool,
  pub kind: NodeKind,
  pub children: Vec<SceneNode>,
}

impl SceneNode {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      transform: Affine3A::IDENTITY,
      visible: true,
      kind: NodeKind::Spatial,
      children: Vec::new(),
    }
  }

  pub fn mesh_instance(name: impl Into<String>, instance: MeshInstance) -> Self {
    Self::new(name).with_kind(NodeKind::MeshInstance(instance))
  }

  pub fn mesh_provider(name: impl Into<String>, provider: MeshProvider) -> Self {
    Self::new(name).with_kind(NodeKind::MeshProvider(provider))
  }

  pub fn with_kind(mut self, kind: NodeKind) -> Self {
    self.kind = kind;
    self
  }

  pub fn with_transform(mut self, transform: Affine3A) -> Self {
    self.transform = transform;
    self
  }

  pub fn with_visible(mut self, visible: bool) -> Self {
    self.visible = visible;
    self
  }

  pub fn with_child(mut self, child: SceneNode) -> Self {
    self.children.push(child);
    self
  }

  /// Cursor at this node, treating it as a tree root.
  pub fn cursor(&self) -> NodeCursor<'_> {
    NodeCursor {
      node: self,
      parent_transform: Affine3A::IDENTITY,
      parent_visible: true,
    }
  }

  /// Depth-first search for the first node named `name`, including `self`.
  pub fn find(&self, name: &str) -> Option<NodeCursor<'_>> {
    self.cursor().find(name)
  }
}

/// A node together with the state inherited from its ancestors.
#[derive(Clone, Copy, Debug)]
pub struct NodeCursor<'a> {
  pub node: &'a SceneNode,
  /// Global transform of the parent.
  pub parent_transform: Affine3A,
  /// Whether every ancestor is visible.
  pub parent_visible: bool,
}

impl<'a> NodeCursor<'a> {
  /// Global transform of the node.
  pub fn global_transform(&self) -> Affine3A {
    self.parent_transform * self.node.transform
  }

  /// Node and all ancestors visible.
  pub fn is_visible_in_tree(&self) -> bool {
    self.parent_visible && self.node.visible
  }

  /// Cursors for the children, in declaration order.
  pub fn children(&self) -> impl Iterator<Item = NodeCursor<'a>> + 'a {
    let parent_transform = self.global_transform();
    let parent_visible = self.is_visible_in_tree();
    self.node.children.iter().map(move |node| NodeCursor {
      node,
      parent_transform,
      parent_visible,
    })
  }

  fn find(self, name: &str) -> Option<NodeCursor<'a>> {
    if self.node.name == name {
      return Some(self);
    }
    self.children().find_map(|child| child.find(name))
  }
}
