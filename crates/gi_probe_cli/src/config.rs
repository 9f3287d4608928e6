//! Scene configuration loaded from TOML

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use gi_probe_bake::scene::primitives;
use gi_probe_bake::{
	Color, GiProbe, Material, Mesh, MeshInstance, MeshProvider, ProbeTunables, RenderBackend,
	SceneNode, Subdiv, Surface,
};
use glam::{Affine3A, EulerRot, Quat, Vec3};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub probe: ProbeConfig,
	#[serde(default)]
	pub materials: BTreeMap<String, MaterialConfig>,
	#[serde(default)]
	pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ProbeConfig {
	#[serde(default = "default_extents")]
	pub extents: [f32; 3],
	#[serde(default)]
	pub subdiv: Subdiv,
	#[serde(flatten)]
	pub transform: TransformConfig,
	#[serde(default)]
	pub tunables: ProbeTunables,
}

impl Default for ProbeConfig {
	fn default() -> Self {
		Self {
			extents: default_extents(),
			subdiv: Subdiv::default(),
			transform: TransformConfig::default(),
			tunables: ProbeTunables::default(),
		}
	}
}

fn default_extents() -> [f32; 3] {
	[10.0, 10.0, 10.0]
}

/// Translation, euler rotation in degrees (applied Y, X, Z) and scale.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
	#[serde(default)]
	pub translation: [f32; 3],
	#[serde(default)]
	pub rotation_deg: [f32; 3],
	#[serde(default = "default_scale")]
	pub scale: [f32; 3],
}

impl Default for TransformConfig {
	fn default() -> Self {
		Self {
			translation: [0.0; 3],
			rotation_deg: [0.0; 3],
			scale: default_scale(),
		}
	}
}

fn default_scale() -> [f32; 3] {
	[1.0, 1.0, 1.0]
}

impl TransformConfig {
	pub fn to_affine(&self) -> Affine3A {
		let [x, y, z] = self.rotation_deg.map(f32::to_radians);
		Affine3A::from_scale_rotation_translation(
			Vec3::from_array(self.scale),
			Quat::from_euler(EulerRot::YXZ, y, x, z),
			Vec3::from_array(self.translation),
		)
	}
}

#[derive(Debug, Deserialize)]
pub struct MaterialConfig {
	#[serde(default = "default_albedo")]
	pub albedo: [f32; 3],
	#[serde(default)]
	pub emission: [f32; 3],
	#[serde(default)]
	pub emission_energy: f32,
}

fn default_albedo() -> [f32; 3] {
	[1.0, 1.0, 1.0]
}

impl MaterialConfig {
	fn to_material(&self) -> Material {
		let [r, g, b] = self.albedo;
		let [er, eg, eb] = self.emission;
		Material::new(Color::from_array([r, g, b, 1.0]))
			.with_emission(Color::from_array([er, eg, eb, 1.0]), self.emission_energy)
	}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKindConfig {
	#[default]
	Spatial,
	Mesh,
	Provider,
}

/// Mesh shape, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeConfig {
	Box {
		half_extents: [f32; 3],
	},
	Plane {
		half_size: [f32; 2],
	},
	Triangles {
		positions: Vec<[f32; 3]>,
		#[serde(default)]
		indices: Option<Vec<u32>>,
		#[serde(default)]
		colors: Vec<[f32; 4]>,
	},
}

impl ShapeConfig {
	fn to_mesh(&self, material: Option<Arc<Material>>) -> Mesh {
		let mut mesh = match self {
			ShapeConfig::Box { half_extents } => primitives::box_mesh(Vec3::from_array(*half_extents)),
			ShapeConfig::Plane { half_size } => primitives::plane_mesh(half_size[0], half_size[1]),
			ShapeConfig::Triangles {
				positions,
				indices,
				colors,
			} => {
				let positions = positions.iter().copied().map(Vec3::from_array).collect();
				let mut surface = match indices {
					Some(indices) => Surface::triangles(positions, indices.clone()),
					None => Surface {
						indices: None,
						..Surface::triangles(positions, Vec::new())
					},
				};
				if !colors.is_empty() {
					surface = surface.with_colors(colors.iter().copied().map(Color::from_array).collect());
				}
				Mesh::new(vec![surface])
			}
		};
		if let Some(material) = material {
			for surface in &mut mesh.surfaces {
				surface.material = Some(material.clone());
			}
		}
		mesh
	}
}

#[derive(Debug, Deserialize)]
pub struct ProviderEntryConfig {
	pub shape: ShapeConfig,
	#[serde(flatten)]
	pub transform: TransformConfig,
}

/// One scene node. Nodes nest through `parent`, which must name a node
/// declared earlier in the file.
#[derive(Debug, Deserialize)]
pub struct NodeConfig {
	pub name: String,
	#[serde(default)]
	pub parent: Option<String>,
	#[serde(default)]
	pub kind: NodeKindConfig,
	#[serde(default)]
	pub shape: Option<ShapeConfig>,
	/// Material baked into the mesh surfaces.
	#[serde(default)]
	pub mesh_material: Option<String>,
	/// Instance override for surface 0.
	#[serde(default)]
	pub surface_material: Option<String>,
	/// Instance override for every surface.
	#[serde(default)]
	pub material_override: Option<String>,
	#[serde(flatten)]
	pub transform: TransformConfig,
	#[serde(default = "default_true")]
	pub visible: bool,
	#[serde(default = "default_true")]
	pub bake: bool,
	#[serde(default)]
	pub entries: Vec<ProviderEntryConfig>,
}

fn default_true() -> bool {
	true
}

impl NodeConfig {
	fn material_refs(&self) -> impl Iterator<Item = &String> {
		[
			&self.mesh_material,
			&self.surface_material,
			&self.material_override,
		]
		.into_iter()
		.flatten()
	}
}

impl Config {
	pub fn load(path: &Path) -> Result<Self> {
		let contents = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scene: {}", path.display()))?;
		Self::parse(&contents).with_context(|| format!("Invalid scene: {}", path.display()))
	}

	pub fn parse(contents: &str) -> Result<Self> {
		let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<()> {
		if self.probe.extents.iter().any(|e| !e.is_finite() || *e <= 0.0) {
			bail!("probe extents must be positive, got {:?}", self.probe.extents);
		}

		let mut seen = HashSet::new();
		for node in &self.nodes {
			if let Some(parent) = &node.parent {
				if !seen.contains(parent.as_str()) {
					bail!("node '{}': parent '{}' is not declared before it", node.name, parent);
				}
			}
			if !seen.insert(node.name.as_str()) {
				bail!("duplicate node name '{}'", node.name);
			}
			for material in node.material_refs() {
				if !self.materials.contains_key(material) {
					bail!("node '{}': unknown material '{}'", node.name, material);
				}
			}
			match node.kind {
				NodeKindConfig::Mesh if node.shape.is_none() => {
					bail!("mesh node '{}' has no shape", node.name);
				}
				NodeKindConfig::Provider if node.entries.is_empty() => {
					bail!("provider node '{}' has no entries", node.name);
				}
				_ => {}
			}
		}
		Ok(())
	}

	/// Probe configured from the `[probe]` table.
	pub fn build_probe<B: RenderBackend>(&self, backend: Arc<B>) -> GiProbe<B> {
		GiProbe::new(backend)
			.with_extents(Vec3::from_array(self.probe.extents))
			.with_subdiv(self.probe.subdiv)
			.with_transform(self.probe.transform.to_affine())
	}

	/// Scene tree rooted at a spatial node named `scene`.
	pub fn build_scene(&self) -> SceneNode {
		let materials: HashMap<&str, Arc<Material>> = self
			.materials
			.iter()
			.map(|(name, m)| (name.as_str(), Arc::new(m.to_material())))
			.collect();
		let lookup = |name: &Option<String>| name.as_deref().and_then(|n| materials.get(n).cloned());

		let index: HashMap<&str, usize> = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.name.as_str(), i))
			.collect();

		let mut built: Vec<Option<SceneNode>> = self
			.nodes
			.iter()
			.map(|node| Some(self.build_node(node, &lookup)))
			.collect();

		// Children always follow their parent, so attaching back to front
		// keeps sibling order.
		let mut root_children = Vec::new();
		for i in (0..self.nodes.len()).rev() {
			let Some(node) = built[i].take() else {
				continue;
			};
			match self.nodes[i].parent.as_deref().and_then(|p| index.get(p)) {
				Some(&parent) => {
					if let Some(parent) = built[parent].as_mut() {
						parent.children.insert(0, node);
					}
				}
				None => root_children.push(node),
			}
		}
		root_children.reverse();

		let mut root = SceneNode::new("scene");
		root.children = root_children;
		root
	}

	fn build_node(
		&self,
		node: &NodeConfig,
		lookup: &dyn Fn(&Option<String>) -> Option<Arc<Material>>,
	) -> SceneNode {
		let scene_node = match node.kind {
			NodeKindConfig::Spatial => SceneNode::new(node.name.clone()),
			NodeKindConfig::Mesh => {
				let mesh = node
					.shape
					.as_ref()
					.map(|shape| Arc::new(shape.to_mesh(lookup(&node.mesh_material))));
				let mut instance = MeshInstance {
					mesh,
					..MeshInstance::new(Arc::new(Mesh::default()))
				};
				if let Some(material) = lookup(&node.surface_material) {
					instance = instance.with_surface_material(0, material);
				}
				if let Some(material) = lookup(&node.material_override) {
					instance = instance.with_material_override(material);
				}
				SceneNode::mesh_instance(node.name.clone(), instance.with_baked_light(node.bake))
			}
			NodeKindConfig::Provider => {
				let material = lookup(&node.mesh_material);
				let entries = node
					.entries
					.iter()
					.map(|e| {
						(
							e.transform.to_affine(),
							Some(Arc::new(e.shape.to_mesh(material.clone()))),
						)
					})
					.collect();
				let mut provider = MeshProvider::new(entries);
				provider.use_in_baked_light = node.bake;
				SceneNode::mesh_provider(node.name.clone(), provider)
			}
		};
		scene_node
			.with_transform(node.transform.to_affine())
			.with_visible(node.visible)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use gi_probe_bake::NodeKind;

	const SCENE: &str = r#"
[probe]
extents = [2.0, 1.0, 2.0]
subdiv = 64
translation = [0.0, 1.0, 0.0]

[probe.tunables]
energy = 2.0

[materials.red]
albedo = [1.0, 0.0, 0.0]

[materials.lamp]
emission = [1.0, 1.0, 0.5]
emission_energy = 4.0

[[nodes]]
name = "room"

[[nodes]]
name = "floor"
parent = "room"
kind = "mesh"
shape = { type = "plane", half_size = [2.0, 2.0] }
mesh_material = "red"

[[nodes]]
name = "light"
parent = "room"
kind = "mesh"
shape = { type = "box", half_extents = [0.2, 0.05, 0.2] }
translation = [0.0, 0.9, 0.0]
material_override = "lamp"

[[nodes]]
name = "pillars"
kind = "provider"
mesh_material = "red"

[[nodes.entries]]
shape = { type = "box", half_extents = [0.1, 1.0, 0.1] }
translation = [1.5, 0.0, 1.5]

[[nodes.entries]]
shape = { type = "box", half_extents = [0.1, 1.0, 0.1] }
translation = [-1.5, 0.0, 1.5]
"#;

	#[test]
	fn test_parse_probe_table() {
		let config = Config::parse(SCENE).unwrap();
		assert_eq!(config.probe.extents, [2.0, 1.0, 2.0]);
		assert_eq!(config.probe.subdiv, Subdiv::Subdiv64);
		assert_eq!(config.probe.tunables.energy, 2.0);
		assert_eq!(config.probe.tunables.propagation, ProbeTunables::default().propagation);
		let translation = Vec3::from(config.probe.transform.to_affine().translation);
		assert_eq!(translation, Vec3::new(0.0, 1.0, 0.0));
	}

	#[test]
	fn test_defaults_for_empty_file() {
		let config = Config::parse("").unwrap();
		assert_eq!(config.probe.extents, [10.0; 3]);
		assert_eq!(config.probe.subdiv, Subdiv::Subdiv128);
		assert!(config.nodes.is_empty());
		assert!(config.build_scene().children.is_empty());
	}

	#[test]
	fn test_scene_tree_nesting_and_order() {
		let scene = Config::parse(SCENE).unwrap().build_scene();
		let names: Vec<&str> = scene.children.iter().map(|n| n.name.as_str()).collect();
		assert_eq!(names, ["room", "pillars"]);

		let room: Vec<&str> = scene.children[0]
			.children
			.iter()
			.map(|n| n.name.as_str())
			.collect();
		assert_eq!(room, ["floor", "light"]);
	}

	#[test]
	fn test_materials_are_resolved() {
		let scene = Config::parse(SCENE).unwrap().build_scene();
		let light = scene.find("light").unwrap();
		let NodeKind::MeshInstance(instance) = &light.node.kind else {
			panic!("light is not a mesh instance");
		};
		let lamp = instance.material_override.as_ref().unwrap();
		assert_eq!(lamp.emission_energy, 4.0);

		let floor = scene.find("floor").unwrap();
		let NodeKind::MeshInstance(instance) = &floor.node.kind else {
			panic!("floor is not a mesh instance");
		};
		let mesh = instance.mesh.as_ref().unwrap();
		assert_eq!(mesh.surfaces[0].material.as_ref().unwrap().albedo.g, 0.0);
	}

	#[test]
	fn test_provider_entries() {
		let scene = Config::parse(SCENE).unwrap().build_scene();
		let pillars = scene.find("pillars").unwrap();
		let NodeKind::MeshProvider(provider) = &pillars.node.kind else {
			panic!("pillars is not a provider");
		};
		assert_eq!(provider.entries.len(), 2);
		assert_eq!(provider.entries[1].0.translation.x, -1.5);
	}

	#[test]
	fn test_rejects_unknown_parent() {
		let err = Config::parse(
			r#"
[[nodes]]
name = "a"
parent = "b"
"#,
		)
		.unwrap_err();
		assert!(err.to_string().contains("parent 'b'"));
	}

	#[test]
	fn test_rejects_unknown_material() {
		let err = Config::parse(
			r#"
[[nodes]]
name = "a"
kind = "mesh"
shape = { type = "box", half_extents = [1.0, 1.0, 1.0] }
material_override = "missing"
"#,
		)
		.unwrap_err();
		assert!(err.to_string().contains("unknown material"));
	}

	#[test]
	fn test_rejects_mesh_without_shape_and_bad_extents() {
		assert!(Config::parse("[[nodes]]\nname = \"a\"\nkind = \"mesh\"\n").is_err());
		assert!(Config::parse("[probe]\nextents = [1.0, 0.0, 1.0]\n").is_err());
		assert!(Config::parse("[probe]\nsubdiv = 100\n").is_err());
	}

	#[test]
	fn test_rejects_duplicate_names() {
		let err = Config::parse("[[nodes]]\nname = \"a\"\n[[nodes]]\nname = \"a\"\n").unwrap_err();
		assert!(err.to_string().contains("duplicate"));
	}

	#[test]
	fn test_non_indexed_triangles() {
		let config = Config::parse(
			r#"
[[nodes]]
name = "tri"
kind = "mesh"
shape = { type = "triangles", positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] }
"#,
		)
		.unwrap();
		let scene = config.build_scene();
		let tri = scene.find("tri").unwrap();
		let NodeKind::MeshInstance(instance) = &tri.node.kind else {
			panic!("tri is not a mesh instance");
		};
		let surface = &instance.mesh.as_ref().unwrap().surfaces[0];
		assert!(surface.indices.is_none());
		assert_eq!(surface.element_count(), 3);
	}

	#[test]
	fn test_bundled_cornell_scene_bakes() {
		let config = Config::parse(include_str!("../scenes/cornell.toml")).unwrap();
		let scene = config.build_scene();
		assert_eq!(scene.children.len(), 4);

		let backend = Arc::new(gi_probe_bake::MemoryBackend::new());
		let mut probe = config.build_probe(backend);
		probe.set_subdiv(Subdiv::Subdiv64);
		let outcome = probe.bake(&scene, None, false, &mut ()).unwrap();
		// Five walls, the light and two blocks; the marker is hidden
		assert_eq!(outcome.stats().meshes_plotted, 8);
		assert!(outcome.stats().leaf_cells > 0);
	}
}
