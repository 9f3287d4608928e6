//! Bake a GI probe from a TOML scene description
//!
//! Usage:
//!   bake_probe --scene scenes/cornell.toml
//!   bake_probe --scene scenes/cornell.toml --debug --output cells.json

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use gi_probe_bake::{BakeEvent, BakeOutcome, ChannelObserver, MemoryBackend};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "bake_probe")]
#[command(about = "Voxelize a scene into GI probe octree data")]
struct Args {
	/// Path to TOML scene description
	#[arg(short, long)]
	scene: PathBuf,

	/// Bake only the subtree under this node
	#[arg(short, long)]
	root: Option<String>,

	/// Emit the debug cell visualization instead of probe data
	#[arg(short, long)]
	debug: bool,

	/// Output JSON file (defaults to probe.json, or probe_debug.json with --debug)
	#[arg(short, long)]
	output: Option<PathBuf>,
}

fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let config = Config::load(&args.scene)?;
	let scene = config.build_scene();
	let backend = Arc::new(MemoryBackend::new());
	let mut probe = config.build_probe(backend);

	if let Some(warning) = probe.configuration_warning() {
		log::warn!("{}", warning);
	}

	println!("Scene: {}", args.scene.display());
	println!(
		"Probe: extents {:?}, subdiv {}",
		config.probe.extents,
		probe.subdiv().resolution()
	);

	// The observer moves into the worker so the channel closes when the bake returns.
	let (mut observer, events) = ChannelObserver::unbounded();
	let outcome = thread::scope(|s| {
		let probe = &mut probe;
		let scene = &scene;
		let root = args.root.as_deref();
		let debug = args.debug;
		let worker = s.spawn(move || probe.bake(scene, root, debug, &mut observer));
		for event in events.iter() {
			match event {
				BakeEvent::Begin { total_steps } => log::info!("Baking {} steps", total_steps),
				BakeEvent::Step { label, .. } => log::info!("{}", label),
				BakeEvent::End => log::info!("Bake finished"),
			}
		}
		worker.join()
	});
	let outcome = match outcome {
		Ok(result) => result.context("Bake failed")?,
		Err(_) => anyhow::bail!("Bake thread panicked"),
	};

	let (output, json) = match &outcome {
		BakeOutcome::Debug { multimesh, .. } => {
			println!("Debug cells: {}", multimesh.instance_count());
			(
				args.output.clone().unwrap_or_else(|| PathBuf::from("probe_debug.json")),
				serde_json::to_string_pretty(multimesh)?,
			)
		}
		BakeOutcome::Allocated { .. } => {
			let data = probe.probe_data_mut().context("Bake produced no probe data")?;
			data.set_tunables(config.probe.tunables);
			(
				args.output.clone().unwrap_or_else(|| PathBuf::from("probe.json")),
				data.to_record().to_json_pretty()?,
			)
		}
	};

	std::fs::write(&output, json)
		.with_context(|| format!("Failed to write output: {}", output.display()))?;

	let stats = outcome.stats();
	println!();
	println!("Meshes plotted:  {}", stats.meshes_plotted);
	println!("Triangles:       {}", stats.triangles);
	println!("Leaf cells:      {}", stats.leaf_cells);
	println!("Octree nodes:    {}", stats.octree_nodes);
	println!("Total time:      {:.2} ms", stats.total_us() as f64 / 1000.0);
	println!("Wrote {}", output.display());

	Ok(())
}
