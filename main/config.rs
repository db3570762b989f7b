//! Configuration loading: TOML file plus command-line overrides, layered
//! with `figment` the way the teacher's `args::update` layers its own
//! config sources. The scheduler crate itself never touches a file system
//! or parses TOML — that boundary is deliberate (spec.md §6's `QueueManager`
//! interface only ever hands the scheduler already-structured config).

use capsched_core::{config::ClusterConfig, err, Result};
use figment::{
	providers::{Format, Toml},
	Figment,
};

use crate::args::Args;

/// Loads `ClusterConfig` from `args.config` (if given) layered with any
/// `-O key=value` overrides, then validates it structurally. The scheduler's
/// own `CapacityScheduler::start` performs the cluster-aware capacity checks
/// that need the rest of the cluster topology; this only checks the shape.
pub fn load(args: &Args) -> Result<ClusterConfig> {
	let mut figment = Figment::new();
	if let Some(path) = &args.config {
		figment = figment.merge(Toml::file(path));
	}

	for option in &args.option {
		let (path, val) = crate::args::parse_override(option)?;
		let value: figment::value::Value =
			toml::from_str(&format!("{path} = {val}")).map_err(|e| err!("invalid override {option:?}: {e}"))?;
		figment = figment.merge((path.as_str(), value.find(&path).unwrap_or(value)));
	}

	let config: ClusterConfig = figment
		.extract()
		.map_err(|e| err!("failed to load cluster configuration: {e}"))?;
	config.validate()?;
	Ok(config)
}
