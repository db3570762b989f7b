//! Config *shapes* only (spec.md §6). Parsing a TOML file or merging
//! `-O key=value` overrides is explicitly out of scope for the scheduler
//! (spec.md §1's "Persistent configuration parsing" external collaborator)
//! and lives in the `main` binary's `figment` loader instead; this module
//! just defines what a validated configuration looks like and the
//! structural checks that are cheap to do before the scheduler ever sees
//! cluster size.
//!
//! The residual-split math (an unconfigured queue's share of the leftover
//! percentage) depends on the full queue set, not a single queue in
//! isolation, so it is computed by `capsched_scheduler::queue` rather than
//! here; this module only rejects configs that are malformed independent of
//! that computation.

use serde::Deserialize;

use crate::error::{Error, Result};

/// `mapred.cluster.{map,reduce}.memory.mb` and their `max.*` counterparts.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MemoryConfig {
	pub map_memory_mb: u64,
	pub reduce_memory_mb: u64,
	pub max_map_memory_mb: Option<u64>,
	pub max_reduce_memory_mb: Option<u64>,
}

impl Default for MemoryConfig {
	fn default() -> Self {
		Self {
			map_memory_mb: 1024,
			reduce_memory_mb: 1024,
			max_map_memory_mb: None,
			max_reduce_memory_mb: None,
		}
	}
}

/// One `queue.<name>.*` block.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
	pub name: String,

	/// `queue.<name>.capacity`. Absent means "split the residual evenly
	/// among unconfigured queues" (spec.md §3).
	#[serde(default)]
	pub capacity_percent: Option<f64>,

	/// `queue.<name>.maximum-capacity`. Absent means unbounded.
	#[serde(default)]
	pub max_capacity_percent: Option<f64>,

	/// `queue.<name>.minimum-user-limit-percent`, 1–100.
	#[serde(default = "default_min_user_limit_percent")]
	pub minimum_user_limit_percent: u32,

	/// `queue.<name>.supports-priority`.
	#[serde(default)]
	pub supports_priorities: bool,
}

const fn default_min_user_limit_percent() -> u32 { 100 }

impl QueueConfig {
	fn validate(&self) -> Result<()> {
		if let Some(cap) = self.capacity_percent
			&& !(0.0..=100.0).contains(&cap)
		{
			return Err(Error::config(format!(
				"queue {:?}: capacity {cap} out of range 0..=100",
				self.name
			)));
		}

		if let Some(max) = self.max_capacity_percent
			&& max < 0.0
		{
			return Err(Error::config(format!(
				"queue {:?}: maximum-capacity {max} must be >= 0",
				self.name
			)));
		}

		if let (Some(cap), Some(max)) = (self.capacity_percent, self.max_capacity_percent)
			&& cap > max
		{
			return Err(Error::config(format!(
				"queue {:?}: capacity {cap} exceeds maximum-capacity {max}",
				self.name
			)));
		}

		if !(1..=100).contains(&self.minimum_user_limit_percent) {
			return Err(Error::config(format!(
				"queue {:?}: minimum-user-limit-percent {} out of range 1..=100",
				self.name, self.minimum_user_limit_percent
			)));
		}

		Ok(())
	}
}

/// The full, not-yet-cluster-aware configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
	#[serde(default)]
	pub memory: MemoryConfig,
	pub queues: Vec<QueueConfig>,
}

impl ClusterConfig {
	/// Structural checks that don't need the residual-split computation:
	/// at least one queue, each queue internally consistent, and the sum of
	/// *explicitly configured* percentages does not exceed 100 (spec.md §3
	/// invariant I2; the residual-vs-maxCapacity half of I2/I3 is checked
	/// once capacities are derived, in `capsched_scheduler::queue`).
	pub fn validate(&self) -> Result<()> {
		if self.queues.is_empty() {
			return Err(Error::config("at least one queue must be defined"));
		}

		let mut seen = std::collections::HashSet::new();
		for queue in &self.queues {
			queue.validate()?;
			if !seen.insert(queue.name.as_str()) {
				return Err(Error::config(format!("duplicate queue name {:?}", queue.name)));
			}
		}

		let configured_sum: f64 = self
			.queues
			.iter()
			.filter_map(|q| q.capacity_percent)
			.sum();

		if configured_sum > 100.0 {
			return Err(Error::config(format!(
				"sum of configured queue capacities {configured_sum} exceeds 100"
			)));
		}

		Ok(())
	}
}
