//! Module A — Queue State. A pure aggregator: `reset_task_vars` zeros
//! counters every heartbeat and the dispatcher rebuilds them from the
//! running-job list (spec.md §4.A). This makes the scheduler self-healing —
//! transient mis-accounting cannot accumulate across heartbeats. Do not
//! replace the rebuild with incremental accounting (spec.md §9 design
//! note); it looks tempting but throws away the robustness contract.

use std::collections::HashMap;

use capsched_core::{
	config::{ClusterConfig, QueueConfig},
	error::{Error, Result},
	utils::floor_percent_of,
};

use crate::ids::{QueueName, SlotKind, UserId};

/// Per-queue-per-task-kind counters (spec.md §3 TSI).
#[derive(Debug, Clone, Default)]
pub struct Tsi {
	pub num_running_tasks: u32,
	pub num_slots_occupied: u32,
	pub num_slots_occupied_by_user: HashMap<UserId, u32>,
}

impl Tsi {
	fn reset(&mut self) {
		self.num_running_tasks = 0;
		self.num_slots_occupied = 0;
		self.num_slots_occupied_by_user.clear();
	}

	/// Folds one running task's usage into the counters. Both map and
	/// reduce call this the same way: spec.md §9's Open Question about a
	/// missing null-guard in the original's reduce-side `updateTSI` is
	/// resolved here by using `HashMap::entry` for both kinds, which makes
	/// "guarded" and "unguarded" the same code path (DESIGN.md).
	pub fn record_usage(&mut self, user: &UserId, num_tasks: u32, num_slots: u32) {
		self.num_running_tasks = self.num_running_tasks.saturating_add(num_tasks);
		self.num_slots_occupied = self.num_slots_occupied.saturating_add(num_slots);
		*self
			.num_slots_occupied_by_user
			.entry(user.clone())
			.or_insert(0) += num_slots;
	}

	/// Invariant I1: occupancy-by-user must sum to total occupancy.
	#[must_use]
	pub fn occupancy_is_consistent(&self) -> bool {
		let sum: u32 = self.num_slots_occupied_by_user.values().sum();
		sum == self.num_slots_occupied
	}
}

/// Derived per-kind capacity plus the live TSI (spec.md §3).
#[derive(Debug, Clone, Default)]
pub struct KindState {
	pub capacity_slots: u32,
	pub max_capacity_slots: Option<u32>,
	pub tsi: Tsi,
}

impl KindState {
	/// "not already over maxCapacity, checked with the given increment"
	/// (spec.md §4.E). Used both as the cheap increment=1 pre-filter at the
	/// queue-walk level and the increment=`slotsPerTask(J)` per-job check
	/// inside `getTaskFromQueue`.
	#[must_use]
	pub fn over_max_capacity(&self, increment: u32) -> bool {
		match self.max_capacity_slots {
			| Some(max) => self.tsi.num_slots_occupied.saturating_add(increment) > max,
			| None => false,
		}
	}
}

/// A queue's shared, not-per-kind state (spec.md §3 QSI): the distinct-job
/// count per user, used by the User-Limit Evaluator's `activeUsers(Q)`.
#[derive(Debug, Clone, Default)]
pub struct Qsi {
	pub num_jobs_by_user: HashMap<UserId, u32>,
}

impl Qsi {
	/// Returns `true` if this was the user's first job in the queue (the
	/// caller should then seed a zero per-user TSI entry in both kinds,
	/// spec.md §4.I).
	pub fn job_added(&mut self, user: &UserId) -> bool {
		let count = self.num_jobs_by_user.entry(user.clone()).or_insert(0);
		*count += 1;
		*count == 1
	}

	/// Returns `true` if the user had their last job removed (the caller
	/// should then drop the user's per-user TSI entry in both kinds).
	pub fn job_completed(&mut self, user: &UserId) -> bool {
		let Some(count) = self.num_jobs_by_user.get_mut(user) else {
			return false;
		};
		*count = count.saturating_sub(1);
		if *count == 0 {
			self.num_jobs_by_user.remove(user);
			true
		} else {
			false
		}
	}

	/// `activeUsers(Q)` in spec.md §4.D: users with at least one queued job.
	#[must_use]
	pub fn active_user_count(&self) -> u32 {
		#[allow(clippy::cast_possible_truncation)]
		let count = self.num_jobs_by_user.len() as u32;
		count
	}
}

/// One queue's full state: static config plus the two kinds' TSI and the
/// shared QSI.
#[derive(Debug, Clone)]
pub struct QueueState {
	pub name: QueueName,
	pub capacity_percent: f64,
	pub max_capacity_percent: Option<f64>,
	pub minimum_user_limit_percent: u32,
	pub supports_priorities: bool,
	pub map: KindState,
	pub reduce: KindState,
	pub qsi: Qsi,
}

impl QueueState {
	#[must_use]
	pub fn kind_state(&self, kind: SlotKind) -> &KindState {
		match kind {
			| SlotKind::Map => &self.map,
			| SlotKind::Reduce => &self.reduce,
		}
	}

	#[must_use]
	pub fn kind_state_mut(&mut self, kind: SlotKind) -> &mut KindState {
		match kind {
			| SlotKind::Map => &mut self.map,
			| SlotKind::Reduce => &mut self.reduce,
		}
	}
}

/// All queues, in submission order. Queues are referenced by index rather
/// than by a back-pointer into this table (spec.md §9 design note on
/// avoiding the QSI↔JobQueuesManager reference cycle).
#[derive(Debug, Default)]
pub struct QueueTable {
	queues: Vec<QueueState>,
	index_by_name: HashMap<QueueName, usize>,
	prev_map_cluster_capacity: Option<u32>,
	prev_reduce_cluster_capacity: Option<u32>,
}

impl QueueTable {
	/// Builds the table from validated config, computing the residual
	/// split for queues with no explicit `capacity_percent` and checking
	/// invariants I2/I3 on the *derived* percentages (spec.md §3, §7 kind
	/// 1: "unconfigured queue whose residual share exceeds its
	/// maxCapacity" is fatal at start).
	pub fn build(config: &ClusterConfig) -> Result<Self> {
		config.validate()?;

		let configured_sum: f64 = config
			.queues
			.iter()
			.filter_map(|q| q.capacity_percent)
			.sum();
		let unconfigured = config
			.queues
			.iter()
			.filter(|q| q.capacity_percent.is_none())
			.count();
		let residual_each = if unconfigured == 0 {
			0.0
		} else {
			(100.0 - configured_sum) / unconfigured as f64
		};

		let mut queues = Vec::with_capacity(config.queues.len());
		let mut index_by_name = HashMap::new();
		for raw in &config.queues {
			let capacity_percent = raw.capacity_percent.unwrap_or(residual_each);
			check_derived_capacity(raw, capacity_percent)?;

			let name = QueueName::new(raw.name.clone());
			index_by_name.insert(name.clone(), queues.len());
			queues.push(QueueState {
				name,
				capacity_percent,
				max_capacity_percent: raw.max_capacity_percent,
				minimum_user_limit_percent: raw.minimum_user_limit_percent,
				supports_priorities: raw.supports_priorities,
				map: KindState::default(),
				reduce: KindState::default(),
				qsi: Qsi::default(),
			});
		}

		Ok(Self {
			queues,
			index_by_name,
			prev_map_cluster_capacity: None,
			prev_reduce_cluster_capacity: None,
		})
	}

	#[must_use]
	pub fn len(&self) -> usize { self.queues.len() }

	#[must_use]
	pub fn is_empty(&self) -> bool { self.queues.is_empty() }

	#[must_use]
	pub fn queue(&self, index: usize) -> &QueueState { &self.queues[index] }

	pub fn queue_mut(&mut self, index: usize) -> &mut QueueState { &mut self.queues[index] }

	#[must_use]
	pub fn index_of(&self, name: &QueueName) -> Option<usize> { self.index_by_name.get(name).copied() }

	pub fn iter(&self) -> impl Iterator<Item = &QueueState> { self.queues.iter() }

	/// spec.md §4.G step 2: zero every queue's TSI for `kind` before the
	/// per-heartbeat rebuild.
	pub fn reset_task_vars(&mut self, kind: SlotKind) {
		for queue in &mut self.queues {
			queue.kind_state_mut(kind).tsi.reset();
		}
	}

	/// spec.md §4.A: recompute `capacitySlots`/`maxCapacitySlots` only if
	/// cluster capacity for `kind` changed since the last heartbeat.
	pub fn recompute_capacity(&mut self, kind: SlotKind, cluster_capacity: u32) {
		let cached = match kind {
			| SlotKind::Map => &mut self.prev_map_cluster_capacity,
			| SlotKind::Reduce => &mut self.prev_reduce_cluster_capacity,
		};
		if *cached == Some(cluster_capacity) {
			return;
		}
		*cached = Some(cluster_capacity);

		for queue in &mut self.queues {
			let capacity_percent = queue.capacity_percent;
			let max_capacity_percent = queue.max_capacity_percent;
			let state = queue.kind_state_mut(kind);
			state.capacity_slots = floor_percent_of(capacity_percent, cluster_capacity);
			state.max_capacity_slots =
				max_capacity_percent.map(|pct| floor_percent_of(pct, cluster_capacity));
		}
	}

	/// Records one just-dispatched task's effect on its queue's TSI so that
	/// subsequent ratio comparisons *within the same heartbeat* see it
	/// (spec.md §4.G: "the intra-heartbeat TSI delta ... is important").
	pub fn apply_delta(&mut self, queue: &QueueName, kind: SlotKind, user: &UserId, slots: u32) -> Result<()> {
		let index = self
			.index_of(queue)
			.ok_or_else(|| Error::invariant(format!("task dispatched for unknown queue {queue}")))?;
		self.queue_mut(index)
			.kind_state_mut(kind)
			.tsi
			.record_usage(user, 1, slots);
		Ok(())
	}
}

fn check_derived_capacity(raw: &QueueConfig, capacity_percent: f64) -> Result<()> {
	if let Some(max) = raw.max_capacity_percent
		&& capacity_percent > max
	{
		return Err(Error::config(format!(
			"queue {:?}: derived capacity {capacity_percent} exceeds maximum-capacity {max}",
			raw.name
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(queues: Vec<QueueConfig>) -> ClusterConfig {
		ClusterConfig { memory: capsched_core::config::MemoryConfig::default(), queues }
	}

	fn queue_cfg(name: &str, capacity: Option<f64>, max: Option<f64>) -> QueueConfig {
		QueueConfig {
			name: name.to_owned(),
			capacity_percent: capacity,
			max_capacity_percent: max,
			minimum_user_limit_percent: 25,
			supports_priorities: false,
		}
	}

	#[test]
	fn residual_split_evenly_among_unconfigured() {
		let cfg = config(vec![
			queue_cfg("a", Some(60.0), None),
			queue_cfg("b", None, None),
			queue_cfg("c", None, None),
		]);
		let table = QueueTable::build(&cfg).unwrap();
		assert!((table.queue(1).capacity_percent - 20.0).abs() < 1e-9);
		assert!((table.queue(2).capacity_percent - 20.0).abs() < 1e-9);
	}

	#[test]
	fn residual_exceeding_max_capacity_is_fatal() {
		let cfg = config(vec![
			queue_cfg("a", Some(10.0), None),
			queue_cfg("b", None, Some(50.0)),
		]);
		// residual for "b" is 90, which exceeds its max-capacity of 50.
		assert!(QueueTable::build(&cfg).is_err());
	}

	#[test]
	fn capacity_recomputed_only_on_cluster_size_change() {
		let cfg = config(vec![queue_cfg("a", Some(50.0), None)]);
		let mut table = QueueTable::build(&cfg).unwrap();
		table.recompute_capacity(SlotKind::Map, 10);
		assert_eq!(table.queue(0).map.capacity_slots, 5);

		table.queue_mut(0).map.capacity_slots = 999; // simulate drift
		table.recompute_capacity(SlotKind::Map, 10); // unchanged cluster size
		assert_eq!(table.queue(0).map.capacity_slots, 999, "should not recompute");

		table.recompute_capacity(SlotKind::Map, 20);
		assert_eq!(table.queue(0).map.capacity_slots, 10);
	}

	#[test]
	fn tsi_occupancy_by_user_stays_consistent() {
		let mut tsi = Tsi::default();
		tsi.record_usage(&UserId::new("alice"), 1, 2);
		tsi.record_usage(&UserId::new("bob"), 1, 3);
		assert!(tsi.occupancy_is_consistent());
		assert_eq!(tsi.num_slots_occupied, 5);
	}

	/// P1 - after any sequence of usage and reset operations, the
	/// occupied-by-user breakdown must keep summing to the total.
	#[test]
	fn invariant_i1_survives_reset_and_repeated_usage() {
		let mut tsi = Tsi::default();
		tsi.record_usage(&UserId::new("alice"), 1, 2);
		assert!(tsi.occupancy_is_consistent());
		tsi.record_usage(&UserId::new("alice"), 1, 1);
		assert!(tsi.occupancy_is_consistent());
		tsi.record_usage(&UserId::new("bob"), 2, 4);
		assert!(tsi.occupancy_is_consistent());
		tsi.reset();
		assert!(tsi.occupancy_is_consistent());
		assert_eq!(tsi.num_slots_occupied, 0);
		tsi.record_usage(&UserId::new("carol"), 1, 1);
		assert!(tsi.occupancy_is_consistent());
	}

	#[test]
	fn qsi_tracks_user_lifecycle() {
		let mut qsi = Qsi::default();
		let alice = UserId::new("alice");
		assert!(qsi.job_added(&alice));
		assert!(!qsi.job_added(&alice));
		assert_eq!(qsi.active_user_count(), 1);
		assert!(!qsi.job_completed(&alice));
		assert!(qsi.job_completed(&alice));
		assert_eq!(qsi.active_user_count(), 0);
	}
}
