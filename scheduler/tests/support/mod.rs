//! Shared fixtures for the scenario (S1-S6) and property (P1-P6) test
//! binaries: a `Job` whose pending/running counters behave the way a real
//! JobInProgress's would, and a `Worker`/`ClusterStatus` pair simple enough
//! to drive by hand from a test.

use std::collections::HashMap;

use capsched_scheduler::{ClusterStatus, Job, JobRunState, QueueName, SlotKind, Task, TaskLocality, UserId, Worker};

pub struct FixtureJob {
	pub id: String,
	pub queue: QueueName,
	pub user: UserId,
	pub slots_per_map: u32,
	pub slots_per_reduce: u32,
	pub pending_maps: u32,
	pub pending_reduces: u32,
	pub running_map_tasks: u32,
	pub running_map_slots: u32,
	pub running_reduce_tasks: u32,
	pub running_reduce_slots: u32,
	pub memory_mb_per_map: u64,
	pub memory_mb_per_reduce: u64,
	pub reserved_map_trackers: u32,
	/// When true, `obtain_new_local_map_task` always reports nothing local,
	/// forcing the off-switch path (used by the locality-gate property test).
	pub locality_blocked: bool,
}

impl FixtureJob {
	pub fn new(id: &str, queue: &str, user: &str) -> Self {
		Self {
			id: id.to_owned(),
			queue: QueueName::new(queue),
			user: UserId::new(user),
			slots_per_map: 1,
			slots_per_reduce: 1,
			pending_maps: 0,
			pending_reduces: 0,
			running_map_tasks: 0,
			running_map_slots: 0,
			running_reduce_tasks: 0,
			running_reduce_slots: 0,
			memory_mb_per_map: 0,
			memory_mb_per_reduce: 0,
			reserved_map_trackers: 0,
			locality_blocked: false,
		}
	}

	#[must_use]
	pub fn with_pending_maps(mut self, count: u32) -> Self {
		self.pending_maps = count;
		self
	}

	#[must_use]
	pub fn with_slots_per_map(mut self, slots: u32) -> Self {
		self.slots_per_map = slots;
		self
	}

	#[must_use]
	pub fn with_locality_blocked(mut self) -> Self {
		self.locality_blocked = true;
		self
	}
}

impl Job for FixtureJob {
	fn id(&self) -> &str { &self.id }

	fn queue_name(&self) -> &QueueName { &self.queue }

	fn user(&self) -> &UserId { &self.user }

	fn run_state(&self) -> JobRunState { JobRunState::Running }

	fn slots_per_map(&self) -> u32 { self.slots_per_map }

	fn slots_per_reduce(&self) -> u32 { self.slots_per_reduce }

	fn pending_maps(&self) -> u32 { self.pending_maps }

	fn pending_reduces(&self) -> u32 { self.pending_reduces }

	fn reserved_trackers(&self, kind: SlotKind) -> u32 {
		if kind.is_map() { self.reserved_map_trackers } else { 0 }
	}

	fn running_tasks(&self, kind: SlotKind) -> u32 {
		if kind.is_map() { self.running_map_tasks } else { self.running_reduce_tasks }
	}

	fn running_slots(&self, kind: SlotKind) -> u32 {
		if kind.is_map() { self.running_map_slots } else { self.running_reduce_slots }
	}

	fn memory_mb_per_task(&self, kind: SlotKind) -> u64 {
		if kind.is_map() { self.memory_mb_per_map } else { self.memory_mb_per_reduce }
	}

	fn obtain_new_local_map_task(&mut self, _worker: &dyn Worker) -> capsched_scheduler::error::Result<Option<Task>> {
		if self.pending_maps == 0 || self.locality_blocked {
			return Ok(None);
		}
		self.pending_maps -= 1;
		self.running_map_tasks += 1;
		self.running_map_slots += self.slots_per_map;
		Ok(Some(Task {
			job_id: self.id.clone(),
			queue: self.queue.clone(),
			user: self.user.clone(),
			kind: SlotKind::Map,
			slots_required: self.slots_per_map,
			locality: TaskLocality::Local,
		}))
	}

	fn obtain_new_non_local_map_task(&mut self, _worker: &dyn Worker) -> capsched_scheduler::error::Result<Option<Task>> {
		if self.pending_maps == 0 {
			return Ok(None);
		}
		self.pending_maps -= 1;
		self.running_map_tasks += 1;
		self.running_map_slots += self.slots_per_map;
		Ok(Some(Task {
			job_id: self.id.clone(),
			queue: self.queue.clone(),
			user: self.user.clone(),
			kind: SlotKind::Map,
			slots_required: self.slots_per_map,
			locality: TaskLocality::NonLocal,
		}))
	}

	fn obtain_new_reduce_task(&mut self, _worker: &dyn Worker) -> capsched_scheduler::error::Result<Option<Task>> {
		if self.pending_reduces == 0 {
			return Ok(None);
		}
		self.pending_reduces -= 1;
		self.running_reduce_tasks += 1;
		self.running_reduce_slots += self.slots_per_reduce;
		Ok(Some(Task {
			job_id: self.id.clone(),
			queue: self.queue.clone(),
			user: self.user.clone(),
			kind: SlotKind::Reduce,
			slots_required: self.slots_per_reduce,
			locality: TaskLocality::NotApplicable,
		}))
	}

	fn schedule_off_switch(&self, _num_trackers: u32) -> bool { true }

	fn has_speculative_task(&self, _kind: SlotKind, _worker: &dyn Worker) -> bool { false }

	fn set_ignore_locality(&mut self) {}
}

pub struct FixtureWorker {
	pub name: String,
	pub max_map: u32,
	pub occupied_map: u32,
	pub max_reduce: u32,
	pub occupied_reduce: u32,
	pub available_memory_mb: u64,
	pub map_reservation: Option<(String, u32)>,
	pub reduce_reservation: Option<(String, u32)>,
}

impl FixtureWorker {
	pub fn with_map_slots(name: &str, max_map: u32) -> Self {
		Self {
			name: name.to_owned(),
			max_map,
			occupied_map: 0,
			max_reduce: 0,
			occupied_reduce: 0,
			available_memory_mb: u64::MAX,
			map_reservation: None,
			reduce_reservation: None,
		}
	}
}

impl Worker for FixtureWorker {
	fn name(&self) -> &str { &self.name }

	fn host(&self) -> &str { &self.name }

	fn max_slots(&self, kind: SlotKind) -> u32 {
		if kind.is_map() { self.max_map } else { self.max_reduce }
	}

	fn occupied_slots(&self, kind: SlotKind) -> u32 {
		if kind.is_map() { self.occupied_map } else { self.occupied_reduce }
	}

	fn assign_slots(&mut self, kind: SlotKind, slots: u32) {
		if kind.is_map() { self.occupied_map += slots } else { self.occupied_reduce += slots }
	}

	fn available_memory_mb(&self) -> u64 { self.available_memory_mb }

	fn reservation(&self, kind: SlotKind) -> Option<(String, u32)> {
		if kind.is_map() { self.map_reservation.clone() } else { self.reduce_reservation.clone() }
	}

	fn reserve_slots(&mut self, kind: SlotKind, job_id: &str, slots: u32) {
		let entry = Some((job_id.to_owned(), slots));
		if kind.is_map() { self.map_reservation = entry } else { self.reduce_reservation = entry }
	}

	fn unreserve_slots(&mut self, kind: SlotKind) {
		if kind.is_map() { self.map_reservation = None } else { self.reduce_reservation = None }
	}
}

pub struct FixtureCluster {
	pub map_tasks: u32,
	pub reduce_tasks: u32,
}

impl ClusterStatus for FixtureCluster {
	fn max_map_tasks(&self) -> u32 { self.map_tasks }

	fn max_reduce_tasks(&self) -> u32 { self.reduce_tasks }

	fn number_of_unique_hosts(&self) -> u32 { 1 }
}

/// Counts how many of `tasks` belong to each user, for assertions like S3's
/// "each user ends with 2 running maps".
#[must_use]
pub fn tasks_per_user(tasks: &[Task]) -> HashMap<String, u32> {
	let mut counts = HashMap::new();
	for task in tasks {
		*counts.entry(task.user.as_str().to_owned()).or_insert(0) += 1;
	}
	counts
}
