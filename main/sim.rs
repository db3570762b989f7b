//! In-memory `Job`/`Worker`/`ClusterStatus` implementations and the
//! heartbeat loop that drives them — a demo harness standing in for a real
//! JobTracker/TaskTracker deployment, the way the teacher's `tests/smoke.rs`
//! stands in for a real Matrix client talking to a live server.

use std::collections::HashMap;

use capsched_scheduler::{
	CapacityScheduler, ClusterStatus, Job, JobRunState, QueueName, SlotKind, Task, TaskLocality, UserId, Worker,
};
use rand::{rngs::ThreadRng, Rng};
use tracing::info;

/// A synthetic job with a fixed backlog of map/reduce work, no real task
/// data and therefore no real locality: every map task it hands out reports
/// itself local, which is a harmless simplification for a demo harness with
/// no actual input splits.
pub struct SimJob {
	id: String,
	queue: QueueName,
	user: UserId,
	pending_maps: u32,
	pending_reduces: u32,
	running_map_tasks: u32,
	running_map_slots: u32,
	running_reduce_tasks: u32,
	running_reduce_slots: u32,
}

impl SimJob {
	#[must_use]
	pub fn new(id: impl Into<String>, queue: impl Into<QueueName>, user: impl Into<UserId>, pending_maps: u32, pending_reduces: u32) -> Self {
		Self {
			id: id.into(),
			queue: queue.into(),
			user: user.into(),
			pending_maps,
			pending_reduces,
			running_map_tasks: 0,
			running_map_slots: 0,
			running_reduce_tasks: 0,
			running_reduce_slots: 0,
		}
	}

	#[must_use]
	pub fn is_finished(&self) -> bool {
		self.pending_maps == 0 && self.pending_reduces == 0 && self.running_map_tasks == 0 && self.running_reduce_tasks == 0
	}
}

impl Job for SimJob {
	fn id(&self) -> &str { &self.id }

	fn queue_name(&self) -> &QueueName { &self.queue }

	fn user(&self) -> &UserId { &self.user }

	fn run_state(&self) -> JobRunState {
		if self.is_finished() { JobRunState::Finished } else { JobRunState::Running }
	}

	fn slots_per_map(&self) -> u32 { 1 }

	fn slots_per_reduce(&self) -> u32 { 1 }

	fn pending_maps(&self) -> u32 { self.pending_maps }

	fn pending_reduces(&self) -> u32 { self.pending_reduces }

	fn reserved_trackers(&self, _kind: SlotKind) -> u32 { 0 }

	fn running_tasks(&self, kind: SlotKind) -> u32 {
		if kind.is_map() { self.running_map_tasks } else { self.running_reduce_tasks }
	}

	fn running_slots(&self, kind: SlotKind) -> u32 {
		if kind.is_map() { self.running_map_slots } else { self.running_reduce_slots }
	}

	fn memory_mb_per_task(&self, _kind: SlotKind) -> u64 { 0 }

	fn obtain_new_local_map_task(&mut self, _worker: &dyn Worker) -> capsched_scheduler::error::Result<Option<Task>> {
		if self.pending_maps == 0 {
			return Ok(None);
		}
		self.pending_maps -= 1;
		self.running_map_tasks += 1;
		self.running_map_slots += 1;
		Ok(Some(Task {
			job_id: self.id.clone(),
			queue: self.queue.clone(),
			user: self.user.clone(),
			kind: SlotKind::Map,
			slots_required: 1,
			locality: TaskLocality::Local,
		}))
	}

	fn obtain_new_non_local_map_task(&mut self, _worker: &dyn Worker) -> capsched_scheduler::error::Result<Option<Task>> { Ok(None) }

	fn obtain_new_reduce_task(&mut self, _worker: &dyn Worker) -> capsched_scheduler::error::Result<Option<Task>> {
		if self.pending_reduces == 0 {
			return Ok(None);
		}
		self.pending_reduces -= 1;
		self.running_reduce_tasks += 1;
		self.running_reduce_slots += 1;
		Ok(Some(Task {
			job_id: self.id.clone(),
			queue: self.queue.clone(),
			user: self.user.clone(),
			kind: SlotKind::Reduce,
			slots_required: 1,
			locality: TaskLocality::NotApplicable,
		}))
	}

	fn schedule_off_switch(&self, _num_trackers: u32) -> bool { true }

	fn has_speculative_task(&self, _kind: SlotKind, _worker: &dyn Worker) -> bool { false }

	fn set_ignore_locality(&mut self) {}
}

/// A worker with a fixed slot count, its occupancy reset once a simulated
/// task "completes" so the demo doesn't run out of free slots after a few
/// heartbeats. Completion here is simplistic: every task completes after
/// exactly one heartbeat, which is enough to exercise steady-state sharing.
pub struct SimWorker {
	name: String,
	max_map: u32,
	occupied_map: u32,
	max_reduce: u32,
	occupied_reduce: u32,
	map_reservation: Option<(String, u32)>,
	reduce_reservation: Option<(String, u32)>,
}

impl SimWorker {
	#[must_use]
	pub fn new(name: impl Into<String>, max_map: u32, max_reduce: u32) -> Self {
		Self {
			name: name.into(),
			max_map,
			occupied_map: 0,
			max_reduce,
			occupied_reduce: 0,
			map_reservation: None,
			reduce_reservation: None,
		}
	}

	/// Drops all occupancy, simulating every task this worker ran last
	/// heartbeat having completed.
	pub fn retire_completed_tasks(&mut self) {
		self.occupied_map = 0;
		self.occupied_reduce = 0;
	}
}

impl Worker for SimWorker {
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

	fn available_memory_mb(&self) -> u64 { u64::MAX }

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

pub struct SimCluster {
	pub workers: Vec<SimWorker>,
}

/// A snapshot of `SimCluster`'s aggregate facts, independent of any
/// borrow on `workers` — needed because `assign_tasks` takes one worker
/// mutably and the cluster status immutably at the same time, and those
/// can't both borrow through the same `SimCluster`.
struct ClusterSnapshot {
	max_map_tasks: u32,
	max_reduce_tasks: u32,
	unique_hosts: u32,
}

impl ClusterStatus for ClusterSnapshot {
	fn max_map_tasks(&self) -> u32 { self.max_map_tasks }

	fn max_reduce_tasks(&self) -> u32 { self.max_reduce_tasks }

	fn number_of_unique_hosts(&self) -> u32 { self.unique_hosts }
}

impl SimCluster {
	fn snapshot(&self) -> ClusterSnapshot {
		ClusterSnapshot {
			max_map_tasks: self.workers.iter().map(|w| w.max_slots(SlotKind::Map)).sum(),
			max_reduce_tasks: self.workers.iter().map(|w| w.max_slots(SlotKind::Reduce)).sum(),
			#[allow(clippy::cast_possible_truncation)]
			unique_hosts: self.workers.len() as u32,
		}
	}
}

/// Submits a handful of synthetic jobs, one per queue, with a random
/// backlog so the demo produces a visibly uneven but self-balancing load.
pub async fn seed_jobs(scheduler: &CapacityScheduler, queues: &[QueueName], rng: &mut ThreadRng) {
	for (index, queue) in queues.iter().enumerate() {
		let pending_maps = rng.gen_range(20..200);
		let job = SimJob::new(format!("job-{index}"), queue.clone(), format!("user-{index}"), pending_maps, pending_maps / 4);
		if let Err(error) = scheduler.job_added(Box::new(job)).await {
			info!(%error, "failed to seed job");
		}
	}
}

/// Runs `heartbeats` rounds over `cluster`, each round giving every worker a
/// chance to pick up new work before retiring whatever it finished.
pub async fn run_heartbeats(scheduler: &CapacityScheduler, cluster: &mut SimCluster, heartbeats: u32) -> HashMap<String, u32> {
	let mut dispatched_by_queue = HashMap::new();
	for heartbeat in 0..heartbeats {
		for worker in &mut cluster.workers {
			worker.retire_completed_tasks();
		}
		let snapshot = cluster.snapshot();
		for worker in &mut cluster.workers {
			match scheduler.assign_tasks(worker, &snapshot).await {
				| Ok(tasks) =>
					for task in tasks {
						*dispatched_by_queue.entry(task.queue.as_str().to_owned()).or_insert(0) += 1;
					},
				| Err(error) => info!(%error, heartbeat, "assignment failed"),
			}
		}
	}
	dispatched_by_queue
}
