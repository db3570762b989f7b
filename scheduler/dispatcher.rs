//! Module G — Top-level Dispatcher, plus the Module I lifecycle hooks that
//! feed it. `CapacityScheduler` is the single entry point external callers
//! use; everything else in this crate is reachable only through it or
//! through the trait objects it is handed.
//!
//! Grounded on the teacher's `Services { manager: Mutex<Option<Arc<Manager>>> }`
//! shape: one `tokio::sync::Mutex` guarding all mutable scheduler state (spec.md
//! §5's single-writer lock), with a lock-free `AtomicBool` for the
//! cheap-to-check `started` flag so callers don't need to take the lock just
//! to find out the scheduler isn't running yet.

use std::sync::atomic::{AtomicBool, Ordering};

use capsched_core::{config::ClusterConfig, err, Error, Result};
use tokio::sync::Mutex;
use tracing::warn;

use crate::{
	ids::{QueueName, SlotKind},
	lookup::TaskLookupResult,
	memory::MemoryMatcher,
	queue::QueueTable,
	registry::JobRegistry,
	status::QueueReport,
	task_scheduler::TaskKindScheduler,
	traits::{ClusterStatus, Job, QueueManager, Task, Worker},
};

struct DispatcherState {
	queues: QueueTable,
	jobs: JobRegistry,
}

/// The capacity scheduler. `new` never fails and never touches any queue
/// state; `start` is the one call that can return a configuration error
/// (spec.md §7 kind 1) and the one call that flips `started` to `true`.
pub struct CapacityScheduler {
	state: Mutex<DispatcherState>,
	started: AtomicBool,
	map_scheduler: TaskKindScheduler,
	reduce_scheduler: TaskKindScheduler,
}

impl CapacityScheduler {
	#[must_use]
	pub fn new(memory_aware: bool) -> Self {
		let matcher = MemoryMatcher::new(memory_aware);
		Self {
			state: Mutex::new(DispatcherState { queues: QueueTable::default(), jobs: JobRegistry::new() }),
			started: AtomicBool::new(false),
			map_scheduler: TaskKindScheduler::new(SlotKind::Map, matcher),
			reduce_scheduler: TaskKindScheduler::new(SlotKind::Reduce, matcher),
		}
	}

	/// Builds the queue table from `config` (spec.md §3/§7 kind 1: a fatally
	/// broken configuration — an unconfigured queue whose residual share
	/// exceeds its own maximum-capacity, or capacities that don't fit within
	/// 100% — is rejected here and the scheduler never starts).
	pub async fn start(&self, config: &ClusterConfig) -> Result<()> {
		let queues = QueueTable::build(config)?;
		let mut state = self.state.lock().await;
		state.queues = queues;
		state.jobs = JobRegistry::new();
		drop(state);
		self.started.store(true, Ordering::SeqCst);
		Ok(())
	}

	pub fn terminate(&self) { self.started.store(false, Ordering::SeqCst); }

	#[must_use]
	pub fn is_started(&self) -> bool { self.started.load(Ordering::SeqCst) }

	/// spec.md §4.I `jobAdded`: files the job under its queue and bumps QSI.
	pub async fn job_added(&self, job: Box<dyn Job>) -> Result<()> {
		let mut state = self.state.lock().await;
		let queue_name = job.queue_name().clone();
		let user = job.user().clone();
		let index = state
			.queues
			.index_of(&queue_name)
			.ok_or_else(|| err!("job {} submitted to unknown queue {queue_name}", job.id()))?;
		state.queues.queue_mut(index).qsi.job_added(&user);
		state.jobs.add(job);
		Ok(())
	}

	/// spec.md §4.I `jobCompleted`/`jobRemoved`: drops the job and decrements
	/// QSI. The per-kind TSI needs no explicit adjustment here — it is
	/// rebuilt wholesale from the running-job list every heartbeat (spec.md
	/// §4.A/§4.G step 2), so the completed job simply stops contributing to
	/// the next rebuild.
	pub async fn job_completed(&self, job_id: &str) -> Result<()> {
		let mut state = self.state.lock().await;
		let Some(job) = state.jobs.remove(job_id) else {
			return Ok(());
		};
		let queue_name = job.queue_name().clone();
		let user = job.user().clone();
		if let Some(index) = state.queues.index_of(&queue_name) {
			state.queues.queue_mut(index).qsi.job_completed(&user);
		}
		Ok(())
	}

	#[must_use]
	pub async fn queue_names(&self) -> Vec<QueueName> {
		self.state.lock().await.queues.iter().map(|q| q.name.clone()).collect()
	}

	#[must_use]
	pub async fn queue_report(&self, name: &QueueName) -> Option<QueueReport> {
		let state = self.state.lock().await;
		let index = state.queues.index_of(name)?;
		Some(QueueReport::from(state.queues.queue(index)))
	}

	/// spec.md §6 `QueueManager.setSchedulerInfo`: pushes a freshly rendered
	/// status string for every queue to `manager`.
	pub async fn publish_status(&self, manager: &mut dyn QueueManager) {
		let state = self.state.lock().await;
		for queue in state.queues.iter() {
			let report = QueueReport::from(queue);
			manager.set_scheduler_info(&queue.name, report.to_string());
		}
	}

	/// Module G, the per-heartbeat assignment: rebuilds TSI from the running
	/// job list (step 2), recomputes derived capacity if the cluster changed
	/// size (step 3), then hands `worker` as many map tasks as it has slots
	/// for — respecting the locality gate's one-off-switch-per-heartbeat
	/// budget (Module H) — followed by at most one reduce task (spec.md
	/// §4.G steps 4-5).
	///
	/// Returns an empty list, not an error, when the scheduler has not been
	/// started; a not-yet-started scheduler has nothing to assign.
	pub async fn assign_tasks(&self, worker: &mut dyn Worker, cluster: &dyn ClusterStatus) -> Result<Vec<Task>> {
		if !self.is_started() {
			return Ok(Vec::new());
		}

		let mut state = self.state.lock().await;
		let DispatcherState { queues, jobs } = &mut *state;

		rebuild_tsi(queues, jobs);
		queues.recompute_capacity(SlotKind::Map, cluster.max_map_tasks());
		queues.recompute_capacity(SlotKind::Reduce, cluster.max_reduce_tasks());

		let num_trackers = cluster.number_of_unique_hosts();
		let mut assigned = Vec::new();
		let mut off_switch_available = true;

		loop {
			if worker.occupied_slots(SlotKind::Map) >= worker.max_slots(SlotKind::Map) {
				break;
			}
			let result = self.map_scheduler.assign_one(queues, jobs, worker, off_switch_available, num_trackers);
			let result = recover_invariant(result)?;
			if locality_consumes_budget(&result) {
				off_switch_available = false;
			}
			match result.into_task() {
				| Some(task) => {
					queues.apply_delta(&task.queue, SlotKind::Map, &task.user, task.slots_required)?;
					worker.assign_slots(SlotKind::Map, task.slots_required);
					assigned.push(task);
				},
				| None => break,
			}
		}

		if worker.occupied_slots(SlotKind::Reduce) < worker.max_slots(SlotKind::Reduce) {
			let result = self.reduce_scheduler.assign_one(queues, jobs, worker, false, num_trackers);
			let result = recover_invariant(result)?;
			if let Some(task) = result.into_task() {
				queues.apply_delta(&task.queue, SlotKind::Reduce, &task.user, task.slots_required)?;
				worker.assign_slots(SlotKind::Reduce, task.slots_required);
				assigned.push(task);
			}
		}

		Ok(assigned)
	}
}

fn locality_consumes_budget(result: &TaskLookupResult) -> bool { crate::locality::consumes_off_switch_budget(result) }

/// spec.md §7 kind 2: an invariant violation is logged and swallowed rather
/// than returned to the caller, so one bad job doesn't stall the rest of the
/// heartbeat. A job-trait failure (kind 4) is not recovered here; it
/// propagates unchanged.
fn recover_invariant(result: Result<TaskLookupResult>) -> Result<TaskLookupResult> {
	match result {
		| Ok(r) => Ok(r),
		| Err(e) if e.is_invariant() => {
			warn!(error = %e, "invariant violation during task assignment, skipping");
			Ok(TaskLookupResult::NoTaskFound)
		},
		| Err(e) => Err(e),
	}
}

/// spec.md §4.A/§4.G step 2: the self-healing rebuild. Every running job's
/// current occupancy is folded back into its queue's TSI from scratch; nothing
/// here is incremental. See `queue.rs`'s module doc for why this must stay
/// that way.
fn rebuild_tsi(queues: &mut QueueTable, jobs: &JobRegistry) {
	queues.reset_task_vars(SlotKind::Map);
	queues.reset_task_vars(SlotKind::Reduce);

	for job in jobs.all_jobs() {
		let Some(index) = queues.index_of(job.queue_name()) else {
			continue;
		};
		let queue = queues.queue_mut(index);
		let running_map = job.running_tasks(SlotKind::Map);
		if running_map > 0 {
			queue.map.tsi.record_usage(job.user(), running_map, job.running_slots(SlotKind::Map));
		}
		let running_reduce = job.running_tasks(SlotKind::Reduce);
		if running_reduce > 0 {
			queue.reduce.tsi.record_usage(job.user(), running_reduce, job.running_slots(SlotKind::Reduce));
		}
	}
}

#[cfg(test)]
mod tests {
	use capsched_core::config::{ClusterConfig, MemoryConfig, QueueConfig};

	use super::*;
	use crate::ids::UserId;

	struct FakeCluster {
		map_tasks: u32,
		reduce_tasks: u32,
	}

	impl ClusterStatus for FakeCluster {
		fn max_map_tasks(&self) -> u32 { self.map_tasks }

		fn max_reduce_tasks(&self) -> u32 { self.reduce_tasks }

		fn number_of_unique_hosts(&self) -> u32 { 1 }
	}

	struct FakeWorker {
		name: String,
		max_map: u32,
		occupied_map: u32,
		max_reduce: u32,
		occupied_reduce: u32,
		map_reservation: Option<(String, u32)>,
		reduce_reservation: Option<(String, u32)>,
	}

	impl Worker for FakeWorker {
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

	fn cfg() -> ClusterConfig {
		ClusterConfig {
			memory: MemoryConfig::default(),
			queues: vec![QueueConfig {
				name: "default".into(),
				capacity_percent: Some(100.0),
				max_capacity_percent: None,
				minimum_user_limit_percent: 100,
				supports_priorities: false,
			}],
		}
	}

	#[tokio::test]
	async fn not_started_returns_no_tasks() {
		let scheduler = CapacityScheduler::new(false);
		let mut worker = FakeWorker {
			name: "w1".into(),
			max_map: 2,
			occupied_map: 0,
			max_reduce: 2,
			occupied_reduce: 0,
			map_reservation: None,
			reduce_reservation: None,
		};
		let cluster = FakeCluster { map_tasks: 2, reduce_tasks: 2 };
		let assigned = scheduler.assign_tasks(&mut worker, &cluster).await.unwrap();
		assert!(assigned.is_empty());
	}

	#[tokio::test]
	async fn start_rejects_invalid_config() {
		let scheduler = CapacityScheduler::new(false);
		let bad = ClusterConfig {
			memory: MemoryConfig::default(),
			queues: vec![QueueConfig {
				name: "default".into(),
				capacity_percent: Some(150.0),
				max_capacity_percent: None,
				minimum_user_limit_percent: 100,
				supports_priorities: false,
			}],
		};
		assert!(scheduler.start(&bad).await.is_err());
		assert!(!scheduler.is_started());
	}

	#[tokio::test]
	async fn job_lifecycle_updates_queue_names_and_active_users() {
		let scheduler = CapacityScheduler::new(false);
		scheduler.start(&cfg()).await.unwrap();
		assert_eq!(scheduler.queue_names().await, vec![QueueName::new("default")]);

		let job: Box<dyn Job> = Box::new(super::tests_support::NoopJob {
			id: "job-1".into(),
			queue: QueueName::new("default"),
			user: UserId::new("alice"),
		});
		scheduler.job_added(job).await.unwrap();
		let report = scheduler.queue_report(&QueueName::new("default")).await.unwrap();
		assert_eq!(report.active_users, 1);

		scheduler.job_completed("job-1").await.unwrap();
		let report = scheduler.queue_report(&QueueName::new("default")).await.unwrap();
		assert_eq!(report.active_users, 0);
	}
}

#[cfg(test)]
mod tests_support {
	use capsched_core::Result;

	use crate::{
		ids::{QueueName, SlotKind, UserId},
		traits::{Job, JobRunState, Task, Worker},
	};

	pub struct NoopJob {
		pub id: String,
		pub queue: QueueName,
		pub user: UserId,
	}

	impl Job for NoopJob {
		fn id(&self) -> &str { &self.id }

		fn queue_name(&self) -> &QueueName { &self.queue }

		fn user(&self) -> &UserId { &self.user }

		fn run_state(&self) -> JobRunState { JobRunState::Running }

		fn slots_per_map(&self) -> u32 { 1 }

		fn slots_per_reduce(&self) -> u32 { 1 }

		fn pending_maps(&self) -> u32 { 0 }

		fn pending_reduces(&self) -> u32 { 0 }

		fn reserved_trackers(&self, _kind: SlotKind) -> u32 { 0 }

		fn running_tasks(&self, _kind: SlotKind) -> u32 { 0 }

		fn running_slots(&self, _kind: SlotKind) -> u32 { 0 }

		fn memory_mb_per_task(&self, _kind: SlotKind) -> u64 { 0 }

		fn obtain_new_local_map_task(&mut self, _worker: &dyn Worker) -> Result<Option<Task>> { Ok(None) }

		fn obtain_new_non_local_map_task(&mut self, _worker: &dyn Worker) -> Result<Option<Task>> { Ok(None) }

		fn obtain_new_reduce_task(&mut self, _worker: &dyn Worker) -> Result<Option<Task>> { Ok(None) }

		fn schedule_off_switch(&self, _num_trackers: u32) -> bool { false }

		fn has_speculative_task(&self, _kind: SlotKind, _worker: &dyn Worker) -> bool { false }

		fn set_ignore_locality(&mut self) {}
	}
}
