//! External interfaces (spec.md §6): the scheduler calls into these,
//! implemented by a real JobTracker/TaskTracker in production and by the
//! in-memory fakes under `main/src/sim.rs` for the demo harness and by the
//! fixtures under `tests/` for the scenario suite.
//!
//! These trait methods must not block on I/O (spec.md §5): they consult
//! already-available state and return synchronously.

use capsched_core::Result;

use crate::ids::{QueueName, SlotKind, UserId};

/// Where a job currently sits in its lifecycle. The scheduler only ever
/// walks jobs in `Running` state (spec.md §4.E: "running-state job J").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobRunState {
	Running,
	Waiting,
	Finished,
	Failed,
}

/// Whether an assigned map task's input data was local to the worker it was
/// handed to. Reduce tasks carry no locality information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLocality {
	Local,
	NonLocal,
	NotApplicable,
}

/// A single unit of dispatched work, returned to the JobTracker.
#[derive(Debug, Clone)]
pub struct Task {
	pub job_id: String,
	pub queue: QueueName,
	pub user: UserId,
	pub kind: SlotKind,
	pub slots_required: u32,
	pub locality: TaskLocality,
}

/// A job as the scheduler needs to see it. Scheduler-owned: jobs are handed
/// in via `Dispatcher::job_added` and the scheduler calls these methods
/// under its own single-writer lock, so implementors don't need their own
/// internal synchronization for calls arriving from this trait.
pub trait Job: Send {
	fn id(&self) -> &str;
	fn queue_name(&self) -> &QueueName;
	fn user(&self) -> &UserId;
	fn run_state(&self) -> JobRunState;

	fn slots_per_map(&self) -> u32;
	fn slots_per_reduce(&self) -> u32;

	fn pending_maps(&self) -> u32;
	fn pending_reduces(&self) -> u32;

	/// Number of task trackers currently holding a reservation for this job
	/// and kind — `reservedTTs(J)` in spec.md §4.E.
	fn reserved_trackers(&self, kind: SlotKind) -> u32;

	/// Currently-running task count for `kind`, consulted by the
	/// per-heartbeat TSI rebuild (spec.md §4.A/§4.G step 2) instead of
	/// incrementally tracked — the rebuild re-derives everything from this
	/// and `running_slots` every heartbeat.
	fn running_tasks(&self, kind: SlotKind) -> u32;

	/// Currently-occupied slot count for `kind`. Kept distinct from
	/// `running_tasks * slots_per_*` so jobs with heterogeneous per-task
	/// slot counts are represented exactly.
	fn running_slots(&self, kind: SlotKind) -> u32;

	/// Per-task memory requirement in MB, consulted by the Memory Matcher.
	fn memory_mb_per_task(&self, kind: SlotKind) -> u64;

	/// spec.md §4.E/§4.H: try to hand out a task whose input is local to
	/// `worker`. `Ok(None)` means "nothing local available", not a failure.
	fn obtain_new_local_map_task(&mut self, worker: &dyn Worker) -> Result<Option<Task>>;

	/// spec.md §4.H: a map task whose input is not local to `worker`.
	fn obtain_new_non_local_map_task(&mut self, worker: &dyn Worker) -> Result<Option<Task>>;

	fn obtain_new_reduce_task(&mut self, worker: &dyn Worker) -> Result<Option<Task>>;

	/// Opportunity throttle the job itself owns (spec.md §6): whether it is
	/// willing to accept an off-switch assignment right now.
	fn schedule_off_switch(&self, num_trackers: u32) -> bool;

	/// Side-effect-free predicate over tasks not yet run on `worker`'s
	/// host/name (spec.md §9 design note).
	fn has_speculative_task(&self, kind: SlotKind, worker: &dyn Worker) -> bool;

	/// Marks the job so its next map-task attempt ignores locality,
	/// spec.md §4.E step 1 ("for maps, mark 'ignore locality' on J").
	fn set_ignore_locality(&mut self);
}

/// A worker (TaskTracker). Owns its own reservation slots; the scheduler
/// only calls the accessors below (spec.md §6 outbound interface).
pub trait Worker: Send {
	fn name(&self) -> &str;
	fn host(&self) -> &str;

	fn max_slots(&self, kind: SlotKind) -> u32;
	fn occupied_slots(&self, kind: SlotKind) -> u32;

	/// Records that `slots` of `kind` were just handed a task, so the next
	/// assignment attempt within the same heartbeat sees the worker as less
	/// free. Mirrors a real TaskTracker's in-memory status updating the
	/// instant the JobTracker assigns it a task, ahead of the next
	/// heartbeat's report (spec.md §4.G: a worker can receive more than one
	/// task per heartbeat).
	fn assign_slots(&mut self, kind: SlotKind, slots: u32);

	/// Free physical+virtual memory headroom, consulted by the Memory
	/// Matcher when scheduling is memory-aware.
	fn available_memory_mb(&self) -> u64;

	/// Current reservation for `kind`, if any: `(job_id, slots_reserved)`.
	fn reservation(&self, kind: SlotKind) -> Option<(String, u32)>;

	fn reserve_slots(&mut self, kind: SlotKind, job_id: &str, slots: u32);
	fn unreserve_slots(&mut self, kind: SlotKind);

	/// spec.md §6: `Worker.getJobForFallowSlot(kind)` — job id occupying a
	/// reservation that a caller may want to inspect without going through
	/// the dispatcher. Informational only; the scheduler itself only ever
	/// reads reservations via `reservation`.
	fn job_for_fallow_slot(&self, kind: SlotKind) -> Option<String> {
		self.reservation(kind).map(|(job_id, _)| job_id)
	}
}

/// Cluster-wide facts the dispatcher needs once per heartbeat (spec.md §6
/// `ClusterStatus`).
pub trait ClusterStatus {
	fn max_map_tasks(&self) -> u32;
	fn max_reduce_tasks(&self) -> u32;
	fn number_of_unique_hosts(&self) -> u32;
}

/// spec.md §6 `QueueManager`: queue configuration plus the one outbound
/// write, publishing a human-readable status string per queue.
pub trait QueueManager {
	fn queue_names(&self) -> Vec<QueueName>;
	fn set_scheduler_info(&mut self, queue: &QueueName, display: String);
}
