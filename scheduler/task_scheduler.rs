//! Module E — Task-Kind Scheduler (spec.md §4.E), instantiated once per
//! slot kind by the dispatcher. This is the core assignment algorithm:
//! given one worker with free slots of one kind, find at most one task to
//! hand it.
//!
//! The two job-walk passes spec.md describes — "respect user limits, may
//! reserve" and "ignore user limits, never reserve" — are the same walk
//! with two booleans flipped (spec.md §9 design note), so `walk_jobs` takes
//! them as parameters instead of existing as two near-duplicate functions.

use capsched_core::{err, Result};

use crate::{
	ids::SlotKind,
	lookup::TaskLookupResult,
	memory::MemoryMatcher,
	order::sorted_queue_order,
	queue::QueueTable,
	registry::JobRegistry,
	reservation::{self, ReservationDecision},
	traits::Worker,
	user_limit,
};

fn slots_per_task(job: &dyn crate::traits::Job, kind: SlotKind) -> u32 {
	if kind.is_map() { job.slots_per_map() } else { job.slots_per_reduce() }
}

fn pending_tasks(job: &dyn crate::traits::Job, kind: SlotKind) -> u32 {
	if kind.is_map() { job.pending_maps() } else { job.pending_reduces() }
}

/// spec.md §4.E: a non-local map task is only attempted when
/// `slotsPerMap(J) > 1` (a high-memory job is exempt from the off-switch
/// budget) or the heartbeat's off-switch budget is still open and the job
/// itself is willing (`scheduleOffSwitch(numTrackers)`).
fn obtain_task(
	job: &mut Box<dyn crate::traits::Job>,
	kind: SlotKind,
	worker: &dyn Worker,
	off_switch_available: bool,
	num_trackers: u32,
) -> Result<Option<TaskLookupResult>> {
	if kind.is_map() {
		if let Some(task) = job.obtain_new_local_map_task(worker)? {
			return Ok(Some(TaskLookupResult::LocalTaskFound(task)));
		}
		let exempt_from_budget = slots_per_task(job.as_ref(), kind) > 1;
		if (exempt_from_budget || (off_switch_available && job.schedule_off_switch(num_trackers)))
			&& let Some(task) = job.obtain_new_non_local_map_task(worker)?
		{
			return Ok(Some(TaskLookupResult::OffSwitchTaskFound(task)));
		}
		Ok(None)
	} else if let Some(task) = job.obtain_new_reduce_task(worker)? {
		Ok(Some(TaskLookupResult::LocalTaskFound(task)))
	} else {
		Ok(None)
	}
}

/// spec.md §4.E step 1: if `worker` already holds a reservation for `kind`,
/// either convert it into a dispatch or tell the caller to stop trying this
/// kind for the rest of the heartbeat. Returns `Ok(None)` when there was no
/// reservation to begin with, meaning the caller should fall through to the
/// normal queue walk.
pub fn try_honor_reservation(
	kind: SlotKind,
	worker: &mut dyn Worker,
	jobs: &mut JobRegistry,
	num_trackers: u32,
) -> Result<Option<TaskLookupResult>> {
	let Some((job_id, _reserved_slots)) = worker.reservation(kind) else {
		return Ok(None);
	};

	let available_slots = worker.max_slots(kind) - worker.occupied_slots(kind);
	let job = jobs
		.find_job_mut(&job_id)
		.ok_or_else(|| err!("worker {} holds a reservation for unknown job {job_id}", worker.name()))?;
	let per_task = slots_per_task(job.as_ref(), kind);

	match reservation::decide(available_slots, per_task) {
		| ReservationDecision::StillWaiting => Ok(Some(TaskLookupResult::TaskFailingMemoryRequirement)),
		| ReservationDecision::Dispatch => {
			let found = obtain_task(job, kind, worker, false, num_trackers)?;
			worker.unreserve_slots(kind);
			Ok(found)
		},
	}
}

/// The job walk shared by both passes of spec.md §4.E. `respect_user_limit`
/// gates jobs whose user is already at their per-queue share; `allow_reserve`
/// permits reserving the worker for a memory-short job instead of skipping
/// past it.
#[allow(clippy::too_many_arguments)]
fn walk_jobs(
	kind: SlotKind,
	queues: &QueueTable,
	jobs: &mut JobRegistry,
	worker: &mut dyn Worker,
	memory_matcher: &MemoryMatcher,
	order: &[usize],
	respect_user_limit: bool,
	allow_reserve: bool,
	off_switch_available: bool,
	num_trackers: u32,
) -> Result<TaskLookupResult> {
	for &queue_index in order {
		let queue = queues.queue(queue_index);
		let kind_state = queue.kind_state(kind);
		if kind_state.capacity_slots == 0 || kind_state.over_max_capacity(1) {
			continue;
		}
		let queue_name = queue.name.clone();
		let active_users = queue.qsi.active_user_count().max(1);
		let min_ul_percent = queue.minimum_user_limit_percent;
		let capacity_slots = kind_state.capacity_slots;
		let occupied = kind_state.tsi.num_slots_occupied;

		for job in jobs.jobs_in_queue_mut(&queue_name) {
			if job.run_state() != crate::traits::JobRunState::Running {
				continue;
			}
			let per_task = slots_per_task(job.as_ref(), kind);
			if pending_tasks(job.as_ref(), kind) == 0 {
				continue;
			}
			if queues.queue(queue_index).kind_state(kind).over_max_capacity(per_task) {
				continue;
			}

			if respect_user_limit {
				let cc = user_limit::current_capacity(capacity_slots, occupied, per_task);
				let limit = user_limit::user_limit(cc, active_users, min_ul_percent);
				let occupied_by_user = queues
					.queue(queue_index)
					.kind_state(kind)
					.tsi
					.num_slots_occupied_by_user
					.get(job.user())
					.copied()
					.unwrap_or(0);
				if user_limit::is_over_limit(occupied_by_user, limit) {
					continue;
				}
			}

			let available_slots = worker.max_slots(kind) - worker.occupied_slots(kind);
			if !memory_matcher.matches(per_task, available_slots, worker.available_memory_mb(), job.memory_mb_per_task(kind)) {
				if allow_reserve {
					if reservation::should_reserve(pending_tasks(job.as_ref(), kind), job.reserved_trackers(kind)) {
						worker.reserve_slots(kind, job.id(), available_slots);
						return Ok(TaskLookupResult::TaskFailingMemoryRequirement);
					}
				} else if pending_tasks(job.as_ref(), kind) > 0 || job.has_speculative_task(kind, worker) {
					return Ok(TaskLookupResult::TaskFailingMemoryRequirement);
				}
				continue;
			}

			if let Some(result) = obtain_task(job, kind, worker, off_switch_available, num_trackers)? {
				return Ok(result);
			}
		}
	}
	Ok(TaskLookupResult::NoTaskFound)
}

/// One slot kind's share of the algorithm the dispatcher drives per worker
/// per heartbeat. Stateless beyond the matcher configuration: all mutable
/// state lives in `QueueTable`/`JobRegistry`/the `Worker` itself.
#[derive(Debug, Clone, Copy)]
pub struct TaskKindScheduler {
	pub kind: SlotKind,
	pub memory_matcher: MemoryMatcher,
}

impl TaskKindScheduler {
	#[must_use]
	pub const fn new(kind: SlotKind, memory_matcher: MemoryMatcher) -> Self { Self { kind, memory_matcher } }

	/// Finds at most one task for `worker` (spec.md §4.E/§4.G step 4). The
	/// caller is responsible for applying the resulting task's effect on
	/// `queues`' TSI (`QueueTable::apply_delta`) so the next call within the
	/// same heartbeat sees an up-to-date ratio order.
	pub fn assign_one(
		&self,
		queues: &QueueTable,
		jobs: &mut JobRegistry,
		worker: &mut dyn Worker,
		off_switch_available: bool,
		num_trackers: u32,
	) -> Result<TaskLookupResult> {
		let available_slots = worker.max_slots(self.kind) - worker.occupied_slots(self.kind);
		if available_slots == 0 {
			return Ok(TaskLookupResult::NoTaskFound);
		}

		if let Some(result) = try_honor_reservation(self.kind, worker, jobs, num_trackers)? {
			return Ok(result);
		}

		let order = sorted_queue_order(queues, self.kind);

		let pass1 = walk_jobs(
			self.kind,
			queues,
			jobs,
			worker,
			&self.memory_matcher,
			&order,
			true,
			true,
			off_switch_available,
			num_trackers,
		)?;
		if !matches!(pass1, TaskLookupResult::NoTaskFound) {
			return Ok(pass1);
		}

		walk_jobs(
			self.kind,
			queues,
			jobs,
			worker,
			&self.memory_matcher,
			&order,
			false,
			false,
			off_switch_available,
			num_trackers,
		)
	}
}
