//! Module D — User-Limit Evaluator (spec.md §4.D). Decides whether a user
//! has hit the dynamic per-user share of a queue's current capacity. Pure
//! functions over the numbers the caller already has in hand (queue.rs and
//! task_scheduler.rs own the state this reads).

use capsched_core::utils::{ceil_div, ceil_percent_of};

/// `currentCapacity`: the queue's capacity, bumped up to cover a
/// not-yet-dispatched task when the queue is already over its nominal
/// capacity (so donated idle capacity still gets a sensible per-user split).
#[must_use]
pub fn current_capacity(capacity_slots: u32, occupied: u32, slots_per_task: u32) -> u32 {
	if occupied < capacity_slots {
		capacity_slots
	} else {
		occupied.saturating_add(slots_per_task)
	}
}

/// `userLimit`: the larger of an even split across active users and the
/// queue's configured minimum-user-limit-percent floor.
#[must_use]
pub fn user_limit(current_capacity: u32, active_users: u32, minimum_user_limit_percent: u32) -> u32 {
	let even_split = ceil_div(current_capacity, active_users);
	let floor = ceil_percent_of(minimum_user_limit_percent, current_capacity);
	even_split.max(floor)
}

/// Over-limit iff the user's current occupancy already meets `userLimit`.
#[must_use]
pub fn is_over_limit(occupied_by_user: u32, limit: u32) -> bool { occupied_by_user >= limit }
