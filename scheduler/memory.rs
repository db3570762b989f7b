//! Module B — Memory Matcher. A pure predicate, no state beyond whether
//! memory-aware scheduling is enabled at all (spec.md §4.B).

/// Decides whether a worker currently has room for one more task of a
/// given kind: slot count always gates; memory headroom only gates when
/// the cluster is configured for memory-aware scheduling.
#[derive(Debug, Clone, Copy)]
pub struct MemoryMatcher {
	pub memory_aware: bool,
}

impl MemoryMatcher {
	#[must_use]
	pub const fn new(memory_aware: bool) -> Self { Self { memory_aware } }

	/// `slots_per_task` must always fit in `available_slots`; when
	/// memory-aware, `worker_available_mb` must also cover
	/// `job_required_mb`.
	#[must_use]
	pub fn matches(
		&self,
		slots_per_task: u32,
		available_slots: u32,
		worker_available_mb: u64,
		job_required_mb: u64,
	) -> bool {
		if slots_per_task > available_slots {
			return false;
		}
		if !self.memory_aware {
			return true;
		}
		worker_available_mb >= job_required_mb
	}
}
