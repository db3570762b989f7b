//! `TaskLookupResult`: the four-outcome sum type module E returns. Modeled
//! as an enum so the compiler forces exhaustive handling at every call site
//! (spec.md §9 design note).

use crate::traits::Task;

#[derive(Debug)]
pub enum TaskLookupResult {
	/// Dispatch; the task's input data is local to the worker.
	LocalTaskFound(Task),
	/// Dispatch; map-only, consumes the per-heartbeat off-switch budget.
	OffSwitchTaskFound(Task),
	/// None of the walked queues had anything runnable.
	NoTaskFound,
	/// The worker is reserved or memory-blocked; stop trying this kind for
	/// the rest of the heartbeat.
	TaskFailingMemoryRequirement,
}

impl TaskLookupResult {
	#[must_use]
	pub const fn is_off_switch(&self) -> bool { matches!(self, Self::OffSwitchTaskFound(_)) }

	/// Extracts the dispatched task, if this result carries one.
	#[must_use]
	pub fn into_task(self) -> Option<Task> {
		match self {
			| Self::LocalTaskFound(task) | Self::OffSwitchTaskFound(task) => Some(task),
			| Self::NoTaskFound | Self::TaskFailingMemoryRequirement => None,
		}
	}
}
