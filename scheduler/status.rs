//! Human-readable per-queue status (spec.md §6 `QueueManager.setSchedulerInfo`):
//! capacity/occupancy for both kinds plus the active-user breakdown, built
//! straight off `QueueState` so it can be regenerated any time without
//! touching scheduler state.

use std::fmt;

use crate::queue::{KindState, QueueState};

#[derive(Debug, Clone)]
pub struct KindReport {
	pub capacity_slots: u32,
	pub max_capacity_slots: Option<u32>,
	pub running_tasks: u32,
	pub occupied_slots: u32,
}

impl From<&KindState> for KindReport {
	fn from(state: &KindState) -> Self {
		Self {
			capacity_slots: state.capacity_slots,
			max_capacity_slots: state.max_capacity_slots,
			running_tasks: state.tsi.num_running_tasks,
			occupied_slots: state.tsi.num_slots_occupied,
		}
	}
}

impl fmt::Display for KindReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.max_capacity_slots {
			| Some(max) => write!(
				f,
				"capacity={} max-capacity={} running={} occupied={}",
				self.capacity_slots, max, self.running_tasks, self.occupied_slots
			),
			| None => write!(
				f,
				"capacity={} running={} occupied={}",
				self.capacity_slots, self.running_tasks, self.occupied_slots
			),
		}
	}
}

#[derive(Debug, Clone)]
pub struct QueueReport {
	pub name: String,
	pub map: KindReport,
	pub reduce: KindReport,
	pub active_users: u32,
}

impl From<&QueueState> for QueueReport {
	fn from(state: &QueueState) -> Self {
		Self {
			name: state.name.as_str().to_owned(),
			map: KindReport::from(&state.map),
			reduce: KindReport::from(&state.reduce),
			active_users: state.qsi.active_user_count(),
		}
	}
}

impl fmt::Display for QueueReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "Queue: {}", self.name)?;
		writeln!(f, "  Map: {}", self.map)?;
		writeln!(f, "  Reduce: {}", self.reduce)?;
		write!(f, "  Active users: {}", self.active_users)
	}
}
