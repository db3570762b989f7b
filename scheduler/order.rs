//! Module C — Queue Comparator & Ordering. A total order on queues by fill
//! ratio, recomputed at the start of every assignment pass since ratios
//! change as tasks are emitted within a heartbeat (spec.md §4.C).

use crate::{
	ids::SlotKind,
	queue::{KindState, QueueTable},
};

/// `occupied / capacity`, with the zero-capacity special case from spec.md
/// §3 invariant I6 and §4.C: a queue with no capacity sorts as if fully
/// occupied (last to be consulted, never favored by idle-capacity lending).
#[must_use]
pub fn ratio(state: &KindState) -> f64 {
	if state.capacity_slots == 0 {
		1.0
	} else {
		f64::from(state.tsi.num_slots_occupied) / f64::from(state.capacity_slots)
	}
}

/// Queue indices ordered ascending by ratio. Ties keep their relative
/// order (spec.md §3 I6, §4.C: "ties broken arbitrarily but stably") — Rust
/// slices sort stably, so insertion order here is the table's submission
/// order, exactly matching the invariant.
#[must_use]
pub fn sorted_queue_order(table: &QueueTable, kind: SlotKind) -> Vec<usize> {
	let mut order: Vec<usize> = (0..table.len()).collect();
	order.sort_by(|&a, &b| {
		let ra = ratio(table.queue(a).kind_state(kind));
		let rb = ratio(table.queue(b).kind_state(kind));
		ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
	});
	order
}

#[cfg(test)]
mod tests {
	use capsched_core::config::{ClusterConfig, MemoryConfig, QueueConfig};

	use super::*;

	fn queue_cfg(name: &str, capacity: f64) -> QueueConfig {
		QueueConfig {
			name: name.to_owned(),
			capacity_percent: Some(capacity),
			max_capacity_percent: None,
			minimum_user_limit_percent: 25,
			supports_priorities: false,
		}
	}

	#[test]
	fn zero_capacity_queue_sorts_last() {
		let cfg = ClusterConfig {
			memory: MemoryConfig::default(),
			queues: vec![queue_cfg("empty", 0.0), queue_cfg("busy", 100.0)],
		};
		let mut table = QueueTable::build(&cfg).unwrap();
		table.recompute_capacity(SlotKind::Map, 10);
		// "empty" has capacity_slots == 0 so ratio == 1.0, same as a fully
		// occupied queue; "busy" is unoccupied so ratio == 0.0.
		let order = sorted_queue_order(&table, SlotKind::Map);
		assert_eq!(order, vec![1, 0]);
	}

	#[test]
	fn ties_preserve_submission_order() {
		let cfg = ClusterConfig {
			memory: MemoryConfig::default(),
			queues: vec![queue_cfg("a", 50.0), queue_cfg("b", 50.0)],
		};
		let mut table = QueueTable::build(&cfg).unwrap();
		table.recompute_capacity(SlotKind::Map, 10);
		assert_eq!(sorted_queue_order(&table, SlotKind::Map), vec![0, 1]);
	}
}
