//! Module H — Locality Gate (map-only). At most one off-switch map
//! assignment per heartbeat unless it comes from honoring a reservation
//! (spec.md §4.E/§4.H), so local-data jobs keep their natural advantage and
//! remote-data jobs don't get to steal every idle slot.
//!
//! The gate itself is one bit of dispatcher-level bookkeeping threaded
//! through the map multi-assign loop in `dispatcher.rs`; this module holds
//! the one predicate that loop consults.

use crate::lookup::TaskLookupResult;

/// Whether emitting `result` should clear the per-heartbeat off-switch
/// budget for the rest of the map phase (spec.md §4.E: "any
/// OFF_SWITCH_TASK_FOUND clears it for the remainder of the heartbeat").
#[must_use]
pub fn consumes_off_switch_budget(result: &TaskLookupResult) -> bool { result.is_off_switch() }
