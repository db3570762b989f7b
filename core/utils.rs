//! Small numeric helpers shared by config derivation and the scheduler's
//! capacity/user-limit math. Grounded on the teacher's `src/core/utils/math.rs`
//! habit of giving named, tested helpers to arithmetic that would otherwise
//! be re-derived (and re-risked) at each call site.

/// `floor(percent * total / 100)`, spec.md §3's `capacitySlots` /
/// `maxCapacitySlots` derivation.
#[must_use]
pub fn floor_percent_of(percent: f64, total: u32) -> u32 {
	let scaled = percent * f64::from(total) / 100.0;
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	let floored = scaled.max(0.0).floor() as u32;
	floored
}

/// Ceiling integer division, used by the user-limit formula (spec.md §4.D):
/// `ceil(currentCapacity / activeUsers)` and `ceil(ulMin * currentCapacity / 100)`.
#[must_use]
pub fn ceil_div(numerator: u32, denominator: u32) -> u32 {
	if denominator == 0 {
		return 0;
	}
	numerator.div_ceil(denominator)
}

/// `ceil(percent * total / 100)`, the minimum-user-limit-percent half of the
/// user-limit formula.
#[must_use]
pub fn ceil_percent_of(percent: u32, total: u32) -> u32 {
	let numerator = u64::from(percent) * u64::from(total);
	let result = numerator.div_ceil(100);
	#[allow(clippy::cast_possible_truncation)]
	let result = result as u32;
	result
}
