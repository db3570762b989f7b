use thiserror::Error as ThisError;

/// Crate-wide result alias. Defaulting `T` to `()` matches call sites like
/// `fn start(&self) -> Result` that return no value on success.
pub type Result<T = (), E = Error> = std::result::Result<T, E>;

/// The three ways this crate can fail, matching spec.md §7's error kinds 1
/// and 4 (kinds 2 and 3 are not `Err` at all: an invariant violation is
/// logged and swallowed by the dispatcher, and a memory mismatch is a
/// `TaskLookupResult` variant, not an error).
#[derive(Debug, ThisError)]
pub enum Error {
	/// Kind 1: configuration is fatally broken. Returned only from
	/// `start()`; the scheduler never reaches `started = true`.
	#[error("configuration error: {0}")]
	Config(String),

	/// Kind 4: a job-trait method failed. Propagated to the caller
	/// unchanged; the scheduler's own accounting self-heals next heartbeat.
	#[error("job error: {0}")]
	Job(String),

	/// A bug: a queue or job referenced state that should exist but
	/// doesn't. These are constructed at invariant-check sites and are
	/// expected to be caught and logged by the dispatcher rather than
	/// returned to the caller (spec.md §7 kind 2), but the variant exists
	/// so internal helpers can use `?` before that boundary.
	#[error("invariant violation: {0}")]
	Invariant(String),
}

impl Error {
	#[must_use]
	pub fn config(msg: impl Into<String>) -> Self { Self::Config(msg.into()) }

	#[must_use]
	pub fn invariant(msg: impl Into<String>) -> Self { Self::Invariant(msg.into()) }

	#[must_use]
	pub fn job(msg: impl Into<String>) -> Self { Self::Job(msg.into()) }

	/// True for the one error kind the dispatcher swallows rather than
	/// propagates (spec.md §7 kind 2).
	#[must_use]
	pub fn is_invariant(&self) -> bool { matches!(self, Self::Invariant(_)) }
}

/// `err!("...", args)` builds an `Error::Invariant` with the same ergonomics
/// as the teacher's `err!`/`Err!` macros (`tuwunel_core::err`), used at the
/// scheduler's internal invariant-check sites.
#[macro_export]
macro_rules! err {
	($($arg:tt)*) => {
		$crate::Error::invariant(format!($($arg)*))
	};
}
