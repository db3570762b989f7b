//! Logging subsystem. The teacher keeps a whole `Logging` struct with
//! capture/reload/console-writer machinery (`src/core/log/mod.rs`); a
//! single-service crate like this one only needs the `EnvFilter`-driven
//! subscriber install that sits underneath all of that, so that's all this
//! module provides. Call sites elsewhere use `tracing::{debug, info, warn,
//! error}` directly rather than re-exporting wrapper macros, since this
//! crate has only one logging backend to switch between.

use tracing_subscriber::{EnvFilter, fmt};

/// Default filter when `RUST_LOG` is unset: scheduler internals at `debug`,
/// everything else at `info`.
const DEFAULT_FILTER: &str = "info,capsched_scheduler=debug";

/// Installs a global `tracing` subscriber. Safe to call once at process
/// start; a second call is a no-op (errors are ignored, matching the
/// teacher's tolerance for re-init during tests).
pub fn init() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

	let _ = fmt()
		.with_env_filter(filter)
		.with_target(true)
		.try_init();
}
