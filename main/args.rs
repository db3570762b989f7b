//! Integration with `clap`, trimmed from the teacher's much larger `Args` to
//! the handful of flags this demo harness actually needs: where to load
//! configuration from, how to override it ad hoc, and how long to run the
//! simulated cluster for.

use std::path::PathBuf;

use capsched_core::{err, Result};
use clap::Parser;

/// Commandline arguments.
#[derive(Parser, Debug)]
#[clap(about, long_about = None, name = "capsched")]
pub struct Args {
	#[arg(short, long)]
	/// Path to the cluster configuration TOML file (optional; falls back to
	/// built-in defaults when omitted).
	pub config: Option<PathBuf>,

	/// Override a configuration variable using TOML 'key=value' syntax.
	/// May be given multiple times.
	#[arg(long, short('O'))]
	pub option: Vec<String>,

	/// Number of simulated heartbeats to run before printing the final
	/// queue report and exiting.
	#[arg(long, default_value_t = 20)]
	pub heartbeats: u32,

	/// Number of simulated workers in the fake cluster.
	#[arg(long, default_value_t = 10)]
	pub workers: u32,

	/// Map slots per simulated worker.
	#[arg(long, default_value_t = 2)]
	pub slots_per_worker: u32,
}

impl Default for Args {
	fn default() -> Self { Self::parse() }
}

/// Parse commandline arguments into structured data.
#[must_use]
pub fn parse() -> Args { Args::parse() }

/// Splits one `-O key=value` override into a (path, raw TOML value) pair,
/// mirroring the teacher's `args::update` ergonomics for the one or two
/// overrides this harness actually needs, rather than a full Figment
/// provider chain.
pub fn parse_override(option: &str) -> Result<(String, String)> {
	let (path, val) = option
		.split_once('=')
		.ok_or_else(|| err!("missing '=' in -O/--option: {option:?}"))?;
	if path.is_empty() {
		return Err(err!("missing key= in -O/--option: {option:?}"));
	}
	if val.is_empty() {
		return Err(err!("missing =val in -O/--option: {option:?}"));
	}
	Ok((path.to_owned(), val.to_owned()))
}
