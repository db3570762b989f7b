//! This crate introduces no error variants of its own; `capsched_core::Error`
//! already covers every kind spec.md §7 calls for (configuration, job,
//! invariant). Re-exported here so callers of this crate don't need to
//! depend on `capsched-core` directly just to name the error type.

pub use capsched_core::{Error, Result};
