//! Identifier newtypes and the map/reduce kind enum (SPEC_FULL.md §3
//! ambient note: wrap externally-supplied identifiers instead of passing
//! bare `String` through the scheduling API).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueName(String);

impl QueueName {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

	#[must_use]
	pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for QueueName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<&str> for QueueName {
	fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for QueueName {
	fn from(s: String) -> Self { Self::new(s) }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(String);

impl UserId {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

	#[must_use]
	pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<&str> for UserId {
	fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for UserId {
	fn from(s: String) -> Self { Self::new(s) }
}

/// The cluster's two independently-pooled slot kinds (spec.md glossary:
/// "Task kind").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
	Map,
	Reduce,
}

impl SlotKind {
	#[must_use]
	pub const fn is_map(self) -> bool { matches!(self, Self::Map) }
}

impl fmt::Display for SlotKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			| Self::Map => "map",
			| Self::Reduce => "reduce",
		})
	}
}
