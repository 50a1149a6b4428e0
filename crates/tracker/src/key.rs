use std::fmt;

use serde::{Deserialize, Serialize};

const SYNTHETIC_PREFIX: &str = "new_";

/// Stable identity of an editable entity.
///
/// Pristine and updated entities are keyed by the name they had in the base
/// document; created entities get a synthetic key until the next load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKey {
	/// Placeholder for a not-yet-persisted entity, rendered as `new_<n>`.
	Synthetic(u64),
	/// Name of the entity in the base document.
	Named(String),
}

impl EntityKey {
	pub fn named(name: impl Into<String>) -> Self {
		Self::Named(name.into())
	}

	pub const fn is_synthetic(&self) -> bool {
		matches!(self, Self::Synthetic(_))
	}

	/// The same text read as a base-document name.
	///
	/// Entities loaded from a file may be called `new_<n>`; this recovers
	/// their key where a synthetic one cannot apply.
	pub fn into_named(self) -> Self {
		match self {
			Self::Synthetic(n) => Self::Named(format!("{SYNTHETIC_PREFIX}{n}")),
			named => named,
		}
	}

	/// Base-document name, for keys that have one.
	pub fn name(&self) -> Option<&str> {
		match self {
			Self::Named(name) => Some(name),
			Self::Synthetic(_) => None,
		}
	}
}

impl fmt::Display for EntityKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Synthetic(n) => write!(f, "{SYNTHETIC_PREFIX}{n}"),
			Self::Named(name) => f.write_str(name),
		}
	}
}

impl From<String> for EntityKey {
	fn from(raw: String) -> Self {
		match raw.strip_prefix(SYNTHETIC_PREFIX).map(str::parse::<u64>) {
			Some(Ok(n)) => Self::Synthetic(n),
			_ => Self::Named(raw),
		}
	}
}

impl From<&str> for EntityKey {
	fn from(raw: &str) -> Self {
		Self::from(raw.to_string())
	}
}

impl From<EntityKey> for String {
	fn from(key: EntityKey) -> Self {
		key.to_string()
	}
}

/// Allocator for synthetic identities, owned by exactly one tracker.
///
/// Starts at 1 and only moves forward. Deliberately not `Clone`: two copies
/// would hand out the same numbers.
#[derive(Debug, Default)]
pub struct SequenceGen {
	last: u64,
}

impl SequenceGen {
	#[must_use]
	pub const fn new() -> Self {
		Self { last: 0 }
	}

	/// Returns the next unused sequence number.
	#[allow(clippy::should_implement_trait, reason = "convention")]
	pub fn next(&mut self) -> u64 {
		self.last += 1;
		self.last
	}

	/// Last number handed out, 0 if none.
	pub const fn last(&self) -> u64 {
		self.last
	}
}
