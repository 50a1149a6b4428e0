use crate::entity::Collection;
use crate::key::EntityKey;

/// A field constraint violated by a committed edit.
///
/// The offending draft stays open; nothing reaches the change-set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
	#[error("name must not be empty")]
	EmptyName,
	#[error("signal width {0} is outside 1..=64 bits")]
	Width(u32),
	#[error("frame id {0} is outside 0..=63")]
	FrameId(u32),
	#[error("frame length {0} is outside 1..=8 bytes")]
	Length(u32),
	#[error("offset {offset} of signal {signal} is outside 0..=63 bits")]
	Offset { signal: String, offset: u32 },
	#[error("{collection} already contain an entry named {name}")]
	DuplicateName { collection: Collection, name: String },
}

/// Failure of a tracker operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
	#[error("{collection} has no entry {key}")]
	NotFound { collection: Collection, key: EntityKey },
	#[error("{collection} entry {key} is not being edited")]
	NotEditing { collection: Collection, key: EntityKey },
	#[error(transparent)]
	Invalid(#[from] ValidationError),
}

impl EditError {
	/// Returns true for constraint violations, as opposed to unknown identities.
	pub const fn is_validation(&self) -> bool {
		matches!(self, Self::Invalid(_))
	}
}

/// A pending edit received over the wire that cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
	#[error("{0} edit is missing its entity fields")]
	MissingEntity(&'static str),
	#[error("create edit is missing `_id`")]
	MissingId,
}
