//! Collection membership and field constraints of editable entities.

use std::fmt;
use std::ops::RangeInclusive;

use ldfx_model::{Document, Frame, Signal};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::tracker::{ChangeTracker, PendingList};

/// Valid signal widths in bits.
pub const SIGNAL_WIDTH: RangeInclusive<u32> = 1..=64;
/// Valid frame identifiers.
pub const FRAME_ID: RangeInclusive<u32> = 0..=63;
/// Valid frame payload lengths in bytes.
pub const FRAME_LENGTH: RangeInclusive<u32> = 1..=8;
/// Valid bit offsets of a signal inside a frame.
pub const SIGNAL_OFFSET: RangeInclusive<u32> = 0..=63;

/// The editable collections of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
	Signals,
	Frames,
}

impl Collection {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Signals => "signals",
			Self::Frames => "frames",
		}
	}
}

impl fmt::Display for Collection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An entity kind the [`ChangeTracker`] keeps a pending list for.
pub trait Tracked: Clone + fmt::Debug {
	/// Collection this entity belongs to.
	const COLLECTION: Collection;

	/// Unique name inside the collection.
	fn name(&self) -> &str;

	/// Checks the field constraints enforced before a commit.
	fn validate(&self) -> Result<(), ValidationError>;

	/// Placeholder for the `seq`-th added entity.
	fn template(seq: u64, publisher: &str) -> Self;

	/// This collection inside a loaded document.
	fn base(doc: &Document) -> &[Self];

	fn list(tracker: &ChangeTracker) -> &PendingList<Self>;

	fn list_mut(tracker: &mut ChangeTracker) -> &mut PendingList<Self>;
}

fn require_name(name: &str) -> Result<(), ValidationError> {
	if name.trim().is_empty() {
		return Err(ValidationError::EmptyName);
	}
	Ok(())
}

impl Tracked for Signal {
	const COLLECTION: Collection = Collection::Signals;

	fn name(&self) -> &str {
		&self.name
	}

	fn validate(&self) -> Result<(), ValidationError> {
		require_name(&self.name)?;
		if !SIGNAL_WIDTH.contains(&self.width) {
			return Err(ValidationError::Width(self.width));
		}
		Ok(())
	}

	fn template(seq: u64, publisher: &str) -> Self {
		Signal::template(seq, publisher)
	}

	fn base(doc: &Document) -> &[Self] {
		&doc.signals
	}

	fn list(tracker: &ChangeTracker) -> &PendingList<Self> {
		&tracker.signals
	}

	fn list_mut(tracker: &mut ChangeTracker) -> &mut PendingList<Self> {
		&mut tracker.signals
	}
}

impl Tracked for Frame {
	const COLLECTION: Collection = Collection::Frames;

	fn name(&self) -> &str {
		&self.name
	}

	fn validate(&self) -> Result<(), ValidationError> {
		require_name(&self.name)?;
		if !FRAME_ID.contains(&self.frame_id) {
			return Err(ValidationError::FrameId(self.frame_id));
		}
		if !FRAME_LENGTH.contains(&self.length) {
			return Err(ValidationError::Length(self.length));
		}
		if let Some(mapping) = self.mappings.iter().find(|m| !SIGNAL_OFFSET.contains(&m.offset)) {
			return Err(ValidationError::Offset {
				signal: mapping.signal.clone(),
				offset: mapping.offset,
			});
		}
		Ok(())
	}

	fn template(seq: u64, publisher: &str) -> Self {
		Frame::template(seq, publisher)
	}

	fn base(doc: &Document) -> &[Self] {
		&doc.frames
	}

	fn list(tracker: &ChangeTracker) -> &PendingList<Self> {
		&tracker.frames
	}

	fn list_mut(tracker: &mut ChangeTracker) -> &mut PendingList<Self> {
		&mut tracker.frames
	}
}
