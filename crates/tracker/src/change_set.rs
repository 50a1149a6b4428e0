use ldfx_model::{Frame, Signal};
use serde::{Deserialize, Serialize};

use crate::edit::PendingEdit;

/// Snapshot of both pending lists, handed verbatim to the document service on save.
///
/// Edits keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
	#[serde(default)]
	pub signals: Vec<PendingEdit<Signal>>,
	#[serde(default)]
	pub frames: Vec<PendingEdit<Frame>>,
}

impl ChangeSet {
	pub fn is_empty(&self) -> bool {
		self.signals.is_empty() && self.frames.is_empty()
	}

	/// Total number of edits across both collections.
	pub fn len(&self) -> usize {
		self.signals.len() + self.frames.len()
	}
}
