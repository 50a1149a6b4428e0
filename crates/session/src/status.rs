use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a session, shared by host and surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
	/// A load is outstanding. Initial state of every session.
	#[default]
	Loading,
	/// A document is loaded and editable.
	Ok,
	/// The last load failed; only a reload is possible.
	Error,
	/// A save is outstanding.
	Saving,
}

impl Status {
	/// Returns true if moving from `self` to `next` is a legal transition.
	///
	/// `loading -> loading` covers a reload requested while one is
	/// outstanding; `saving -> loading` is the reload chained after a
	/// successful save.
	pub const fn can_transition(self, next: Status) -> bool {
		matches!(
			(self, next),
			(Self::Loading, Self::Ok | Self::Error | Self::Loading)
				| (Self::Ok, Self::Loading | Self::Saving)
				| (Self::Saving, Self::Ok | Self::Loading)
				| (Self::Error, Self::Loading)
		)
	}

	/// Returns true while a document service call is outstanding.
	pub const fn is_busy(self) -> bool {
		matches!(self, Self::Loading | Self::Saving)
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Loading => "loading",
			Self::Ok => "ok",
			Self::Error => "error",
			Self::Saving => "saving",
		}
	}
}

impl fmt::Display for Status {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
