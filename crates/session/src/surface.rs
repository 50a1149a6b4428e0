//! Surface side of a session: the status state machine plus the change
//! tracker the user edits through.

use chrono::{DateTime, Local};
use ldfx_model::{Document, Frame, NodesView, Signal};
use ldfx_tracker::{ChangeTracker, EditError, EffectiveEntry, EntityKey, Tracked};
use serde::Serialize;
use tracing::debug;

use crate::protocol::{HostMessage, SurfaceMessage};
use crate::status::Status;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
	/// Editing, saving and refreshing need a loaded document.
	#[error("not available while {0}")]
	Unavailable(Status),
	#[error("surface is disposed")]
	Disposed,
	#[error("no pending changes to save")]
	NoChanges,
	#[error(transparent)]
	Edit(#[from] EditError),
}

/// State of one render surface.
///
/// Host messages drive the status; user actions mutate the tracker and
/// produce the [`SurfaceMessage`] to send back.
#[derive(Debug, Default)]
pub struct SurfaceModel {
	status: Status,
	document: Option<Document>,
	tracker: ChangeTracker,
	/// Message of the last failed load or save.
	error: Option<String>,
	traceback: Option<String>,
	last_updated: Option<DateTime<Local>>,
	/// Newest revision applied from an `ok` message.
	revision: u64,
	disposed: bool,
}

impl SurfaceModel {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn status(&self) -> Status {
		self.status
	}

	pub fn document(&self) -> Option<&Document> {
		self.document.as_ref()
	}

	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	pub fn traceback(&self) -> Option<&str> {
		self.traceback.as_deref()
	}

	pub fn last_updated(&self) -> Option<DateTime<Local>> {
		self.last_updated
	}

	pub fn tracker(&self) -> &ChangeTracker {
		&self.tracker
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed
	}

	/// First message of a freshly created surface.
	pub fn ready(&self) -> SurfaceMessage {
		SurfaceMessage::Ready
	}

	/// Applies a host message. Returns false if it was dropped.
	pub fn apply(&mut self, message: HostMessage) -> bool {
		if self.disposed {
			debug!(kind = message.kind(), "Dropping host message for disposed surface");
			return false;
		}

		let next = match &message {
			HostMessage::Loading => Status::Loading,
			HostMessage::Ok { .. } => Status::Ok,
			HostMessage::Error { .. } => Status::Error,
			HostMessage::SaveError { .. } => Status::Ok,
		};
		if !self.status.can_transition(next) {
			debug!(kind = message.kind(), status = %self.status, "Dropping host message in wrong state");
			return false;
		}
		if matches!(message, HostMessage::SaveError { .. }) && self.status != Status::Saving {
			debug!(status = %self.status, "Dropping saveError outside saving state");
			return false;
		}

		match message {
			HostMessage::Loading => {}
			HostMessage::Ok { payload, revision } => {
				if revision < self.revision {
					debug!(revision, current = self.revision, "Dropping outdated document");
					return false;
				}
				self.revision = revision;
				self.document = Some(*payload);
				self.tracker.reset();
				self.error = None;
				self.traceback = None;
				self.last_updated = Some(Local::now());
			}
			HostMessage::Error { payload, traceback } => {
				self.document = None;
				self.tracker.reset();
				self.error = Some(payload);
				self.traceback = traceback;
			}
			HostMessage::SaveError { payload } => {
				self.error = Some(payload);
				self.traceback = None;
			}
		}
		self.status = next;
		true
	}

	/// Discards local edits and asks the host for a reload.
	pub fn refresh(&mut self) -> Result<SurfaceMessage, SurfaceError> {
		self.require_idle()?;
		self.tracker.reset();
		self.status = Status::Loading;
		Ok(SurfaceMessage::RequestRefresh)
	}

	/// Hands the pending change-set to the host.
	///
	/// The edits stay pending until the reload after a successful save.
	pub fn save(&mut self) -> Result<SurfaceMessage, SurfaceError> {
		self.check_ok()?;
		if !self.tracker.has_changes() {
			return Err(SurfaceError::NoChanges);
		}
		self.status = Status::Saving;
		Ok(SurfaceMessage::SaveChanges {
			payload: self.tracker.to_change_set(),
		})
	}

	pub fn dispose(&mut self) {
		self.disposed = true;
	}

	/// Adds a placeholder entity and opens a draft for it.
	pub fn add<T: Tracked>(&mut self) -> Result<EntityKey, SurfaceError> {
		let (doc, tracker) = self.parts()?;
		let publisher = doc.default_publisher();
		Ok(tracker.record_create_with(|seq| T::template(seq, publisher)))
	}

	/// Opens a draft for the effective entity `key`.
	pub fn edit<T: Tracked>(&mut self, key: &EntityKey) -> Result<(), SurfaceError> {
		let (doc, tracker) = self.parts()?;
		let key = tracker.lookup_key(T::base(doc), key);
		tracker.begin_edit(T::base(doc), &key)?;
		Ok(())
	}

	/// Working copy of the open draft `key`.
	pub fn draft_mut<T: Tracked>(&mut self, key: &EntityKey) -> Result<&mut T, SurfaceError> {
		let (doc, tracker) = self.parts()?;
		let key = tracker.lookup_key(T::base(doc), key);
		tracker.draft_mut(&key).ok_or_else(|| {
			SurfaceError::Edit(EditError::NotEditing {
				collection: T::COLLECTION,
				key: key.clone(),
			})
		})
	}

	/// Commits the open draft `key`; on a validation failure the draft stays open.
	pub fn confirm<T: Tracked>(&mut self, key: &EntityKey) -> Result<(), SurfaceError> {
		let (doc, tracker) = self.parts()?;
		let key = tracker.lookup_key(T::base(doc), key);
		tracker.commit_draft(T::base(doc), &key)?;
		Ok(())
	}

	pub fn cancel<T: Tracked>(&mut self, key: &EntityKey) -> Result<(), SurfaceError> {
		let (doc, tracker) = self.parts()?;
		let key = tracker.lookup_key(T::base(doc), key);
		tracker.cancel_edit::<T>(&key);
		Ok(())
	}

	pub fn delete<T: Tracked>(&mut self, key: &EntityKey) -> Result<(), SurfaceError> {
		let (doc, tracker) = self.parts()?;
		let key = tracker.lookup_key(T::base(doc), key);
		tracker.delete(T::base(doc), &key)?;
		Ok(())
	}

	/// Effective view of collection `T`, empty without a document.
	pub fn entries<T: Tracked>(&self) -> Vec<EffectiveEntry<'_, T>> {
		self.document.as_ref().map(|doc| self.tracker.effective(T::base(doc))).unwrap_or_default()
	}

	pub fn signals(&self) -> Vec<EffectiveEntry<'_, Signal>> {
		self.entries()
	}

	pub fn frames(&self) -> Vec<EffectiveEntry<'_, Frame>> {
		self.entries()
	}

	pub fn nodes(&self) -> Option<NodesView<'_>> {
		self.document.as_ref().map(Document::nodes_view)
	}

	/// Node names offered as publishers and subscribers.
	pub fn all_nodes(&self) -> Vec<&str> {
		self.document.as_ref().map(Document::all_nodes).unwrap_or_default()
	}

	/// Signal names a frame mapping can refer to, taken from the effective view.
	pub fn available_signals(&self) -> Vec<&str> {
		self.signals().into_iter().map(|e| e.entity.name.as_str()).collect()
	}

	pub fn has_changes(&self) -> bool {
		self.tracker.has_changes()
	}

	/// Serializable snapshot of everything a renderer shows.
	pub fn view(&self) -> SurfaceView<'_> {
		SurfaceView {
			status: self.status,
			error: self.error.as_deref(),
			traceback: self.traceback.as_deref(),
			last_updated: self.last_updated,
			document: self.document.as_ref().map(|doc| DocumentView {
				protocol_version: &doc.protocol_version,
				language_version: &doc.language_version,
				speed: doc.speed,
				checksum_model: doc.checksum_model.as_deref(),
				channel_name: doc.channel_name.as_deref(),
				nodes: doc.nodes_view(),
				signals: self.signals(),
				frames: self.frames(),
			}),
			has_changes: self.has_changes(),
		}
	}

	fn check_ok(&self) -> Result<(), SurfaceError> {
		if self.disposed {
			return Err(SurfaceError::Disposed);
		}
		match (&self.document, self.status) {
			(Some(_), Status::Ok) => Ok(()),
			(_, status) => Err(SurfaceError::Unavailable(status)),
		}
	}

	/// Loaded document and tracker, borrowed together for an edit.
	fn parts(&mut self) -> Result<(&Document, &mut ChangeTracker), SurfaceError> {
		self.check_ok()?;
		match &self.document {
			Some(doc) => Ok((doc, &mut self.tracker)),
			None => Err(SurfaceError::Unavailable(self.status)),
		}
	}

	/// Refresh is offered in `ok` and after a failed load.
	fn require_idle(&self) -> Result<(), SurfaceError> {
		if self.disposed {
			return Err(SurfaceError::Disposed);
		}
		match self.status {
			Status::Ok | Status::Error => Ok(()),
			status => Err(SurfaceError::Unavailable(status)),
		}
	}
}

/// What a renderer draws for one surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceView<'a> {
	pub status: Status,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub traceback: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_updated: Option<DateTime<Local>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub document: Option<DocumentView<'a>>,
	pub has_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView<'a> {
	pub protocol_version: &'a str,
	pub language_version: &'a str,
	pub speed: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub checksum_model: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub channel_name: Option<&'a str>,
	pub nodes: NodesView<'a>,
	pub signals: Vec<EffectiveEntry<'a, Signal>>,
	pub frames: Vec<EffectiveEntry<'a, Frame>>,
}

#[cfg(test)]
mod tests;
