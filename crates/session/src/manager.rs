//! Host side of editing sessions.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use ldfx_service::{DocumentService, Failure};
use ldfx_tracker::ChangeSet;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::notify::Notifier;
use crate::protocol::{HostMessage, SurfaceHandle, SurfaceMessage};
use crate::status::Status;

/// Identifier of one session instance.
///
/// Never reused, so a session reopened for the same path gets a new id and
/// results addressed to the old one are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "session#{}", self.0)
	}
}

/// Outcome of [`SessionManager::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenDisposition {
	/// A new session was created and its first load spawned.
	Created(SessionId),
	/// A session already existed and its surface was revealed.
	Revealed(SessionId),
}

impl OpenDisposition {
	pub const fn id(self) -> SessionId {
		match self {
			Self::Created(id) | Self::Revealed(id) => id,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
	#[error("cannot load {}: no async runtime is running", .0.display())]
	NoRuntime(PathBuf),
}

/// Read-only copy of a session's host-side state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
	pub id: SessionId,
	pub path: PathBuf,
	pub status: Status,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_error: Option<Failure>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_refreshed: Option<DateTime<Local>>,
	/// Revision of the most recently started load.
	pub revision: u64,
}

struct SessionEntry {
	id: SessionId,
	path: PathBuf,
	surface: Arc<dyn SurfaceHandle>,
	status: Status,
	last_error: Option<Failure>,
	last_refreshed: Option<DateTime<Local>>,
	/// Bumped by every load; results of older loads are stale.
	revision: u64,
}

impl SessionEntry {
	fn snapshot(&self) -> SessionSnapshot {
		SessionSnapshot {
			id: self.id,
			path: self.path.clone(),
			status: self.status,
			last_error: self.last_error.clone(),
			last_refreshed: self.last_refreshed,
			revision: self.revision,
		}
	}
}

/// Session table and id index, updated together under one lock.
#[derive(Default)]
struct ManagerState {
	sessions: HashMap<PathBuf, SessionEntry>,
	id_index: HashMap<SessionId, PathBuf>,
	next_id: u64,
}

impl ManagerState {
	fn entry_mut(&mut self, id: SessionId) -> Option<&mut SessionEntry> {
		let path = self.id_index.get(&id)?;
		self.sessions.get_mut(path)
	}

	fn entry(&self, id: SessionId) -> Option<&SessionEntry> {
		let path = self.id_index.get(&id)?;
		self.sessions.get(path)
	}
}

/// Owner of every open editing session.
///
/// Thread-safe; all state sits behind one `RwLock` that is released before
/// any document service call.
pub struct SessionManager {
	service: Arc<dyn DocumentService>,
	notifier: Arc<dyn Notifier>,
	state: RwLock<ManagerState>,
}

impl SessionManager {
	pub fn new(service: Arc<dyn DocumentService>, notifier: Arc<dyn Notifier>) -> Self {
		Self {
			service,
			notifier,
			state: RwLock::new(ManagerState::default()),
		}
	}

	/// Opens the session for `path`, or reveals it if one already exists.
	///
	/// A new session starts in `loading` and its first load is spawned on
	/// the current tokio runtime. `make_surface` is only called for new
	/// sessions and must not call back into the manager.
	pub fn open<F>(self: &Arc<Self>, path: &Path, make_surface: F) -> Result<OpenDisposition, SessionError>
	where
		F: FnOnce(SessionId) -> Arc<dyn SurfaceHandle>,
	{
		let key = session_key(path);
		let runtime = tokio::runtime::Handle::try_current().map_err(|_| SessionError::NoRuntime(key.clone()))?;

		let mut state = self.state.write();
		if let Some(entry) = state.sessions.get(&key) {
			let (id, surface) = (entry.id, entry.surface.clone());
			drop(state);
			debug!(session = %id, path = %key.display(), "Revealing existing session");
			surface.reveal();
			return Ok(OpenDisposition::Revealed(id));
		}

		state.next_id += 1;
		let id = SessionId(state.next_id);
		let entry = SessionEntry {
			id,
			path: key.clone(),
			surface: make_surface(id),
			status: Status::Loading,
			last_error: None,
			last_refreshed: None,
			revision: 0,
		};
		state.sessions.insert(key.clone(), entry);
		state.id_index.insert(id, key.clone());
		drop(state);
		info!(session = %id, path = %key.display(), "Opened session");

		let this = Arc::clone(self);
		runtime.spawn(async move { this.load(id).await });
		Ok(OpenDisposition::Created(id))
	}

	/// Loads the session's file and posts the result to its surface.
	///
	/// Ignored while a save is outstanding; the save reloads on success. The
	/// result is dropped if the session was disposed or another load started
	/// meanwhile.
	pub async fn load(&self, id: SessionId) {
		let (path, surface, revision) = {
			let mut state = self.state.write();
			let Some(entry) = state.entry_mut(id) else {
				debug!(session = %id, "Load for unknown session ignored");
				return;
			};
			if entry.status == Status::Saving {
				debug!(session = %id, "Load ignored while saving");
				return;
			}
			entry.revision += 1;
			entry.status = Status::Loading;
			(entry.path.clone(), entry.surface.clone(), entry.revision)
		};

		debug!(session = %id, path = %path.display(), revision, "Loading document");
		surface.post(HostMessage::Loading);
		let result = self.service.parse(&path).await;

		let message = {
			let mut state = self.state.write();
			let entry = match state.entry_mut(id) {
				Some(entry) if entry.revision == revision => entry,
				Some(entry) => {
					debug!(session = %id, revision, current = entry.revision, "Dropping stale load result");
					return;
				}
				None => {
					debug!(session = %id, revision, "Dropping load result of disposed session");
					return;
				}
			};

			match result {
				Ok(doc) => {
					entry.status = Status::Ok;
					entry.last_error = None;
					entry.last_refreshed = Some(Local::now());
					info!(
						session = %id,
						revision,
						signals = doc.signals.len(),
						frames = doc.frames.len(),
						"Loaded document"
					);
					HostMessage::Ok {
						payload: Box::new(doc),
						revision,
					}
				}
				Err(err) => {
					let failure = Failure::from(err);
					warn!(session = %id, revision, error = %failure.message, "Load failed");
					entry.status = Status::Error;
					entry.last_error = Some(failure.clone());
					HostMessage::Error {
						payload: failure.message,
						traceback: failure.traceback,
					}
				}
			}
		};
		surface.post(message);
	}

	/// Saves `changes` to the session's file.
	///
	/// On success the user is notified and the file is reloaded. On failure
	/// the status returns to `ok` and the surface gets a `saveError`, so the
	/// pending edits it holds stay intact.
	pub async fn save(&self, id: SessionId, changes: ChangeSet) {
		let (path, surface, revision) = {
			let mut state = self.state.write();
			let Some(entry) = state.entry_mut(id) else {
				debug!(session = %id, "Save for unknown session ignored");
				return;
			};
			if !entry.status.can_transition(Status::Saving) {
				warn!(session = %id, status = %entry.status, "Save ignored outside ok state");
				return;
			}
			entry.status = Status::Saving;
			(entry.path.clone(), entry.surface.clone(), entry.revision)
		};

		debug!(session = %id, path = %path.display(), edits = changes.len(), "Saving changes");
		let result = self.service.save(&path, &changes).await;

		match result {
			Ok(()) => {
				{
					let mut state = self.state.write();
					let Some(entry) = state.entry_mut(id) else {
						debug!(session = %id, "Session disposed during save");
						return;
					};
					entry.status = Status::Loading;
				}
				self.notifier.info("LDF file saved successfully");
				self.load(id).await;
			}
			Err(err) => {
				let failure = Failure::from(err);
				{
					let mut state = self.state.write();
					let Some(entry) = state.entry_mut(id) else {
						debug!(session = %id, "Session disposed during failed save");
						return;
					};
					if entry.status != Status::Saving || entry.revision != revision {
						debug!(
							session = %id,
							status = %entry.status,
							revision,
							current = entry.revision,
							"Dropping superseded save failure"
						);
						return;
					}
					entry.status = Status::Ok;
					entry.last_error = Some(failure.clone());
				}
				warn!(session = %id, error = %failure.message, "Save failed");
				self.notifier.error(&format!("Failed to save LDF: {}", failure.message));
				surface.post(HostMessage::SaveError {
					payload: failure.message,
				});
			}
		}
	}

	/// Dispatches one message received from the surface of `id`.
	pub async fn handle_message(&self, id: SessionId, message: SurfaceMessage) {
		match message {
			SurfaceMessage::Ready | SurfaceMessage::RequestRefresh => self.load(id).await,
			SurfaceMessage::SaveChanges { payload } => self.save(id, payload).await,
			SurfaceMessage::Unknown => debug!(session = %id, "Ignoring unknown surface message"),
		}
	}

	/// Removes the session `id`. Returns false if it did not exist.
	pub fn dispose(&self, id: SessionId) -> bool {
		let mut state = self.state.write();
		let Some(path) = state.id_index.remove(&id) else {
			return false;
		};
		state.sessions.remove(&path);
		info!(session = %id, path = %path.display(), "Disposed session");
		true
	}

	/// Snapshot of the session open for `path`.
	pub fn session(&self, path: &Path) -> Option<SessionSnapshot> {
		self.state.read().sessions.get(&session_key(path)).map(SessionEntry::snapshot)
	}

	/// Snapshot of the session `id`.
	pub fn snapshot(&self, id: SessionId) -> Option<SessionSnapshot> {
		self.state.read().entry(id).map(SessionEntry::snapshot)
	}

	pub fn session_count(&self) -> usize {
		self.state.read().sessions.len()
	}
}

/// Canonical form of `path` used as the session key.
///
/// Paths that cannot be canonicalized (e.g. missing files) are made
/// absolute against the current directory instead.
fn session_key(path: &Path) -> PathBuf {
	if let Ok(canonical) = std::fs::canonicalize(path) {
		return canonical;
	}
	if path.is_absolute() {
		return path.to_path_buf();
	}
	std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
}
