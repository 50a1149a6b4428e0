//! In-process document service.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ldfx_model::{Document, Frame, Signal};
use ldfx_tracker::{ChangeSet, PendingEdit};
use parking_lot::Mutex;
use tracing::debug;

use crate::{DocumentService, Result, ServiceError};

/// Document service holding its documents in memory.
///
/// Saves apply the change-set the same way the external service does:
/// edits run in order, updates replace the entity named by their key, and
/// frame mappings that point at unknown signals are dropped.
#[derive(Debug, Default)]
pub struct MemoryService {
	docs: Mutex<HashMap<PathBuf, Document>>,
	fail_next_save: Mutex<Option<ServiceError>>,
	parses: AtomicUsize,
	saves: AtomicUsize,
}

impl MemoryService {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `doc` as the content of `path`, replacing any previous content.
	pub fn seed(&self, path: impl Into<PathBuf>, doc: Document) {
		self.docs.lock().insert(path.into(), doc);
	}

	/// Current content of `path`.
	pub fn document(&self, path: &Path) -> Option<Document> {
		self.docs.lock().get(path).cloned()
	}

	/// Makes the next save fail with `err` without touching the document.
	pub fn fail_next_save(&self, err: ServiceError) {
		*self.fail_next_save.lock() = Some(err);
	}

	pub fn parse_calls(&self) -> usize {
		self.parses.load(Ordering::SeqCst)
	}

	pub fn save_calls(&self) -> usize {
		self.saves.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl DocumentService for MemoryService {
	async fn parse(&self, path: &Path) -> Result<Document> {
		self.parses.fetch_add(1, Ordering::SeqCst);
		self.docs.lock().get(path).cloned().ok_or_else(|| ServiceError::Domain {
			message: format!("LDF file not found: {}", path.display()),
			traceback: None,
		})
	}

	async fn save(&self, path: &Path, changes: &ChangeSet) -> Result<()> {
		self.saves.fetch_add(1, Ordering::SeqCst);
		if let Some(err) = self.fail_next_save.lock().take() {
			return Err(err);
		}

		let mut docs = self.docs.lock();
		let doc = docs.get_mut(path).ok_or_else(|| ServiceError::Domain {
			message: format!("Failed to save LDF: file not found: {}", path.display()),
			traceback: None,
		})?;
		apply_changes(doc, changes);
		debug!(path = %path.display(), edits = changes.len(), "Applied change-set in memory");
		Ok(())
	}
}

/// Applies `changes` to `doc`, signals first.
pub(crate) fn apply_changes(doc: &mut Document, changes: &ChangeSet) {
	for edit in &changes.signals {
		match edit {
			PendingEdit::Delete { name } => doc.signals.retain(|s| &s.name != name),
			PendingEdit::Create { entity, .. } => {
				let signal = attach_signal(doc, entity.clone());
				let name = signal.name.clone();
				upsert(&mut doc.signals, &name, signal, |s| &s.name);
			}
			PendingEdit::Update { key, entity } => {
				let signal = attach_signal(doc, entity.clone());
				if let Some(name) = key.name()
					&& let Some(slot) = doc.signals.iter_mut().find(|s| s.name == name)
				{
					*slot = signal;
				}
			}
		}
	}

	for edit in &changes.frames {
		match edit {
			PendingEdit::Delete { name } => doc.frames.retain(|f| &f.name != name),
			PendingEdit::Create { entity, .. } => {
				let frame = attach_frame(doc, entity.clone());
				let name = frame.name.clone();
				upsert(&mut doc.frames, &name, frame, |f| &f.name);
			}
			PendingEdit::Update { key, entity } => {
				let frame = attach_frame(doc, entity.clone());
				let target = key.name().unwrap_or(&entity.name).to_string();
				upsert(&mut doc.frames, &target, frame, |f| &f.name);
			}
		}
	}
}

fn upsert<T>(items: &mut Vec<T>, name: &str, item: T, name_of: impl Fn(&T) -> &String) {
	match items.iter_mut().find(|i| name_of(i) == name) {
		Some(slot) => *slot = item,
		None => items.push(item),
	}
}

/// Drops node references that do not resolve in `doc`.
fn attach_signal(doc: &Document, mut signal: Signal) -> Signal {
	if !doc.has_node(&signal.publisher) {
		signal.publisher.clear();
	}
	signal.subscribers.retain(|s| doc.has_node(s));
	signal
}

/// Drops mappings of unknown signals and an unknown publisher.
fn attach_frame(doc: &Document, mut frame: Frame) -> Frame {
	if !doc.has_node(&frame.publisher) {
		frame.publisher.clear();
	}
	frame.mappings.retain(|m| doc.signal(&m.signal).is_some());
	frame
}
