use std::collections::{HashMap, HashSet};

use ldfx_model::{Frame, Signal};
use serde::Serialize;
use tracing::debug;

use crate::change_set::ChangeSet;
use crate::edit::{EditAction, PendingEdit};
use crate::entity::Tracked;
use crate::error::{EditError, ValidationError};
use crate::key::{EntityKey, SequenceGen};

/// Pending edits and open drafts of one collection.
#[derive(Debug)]
pub struct PendingList<T> {
	/// Insertion-ordered, at most one entry per identity.
	edits: Vec<PendingEdit<T>>,
	/// Working copies of entities with an open form.
	drafts: HashMap<EntityKey, T>,
}

impl<T> Default for PendingList<T> {
	fn default() -> Self {
		Self {
			edits: Vec::new(),
			drafts: HashMap::new(),
		}
	}
}

impl<T> PendingList<T> {
	pub fn edits(&self) -> &[PendingEdit<T>] {
		&self.edits
	}

	pub fn is_empty(&self) -> bool {
		self.edits.is_empty()
	}

	fn position(&self, key: &EntityKey) -> Option<usize> {
		self.edits.iter().position(|e| e.targets(key))
	}

	fn clear(&mut self) {
		self.edits.clear();
		self.drafts.clear();
	}
}

/// How an effective entry relates to the base document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryState {
	Pristine,
	Updated,
	Created,
}

/// One row of the effective (merged) view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveEntry<'a, T> {
	pub key: EntityKey,
	pub state: EntryState,
	/// True while a draft form is open for this entry.
	pub editing: bool,
	pub entity: &'a T,
}

/// Owner of the pending edits of one editing session.
///
/// All operations that need the base collection take it as a slice; the
/// tracker never holds or mutates the loaded document.
#[derive(Debug, Default)]
pub struct ChangeTracker {
	seq: SequenceGen,
	pub(crate) signals: PendingList<Signal>,
	pub(crate) frames: PendingList<Frame>,
}

impl ChangeTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Pending list of collection `T`.
	pub fn pending<T: Tracked>(&self) -> &PendingList<T> {
		T::list(self)
	}

	/// Inserts a pending create built from the next sequence number and opens
	/// a draft for it.
	pub fn record_create_with<T: Tracked>(&mut self, build: impl FnOnce(u64) -> T) -> EntityKey {
		let key = EntityKey::Synthetic(self.seq.next());
		let entity = build(self.seq.last());
		let list = T::list_mut(self);
		list.drafts.insert(key.clone(), entity.clone());
		list.edits.push(PendingEdit::Create {
			key: key.clone(),
			entity,
		});
		debug!(collection = %T::COLLECTION, %key, "Recorded create");
		key
	}

	/// Inserts a pending create holding `defaults`.
	pub fn record_create<T: Tracked>(&mut self, defaults: T) -> EntityKey {
		self.record_create_with(|_| defaults)
	}

	/// Key of the entry `key` refers to when it arrived as text.
	///
	/// `new_<n>` means the pending create `n` if there is one, otherwise the
	/// base entity of that name.
	pub fn lookup_key<T: Tracked>(&self, base: &[T], key: &EntityKey) -> EntityKey {
		let created = T::list(self).edits.iter().any(|e| e.action() == EditAction::Create && e.targets(key));
		if key.is_synthetic() && !created {
			let named = key.clone().into_named();
			if named.name().is_some_and(|name| base.iter().any(|b| b.name() == name)) {
				return named;
			}
		}
		key.clone()
	}

	/// Opens a draft for the effective entity `key`.
	///
	/// An already open draft is kept as is.
	pub fn begin_edit<T: Tracked>(&mut self, base: &[T], key: &EntityKey) -> Result<(), EditError> {
		let entity = self.resolve(base, key)?.clone();
		T::list_mut(self).drafts.entry(key.clone()).or_insert(entity);
		Ok(())
	}

	/// Returns true while a draft is open for `key`.
	pub fn is_editing<T: Tracked>(&self, key: &EntityKey) -> bool {
		T::list(self).drafts.contains_key(key)
	}

	pub fn draft<T: Tracked>(&self, key: &EntityKey) -> Option<&T> {
		T::list(self).drafts.get(key)
	}

	/// Mutable access to an open draft, for in-form field changes.
	pub fn draft_mut<T: Tracked>(&mut self, key: &EntityKey) -> Option<&mut T> {
		T::list_mut(self).drafts.get_mut(key)
	}

	/// Validates `fields` and records them as the pending state of `key`.
	///
	/// An existing pending edit for `key` is overwritten and keeps its action;
	/// otherwise a new `update` is appended. On a validation failure the draft
	/// is left open holding `fields` and nothing is committed.
	pub fn commit_edit<T: Tracked>(&mut self, base: &[T], key: &EntityKey, fields: T) -> Result<(), EditError> {
		self.resolve(base, key)?;

		if let Err(invalid) = self.check(base, key, &fields) {
			debug!(collection = %T::COLLECTION, %key, error = %invalid, "Rejected edit");
			T::list_mut(self).drafts.insert(key.clone(), fields);
			return Err(invalid.into());
		}

		let list = T::list_mut(self);
		list.drafts.remove(key);
		match list.position(key) {
			// Deleted entities never resolve, so only creates and updates can match here.
			Some(i) => {
				if let PendingEdit::Create { entity, .. } | PendingEdit::Update { entity, .. } = &mut list.edits[i] {
					*entity = fields;
				}
			}
			None => list.edits.push(PendingEdit::Update {
				key: key.clone(),
				entity: fields,
			}),
		}
		debug!(collection = %T::COLLECTION, %key, "Committed edit");
		Ok(())
	}

	/// Commits the open draft of `key`.
	pub fn commit_draft<T: Tracked>(&mut self, base: &[T], key: &EntityKey) -> Result<(), EditError> {
		let fields = self.draft::<T>(key).cloned().ok_or_else(|| EditError::NotEditing {
			collection: T::COLLECTION,
			key: key.clone(),
		})?;
		self.commit_edit(base, key, fields)
	}

	/// Closes the draft of `key`, discarding uncommitted field changes.
	///
	/// A synthetic create is removed from the pending list entirely.
	pub fn cancel_edit<T: Tracked>(&mut self, key: &EntityKey) {
		let list = T::list_mut(self);
		list.drafts.remove(key);
		if key.is_synthetic() {
			list.edits.retain(|e| !e.targets(key));
		}
	}

	/// Deletes the effective entity `key`.
	///
	/// A pending create simply disappears; any other pending edit for the
	/// identity is replaced by a `delete` of its base name.
	pub fn delete<T: Tracked>(&mut self, base: &[T], key: &EntityKey) -> Result<(), EditError> {
		self.resolve(base, key)?;
		let list = T::list_mut(self);
		list.drafts.remove(key);
		list.edits.retain(|e| !e.targets(key));

		if let Some(name) = key.name() {
			list.edits.push(PendingEdit::Delete { name: name.to_string() });
		}
		debug!(collection = %T::COLLECTION, %key, "Recorded delete");
		Ok(())
	}

	/// Drops every pending edit and draft of both collections.
	///
	/// The sequence generator keeps counting.
	pub fn reset(&mut self) {
		self.signals.clear();
		self.frames.clear();
	}

	pub fn has_changes(&self) -> bool {
		!self.signals.is_empty() || !self.frames.is_empty()
	}

	pub fn to_change_set(&self) -> ChangeSet {
		ChangeSet {
			signals: self.signals.edits.clone(),
			frames: self.frames.edits.clone(),
		}
	}

	/// Merged view of `base` and the pending list of `T`.
	///
	/// Base order is kept with deleted entries dropped and updated entries
	/// replaced in place; creates follow in insertion order.
	pub fn effective<'a, T: Tracked>(&'a self, base: &'a [T]) -> Vec<EffectiveEntry<'a, T>> {
		let list = T::list(self);
		let mut deleted = HashSet::new();
		let mut updated = HashMap::new();
		for edit in &list.edits {
			match edit {
				PendingEdit::Delete { name } => {
					deleted.insert(name.as_str());
				}
				PendingEdit::Update { key, entity } => {
					if let Some(name) = key.name() {
						updated.insert(name, entity);
					}
				}
				PendingEdit::Create { .. } => {}
			}
		}

		let kept = base.iter().filter(|b| !deleted.contains(b.name())).map(|b| {
			let key = EntityKey::named(b.name());
			let editing = list.drafts.contains_key(&key);
			match updated.get(b.name()) {
				Some(entity) => EffectiveEntry {
					key,
					state: EntryState::Updated,
					editing,
					entity: *entity,
				},
				None => EffectiveEntry {
					key,
					state: EntryState::Pristine,
					editing,
					entity: b,
				},
			}
		});

		let created = list.edits.iter().filter_map(|e| match e {
			PendingEdit::Create { key, entity } => Some(EffectiveEntry {
				key: key.clone(),
				state: EntryState::Created,
				editing: list.drafts.contains_key(key),
				entity,
			}),
			_ => None,
		});

		kept.chain(created).collect()
	}

	/// Effective entity currently identified by `key`.
	fn resolve<'a, T: Tracked>(&'a self, base: &'a [T], key: &EntityKey) -> Result<&'a T, EditError> {
		self.effective(base)
			.into_iter()
			.find(|e| &e.key == key)
			.map(|e| e.entity)
			.ok_or_else(|| EditError::NotFound {
				collection: T::COLLECTION,
				key: key.clone(),
			})
	}

	/// Field constraints plus name uniqueness against the rest of the effective view.
	fn check<T: Tracked>(&self, base: &[T], key: &EntityKey, fields: &T) -> Result<(), ValidationError> {
		fields.validate()?;
		let clash = self
			.effective(base)
			.iter()
			.any(|e| &e.key != key && e.entity.name() == fields.name());
		if clash {
			return Err(ValidationError::DuplicateName {
				collection: T::COLLECTION,
				name: fields.name().to_string(),
			});
		}
		Ok(())
	}
}
