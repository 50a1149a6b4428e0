//! Pending edits and their wire representation.
//!
//! On the wire an edit is the entity's own fields flattened next to two
//! bookkeeping fields, e.g.
//! `{"_id":"new_1","_action":"create","name":"Spd2","width":12,...}`.
//! Deletes carry only `{"_action":"delete","name":...}`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entity::Tracked;
use crate::error::WireError;
use crate::key::EntityKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
	Create,
	Update,
	Delete,
}

/// One not-yet-persisted change to a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingEdit<T> {
	/// A new entity under a synthetic key.
	Create { key: EntityKey, entity: T },
	/// Replacement of the base entity identified by `key`.
	Update { key: EntityKey, entity: T },
	/// Removal of the base entity called `name`.
	Delete { name: String },
}

impl<T> PendingEdit<T> {
	pub const fn action(&self) -> EditAction {
		match self {
			Self::Create { .. } => EditAction::Create,
			Self::Update { .. } => EditAction::Update,
			Self::Delete { .. } => EditAction::Delete,
		}
	}

	/// Entity payload of creates and updates.
	pub const fn entity(&self) -> Option<&T> {
		match self {
			Self::Create { entity, .. } | Self::Update { entity, .. } => Some(entity),
			Self::Delete { .. } => None,
		}
	}

	/// Returns true if this edit is the pending edit for `key`.
	pub fn targets(&self, key: &EntityKey) -> bool {
		match self {
			Self::Create { key: own, .. } | Self::Update { key: own, .. } => own == key,
			Self::Delete { name } => key.name() == Some(name.as_str()),
		}
	}
}

#[derive(Serialize)]
struct WireEditRef<'a, T> {
	#[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
	id: Option<&'a EntityKey>,
	#[serde(rename = "_action")]
	action: EditAction,
	#[serde(flatten)]
	body: WireBodyRef<'a, T>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireBodyRef<'a, T> {
	Entity(&'a T),
	Name { name: &'a str },
}

#[derive(Deserialize)]
struct WireEdit<T> {
	#[serde(rename = "_id", default)]
	id: Option<EntityKey>,
	#[serde(rename = "_action")]
	action: EditAction,
	#[serde(flatten)]
	body: WireBody<T>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireBody<T> {
	Entity(T),
	Name { name: String },
}

impl<T: Tracked> TryFrom<WireEdit<T>> for PendingEdit<T> {
	type Error = WireError;

	fn try_from(wire: WireEdit<T>) -> Result<Self, Self::Error> {
		match (wire.action, wire.body) {
			(EditAction::Delete, WireBody::Name { name }) => Ok(Self::Delete { name }),
			(EditAction::Delete, WireBody::Entity(entity)) => Ok(Self::Delete {
				name: wire.id.and_then(|k| k.name().map(str::to_string)).unwrap_or_else(|| entity.name().to_string()),
			}),
			(EditAction::Create, WireBody::Entity(entity)) => Ok(Self::Create {
				key: wire.id.ok_or(WireError::MissingId)?,
				entity,
			}),
			// Updates always target a base entity, even one named `new_<n>`.
			(EditAction::Update, WireBody::Entity(entity)) => Ok(Self::Update {
				key: wire.id.map_or_else(|| EntityKey::named(entity.name()), EntityKey::into_named),
				entity,
			}),
			(EditAction::Create, WireBody::Name { .. }) => Err(WireError::MissingEntity("create")),
			(EditAction::Update, WireBody::Name { .. }) => Err(WireError::MissingEntity("update")),
		}
	}
}

impl<T: Serialize> Serialize for PendingEdit<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let wire = match self {
			Self::Create { key, entity } | Self::Update { key, entity } => WireEditRef {
				id: Some(key),
				action: self.action(),
				body: WireBodyRef::Entity(entity),
			},
			Self::Delete { name } => WireEditRef {
				id: None,
				action: EditAction::Delete,
				body: WireBodyRef::Name { name },
			},
		};
		wire.serialize(serializer)
	}
}

impl<'de, T> Deserialize<'de> for PendingEdit<T>
where
	T: Tracked + Deserialize<'de>,
{
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let wire = WireEdit::<T>::deserialize(deserializer)?;
		Self::try_from(wire).map_err(D::Error::custom)
	}
}
