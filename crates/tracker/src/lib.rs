//! Change tracking for document edits.
//!
//! # Mental model
//!
//! - The loaded [`ldfx_model::Document`] is an immutable base snapshot.
//! - [`ChangeTracker`] keeps one pending list per collection (signals, frames) holding
//!   at most one [`PendingEdit`] per [`EntityKey`].
//! - Open forms live in a draft side table keyed by identity; the base snapshot and the
//!   pending list are only touched on commit.
//! - The effective view is derived on demand from base + pending and is never stored.
//!
//! # Invariants
//!
//! - At most one pending edit per identity and collection.
//! - Synthetic identities come from a per-tracker [`SequenceGen`] and are never reused,
//!   not even across [`ChangeTracker::reset`].
//! - The effective view never contains two entities with the same name.
//! - A rejected commit leaves the draft open and the pending list untouched.
//! - Cancelling a draft discards every uncommitted field change.

mod change_set;
mod edit;
mod entity;
mod error;
mod key;
mod tracker;

pub use change_set::ChangeSet;
pub use edit::{EditAction, PendingEdit};
pub use entity::{Collection, FRAME_ID, FRAME_LENGTH, SIGNAL_OFFSET, SIGNAL_WIDTH, Tracked};
pub use error::{EditError, ValidationError, WireError};
pub use key::{EntityKey, SequenceGen};
pub use tracker::{ChangeTracker, EffectiveEntry, EntryState, PendingList};
