//! Editing sessions for LIN description files.
//!
//! # Purpose
//!
//! - Bind one file path to exactly one render surface and one loaded document.
//! - Define the message protocol between the host ([`SessionManager`]) and a
//!   render surface ([`SurfaceModel`]).
//! - Resolve which file the open command targets.
//!
//! # Mental model
//!
//! - The host owns sessions and talks to the [`ldfx_service::DocumentService`].
//!   It never sees individual edits; it only loads documents and saves the
//!   change-sets the surface sends it.
//! - The surface owns the [`ldfx_tracker::ChangeTracker`] and the last
//!   document it was sent. It runs the [`Status`] state machine and gates
//!   every edit on `ok`.
//! - Both sides only exchange [`HostMessage`] and [`SurfaceMessage`] values.
//!
//! # Invariants
//!
//! - At most one session per canonical path; opening again reveals it.
//! - Every load gets a fresh per-session revision. A finished load whose
//!   revision is no longer current, or whose session was disposed, posts nothing.
//! - Locks are never held across a document service call.
//! - A failed save leaves the status at `ok` and the surface keeps its edits.
//! - A disposed session receives no further messages.

mod command;
mod manager;
mod notify;
mod protocol;
mod status;
mod surface;

pub use command::{ActiveEditor, TargetError, resolve_target};
pub use manager::{OpenDisposition, SessionError, SessionId, SessionManager, SessionSnapshot};
pub use notify::{LogNotifier, Notifier};
pub use protocol::{HostMessage, SurfaceHandle, SurfaceMessage};
pub use status::Status;
pub use surface::{DocumentView, SurfaceError, SurfaceModel, SurfaceView};
