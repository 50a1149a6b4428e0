//! Headless render surface speaking JSON lines.
//!
//! Each input line is one [`Command`]; each state change prints one JSON
//! object to the output. Input is not read while a load or save is
//! outstanding, mirroring a surface that disables its controls.

use std::path::Path;
use std::sync::Arc;

use ldfx_model::{Frame, Signal};
use ldfx_session::{
	HostMessage, SessionId, SessionManager, SurfaceError, SurfaceHandle, SurfaceMessage, SurfaceModel, SurfaceView,
};
use ldfx_tracker::{Collection, EntityKey, Tracked};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One user action read from the input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum Command {
	Add {
		collection: Collection,
	},
	Edit {
		collection: Collection,
		key: EntityKey,
	},
	/// Merges `fields` into the open draft.
	Set {
		collection: Collection,
		key: EntityKey,
		fields: Value,
	},
	Confirm {
		collection: Collection,
		key: EntityKey,
	},
	Cancel {
		collection: Collection,
		key: EntityKey,
	},
	Delete {
		collection: Collection,
		key: EntityKey,
	},
	/// Appends a mapping to the frame draft `key`, defaulting to the first available signal.
	MapAdd {
		key: EntityKey,
		#[serde(default)]
		signal: Option<String>,
	},
	MapRemove {
		key: EntityKey,
		index: usize,
	},
	Save,
	Refresh,
	Show,
	Quit,
}

#[derive(Debug, Error)]
pub enum CommandError {
	#[error("invalid command: {0}")]
	Parse(serde_json::Error),
	#[error(transparent)]
	Surface(#[from] SurfaceError),
	#[error("invalid fields: {0}")]
	Fields(#[from] serde_json::Error),
	#[error("fields must be a JSON object")]
	FieldsNotObject,
	#[error("no signal available to map")]
	NoSignal,
	#[error("mapping {0} does not exist")]
	NoMapping(usize),
}

/// What running a command asks of the loop.
enum Outcome {
	/// Print the current view.
	Changed,
	/// Print an event, then the view.
	Added(Collection, EntityKey),
	/// Forward a message to the host.
	Send(SurfaceMessage),
	Quit,
}

/// Surface handle that forwards host messages into the loop.
struct ChannelSurface {
	tx: mpsc::UnboundedSender<HostMessage>,
}

impl SurfaceHandle for ChannelSurface {
	fn post(&self, message: HostMessage) {
		if self.tx.send(message).is_err() {
			debug!("Surface loop gone, host message dropped");
		}
	}

	fn reveal(&self) {
		debug!("Reveal requested");
	}
}

/// Opens `path` and runs the surface until `quit` or end of input.
pub async fn run<R, W>(manager: Arc<SessionManager>, path: &Path, input: R, output: W) -> anyhow::Result<()>
where
	R: AsyncBufRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let (tx, mut host_rx) = mpsc::unbounded_channel();
	let surface: Arc<dyn SurfaceHandle> = Arc::new(ChannelSurface { tx });
	let id = manager.open(path, |_| surface)?.id();

	let mut out = Output { writer: output };
	let mut model = SurfaceModel::new();
	let mut lines = input.lines();

	let result = async {
		loop {
			if model.status().is_busy() {
				match host_rx.recv().await {
					Some(message) => receive(&mut model, &mut out, message).await?,
					None => break,
				}
				continue;
			}

			tokio::select! {
				biased;
				Some(message) = host_rx.recv() => receive(&mut model, &mut out, message).await?,
				line = lines.next_line() => {
					let Some(line) = line? else { break };
					if line.trim().is_empty() {
						continue;
					}
					if !handle_line(&manager, id, &mut model, &mut out, &line).await? {
						break;
					}
				}
			}
		}
		anyhow::Ok(())
	}
	.await;

	manager.dispose(id);
	model.dispose();
	result
}

async fn receive<W: AsyncWrite + Unpin>(model: &mut SurfaceModel, out: &mut Output<W>, message: HostMessage) -> std::io::Result<()> {
	if model.apply(message) {
		out.view(model).await?;
	}
	Ok(())
}

/// Runs one input line. Returns false on `quit`.
async fn handle_line<W: AsyncWrite + Unpin>(
	manager: &SessionManager,
	id: SessionId,
	model: &mut SurfaceModel,
	out: &mut Output<W>,
	line: &str,
) -> std::io::Result<bool> {
	let outcome = serde_json::from_str::<Command>(line)
		.map_err(CommandError::Parse)
		.and_then(|command| execute(model, command));

	match outcome {
		Ok(Outcome::Quit) => return Ok(false),
		Ok(Outcome::Changed) => out.view(model).await?,
		Ok(Outcome::Added(collection, key)) => {
			out.emit(&Event::Added {
				collection,
				key: &key,
			})
			.await?;
			out.view(model).await?;
		}
		Ok(Outcome::Send(message)) => {
			out.view(model).await?;
			manager.handle_message(id, message).await;
		}
		Err(err) => {
			warn!(error = %err, "Command rejected");
			out.emit(&Event::Error {
				message: err.to_string(),
			})
			.await?;
		}
	}
	Ok(true)
}

fn execute(model: &mut SurfaceModel, command: Command) -> Result<Outcome, CommandError> {
	match command {
		Command::Add { collection } => {
			let key = match collection {
				Collection::Signals => model.add::<Signal>()?,
				Collection::Frames => model.add::<Frame>()?,
			};
			Ok(Outcome::Added(collection, key))
		}
		Command::Edit { collection, key } => for_collection(collection, model, &key, Action::Edit),
		Command::Set { collection, key, fields } => for_collection(collection, model, &key, Action::Set(fields)),
		Command::Confirm { collection, key } => for_collection(collection, model, &key, Action::Confirm),
		Command::Cancel { collection, key } => for_collection(collection, model, &key, Action::Cancel),
		Command::Delete { collection, key } => for_collection(collection, model, &key, Action::Delete),
		Command::MapAdd { key, signal } => {
			let signal = match signal {
				Some(signal) => signal,
				None => model.available_signals().first().map(|s| s.to_string()).ok_or(CommandError::NoSignal)?,
			};
			model.draft_mut::<Frame>(&key)?.add_mapping(signal);
			Ok(Outcome::Changed)
		}
		Command::MapRemove { key, index } => {
			model
				.draft_mut::<Frame>(&key)?
				.remove_mapping(index)
				.ok_or(CommandError::NoMapping(index))?;
			Ok(Outcome::Changed)
		}
		Command::Save => Ok(Outcome::Send(model.save()?)),
		Command::Refresh => Ok(Outcome::Send(model.refresh()?)),
		Command::Show => Ok(Outcome::Changed),
		Command::Quit => Ok(Outcome::Quit),
	}
}

/// Per-entity step of a keyed command.
enum Action {
	Edit,
	Set(Value),
	Confirm,
	Cancel,
	Delete,
}

fn for_collection(collection: Collection, model: &mut SurfaceModel, key: &EntityKey, action: Action) -> Result<Outcome, CommandError> {
	match collection {
		Collection::Signals => run_action::<Signal>(model, key, action),
		Collection::Frames => run_action::<Frame>(model, key, action),
	}
}

fn run_action<T>(model: &mut SurfaceModel, key: &EntityKey, action: Action) -> Result<Outcome, CommandError>
where
	T: Tracked + Serialize + DeserializeOwned,
{
	match action {
		Action::Edit => model.edit::<T>(key)?,
		Action::Set(fields) => merge_fields(model.draft_mut::<T>(key)?, fields)?,
		Action::Confirm => model.confirm::<T>(key)?,
		Action::Cancel => model.cancel::<T>(key)?,
		Action::Delete => model.delete::<T>(key)?,
	}
	Ok(Outcome::Changed)
}

/// Overwrites the fields of `draft` named in `fields`.
fn merge_fields<T: Serialize + DeserializeOwned>(draft: &mut T, fields: Value) -> Result<(), CommandError> {
	let Value::Object(fields) = fields else {
		return Err(CommandError::FieldsNotObject);
	};
	let mut current = serde_json::to_value(&*draft)?;
	if let Value::Object(map) = &mut current {
		map.extend(fields);
	}
	*draft = serde_json::from_value(current)?;
	Ok(())
}

/// One line of output.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum Event<'a> {
	View { view: SurfaceView<'a> },
	Added { collection: Collection, key: &'a EntityKey },
	Error { message: String },
}

struct Output<W> {
	writer: W,
}

impl<W: AsyncWrite + Unpin> Output<W> {
	async fn emit(&mut self, event: &Event<'_>) -> std::io::Result<()> {
		let mut line = serde_json::to_vec(event).map_err(std::io::Error::other)?;
		line.push(b'\n');
		self.writer.write_all(&line).await?;
		self.writer.flush().await
	}

	async fn view(&mut self, model: &SurfaceModel) -> std::io::Result<()> {
		self.emit(&Event::View { view: model.view() }).await
	}
}
