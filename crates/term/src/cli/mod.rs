//! CLI schema for the ldfx binary.

use std::path::PathBuf;

use clap::Parser;
use ldfx_session::ActiveEditor;

#[derive(Parser, Debug)]
#[command(name = "ldfx")]
#[command(about = "Edit LIN description files through a JSON-lines surface")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// LDF file to open (falls back to --active-file)
	pub file: Option<PathBuf>,

	/// File shown in the active editor, used when FILE is omitted
	#[arg(long, value_name = "PATH")]
	pub active_file: Option<PathBuf>,

	/// The active editor holds a buffer that was never saved
	#[arg(long, requires = "active_file")]
	pub untitled: bool,

	/// Interpreter used to run the document service (resolved via PATH)
	#[arg(long, value_name = "PROGRAM")]
	pub interpreter: Option<String>,

	/// Document service script
	#[arg(long, value_name = "PATH")]
	pub script: Option<PathBuf>,

	/// Configuration file (defaults to <config dir>/ldfx/config.toml)
	#[arg(long, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Read the target as a JSON document dump and keep saves in memory
	#[arg(long)]
	pub in_memory: bool,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}

impl Cli {
	/// The editor context the open command resolves against.
	pub fn active_editor(&self) -> Option<ActiveEditor> {
		self.active_file.as_ref().map(|path| ActiveEditor {
			path: path.clone(),
			untitled: self.untitled,
		})
	}
}

#[cfg(test)]
mod tests;
