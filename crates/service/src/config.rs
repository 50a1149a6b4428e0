//! Configuration for invoking the external document service.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Interpreter used when none is configured, resolved through `PATH`.
pub const DEFAULT_INTERPRETER: &str = "python";

/// How to launch the document service process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
	/// Interpreter or executable, looked up on `PATH` when not absolute.
	pub interpreter: String,
	/// Extra arguments placed before the script path.
	pub args: Vec<String>,
	/// Service entry script; its directory becomes the working directory.
	pub script: PathBuf,
	/// Environment variables to set.
	pub env: HashMap<String, String>,
	/// Upper bound for a single call.
	pub timeout: Duration,
}

impl Default for ServiceConfig {
	fn default() -> Self {
		Self::new("parse_ldf.py")
	}
}

impl ServiceConfig {
	/// Creates a configuration running `script` with the default interpreter.
	pub fn new(script: impl Into<PathBuf>) -> Self {
		Self {
			interpreter: DEFAULT_INTERPRETER.to_string(),
			args: Vec::new(),
			script: script.into(),
			env: HashMap::new(),
			timeout: Duration::from_secs(60),
		}
	}

	/// Set the interpreter.
	pub fn interpreter(mut self, interpreter: impl Into<String>) -> Self {
		self.interpreter = interpreter.into();
		self
	}

	/// Add interpreter arguments.
	pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
		self.args = args.into_iter().map(Into::into).collect();
		self
	}

	/// Add environment variables.
	pub fn env(mut self, env: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
		self.env = env.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
		self
	}

	/// Set the per-call timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}
}
