//! User configuration loaded from `config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ldfx_service::ServiceConfig;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable overriding `service.interpreter`.
pub const INTERPRETER_ENV: &str = "LDFX_INTERPRETER";

/// Script name looked up next to the executable when none is configured.
const DEFAULT_SCRIPT: &str = "parse_ldf.py";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub service: ServiceSection,
}

/// `[service]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSection {
	/// Interpreter or executable, resolved via `PATH` when bare.
	pub interpreter: Option<String>,
	/// Arguments placed before the script.
	pub args: Vec<String>,
	pub script: Option<PathBuf>,
	pub timeout_secs: Option<u64>,
}

/// Values given on the command line, which win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub interpreter: Option<String>,
	pub script: Option<PathBuf>,
}

impl Config {
	/// `<config dir>/ldfx/config.toml`, if the platform has a config dir.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("ldfx").join("config.toml"))
	}

	/// Reads `path`; a missing file yields the defaults.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = match std::fs::read_to_string(path) {
			Ok(text) => text,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(source) => {
				return Err(ConfigError::Read {
					path: path.to_path_buf(),
					source,
				});
			}
		};
		toml::from_str(&text).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Replaces the interpreter with `value` when it is set and non-empty.
	pub fn apply_env_interpreter(&mut self, value: Option<String>) {
		if let Some(interpreter) = value.filter(|v| !v.trim().is_empty()) {
			self.service.interpreter = Some(interpreter);
		}
	}

	/// Builds the service configuration; `overrides` win, then the file, then defaults.
	pub fn service_config(&self, overrides: &Overrides) -> ServiceConfig {
		let script = overrides
			.script
			.clone()
			.or_else(|| self.service.script.clone())
			.unwrap_or_else(default_script);

		let mut config = ServiceConfig::new(script).args(self.service.args.iter().cloned());
		if let Some(interpreter) = overrides.interpreter.as_ref().or(self.service.interpreter.as_ref()) {
			config = config.interpreter(interpreter.clone());
		}
		if let Some(secs) = self.service.timeout_secs {
			config = config.timeout(Duration::from_secs(secs));
		}
		config
	}
}

/// `python/parse_ldf.py` next to the executable, else the bare script name.
fn default_script() -> PathBuf {
	std::env::current_exe()
		.ok()
		.and_then(|exe| exe.parent().map(|dir| dir.join("python").join(DEFAULT_SCRIPT)))
		.unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPT))
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn missing_file_gives_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = Config::load(&dir.path().join("config.toml")).unwrap();
		assert_eq!(config, Config::default());
	}

	#[test]
	fn file_values_are_used() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(
			&path,
			r#"
[service]
interpreter = "python3"
args = ["-X", "utf8"]
script = "/opt/ldf/parse_ldf.py"
timeout_secs = 5
"#,
		)
		.unwrap();

		let service = Config::load(&path).unwrap().service_config(&Overrides::default());
		assert_eq!(service.interpreter, "python3");
		assert_eq!(service.args, vec!["-X", "utf8"]);
		assert_eq!(service.script, PathBuf::from("/opt/ldf/parse_ldf.py"));
		assert_eq!(service.timeout, Duration::from_secs(5));
	}

	#[test]
	fn env_and_cli_override_file() {
		let mut config: Config = toml::from_str("[service]\ninterpreter = \"python3\"\n").unwrap();
		config.apply_env_interpreter(Some("/venv/bin/python".into()));
		assert_eq!(config.service_config(&Overrides::default()).interpreter, "/venv/bin/python");

		config.apply_env_interpreter(Some("  ".into()));
		assert_eq!(config.service.interpreter.as_deref(), Some("/venv/bin/python"));

		let overrides = Overrides {
			interpreter: Some("pypy".into()),
			script: Some(PathBuf::from("local.py")),
		};
		let service = config.service_config(&overrides);
		assert_eq!(service.interpreter, "pypy");
		assert_eq!(service.script, PathBuf::from("local.py"));
	}

	#[test]
	fn defaults_use_bare_interpreter() {
		let service = Config::default().service_config(&Overrides::default());
		assert_eq!(service.interpreter, "python");
		assert!(service.script.ends_with("parse_ldf.py"));
		assert_eq!(service.timeout, Duration::from_secs(60));
	}

	#[test]
	fn unknown_keys_are_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "[service]\npython = \"python3\"\n").unwrap();
		let err = Config::load(&path).unwrap_err();
		assert!(matches!(err, ConfigError::Parse { .. }));
		assert!(err.to_string().starts_with("failed to parse"));
	}
}
