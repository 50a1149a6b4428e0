//! ldfx: open a LIN description file and edit it through a JSON-lines surface
//! on stdin/stdout.

mod cli;
mod config;
mod headless;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use config::{Config, INTERPRETER_ENV, Overrides};
use ldfx_model::Document;
use ldfx_service::{DocumentService, MemoryService, ProcessService};
use ldfx_session::{LogNotifier, Notifier, SessionManager, resolve_target};
use tokio::io::BufReader;
use tracing::info;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let notifier = Arc::new(LogNotifier);
	let path = match resolve_target(cli.file.as_deref(), cli.active_editor().as_ref()) {
		Ok(path) => path,
		Err(err) => {
			notifier.warn(&err.to_string());
			return Ok(());
		}
	};

	let service = build_service(&cli, &path)?;
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.context("failed to start async runtime")?;

	runtime.block_on(async move {
		let manager = Arc::new(SessionManager::new(service, notifier));
		let stdin = BufReader::new(tokio::io::stdin());
		headless::run(manager, &path, stdin, tokio::io::stdout()).await
	})
}

fn build_service(cli: &Cli, path: &Path) -> anyhow::Result<Arc<dyn DocumentService>> {
	if cli.in_memory {
		let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		let doc: Document =
			serde_json::from_str(&text).with_context(|| format!("{} is not a JSON document dump", path.display()))?;
		let service = MemoryService::new();
		service.seed(std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()), doc);
		info!(path = %path.display(), "Serving document from memory");
		return Ok(Arc::new(service));
	}

	let config_path = cli.config.clone().or_else(Config::default_path);
	let mut config = match &config_path {
		Some(config_path) => Config::load(config_path)?,
		None => Config::default(),
	};
	config.apply_env_interpreter(std::env::var(INTERPRETER_ENV).ok());

	let service = config.service_config(&Overrides {
		interpreter: cli.interpreter.clone(),
		script: cli.script.clone(),
	});
	info!(
		interpreter = %service.interpreter,
		script = %service.script.display(),
		timeout = ?service.timeout,
		"Using document service"
	);
	Ok(Arc::new(ProcessService::new(service)))
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("ldfx=debug,info")
			} else {
				EnvFilter::new("ldfx=info,warn")
			}
		})
	};

	// LDFX_LOG_DIR sends logs to a per-process file instead of stderr.
	if let Some(log_dir) = std::env::var("LDFX_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("ldfx.{}.log", std::process::id()));
		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);
			tracing_subscriber::registry().with(filter()).with(file_layer).init();
			tracing::info!(path = ?log_path, "Tracing initialized");
			return;
		}
	}

	tracing_subscriber::registry()
		.with(filter())
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}
