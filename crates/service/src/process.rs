//! Document service backed by a short-lived child process per call.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use ldfx_model::Document;
use ldfx_tracker::ChangeSet;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::protocol::{ServiceRequest, ServiceResponse};
use crate::{DocumentService, Result, ServiceError};

/// Runs `<interpreter> [args..] <script> <request-json>` for every call.
///
/// The child's stdout must hold exactly one JSON response. Anything written to
/// stderr is logged and otherwise ignored. The child is killed if the call is
/// dropped or times out.
#[derive(Debug, Clone)]
pub struct ProcessService {
	config: ServiceConfig,
}

impl ProcessService {
	pub fn new(config: ServiceConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &ServiceConfig {
		&self.config
	}

	async fn call(&self, request: ServiceRequest<'_>) -> Result<ServiceResponse> {
		let payload = serde_json::to_string(&request).map_err(|e| ServiceError::Protocol {
			reason: format!("cannot encode request: {e}"),
			raw: String::new(),
		})?;

		let mut cmd = Command::new(&self.config.interpreter);
		cmd.args(&self.config.args)
			.arg(&self.config.script)
			.arg(&payload)
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true);

		if let Some(dir) = self.config.script.parent()
			&& !dir.as_os_str().is_empty()
		{
			cmd.current_dir(dir);
		}
		for (key, value) in &self.config.env {
			cmd.env(key, value);
		}

		debug!(
			command = %request.command,
			path = %request.args.path.display(),
			interpreter = %self.config.interpreter,
			"Invoking document service"
		);

		let child = cmd.spawn().map_err(|e| self.launch_error(e))?;
		let output = match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await {
			Ok(Ok(output)) => output,
			Ok(Err(e)) => return Err(self.launch_error(e)),
			Err(_) => return Err(ServiceError::Timeout(self.config.timeout)),
		};

		let stderr = String::from_utf8_lossy(&output.stderr);
		if !stderr.trim().is_empty() {
			warn!(command = %request.command, stderr = %stderr.trim(), "Document service stderr");
		}

		decode_response(&String::from_utf8_lossy(&output.stdout), output.status)
	}

	fn launch_error(&self, err: std::io::Error) -> ServiceError {
		ServiceError::Launch {
			program: self.config.interpreter.clone(),
			reason: err.to_string(),
		}
	}
}

/// Decodes the single JSON response printed by the service.
fn decode_response(stdout: &str, status: ExitStatus) -> Result<ServiceResponse> {
	serde_json::from_str::<ServiceResponse>(stdout.trim()).map_err(|e| {
		let reason = if status.success() {
			e.to_string()
		} else {
			format!("{e} (process exited with {status})")
		};
		ServiceError::Protocol {
			reason,
			raw: stdout.to_string(),
		}
	})
}

#[async_trait]
impl DocumentService for ProcessService {
	async fn parse(&self, path: &Path) -> Result<Document> {
		self.call(ServiceRequest::parse(path)).await?.into_document()
	}

	async fn save(&self, path: &Path, changes: &ChangeSet) -> Result<()> {
		let data: Option<Value> = self.call(ServiceRequest::save(path, changes)).await?.into_result()?;
		debug!(path = %path.display(), edits = changes.len(), has_data = data.is_some(), "Document service saved");
		Ok(())
	}
}
