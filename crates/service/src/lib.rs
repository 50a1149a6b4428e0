//! Document service boundary.
//!
//! The document service owns the LIN description grammar: it turns a file
//! into a [`Document`] and applies a [`ChangeSet`] back to the file. This
//! crate models it as the [`DocumentService`] capability with two
//! implementations:
//!
//! - [`ProcessService`]: runs an external interpreter once per call, passing a
//!   JSON request as the last argument and reading one JSON response from stdout.
//! - [`MemoryService`]: keeps documents in memory and applies change-sets in
//!   process, for tests and demos.
//!
//! Every failure, whether the process could not start, printed garbage, or
//! reported an error itself, comes back as a [`ServiceError`] that converts
//! into one uniform [`Failure`] shape for display.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use ldfx_model::Document;
use ldfx_tracker::ChangeSet;
use serde::Serialize;

mod config;
mod memory;
mod process;
mod protocol;

pub use config::ServiceConfig;
pub use memory::MemoryService;
pub use process::ProcessService;
pub use protocol::{RequestArgs, ServiceCommand, ServiceRequest, ServiceResponse};

/// A convenient type alias for `Result` with `E` = [`ServiceError`].
pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/// Parse/save capability backing every editing session.
#[async_trait]
pub trait DocumentService: Send + Sync {
	/// Reads and parses the file at `path`.
	async fn parse(&self, path: &Path) -> Result<Document>;

	/// Applies `changes` to the file at `path`.
	async fn save(&self, path: &Path, changes: &ChangeSet) -> Result<()>;
}

/// Failure of a document service call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
	/// The service process could not be started or waited on.
	#[error("Failed to start document service ({program}): {reason}")]
	Launch { program: String, reason: String },
	/// The service process did not answer in time and was killed.
	#[error("Document service did not respond within {0:?}")]
	Timeout(Duration),
	/// The output could not be decoded as a service response.
	#[error("Failed to parse document service output: {reason}")]
	Protocol { reason: String, raw: String },
	/// The service itself reported an error.
	#[error("{message}")]
	Domain { message: String, traceback: Option<String> },
}

impl ServiceError {
	/// Diagnostic detail, if the service supplied one.
	pub fn traceback(&self) -> Option<&str> {
		match self {
			Self::Domain { traceback, .. } => traceback.as_deref(),
			_ => None,
		}
	}

	/// Returns true for failures reported by the service rather than synthesized locally.
	pub const fn is_domain(&self) -> bool {
		matches!(self, Self::Domain { .. })
	}
}

/// Uniform, display-ready error shape shared by every failure class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub traceback: Option<String>,
}

impl From<ServiceError> for Failure {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Domain { message, traceback } => Self { message, traceback },
			ServiceError::Protocol { ref raw, .. } if !raw.trim().is_empty() => Self {
				message: format!("{err}\nRaw output: {}", raw.trim()),
				traceback: None,
			},
			other => Self {
				message: other.to_string(),
				traceback: None,
			},
		}
	}
}

#[cfg(test)]
mod tests;
