//! JSON request/response shapes exchanged with the document service process.

use std::fmt;
use std::path::Path;

use ldfx_model::Document;
use ldfx_tracker::ChangeSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCommand {
	Parse,
	Save,
}

impl fmt::Display for ServiceCommand {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Parse => "parse",
			Self::Save => "save",
		})
	}
}

/// `{ "command": ..., "args": { "path": ..., "data"?: ... } }`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ServiceRequest<'a> {
	pub command: ServiceCommand,
	pub args: RequestArgs<'a>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RequestArgs<'a> {
	pub path: &'a Path,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<&'a ChangeSet>,
}

impl<'a> ServiceRequest<'a> {
	pub fn parse(path: &'a Path) -> Self {
		Self {
			command: ServiceCommand::Parse,
			args: RequestArgs { path, data: None },
		}
	}

	pub fn save(path: &'a Path, changes: &'a ChangeSet) -> Self {
		Self {
			command: ServiceCommand::Save,
			args: RequestArgs {
				path,
				data: Some(changes),
			},
		}
	}
}

/// `{ "status": "ok", "data"?: ... }` or `{ "status": "error", "message": ..., "traceback"?: ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServiceResponse {
	Ok {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		data: Option<Value>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		message: Option<String>,
	},
	Error {
		message: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		traceback: Option<String>,
	},
}

impl ServiceResponse {
	/// Splits the response into its payload or a domain error.
	pub fn into_result(self) -> Result<Option<Value>> {
		match self {
			Self::Ok { data, .. } => Ok(data),
			Self::Error { message, traceback } => Err(ServiceError::Domain { message, traceback }),
		}
	}

	/// Decodes the `data` of a parse response into a [`Document`].
	pub fn into_document(self) -> Result<Document> {
		let data = self.into_result()?.ok_or_else(|| ServiceError::Protocol {
			reason: "parse response carries no data".into(),
			raw: String::new(),
		})?;
		serde_json::from_value(data).map_err(|e| ServiceError::Protocol {
			reason: e.to_string(),
			raw: String::new(),
		})
	}
}
