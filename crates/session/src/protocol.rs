//! Messages exchanged between the host and a render surface.
//!
//! Both directions are JSON objects tagged by `type`:
//!
//! - host to surface: `loading`, `ok`, `error`, `saveError`
//! - surface to host: `ready`, `requestRefresh`, `saveChanges`

use ldfx_model::Document;
use ldfx_tracker::ChangeSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
	/// A load has started.
	Loading,
	/// A load finished; `payload` is the new base document.
	Ok {
		payload: Box<Document>,
		/// Revision of the load that produced `payload`.
		#[serde(default)]
		revision: u64,
	},
	/// A load failed.
	Error {
		payload: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		traceback: Option<String>,
	},
	/// A save failed; the previously loaded document stays valid.
	SaveError { payload: String },
}

impl HostMessage {
	/// Wire tag, for logging.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Loading => "loading",
			Self::Ok { .. } => "ok",
			Self::Error { .. } => "error",
			Self::SaveError { .. } => "saveError",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurfaceMessage {
	/// The surface finished initializing and wants a document.
	Ready,
	/// The user discarded local edits and asked for a reload.
	RequestRefresh,
	/// Persist `payload`.
	SaveChanges { payload: ChangeSet },
	/// Any tag this host does not know; ignored.
	#[serde(other)]
	Unknown,
}

/// Host-side handle of one render surface.
pub trait SurfaceHandle: Send + Sync {
	/// Delivers `message` to the surface.
	fn post(&self, message: HostMessage);

	/// Brings the surface to the foreground.
	fn reveal(&self);
}

#[cfg(test)]
mod tests {
	use ldfx_tracker::PendingEdit;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	#[test]
	fn host_messages_use_camel_case_tags() {
		assert_eq!(serde_json::to_value(HostMessage::Loading).unwrap(), json!({ "type": "loading" }));
		assert_eq!(
			serde_json::to_value(HostMessage::SaveError {
				payload: "Failed to save LDF: boom".into()
			})
			.unwrap(),
			json!({ "type": "saveError", "payload": "Failed to save LDF: boom" })
		);
		assert_eq!(
			serde_json::to_value(HostMessage::Error {
				payload: "LDF file not found: /x.ldf".into(),
				traceback: None,
			})
			.unwrap(),
			json!({ "type": "error", "payload": "LDF file not found: /x.ldf" })
		);
	}

	#[test]
	fn ok_without_revision_defaults_to_zero() {
		let msg: HostMessage = serde_json::from_value(json!({ "type": "ok", "payload": { "speed": 19200 } })).unwrap();
		let HostMessage::Ok { payload, revision } = msg else {
			panic!("expected ok");
		};
		assert_eq!(payload.speed, 19200);
		assert_eq!(revision, 0);
	}

	#[test]
	fn surface_messages_parse() {
		let ready: SurfaceMessage = serde_json::from_str(r#"{"type":"ready"}"#).unwrap();
		assert_eq!(ready, SurfaceMessage::Ready);

		let refresh: SurfaceMessage = serde_json::from_str(r#"{"type":"requestRefresh"}"#).unwrap();
		assert_eq!(refresh, SurfaceMessage::RequestRefresh);

		let save: SurfaceMessage = serde_json::from_value(json!({
			"type": "saveChanges",
			"payload": {
				"signals": [{ "_action": "delete", "name": "Old" }],
				"frames": []
			}
		}))
		.unwrap();
		let SurfaceMessage::SaveChanges { payload } = save else {
			panic!("expected saveChanges");
		};
		assert_eq!(payload.signals, vec![PendingEdit::Delete { name: "Old".into() }]);
	}

	#[test]
	fn unknown_tag_is_tolerated() {
		let msg: SurfaceMessage = serde_json::from_str(r#"{"type":"telemetry","payload":42}"#).unwrap();
		assert_eq!(msg, SurfaceMessage::Unknown);
	}
}
