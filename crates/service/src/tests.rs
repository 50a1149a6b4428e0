use std::path::Path;
use std::time::Duration;

use ldfx_model::{Document, Frame, InitValue, MasterNode, Nodes, Signal, SignalMapping};
use ldfx_tracker::{ChangeSet, EntityKey, PendingEdit};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;

fn signal(name: &str, width: u32, publisher: &str) -> Signal {
	Signal {
		name: name.into(),
		width,
		init_value: InitValue::Scalar(0),
		publisher: publisher.into(),
		subscribers: Vec::new(),
	}
}

fn sample() -> Document {
	Document {
		protocol_version: "2.1".into(),
		language_version: "2.1".into(),
		speed: 19200,
		nodes: Nodes {
			master: Some(MasterNode {
				name: "Gw".into(),
				timebase: Some(5.0),
				jitter: Some(0.1),
				..MasterNode::default()
			}),
			slaves: vec!["Door".into()],
		},
		signals: vec![signal("Speed", 8, "Gw"), signal("Lock", 1, "Door")],
		frames: vec![Frame {
			name: "Status".into(),
			frame_id: 0x10,
			length: 2,
			publisher: "Door".into(),
			mappings: vec![SignalMapping {
				signal: "Lock".into(),
				offset: 0,
			}],
		}],
		..Document::default()
	}
}

#[test]
fn domain_failure_keeps_message_and_traceback() {
	let failure = Failure::from(ServiceError::Domain {
		message: "LDF file not found: /x.ldf".into(),
		traceback: Some("Traceback".into()),
	});
	assert_eq!(failure.message, "LDF file not found: /x.ldf");
	assert_eq!(failure.traceback.as_deref(), Some("Traceback"));
}

#[test]
fn protocol_failure_appends_raw_output() {
	let failure = Failure::from(ServiceError::Protocol {
		reason: "expected value at line 1 column 1".into(),
		raw: "oops\n".into(),
	});
	assert_eq!(
		failure.message,
		"Failed to parse document service output: expected value at line 1 column 1\nRaw output: oops"
	);
	assert_eq!(failure.traceback, None);
}

#[test]
fn launch_and_timeout_failures_have_no_traceback() {
	let launch = ServiceError::Launch {
		program: "python".into(),
		reason: "No such file or directory".into(),
	};
	assert!(!launch.is_domain());
	assert_eq!(launch.traceback(), None);
	assert_eq!(
		Failure::from(launch).message,
		"Failed to start document service (python): No such file or directory"
	);
	assert!(Failure::from(ServiceError::Timeout(Duration::from_secs(60))).message.contains("60s"));
}

#[test]
fn failure_serializes_without_empty_traceback() {
	let failure = Failure {
		message: "boom".into(),
		traceback: None,
	};
	assert_eq!(serde_json::to_value(&failure).unwrap(), json!({ "message": "boom" }));
}

#[test]
fn request_shapes() {
	let parse = serde_json::to_value(ServiceRequest::parse(Path::new("/a/b.ldf"))).unwrap();
	assert_eq!(parse, json!({ "command": "parse", "args": { "path": "/a/b.ldf" } }));

	let changes = ChangeSet::default();
	let save = serde_json::to_value(ServiceRequest::save(Path::new("/a/b.ldf"), &changes)).unwrap();
	assert_eq!(
		save,
		json!({ "command": "save", "args": { "path": "/a/b.ldf", "data": { "signals": [], "frames": [] } } })
	);
}

#[test]
fn response_decoding() {
	let ok: ServiceResponse = serde_json::from_str(r#"{"status":"ok","message":"LDF file saved successfully"}"#).unwrap();
	assert_eq!(ok.into_result().unwrap(), None);

	let err: ServiceResponse = serde_json::from_str(r#"{"status":"error","message":"Unknown command: frob"}"#).unwrap();
	assert_eq!(
		err.into_result().unwrap_err(),
		ServiceError::Domain {
			message: "Unknown command: frob".into(),
			traceback: None,
		}
	);

	let bad_doc: ServiceResponse = serde_json::from_value(json!({ "status": "ok", "data": { "signals": 3 } })).unwrap();
	assert!(matches!(bad_doc.into_document(), Err(ServiceError::Protocol { .. })));
}

#[tokio::test]
async fn memory_parse_unknown_path_is_domain_error() {
	let service = MemoryService::new();
	let err = service.parse(Path::new("/missing.ldf")).await.unwrap_err();
	assert!(err.is_domain());
	assert_eq!(err.to_string(), "LDF file not found: /missing.ldf");
	assert_eq!(service.parse_calls(), 1);
}

#[tokio::test]
async fn memory_save_applies_change_set_in_order() {
	let path = Path::new("/net.ldf");
	let service = MemoryService::new();
	service.seed(path, sample());

	let changes = ChangeSet {
		signals: vec![
			PendingEdit::Update {
				key: EntityKey::named("Speed"),
				entity: signal("Speed", 16, "Gw"),
			},
			PendingEdit::Create {
				key: EntityKey::Synthetic(1),
				entity: Signal {
					subscribers: vec!["Door".into(), "Ghost".into()],
					..signal("Horn", 1, "Nobody")
				},
			},
			PendingEdit::Delete { name: "Lock".into() },
		],
		frames: vec![PendingEdit::Update {
			key: EntityKey::named("Status"),
			entity: Frame {
				name: "DoorStatus".into(),
				mappings: vec![
					SignalMapping {
						signal: "Lock".into(),
						offset: 0,
					},
					SignalMapping {
						signal: "Horn".into(),
						offset: 4,
					},
				],
				..sample().frames[0].clone()
			},
		}],
	};
	service.save(path, &changes).await.unwrap();

	let doc = service.parse(path).await.unwrap();
	assert_eq!(doc.signal("Speed").map(|s| s.width), Some(16));
	assert!(doc.signal("Lock").is_none());

	let horn = doc.signal("Horn").unwrap();
	assert_eq!(horn.publisher, "");
	assert_eq!(horn.subscribers, vec!["Door".to_string()]);

	assert!(doc.frame("Status").is_none());
	let frame = doc.frame("DoorStatus").unwrap();
	assert_eq!(
		frame.mappings,
		vec![SignalMapping {
			signal: "Horn".into(),
			offset: 4,
		}]
	);
	assert_eq!(service.save_calls(), 1);
}

#[tokio::test]
async fn memory_update_of_missing_signal_is_skipped() {
	let path = Path::new("/net.ldf");
	let service = MemoryService::new();
	service.seed(path, sample());

	let changes = ChangeSet {
		signals: vec![PendingEdit::Update {
			key: EntityKey::named("Gone"),
			entity: signal("Gone", 4, "Gw"),
		}],
		frames: Vec::new(),
	};
	service.save(path, &changes).await.unwrap();
	assert_eq!(service.document(path).unwrap().signals, sample().signals);
}

#[tokio::test]
async fn memory_update_reaches_signal_named_like_a_new_key() {
	let path = Path::new("/net.ldf");
	let service = MemoryService::new();
	let mut doc = sample();
	doc.signals.push(signal("new_5", 4, "Gw"));
	service.seed(path, doc);

	let changes: ChangeSet = serde_json::from_value(json!({
		"signals": [{ "_id": "new_5", "_action": "update", "name": "new_5", "width": 12, "init_value": 0, "publisher": "Gw" }],
		"frames": []
	}))
	.unwrap();
	service.save(path, &changes).await.unwrap();
	assert_eq!(service.document(path).unwrap().signal("new_5").map(|s| s.width), Some(12));
}

#[tokio::test]
async fn memory_injected_save_failure_leaves_document_untouched() {
	let path = Path::new("/net.ldf");
	let service = MemoryService::new();
	service.seed(path, sample());
	service.fail_next_save(ServiceError::Domain {
		message: "Failed to save LDF: disk full".into(),
		traceback: None,
	});

	let changes = ChangeSet {
		signals: vec![PendingEdit::Delete { name: "Speed".into() }],
		frames: Vec::new(),
	};
	let err = service.save(path, &changes).await.unwrap_err();
	assert_eq!(err.to_string(), "Failed to save LDF: disk full");
	assert_eq!(service.document(path), Some(sample()));

	service.save(path, &changes).await.unwrap();
	assert!(service.document(path).unwrap().signal("Speed").is_none());
}
