use ldfx_model::{InitValue, MasterNode, NodeAttribute, Nodes};
use ldfx_tracker::{EntryState, ValidationError};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;

fn doc() -> Document {
	Document {
		protocol_version: "2.1".into(),
		language_version: "2.1".into(),
		speed: 19200,
		nodes: Nodes {
			master: Some(MasterNode {
				name: "Gw".into(),
				..MasterNode::default()
			}),
			slaves: vec!["Door".into(), "Seat".into()],
		},
		node_attributes: vec![NodeAttribute {
			name: "Door".into(),
			configured_nad: Some(2),
			..NodeAttribute::default()
		}],
		signals: vec![Signal {
			name: "Speed".into(),
			width: 8,
			init_value: InitValue::Scalar(0),
			publisher: "Gw".into(),
			subscribers: vec!["Door".into()],
		}],
		frames: vec![Frame {
			name: "Status".into(),
			frame_id: 0x10,
			length: 2,
			publisher: "Gw".into(),
			mappings: Vec::new(),
		}],
		..Document::default()
	}
}

fn ok(revision: u64, doc: Document) -> HostMessage {
	HostMessage::Ok {
		payload: Box::new(doc),
		revision,
	}
}

fn loaded() -> SurfaceModel {
	let mut model = SurfaceModel::new();
	assert!(model.apply(ok(1, doc())));
	model
}

#[test]
fn starts_loading_and_refuses_edits() {
	let mut model = SurfaceModel::new();
	assert_eq!(model.status(), Status::Loading);
	assert_eq!(model.ready(), SurfaceMessage::Ready);
	assert_eq!(model.add::<Signal>(), Err(SurfaceError::Unavailable(Status::Loading)));
	assert_eq!(model.save(), Err(SurfaceError::Unavailable(Status::Loading)));
	assert_eq!(model.refresh(), Err(SurfaceError::Unavailable(Status::Loading)));
	assert!(model.signals().is_empty());
}

#[test]
fn ok_message_installs_document() {
	let model = loaded();
	assert_eq!(model.status(), Status::Ok);
	assert!(model.last_updated().is_some());
	assert_eq!(model.all_nodes(), vec!["Gw", "Door", "Seat"]);
	let nodes = model.nodes().unwrap();
	assert_eq!(nodes.slaves[0].attributes.and_then(|a| a.configured_nad), Some(2));
	assert_eq!(nodes.slaves[1].attributes, None);
}

#[test]
fn added_signal_uses_template_and_master_publisher() {
	let mut model = loaded();
	let key = model.add::<Signal>().unwrap();
	assert_eq!(key, EntityKey::Synthetic(1));

	let signals = model.signals();
	let created = signals.last().unwrap();
	assert_eq!(created.state, EntryState::Created);
	assert!(created.editing);
	assert_eq!(created.entity.name, "NewSignal_1");
	assert_eq!(created.entity.publisher, "Gw");

	let frame_key = model.add::<Frame>().unwrap();
	assert_eq!(frame_key, EntityKey::Synthetic(2));
	assert_eq!(model.frames().last().unwrap().entity.name, "NewFrame_2");
}

#[test]
fn error_message_clears_document_and_allows_retry() {
	let mut model = SurfaceModel::new();
	assert!(model.apply(HostMessage::Error {
		payload: "LDF file not found: /x.ldf".into(),
		traceback: Some("Traceback".into()),
	}));
	assert_eq!(model.status(), Status::Error);
	assert_eq!(model.error(), Some("LDF file not found: /x.ldf"));
	assert_eq!(model.traceback(), Some("Traceback"));
	assert!(model.document().is_none());
	assert_eq!(model.save(), Err(SurfaceError::Unavailable(Status::Error)));

	assert_eq!(model.refresh(), Ok(SurfaceMessage::RequestRefresh));
	assert_eq!(model.status(), Status::Loading);
	assert!(model.apply(HostMessage::Loading));
	assert!(model.apply(ok(1, doc())));
	assert_eq!(model.error(), None);
}

#[test]
fn illegal_host_messages_are_dropped() {
	let mut model = loaded();
	assert!(!model.apply(HostMessage::Error {
		payload: "late".into(),
		traceback: None,
	}));
	assert!(!model.apply(HostMessage::SaveError { payload: "late".into() }));
	assert_eq!(model.status(), Status::Ok);
	assert!(model.document().is_some());

	let mut fresh = SurfaceModel::new();
	assert!(!fresh.apply(HostMessage::SaveError { payload: "early".into() }));
	assert_eq!(fresh.status(), Status::Loading);
}

#[test]
fn older_document_revision_is_ignored() {
	let mut model = SurfaceModel::new();
	let mut newer = doc();
	newer.speed = 10417;
	assert!(model.apply(ok(2, newer)));
	assert!(model.apply(HostMessage::Loading));
	assert!(!model.apply(ok(1, doc())));
	assert_eq!(model.document().map(|d| d.speed), Some(10417));
}

#[test]
fn refresh_discards_local_edits() {
	let mut model = loaded();
	model.delete::<Signal>(&EntityKey::named("Speed")).unwrap();
	assert!(model.has_changes());

	assert_eq!(model.refresh(), Ok(SurfaceMessage::RequestRefresh));
	assert!(!model.has_changes());
	assert_eq!(model.delete::<Signal>(&EntityKey::named("Speed")), Err(SurfaceError::Unavailable(Status::Loading)));
}

#[test]
fn save_sends_change_set_and_keeps_it_pending() {
	let mut model = loaded();
	model.delete::<Frame>(&EntityKey::named("Status")).unwrap();

	let message = model.save().unwrap();
	assert_eq!(model.status(), Status::Saving);
	let SurfaceMessage::SaveChanges { payload } = message else {
		panic!("expected saveChanges");
	};
	assert_eq!(serde_json::to_value(&payload).unwrap(), json!({
		"signals": [],
		"frames": [{ "_action": "delete", "name": "Status" }]
	}));
	assert!(model.has_changes());
	assert_eq!(model.add::<Signal>(), Err(SurfaceError::Unavailable(Status::Saving)));
}

#[test]
fn save_without_changes_is_refused() {
	let mut model = loaded();
	assert!(!model.has_changes());
	assert_eq!(model.save(), Err(SurfaceError::NoChanges));
	assert_eq!(model.status(), Status::Ok);

	let key = EntityKey::named("Speed");
	model.edit::<Signal>(&key).unwrap();
	assert_eq!(model.save(), Err(SurfaceError::NoChanges));
	model.cancel::<Signal>(&key).unwrap();
	assert_eq!(model.status(), Status::Ok);
}

#[test]
fn base_entity_named_new_n_is_editable_by_text_key() {
	let mut named = doc();
	named.signals[0].name = "new_1".into();
	let mut model = SurfaceModel::new();
	assert!(model.apply(ok(1, named)));

	let typed = EntityKey::from("new_1");
	model.edit::<Signal>(&typed).unwrap();
	model.draft_mut::<Signal>(&typed).unwrap().width = 12;
	model.confirm::<Signal>(&typed).unwrap();

	let SurfaceMessage::SaveChanges { payload } = model.save().unwrap() else {
		panic!("expected saveChanges");
	};
	assert!(payload.signals[0].targets(&EntityKey::named("new_1")));
	assert_eq!(model.signals()[0].state, EntryState::Updated);
}

#[test]
fn cancelled_update_reverts_fields() {
	let mut model = loaded();
	let key = EntityKey::named("Speed");
	model.edit::<Signal>(&key).unwrap();
	model.draft_mut::<Signal>(&key).unwrap().width = 32;
	model.cancel::<Signal>(&key).unwrap();

	assert_eq!(model.signals()[0].entity.width, 8);
	assert!(!model.signals()[0].editing);
	assert!(!model.has_changes());
}

#[test]
fn invalid_commit_keeps_form_open() {
	let mut model = loaded();
	let key = EntityKey::named("Speed");
	model.edit::<Signal>(&key).unwrap();
	model.draft_mut::<Signal>(&key).unwrap().width = 0;

	assert_eq!(
		model.confirm::<Signal>(&key),
		Err(SurfaceError::Edit(EditError::Invalid(ValidationError::Width(0))))
	);
	assert!(model.signals()[0].editing);
	assert!(!model.has_changes());
}

#[test]
fn frame_mappings_offer_effective_signals() {
	let mut model = loaded();
	let signal = model.add::<Signal>().unwrap();
	model.draft_mut::<Signal>(&signal).unwrap().name = "Horn".into();
	model.confirm::<Signal>(&signal).unwrap();
	assert_eq!(model.available_signals(), vec!["Speed", "Horn"]);

	let key = EntityKey::named("Status");
	model.edit::<Frame>(&key).unwrap();
	let draft = model.draft_mut::<Frame>(&key).unwrap();
	draft.add_mapping("Speed");
	draft.add_mapping("Horn");
	draft.mappings[1].offset = 8;
	assert!(draft.remove_mapping(0).is_some());
	model.confirm::<Frame>(&key).unwrap();

	let frames = model.frames();
	assert_eq!(frames[0].state, EntryState::Updated);
	assert_eq!(frames[0].entity.mappings.len(), 1);
	assert_eq!(frames[0].entity.mappings[0].signal, "Horn");
	assert_eq!(frames[0].entity.mappings[0].offset, 8);
}

#[test]
fn disposed_surface_drops_everything() {
	let mut model = loaded();
	model.dispose();
	assert!(model.is_disposed());
	assert!(!model.apply(HostMessage::Loading));
	assert_eq!(model.save(), Err(SurfaceError::Disposed));
	assert_eq!(model.status(), Status::Ok);
}

#[test]
fn view_serializes_for_renderers() {
	let model = loaded();
	let value = serde_json::to_value(model.view()).unwrap();
	assert_eq!(value["status"], "ok");
	assert_eq!(value["has_changes"], false);
	assert_eq!(value["document"]["speed"], 19200);
	assert_eq!(value["document"]["nodes"]["master"]["name"], "Gw");
	assert_eq!(value["document"]["signals"][0]["key"], "Speed");
	assert_eq!(value["document"]["signals"][0]["state"], "pristine");
	assert_eq!(value["document"]["signals"][0]["entity"]["width"], 8);
	assert!(value.get("error").is_none());
	assert!(value["document"].get("channel_name").is_none());
}

#[test]
fn view_shows_channel_name() {
	let mut named = doc();
	named.channel_name = Some("DB_LIN_1".into());
	let mut model = SurfaceModel::new();
	assert!(model.apply(ok(1, named)));

	assert_eq!(model.view().document.and_then(|d| d.channel_name), Some("DB_LIN_1"));
	let value = serde_json::to_value(model.view()).unwrap();
	assert_eq!(value["document"]["channel_name"], "DB_LIN_1");
}
