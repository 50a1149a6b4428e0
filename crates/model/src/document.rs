use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{Frame, Signal};

/// Parsed snapshot of a LIN description file.
///
/// Replaced wholesale on every successful load; never mutated by edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
	pub protocol_version: String,
	pub language_version: String,
	/// Bus speed in bits per second.
	pub speed: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub checksum_model: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub channel_name: Option<String>,
	pub nodes: Nodes,
	pub node_attributes: Vec<NodeAttribute>,
	pub signals: Vec<Signal>,
	pub frames: Vec<Frame>,
	/// Sections this model does not interpret (schedules, encodings, ...).
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Node topology: one optional master and an ordered list of slave names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nodes {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub master: Option<MasterNode>,
	pub slaves: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterNode {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timebase: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jitter: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response_tolerance: Option<f64>,
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Per-node attribute record, joined against [`Nodes::slaves`] by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeAttribute {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub configured_nad: Option<u8>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub initial_nad: Option<u8>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub product_id: Option<ProductId>,
	/// Protocol version, response error signal, configurable frames, ...
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductId {
	pub supplier_id: u32,
	pub function_id: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub variant: Option<u32>,
}

impl Document {
	/// Looks up a signal by name.
	pub fn signal(&self, name: &str) -> Option<&Signal> {
		self.signals.iter().find(|s| s.name == name)
	}

	/// Looks up a frame by name.
	pub fn frame(&self, name: &str) -> Option<&Frame> {
		self.frames.iter().find(|f| f.name == name)
	}

	/// Returns true if `name` is the master or one of the slaves.
	pub fn has_node(&self, name: &str) -> bool {
		self.nodes.master.as_ref().is_some_and(|m| m.name == name) || self.nodes.slaves.iter().any(|s| s == name)
	}
}
