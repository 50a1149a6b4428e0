//! Editable entities: signals and unconditional frames.

use serde::{Deserialize, Serialize};

/// Initial value of a signal: a scalar, or one value per byte for array signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitValue {
	Scalar(u64),
	Array(Vec<u8>),
}

impl Default for InitValue {
	fn default() -> Self {
		Self::Scalar(0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
	/// Unique within the document.
	pub name: String,
	/// Width in bits, `1..=64` for a valid signal.
	pub width: u32,
	#[serde(default)]
	pub init_value: InitValue,
	#[serde(default)]
	pub publisher: String,
	#[serde(default)]
	pub subscribers: Vec<String>,
}

impl Signal {
	/// Placeholder entity for a freshly added signal.
	pub fn template(seq: u64, publisher: impl Into<String>) -> Self {
		Self {
			name: format!("NewSignal_{seq}"),
			width: 8,
			init_value: InitValue::default(),
			publisher: publisher.into(),
			subscribers: Vec::new(),
		}
	}
}

/// Placement of a signal inside a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalMapping {
	/// Name of the mapped signal.
	pub signal: String,
	/// Bit offset inside the frame payload, `0..=63`.
	#[serde(default)]
	pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
	pub name: String,
	/// Protected identifier without parity, `0..=63`.
	pub frame_id: u32,
	/// Payload length in bytes, `1..=8`.
	#[serde(default = "default_length")]
	pub length: u32,
	#[serde(default)]
	pub publisher: String,
	#[serde(rename = "signals", default)]
	pub mappings: Vec<SignalMapping>,
}

fn default_length() -> u32 {
	8
}

impl Frame {
	/// Placeholder entity for a freshly added frame.
	pub fn template(seq: u64, publisher: impl Into<String>) -> Self {
		Self {
			name: format!("NewFrame_{seq}"),
			frame_id: 0,
			length: default_length(),
			publisher: publisher.into(),
			mappings: Vec::new(),
		}
	}

	/// Appends a mapping for `signal` at offset 0.
	pub fn add_mapping(&mut self, signal: impl Into<String>) {
		self.mappings.push(SignalMapping {
			signal: signal.into(),
			offset: 0,
		});
	}

	/// Removes the mapping at `index`, if present.
	pub fn remove_mapping(&mut self, index: usize) -> Option<SignalMapping> {
		(index < self.mappings.len()).then(|| self.mappings.remove(index))
	}
}
