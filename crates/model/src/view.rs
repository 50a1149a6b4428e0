//! Read-only projections of the node section.

use serde::Serialize;

use crate::document::{Document, MasterNode, NodeAttribute};

/// A slave name joined with its attribute record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlaveView<'a> {
	pub name: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub attributes: Option<&'a NodeAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodesView<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub master: Option<&'a MasterNode>,
	pub slaves: Vec<SlaveView<'a>>,
}

impl Document {
	/// Joins slaves against node attributes by name.
	///
	/// Slaves keep their declaration order; attributes without a matching
	/// slave are not shown.
	pub fn nodes_view(&self) -> NodesView<'_> {
		let slaves = self
			.nodes
			.slaves
			.iter()
			.map(|name| SlaveView {
				name,
				attributes: self.node_attributes.iter().find(|a| &a.name == name),
			})
			.collect();

		NodesView {
			master: self.nodes.master.as_ref(),
			slaves,
		}
	}

	/// Master name (if any) followed by all slave names.
	pub fn all_nodes(&self) -> Vec<&str> {
		self.nodes
			.master
			.iter()
			.map(|m| m.name.as_str())
			.chain(self.nodes.slaves.iter().map(String::as_str))
			.collect()
	}

	/// Publisher assigned to newly created entities.
	pub fn default_publisher(&self) -> &str {
		self.all_nodes().first().copied().unwrap_or_default()
	}
}
