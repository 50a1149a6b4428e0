//! LIN description document model.
//!
//! These types mirror the JSON shape produced by the external document
//! service: snake_case field names, optional metadata, and unknown fields
//! preserved so a document survives a load/save round trip untouched.

mod document;
mod entity;
mod view;

pub use document::{Document, MasterNode, NodeAttribute, Nodes, ProductId};
pub use entity::{Frame, InitValue, Signal, SignalMapping};
pub use view::{NodesView, SlaveView};

/// File extension (without the dot) of LIN description files.
pub const LDF_EXTENSION: &str = "ldf";
