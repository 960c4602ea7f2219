//! Core data structures: source nodes, index documents and change events.

pub mod change_event;
pub mod index_document;
pub mod source_node;
