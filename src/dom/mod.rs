//! Host document model.
//!
//! An arena-allocated HTML tree with the query and mutation surface the
//! include loader and page behaviors need. Markup is parsed with `html5ever`
//! and copied into the arena; nodes are addressed by [`NodeId`] and stay valid
//! (possibly detached) for the lifetime of the [`Document`].

pub mod document;
pub mod parse;
pub mod serialize;

pub use document::{Attribute, Document, ElementData, NodeData, NodeId};
