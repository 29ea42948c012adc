//! Graph persistence for TypeGraph.
//!
//! Vertices (type definitions and entity instances) and labelled edges are
//! kept in sled trees; writes are buffered in a [`Transaction`] and applied
//! atomically.

mod adapter;
mod config;
mod engine;
mod transaction;
mod vertex;

pub mod key;

pub use adapter::GraphAdapter;
pub use config::StorageConfig;
pub use engine::SledGraph;
pub use transaction::Transaction;
pub use vertex::{Edge, EdgeLabel, GraphOp, Vertex, VertexKind};
