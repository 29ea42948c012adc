//! Graph persistence seam.

use super::vertex::{EdgeLabel, GraphOp, Vertex, VertexKind};
use crate::error::Error;

/// Minimal vertex/edge store the catalog is written against.
///
/// `apply` must be atomic: either every op in the slice is visible
/// afterwards or none is.
pub trait GraphAdapter: Send + Sync {
    /// Fetch a vertex by guid.
    fn vertex(&self, guid: &str) -> Result<Option<Vertex>, Error>;

    /// Find the guid of the first vertex of `kind` indexed under `name`.
    fn lookup(&self, kind: VertexKind, name: &str) -> Result<Option<String>, Error>;

    /// Guids of every vertex of `kind` indexed under `name`.
    fn lookup_all(&self, kind: VertexKind, name: &str) -> Result<Vec<String>, Error>;

    /// Every vertex of `kind`.
    fn vertices(&self, kind: VertexKind) -> Result<Vec<Vertex>, Error>;

    /// Targets of edges leaving `guid` with `label`.
    fn out_edges(&self, guid: &str, label: EdgeLabel) -> Result<Vec<String>, Error>;

    /// Sources of edges entering `guid` with `label`.
    fn in_edges(&self, guid: &str, label: EdgeLabel) -> Result<Vec<String>, Error>;

    /// Apply a batch of mutations atomically.
    fn apply(&self, ops: &[GraphOp]) -> Result<(), Error>;

    /// Flush pending writes to disk.
    fn flush(&self) -> Result<(), Error>;
}
