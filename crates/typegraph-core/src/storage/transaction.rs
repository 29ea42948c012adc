//! Buffered graph transactions.

use std::collections::{HashMap, HashSet};

use super::adapter::GraphAdapter;
use super::vertex::{Edge, EdgeLabel, GraphOp, Vertex};
use crate::error::Error;
use tracing::debug;

/// A transaction over a graph store.
///
/// Operations are collected and applied atomically on commit. Vertex reads
/// see this transaction's own uncommitted writes. Dropping the transaction
/// without committing discards everything.
pub struct Transaction<'a> {
    graph: &'a dyn GraphAdapter,
    ops: Vec<GraphOp>,
    /// Uncommitted vertex writes (guid -> vertex, None when removed).
    write_cache: HashMap<String, Option<Vertex>>,
    /// Expected versions for optimistic locking.
    expected_versions: HashMap<String, u64>,
    committed: bool,
}

impl<'a> Transaction<'a> {
    /// Begin a transaction against `graph`.
    pub fn new(graph: &'a dyn GraphAdapter) -> Self {
        Self {
            graph,
            ops: Vec::new(),
            write_cache: HashMap::new(),
            expected_versions: HashMap::new(),
            committed: false,
        }
    }

    /// Queue an insert or replacement of a vertex.
    pub fn put_vertex(&mut self, vertex: Vertex) -> &mut Self {
        self.write_cache
            .insert(vertex.guid.clone(), Some(vertex.clone()));
        self.ops.push(GraphOp::PutVertex(vertex));
        self
    }

    /// Queue removal of a vertex together with all of its outgoing edges.
    pub fn remove_vertex(&mut self, guid: &str) -> Result<&mut Self, Error> {
        for label in EdgeLabel::ALL {
            for target in self.out_edges(guid, label)? {
                self.ops
                    .push(GraphOp::RemoveEdge(Edge::new(guid, label, target)));
            }
        }
        self.write_cache.insert(guid.to_string(), None);
        self.ops.push(GraphOp::RemoveVertex(guid.to_string()));
        Ok(self)
    }

    /// Queue a new edge.
    pub fn add_edge(&mut self, edge: Edge) -> &mut Self {
        self.ops.push(GraphOp::AddEdge(edge));
        self
    }

    /// Queue removal of an edge.
    pub fn remove_edge(&mut self, edge: Edge) -> &mut Self {
        self.ops.push(GraphOp::RemoveEdge(edge));
        self
    }

    /// Make the `label` out-edges of `guid` exactly `targets`.
    pub fn replace_out_edges(
        &mut self,
        guid: &str,
        label: EdgeLabel,
        targets: impl IntoIterator<Item = String>,
    ) -> Result<&mut Self, Error> {
        let wanted: HashSet<String> = targets.into_iter().collect();
        let current: HashSet<String> = self.out_edges(guid, label)?.into_iter().collect();

        let mut stale: Vec<&String> = current.difference(&wanted).collect();
        stale.sort();
        for target in stale {
            self.ops
                .push(GraphOp::RemoveEdge(Edge::new(guid, label, target.as_str())));
        }
        let mut fresh: Vec<&String> = wanted.difference(&current).collect();
        fresh.sort();
        for target in fresh {
            self.ops
                .push(GraphOp::AddEdge(Edge::new(guid, label, target.as_str())));
        }
        Ok(self)
    }

    /// Read a vertex, preferring this transaction's uncommitted writes.
    pub fn vertex(&self, guid: &str) -> Result<Option<Vertex>, Error> {
        match self.write_cache.get(guid) {
            Some(cached) => Ok(cached.clone()),
            None => self.graph.vertex(guid),
        }
    }

    /// Out-edge targets as this transaction would leave them.
    pub fn out_edges(&self, guid: &str, label: EdgeLabel) -> Result<Vec<String>, Error> {
        let mut targets = self.graph.out_edges(guid, label)?;
        for op in &self.ops {
            match op {
                GraphOp::AddEdge(e) if e.from == guid && e.label == label => {
                    if !targets.contains(&e.to) {
                        targets.push(e.to.clone());
                    }
                }
                GraphOp::RemoveEdge(e) if e.from == guid && e.label == label => {
                    targets.retain(|t| *t != e.to);
                }
                _ => {}
            }
        }
        Ok(targets)
    }

    /// Set expected version for optimistic locking.
    ///
    /// If the stored vertex's version (0 when absent) differs at commit
    /// time, the transaction fails with a conflict.
    pub fn expect_version(&mut self, guid: impl Into<String>, version: u64) -> &mut Self {
        self.expected_versions.insert(guid.into(), version);
        self
    }

    /// Check if a vertex is written by this transaction.
    pub fn is_writing(&self, guid: &str) -> bool {
        self.write_cache.contains_key(guid)
    }

    /// Get the pending operations.
    pub fn operations(&self) -> &[GraphOp] {
        &self.ops
    }

    /// Get the number of pending operations.
    pub fn operation_count(&self) -> usize {
        self.ops.len()
    }

    /// Commit the transaction atomically.
    ///
    /// Checks expected versions first; all operations succeed or none do.
    pub fn commit(mut self) -> Result<(), Error> {
        self.check_version_conflicts()?;
        self.graph.apply(&self.ops)?;
        self.committed = true;
        Ok(())
    }

    /// Discard all pending operations.
    pub fn rollback(self) {
        drop(self);
    }

    fn check_version_conflicts(&self) -> Result<(), Error> {
        for (guid, expected) in &self.expected_versions {
            let stored = self.graph.vertex(guid)?;
            let actual = stored.as_ref().map(|v| v.version).unwrap_or(0);
            if actual != *expected {
                return Err(Error::Conflict {
                    name: stored.map(|v| v.name).unwrap_or_else(|| guid.clone()),
                    expected: *expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.ops.is_empty() {
            debug!(ops = self.ops.len(), "rolled back graph transaction");
        }
    }
}
