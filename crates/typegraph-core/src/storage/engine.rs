//! sled-backed graph store.

use super::adapter::GraphAdapter;
use super::key;
use super::vertex::{Edge, EdgeLabel, GraphOp, Vertex, VertexKind};
use super::StorageConfig;
use crate::error::Error;
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};
use sled::{Db, Transactional, Tree};
use tracing::debug;

/// Tree name for vertices (guid -> vertex).
const VERTEX_TREE: &str = "graph:vertices";

/// Tree name for the name index.
const NAME_TREE: &str = "graph:names";

/// Tree name for outgoing edges.
const OUT_TREE: &str = "graph:out";

/// Tree name for incoming edges.
const IN_TREE: &str = "graph:in";

/// Graph store over four sled trees.
pub struct SledGraph {
    /// The underlying sled database.
    db: Db,

    /// guid -> rkyv-encoded vertex.
    vertex_tree: Tree,

    /// `[kind][name]\0[guid]` -> empty.
    name_tree: Tree,

    /// `[from]\0[label][to]` -> empty.
    out_tree: Tree,

    /// `[to]\0[label][from]` -> empty.
    in_tree: Tree,
}

impl SledGraph {
    /// Open or create a graph store with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        Self::from_db(db)
    }

    /// Build a graph store over an already opened database.
    pub fn from_db(db: Db) -> Result<Self, Error> {
        let vertex_tree = db.open_tree(VERTEX_TREE)?;
        let name_tree = db.open_tree(NAME_TREE)?;
        let out_tree = db.open_tree(OUT_TREE)?;
        let in_tree = db.open_tree(IN_TREE)?;

        Ok(Self {
            db,
            vertex_tree,
            name_tree,
            out_tree,
            in_tree,
        })
    }

    /// Check if the database was recovered from a previous crash.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Number of stored vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_tree.len()
    }

    fn scan_suffixes(tree: &Tree, prefix: &[u8]) -> Result<Vec<String>, Error> {
        let mut out = Vec::new();
        for entry in tree.scan_prefix(prefix) {
            let (k, _) = entry?;
            let guid = key::suffix_guid(&k, prefix.len())
                .ok_or_else(|| Error::Deserialization("non-utf8 guid in index key".into()))?;
            out.push(guid);
        }
        Ok(out)
    }

    fn execute_put(
        vertex_tx: &TransactionalTree,
        name_tx: &TransactionalTree,
        vertex: &Vertex,
    ) -> Result<(), ConflictableTransactionError<Error>> {
        let bytes = vertex
            .to_bytes()
            .map_err(ConflictableTransactionError::Abort)?;

        if let Some(old) = vertex_tx.insert(vertex.guid.as_bytes(), bytes)? {
            let old = Vertex::from_bytes(&old).map_err(ConflictableTransactionError::Abort)?;
            name_tx.remove(key::name_key(old.kind, &old.name, &old.guid))?;
        }
        name_tx.insert(key::name_key(vertex.kind, &vertex.name, &vertex.guid), &[])?;
        Ok(())
    }

    fn execute_remove(
        vertex_tx: &TransactionalTree,
        name_tx: &TransactionalTree,
        guid: &str,
    ) -> Result<(), ConflictableTransactionError<Error>> {
        if let Some(old) = vertex_tx.remove(guid.as_bytes())? {
            let old = Vertex::from_bytes(&old).map_err(ConflictableTransactionError::Abort)?;
            name_tx.remove(key::name_key(old.kind, &old.name, &old.guid))?;
        }
        Ok(())
    }

    fn execute_edge(
        out_tx: &TransactionalTree,
        in_tx: &TransactionalTree,
        edge: &Edge,
        add: bool,
    ) -> Result<(), ConflictableTransactionError<Error>> {
        let out_key = key::edge_key(&edge.from, edge.label, &edge.to);
        let in_key = key::edge_key(&edge.to, edge.label, &edge.from);
        if add {
            out_tx.insert(out_key, &[])?;
            in_tx.insert(in_key, &[])?;
        } else {
            out_tx.remove(out_key)?;
            in_tx.remove(in_key)?;
        }
        Ok(())
    }
}

impl GraphAdapter for SledGraph {
    fn vertex(&self, guid: &str) -> Result<Option<Vertex>, Error> {
        match self.vertex_tree.get(guid.as_bytes())? {
            Some(bytes) => Ok(Some(Vertex::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn lookup(&self, kind: VertexKind, name: &str) -> Result<Option<String>, Error> {
        let prefix = key::name_prefix(kind, name);
        match self.name_tree.scan_prefix(&prefix).next() {
            Some(entry) => {
                let (k, _) = entry?;
                Ok(key::suffix_guid(&k, prefix.len()))
            }
            None => Ok(None),
        }
    }

    fn lookup_all(&self, kind: VertexKind, name: &str) -> Result<Vec<String>, Error> {
        Self::scan_suffixes(&self.name_tree, &key::name_prefix(kind, name))
    }

    fn vertices(&self, kind: VertexKind) -> Result<Vec<Vertex>, Error> {
        let mut out = Vec::new();
        for entry in self.name_tree.scan_prefix(key::kind_prefix(kind)) {
            let (k, _) = entry?;
            let Some(split) = k.iter().rposition(|b| *b == key::SEPARATOR) else {
                continue;
            };
            let Some(guid) = key::suffix_guid(&k, split + 1) else {
                continue;
            };
            if let Some(vertex) = self.vertex(&guid)? {
                out.push(vertex);
            }
        }
        Ok(out)
    }

    fn out_edges(&self, guid: &str, label: EdgeLabel) -> Result<Vec<String>, Error> {
        Self::scan_suffixes(&self.out_tree, &key::edge_prefix(guid, label))
    }

    fn in_edges(&self, guid: &str, label: EdgeLabel) -> Result<Vec<String>, Error> {
        Self::scan_suffixes(&self.in_tree, &key::edge_prefix(guid, label))
    }

    fn apply(&self, ops: &[GraphOp]) -> Result<(), Error> {
        if ops.is_empty() {
            return Ok(());
        }

        let result: Result<(), TransactionError<Error>> = (
            &self.vertex_tree,
            &self.name_tree,
            &self.out_tree,
            &self.in_tree,
        )
            .transaction(|(vertex_tx, name_tx, out_tx, in_tx)| {
                for op in ops {
                    match op {
                        GraphOp::PutVertex(vertex) => Self::execute_put(vertex_tx, name_tx, vertex)?,
                        GraphOp::RemoveVertex(guid) => {
                            Self::execute_remove(vertex_tx, name_tx, guid)?
                        }
                        GraphOp::AddEdge(edge) => Self::execute_edge(out_tx, in_tx, edge, true)?,
                        GraphOp::RemoveEdge(edge) => {
                            Self::execute_edge(out_tx, in_tx, edge, false)?
                        }
                    }
                }
                Ok(())
            });

        match result {
            Ok(()) => {
                debug!(ops = ops.len(), "applied graph batch");
                Ok(())
            }
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(Error::Storage(e)),
        }
    }

    fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeCategory;

    const ENTITY_DEF: VertexKind = VertexKind::TypeDef(TypeCategory::Entity);

    fn test_graph() -> SledGraph {
        SledGraph::open(StorageConfig::temporary()).unwrap()
    }

    fn vertex(guid: &str, name: &str) -> Vertex {
        Vertex::new(guid, ENTITY_DEF, name, 1, vec![])
    }

    #[test]
    fn test_put_and_lookup() {
        let graph = test_graph();
        graph
            .apply(&[GraphOp::PutVertex(vertex("g-1", "Employee"))])
            .unwrap();

        assert_eq!(graph.vertex("g-1").unwrap().unwrap().name, "Employee");
        assert_eq!(
            graph.lookup(ENTITY_DEF, "Employee").unwrap().as_deref(),
            Some("g-1")
        );
        assert!(graph.lookup(VertexKind::Entity, "Employee").unwrap().is_none());
        assert_eq!(graph.vertices(ENTITY_DEF).unwrap().len(), 1);
    }

    #[test]
    fn test_rename_moves_index_entry() {
        let graph = test_graph();
        graph
            .apply(&[GraphOp::PutVertex(vertex("g-1", "Old"))])
            .unwrap();
        graph
            .apply(&[GraphOp::PutVertex(vertex("g-1", "New"))])
            .unwrap();

        assert!(graph.lookup(ENTITY_DEF, "Old").unwrap().is_none());
        assert!(graph.lookup(ENTITY_DEF, "New").unwrap().is_some());
    }

    #[test]
    fn test_edges_both_directions() {
        let graph = test_graph();
        graph
            .apply(&[
                GraphOp::PutVertex(vertex("a", "Manager")),
                GraphOp::PutVertex(vertex("b", "Employee")),
                GraphOp::AddEdge(Edge::new("a", EdgeLabel::SuperType, "b")),
            ])
            .unwrap();

        assert_eq!(graph.out_edges("a", EdgeLabel::SuperType).unwrap(), vec!["b"]);
        assert_eq!(graph.in_edges("b", EdgeLabel::SuperType).unwrap(), vec!["a"]);
        assert!(graph.in_edges("b", EdgeLabel::AttributeType).unwrap().is_empty());

        graph
            .apply(&[GraphOp::RemoveEdge(Edge::new("a", EdgeLabel::SuperType, "b"))])
            .unwrap();
        assert!(graph.in_edges("b", EdgeLabel::SuperType).unwrap().is_empty());
    }

    #[test]
    fn test_remove_vertex() {
        let graph = test_graph();
        graph
            .apply(&[GraphOp::PutVertex(vertex("g-1", "Employee"))])
            .unwrap();
        graph
            .apply(&[GraphOp::RemoveVertex("g-1".into())])
            .unwrap();

        assert!(graph.vertex("g-1").unwrap().is_none());
        assert!(graph.lookup(ENTITY_DEF, "Employee").unwrap().is_none());
        assert_eq!(graph.vertex_count(), 0);
    }

    #[test]
    fn test_lookup_all_instances() {
        let graph = test_graph();
        graph
            .apply(&[
                GraphOp::PutVertex(Vertex::new("e-1", VertexKind::Entity, "Employee", 1, vec![])),
                GraphOp::PutVertex(Vertex::new("e-2", VertexKind::Entity, "Employee", 1, vec![])),
                GraphOp::PutVertex(Vertex::new("e-3", VertexKind::Entity, "Manager", 1, vec![])),
            ])
            .unwrap();

        let mut guids = graph.lookup_all(VertexKind::Entity, "Employee").unwrap();
        guids.sort();
        assert_eq!(guids, vec!["e-1", "e-2"]);
        assert_eq!(graph.vertices(VertexKind::Entity).unwrap().len(), 3);
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path());

        {
            let graph = SledGraph::open(config.clone()).unwrap();
            graph
                .apply(&[GraphOp::PutVertex(vertex("g-1", "Employee"))])
                .unwrap();
            graph.flush().unwrap();
        }

        let graph = SledGraph::open(config).unwrap();
        assert!(graph.vertex("g-1").unwrap().is_some());
    }
}
