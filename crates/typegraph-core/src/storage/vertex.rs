//! Vertex and edge records stored in the graph.

use crate::catalog::TypeCategory;
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// What a vertex represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
pub enum VertexKind {
    /// A type definition of the given category.
    TypeDef(TypeCategory),
    /// An entity instance.
    Entity,
}

impl VertexKind {
    /// Single-byte tag used in index keys.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            VertexKind::TypeDef(category) => category.tag(),
            VertexKind::Entity => b'N',
        }
    }
}

/// Edge labels between vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeLabel {
    /// Subtype definition -> supertype definition.
    SuperType,
    /// Definition -> definition referenced by one of its attribute types.
    AttributeType,
    /// Entity instance -> its entity definition.
    InstanceOf,
    /// Entity instance -> attached classification definition.
    ClassifiedAs,
    /// Entity instance -> entity instance referenced by an attribute.
    References,
}

impl EdgeLabel {
    /// Every label.
    pub const ALL: [EdgeLabel; 5] = [
        EdgeLabel::SuperType,
        EdgeLabel::AttributeType,
        EdgeLabel::InstanceOf,
        EdgeLabel::ClassifiedAs,
        EdgeLabel::References,
    ];

    /// Label name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeLabel::SuperType => "super_type",
            EdgeLabel::AttributeType => "attribute_type",
            EdgeLabel::InstanceOf => "instance_of",
            EdgeLabel::ClassifiedAs => "classified_as",
            EdgeLabel::References => "references",
        }
    }

    pub(crate) fn tag(&self) -> u8 {
        match self {
            EdgeLabel::SuperType => b's',
            EdgeLabel::AttributeType => b'a',
            EdgeLabel::InstanceOf => b'i',
            EdgeLabel::ClassifiedAs => b'c',
            EdgeLabel::References => b'r',
        }
    }
}

/// A directed, labelled edge between two vertex guids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Source vertex guid.
    pub from: String,
    /// Edge label.
    pub label: EdgeLabel,
    /// Target vertex guid.
    pub to: String,
}

impl Edge {
    /// Create an edge.
    pub fn new(from: impl Into<String>, label: EdgeLabel, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            label,
            to: to.into(),
        }
    }
}

/// A stored vertex.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Vertex {
    /// Vertex identifier.
    pub guid: String,
    /// What the vertex represents.
    pub kind: VertexKind,
    /// Indexed name: the type name for definitions and instances alike.
    pub name: String,
    /// Version of the payload, used for optimistic checks.
    pub version: u64,
    /// Encoded payload.
    pub payload: Vec<u8>,
}

impl Vertex {
    /// Create a vertex.
    pub fn new(
        guid: impl Into<String>,
        kind: VertexKind,
        name: impl Into<String>,
        version: u64,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            guid: guid.into(),
            kind,
            name: name.into(),
            version,
            payload,
        }
    }

    /// Serialize the vertex to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a vertex from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// A buffered graph mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    /// Insert or replace a vertex (and its name index entry).
    PutVertex(Vertex),
    /// Remove a vertex and its name index entry.
    RemoveVertex(String),
    /// Add an edge.
    AddEdge(Edge),
    /// Remove an edge.
    RemoveEdge(Edge),
}
