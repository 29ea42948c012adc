//! Current value model.
//!
//! The second-generation representation: entities carry their guid, status
//! and an ordered list of classifications; numbers are widened to `i64`/`f64`
//! and enum literals travel as plain strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A current-model runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// UTF-8 string (also enum literals and big numbers).
    String(String),
    /// Ordered collection.
    Array(Vec<Value>),
    /// String-keyed map.
    Map(BTreeMap<String, Value>),
    /// Struct instance.
    Struct(Struct),
    /// Classification instance.
    Classification(Classification),
    /// Full entity instance.
    Entity(Box<Entity>),
    /// Weak reference to an entity.
    ObjectId(ObjectId),
}

/// A struct instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    /// Declared type name.
    pub type_name: String,
    /// Attribute values.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// A classification attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Classification type name.
    pub type_name: String,
    /// Attribute values.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

/// Weak reference to an entity: identity and type only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    /// Entity guid.
    pub guid: String,
    /// Entity type name.
    pub type_name: String,
}

/// Lifecycle status of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityStatus {
    /// Live entity.
    #[default]
    Active,
    /// Soft-deleted entity.
    Deleted,
}

/// An entity instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity guid; empty until assigned by the store.
    #[serde(default)]
    pub guid: String,
    /// Entity type name.
    pub type_name: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: EntityStatus,
    /// Entity version.
    #[serde(default)]
    pub version: u64,
    /// Attribute values.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    /// Attached classifications, in attachment order.
    #[serde(default)]
    pub classifications: Vec<Classification>,
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's shape, used in diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Classification(_) => "classification",
            Value::Entity(_) => "entity",
            Value::ObjectId(_) => "object_id",
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as object id.
    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Value::ObjectId(id) => Some(id),
            _ => None,
        }
    }

    /// Try to get as entity.
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// Collect every object reference reachable from this value.
    ///
    /// Nested entities contribute their own references; the nested entity
    /// itself is not a reference.
    pub fn collect_references(&self, out: &mut Vec<ObjectId>) {
        match self {
            Value::ObjectId(id) => out.push(id.clone()),
            Value::Array(items) => items.iter().for_each(|v| v.collect_references(out)),
            Value::Map(entries) => entries.values().for_each(|v| v.collect_references(out)),
            Value::Struct(s) => s.attributes.values().for_each(|v| v.collect_references(out)),
            Value::Classification(c) => {
                c.attributes.values().for_each(|v| v.collect_references(out))
            }
            Value::Entity(e) => e.attributes.values().for_each(|v| v.collect_references(out)),
            _ => {}
        }
    }
}

impl Struct {
    /// Create an empty struct of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute value.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

impl Classification {
    /// Create a classification without attributes.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute value.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

impl ObjectId {
    /// Create an object id.
    pub fn new(guid: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            type_name: type_name.into(),
        }
    }
}

impl Entity {
    /// Create an entity of the given type without a guid.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            guid: String::new(),
            type_name: type_name.into(),
            status: EntityStatus::Active,
            version: 0,
            attributes: BTreeMap::new(),
            classifications: Vec::new(),
        }
    }

    /// Set the guid.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = guid.into();
        self
    }

    /// Set an attribute value.
    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Attach a classification.
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classifications.push(classification);
        self
    }

    /// Weak reference to this entity.
    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.guid.clone(), self.type_name.clone())
    }

    /// Look up an attached classification by name.
    pub fn classification(&self, name: &str) -> Option<&Classification> {
        self.classifications.iter().find(|c| c.type_name == name)
    }

    /// Every object reference held in the entity's attributes.
    pub fn references(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        for value in self.attributes.values() {
            value.collect_references(&mut out);
        }
        out.sort();
        out.dedup();
        out
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}

impl From<Struct> for Value {
    fn from(v: Struct) -> Self {
        Value::Struct(v)
    }
}

impl From<Entity> for Value {
    fn from(v: Entity) -> Self {
        Value::Entity(Box::new(v))
    }
}

/// Result of an entity mutation as reported over the client boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMutationResponse {
    /// Entities created by the request.
    #[serde(default)]
    pub created: Vec<ObjectId>,
    /// Entities updated by the request.
    #[serde(default)]
    pub updated: Vec<ObjectId>,
    /// Entities deleted by the request.
    #[serde(default)]
    pub deleted: Vec<ObjectId>,
}

impl EntityMutationResponse {
    /// Total number of entities touched.
    pub fn len(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }

    /// Check if nothing was touched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
