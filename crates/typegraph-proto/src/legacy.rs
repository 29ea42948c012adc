//! Legacy value model.
//!
//! The first-generation representation of metadata instances: entities are
//! `Referenceable`s identified by an `Id`, classifications are carried as
//! "traits" keyed by name, and every primitive keeps its exact width.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A legacy runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 8-bit signed integer.
    Byte(i8),
    /// 16-bit signed integer.
    Short(i16),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// Arbitrary precision integer in decimal notation.
    BigInteger(String),
    /// Arbitrary precision decimal in decimal notation.
    BigDecimal(String),
    /// UTF-8 string.
    String(String),
    /// Date as milliseconds since Unix epoch.
    Date(i64),
    /// Enumeration literal.
    Enum(EnumValue),
    /// Ordered collection.
    Array(Vec<Value>),
    /// String-keyed map.
    Map(BTreeMap<String, Value>),
    /// Struct or trait instance.
    Struct(Struct),
    /// Reference to an entity by id.
    Id(Id),
    /// Full entity instance.
    Referenceable(Box<Referenceable>),
}

/// An enumeration literal with its ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Literal name.
    pub value: String,
    /// Ordinal declared for the literal.
    pub ordinal: i32,
}

/// A struct (or trait) instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    /// Declared type name.
    pub type_name: String,
    /// Attribute values.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

/// Entity identity: guid plus type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Id {
    /// Entity guid.
    pub id: String,
    /// Entity type name.
    pub type_name: String,
}

/// Lifecycle state of a legacy entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdState {
    /// Live entity.
    #[default]
    Active,
    /// Soft-deleted entity.
    Deleted,
}

/// A full legacy entity instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Referenceable {
    /// Identity of the entity.
    pub id: Id,
    /// Lifecycle state.
    #[serde(default)]
    pub state: IdState,
    /// Entity version.
    #[serde(default)]
    pub version: u64,
    /// Attribute values.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    /// Names of attached traits, in attachment order.
    #[serde(default)]
    pub trait_names: Vec<String>,
    /// Attached traits keyed by name.
    #[serde(default)]
    pub traits: BTreeMap<String, Struct>,
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
            Value::Boolean(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::BigInteger(_) => "biginteger",
            Value::BigDecimal(_) => "bigdecimal",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Enum(_) => "enum",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Id(_) => "id",
            Value::Referenceable(_) => "referenceable",
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as struct reference.
    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as referenceable.
    pub fn as_referenceable(&self) -> Option<&Referenceable> {
        match self {
            Value::Referenceable(r) => Some(r),
            _ => None,
        }
    }
}

impl Struct {
    /// Create an empty struct of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set an attribute value.
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

impl Id {
    /// Create an id.
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
        }
    }
}

impl Referenceable {
    /// Create an entity with the given guid and type.
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: Id::new(id, type_name),
            state: IdState::Active,
            version: 0,
            values: BTreeMap::new(),
            trait_names: Vec::new(),
            traits: BTreeMap::new(),
        }
    }

    /// Type name of the entity.
    pub fn type_name(&self) -> &str {
        &self.id.type_name
    }

    /// Set an attribute value.
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Attach a trait, keeping `trait_names` and `traits` in sync.
    pub fn with_trait(mut self, trait_value: Struct) -> Self {
        if !self.trait_names.contains(&trait_value.type_name) {
            self.trait_names.push(trait_value.type_name.clone());
        }
        self.traits.insert(trait_value.type_name.clone(), trait_value);
        self
    }

    /// Attached traits in `trait_names` order.
    ///
    /// Fails if a listed name has no trait body.
    pub fn ordered_traits(&self) -> Result<Vec<&Struct>, crate::Error> {
        self.trait_names
            .iter()
            .map(|name| {
                self.traits.get(name).ok_or_else(|| {
                    crate::Error::InvalidValue(format!(
                        "trait '{}' listed on {} has no body",
                        name, self.id.id
                    ))
                })
            })
            .collect()
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
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

impl From<Struct> for Value {
    fn from(v: Struct) -> Self {
        Value::Struct(v)
    }
}

impl From<Id> for Value {
    fn from(v: Id) -> Self {
        Value::Id(v)
    }
}

impl From<Referenceable> for Value {
    fn from(v: Referenceable) -> Self {
        Value::Referenceable(Box::new(v))
    }
}
