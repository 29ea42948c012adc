//! Type definitions: enums, structs, classifications and entities.

use super::attribute::AttributeDef;
use super::types::TypeCategory;
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};

/// Default `type_version` for new definitions.
pub const DEFAULT_TYPE_VERSION: &str = "1.0";

fn default_type_version() -> String {
    DEFAULT_TYPE_VERSION.to_string()
}

/// One literal of an enum definition.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct EnumElementDef {
    /// Literal name (unique within the enum).
    pub value: String,
    /// Ordinal; need not be unique.
    pub ordinal: i32,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// An enumeration definition.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct EnumDef {
    /// Type name.
    pub name: String,
    /// System-assigned identifier.
    #[serde(default)]
    pub guid: String,
    /// Monotonic version.
    #[serde(default)]
    pub version: u64,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Caller-controlled type version label.
    #[serde(default = "default_type_version")]
    pub type_version: String,
    /// Creation time (microseconds since Unix epoch).
    #[serde(default)]
    pub create_time: u64,
    /// Last update time (microseconds since Unix epoch).
    #[serde(default)]
    pub update_time: u64,
    /// Literals in declaration order.
    #[serde(default)]
    pub element_defs: Vec<EnumElementDef>,
    /// Default literal.
    #[serde(default)]
    pub default_value: Option<String>,
}

/// A struct definition.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct StructDef {
    /// Type name.
    pub name: String,
    /// System-assigned identifier.
    #[serde(default)]
    pub guid: String,
    /// Monotonic version.
    #[serde(default)]
    pub version: u64,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Caller-controlled type version label.
    #[serde(default = "default_type_version")]
    pub type_version: String,
    /// Creation time (microseconds since Unix epoch).
    #[serde(default)]
    pub create_time: u64,
    /// Last update time (microseconds since Unix epoch).
    #[serde(default)]
    pub update_time: u64,
    /// Attributes in declaration order.
    #[serde(default)]
    pub attribute_defs: Vec<AttributeDef>,
}

/// A classification definition.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct ClassificationDef {
    /// Type name.
    pub name: String,
    /// System-assigned identifier.
    #[serde(default)]
    pub guid: String,
    /// Monotonic version.
    #[serde(default)]
    pub version: u64,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Caller-controlled type version label.
    #[serde(default = "default_type_version")]
    pub type_version: String,
    /// Creation time (microseconds since Unix epoch).
    #[serde(default)]
    pub create_time: u64,
    /// Last update time (microseconds since Unix epoch).
    #[serde(default)]
    pub update_time: u64,
    /// Attributes in declaration order.
    #[serde(default)]
    pub attribute_defs: Vec<AttributeDef>,
    /// Names of classification supertypes.
    #[serde(default)]
    pub super_types: Vec<String>,
}

/// An entity definition.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct EntityDef {
    /// Type name.
    pub name: String,
    /// System-assigned identifier.
    #[serde(default)]
    pub guid: String,
    /// Monotonic version.
    #[serde(default)]
    pub version: u64,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Caller-controlled type version label.
    #[serde(default = "default_type_version")]
    pub type_version: String,
    /// Creation time (microseconds since Unix epoch).
    #[serde(default)]
    pub create_time: u64,
    /// Last update time (microseconds since Unix epoch).
    #[serde(default)]
    pub update_time: u64,
    /// Attributes in declaration order.
    #[serde(default)]
    pub attribute_defs: Vec<AttributeDef>,
    /// Names of entity supertypes.
    #[serde(default)]
    pub super_types: Vec<String>,
}

/// Any type definition.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
#[serde(tag = "category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeDef {
    /// Enum definition.
    Enum(EnumDef),
    /// Struct definition.
    Struct(StructDef),
    /// Classification definition.
    Classification(ClassificationDef),
    /// Entity definition.
    Entity(EntityDef),
}

macro_rules! with_def {
    ($def:expr, $d:ident => $body:expr) => {
        match $def {
            TypeDef::Enum($d) => $body,
            TypeDef::Struct($d) => $body,
            TypeDef::Classification($d) => $body,
            TypeDef::Entity($d) => $body,
        }
    };
}

impl TypeDef {
    /// Category of this definition.
    pub fn category(&self) -> TypeCategory {
        match self {
            TypeDef::Enum(_) => TypeCategory::Enum,
            TypeDef::Struct(_) => TypeCategory::Struct,
            TypeDef::Classification(_) => TypeCategory::Classification,
            TypeDef::Entity(_) => TypeCategory::Entity,
        }
    }

    /// Type name.
    pub fn name(&self) -> &str {
        with_def!(self, d => &d.name)
    }

    /// Identifier.
    pub fn guid(&self) -> &str {
        with_def!(self, d => &d.guid)
    }

    /// Version.
    pub fn version(&self) -> u64 {
        with_def!(self, d => d.version)
    }

    /// Creation time.
    pub fn create_time(&self) -> u64 {
        with_def!(self, d => d.create_time)
    }

    /// Declared attributes (empty for enums).
    pub fn attribute_defs(&self) -> &[AttributeDef] {
        match self {
            TypeDef::Enum(_) => &[],
            TypeDef::Struct(d) => &d.attribute_defs,
            TypeDef::Classification(d) => &d.attribute_defs,
            TypeDef::Entity(d) => &d.attribute_defs,
        }
    }

    /// Declared supertypes (empty for enums and structs).
    pub fn super_types(&self) -> &[String] {
        match self {
            TypeDef::Classification(d) => &d.super_types,
            TypeDef::Entity(d) => &d.super_types,
            TypeDef::Enum(_) | TypeDef::Struct(_) => &[],
        }
    }

    /// Look up a declared (not inherited) attribute.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attribute_defs().iter().find(|a| a.name == name)
    }

    /// Replace the name.
    pub(crate) fn set_name(&mut self, name: String) {
        with_def!(self, d => d.name = name)
    }

    /// Stamp system-managed identity fields.
    pub(crate) fn set_identity(&mut self, guid: String, version: u64, create_time: u64, update_time: u64) {
        with_def!(self, d => {
            d.guid = guid;
            d.version = version;
            d.create_time = create_time;
            d.update_time = update_time;
        })
    }

    /// Serialize the definition to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a definition from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// A concrete definition type bound to its category.
///
/// Lets the store expose one generic implementation behind the
/// per-category operations.
pub trait CategoryDef: Clone + Sized {
    /// Category of this definition type.
    const CATEGORY: TypeCategory;

    /// Wrap into the category-agnostic form.
    fn into_type_def(self) -> TypeDef;

    /// Unwrap from the category-agnostic form.
    fn from_type_def(def: TypeDef) -> Option<Self>;

    /// Type name.
    fn def_name(&self) -> &str;
}

macro_rules! impl_category_def {
    ($ty:ident, $variant:ident) => {
        impl CategoryDef for $ty {
            const CATEGORY: TypeCategory = TypeCategory::$variant;

            fn into_type_def(self) -> TypeDef {
                TypeDef::$variant(self)
            }

            fn from_type_def(def: TypeDef) -> Option<Self> {
                match def {
                    TypeDef::$variant(d) => Some(d),
                    _ => None,
                }
            }

            fn def_name(&self) -> &str {
                &self.name
            }
        }

        impl From<$ty> for TypeDef {
            fn from(def: $ty) -> Self {
                TypeDef::$variant(def)
            }
        }
    };
}

impl_category_def!(EnumDef, Enum);
impl_category_def!(StructDef, Struct);
impl_category_def!(ClassificationDef, Classification);
impl_category_def!(EntityDef, Entity);

impl EnumElementDef {
    /// Create a literal.
    pub fn new(value: impl Into<String>, ordinal: i32) -> Self {
        Self {
            value: value.into(),
            ordinal,
            description: None,
        }
    }
}

impl EnumDef {
    /// Create an enum whose ordinals follow declaration order, starting at 1.
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let element_defs = values
            .into_iter()
            .zip(1..)
            .map(|(value, ordinal)| EnumElementDef::new(value, ordinal))
            .collect();
        Self {
            name: name.into(),
            guid: String::new(),
            version: 0,
            description: None,
            type_version: default_type_version(),
            create_time: 0,
            update_time: 0,
            element_defs,
            default_value: None,
        }
    }

    /// Add a literal with an explicit ordinal.
    pub fn with_element(mut self, element: EnumElementDef) -> Self {
        self.element_defs.push(element);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up a literal by name.
    pub fn element(&self, value: &str) -> Option<&EnumElementDef> {
        self.element_defs.iter().find(|e| e.value == value)
    }
}

impl StructDef {
    /// Create a struct without attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guid: String::new(),
            version: 0,
            description: None,
            type_version: default_type_version(),
            create_time: 0,
            update_time: 0,
            attribute_defs: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: AttributeDef) -> Self {
        self.attribute_defs.push(attribute);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl ClassificationDef {
    /// Create a classification without attributes or supertypes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guid: String::new(),
            version: 0,
            description: None,
            type_version: default_type_version(),
            create_time: 0,
            update_time: 0,
            attribute_defs: Vec::new(),
            super_types: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: AttributeDef) -> Self {
        self.attribute_defs.push(attribute);
        self
    }

    /// Add a supertype.
    pub fn with_super_type(mut self, name: impl Into<String>) -> Self {
        self.super_types.push(name.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl EntityDef {
    /// Create an entity type without attributes or supertypes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guid: String::new(),
            version: 0,
            description: None,
            type_version: default_type_version(),
            create_time: 0,
            update_time: 0,
            attribute_defs: Vec::new(),
            super_types: Vec::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: AttributeDef) -> Self {
        self.attribute_defs.push(attribute);
        self
    }

    /// Add multiple attributes.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = AttributeDef>) -> Self {
        self.attribute_defs.extend(attributes);
        self
    }

    /// Add a supertype.
    pub fn with_super_type(mut self, name: impl Into<String>) -> Self {
        self.super_types.push(name.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
