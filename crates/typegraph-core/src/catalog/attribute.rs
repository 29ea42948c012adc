//! Attribute definitions for structs, classifications and entities.

use super::types::Cardinality;
use rkyv::{Archive, Deserialize, Serialize};

/// An attribute definition within a struct, classification or entity type.
#[derive(
    Debug, Clone, PartialEq, Archive, Serialize, Deserialize, serde::Serialize, serde::Deserialize,
)]
pub struct AttributeDef {
    /// Attribute name (unique within its definition).
    pub name: String,
    /// Type name: a primitive, `array<..>`, `map<..,..>` or a defined type.
    pub type_name: String,
    /// Value cardinality.
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Whether the attribute may be omitted.
    #[serde(default)]
    pub is_optional: bool,
    /// Whether values must be unique across instances.
    #[serde(default)]
    pub is_unique: bool,
    /// Default value literal applied when an instance is created without it.
    #[serde(default)]
    pub default_value: Option<String>,
}

impl AttributeDef {
    /// Create a new required attribute.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            cardinality: Cardinality::Single,
            is_optional: false,
            is_unique: false,
            default_value: None,
        }
    }

    /// Create an optional attribute.
    pub fn optional(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            is_optional: true,
            ..Self::new(name, type_name)
        }
    }

    /// Set the default value literal.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_value = Some(default.into());
        self
    }

    /// Set the cardinality.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Check if an instance must supply this attribute.
    pub fn is_required(&self) -> bool {
        !self.is_optional && self.default_value.is_none()
    }
}
