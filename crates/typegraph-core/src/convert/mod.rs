//! Format conversion between the legacy and current value models.
//!
//! Every value kind has a [`FormatConverter`]; converters recurse through a
//! [`ConversionContext`], which dispatches nested values by their declared
//! type and tracks the attribute path for error reporting. Add a kind by
//! implementing the trait and registering it on [`FormatConverters`].

mod collection;
mod context;
mod entity;
mod enumeration;
mod primitive;
mod structure;

pub use collection::{ArrayConverter, MapConverter};
pub use context::{ConversionContext, PathSegment};
pub use entity::EntityConverter;
pub use enumeration::EnumConverter;
pub use primitive::PrimitiveConverter;
pub use structure::{ClassificationConverter, StructConverter};

use std::collections::HashMap;
use std::fmt;

use typegraph_proto::{current, legacy};

use crate::catalog::{ResolvedType, TypeRegistry};
use crate::error::Result;

/// Value kinds with a dedicated converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Builtin primitive.
    Primitive,
    /// Enum literal.
    Enum,
    /// String-keyed map.
    Map,
    /// Ordered array.
    Array,
    /// Struct value.
    Struct,
    /// Classification value.
    Classification,
    /// Entity value or reference.
    Entity,
}

impl TypeKind {
    /// Upper-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Primitive => "PRIMITIVE",
            TypeKind::Enum => "ENUM",
            TypeKind::Map => "MAP",
            TypeKind::Array => "ARRAY",
            TypeKind::Struct => "STRUCT",
            TypeKind::Classification => "CLASSIFICATION",
            TypeKind::Entity => "ENTITY",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ResolvedType<'_> {
    /// Converter kind for values of this type.
    pub fn kind(&self) -> TypeKind {
        match self {
            ResolvedType::Primitive(_) => TypeKind::Primitive,
            ResolvedType::Enum(_) => TypeKind::Enum,
            ResolvedType::Array(_) => TypeKind::Array,
            ResolvedType::Map(_, _) => TypeKind::Map,
            ResolvedType::Struct(_) => TypeKind::Struct,
            ResolvedType::Classification(_) => TypeKind::Classification,
            ResolvedType::Entity(_) => TypeKind::Entity,
        }
    }
}

/// Converts values of one kind between the two models.
///
/// Null values never reach a converter; the context maps them directly.
pub trait FormatConverter: Send + Sync {
    /// Kind handled by this converter.
    fn kind(&self) -> TypeKind;

    /// Convert a legacy value declared as `ty` to the current model.
    fn to_current(
        &self,
        value: &legacy::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<current::Value>;

    /// Convert a current value declared as `ty` to the legacy model.
    fn to_legacy(
        &self,
        value: &current::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<legacy::Value>;
}

/// Registry of converters keyed by kind.
pub struct FormatConverters {
    converters: HashMap<TypeKind, Box<dyn FormatConverter>>,
}

impl FormatConverters {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Create a registry with the builtin converter for every kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PrimitiveConverter));
        registry.register(Box::new(EnumConverter));
        registry.register(Box::new(ArrayConverter));
        registry.register(Box::new(MapConverter));
        registry.register(Box::new(StructConverter));
        registry.register(Box::new(ClassificationConverter));
        registry.register(Box::new(EntityConverter));
        registry
    }

    /// Register a converter, replacing any previous one for its kind.
    pub fn register(&mut self, converter: Box<dyn FormatConverter>) {
        self.converters.insert(converter.kind(), converter);
    }

    /// Look up the converter for a kind.
    pub fn get(&self, kind: TypeKind) -> Option<&dyn FormatConverter> {
        self.converters.get(&kind).map(|c| c.as_ref())
    }

    /// Number of registered converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Check if no converter is registered.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Convert a legacy value of type `type_name` to the current model.
    pub fn to_current(
        &self,
        registry: &TypeRegistry,
        value: &legacy::Value,
        type_name: &str,
    ) -> Result<current::Value> {
        let mut ctx = ConversionContext::new(self, registry, type_name);
        let ty = ctx.resolve(type_name)?;
        ctx.to_current(value, &ty)
    }

    /// Convert a current value of type `type_name` to the legacy model.
    pub fn to_legacy(
        &self,
        registry: &TypeRegistry,
        value: &current::Value,
        type_name: &str,
    ) -> Result<legacy::Value> {
        let mut ctx = ConversionContext::new(self, registry, type_name);
        let ty = ctx.resolve(type_name)?;
        ctx.to_legacy(value, &ty)
    }
}

impl Default for FormatConverters {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EnumDef;
    use crate::error::Error;

    #[test]
    fn test_defaults_cover_every_kind() {
        let converters = FormatConverters::with_defaults();
        assert_eq!(converters.len(), 7);
        for kind in [
            TypeKind::Primitive,
            TypeKind::Enum,
            TypeKind::Map,
            TypeKind::Array,
            TypeKind::Struct,
            TypeKind::Classification,
            TypeKind::Entity,
        ] {
            assert_eq!(converters.get(kind).map(|c| c.kind()), Some(kind));
        }
    }

    #[test]
    fn test_missing_converter() {
        let registry = TypeRegistry::from_defs([EnumDef::new("Status", ["ACTIVE"]).into()]);
        let mut converters = FormatConverters::new();
        converters.register(Box::new(PrimitiveConverter));
        assert!(!converters.is_empty());

        let value = legacy::Value::Enum(legacy::EnumValue {
            value: "ACTIVE".into(),
            ordinal: 1,
        });
        let err = converters.to_current(&registry, &value, "Status").unwrap_err();
        assert!(matches!(err, Error::Conversion { ref message, .. } if message.contains("ENUM")));

        // Null needs no converter.
        assert_eq!(
            converters
                .to_current(&registry, &legacy::Value::Null, "Status")
                .unwrap(),
            current::Value::Null
        );
    }

    #[test]
    fn test_register_replaces() {
        let mut converters = FormatConverters::with_defaults();
        converters.register(Box::new(PrimitiveConverter));
        assert_eq!(converters.len(), 7);
    }

    #[test]
    fn test_unknown_declared_type() {
        let converters = FormatConverters::with_defaults();
        let err = converters
            .to_current(&TypeRegistry::new(), &legacy::Value::Int(1), "Missing")
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { ref path, .. } if path == "Missing"));
    }
}
