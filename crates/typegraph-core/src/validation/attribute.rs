//! Definition well-formedness and attribute type resolution.

use std::collections::{BTreeSet, HashSet};

use typegraph_proto::current;

use crate::catalog::{PrimitiveType, ResolvedType, TypeDef, TypeRegistry};
use crate::error::{Error, Result};

/// Check that `name` can be used as a definition name.
///
/// Names are non-empty, do not shadow a primitive and contain neither
/// collection syntax nor control characters.
pub fn validate_type_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid("type name must not be empty"));
    }
    if name != name.trim() {
        return Err(Error::invalid(format!(
            "type name '{}' has surrounding whitespace",
            name
        )));
    }
    if PrimitiveType::from_name(name).is_some() {
        return Err(Error::invalid(format!(
            "type name '{}' is reserved for a primitive",
            name
        )));
    }
    if name.contains(['<', '>', ',']) || name.chars().any(char::is_control) {
        return Err(Error::invalid(format!(
            "type name '{}' contains illegal characters",
            name
        )));
    }
    Ok(())
}

/// Parse an attribute default literal for its resolved type.
pub fn parse_default(ty: &ResolvedType<'_>, literal: &str) -> std::result::Result<current::Value, String> {
    match ty {
        ResolvedType::Primitive(p) => p.parse_literal(literal),
        ResolvedType::Enum(def) => match def.element(literal) {
            Some(_) => Ok(current::Value::String(literal.to_string())),
            None => Err(format!("'{}' is not a literal of enum {}", literal, def.name)),
        },
        other => Err(format!(
            "defaults are not supported for type '{}'",
            other.type_name()
        )),
    }
}

/// Names of every definition reachable through a resolved type.
pub fn referenced_definitions<'r>(ty: &ResolvedType<'r>, out: &mut BTreeSet<&'r str>) {
    match ty {
        ResolvedType::Primitive(_) => {}
        ResolvedType::Enum(d) => {
            out.insert(d.name.as_str());
        }
        ResolvedType::Struct(d) => {
            out.insert(d.name.as_str());
        }
        ResolvedType::Classification(d) => {
            out.insert(d.name.as_str());
        }
        ResolvedType::Entity(d) => {
            out.insert(d.name.as_str());
        }
        ResolvedType::Array(elem) => referenced_definitions(elem, out),
        ResolvedType::Map(key, value) => {
            referenced_definitions(key, out);
            referenced_definitions(value, out);
        }
    }
}

/// Validates a definition against a (staged) registry.
pub struct AttributeValidator<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> AttributeValidator<'r> {
    /// Create a validator resolving types against `registry`.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Validate `def` and return the definitions its attributes reference.
    pub fn validate(&self, def: &TypeDef) -> Result<BTreeSet<&'r str>> {
        validate_type_name(def.name())?;

        if let TypeDef::Enum(e) = def {
            let mut seen = HashSet::new();
            for element in &e.element_defs {
                if element.value.is_empty() {
                    return Err(Error::invalid(format!("enum '{}' has an empty literal", e.name)));
                }
                if !seen.insert(element.value.as_str()) {
                    return Err(Error::invalid(format!(
                        "enum '{}' declares literal '{}' more than once",
                        e.name, element.value
                    )));
                }
            }
            if let Some(default) = &e.default_value {
                if !seen.contains(default.as_str()) {
                    return Err(Error::invalid(format!(
                        "enum '{}' default '{}' is not one of its literals",
                        e.name, default
                    )));
                }
            }
            return Ok(BTreeSet::new());
        }

        let mut names = HashSet::new();
        let mut referenced = BTreeSet::new();
        for attr in def.attribute_defs() {
            if attr.name.trim().is_empty() {
                return Err(Error::invalid(format!(
                    "'{}' declares an attribute without a name",
                    def.name()
                )));
            }
            if !names.insert(attr.name.as_str()) {
                return Err(Error::invalid(format!(
                    "'{}' declares attribute '{}' more than once",
                    def.name(),
                    attr.name
                )));
            }

            let resolved = self.registry.resolve(&attr.type_name).map_err(|e| {
                Error::invalid(format!(
                    "{}.{}: type '{}' does not resolve ({})",
                    def.name(),
                    attr.name,
                    attr.type_name,
                    e
                ))
            })?;

            if let Some(default) = &attr.default_value {
                parse_default(&resolved, default).map_err(|msg| {
                    Error::invalid(format!("{}.{}: bad default: {}", def.name(), attr.name, msg))
                })?;
            }
            referenced_definitions(&resolved, &mut referenced);
        }
        referenced.remove(def.name());
        Ok(referenced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeDef, EntityDef, EnumDef, StructDef};

    fn registry() -> TypeRegistry {
        TypeRegistry::from_defs([
            EnumDef::new("Status", ["ACTIVE", "INACTIVE"]).into(),
            StructDef::new("Address")
                .with_attribute(AttributeDef::new("lines", "array<string>"))
                .into(),
            EntityDef::new("Department").into(),
        ])
    }

    #[test]
    fn test_type_names() {
        assert!(validate_type_name("Employee").is_ok());
        assert!(validate_type_name("").is_err());
        assert!(validate_type_name("string").is_err());
        assert!(validate_type_name("array<int>").is_err());
        assert!(validate_type_name(" Employee").is_err());
        assert!(validate_type_name("a\0b").is_err());
    }

    #[test]
    fn test_referenced_definitions() {
        let reg = registry();
        let def: TypeDef = EntityDef::new("Employee")
            .with_attribute(AttributeDef::new("name", "string"))
            .with_attribute(AttributeDef::new("status", "Status").with_default("ACTIVE"))
            .with_attribute(AttributeDef::optional("homes", "map<Status,array<Address>>"))
            .with_attribute(AttributeDef::optional("department", "Department"))
            .into();

        let refs = AttributeValidator::new(&reg).validate(&def).unwrap();
        assert_eq!(
            refs.into_iter().collect::<Vec<_>>(),
            vec!["Address", "Department", "Status"]
        );
    }

    #[test]
    fn test_self_reference_not_listed() {
        let staged = registry().with_changes(
            [EntityDef::new("Node")
                .with_attribute(AttributeDef::optional("next", "Node"))
                .into()],
            std::iter::empty(),
        );
        let def = staged.get("Node").unwrap().clone();
        assert!(AttributeValidator::new(&staged).validate(&def).unwrap().is_empty());
    }

    #[test]
    fn test_unresolved_attribute_type() {
        let reg = registry();
        let def: TypeDef = EntityDef::new("Employee")
            .with_attribute(AttributeDef::new("address", "Adress"))
            .into();
        let err = AttributeValidator::new(&reg).validate(&def).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref m) if m.contains("Employee.address")));
    }

    #[test]
    fn test_duplicate_attribute() {
        let reg = registry();
        let def: TypeDef = StructDef::new("Phone")
            .with_attribute(AttributeDef::new("number", "string"))
            .with_attribute(AttributeDef::new("number", "long"))
            .into();
        assert!(AttributeValidator::new(&reg).validate(&def).is_err());
    }

    #[test]
    fn test_bad_defaults() {
        let reg = registry();
        let bad_enum: TypeDef = EntityDef::new("E")
            .with_attribute(AttributeDef::new("status", "Status").with_default("RETIRED"))
            .into();
        assert!(AttributeValidator::new(&reg).validate(&bad_enum).is_err());

        let bad_int: TypeDef = EntityDef::new("E")
            .with_attribute(AttributeDef::new("age", "int").with_default("old"))
            .into();
        assert!(AttributeValidator::new(&reg).validate(&bad_int).is_err());

        let struct_default: TypeDef = EntityDef::new("E")
            .with_attribute(AttributeDef::new("address", "Address").with_default("x"))
            .into();
        assert!(AttributeValidator::new(&reg).validate(&struct_default).is_err());
    }

    #[test]
    fn test_enum_literals() {
        let reg = registry();
        let dup: TypeDef = EnumDef::new("Color", ["RED", "RED"]).into();
        assert!(AttributeValidator::new(&reg).validate(&dup).is_err());

        let mut bad_default = EnumDef::new("Color", ["RED"]);
        bad_default.default_value = Some("BLUE".into());
        assert!(AttributeValidator::new(&reg)
            .validate(&bad_default.into())
            .is_err());
    }

    #[test]
    fn test_parse_default_values() {
        let reg = registry();
        let status = reg.resolve("Status").unwrap();
        assert_eq!(
            parse_default(&status, "INACTIVE").unwrap(),
            current::Value::String("INACTIVE".into())
        );
        let long = reg.resolve("long").unwrap();
        assert_eq!(parse_default(&long, "7").unwrap(), current::Value::Int(7));
    }
}
