//! Conformance of entity instances to their definitions.

use std::collections::HashSet;

use typegraph_proto::current::{Entity, Value};

use super::parse_default;
use crate::catalog::{TypeCategory, TypeDef, TypeRegistry};
use crate::convert::FormatConverters;
use crate::error::{Error, Result};

/// Checks entities against a (staged) registry.
pub struct EntityValidator<'a> {
    registry: &'a TypeRegistry,
    converters: &'a FormatConverters,
}

impl<'a> EntityValidator<'a> {
    /// Create a validator resolving types against `registry`.
    pub fn new(registry: &'a TypeRegistry, converters: &'a FormatConverters) -> Self {
        Self {
            registry,
            converters,
        }
    }

    /// Fill absent or null attributes that declare a default.
    pub fn apply_defaults(&self, entity: &mut Entity) -> Result<()> {
        for attr in self.registry.all_attributes(&entity.type_name) {
            if entity.attributes.get(&attr.name).is_some_and(|v| !v.is_null()) {
                continue;
            }
            let Some(literal) = &attr.default_value else { continue };
            let ty = self.registry.resolve(&attr.type_name)?;
            let value = parse_default(&ty, literal).map_err(|message| Error::Conversion {
                path: format!("{}.{}", entity.type_name, attr.name),
                message,
            })?;
            entity.attributes.insert(attr.name.clone(), value);
        }
        Ok(())
    }

    /// Check that `entity` is a well-formed instance of its entity type.
    ///
    /// Attributes must be declared, required ones present, attached
    /// classifications defined and unique, and every value must convert.
    pub fn validate(&self, entity: &Entity) -> Result<()> {
        match self.registry.get(&entity.type_name) {
            Some(TypeDef::Entity(_)) => {}
            Some(other) => {
                return Err(Error::invalid(format!(
                    "'{}' is a {} type, not an entity type",
                    entity.type_name,
                    other.category()
                )))
            }
            None => {
                return Err(Error::invalid(format!(
                    "unknown entity type '{}'",
                    entity.type_name
                )))
            }
        }

        let declared = self.registry.all_attributes(&entity.type_name);
        if let Some(unknown) = entity
            .attributes
            .keys()
            .find(|name| !declared.iter().any(|a| a.name == **name))
        {
            return Err(Error::invalid(format!(
                "{} has no attribute '{}'",
                entity.type_name, unknown
            )));
        }
        if let Some(missing) = declared.iter().find(|attr| {
            !attr.is_optional && entity.attributes.get(&attr.name).map_or(true, Value::is_null)
        }) {
            return Err(Error::invalid(format!(
                "missing required attribute {}.{}",
                entity.type_name, missing.name
            )));
        }

        let mut attached = HashSet::new();
        for classification in &entity.classifications {
            if self
                .registry
                .get_in(TypeCategory::Classification, &classification.type_name)
                .is_none()
            {
                return Err(Error::not_found(format!(
                    "classification type '{}'",
                    classification.type_name
                )));
            }
            if !attached.insert(classification.type_name.as_str()) {
                return Err(Error::invalid(format!(
                    "classification '{}' attached more than once",
                    classification.type_name
                )));
            }
        }

        self.converters.to_legacy(
            self.registry,
            &Value::Entity(Box::new(entity.clone())),
            &entity.type_name,
        )?;
        Ok(())
    }
}
