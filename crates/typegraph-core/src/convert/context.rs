//! Recursive dispatch and attribute path tracking.

use std::collections::BTreeMap;
use std::fmt::Write;

use typegraph_proto::{current, legacy};

use super::{entity, FormatConverter, FormatConverters, TypeKind};
use crate::catalog::{ResolvedType, TypeCategory, TypeRegistry};
use crate::error::{Error, Result};

/// One step of an attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Attribute (or trait) name, rendered as `.name`.
    Attribute(String),
    /// Array position, rendered as `[i]`.
    Index(usize),
    /// Map key, rendered as `[key]`.
    Key(String),
}

/// State shared by one conversion call: the converters, the registry and
/// the path of the value being converted.
pub struct ConversionContext<'a> {
    converters: &'a FormatConverters,
    registry: &'a TypeRegistry,
    root: String,
    path: Vec<PathSegment>,
}

impl<'a> ConversionContext<'a> {
    /// Start a conversion of a value of `root` type.
    pub fn new(converters: &'a FormatConverters, registry: &'a TypeRegistry, root: &str) -> Self {
        Self {
            converters,
            registry,
            root: root.to_string(),
            path: Vec::new(),
        }
    }

    /// The registry types are resolved against.
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Rendered path of the value currently being converted.
    pub fn path(&self) -> String {
        let mut out = self.root.clone();
        for segment in &self.path {
            // Writing to a String cannot fail.
            let _ = match segment {
                PathSegment::Attribute(name) => write!(out, ".{}", name),
                PathSegment::Index(i) => write!(out, "[{}]", i),
                PathSegment::Key(key) => write!(out, "[{}]", key),
            };
        }
        out
    }

    /// Build a conversion error at the current path.
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::Conversion {
            path: self.path(),
            message: message.into(),
        }
    }

    /// Build a shape mismatch error.
    pub fn mismatch(&self, expected: &str, found: &str) -> Error {
        self.error(format!("expected {} but found {}", expected, found))
    }

    /// Resolve a type name, reporting failures at the current path.
    pub fn resolve(&self, type_name: &str) -> Result<ResolvedType<'a>> {
        self.registry
            .resolve(type_name)
            .map_err(|e| self.error(e.to_string()))
    }

    /// Run `f` with `segment` appended to the path.
    pub fn with_segment<T>(
        &mut self,
        segment: PathSegment,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }

    fn converter(&self, kind: TypeKind) -> Result<&'a dyn FormatConverter> {
        let converters = self.converters;
        converters
            .get(kind)
            .ok_or_else(|| self.error(format!("no converter registered for {}", kind)))
    }

    /// Convert a legacy value declared as `ty`.
    pub fn to_current(&mut self, value: &legacy::Value, ty: &ResolvedType<'_>) -> Result<current::Value> {
        if value.is_null() {
            return Ok(current::Value::Null);
        }
        let converter = self.converter(ty.kind())?;
        converter.to_current(value, ty, self)
    }

    /// Convert a current value declared as `ty`.
    pub fn to_legacy(&mut self, value: &current::Value, ty: &ResolvedType<'_>) -> Result<legacy::Value> {
        if value.is_null() {
            return Ok(legacy::Value::Null);
        }
        let converter = self.converter(ty.kind())?;
        converter.to_legacy(value, ty, self)
    }

    /// Convert the attribute values of an instance of `type_name`.
    ///
    /// Declared attributes (including inherited ones) convert by their
    /// declared type; anything else is inferred from its shape.
    pub fn attributes_to_current(
        &mut self,
        type_name: &str,
        values: &BTreeMap<String, legacy::Value>,
    ) -> Result<BTreeMap<String, current::Value>> {
        let registry = self.registry;
        let declared = registry.all_attributes(type_name);
        let mut out = BTreeMap::new();
        for (name, value) in values {
            let converted = self.with_segment(PathSegment::Attribute(name.clone()), |ctx| {
                match declared.iter().find(|a| &a.name == name) {
                    Some(attr) => {
                        let ty = ctx.resolve(&attr.type_name)?;
                        ctx.to_current(value, &ty)
                    }
                    None => ctx.infer_to_current(value),
                }
            })?;
            out.insert(name.clone(), converted);
        }
        Ok(out)
    }

    /// Convert the attribute values of an instance of `type_name`.
    pub fn attributes_to_legacy(
        &mut self,
        type_name: &str,
        values: &BTreeMap<String, current::Value>,
    ) -> Result<BTreeMap<String, legacy::Value>> {
        let registry = self.registry;
        let declared = registry.all_attributes(type_name);
        let mut out = BTreeMap::new();
        for (name, value) in values {
            let converted = self.with_segment(PathSegment::Attribute(name.clone()), |ctx| {
                match declared.iter().find(|a| &a.name == name) {
                    Some(attr) => {
                        let ty = ctx.resolve(&attr.type_name)?;
                        ctx.to_legacy(value, &ty)
                    }
                    None => ctx.infer_to_legacy(value),
                }
            })?;
            out.insert(name.clone(), converted);
        }
        Ok(out)
    }

    /// Convert a legacy value with no declared type.
    pub fn infer_to_current(&mut self, value: &legacy::Value) -> Result<current::Value> {
        use legacy::Value as L;

        Ok(match value {
            L::Null => current::Value::Null,
            L::Boolean(b) => current::Value::Bool(*b),
            L::Byte(v) => current::Value::Int((*v).into()),
            L::Short(v) => current::Value::Int((*v).into()),
            L::Int(v) => current::Value::Int((*v).into()),
            L::Long(v) | L::Date(v) => current::Value::Int(*v),
            L::Float(v) => current::Value::Float((*v).into()),
            L::Double(v) => current::Value::Float(*v),
            L::BigInteger(s) | L::BigDecimal(s) | L::String(s) => current::Value::String(s.clone()),
            L::Enum(e) => current::Value::String(e.value.clone()),
            L::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.with_segment(PathSegment::Index(i), |ctx| ctx.infer_to_current(item))?);
                }
                current::Value::Array(out)
            }
            L::Map(entries) => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    let converted =
                        self.with_segment(PathSegment::Key(key.clone()), |ctx| ctx.infer_to_current(item))?;
                    out.insert(key.clone(), converted);
                }
                current::Value::Map(out)
            }
            L::Struct(s) => {
                let attributes = self.attributes_to_current(&s.type_name, &s.values)?;
                if self
                    .registry
                    .get_in(TypeCategory::Classification, &s.type_name)
                    .is_some()
                {
                    current::Value::Classification(current::Classification {
                        type_name: s.type_name.clone(),
                        attributes,
                    })
                } else {
                    current::Value::Struct(current::Struct {
                        type_name: s.type_name.clone(),
                        attributes,
                    })
                }
            }
            L::Id(id) => current::Value::ObjectId(entity::id_to_object_id(id)),
            L::Referenceable(r) => {
                current::Value::Entity(Box::new(entity::referenceable_to_entity(r, self)?))
            }
        })
    }

    /// Convert a current value with no declared type.
    pub fn infer_to_legacy(&mut self, value: &current::Value) -> Result<legacy::Value> {
        use current::Value as C;

        Ok(match value {
            C::Null => legacy::Value::Null,
            C::Bool(b) => legacy::Value::Boolean(*b),
            C::Int(v) => legacy::Value::Long(*v),
            C::Float(v) => legacy::Value::Double(*v),
            C::String(s) => legacy::Value::String(s.clone()),
            C::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(self.with_segment(PathSegment::Index(i), |ctx| ctx.infer_to_legacy(item))?);
                }
                legacy::Value::Array(out)
            }
            C::Map(entries) => {
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    let converted =
                        self.with_segment(PathSegment::Key(key.clone()), |ctx| ctx.infer_to_legacy(item))?;
                    out.insert(key.clone(), converted);
                }
                legacy::Value::Map(out)
            }
            C::Struct(s) => legacy::Value::Struct(legacy::Struct {
                type_name: s.type_name.clone(),
                values: self.attributes_to_legacy(&s.type_name, &s.attributes)?,
            }),
            C::Classification(c) => legacy::Value::Struct(legacy::Struct {
                type_name: c.type_name.clone(),
                values: self.attributes_to_legacy(&c.type_name, &c.attributes)?,
            }),
            C::ObjectId(oid) => legacy::Value::Id(entity::object_id_to_id(oid)),
            C::Entity(e) => {
                legacy::Value::Referenceable(Box::new(entity::entity_to_referenceable(e, self)?))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rendering() {
        let converters = FormatConverters::new();
        let registry = TypeRegistry::new();
        let mut ctx = ConversionContext::new(&converters, &registry, "Employee");

        let path = ctx
            .with_segment(PathSegment::Attribute("address".into()), |ctx| {
                ctx.with_segment(PathSegment::Attribute("lines".into()), |ctx| {
                    ctx.with_segment(PathSegment::Index(2), |ctx| Ok(ctx.path()))
                })
            })
            .unwrap();
        assert_eq!(path, "Employee.address.lines[2]");
        assert_eq!(ctx.path(), "Employee");

        let keyed = ctx
            .with_segment(PathSegment::Key("home".into()), |ctx| Ok(ctx.path()))
            .unwrap();
        assert_eq!(keyed, "Employee[home]");
    }

    #[test]
    fn test_infer_untyped_values() {
        let converters = FormatConverters::new();
        let registry = TypeRegistry::new();
        let mut ctx = ConversionContext::new(&converters, &registry, "x");

        let legacy_value = legacy::Value::Array(vec![
            legacy::Value::Short(3),
            legacy::Value::Enum(legacy::EnumValue {
                value: "RED".into(),
                ordinal: 1,
            }),
            legacy::Value::Null,
        ]);
        assert_eq!(
            ctx.infer_to_current(&legacy_value).unwrap(),
            current::Value::Array(vec![
                current::Value::Int(3),
                current::Value::String("RED".into()),
                current::Value::Null,
            ])
        );

        assert_eq!(
            ctx.infer_to_legacy(&current::Value::Int(5)).unwrap(),
            legacy::Value::Long(5)
        );
    }
}
