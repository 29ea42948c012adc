//! Arrays and maps.

use std::collections::BTreeMap;

use typegraph_proto::{current, legacy};

use super::{ConversionContext, FormatConverter, PathSegment, TypeKind};
use crate::catalog::ResolvedType;
use crate::error::Result;
use crate::validation::parse_default;

/// Converts arrays element by element.
pub struct ArrayConverter;

/// Converts maps entry by entry. Keys stay strings but must be valid
/// literals of the declared key type.
pub struct MapConverter;

fn element_type<'t, 'd>(
    ty: &'t ResolvedType<'d>,
    ctx: &ConversionContext<'_>,
) -> Result<&'t ResolvedType<'d>> {
    match ty {
        ResolvedType::Array(elem) => Ok(&**elem),
        other => Err(ctx.error(format!("'{}' is not an array type", other.type_name()))),
    }
}

fn entry_types<'t, 'd>(
    ty: &'t ResolvedType<'d>,
    ctx: &ConversionContext<'_>,
) -> Result<(&'t ResolvedType<'d>, &'t ResolvedType<'d>)> {
    match ty {
        ResolvedType::Map(key, value) => Ok((&**key, &**value)),
        other => Err(ctx.error(format!("'{}' is not a map type", other.type_name()))),
    }
}

fn check_key(key: &str, key_type: &ResolvedType<'_>, ctx: &ConversionContext<'_>) -> Result<()> {
    parse_default(key_type, key)
        .map(|_| ())
        .map_err(|msg| ctx.error(format!("invalid map key: {}", msg)))
}

impl FormatConverter for ArrayConverter {
    fn kind(&self) -> TypeKind {
        TypeKind::Array
    }

    fn to_current(
        &self,
        value: &legacy::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<current::Value> {
        let elem = element_type(ty, ctx)?;
        let legacy::Value::Array(items) = value else {
            return Err(ctx.mismatch("array", value.shape()));
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            out.push(ctx.with_segment(PathSegment::Index(i), |ctx| ctx.to_current(item, elem))?);
        }
        Ok(current::Value::Array(out))
    }

    fn to_legacy(
        &self,
        value: &current::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<legacy::Value> {
        let elem = element_type(ty, ctx)?;
        let current::Value::Array(items) = value else {
            return Err(ctx.mismatch("array", value.shape()));
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            out.push(ctx.with_segment(PathSegment::Index(i), |ctx| ctx.to_legacy(item, elem))?);
        }
        Ok(legacy::Value::Array(out))
    }
}

impl FormatConverter for MapConverter {
    fn kind(&self) -> TypeKind {
        TypeKind::Map
    }

    fn to_current(
        &self,
        value: &legacy::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<current::Value> {
        let (key_type, value_type) = entry_types(ty, ctx)?;
        let legacy::Value::Map(entries) = value else {
            return Err(ctx.mismatch("map", value.shape()));
        };
        let mut out = BTreeMap::new();
        for (key, item) in entries {
            let converted = ctx.with_segment(PathSegment::Key(key.clone()), |ctx| {
                check_key(key, key_type, ctx)?;
                ctx.to_current(item, value_type)
            })?;
            out.insert(key.clone(), converted);
        }
        Ok(current::Value::Map(out))
    }

    fn to_legacy(
        &self,
        value: &current::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<legacy::Value> {
        let (key_type, value_type) = entry_types(ty, ctx)?;
        let current::Value::Map(entries) = value else {
            return Err(ctx.mismatch("map", value.shape()));
        };
        let mut out = BTreeMap::new();
        for (key, item) in entries {
            let converted = ctx.with_segment(PathSegment::Key(key.clone()), |ctx| {
                check_key(key, key_type, ctx)?;
                ctx.to_legacy(item, value_type)
            })?;
            out.insert(key.clone(), converted);
        }
        Ok(legacy::Value::Map(out))
    }
}
