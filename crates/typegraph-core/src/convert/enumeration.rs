//! Enum literals.

use typegraph_proto::{current, legacy};

use super::{ConversionContext, FormatConverter, TypeKind};
use crate::catalog::{EnumDef, ResolvedType};
use crate::error::Result;

/// Converts legacy `EnumValue`s to current literal strings and back.
///
/// The ordinal is dropped on the way up and restored from the definition
/// on the way down.
pub struct EnumConverter;

fn enum_def<'d>(ty: &ResolvedType<'d>, ctx: &ConversionContext<'_>) -> Result<&'d EnumDef> {
    match ty {
        ResolvedType::Enum(def) => Ok(*def),
        other => Err(ctx.error(format!("'{}' is not an enum type", other.type_name()))),
    }
}

impl FormatConverter for EnumConverter {
    fn kind(&self) -> TypeKind {
        TypeKind::Enum
    }

    fn to_current(
        &self,
        value: &legacy::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<current::Value> {
        let def = enum_def(ty, ctx)?;
        let legacy::Value::Enum(literal) = value else {
            return Err(ctx.mismatch("enum", value.shape()));
        };
        if def.element(&literal.value).is_none() {
            return Err(ctx.error(format!(
                "'{}' is not a literal of enum {}",
                literal.value, def.name
            )));
        }
        Ok(current::Value::String(literal.value.clone()))
    }

    fn to_legacy(
        &self,
        value: &current::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<legacy::Value> {
        let def = enum_def(ty, ctx)?;
        let current::Value::String(literal) = value else {
            return Err(ctx.mismatch("enum literal string", value.shape()));
        };
        let element = def.element(literal).ok_or_else(|| {
            ctx.error(format!("'{}' is not a literal of enum {}", literal, def.name))
        })?;
        Ok(legacy::Value::Enum(legacy::EnumValue {
            value: element.value.clone(),
            ordinal: element.ordinal,
        }))
    }
}
