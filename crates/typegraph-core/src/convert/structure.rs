//! Struct and classification values.

use typegraph_proto::{current, legacy};

use super::{ConversionContext, FormatConverter, TypeKind};
use crate::catalog::{ResolvedType, TypeCategory};
use crate::error::Result;

/// Converts legacy structs to current structs and back.
pub struct StructConverter;

/// Converts legacy structs (traits) to current classifications and back.
pub struct ClassificationConverter;

/// Check that a value typed `actual` may stand where `declared` is expected.
pub(super) fn check_value_type(
    ctx: &ConversionContext<'_>,
    category: TypeCategory,
    declared: &str,
    actual: &str,
) -> Result<()> {
    let registry = ctx.registry();
    if registry.get_in(category, actual).is_none() {
        return Err(ctx.error(format!("unknown {} type '{}'", category, actual)));
    }
    if !registry.is_subtype_of(actual, declared) {
        return Err(ctx.error(format!(
            "value of type '{}' is not assignable to '{}'",
            actual, declared
        )));
    }
    Ok(())
}

fn declared_name<'d>(
    ty: &ResolvedType<'d>,
    kind: TypeKind,
    ctx: &ConversionContext<'_>,
) -> Result<&'d str> {
    match (kind, ty) {
        (TypeKind::Struct, ResolvedType::Struct(def)) => Ok(def.name.as_str()),
        (TypeKind::Classification, ResolvedType::Classification(def)) => Ok(def.name.as_str()),
        (_, other) => Err(ctx.error(format!(
            "'{}' is not a {} type",
            other.type_name(),
            kind.as_str().to_ascii_lowercase()
        ))),
    }
}

/// Convert a legacy trait body to a current classification.
pub(super) fn trait_to_classification(
    value: &legacy::Struct,
    declared: &str,
    ctx: &mut ConversionContext<'_>,
) -> Result<current::Classification> {
    check_value_type(ctx, TypeCategory::Classification, declared, &value.type_name)?;
    Ok(current::Classification {
        type_name: value.type_name.clone(),
        attributes: ctx.attributes_to_current(&value.type_name, &value.values)?,
    })
}

/// Convert a current classification to a legacy trait body.
pub(super) fn classification_to_trait(
    value: &current::Classification,
    declared: &str,
    ctx: &mut ConversionContext<'_>,
) -> Result<legacy::Struct> {
    check_value_type(ctx, TypeCategory::Classification, declared, &value.type_name)?;
    Ok(legacy::Struct {
        type_name: value.type_name.clone(),
        values: ctx.attributes_to_legacy(&value.type_name, &value.attributes)?,
    })
}

impl FormatConverter for StructConverter {
    fn kind(&self) -> TypeKind {
        TypeKind::Struct
    }

    fn to_current(
        &self,
        value: &legacy::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<current::Value> {
        let declared = declared_name(ty, TypeKind::Struct, ctx)?;
        let legacy::Value::Struct(s) = value else {
            return Err(ctx.mismatch("struct", value.shape()));
        };
        check_value_type(ctx, TypeCategory::Struct, declared, &s.type_name)?;
        Ok(current::Value::Struct(current::Struct {
            type_name: s.type_name.clone(),
            attributes: ctx.attributes_to_current(&s.type_name, &s.values)?,
        }))
    }

    fn to_legacy(
        &self,
        value: &current::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<legacy::Value> {
        let declared = declared_name(ty, TypeKind::Struct, ctx)?;
        let current::Value::Struct(s) = value else {
            return Err(ctx.mismatch("struct", value.shape()));
        };
        check_value_type(ctx, TypeCategory::Struct, declared, &s.type_name)?;
        Ok(legacy::Value::Struct(legacy::Struct {
            type_name: s.type_name.clone(),
            values: ctx.attributes_to_legacy(&s.type_name, &s.attributes)?,
        }))
    }
}

impl FormatConverter for ClassificationConverter {
    fn kind(&self) -> TypeKind {
        TypeKind::Classification
    }

    fn to_current(
        &self,
        value: &legacy::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<current::Value> {
        let declared = declared_name(ty, TypeKind::Classification, ctx)?;
        let legacy::Value::Struct(s) = value else {
            return Err(ctx.mismatch("classification", value.shape()));
        };
        Ok(current::Value::Classification(trait_to_classification(
            s, declared, ctx,
        )?))
    }

    fn to_legacy(
        &self,
        value: &current::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<legacy::Value> {
        let declared = declared_name(ty, TypeKind::Classification, ctx)?;
        let current::Value::Classification(c) = value else {
            return Err(ctx.mismatch("classification", value.shape()));
        };
        Ok(legacy::Value::Struct(classification_to_trait(c, declared, ctx)?))
    }
}
