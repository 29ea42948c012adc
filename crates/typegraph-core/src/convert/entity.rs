//! Entity values and entity references.

use std::collections::BTreeMap;

use typegraph_proto::{current, legacy};

use super::structure::{check_value_type, classification_to_trait, trait_to_classification};
use super::{ConversionContext, FormatConverter, PathSegment, TypeKind};
use crate::catalog::{ResolvedType, TypeCategory};
use crate::error::Result;

/// Converts legacy `Referenceable`s to current entities and legacy `Id`s to
/// object ids, and back. References are never inlined.
pub struct EntityConverter;

pub(super) fn id_to_object_id(id: &legacy::Id) -> current::ObjectId {
    current::ObjectId::new(id.id.clone(), id.type_name.clone())
}

pub(super) fn object_id_to_id(oid: &current::ObjectId) -> legacy::Id {
    legacy::Id::new(oid.guid.clone(), oid.type_name.clone())
}

pub(super) fn referenceable_to_entity(
    value: &legacy::Referenceable,
    ctx: &mut ConversionContext<'_>,
) -> Result<current::Entity> {
    let attributes = ctx.attributes_to_current(value.type_name(), &value.values)?;
    let traits = value.ordered_traits().map_err(|e| ctx.error(e.to_string()))?;

    let mut classifications = Vec::with_capacity(traits.len());
    for body in traits {
        let classification = ctx.with_segment(PathSegment::Attribute(body.type_name.clone()), |ctx| {
            trait_to_classification(body, &body.type_name, ctx)
        })?;
        classifications.push(classification);
    }

    Ok(current::Entity {
        guid: value.id.id.clone(),
        type_name: value.type_name().to_string(),
        status: match value.state {
            legacy::IdState::Active => current::EntityStatus::Active,
            legacy::IdState::Deleted => current::EntityStatus::Deleted,
        },
        version: value.version,
        attributes,
        classifications,
    })
}

pub(super) fn entity_to_referenceable(
    value: &current::Entity,
    ctx: &mut ConversionContext<'_>,
) -> Result<legacy::Referenceable> {
    let values = ctx.attributes_to_legacy(&value.type_name, &value.attributes)?;

    let mut trait_names = Vec::with_capacity(value.classifications.len());
    let mut traits = BTreeMap::new();
    for classification in &value.classifications {
        if traits.contains_key(&classification.type_name) {
            return Err(ctx.error(format!(
                "classification '{}' attached more than once",
                classification.type_name
            )));
        }
        let body = ctx.with_segment(
            PathSegment::Attribute(classification.type_name.clone()),
            |ctx| classification_to_trait(classification, &classification.type_name, ctx),
        )?;
        trait_names.push(classification.type_name.clone());
        traits.insert(classification.type_name.clone(), body);
    }

    Ok(legacy::Referenceable {
        id: legacy::Id::new(value.guid.clone(), value.type_name.clone()),
        state: match value.status {
            current::EntityStatus::Active => legacy::IdState::Active,
            current::EntityStatus::Deleted => legacy::IdState::Deleted,
        },
        version: value.version,
        values,
        trait_names,
        traits,
    })
}

fn declared_entity<'d>(ty: &ResolvedType<'d>, ctx: &ConversionContext<'_>) -> Result<&'d str> {
    match ty {
        ResolvedType::Entity(def) => Ok(def.name.as_str()),
        other => Err(ctx.error(format!("'{}' is not an entity type", other.type_name()))),
    }
}

impl FormatConverter for EntityConverter {
    fn kind(&self) -> TypeKind {
        TypeKind::Entity
    }

    fn to_current(
        &self,
        value: &legacy::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<current::Value> {
        let declared = declared_entity(ty, ctx)?;
        match value {
            legacy::Value::Referenceable(r) => {
                check_value_type(ctx, TypeCategory::Entity, declared, r.type_name())?;
                Ok(current::Value::Entity(Box::new(referenceable_to_entity(r, ctx)?)))
            }
            legacy::Value::Id(id) => {
                check_value_type(ctx, TypeCategory::Entity, declared, &id.type_name)?;
                Ok(current::Value::ObjectId(id_to_object_id(id)))
            }
            other => Err(ctx.mismatch("entity or id", other.shape())),
        }
    }

    fn to_legacy(
        &self,
        value: &current::Value,
        ty: &ResolvedType<'_>,
        ctx: &mut ConversionContext<'_>,
    ) -> Result<legacy::Value> {
        let declared = declared_entity(ty, ctx)?;
        match value {
            current::Value::Entity(e) => {
                check_value_type(ctx, TypeCategory::Entity, declared, &e.type_name)?;
                Ok(legacy::Value::Referenceable(Box::new(entity_to_referenceable(e, ctx)?)))
            }
            current::Value::ObjectId(oid) => {
                check_value_type(ctx, TypeCategory::Entity, declared, &oid.type_name)?;
                Ok(legacy::Value::Id(object_id_to_id(oid)))
            }
            other => Err(ctx.mismatch("entity or object id", other.shape())),
        }
    }
}
