//! Entity instances stored alongside their type definitions.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::{info, instrument, warn};
use typegraph_proto::current::{Classification, Entity, EntityStatus};
use typegraph_proto::{EntityMutationResponse, SearchFilter};
use uuid::Uuid;

use super::TypeDefStore;
use crate::catalog::{TypeCategory, TypeDef, TypeRegistry};
use crate::convert::FormatConverters;
use crate::error::{Error, Result};
use crate::storage::{EdgeLabel, GraphAdapter, Transaction, Vertex, VertexKind};
use crate::validation::EntityValidator;

/// The entity store.
///
/// Entities are `Entity` vertices holding their current-model JSON, linked
/// by `instance_of` to their definition, `classified_as` to attached
/// classifications and `references` to every entity they point at. Writes
/// share the type store's write gate, so definitions cannot change under a
/// batch being validated.
pub struct EntityStore {
    types: Arc<TypeDefStore>,
    converters: FormatConverters,
}

impl EntityStore {
    /// Create an entity store over `types` with the builtin converters.
    pub fn new(types: Arc<TypeDefStore>) -> Self {
        Self::with_converters(types, FormatConverters::with_defaults())
    }

    /// Create an entity store using `converters` for value validation.
    pub fn with_converters(types: Arc<TypeDefStore>, converters: FormatConverters) -> Self {
        Self { types, converters }
    }

    /// The type store backing this entity store.
    pub fn types(&self) -> &Arc<TypeDefStore> {
        &self.types
    }

    fn graph(&self) -> &dyn GraphAdapter {
        self.types.graph()
    }

    // ========== Reads ==========

    /// Get an entity by guid.
    pub fn get_entity(&self, guid: &str) -> Result<Entity> {
        require_guid(guid)?;
        self.load(guid)?
            .ok_or_else(|| Error::not_found(format!("entity '{}'", guid)))
    }

    /// Get several entities, in request order.
    pub fn get_entities(&self, guids: &[String]) -> Result<Vec<Entity>> {
        guids.iter().map(|guid| self.get_entity(guid)).collect()
    }

    /// Classifications attached to an entity.
    pub fn get_classifications(&self, guid: &str) -> Result<Vec<Classification>> {
        Ok(self.get_entity(guid)?.classifications)
    }

    /// Entities matching `filter`, ordered by guid.
    ///
    /// Understood keys: `typeName` (with `includeSubTypes=true` to widen to
    /// subtypes) and `classification`. Other keys are ignored.
    pub fn search_entities(&self, filter: &SearchFilter) -> Result<Vec<Entity>> {
        let registry = self.types.registry();
        let include_subtypes = filter
            .param("includeSubTypes")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let mut found = BTreeMap::new();
        let type_names = filter.param_values("typeName");
        if type_names.is_empty() {
            for vertex in self.graph().vertices(VertexKind::Entity)? {
                let entity = decode(&vertex)?;
                found.insert(entity.guid.clone(), entity);
            }
        } else {
            for name in type_names {
                if registry.get_in(TypeCategory::Entity, name).is_none() {
                    return Err(Error::invalid(format!("unknown entity type '{}'", name)));
                }
                let mut names = vec![name.as_str()];
                if include_subtypes {
                    names.extend(
                        registry
                            .all_of(TypeCategory::Entity)
                            .into_iter()
                            .map(TypeDef::name)
                            .filter(|sub| *sub != name.as_str() && registry.is_subtype_of(sub, name)),
                    );
                }
                for type_name in names {
                    for guid in self.graph().lookup_all(VertexKind::Entity, type_name)? {
                        if let Some(entity) = self.load(&guid)? {
                            found.insert(guid, entity);
                        }
                    }
                }
            }
        }

        if let Some(classification) = filter.param("classification") {
            found.retain(|_, entity| {
                entity
                    .classifications
                    .iter()
                    .any(|c| registry.is_subtype_of(&c.type_name, classification))
            });
        }
        Ok(found.into_values().collect())
    }

    // ========== Creates ==========

    /// Create one entity.
    pub fn create_entity(&self, entity: Entity) -> Result<Entity> {
        self.create_batch(vec![entity])?
            .pop()
            .ok_or_else(|| Error::invalid("nothing to create"))
    }

    /// Create several entities, all or nothing.
    ///
    /// Entities in the batch may reference each other. The stored entities
    /// are returned in request order.
    #[instrument(skip(self, entities), fields(count = entities.len()))]
    pub fn create_entities(&self, entities: Vec<Entity>) -> Result<Vec<Entity>> {
        self.create_batch(entities)
    }

    fn create_batch(&self, entities: Vec<Entity>) -> Result<Vec<Entity>> {
        let result = self.try_create(entities);
        if let Err(e) = &result {
            warn!(error = %e, "rejected entity creation");
        }
        result
    }

    fn try_create(&self, entities: Vec<Entity>) -> Result<Vec<Entity>> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        let _gate = self.types.lock_writes();
        let registry = self.types.registry();

        let mut batch = HashMap::new();
        let mut prepared = Vec::with_capacity(entities.len());
        for mut entity in entities {
            if entity.guid.is_empty() {
                entity.guid = Uuid::new_v4().to_string();
            } else if batch.contains_key(&entity.guid) || self.graph().vertex(&entity.guid)?.is_some() {
                return Err(Error::invalid(format!("guid '{}' is already in use", entity.guid)));
            }
            entity.version = 1;
            entity.status = EntityStatus::Active;
            let entity = self.prepare(&registry, entity)?;
            batch.insert(entity.guid.clone(), entity.type_name.clone());
            prepared.push(entity);
        }

        let mut tx = Transaction::new(self.graph());
        for entity in &prepared {
            tx.expect_version(entity.guid.as_str(), 0);
            self.stage(&mut tx, &registry, entity, &batch)?;
        }
        tx.commit()?;

        info!(count = prepared.len(), "created entities");
        Ok(prepared)
    }

    // ========== Updates ==========

    /// Replace the attributes of an entity.
    ///
    /// The type name is immutable and classifications are kept. A non-zero
    /// `version` on `entity` must match the stored version.
    pub fn update_entity(&self, guid: &str, entity: Entity) -> Result<Entity> {
        require_guid(guid)?;
        self.update_batch(vec![(guid.to_string(), entity)])?
            .pop()
            .ok_or_else(|| Error::invalid("nothing to update"))
    }

    /// Update several entities (matched by their guids), all or nothing.
    ///
    /// The stored entities are returned in request order.
    #[instrument(skip(self, entities), fields(count = entities.len()))]
    pub fn update_entities(&self, entities: Vec<Entity>) -> Result<Vec<Entity>> {
        let mut requests = Vec::with_capacity(entities.len());
        for entity in entities {
            require_guid(&entity.guid)?;
            requests.push((entity.guid.clone(), entity));
        }
        self.update_batch(requests)
    }

    fn update_batch(&self, requests: Vec<(String, Entity)>) -> Result<Vec<Entity>> {
        let result = self.try_update(requests);
        if let Err(e) = &result {
            warn!(error = %e, "rejected entity update");
        }
        result
    }

    fn try_update(&self, requests: Vec<(String, Entity)>) -> Result<Vec<Entity>> {
        let _gate = self.types.lock_writes();
        let registry = self.types.registry();

        let mut staged = Vec::with_capacity(requests.len());
        for (guid, incoming) in requests {
            if staged.iter().any(|(g, _): &(String, Entity)| *g == guid) {
                return Err(Error::invalid(format!("entity '{}' appears more than once in the update", guid)));
            }
            let existing = self.get_entity(&guid)?;
            if !incoming.guid.is_empty() && incoming.guid != guid {
                return Err(Error::invalid(format!(
                    "entity guid '{}' does not match '{}'",
                    incoming.guid, guid
                )));
            }
            if !incoming.type_name.is_empty() && incoming.type_name != existing.type_name {
                return Err(Error::invalid(format!(
                    "cannot change type of entity '{}' from '{}' to '{}'",
                    guid, existing.type_name, incoming.type_name
                )));
            }
            if incoming.version > 0 && incoming.version != existing.version {
                return Err(Error::Conflict {
                    name: guid,
                    expected: incoming.version,
                    actual: existing.version,
                });
            }
            let merged = Entity {
                attributes: incoming.attributes,
                version: existing.version + 1,
                ..existing
            };
            staged.push((guid, self.prepare(&registry, merged)?));
        }

        self.commit_rewrites(&registry, staged)
    }

    // ========== Deletes ==========

    /// Delete one entity.
    ///
    /// Fails with `InUse` while another entity references it.
    pub fn delete_entity(&self, guid: &str) -> Result<EntityMutationResponse> {
        require_guid(guid)?;
        self.delete_entities(&[guid.to_string()])
    }

    /// Delete several entities, all or nothing.
    ///
    /// References between members of the batch do not block.
    #[instrument(skip(self, guids), fields(count = guids.len()))]
    pub fn delete_entities(&self, guids: &[String]) -> Result<EntityMutationResponse> {
        let result = self.try_delete(guids);
        if let Err(e) = &result {
            warn!(error = %e, "rejected entity deletion");
        }
        result
    }

    fn try_delete(&self, guids: &[String]) -> Result<EntityMutationResponse> {
        let _gate = self.types.lock_writes();

        let mut doomed: Vec<Entity> = Vec::with_capacity(guids.len());
        for guid in guids {
            if !doomed.iter().any(|e| e.guid == *guid) {
                doomed.push(self.get_entity(guid)?);
            }
        }
        let batch: HashSet<&str> = doomed.iter().map(|e| e.guid.as_str()).collect();

        for entity in &doomed {
            let dependents: Vec<String> = self
                .graph()
                .in_edges(&entity.guid, EdgeLabel::References)?
                .into_iter()
                .filter(|source| !batch.contains(source.as_str()))
                .map(|source| format!("entity {}", source))
                .collect();
            if !dependents.is_empty() {
                return Err(Error::InUse {
                    name: entity.guid.clone(),
                    dependents,
                });
            }
        }

        let mut tx = Transaction::new(self.graph());
        for entity in &doomed {
            tx.expect_version(entity.guid.as_str(), entity.version);
            tx.remove_vertex(&entity.guid)?;
        }
        tx.commit()?;

        info!(count = doomed.len(), "deleted entities");
        Ok(EntityMutationResponse {
            deleted: doomed.iter().map(Entity::object_id).collect(),
            ..Default::default()
        })
    }

    // ========== Classifications ==========

    /// Attach classifications that are not yet attached.
    pub fn add_classifications(&self, guid: &str, classifications: Vec<Classification>) -> Result<()> {
        self.modify_classifications(guid, |entity| {
            for classification in classifications {
                if entity.classification(&classification.type_name).is_some() {
                    return Err(Error::invalid(format!(
                        "classification '{}' is already attached to entity '{}'",
                        classification.type_name, entity.guid
                    )));
                }
                entity.classifications.push(classification);
            }
            Ok(())
        })
    }

    /// Replace the attributes of attached classifications.
    pub fn update_classifications(&self, guid: &str, classifications: Vec<Classification>) -> Result<()> {
        self.modify_classifications(guid, |entity| {
            for classification in classifications {
                let slot = entity
                    .classifications
                    .iter_mut()
                    .find(|c| c.type_name == classification.type_name)
                    .ok_or_else(|| {
                        Error::not_found(format!(
                            "classification '{}' on entity '{}'",
                            classification.type_name, guid
                        ))
                    })?;
                *slot = classification;
            }
            Ok(())
        })
    }

    /// Detach one classification.
    pub fn delete_classification(&self, guid: &str, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid("classification name must not be empty"));
        }
        self.modify_classifications(guid, |entity| {
            let before = entity.classifications.len();
            entity.classifications.retain(|c| c.type_name != name);
            if entity.classifications.len() == before {
                return Err(Error::not_found(format!(
                    "classification '{}' on entity '{}'",
                    name, guid
                )));
            }
            Ok(())
        })
    }

    /// Detach every classification.
    pub fn delete_classifications(&self, guid: &str) -> Result<()> {
        self.modify_classifications(guid, |entity| {
            entity.classifications.clear();
            Ok(())
        })
    }

    fn modify_classifications<F>(&self, guid: &str, change: F) -> Result<()>
    where
        F: FnOnce(&mut Entity) -> Result<()>,
    {
        require_guid(guid)?;
        let result = self.try_modify(guid, change);
        if let Err(e) = &result {
            warn!(error = %e, guid, "rejected classification change");
        }
        result
    }

    fn try_modify<F>(&self, guid: &str, change: F) -> Result<()>
    where
        F: FnOnce(&mut Entity) -> Result<()>,
    {
        let _gate = self.types.lock_writes();
        let registry = self.types.registry();

        let mut entity = self.get_entity(guid)?;
        change(&mut entity)?;
        entity.version += 1;
        let entity = self.prepare(&registry, entity)?;
        self.commit_rewrites(&registry, vec![(guid.to_string(), entity)])?;
        Ok(())
    }

    // ========== Shared write path ==========

    /// Write back entities whose stored version is one below their own.
    fn commit_rewrites(
        &self,
        registry: &TypeRegistry,
        staged: Vec<(String, Entity)>,
    ) -> Result<Vec<Entity>> {
        if staged.is_empty() {
            return Ok(Vec::new());
        }
        let batch: HashMap<String, String> = staged
            .iter()
            .map(|(guid, e)| (guid.clone(), e.type_name.clone()))
            .collect();

        let mut tx = Transaction::new(self.graph());
        for (guid, entity) in &staged {
            tx.expect_version(guid.as_str(), entity.version - 1);
            self.stage(&mut tx, registry, entity, &batch)?;
        }
        tx.commit()?;

        info!(count = staged.len(), "updated entities");
        Ok(staged.into_iter().map(|(_, e)| e).collect())
    }

    /// Validate an entity against its definition and fill in defaults.
    fn prepare(&self, registry: &TypeRegistry, mut entity: Entity) -> Result<Entity> {
        let validator = EntityValidator::new(registry, &self.converters);
        validator.apply_defaults(&mut entity)?;
        validator.validate(&entity)?;
        Ok(entity)
    }

    /// Queue the vertex and edges of a prepared entity.
    ///
    /// `batch` maps guids written by the same transaction to their types.
    fn stage(
        &self,
        tx: &mut Transaction<'_>,
        registry: &TypeRegistry,
        entity: &Entity,
        batch: &HashMap<String, String>,
    ) -> Result<()> {
        let mut references = Vec::new();
        for oid in entity.references() {
            let actual = match batch.get(&oid.guid) {
                Some(type_name) => type_name.clone(),
                None => match self.graph().vertex(&oid.guid)? {
                    Some(vertex) if vertex.kind == VertexKind::Entity => vertex.name,
                    _ => return Err(Error::not_found(format!("referenced entity '{}'", oid.guid))),
                },
            };
            if !registry.is_subtype_of(&actual, &oid.type_name) {
                return Err(Error::invalid(format!(
                    "entity '{}' is a {}, not a {}",
                    oid.guid, actual, oid.type_name
                )));
            }
            references.push(oid.guid);
        }

        let def_guid = registry
            .get(&entity.type_name)
            .map(|d| d.guid().to_string())
            .ok_or_else(|| Error::invalid(format!("unknown entity type '{}'", entity.type_name)))?;
        let classifications: Vec<String> = entity
            .classifications
            .iter()
            .filter_map(|c| registry.get(&c.type_name).map(|d| d.guid().to_string()))
            .collect();

        let payload = serde_json::to_vec(entity)?;
        tx.put_vertex(Vertex::new(
            entity.guid.as_str(),
            VertexKind::Entity,
            entity.type_name.as_str(),
            entity.version,
            payload,
        ));
        tx.replace_out_edges(&entity.guid, EdgeLabel::InstanceOf, [def_guid])?;
        tx.replace_out_edges(&entity.guid, EdgeLabel::ClassifiedAs, classifications)?;
        tx.replace_out_edges(&entity.guid, EdgeLabel::References, references)?;
        Ok(())
    }

    fn load(&self, guid: &str) -> Result<Option<Entity>> {
        match self.graph().vertex(guid)? {
            Some(vertex) if vertex.kind == VertexKind::Entity => Ok(Some(decode(&vertex)?)),
            _ => Ok(None),
        }
    }
}

pub(super) fn decode(vertex: &Vertex) -> Result<Entity> {
    serde_json::from_slice(&vertex.payload)
        .map_err(|e| Error::Deserialization(format!("entity '{}': {}", vertex.guid, e)))
}

fn require_guid(guid: &str) -> Result<()> {
    if guid.is_empty() {
        return Err(Error::invalid("guid must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeDef, ClassificationDef, EntityDef, EnumDef, TypesDef};
    use crate::storage::StorageConfig;
    use typegraph_proto::current::{ObjectId, Value};

    fn test_store() -> EntityStore {
        let types = TypeDefStore::open(StorageConfig::temporary()).unwrap();
        types
            .create_types_def(
                TypesDef::new()
                    .with_enum(EnumDef::new("Level", ["JUNIOR", "SENIOR"]))
                    .with_classification(ClassificationDef::new("PII"))
                    .with_classification(
                        ClassificationDef::new("Retention").with_attribute(AttributeDef::new("days", "int")),
                    )
                    .with_entity(
                        EntityDef::new("Person")
                            .with_attribute(AttributeDef::new("name", "string"))
                            .with_attribute(AttributeDef::optional("friend", "Person")),
                    )
                    .with_entity(
                        EntityDef::new("Employee")
                            .with_super_type("Person")
                            .with_attribute(AttributeDef::new("level", "Level").with_default("JUNIOR"))
                            .with_attribute(AttributeDef::optional("manager", "Employee")),
                    ),
            )
            .unwrap();
        EntityStore::new(Arc::new(types))
    }

    fn person(name: &str) -> Entity {
        Entity::new("Person").with_attribute("name", Value::String(name.into()))
    }

    #[test]
    fn test_create_and_get() {
        let store = test_store();
        let created = store.create_entity(person("Ada")).unwrap();

        assert!(!created.guid.is_empty());
        assert_eq!(created.version, 1);
        assert_eq!(store.get_entity(&created.guid).unwrap(), created);
    }

    #[test]
    fn test_default_applied_on_create() {
        let store = test_store();
        let created = store
            .create_entity(Entity::new("Employee").with_attribute("name", Value::String("Bo".into())))
            .unwrap();
        assert_eq!(created.attributes.get("level"), Some(&Value::String("JUNIOR".into())));
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let store = test_store();

        let missing = store.create_entity(Entity::new("Person")).unwrap_err();
        assert!(matches!(missing, Error::InvalidArgument(_)));

        let unknown = store
            .create_entity(person("Ada").with_attribute("age", Value::Int(3)))
            .unwrap_err();
        assert!(matches!(unknown, Error::InvalidArgument(_)));

        let not_entity = store.create_entity(Entity::new("PII")).unwrap_err();
        assert!(matches!(not_entity, Error::InvalidArgument(_)));

        let bad_enum = store
            .create_entity(
                Entity::new("Employee")
                    .with_attribute("name", Value::String("Cy".into()))
                    .with_attribute("level", Value::String("CEO".into())),
            )
            .unwrap_err();
        assert!(matches!(bad_enum, Error::Conversion { .. }));

        let dangling = store
            .create_entity(
                person("Ada").with_attribute("friend", Value::ObjectId(ObjectId::new("nope", "Person"))),
            )
            .unwrap_err();
        assert!(matches!(dangling, Error::NotFound(_)));

        assert!(store.search_entities(&SearchFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_batch_references_each_other() {
        let store = test_store();
        let a = person("Ada").with_guid("a");
        let b = person("Bo")
            .with_guid("b")
            .with_attribute("friend", Value::ObjectId(ObjectId::new("a", "Person")));

        let created = store.create_entities(vec![b, a]).unwrap();
        let guids: Vec<&str> = created.iter().map(|e| e.guid.as_str()).collect();
        assert_eq!(guids, vec!["b", "a"]);
        assert!(created.iter().all(|e| e.version == 1));

        let updated = store
            .update_entities(vec![
                person("Ada L").with_guid("a"),
                person("Bo B")
                    .with_guid("b")
                    .with_attribute("friend", Value::ObjectId(ObjectId::new("a", "Person"))),
            ])
            .unwrap();
        let names: Vec<_> = updated.iter().map(|e| e.attributes.get("name").cloned()).collect();
        assert_eq!(
            names,
            vec![Some(Value::String("Ada L".into())), Some(Value::String("Bo B".into()))]
        );
        assert!(updated.iter().all(|e| e.version == 2));

        let err = store.delete_entity("a").unwrap_err();
        assert!(matches!(err, Error::InUse { ref dependents, .. } if dependents == &["entity b"]));

        let deleted = store.delete_entities(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(deleted.deleted.len(), 2);
        assert!(matches!(store.get_entity("a"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_update_keeps_type_and_bumps_version() {
        let store = test_store();
        let created = store.create_entity(person("Ada")).unwrap();

        let updated = store
            .update_entity(&created.guid, Entity::new("").with_attribute("name", Value::String("Ada L".into())))
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.type_name, "Person");

        let renamed = store.update_entity(&created.guid, person("Ada King")).unwrap();
        assert_eq!(renamed.version, 3);

        let mut wrong = Entity::new("Employee");
        wrong.attributes = updated.attributes.clone();
        assert!(matches!(
            store.update_entity(&created.guid, wrong),
            Err(Error::InvalidArgument(_))
        ));

        let mut stale = person("Old");
        stale.version = 1;
        assert!(matches!(
            store.update_entity(&created.guid, stale),
            Err(Error::Conflict { expected: 1, actual: 3, .. })
        ));
    }

    #[test]
    fn test_classification_lifecycle() {
        let store = test_store();
        let guid = store.create_entity(person("Ada")).unwrap().guid;

        store
            .add_classifications(&guid, vec![Classification::new("PII")])
            .unwrap();
        assert!(matches!(
            store.add_classifications(&guid, vec![Classification::new("PII")]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            store.add_classifications(&guid, vec![Classification::new("Secret")]),
            Err(Error::NotFound(_))
        ));

        store
            .add_classifications(
                &guid,
                vec![Classification::new("Retention").with_attribute("days", Value::Int(30))],
            )
            .unwrap();
        store
            .update_classifications(
                &guid,
                vec![Classification::new("Retention").with_attribute("days", Value::Int(90))],
            )
            .unwrap();
        let retention = store.get_entity(&guid).unwrap();
        assert_eq!(
            retention.classification("Retention").unwrap().attributes.get("days"),
            Some(&Value::Int(90))
        );

        let tagged = store
            .search_entities(&SearchFilter::new().with_param("classification", "PII"))
            .unwrap();
        assert_eq!(tagged.len(), 1);

        store.delete_classification(&guid, "PII").unwrap();
        assert!(matches!(
            store.delete_classification(&guid, "PII"),
            Err(Error::NotFound(_))
        ));
        store.delete_classifications(&guid).unwrap();
        assert!(store.get_classifications(&guid).unwrap().is_empty());
    }

    #[test]
    fn test_classified_entity_blocks_classification_delete() {
        let store = test_store();
        let guid = store
            .create_entity(person("Ada").with_classification(Classification::new("PII")))
            .unwrap()
            .guid;

        let err = store.types().delete_classification_def_by_name("PII").unwrap_err();
        assert!(matches!(err, Error::InUse { .. }));

        store.delete_entity(&guid).unwrap();
        store.types().delete_classification_def_by_name("PII").unwrap();
    }

    #[test]
    fn test_search_by_type() {
        let store = test_store();
        store.create_entity(person("Ada")).unwrap();
        store
            .create_entity(Entity::new("Employee").with_attribute("name", Value::String("Bo".into())))
            .unwrap();

        let people = store
            .search_entities(&SearchFilter::new().with_param("typeName", "Person"))
            .unwrap();
        assert_eq!(people.len(), 1);

        let everyone = store
            .search_entities(
                &SearchFilter::new()
                    .with_param("typeName", "Person")
                    .with_param("includeSubTypes", "true"),
            )
            .unwrap();
        assert_eq!(everyone.len(), 2);

        assert!(matches!(
            store.search_entities(&SearchFilter::new().with_param("typeName", "Level")),
            Err(Error::InvalidArgument(_))
        ));
    }
}
