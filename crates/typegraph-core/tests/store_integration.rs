//! Integration tests for the type definition and entity stores.

use std::sync::Arc;

use typegraph_core::catalog::{
    AttributeDef, ClassificationDef, EntityDef, EnumDef, StructDef, TypeCategory, TypesDef,
};
use typegraph_core::convert::FormatConverters;
use typegraph_core::storage::StorageConfig;
use typegraph_core::store::{EntityStore, TypeDefStore};
use typegraph_core::{Error, ErrorKind};
use typegraph_proto::current::{Classification, Entity, ObjectId, Value};
use typegraph_proto::SearchFilter;

struct TestContext {
    store: Arc<TypeDefStore>,
    _dir: tempfile::TempDir,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = TypeDefStore::open(StorageConfig::new(dir.path())).unwrap();
        Self {
            store: Arc::new(store),
            _dir: dir,
        }
    }

    fn entities(&self) -> EntityStore {
        EntityStore::new(self.store.clone())
    }
}

fn employee_bundle() -> TypesDef {
    TypesDef::new()
        .with_enum(EnumDef::new("Status", ["ACTIVE", "INACTIVE"]))
        .with_struct(
            StructDef::new("Address")
                .with_attribute(AttributeDef::new("street", "string"))
                .with_attribute(AttributeDef::new("city", "string")),
        )
        .with_classification(ClassificationDef::new("PII"))
        .with_entity(
            EntityDef::new("Employee")
                .with_attribute(AttributeDef::new("name", "string"))
                .with_attribute(AttributeDef::new("status", "Status"))
                .with_attribute(AttributeDef::new("address", "Address")),
        )
}

#[test]
fn test_employee_scenario() {
    let ctx = TestContext::new();
    let created = ctx.store.create_types_def(employee_bundle()).unwrap();

    assert_eq!(created.len(), 4);
    assert!(created.enum_defs.iter().all(|d| !d.guid.is_empty()));
    assert!(created.struct_defs.iter().all(|d| !d.guid.is_empty()));
    assert!(created.classification_defs.iter().all(|d| !d.guid.is_empty()));
    assert!(created.entity_defs.iter().all(|d| !d.guid.is_empty()));

    let entities = ctx.store.get_all_entity_defs();
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].name, "Employee");

    let value = Value::Entity(Box::new(
        Entity::new("Employee")
            .with_guid("e-1")
            .with_attribute("name", Value::String("Ada".into()))
            .with_attribute("status", Value::String("ACTIVE".into()))
            .with_attribute(
                "address",
                Value::Struct(
                    typegraph_proto::current::Struct::new("Address")
                        .with_attribute("street", Value::String("1 Main St".into()))
                        .with_attribute("city", Value::String("Springfield".into())),
                ),
            )
            .with_classification(Classification::new("PII")),
    ));

    let registry = ctx.store.registry();
    let converters = FormatConverters::with_defaults();
    let legacy = converters.to_legacy(&registry, &value, "Employee").unwrap();
    let back = converters.to_current(&registry, &legacy, "Employee").unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_cycle_rejected_and_state_unchanged() {
    let ctx = TestContext::new();
    ctx.store.create_types_def(employee_bundle()).unwrap();
    ctx.store
        .create_types_def(
            TypesDef::new()
                .with_entity(EntityDef::new("Manager").with_super_type("Employee"))
                .with_entity(EntityDef::new("Contractor").with_super_type("Manager")),
        )
        .unwrap();

    let before = ctx.store.get_entity_def_by_name("Employee").unwrap();
    let mut cyclic = before.clone();
    cyclic.super_types = vec!["Contractor".into()];

    let err = ctx.store.update_entity_def_by_name("Employee", cyclic).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSuperType);
    let message = err.to_string();
    assert!(message.contains("Employee"));
    assert!(message.contains("Manager"));
    assert!(message.contains("Contractor"));

    assert_eq!(ctx.store.get_entity_def_by_name("Employee").unwrap(), before);
    assert!(ctx.store.registry().supertypes_closure("Employee").is_empty());
}

#[test]
fn test_batch_is_all_or_nothing() {
    let ctx = TestContext::new();
    let bundle = TypesDef::new()
        .with_struct(StructDef::new("Address"))
        .with_entity(EntityDef::new("Employee").with_attribute(AttributeDef::new("badge", "Badge")));

    let err = ctx.store.create_types_def(bundle).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(ctx.store.registry().is_empty());
    assert!(matches!(
        ctx.store.get_struct_def_by_name("Address"),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_bad_classification_supertype_rolls_back_whole_bundle() {
    let ctx = TestContext::new();
    ctx.store.create_enum_def(EnumDef::new("Region", ["EU", "US"])).unwrap();
    let before = ctx.store.get_all_enum_defs();

    let bundle = TypesDef::new()
        .with_enum(EnumDef::new("Status", ["ACTIVE", "INACTIVE"]))
        .with_struct(StructDef::new("Address").with_attribute(AttributeDef::new("city", "string")))
        .with_classification(ClassificationDef::new("Sensitive").with_super_type("Nope"));

    let err = ctx.store.create_types_def(bundle).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSuperType);
    assert!(err.to_string().contains("Nope"));

    assert_eq!(ctx.store.get_all_enum_defs(), before);
    assert!(ctx.store.get_all_struct_defs().is_empty());
    assert!(ctx.store.get_all_classification_defs().is_empty());
}

#[test]
fn test_classification_cycle_rejected_on_update() {
    let ctx = TestContext::new();
    ctx.store
        .create_types_def(
            TypesDef::new()
                .with_classification(ClassificationDef::new("A"))
                .with_classification(ClassificationDef::new("B").with_super_type("A")),
        )
        .unwrap();

    let before = ctx.store.get_classification_def_by_name("A").unwrap();
    let mut cyclic = before.clone();
    cyclic.super_types = vec!["B".into()];

    let err = ctx.store.update_classification_def_by_name("A", cyclic).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSuperType);

    assert_eq!(ctx.store.get_classification_def_by_name("A").unwrap(), before);
    assert!(ctx.store.registry().supertypes_closure("A").is_empty());
    assert!(ctx.store.registry().is_subtype_of("B", "A"));
}

#[test]
fn test_bundle_members_reference_each_other() {
    let ctx = TestContext::new();
    let bundle = TypesDef::new()
        .with_entity(EntityDef::new("Manager").with_super_type("Employee"))
        .with_entity(
            EntityDef::new("Employee").with_attribute(AttributeDef::optional("reports", "array<Manager>")),
        );

    ctx.store.create_types_def(bundle).unwrap();
    assert!(ctx.store.registry().is_subtype_of("Manager", "Employee"));
}

#[test]
fn test_name_is_immutable() {
    let ctx = TestContext::new();
    let created = ctx.store.create_types_def(employee_bundle()).unwrap();
    let guid = created.struct_defs[0].guid.clone();

    let err = ctx
        .store
        .update_struct_def_by_guid(&guid, StructDef::new("Location"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(ctx.store.get_struct_def_by_guid(&guid).unwrap().name, "Address");
}

#[test]
fn test_update_round_trips_by_name_and_guid() {
    let ctx = TestContext::new();
    ctx.store.create_types_def(employee_bundle()).unwrap();

    let by_name = ctx
        .store
        .update_enum_def_by_name("Status", EnumDef::new("Status", ["ACTIVE", "INACTIVE", "RETIRED"]))
        .unwrap();
    assert_eq!(by_name.version, 2);
    assert_eq!(ctx.store.get_enum_def_by_name("Status").unwrap(), by_name);

    let by_guid = ctx
        .store
        .update_enum_def_by_guid(&by_name.guid, EnumDef::new("Status", ["ACTIVE"]))
        .unwrap();
    assert_eq!(by_guid.version, 3);
    assert_eq!(ctx.store.get_enum_def_by_guid(&by_name.guid).unwrap().element_defs.len(), 1);
}

#[test]
fn test_referential_guard() {
    let ctx = TestContext::new();
    ctx.store.create_types_def(employee_bundle()).unwrap();
    ctx.store
        .create_entity_def(EntityDef::new("Manager").with_super_type("Employee"))
        .unwrap();

    let err = ctx.store.delete_entity_def_by_name("Employee").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InUse);
    assert!(err.to_string().contains("Manager"));

    // Deleting both together is allowed.
    ctx.store
        .delete_types_def(
            TypesDef::new()
                .with_entity(EntityDef::new("Employee"))
                .with_entity(EntityDef::new("Manager")),
        )
        .unwrap();
    assert!(ctx.store.get_all_entity_defs().is_empty());
    assert_eq!(ctx.store.get_all_enum_defs().len(), 1);
}

#[test]
fn test_invalid_gets() {
    let ctx = TestContext::new();
    ctx.store.create_types_def(employee_bundle()).unwrap();

    assert_eq!(
        ctx.store.get_enum_def_by_name("").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        ctx.store.get_entity_def_by_guid("").unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        ctx.store.get_entity_def_by_name("Ghost").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        ctx.store.get_classification_def_by_name("Employee").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn test_optimistic_conflict() {
    let ctx = TestContext::new();
    ctx.store.create_types_def(employee_bundle()).unwrap();

    let first = ctx.store.get_struct_def_by_name("Address").unwrap();
    let second = first.clone();

    ctx.store
        .update_struct_def_by_name("Address", first.with_description("home"))
        .unwrap();
    let err = ctx
        .store
        .update_struct_def_by_name("Address", second.with_description("work"))
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { expected: 1, actual: 2, .. }));
    assert_eq!(
        ctx.store.get_struct_def_by_name("Address").unwrap().description.as_deref(),
        Some("home")
    );
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig::new(dir.path());

    let guid = {
        let store = Arc::new(TypeDefStore::open(config.clone()).unwrap());
        store.create_types_def(employee_bundle()).unwrap();
        let entities = EntityStore::new(store.clone());
        let guid = entities
            .create_entity(
                Entity::new("Employee")
                    .with_attribute("name", Value::String("Ada".into()))
                    .with_attribute("status", Value::String("ACTIVE".into()))
                    .with_attribute(
                        "address",
                        Value::Struct(typegraph_proto::current::Struct::new("Address")),
                    ),
            )
            .unwrap()
            .guid;
        store.flush().unwrap();
        guid
    };

    let store = Arc::new(TypeDefStore::open(config).unwrap());
    assert_eq!(store.registry().len(), 4);
    let category_counts: Vec<usize> = TypeCategory::ALL
        .iter()
        .map(|c| store.registry().all_of(*c).len())
        .collect();
    assert_eq!(category_counts, vec![1, 1, 1, 1]);

    let entity = EntityStore::new(store).get_entity(&guid).unwrap();
    assert_eq!(entity.attributes.get("name"), Some(&Value::String("Ada".into())));
}

#[test]
fn test_entity_defaults_and_references() {
    let ctx = TestContext::new();
    ctx.store
        .create_types_def(
            TypesDef::new()
                .with_enum(EnumDef::new("Status", ["ACTIVE", "INACTIVE"]))
                .with_entity(
                    EntityDef::new("Department").with_attribute(AttributeDef::new("name", "string")),
                )
                .with_entity(
                    EntityDef::new("Employee")
                        .with_attribute(AttributeDef::new("name", "string"))
                        .with_attribute(AttributeDef::new("status", "Status").with_default("ACTIVE"))
                        .with_attribute(AttributeDef::optional("department", "Department")),
                ),
        )
        .unwrap();
    let entities = ctx.entities();

    let dept = entities
        .create_entity(Entity::new("Department").with_attribute("name", Value::String("R&D".into())))
        .unwrap();
    let employee = entities
        .create_entity(
            Entity::new("Employee")
                .with_attribute("name", Value::String("Ada".into()))
                .with_attribute("department", Value::ObjectId(dept.object_id())),
        )
        .unwrap();
    assert_eq!(employee.attributes.get("status"), Some(&Value::String("ACTIVE".into())));

    // A reference must point at an entity of a compatible type.
    let err = entities
        .create_entity(
            Entity::new("Employee")
                .with_attribute("name", Value::String("Bo".into()))
                .with_attribute(
                    "department",
                    Value::ObjectId(ObjectId::new(employee.guid.clone(), "Department")),
                ),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    assert_eq!(entities.delete_entity(&dept.guid).unwrap_err().kind(), ErrorKind::InUse);
    assert_eq!(
        ctx.store.delete_entity_def_by_name("Department").unwrap_err().kind(),
        ErrorKind::InUse
    );

    let both = entities
        .get_entities(&[employee.guid.clone(), dept.guid.clone()])
        .unwrap();
    assert_eq!(both[0].type_name, "Employee");
    assert_eq!(both[1].type_name, "Department");

    let departments = entities
        .search_entities(&SearchFilter::new().with_param("typeName", "Department"))
        .unwrap();
    assert_eq!(departments, vec![dept]);
}

fn levels_bundle(default: Option<&str>) -> TypesDef {
    let level = match default {
        Some(literal) => AttributeDef::new("level", "Level").with_default(literal),
        None => AttributeDef::new("level", "Level"),
    };
    TypesDef::new()
        .with_enum(EnumDef::new("Level", ["JUNIOR", "SENIOR"]))
        .with_entity(
            EntityDef::new("Employee")
                .with_attribute(AttributeDef::new("name", "string"))
                .with_attribute(level),
        )
}

#[test]
fn test_literal_used_as_default_cannot_be_removed() {
    let ctx = TestContext::new();
    ctx.store.create_types_def(levels_bundle(Some("JUNIOR"))).unwrap();

    let err = ctx
        .store
        .update_enum_def_by_name("Level", EnumDef::new("Level", ["SENIOR"]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InUse);
    assert!(err.to_string().contains("Employee"));
    assert_eq!(ctx.store.get_enum_def_by_name("Level").unwrap().version, 1);

    let entities = ctx.entities();
    let created = entities
        .create_entity(Entity::new("Employee").with_attribute("name", Value::String("Ada".into())))
        .unwrap();
    assert_eq!(created.attributes.get("level"), Some(&Value::String("JUNIOR".into())));

    let widened = ctx
        .store
        .update_enum_def_by_name("Level", EnumDef::new("Level", ["JUNIOR", "SENIOR", "LEAD"]))
        .unwrap();
    assert_eq!(widened.version, 2);
}

#[test]
fn test_literal_held_by_entity_cannot_be_removed() {
    let ctx = TestContext::new();
    ctx.store.create_types_def(levels_bundle(None)).unwrap();
    let entities = ctx.entities();
    let ada = entities
        .create_entity(
            Entity::new("Employee")
                .with_attribute("name", Value::String("Ada".into()))
                .with_attribute("level", Value::String("JUNIOR".into())),
        )
        .unwrap();

    let err = ctx
        .store
        .update_enum_def_by_name("Level", EnumDef::new("Level", ["SENIOR"]))
        .unwrap_err();
    match &err {
        Error::InUse { name, dependents } => {
            assert_eq!(name, "Level");
            assert!(dependents[0].contains(&ada.guid));
        }
        other => panic!("unexpected {:?}", other),
    }

    let stored = entities.get_entity(&ada.guid).unwrap();
    let converters = FormatConverters::with_defaults();
    assert!(converters
        .to_legacy(&ctx.store.registry(), &Value::Entity(Box::new(stored)), "Employee")
        .is_ok());
    entities.delete_classifications(&ada.guid).unwrap();

    entities.delete_entity(&ada.guid).unwrap();
    ctx.store
        .update_enum_def_by_name("Level", EnumDef::new("Level", ["SENIOR"]))
        .unwrap();
}

#[test]
fn test_new_required_attribute_needs_default_while_instances_exist() {
    let ctx = TestContext::new();
    ctx.store.create_types_def(levels_bundle(Some("JUNIOR"))).unwrap();
    let entities = ctx.entities();
    let ada = entities
        .create_entity(Entity::new("Employee").with_attribute("name", Value::String("Ada".into())))
        .unwrap();

    let current = ctx.store.get_entity_def_by_name("Employee").unwrap();
    let without_default = current
        .clone()
        .with_attribute(AttributeDef::new("badge", "string"));
    let err = ctx
        .store
        .update_entity_def_by_name("Employee", without_default)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InUse);

    let with_default = current.with_attribute(AttributeDef::new("badge", "string").with_default("none"));
    ctx.store.update_entity_def_by_name("Employee", with_default).unwrap();

    let updated = entities
        .update_entity(&ada.guid, Entity::new("").with_attribute("name", Value::String("Ada L".into())))
        .unwrap();
    assert_eq!(updated.attributes.get("badge"), Some(&Value::String("none".into())));
}
