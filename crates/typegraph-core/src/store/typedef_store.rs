//! Persistent store for type definitions.

use std::collections::{BTreeMap, HashSet};
use std::iter;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, instrument, warn};
use typegraph_proto::SearchFilter;
use uuid::Uuid;

use crate::catalog::{
    CategoryDef, ClassificationDef, EntityDef, EnumDef, StructDef, TypeCategory, TypeDef,
    TypeRegistry, TypesDef,
};
use super::entity_store::decode;
use crate::convert::FormatConverters;
use crate::error::{Error, Result};
use crate::storage::key::current_timestamp;
use crate::storage::{
    EdgeLabel, GraphAdapter, SledGraph, StorageConfig, Transaction, Vertex, VertexKind,
};
use crate::validation::{
    validate_type_name, AttributeValidator, EntityValidator, SupertypeChange, SupertypeValidator,
};

/// Labels whose in-edges make one definition depend on another's shape.
const SHAPE_LABELS: [EdgeLabel; 2] = [EdgeLabel::SuperType, EdgeLabel::AttributeType];

/// Labels whose in-edges keep a definition alive.
const DEPENDENT_LABELS: [EdgeLabel; 4] = [
    EdgeLabel::SuperType,
    EdgeLabel::AttributeType,
    EdgeLabel::InstanceOf,
    EdgeLabel::ClassifiedAs,
];

/// The type definition store.
///
/// Definitions live as graph vertices with `super_type` and
/// `attribute_type` edges. Reads are served from an immutable
/// [`TypeRegistry`] snapshot; writes are serialized, validated against the
/// snapshot, committed in one graph transaction and only then published.
///
/// An update is refused while it would leave a dependent definition or a
/// stored entity invalid.
pub struct TypeDefStore {
    graph: Arc<dyn GraphAdapter>,
    registry: RwLock<Arc<TypeRegistry>>,
    converters: FormatConverters,
    write_gate: Mutex<()>,
}

impl TypeDefStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let graph = SledGraph::open(config)?;
        Self::with_graph(Arc::new(graph))
    }

    /// Open a store over an existing graph, loading every stored definition.
    pub fn with_graph(graph: Arc<dyn GraphAdapter>) -> Result<Self> {
        let mut defs = Vec::new();
        for category in TypeCategory::ALL {
            for vertex in graph.vertices(VertexKind::TypeDef(category))? {
                defs.push(TypeDef::from_bytes(&vertex.payload)?);
            }
        }
        let registry = TypeRegistry::from_defs(defs);
        info!(types = registry.len(), "loaded type registry");

        Ok(Self {
            graph,
            registry: RwLock::new(Arc::new(registry)),
            converters: FormatConverters::with_defaults(),
            write_gate: Mutex::new(()),
        })
    }

    /// The current committed registry snapshot.
    pub fn registry(&self) -> Arc<TypeRegistry> {
        self.registry.read().clone()
    }

    /// The underlying graph.
    pub fn graph(&self) -> &dyn GraphAdapter {
        self.graph.as_ref()
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.graph.flush()
    }

    pub(crate) fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock()
    }

    fn publish(&self, registry: TypeRegistry) {
        *self.registry.write() = Arc::new(registry);
    }

    // ========== Generic per-category operations ==========

    fn get_all<D: CategoryDef>(&self) -> Vec<D> {
        self.registry()
            .all_of(D::CATEGORY)
            .into_iter()
            .filter_map(|def| D::from_type_def(def.clone()))
            .collect()
    }

    fn get_by_name<D: CategoryDef>(&self, name: &str) -> Result<D> {
        if name.is_empty() {
            return Err(Error::invalid("type name must not be empty"));
        }
        self.registry()
            .get_in(D::CATEGORY, name)
            .and_then(|def| D::from_type_def(def.clone()))
            .ok_or_else(|| Error::not_found(format!("{} type '{}'", D::CATEGORY, name)))
    }

    fn get_by_guid<D: CategoryDef>(&self, guid: &str) -> Result<D> {
        if guid.is_empty() {
            return Err(Error::invalid("guid must not be empty"));
        }
        self.registry()
            .get_by_guid(guid)
            .filter(|def| def.category() == D::CATEGORY)
            .and_then(|def| D::from_type_def(def.clone()))
            .ok_or_else(|| Error::not_found(format!("{} type with guid '{}'", D::CATEGORY, guid)))
    }

    fn create<D: CategoryDef>(&self, def: D) -> Result<D> {
        let created = self.create_defs(vec![def.into_type_def()])?;
        single(created)
    }

    fn update_by_name<D: CategoryDef>(&self, name: &str, def: D) -> Result<D> {
        if name.is_empty() {
            return Err(Error::invalid("type name must not be empty"));
        }
        let updated = self.update_defs(vec![(Target::Name(name.to_string()), def.into_type_def())])?;
        single(updated)
    }

    fn update_by_guid<D: CategoryDef>(&self, guid: &str, def: D) -> Result<D> {
        if guid.is_empty() {
            return Err(Error::invalid("guid must not be empty"));
        }
        let updated = self.update_defs(vec![(Target::Guid(guid.to_string()), def.into_type_def())])?;
        single(updated)
    }

    fn delete_by_name<D: CategoryDef>(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid("type name must not be empty"));
        }
        self.delete_defs(vec![(D::CATEGORY, Target::Name(name.to_string()))])
    }

    fn delete_by_guid<D: CategoryDef>(&self, guid: &str) -> Result<()> {
        if guid.is_empty() {
            return Err(Error::invalid("guid must not be empty"));
        }
        self.delete_defs(vec![(D::CATEGORY, Target::Guid(guid.to_string()))])
    }

    // ========== Bulk operations ==========

    /// Create every definition in the bundle, all or nothing.
    ///
    /// Members may reference each other as supertypes and attribute types.
    #[instrument(skip(self, types), fields(count = types.len()))]
    pub fn create_types_def(&self, types: TypesDef) -> Result<TypesDef> {
        let created = self.create_defs(types.into_defs())?;
        Ok(created.into_iter().collect())
    }

    /// Update every definition in the bundle (matched by name), all or nothing.
    #[instrument(skip(self, types), fields(count = types.len()))]
    pub fn update_types_def(&self, types: TypesDef) -> Result<TypesDef> {
        let mut requests = Vec::with_capacity(types.len());
        for def in types.into_defs() {
            if def.name().is_empty() {
                return Err(Error::invalid("bulk update requires every definition to be named"));
            }
            requests.push((Target::Name(def.name().to_string()), def));
        }
        let updated = self.update_defs(requests)?;
        Ok(updated.into_iter().collect())
    }

    /// Delete every definition in the bundle (matched by name), all or nothing.
    ///
    /// Dependents that are themselves part of the bundle do not block.
    #[instrument(skip(self, types), fields(count = types.len()))]
    pub fn delete_types_def(&self, types: TypesDef) -> Result<()> {
        let targets = types
            .into_defs()
            .into_iter()
            .map(|def| (def.category(), Target::Name(def.name().to_string())))
            .collect();
        self.delete_defs(targets)
    }

    /// Definitions matching `filter`.
    ///
    /// Understood keys: `type`, `name`, `nameContains`, `supertype` and
    /// `notsupertype`. Other keys are ignored.
    pub fn search_types_def(&self, filter: &SearchFilter) -> Result<TypesDef> {
        let mut categories = Vec::new();
        for label in filter.param_values("type") {
            let category = TypeCategory::parse(label)
                .ok_or_else(|| Error::invalid(format!("unknown type category '{}'", label)))?;
            categories.push(category);
        }
        let name = filter.param("name");
        let name_contains = filter.param("nameContains");
        let supertype = filter.param("supertype");
        let not_supertype = filter.param("notsupertype");

        let registry = self.registry();
        let found = registry
            .iter()
            .filter(|def| categories.is_empty() || categories.contains(&def.category()))
            .filter(|def| name.map_or(true, |n| def.name() == n))
            .filter(|def| name_contains.map_or(true, |n| def.name().contains(n)))
            .filter(|def| {
                supertype.map_or(true, |s| registry.supertypes_closure(def.name()).contains(&s))
            })
            .filter(|def| {
                not_supertype.map_or(true, |s| !registry.supertypes_closure(def.name()).contains(&s))
            })
            .cloned()
            .collect();
        Ok(found)
    }

    // ========== Write paths ==========

    fn create_defs(&self, defs: Vec<TypeDef>) -> Result<Vec<TypeDef>> {
        let result = self.try_create(defs);
        if let Err(e) = &result {
            warn!(error = %e, "rejected type creation");
        }
        result
    }

    fn try_create(&self, defs: Vec<TypeDef>) -> Result<Vec<TypeDef>> {
        if defs.is_empty() {
            return Ok(Vec::new());
        }
        let _gate = self.lock_writes();
        let committed = self.registry();

        let mut seen = HashSet::new();
        for def in &defs {
            validate_type_name(def.name())?;
            if let Some(existing) = committed.get(def.name()) {
                return Err(Error::DuplicateName {
                    category: existing.category(),
                    name: def.name().to_string(),
                });
            }
            if !seen.insert(def.name()) {
                return Err(Error::DuplicateName {
                    category: def.category(),
                    name: def.name().to_string(),
                });
            }
        }

        let now = current_timestamp();
        let stamped: Vec<TypeDef> = defs
            .into_iter()
            .map(|mut def| {
                def.set_identity(Uuid::new_v4().to_string(), 1, now, now);
                def
            })
            .collect();

        let staged = committed.with_changes(stamped.iter().cloned(), iter::empty());
        let mut tx = Transaction::new(self.graph.as_ref());
        for def in &stamped {
            tx.expect_version(def.guid(), 0);
        }
        self.stage_writes(&mut tx, &staged, &stamped)?;
        tx.commit()?;
        self.publish(staged);

        info!(count = stamped.len(), "created type definitions");
        Ok(stamped)
    }

    fn update_defs(&self, requests: Vec<(Target, TypeDef)>) -> Result<Vec<TypeDef>> {
        let result = self.try_update(requests);
        if let Err(e) = &result {
            warn!(error = %e, "rejected type update");
        }
        result
    }

    fn try_update(&self, requests: Vec<(Target, TypeDef)>) -> Result<Vec<TypeDef>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let _gate = self.lock_writes();
        let committed = self.registry();
        let now = current_timestamp();

        let mut seen = HashSet::new();
        let mut merged = Vec::with_capacity(requests.len());
        for (target, incoming) in requests {
            let existing = target.resolve(&committed, incoming.category())?;
            if !seen.insert(existing.name().to_string()) {
                return Err(Error::invalid(format!(
                    "'{}' appears more than once in the update",
                    existing.name()
                )));
            }
            merged.push(merge_update(existing, incoming, now)?);
        }

        let staged = committed.with_changes(merged.iter().cloned(), iter::empty());
        let mut tx = Transaction::new(self.graph.as_ref());
        for def in &merged {
            tx.expect_version(def.guid(), def.version() - 1);
        }
        self.stage_writes(&mut tx, &staged, &merged)?;
        self.check_dependents(&staged, &merged)?;
        tx.commit()?;
        self.publish(staged);

        info!(count = merged.len(), "updated type definitions");
        Ok(merged)
    }

    fn delete_defs(&self, targets: Vec<(TypeCategory, Target)>) -> Result<()> {
        let result = self.try_delete(targets);
        if let Err(e) = &result {
            warn!(error = %e, "rejected type deletion");
        }
        result
    }

    fn try_delete(&self, targets: Vec<(TypeCategory, Target)>) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }
        let _gate = self.lock_writes();
        let committed = self.registry();

        let mut doomed: Vec<&TypeDef> = Vec::with_capacity(targets.len());
        for (category, target) in &targets {
            let def = target.resolve(&committed, *category)?;
            if !doomed.iter().any(|d| d.guid() == def.guid()) {
                doomed.push(def);
            }
        }
        let batch: HashSet<&str> = doomed.iter().map(|d| d.guid()).collect();

        for def in &doomed {
            let dependents = self.dependents(def.guid(), &batch)?;
            if !dependents.is_empty() {
                return Err(Error::InUse {
                    name: def.name().to_string(),
                    dependents,
                });
            }
        }

        let mut tx = Transaction::new(self.graph.as_ref());
        for def in &doomed {
            tx.expect_version(def.guid(), def.version());
            tx.remove_vertex(def.guid())?;
        }
        tx.commit()?;

        let names: Vec<&str> = doomed.iter().map(|d| d.name()).collect();
        let staged = committed.with_changes(iter::empty(), names.iter().copied());
        self.publish(staged);

        info!(count = names.len(), "deleted type definitions");
        Ok(())
    }

    /// Validate `defs` against `staged` and queue their vertices and edges.
    fn stage_writes(
        &self,
        tx: &mut Transaction<'_>,
        staged: &TypeRegistry,
        defs: &[TypeDef],
    ) -> Result<()> {
        let changes: Vec<SupertypeChange> = defs.iter().map(SupertypeChange::of).collect();
        SupertypeValidator::validate(staged, &changes)?;

        let validator = AttributeValidator::new(staged);
        let mut edges: BTreeMap<&str, (Vec<String>, Vec<String>)> = BTreeMap::new();
        for def in defs {
            let referenced = validator.validate(def)?;
            let supers = def
                .super_types()
                .iter()
                .filter_map(|name| staged.get(name).map(|d| d.guid().to_string()))
                .collect();
            let attribute_types = referenced
                .into_iter()
                .filter_map(|name| staged.get(name).map(|d| d.guid().to_string()))
                .collect();
            edges.insert(def.guid(), (supers, attribute_types));
        }

        for def in defs {
            let vertex = Vertex::new(
                def.guid(),
                VertexKind::TypeDef(def.category()),
                def.name(),
                def.version(),
                def.to_bytes()?,
            );
            tx.put_vertex(vertex);
            if let Some((supers, attribute_types)) = edges.remove(def.guid()) {
                tx.replace_out_edges(def.guid(), EdgeLabel::SuperType, supers)?;
                tx.replace_out_edges(def.guid(), EdgeLabel::AttributeType, attribute_types)?;
            }
        }
        debug!(ops = tx.operation_count(), "staged type definition writes");
        Ok(())
    }

    /// Re-validate what depends on `updated` against `staged`.
    ///
    /// Definitions reaching an updated one through `super_type` or
    /// `attribute_type` edges must still validate, and every entity that is
    /// an instance of, or classified by, an affected definition must still
    /// conform once defaults are applied.
    fn check_dependents(&self, staged: &TypeRegistry, updated: &[TypeDef]) -> Result<()> {
        let changed: HashSet<&str> = updated.iter().map(|d| d.guid()).collect();
        let names = updated.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ");
        let blocked = |dependent: String| Error::InUse {
            name: names.clone(),
            dependents: vec![dependent],
        };

        let definitions = AttributeValidator::new(staged);
        let entities = EntityValidator::new(staged, &self.converters);
        let mut checked = HashSet::new();
        for guid in self.affected(updated)? {
            let Some(def) = staged.get_by_guid(&guid) else { continue };
            if !changed.contains(guid.as_str()) {
                definitions
                    .validate(def)
                    .map_err(|e| blocked(format!("definition {}: {}", def.name(), e)))?;
            }

            let label = match def.category() {
                TypeCategory::Entity => EdgeLabel::InstanceOf,
                TypeCategory::Classification => EdgeLabel::ClassifiedAs,
                _ => continue,
            };
            for source in self.graph.in_edges(&guid, label)? {
                if !checked.insert(source.clone()) {
                    continue;
                }
                let Some(vertex) = self.graph.vertex(&source)? else { continue };
                let mut entity = decode(&vertex)?;
                entities
                    .apply_defaults(&mut entity)
                    .and_then(|_| entities.validate(&entity))
                    .map_err(|e| blocked(format!("entity {}: {}", source, e)))?;
            }
        }
        Ok(())
    }

    /// Guids of `updated` and of every definition depending on them,
    /// transitively through `super_type` and `attribute_type` edges.
    fn affected(&self, updated: &[TypeDef]) -> Result<Vec<String>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut order = Vec::new();
        let mut frontier: Vec<String> = updated.iter().map(|d| d.guid().to_string()).collect();
        while let Some(guid) = frontier.pop() {
            if !seen.insert(guid.clone()) {
                continue;
            }
            for label in SHAPE_LABELS {
                frontier.extend(self.graph.in_edges(&guid, label)?);
            }
            order.push(guid);
        }
        Ok(order)
    }

    /// Describe the live dependents of `guid`, ignoring those in `batch`.
    fn dependents(&self, guid: &str, batch: &HashSet<&str>) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for label in DEPENDENT_LABELS {
            for source in self.graph.in_edges(guid, label)? {
                if batch.contains(source.as_str()) {
                    continue;
                }
                let name = self
                    .graph
                    .vertex(&source)?
                    .map(|v| v.name)
                    .unwrap_or_else(|| source.clone());
                out.push(match label {
                    EdgeLabel::SuperType => format!("subtype {}", name),
                    EdgeLabel::AttributeType => format!("attribute of {}", name),
                    EdgeLabel::InstanceOf => format!("entity {}", source),
                    _ => format!("entity {} classified by it", source),
                });
            }
        }
        Ok(out)
    }
}

/// How a request names its target definition.
enum Target {
    Name(String),
    Guid(String),
}

impl Target {
    /// Find the committed definition of `category`.
    ///
    /// A name or guid that belongs to another category is not found.
    fn resolve<'r>(&self, registry: &'r TypeRegistry, category: TypeCategory) -> Result<&'r TypeDef> {
        let found = match self {
            Target::Name(name) => registry.get(name),
            Target::Guid(guid) => registry.get_by_guid(guid),
        };
        found.filter(|def| def.category() == category).ok_or_else(|| match self {
            Target::Name(name) => Error::not_found(format!("{} type '{}'", category, name)),
            Target::Guid(guid) => {
                Error::not_found(format!("{} type with guid '{}'", category, guid))
            }
        })
    }
}

/// Apply `incoming` onto `existing`, keeping identity and bumping the version.
fn merge_update(existing: &TypeDef, mut incoming: TypeDef, now: u64) -> Result<TypeDef> {
    if !incoming.name().is_empty() && incoming.name() != existing.name() {
        return Err(Error::invalid(format!(
            "cannot rename '{}' to '{}': type names are immutable",
            existing.name(),
            incoming.name()
        )));
    }
    if incoming.version() > 0 && incoming.version() != existing.version() {
        return Err(Error::Conflict {
            name: existing.name().to_string(),
            expected: incoming.version(),
            actual: existing.version(),
        });
    }
    incoming.set_name(existing.name().to_string());
    incoming.set_identity(
        existing.guid().to_string(),
        existing.version() + 1,
        existing.create_time(),
        now,
    );
    Ok(incoming)
}

fn single<D: CategoryDef>(defs: Vec<TypeDef>) -> Result<D> {
    defs.into_iter()
        .next()
        .and_then(D::from_type_def)
        .ok_or_else(|| Error::Deserialization(format!("expected one {} definition", D::CATEGORY)))
}

macro_rules! category_operations {
    (
        $def:ty,
        $label:literal,
        $get_all:ident,
        $get_by_name:ident,
        $get_by_guid:ident,
        $create:ident,
        $update_by_name:ident,
        $update_by_guid:ident,
        $delete_by_name:ident,
        $delete_by_guid:ident
    ) => {
        impl TypeDefStore {
            #[doc = concat!("All ", $label, " definitions, in name order.")]
            pub fn $get_all(&self) -> Vec<$def> {
                self.get_all::<$def>()
            }

            #[doc = concat!("Get a ", $label, " definition by name.")]
            pub fn $get_by_name(&self, name: &str) -> Result<$def> {
                self.get_by_name::<$def>(name)
            }

            #[doc = concat!("Get a ", $label, " definition by guid.")]
            pub fn $get_by_guid(&self, guid: &str) -> Result<$def> {
                self.get_by_guid::<$def>(guid)
            }

            #[doc = concat!("Create a ", $label, " definition.")]
            pub fn $create(&self, def: $def) -> Result<$def> {
                self.create::<$def>(def)
            }

            #[doc = concat!("Update the ", $label, " definition with the given name.")]
            pub fn $update_by_name(&self, name: &str, def: $def) -> Result<$def> {
                self.update_by_name::<$def>(name, def)
            }

            #[doc = concat!("Update the ", $label, " definition with the given guid.")]
            pub fn $update_by_guid(&self, guid: &str, def: $def) -> Result<$def> {
                self.update_by_guid::<$def>(guid, def)
            }

            #[doc = concat!("Delete the ", $label, " definition with the given name.")]
            pub fn $delete_by_name(&self, name: &str) -> Result<()> {
                self.delete_by_name::<$def>(name)
            }

            #[doc = concat!("Delete the ", $label, " definition with the given guid.")]
            pub fn $delete_by_guid(&self, guid: &str) -> Result<()> {
                self.delete_by_guid::<$def>(guid)
            }
        }
    };
}

category_operations!(
    EnumDef,
    "enum",
    get_all_enum_defs,
    get_enum_def_by_name,
    get_enum_def_by_guid,
    create_enum_def,
    update_enum_def_by_name,
    update_enum_def_by_guid,
    delete_enum_def_by_name,
    delete_enum_def_by_guid
);

category_operations!(
    StructDef,
    "struct",
    get_all_struct_defs,
    get_struct_def_by_name,
    get_struct_def_by_guid,
    create_struct_def,
    update_struct_def_by_name,
    update_struct_def_by_guid,
    delete_struct_def_by_name,
    delete_struct_def_by_guid
);

category_operations!(
    ClassificationDef,
    "classification",
    get_all_classification_defs,
    get_classification_def_by_name,
    get_classification_def_by_guid,
    create_classification_def,
    update_classification_def_by_name,
    update_classification_def_by_guid,
    delete_classification_def_by_name,
    delete_classification_def_by_guid
);

category_operations!(
    EntityDef,
    "entity",
    get_all_entity_defs,
    get_entity_def_by_name,
    get_entity_def_by_guid,
    create_entity_def,
    update_entity_def_by_name,
    update_entity_def_by_guid,
    delete_entity_def_by_name,
    delete_entity_def_by_guid
);
