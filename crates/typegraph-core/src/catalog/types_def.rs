//! Types bundle - the unit of bulk create, update and delete.

use super::typedef::{ClassificationDef, EntityDef, EnumDef, StructDef, TypeDef};

/// A bundle of type definitions grouped by category.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TypesDef {
    /// Enum definitions.
    #[serde(default)]
    pub enum_defs: Vec<EnumDef>,
    /// Struct definitions.
    #[serde(default)]
    pub struct_defs: Vec<StructDef>,
    /// Classification definitions.
    #[serde(default)]
    pub classification_defs: Vec<ClassificationDef>,
    /// Entity definitions.
    #[serde(default)]
    pub entity_defs: Vec<EntityDef>,
}

impl TypesDef {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an enum definition.
    pub fn with_enum(mut self, def: EnumDef) -> Self {
        self.enum_defs.push(def);
        self
    }

    /// Add a struct definition.
    pub fn with_struct(mut self, def: StructDef) -> Self {
        self.struct_defs.push(def);
        self
    }

    /// Add a classification definition.
    pub fn with_classification(mut self, def: ClassificationDef) -> Self {
        self.classification_defs.push(def);
        self
    }

    /// Add an entity definition.
    pub fn with_entity(mut self, def: EntityDef) -> Self {
        self.entity_defs.push(def);
        self
    }

    /// Add a definition of any category.
    pub fn push(&mut self, def: TypeDef) {
        match def {
            TypeDef::Enum(d) => self.enum_defs.push(d),
            TypeDef::Struct(d) => self.struct_defs.push(d),
            TypeDef::Classification(d) => self.classification_defs.push(d),
            TypeDef::Entity(d) => self.entity_defs.push(d),
        }
    }

    /// Total number of definitions.
    pub fn len(&self) -> usize {
        self.enum_defs.len()
            + self.struct_defs.len()
            + self.classification_defs.len()
            + self.entity_defs.len()
    }

    /// Check if the bundle holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into write order: enums, structs, classifications, entities.
    pub fn into_defs(self) -> Vec<TypeDef> {
        let mut defs = Vec::with_capacity(self.len());
        defs.extend(self.enum_defs.into_iter().map(TypeDef::Enum));
        defs.extend(self.struct_defs.into_iter().map(TypeDef::Struct));
        defs.extend(
            self.classification_defs
                .into_iter()
                .map(TypeDef::Classification),
        );
        defs.extend(self.entity_defs.into_iter().map(TypeDef::Entity));
        defs
    }

    /// All definition names, in write order.
    pub fn names(&self) -> Vec<&str> {
        self.enum_defs
            .iter()
            .map(|d| d.name.as_str())
            .chain(self.struct_defs.iter().map(|d| d.name.as_str()))
            .chain(self.classification_defs.iter().map(|d| d.name.as_str()))
            .chain(self.entity_defs.iter().map(|d| d.name.as_str()))
            .collect()
    }
}

impl FromIterator<TypeDef> for TypesDef {
    fn from_iter<I: IntoIterator<Item = TypeDef>>(iter: I) -> Self {
        let mut bundle = TypesDef::new();
        for def in iter {
            bundle.push(def);
        }
        bundle
    }
}
