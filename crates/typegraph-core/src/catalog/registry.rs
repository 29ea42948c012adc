//! Read-only snapshot of every committed type definition.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::attribute::AttributeDef;
use super::typedef::{ClassificationDef, EntityDef, EnumDef, StructDef, TypeDef};
use super::types::{PrimitiveType, TypeCategory, TypeName};
use crate::error::Error;

/// A type name resolved against the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedType<'a> {
    /// Builtin primitive.
    Primitive(PrimitiveType),
    /// Enum definition.
    Enum(&'a EnumDef),
    /// `array<elem>`.
    Array(Box<ResolvedType<'a>>),
    /// `map<key,value>`; the key is a primitive or an enum.
    Map(Box<ResolvedType<'a>>, Box<ResolvedType<'a>>),
    /// Struct definition.
    Struct(&'a StructDef),
    /// Classification definition.
    Classification(&'a ClassificationDef),
    /// Entity definition.
    Entity(&'a EntityDef),
}

impl ResolvedType<'_> {
    /// Type name in attribute-definition syntax.
    pub fn type_name(&self) -> String {
        match self {
            ResolvedType::Primitive(p) => p.name().to_string(),
            ResolvedType::Enum(d) => d.name.clone(),
            ResolvedType::Array(elem) => super::types::array_type_name(&elem.type_name()),
            ResolvedType::Map(k, v) => super::types::map_type_name(&k.type_name(), &v.type_name()),
            ResolvedType::Struct(d) => d.name.clone(),
            ResolvedType::Classification(d) => d.name.clone(),
            ResolvedType::Entity(d) => d.name.clone(),
        }
    }

    /// Check if a default literal may be declared for this type.
    pub fn accepts_default(&self) -> bool {
        matches!(self, ResolvedType::Primitive(_) | ResolvedType::Enum(_))
    }
}

/// Immutable name- and guid-indexed view of the type definitions.
///
/// Snapshots are cheap to share behind an `Arc`; writers stage a new
/// snapshot with [`TypeRegistry::with_changes`] and swap it in after commit.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    defs: BTreeMap<String, TypeDef>,
    guids: HashMap<String, String>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from definitions.
    pub fn from_defs(defs: impl IntoIterator<Item = TypeDef>) -> Self {
        let mut registry = Self::new();
        for def in defs {
            registry.insert(def);
        }
        registry
    }

    /// Stage a snapshot with the given definitions upserted and names removed.
    pub fn with_changes<'a>(
        &self,
        upserts: impl IntoIterator<Item = TypeDef>,
        removals: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut staged = self.clone();
        for name in removals {
            staged.remove(name);
        }
        for def in upserts {
            staged.insert(def);
        }
        staged
    }

    fn insert(&mut self, def: TypeDef) {
        if let Some(old) = self.defs.get(def.name()) {
            self.guids.remove(old.guid());
        }
        if !def.guid().is_empty() {
            self.guids.insert(def.guid().to_string(), def.name().to_string());
        }
        self.defs.insert(def.name().to_string(), def);
    }

    fn remove(&mut self, name: &str) -> Option<TypeDef> {
        let def = self.defs.remove(name)?;
        self.guids.remove(def.guid());
        Some(def)
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Look up a definition by name.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }

    /// Look up a definition by guid.
    pub fn get_by_guid(&self, guid: &str) -> Option<&TypeDef> {
        self.guids.get(guid).and_then(|name| self.defs.get(name))
    }

    /// Look up a definition by name within one category.
    pub fn get_in(&self, category: TypeCategory, name: &str) -> Option<&TypeDef> {
        self.get(name).filter(|d| d.category() == category)
    }

    /// Every definition, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.defs.values()
    }

    /// Every definition of one category, in name order.
    pub fn all_of(&self, category: TypeCategory) -> Vec<&TypeDef> {
        self.defs
            .values()
            .filter(|d| d.category() == category)
            .collect()
    }

    /// Definitions declaring `name` as a direct supertype.
    pub fn direct_subtypes(&self, name: &str) -> Vec<&TypeDef> {
        self.defs
            .values()
            .filter(|d| d.super_types().iter().any(|s| s == name))
            .collect()
    }

    /// Resolve an attribute type name.
    pub fn resolve(&self, type_name: &str) -> Result<ResolvedType<'_>, Error> {
        let parsed = TypeName::parse(type_name)
            .ok_or_else(|| Error::invalid(format!("malformed type name '{}'", type_name)))?;
        match parsed {
            TypeName::Array(elem) => Ok(ResolvedType::Array(Box::new(self.resolve(elem)?))),
            TypeName::Map(key, value) => {
                let key = self.resolve(key)?;
                if !matches!(key, ResolvedType::Primitive(_) | ResolvedType::Enum(_)) {
                    return Err(Error::invalid(format!(
                        "map key type '{}' in '{}' must be a primitive or enum",
                        key.type_name(),
                        type_name
                    )));
                }
                Ok(ResolvedType::Map(Box::new(key), Box::new(self.resolve(value)?)))
            }
            TypeName::Named(name) => {
                if let Some(primitive) = PrimitiveType::from_name(name) {
                    return Ok(ResolvedType::Primitive(primitive));
                }
                match self.get(name) {
                    Some(TypeDef::Enum(d)) => Ok(ResolvedType::Enum(d)),
                    Some(TypeDef::Struct(d)) => Ok(ResolvedType::Struct(d)),
                    Some(TypeDef::Classification(d)) => Ok(ResolvedType::Classification(d)),
                    Some(TypeDef::Entity(d)) => Ok(ResolvedType::Entity(d)),
                    None => Err(Error::invalid(format!("unknown type '{}'", name))),
                }
            }
        }
    }

    /// Transitive supertypes of `name`, nearest first, each listed once.
    ///
    /// Names that do not resolve are skipped.
    pub fn supertypes_closure(&self, name: &str) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out = Vec::new();
        let mut frontier: Vec<&str> = match self.get(name) {
            Some(def) => def.super_types().iter().map(String::as_str).collect(),
            None => return out,
        };
        seen.insert(name);

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for sup in frontier {
                let Some(def) = self.get(sup) else { continue };
                if !seen.insert(def.name()) {
                    continue;
                }
                out.push(def.name());
                next.extend(def.super_types().iter().map(String::as_str));
            }
            frontier = next;
        }
        out
    }

    /// Check if `sub` is `sup` or inherits from it.
    pub fn is_subtype_of(&self, sub: &str, sup: &str) -> bool {
        sub == sup || self.supertypes_closure(sub).contains(&sup)
    }

    /// All attributes of `name`, inherited ones first.
    ///
    /// Ancestors contribute in declaration order and a shared ancestor is
    /// visited once. An attribute redeclared by a subtype replaces the
    /// inherited one in place.
    pub fn all_attributes(&self, name: &str) -> Vec<&AttributeDef> {
        let mut visited = HashSet::new();
        let mut out: Vec<&AttributeDef> = Vec::new();
        self.collect_attributes(name, &mut visited, &mut out);
        out
    }

    fn collect_attributes<'a>(
        &'a self,
        name: &str,
        visited: &mut HashSet<&'a str>,
        out: &mut Vec<&'a AttributeDef>,
    ) {
        let Some(def) = self.get(name) else { return };
        if !visited.insert(def.name()) {
            return;
        }
        for sup in def.super_types() {
            self.collect_attributes(sup, visited, out);
        }
        for attr in def.attribute_defs() {
            match out.iter().position(|a| a.name == attr.name) {
                Some(i) => out[i] = attr,
                None => out.push(attr),
            }
        }
    }

    /// Look up an attribute of `type_name`, including inherited ones.
    pub fn attribute(&self, type_name: &str, attribute: &str) -> Option<&AttributeDef> {
        self.all_attributes(type_name)
            .into_iter()
            .find(|a| a.name == attribute)
    }
}
