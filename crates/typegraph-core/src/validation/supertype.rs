//! Supertype resolution and cycle detection.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::catalog::{TypeCategory, TypeDef, TypeRegistry};
use crate::error::{Error, Result};

/// A proposed supertype list for one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupertypeChange {
    /// Category of the definition.
    pub category: TypeCategory,
    /// Definition name.
    pub name: String,
    /// Proposed supertypes.
    pub super_types: Vec<String>,
}

impl SupertypeChange {
    /// Build a change from a definition.
    pub fn of(def: &TypeDef) -> Self {
        Self {
            category: def.category(),
            name: def.name().to_string(),
            super_types: def.super_types().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Checks that supertype references resolve and form no cycle.
pub struct SupertypeValidator;

impl SupertypeValidator {
    /// Validate `changes` overlaid on `registry`.
    ///
    /// Supertypes must name a definition of the same category, either
    /// committed or among the changes.
    pub fn validate(registry: &TypeRegistry, changes: &[SupertypeChange]) -> Result<()> {
        for change in changes {
            Self::check_declaration(change)?;
        }

        for category in TypeCategory::ALL {
            if !category.supports_super_types() {
                continue;
            }
            let graph = Self::overlay(registry, changes, category);

            for change in changes.iter().filter(|c| c.category == category) {
                for sup in &change.super_types {
                    if !graph.contains_key(sup.as_str()) {
                        return Err(Error::InvalidSuperType(format!(
                            "{} '{}' has unresolved supertype '{}'",
                            category, change.name, sup
                        )));
                    }
                }
            }

            let roots = changes
                .iter()
                .filter(|c| c.category == category)
                .map(|c| c.name.as_str());
            if let Some(cycle) = find_cycle(&graph, roots) {
                return Err(Error::InvalidSuperType(format!(
                    "cycle detected: {}",
                    cycle.join(" -> ")
                )));
            }
        }
        Ok(())
    }

    fn check_declaration(change: &SupertypeChange) -> Result<()> {
        if change.super_types.is_empty() {
            return Ok(());
        }
        if !change.category.supports_super_types() {
            return Err(Error::InvalidSuperType(format!(
                "{} '{}' cannot declare supertypes",
                change.category, change.name
            )));
        }
        let mut seen = HashSet::new();
        for sup in &change.super_types {
            if sup == &change.name {
                return Err(Error::InvalidSuperType(format!(
                    "'{}' cannot be its own supertype",
                    change.name
                )));
            }
            if !seen.insert(sup.as_str()) {
                return Err(Error::invalid(format!(
                    "'{}' lists supertype '{}' more than once",
                    change.name, sup
                )));
            }
        }
        Ok(())
    }

    fn overlay<'a>(
        registry: &'a TypeRegistry,
        changes: &'a [SupertypeChange],
        category: TypeCategory,
    ) -> BTreeMap<&'a str, Vec<&'a str>> {
        let mut graph: BTreeMap<&str, Vec<&str>> = registry
            .all_of(category)
            .into_iter()
            .map(|def| {
                let sups = def.super_types().iter().map(String::as_str).collect();
                (def.name(), sups)
            })
            .collect();
        for change in changes.iter().filter(|c| c.category == category) {
            graph.insert(
                change.name.as_str(),
                change.super_types.iter().map(String::as_str).collect(),
            );
        }
        graph
    }
}

/// Three-color iterative DFS. Returns the first cycle found as a closed
/// path (`[A, B, C, A]`).
fn find_cycle<'a>(
    graph: &BTreeMap<&'a str, Vec<&'a str>>,
    roots: impl Iterator<Item = &'a str>,
) -> Option<Vec<&'a str>> {
    let mut color: HashMap<&str, Color> = graph.keys().map(|k| (*k, Color::White)).collect();
    let starts: Vec<&str> = roots.chain(graph.keys().copied()).collect();

    for start in starts {
        if color.get(start) != Some(&Color::White) {
            continue;
        }
        // (node, index of the next neighbor to visit)
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        color.insert(start, Color::Gray);

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            let neighbors = graph.get(node).map(Vec::as_slice).unwrap_or(&[]);
            if next == neighbors.len() {
                color.insert(node, Color::Black);
                stack.pop();
                continue;
            }
            top.1 += 1;

            let neighbor = neighbors[next];
            match color.get(neighbor) {
                Some(Color::White) => {
                    color.insert(neighbor, Color::Gray);
                    stack.push((neighbor, 0));
                }
                Some(Color::Gray) => {
                    let from = stack.iter().position(|(n, _)| *n == neighbor)?;
                    let mut cycle: Vec<&str> = stack[from..].iter().map(|(n, _)| *n).collect();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                // Black is finished; missing names are reported as unresolved.
                _ => {}
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ClassificationDef, EntityDef, StructDef};

    fn change(category: TypeCategory, name: &str, sups: &[&str]) -> SupertypeChange {
        SupertypeChange {
            category,
            name: name.to_string(),
            super_types: sups.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::from_defs([
            EntityDef::new("Person").into(),
            EntityDef::new("Employee").with_super_type("Person").into(),
            EntityDef::new("Manager").with_super_type("Employee").into(),
            ClassificationDef::new("PII").into(),
            StructDef::new("Address").into(),
        ])
    }

    #[test]
    fn test_valid_supertypes() {
        let reg = registry();
        let changes = [
            change(TypeCategory::Entity, "Contractor", &["Person"]),
            change(TypeCategory::Classification, "SSN", &["PII"]),
        ];
        SupertypeValidator::validate(&reg, &changes).unwrap();
    }

    #[test]
    fn test_supertype_within_batch() {
        let reg = TypeRegistry::new();
        let changes = [
            change(TypeCategory::Entity, "B", &["A"]),
            change(TypeCategory::Entity, "A", &[]),
        ];
        SupertypeValidator::validate(&reg, &changes).unwrap();
    }

    #[test]
    fn test_unresolved_supertype() {
        let reg = registry();
        let err = SupertypeValidator::validate(
            &reg,
            &[change(TypeCategory::Entity, "Contractor", &["Vendor"])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSuperType(ref m) if m.contains("Vendor")));
    }

    #[test]
    fn test_supertype_in_other_category_is_unresolved() {
        let reg = registry();
        let err = SupertypeValidator::validate(
            &reg,
            &[change(TypeCategory::Entity, "Contractor", &["PII"])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSuperType(_)));
    }

    #[test]
    fn test_struct_cannot_have_supertypes() {
        let reg = registry();
        let err = SupertypeValidator::validate(
            &reg,
            &[change(TypeCategory::Struct, "Phone", &["Address"])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSuperType(_)));
    }

    #[test]
    fn test_self_reference() {
        let reg = registry();
        let err =
            SupertypeValidator::validate(&reg, &[change(TypeCategory::Entity, "Person", &["Person"])])
                .unwrap_err();
        assert!(matches!(err, Error::InvalidSuperType(_)));
    }

    #[test]
    fn test_duplicate_supertype() {
        let reg = registry();
        let err = SupertypeValidator::validate(
            &reg,
            &[change(TypeCategory::Entity, "Contractor", &["Person", "Person"])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_cycle_path_reported() {
        let reg = registry();
        // Person -> Manager closes Person <- Employee <- Manager.
        let err = SupertypeValidator::validate(
            &reg,
            &[change(TypeCategory::Entity, "Person", &["Manager"])],
        )
        .unwrap_err();
        match err {
            Error::InvalidSuperType(msg) => {
                assert_eq!(msg, "cycle detected: Person -> Manager -> Employee -> Person");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cycle_inside_batch() {
        let reg = TypeRegistry::new();
        let err = SupertypeValidator::validate(
            &reg,
            &[
                change(TypeCategory::Classification, "A", &["B"]),
                change(TypeCategory::Classification, "B", &["A"]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidSuperType(ref m) if m.contains("A -> B -> A")));
    }
}
