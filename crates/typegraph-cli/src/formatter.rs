//! Output formatters for command results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use serde::Serialize;
use typegraph_core::catalog::{TypeDef, TypesDef};

use crate::error::CliError;

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// ASCII table format
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}

/// Pretty-print any serializable result.
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Format a types bundle.
pub fn format_types(types: &TypesDef, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => format_json(types),
        OutputFormat::Table => Ok(format_types_as_table(types)),
    }
}

fn format_types_as_table(types: &TypesDef) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("category"),
        Cell::new("name"),
        Cell::new("guid"),
        Cell::new("version"),
        Cell::new("supertypes"),
        Cell::new("attributes"),
    ]);

    let defs = types.clone().into_defs();
    for def in &defs {
        table.add_row(vec![
            Cell::new(def.category()),
            Cell::new(def.name()),
            Cell::new(def.guid()),
            Cell::new(def.version()),
            Cell::new(def.super_types().join(", ")),
            Cell::new(describe_members(def)),
        ]);
    }

    format!("{}\n{} type(s)", table, defs.len())
}

/// Attribute names with types, or enum literals.
fn describe_members(def: &TypeDef) -> String {
    match def {
        TypeDef::Enum(e) => e
            .element_defs
            .iter()
            .map(|el| el.value.as_str())
            .collect::<Vec<_>>()
            .join(" | "),
        _ => def
            .attribute_defs()
            .iter()
            .map(|a| format!("{}: {}", a.name, a.type_name))
            .collect::<Vec<_>>()
            .join(", "),
    }
}
