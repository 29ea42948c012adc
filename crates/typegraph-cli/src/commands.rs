//! Command execution against a local store.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;
use typegraph_core::catalog::TypesDef;
use typegraph_core::convert::FormatConverters;
use typegraph_core::store::TypeDefStore;
use typegraph_core::Error;
use typegraph_proto::{current, legacy, SearchFilter};

use crate::config::{Command, ConvertCommand, TypesCommand};
use crate::error::CliError;
use crate::formatter::{format_json, format_types, OutputFormat};

/// Execute a command and return its output.
pub fn execute(
    command: &Command,
    store: &TypeDefStore,
    format: OutputFormat,
) -> Result<String, CliError> {
    match command {
        Command::Types(cmd) => execute_types(cmd, store, format),
        Command::Convert(cmd) => execute_convert(cmd, store),
    }
}

fn execute_types(
    command: &TypesCommand,
    store: &TypeDefStore,
    format: OutputFormat,
) -> Result<String, CliError> {
    match command {
        TypesCommand::Create { file } => {
            let created = store.create_types_def(read_json::<TypesDef>(file)?)?;
            info!(count = created.len(), "created types");
            format_types(&created, format)
        }
        TypesCommand::Update { file } => {
            let updated = store.update_types_def(read_json::<TypesDef>(file)?)?;
            info!(count = updated.len(), "updated types");
            format_types(&updated, format)
        }
        TypesCommand::Delete { file } => {
            let doomed = read_json::<TypesDef>(file)?;
            let names: Vec<String> = doomed.names().into_iter().map(str::to_string).collect();
            store.delete_types_def(doomed)?;
            format_json(&serde_json::json!({ "deleted": names }))
        }
        TypesCommand::List {
            categories,
            name,
            name_contains,
            supertype,
            not_supertype,
        } => {
            let mut filter = SearchFilter::new();
            for category in categories {
                filter = filter.with_param("type", category.as_str());
            }
            let optional = [
                ("name", name),
                ("nameContains", name_contains),
                ("supertype", supertype),
                ("notsupertype", not_supertype),
            ];
            for (key, value) in optional {
                if let Some(value) = value {
                    filter = filter.with_param(key, value.as_str());
                }
            }
            format_types(&store.search_types_def(&filter)?, format)
        }
        TypesCommand::Get { name } => {
            let registry = store.registry();
            let def = registry
                .get(name)
                .ok_or_else(|| Error::NotFound(format!("type '{}'", name)))?;
            format_json(def)
        }
    }
}

fn execute_convert(command: &ConvertCommand, store: &TypeDefStore) -> Result<String, CliError> {
    let registry = store.registry();
    let converters = FormatConverters::with_defaults();
    match command {
        ConvertCommand::ToCurrent { type_name, file } => {
            let value = read_json::<legacy::Value>(file)?;
            format_json(&converters.to_current(&registry, &value, type_name)?)
        }
        ConvertCommand::ToLegacy { type_name, file } => {
            let value = read_json::<current::Value>(file)?;
            format_json(&converters.to_legacy(&registry, &value, type_name)?)
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use typegraph_core::StorageConfig;

    struct TestContext {
        store: TypeDefStore,
        dir: tempfile::TempDir,
    }

    impl TestContext {
        fn new() -> Self {
            Self {
                store: TypeDefStore::open(StorageConfig::temporary()).unwrap(),
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn write(&self, name: &str, json: serde_json::Value) -> PathBuf {
            let path = self.dir.path().join(name);
            fs::write(&path, json.to_string()).unwrap();
            path
        }

        fn run(&self, command: Command) -> Result<String, CliError> {
            execute(&command, &self.store, OutputFormat::Json)
        }
    }

    fn employee_bundle() -> serde_json::Value {
        serde_json::json!({
            "enum_defs": [
                {"name": "Status", "element_defs": [
                    {"value": "ACTIVE", "ordinal": 1},
                    {"value": "INACTIVE", "ordinal": 2}
                ]}
            ],
            "entity_defs": [
                {"name": "Employee", "attribute_defs": [
                    {"name": "name", "type_name": "string"},
                    {"name": "status", "type_name": "Status"}
                ]}
            ]
        })
    }

    #[test]
    fn test_create_list_get() {
        let ctx = TestContext::new();
        let file = ctx.write("types.json", employee_bundle());

        let created = ctx.run(Command::Types(TypesCommand::Create { file })).unwrap();
        let created: TypesDef = serde_json::from_str(&created).unwrap();
        assert_eq!(created.names(), vec!["Status", "Employee"]);

        let listed = ctx
            .run(Command::Types(TypesCommand::List {
                categories: vec!["entity".into()],
                name: None,
                name_contains: None,
                supertype: None,
                not_supertype: None,
            }))
            .unwrap();
        let listed: TypesDef = serde_json::from_str(&listed).unwrap();
        assert_eq!(listed.names(), vec!["Employee"]);

        let fetched = ctx
            .run(Command::Types(TypesCommand::Get {
                name: "Status".into(),
            }))
            .unwrap();
        assert!(fetched.contains("\"category\": \"ENUM\""));
    }

    #[test]
    fn test_get_unknown() {
        let ctx = TestContext::new();
        let err = ctx
            .run(Command::Types(TypesCommand::Get {
                name: "Ghost".into(),
            }))
            .unwrap_err();
        assert!(matches!(err, CliError::Core(Error::NotFound(_))));
    }

    #[test]
    fn test_missing_file() {
        let ctx = TestContext::new();
        let err = ctx
            .run(Command::Types(TypesCommand::Create {
                file: ctx.dir.path().join("absent.json"),
            }))
            .unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }

    #[test]
    fn test_convert_round_trip() {
        let ctx = TestContext::new();
        let types = ctx.write("types.json", employee_bundle());
        ctx.run(Command::Types(TypesCommand::Create { file: types })).unwrap();

        let value = legacy::Value::Referenceable(Box::new(
            legacy::Referenceable::new("e-1", "Employee")
                .with_value("name", legacy::Value::String("Ada".into()))
                .with_value(
                    "status",
                    legacy::Value::Enum(legacy::EnumValue {
                        value: "ACTIVE".into(),
                        ordinal: 1,
                    }),
                ),
        ));
        let input = ctx.write("legacy.json", serde_json::to_value(&value).unwrap());

        let current = ctx
            .run(Command::Convert(ConvertCommand::ToCurrent {
                type_name: "Employee".into(),
                file: input,
            }))
            .unwrap();
        let current_file = ctx.write("current.json", serde_json::from_str(&current).unwrap());

        let back = ctx
            .run(Command::Convert(ConvertCommand::ToLegacy {
                type_name: "Employee".into(),
                file: current_file,
            }))
            .unwrap();
        let back: legacy::Value = serde_json::from_str(&back).unwrap();
        assert_eq!(back, value);
    }
}
