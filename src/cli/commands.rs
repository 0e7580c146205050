//! CLI command implementations
//!
//! Each command loads the schema document into a fresh registry, does its
//! work and returns the response payload; `run_command` writes it to stdout.

use std::path::Path;

use serde_json::{json, Value};

use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::schema::{Instance, SchemaClass, SchemaRegistry};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_json, read_text, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    if cli.trace {
        Logger::set_min_severity(Severity::Trace);
    }
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let name = cmd.name();
    log_event_with_fields(Event::CommandStart, &[("command", name)]);

    let result = match cmd {
        Command::Describe { schema, class } => describe(&schema, class.as_deref()),
        Command::Render {
            schema,
            class,
            values,
        } => render(&schema, &class, &values),
    };

    match result {
        Ok(data) => {
            write_response(data)?;
            log_event_with_fields(Event::CommandComplete, &[("command", name)]);
            Ok(())
        }
        Err(e) => {
            log_event_with_fields(
                Event::CommandFailed,
                &[("command", name), ("code", e.code_str())],
            );
            Err(e)
        }
    }
}

/// Load a schema document into a new registry
pub fn load_registry(schema_path: &Path) -> CliResult<SchemaRegistry> {
    let text = read_text(schema_path)?;
    let mut registry = SchemaRegistry::new();
    registry.define_document(&text)?;
    Ok(registry)
}

/// Describe one class, or every class in declaration order
pub fn describe(schema_path: &Path, class: Option<&str>) -> CliResult<Value> {
    let registry = load_registry(schema_path)?;

    let classes: Vec<Value> = match class {
        Some(name) => {
            let class = registry
                .get(name)
                .ok_or_else(|| CliError::class_not_found(name))?;
            vec![describe_class(class)]
        }
        None => registry.all_classes().map(|c| describe_class(c)).collect(),
    };

    Ok(json!({ "classes": classes }))
}

fn describe_class(class: &SchemaClass) -> Value {
    let bases: Vec<&str> = class.bases().iter().map(|b| b.name()).collect();
    let fields: Vec<Value> = class
        .fields()
        .iter()
        .map(|(name, default)| {
            let type_name = class.type_of(name).map(|spec| spec.name());
            json!({
                "name": name,
                "type": type_name,
                "default": default.repr(),
            })
        })
        .collect();

    json!({
        "name": class.name(),
        "bases": bases,
        "fields": fields,
        "policy": class.policy().to_string(),
    })
}

/// Build an instance of `class` from a values file
pub fn render(schema_path: &Path, class: &str, values_path: &Path) -> CliResult<Value> {
    let registry = load_registry(schema_path)?;
    let class = registry
        .get(class)
        .ok_or_else(|| CliError::class_not_found(class))?;

    let instance = Instance::from_json(class, read_json(values_path)?)?;

    Ok(json!({
        "repr": instance.repr(),
        "json": instance.to_json()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"{
        "enums": [{"name": "Choice", "members": ["yes", "no"]}],
        "classes": [
            {
                "name": "Model",
                "fields": [
                    {"name": "number", "type": "int"},
                    {"name": "day", "type": "date"},
                    {"name": "choice", "type": "Choice", "default": 2},
                    {"name": "default", "type": "float", "default": 0.0}
                ]
            },
            {"name": "Child", "bases": ["Model"], "policy": {"strict": true}}
        ]
    }"#;

    fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_describe_all_classes() {
        let dir = TempDir::new().unwrap();
        let schema = write(&dir, "schema.json", SCHEMA);

        let data = describe(&schema, None).unwrap();
        let classes = data["classes"].as_array().unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0]["name"], "Model");
        assert_eq!(classes[0]["fields"][0]["name"], "number");
        assert_eq!(classes[0]["fields"][0]["type"], "int");
        assert_eq!(classes[0]["fields"][0]["default"], "UNSET");
        assert_eq!(classes[0]["fields"][3]["default"], "0.0");
        assert_eq!(classes[1]["bases"], json!(["Model"]));
        assert_eq!(classes[1]["policy"], "ConversionPolicy(strict=true)");
    }

    #[test]
    fn test_describe_unknown_class() {
        let dir = TempDir::new().unwrap();
        let schema = write(&dir, "schema.json", SCHEMA);
        let err = describe(&schema, Some("Missing")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ClassNotFound);
    }

    #[test]
    fn test_render_named_values() {
        let dir = TempDir::new().unwrap();
        let schema = write(&dir, "schema.json", SCHEMA);
        let values = write(&dir, "values.json", r#"{"day": "1999-12-31", "number": "7", "choice": 2}"#);

        let data = render(&schema, "Model", &values).unwrap();
        assert_eq!(
            data["repr"],
            "Model(number=7, day=1999-12-31, choice=Choice::no, default=0.0)"
        );
        assert_eq!(
            data["json"],
            json!({"number": 7, "day": "1999-12-31", "choice": 2, "default": 0.0})
        );
    }

    #[test]
    fn test_render_strict_missing_field() {
        let dir = TempDir::new().unwrap();
        let schema = write(&dir, "schema.json", SCHEMA);
        let values = write(&dir, "values.json", "[1]");

        let err = render(&schema, "Child", &values).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);
        assert!(err.message().contains("day"));
    }

    #[test]
    fn test_render_missing_schema() {
        let dir = TempDir::new().unwrap();
        let values = write(&dir, "values.json", "{}");
        let err = render(&dir.path().join("absent.json"), "Model", &values).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
