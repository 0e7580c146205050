//! Registry Declaration Tests
//!
//! Classes declared from JSON documents and driven through the CLI
//! commands, using files in temporary directories.

use std::fs;
use std::path::PathBuf;

use serde_json::json;
use squema::cli::{self, CliErrorCode};
use squema::schema::{Instance, SchemaErrorCode, SchemaRegistry, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const DOCUMENT: &str = r#"{
    "enums": [
        {"name": "Choice", "members": ["yes", "no"]},
        {"name": "TinyInt", "members": ["one", "two"], "int": true}
    ],
    "classes": [
        {"name": "Entity", "fields": [{"name": "boolean", "type": "bool"}]},
        {
            "name": "SampleModel",
            "fields": [
                {"name": "number", "type": "int"},
                {"name": "string", "type": "str"},
                {"name": "entity", "type": "Entity"},
                {"name": "choice", "type": "Choice"},
                {"name": "default", "type": "float", "default": 0.0}
            ]
        },
        {
            "name": "Submodel",
            "bases": ["SampleModel"],
            "fields": [
                {"name": "number", "type": "TinyInt"},
                {"name": "data", "type": "dict"},
                {"name": "default", "type": "float", "default": 1.0}
            ],
            "policy": {"mutable": true}
        }
    ]
}"#;

fn registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.define_document(DOCUMENT).unwrap();
    registry
}

fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_declared_inheritance() {
    let registry = registry();
    let submodel = registry.get("Submodel").unwrap();
    let names: Vec<&str> = submodel.field_names().collect();
    assert_eq!(
        names,
        vec!["number", "string", "entity", "choice", "default", "data"]
    );

    let model = Instance::from_json(
        submodel,
        json!({"number": 2, "data": [["a", 1]], "entity": {"boolean": false}}),
    )
    .unwrap();
    assert_eq!(
        model.repr(),
        "Submodel(number=TinyInt::two, entity=Entity(boolean=false), default=1.0, data={\"a\": 1})"
    );
    assert_eq!(
        model.to_json().unwrap(),
        json!({"number": 2, "entity": {"boolean": false}, "default": 1.0, "data": {"a": 1}})
    );
}

#[test]
fn test_declared_policy_applies() {
    let registry = registry();
    let mut model = registry
        .get("Submodel")
        .unwrap()
        .named([("number", 1)])
        .unwrap();
    model.set("number", 2).unwrap();
    assert_eq!(model.value("number").unwrap().repr(), "TinyInt::two");

    let mut parent = registry
        .get("SampleModel")
        .unwrap()
        .named([("number", 1)])
        .unwrap();
    assert_eq!(
        parent.set("number", 2).unwrap_err().code(),
        SchemaErrorCode::Immutable
    );
}

#[test]
fn test_positional_json_values() {
    let registry = registry();
    let model = Instance::from_json(
        registry.get("SampleModel").unwrap(),
        json!([1, 2, {"boolean": true}, 2]),
    )
    .unwrap();
    assert_eq!(model.value("string"), Some(&Value::from("2")));
    assert_eq!(model.value("choice").unwrap().repr(), "Choice::no");
}

#[test]
fn test_scalar_json_values_rejected() {
    let registry = registry();
    let err = Instance::from_json(registry.get("Entity").unwrap(), json!(true)).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::ShapeMismatch);
}

#[test]
fn test_document_redefinition_rejected() {
    let mut registry = registry();
    let err = registry.define_document(DOCUMENT).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::ClassAlreadyRegistered);
    assert_eq!(registry.class_count(), 3);
}

// =============================================================================
// CLI Tests
// =============================================================================

#[test]
fn test_cli_describe_single_class() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", DOCUMENT);

    let data = cli::describe(&schema, Some("Submodel")).unwrap();
    let class = &data["classes"][0];
    assert_eq!(class["name"], "Submodel");
    assert_eq!(class["bases"], json!(["SampleModel"]));
    assert_eq!(class["fields"][0], json!({"name": "number", "type": "TinyInt", "default": "UNSET"}));
    assert_eq!(class["policy"], "ConversionPolicy(mutable=true)");
}

#[test]
fn test_cli_render() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", DOCUMENT);
    let values = write(&dir, "values.json", r#"{"number": 1, "choice": 1}"#);

    let data = cli::render(&schema, "SampleModel", &values).unwrap();
    assert_eq!(
        data,
        json!({
            "repr": "SampleModel(number=1, choice=Choice::yes, default=0.0)",
            "json": {"number": 1, "choice": 1, "default": 0.0}
        })
    );
}

#[test]
fn test_cli_render_conversion_error() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", DOCUMENT);
    let values = write(&dir, "values.json", r#"{"choice": 3}"#);

    let err = cli::render(&schema, "SampleModel", &values).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::SchemaError);
}

#[test]
fn test_cli_malformed_document() {
    let dir = TempDir::new().unwrap();
    let schema = write(&dir, "schema.json", r#"{"classes": [{"fields": []}]}"#);
    let err = cli::describe(&schema, None).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::SchemaError);
    assert!(err.message().contains("SQUEMA_MALFORMED_DECLARATION"));
}
