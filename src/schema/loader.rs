//! Schema registry and JSON class declarations
//!
//! Declarations describe a class the same way the builder does:
//!
//! ```json
//! {
//!   "name": "Submodel",
//!   "bases": ["SampleModel"],
//!   "fields": [
//!     {"name": "data", "type": "dict"},
//!     {"name": "default", "type": "float", "default": 1.0}
//!   ],
//!   "attributes": {"other": true},
//!   "policy": {"strict": false, "mutable": true}
//! }
//! ```
//!
//! Type names resolve to built-in types first, then registered enums,
//! classes and converters. Names are registered once; redefining one fails.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::policy::ConversionPolicy;
use super::registrar::SchemaClass;
use super::types::{ConcreteType, Converter, TypeSpec};
use super::value::{EnumType, Value};
use crate::observability::{log_event_with_fields, Event};

/// A field entry of a class declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// Absent means "no default"; an explicit `null` is a null default.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<serde_json::Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Policy block of a class declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecl {
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub mutable: bool,
}

/// A class declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Absent means the policy is inherited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyDecl>,
}

/// An enumeration declaration; members are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub members: Vec<String>,
    /// Members also count as integers
    #[serde(default)]
    pub int: bool,
}

/// A document holding enum and class declarations, defined in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub enums: Vec<EnumDecl>,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
}

/// In-memory registry of schema classes, enumerations and converters.
#[derive(Default)]
pub struct SchemaRegistry {
    classes: IndexMap<String, Arc<SchemaClass>>,
    enums: IndexMap<String, Arc<EnumType>>,
    converters: IndexMap<String, Converter>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class built elsewhere.
    pub fn register(&mut self, class: Arc<SchemaClass>) -> SchemaResult<()> {
        if self.classes.contains_key(class.name()) {
            return Err(SchemaError::class_already_registered(class.name()));
        }
        self.classes.insert(class.name().to_string(), class);
        Ok(())
    }

    pub fn register_enum(&mut self, ty: Arc<EnumType>) -> SchemaResult<()> {
        if self.enums.contains_key(ty.name()) {
            return Err(SchemaError::class_already_registered(ty.name()));
        }
        self.enums.insert(ty.name().to_string(), ty);
        Ok(())
    }

    pub fn register_converter(&mut self, converter: Converter) -> SchemaResult<()> {
        if self.converters.contains_key(converter.name()) {
            return Err(SchemaError::class_already_registered(converter.name()));
        }
        self.converters.insert(converter.name().to_string(), converter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<SchemaClass>> {
        self.classes.get(name)
    }

    pub fn get_enum(&self, name: &str) -> Option<&Arc<EnumType>> {
        self.enums.get(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Returns all registered classes in registration order.
    pub fn all_classes(&self) -> impl Iterator<Item = &Arc<SchemaClass>> {
        self.classes.values()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Resolves a type name used in the declaration of `class_name`.
    pub fn resolve_type(&self, class_name: &str, type_name: &str) -> SchemaResult<TypeSpec> {
        if let Some(ty) = ConcreteType::from_name(type_name) {
            return Ok(TypeSpec::Concrete(ty));
        }
        if let Some(ty) = self.enums.get(type_name) {
            return Ok(TypeSpec::Concrete(ConcreteType::Enum(Arc::clone(ty))));
        }
        if let Some(class) = self.classes.get(type_name) {
            return Ok(TypeSpec::Nested(Arc::clone(class)));
        }
        if let Some(conv) = self.converters.get(type_name) {
            return Ok(TypeSpec::Converter(conv.clone()));
        }
        Err(SchemaError::unknown_type(class_name, type_name))
    }

    /// Builds and registers a class from its declaration.
    pub fn define(&mut self, decl: ClassDecl) -> SchemaResult<Arc<SchemaClass>> {
        if self.exists(&decl.name) {
            return Err(SchemaError::class_already_registered(&decl.name));
        }

        let mut builder = SchemaClass::builder(decl.name.as_str());
        for base in &decl.bases {
            let base_class = self
                .classes
                .get(base)
                .ok_or_else(|| SchemaError::unknown_type(&decl.name, base))?;
            builder = builder.base(base_class);
        }
        for field in decl.fields {
            let spec = self.resolve_type(&decl.name, &field.type_name)?;
            builder = match field.default {
                Some(default) => builder.field_with_default(field.name, spec, Value::from(default)),
                None => builder.field(field.name, spec),
            };
        }
        for (name, value) in decl.attributes {
            builder = builder.attribute(name, Value::from(value));
        }
        if let Some(policy) = decl.policy {
            builder = builder.policy(
                ConversionPolicy::builder()
                    .strict(policy.strict)
                    .mutable(policy.mutable)
                    .build(),
            );
        }

        let class = builder.build();
        self.register(Arc::clone(&class))?;
        log_event_with_fields(Event::DeclarationLoaded, &[("class", class.name())]);
        Ok(class)
    }

    /// Parses and defines a single class declaration.
    pub fn define_json(&mut self, text: &str) -> SchemaResult<Arc<SchemaClass>> {
        let decl: ClassDecl = serde_json::from_str(text)
            .map_err(|e| SchemaError::malformed_declaration("<class>", e.to_string()))?;
        self.define(decl)
    }

    /// Parses a document and defines its enums, then its classes, in order.
    pub fn define_document(&mut self, text: &str) -> SchemaResult<Vec<Arc<SchemaClass>>> {
        let doc: RegistryDocument = serde_json::from_str(text)
            .map_err(|e| SchemaError::malformed_declaration("<document>", e.to_string()))?;

        for decl in doc.enums {
            let ty = if decl.int {
                EnumType::int_enum(decl.name, decl.members)
            } else {
                EnumType::auto(decl.name, decl.members)
            };
            self.register_enum(ty)?;
        }
        doc.classes.into_iter().map(|decl| self.define(decl)).collect()
    }
}
