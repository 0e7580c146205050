//! Schema classes and their field registration
//!
//! A class is registered once through [`SchemaClassBuilder`], which merges
//! the field and type tables of its bases with its own declarations:
//! - bases are merged in reverse declaration order
//! - an inherited field keeps its position when redeclared
//! - new fields are appended in declaration order
//! - names shaped like `__name__` never become fields
//!
//! Ancestors are linearized (C3, falling back to a depth-first walk without
//! repeats when the bases disagree). The policy and plain attributes resolve
//! along that order: the first class that declares one wins.
//!
//! The resulting tables are immutable and shared by every instance.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::errors::SchemaResult;
use super::instance::{Arguments, Instance};
use super::policy::ConversionPolicy;
use super::slot::Slot;
use super::types::{FieldDecl, TypeSpec};
use super::value::Value;
use crate::observability::{log_event_with_fields, Event};

/// A registered schema class: ordered field table, type table, plain
/// attributes and the conversion policy its instances follow.
pub struct SchemaClass {
    name: String,
    bases: Vec<Arc<SchemaClass>>,
    ancestors: Vec<Arc<SchemaClass>>,
    fields: IndexMap<String, Slot>,
    types: IndexMap<String, TypeSpec>,
    attributes: IndexMap<String, Slot>,
    own_policy: Option<Arc<ConversionPolicy>>,
    policy: Arc<ConversionPolicy>,
}

impl SchemaClass {
    pub fn builder(name: impl Into<String>) -> SchemaClassBuilder {
        SchemaClassBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bases(&self) -> &[Arc<SchemaClass>] {
        &self.bases
    }

    /// All ancestor classes in resolution order, nearest first.
    pub fn ancestors(&self) -> &[Arc<SchemaClass>] {
        &self.ancestors
    }

    /// Field table: field name to default value or `Slot::Unset`
    pub fn fields(&self) -> &IndexMap<String, Slot> {
        &self.fields
    }

    /// Type table: field name to declared type
    pub fn types(&self) -> &IndexMap<String, TypeSpec> {
        &self.types
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn type_of(&self, name: &str) -> Option<&TypeSpec> {
        self.types.get(name)
    }

    pub fn default_of(&self, name: &str) -> Option<&Slot> {
        self.fields.get(name)
    }

    /// Looks up a plain class attribute on this class, then on its ancestors.
    pub fn attribute(&self, name: &str) -> Option<&Slot> {
        self.attributes.get(name).or_else(|| {
            self.ancestors
                .iter()
                .find_map(|ancestor| ancestor.attributes.get(name))
        })
    }

    pub fn policy(&self) -> &ConversionPolicy {
        &self.policy
    }

    /// Returns whether `other` is an ancestor of this class.
    pub fn is_subclass_of(&self, other: &Arc<SchemaClass>) -> bool {
        self.ancestors.iter().any(|ancestor| Arc::ptr_eq(ancestor, other))
    }

    /// Encodes a value with this class's policy.
    pub fn encode(&self, value: &Value) -> SchemaResult<Value> {
        self.policy.encode(value)
    }

    /// Creates an instance from arguments.
    pub fn instantiate(self: &Arc<Self>, args: Arguments) -> SchemaResult<Instance> {
        Instance::new(self, args)
    }

    /// Creates an instance from positional values, zipped in field order.
    pub fn positional<V: Into<Value>>(
        self: &Arc<Self>,
        values: impl IntoIterator<Item = V>,
    ) -> SchemaResult<Instance> {
        Instance::new(self, Arguments::positional(values))
    }

    /// Creates an instance from named values.
    pub fn named<K: Into<String>, V: Into<Value>>(
        self: &Arc<Self>,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> SchemaResult<Instance> {
        Instance::new(self, Arguments::named(values))
    }
}

impl fmt::Debug for SchemaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bases: Vec<&str> = self.bases.iter().map(|b| b.name()).collect();
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, default)| match self.types.get(name) {
                Some(spec) => format!("{}: {} = {}", name, spec, default),
                None => format!("{} = {}", name, default),
            })
            .collect();
        f.debug_struct("SchemaClass")
            .field("name", &self.name)
            .field("bases", &bases)
            .field("fields", &fields)
            .field("policy", &self.policy)
            .finish()
    }
}

/// Returns whether `name` is reserved (`__name__` shape) and never a field.
pub fn is_reserved_name(name: &str) -> bool {
    name.len() > 4 && name.starts_with("__") && name.ends_with("__")
}

/// Linearizes the ancestors of a class with the given bases.
fn linearize(bases: &[Arc<SchemaClass>]) -> Vec<Arc<SchemaClass>> {
    let mut sequences: Vec<Vec<Arc<SchemaClass>>> = bases
        .iter()
        .map(|base| {
            let mut seq = vec![Arc::clone(base)];
            seq.extend(base.ancestors.iter().cloned());
            seq
        })
        .collect();
    sequences.push(bases.to_vec());

    let mut out = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return out;
        }
        let head = sequences
            .iter()
            .map(|seq| &seq[0])
            .find(|candidate| {
                !sequences
                    .iter()
                    .any(|seq| seq[1..].iter().any(|c| Arc::ptr_eq(c, *candidate)))
            })
            .cloned();
        let Some(head) = head else {
            return depth_first(bases);
        };
        for seq in &mut sequences {
            if Arc::ptr_eq(&seq[0], &head) {
                seq.remove(0);
            }
        }
        out.push(head);
    }
}

fn depth_first(bases: &[Arc<SchemaClass>]) -> Vec<Arc<SchemaClass>> {
    let mut out: Vec<Arc<SchemaClass>> = Vec::new();
    for class in bases
        .iter()
        .flat_map(|base| std::iter::once(base).chain(base.ancestors.iter()))
    {
        if !out.iter().any(|seen| Arc::ptr_eq(seen, class)) {
            out.push(Arc::clone(class));
        }
    }
    out
}

/// Collects the declarations of a schema class and builds it.
pub struct SchemaClassBuilder {
    name: String,
    bases: Vec<Arc<SchemaClass>>,
    declarations: Vec<FieldDecl>,
    attributes: IndexMap<String, Slot>,
    policy: Option<ConversionPolicy>,
}

impl SchemaClassBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            declarations: Vec::new(),
            attributes: IndexMap::new(),
            policy: None,
        }
    }

    /// Adds a base class; bases keep the order they are added in.
    pub fn base(mut self, base: &Arc<SchemaClass>) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    /// Declares a field without a default.
    pub fn field(self, name: impl Into<String>, spec: impl Into<TypeSpec>) -> Self {
        self.declare(FieldDecl::required(name, spec))
    }

    /// Declares a field with a default.
    pub fn field_with_default(
        self,
        name: impl Into<String>,
        spec: impl Into<TypeSpec>,
        default: impl Into<Value>,
    ) -> Self {
        self.declare(FieldDecl::with_default(name, spec, default))
    }

    pub fn declare(mut self, decl: FieldDecl) -> Self {
        self.declarations.push(decl);
        self
    }

    /// Assigns a plain class attribute; attributes are not fields.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), Slot::Value(value.into()));
        self
    }

    /// Attaches a policy to this class and, unless they override it, its subclasses.
    pub fn policy(mut self, policy: ConversionPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build(self) -> Arc<SchemaClass> {
        let mut fields: IndexMap<String, Slot> = IndexMap::new();
        let mut types: IndexMap<String, TypeSpec> = IndexMap::new();

        for base in self.bases.iter().rev() {
            for (name, default) in &base.fields {
                fields.insert(name.clone(), default.clone());
            }
            for (name, spec) in &base.types {
                types.insert(name.clone(), spec.clone());
            }
        }

        let mut attributes = self.attributes;
        for decl in self.declarations {
            if is_reserved_name(&decl.name) {
                if let Some(default) = decl.default {
                    attributes.insert(decl.name, Slot::Value(default));
                }
                continue;
            }
            match decl.default {
                Some(default) => {
                    fields.insert(decl.name.clone(), Slot::Value(default));
                }
                None => {
                    fields.entry(decl.name.clone()).or_insert(Slot::Unset);
                }
            }
            types.insert(decl.name, decl.spec);
        }

        let ancestors = linearize(&self.bases);
        let own_policy = self.policy.map(Arc::new);
        let policy = own_policy
            .clone()
            .or_else(|| {
                ancestors
                    .iter()
                    .find_map(|ancestor| ancestor.own_policy.clone())
            })
            .unwrap_or_default();

        let field_count = fields.len().to_string();
        log_event_with_fields(
            Event::ClassRegistered,
            &[("class", self.name.as_str()), ("fields", field_count.as_str())],
        );

        Arc::new(SchemaClass {
            name: self.name,
            bases: self.bases,
            ancestors,
            fields,
            types,
            attributes,
            own_policy,
            policy,
        })
    }
}
