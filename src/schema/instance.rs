//! Schema instances
//!
//! An instance owns a values table with exactly the keys of its class's
//! field table, plus a separate bag of extra (non-field) state.
//!
//! Behavior depends on the class policy:
//! - strict: every field must be set, unknown names are rejected, and
//!   iteration yields unset fields too
//! - mutable: fields can be reassigned (re-coerced) and soft-deleted

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;

use super::errors::{SchemaError, SchemaResult};
use super::hierarchy;
use super::policy::ConversionPolicy;
use super::registrar::SchemaClass;
use super::render;
use super::slot::Slot;
use super::types::TypeSpec;
use super::value::Value;

/// Constructor arguments: positional values or named values, never both.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    positional: Vec<Value>,
    named: IndexMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: IndexMap::new(),
        }
    }

    pub fn named<K: Into<String>, V: Into<Value>>(values: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            positional: Vec::new(),
            named: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Appends a positional value.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a named value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// An instance of a [`SchemaClass`].
#[derive(Clone)]
pub struct Instance {
    class: Arc<SchemaClass>,
    values: IndexMap<String, Slot>,
    extras: IndexMap<String, Slot>,
}

impl Instance {
    /// Builds an instance: seeds the values from the field table, then
    /// coerces and stores every supplied value.
    pub fn new(class: &Arc<SchemaClass>, args: Arguments) -> SchemaResult<Self> {
        let class_name = class.name();
        let strict = class.policy().is_strict();

        if !args.positional.is_empty() && !args.named.is_empty() {
            return Err(SchemaError::argument_shape(class_name));
        }

        let mut instance = Self {
            class: Arc::clone(class),
            values: class.fields().clone(),
            extras: IndexMap::new(),
        };

        let supplied: Vec<(String, Value)> = if args.positional.is_empty() {
            args.named.into_iter().collect()
        } else {
            if strict && args.positional.len() > instance.values.len() {
                return Err(SchemaError::too_many_arguments(
                    class_name,
                    args.positional.len(),
                    instance.values.len(),
                ));
            }
            instance
                .values
                .keys()
                .cloned()
                .zip(args.positional)
                .collect()
        };

        for (name, raw) in supplied {
            if instance.values.contains_key(&name) {
                let value = instance.coerce(&name, raw)?;
                instance.values.insert(name, Slot::Value(value));
            } else if strict {
                return Err(SchemaError::unknown_field(class_name, &name));
            } else {
                instance.extras.insert(name, Slot::Value(raw));
            }
        }

        if strict {
            let missing: Vec<&str> = instance
                .values
                .iter()
                .filter(|(_, slot)| slot.is_unset())
                .map(|(name, _)| name.as_str())
                .collect();
            if !missing.is_empty() {
                return Err(SchemaError::missing_fields(class_name, &missing));
            }
        }

        Ok(instance)
    }

    /// Builds an instance from parsed JSON: an object gives named values,
    /// an array gives positional values.
    pub fn from_json(class: &Arc<SchemaClass>, json: serde_json::Value) -> SchemaResult<Self> {
        match Value::from(json) {
            Value::Dict(map) => Self::new(class, Arguments::named(map)),
            Value::List(items) => Self::new(class, Arguments::positional(items)),
            other => Err(SchemaError::shape_mismatch(
                class.name(),
                "$root",
                &other.type_name(),
            )),
        }
    }

    /// Converts a raw value to the declared type of `field`.
    fn coerce(&self, field: &str, raw: Value) -> SchemaResult<Value> {
        let class_name = self.class.name();
        let spec = self
            .class
            .type_of(field)
            .ok_or_else(|| SchemaError::unknown_field(class_name, field))?;

        let satisfied = match spec {
            TypeSpec::Concrete(ty) => hierarchy::satisfies(&raw, &ty.key()),
            TypeSpec::Nested(class) => hierarchy::is_instance_of(&raw, class),
            TypeSpec::Converter(_) => false,
        };
        if satisfied {
            return Ok(raw);
        }

        if let Some(key) = spec.key() {
            if let Some(decoded) = self.policy().decode(&key, &raw) {
                return decoded.map_err(|e| SchemaError::decode_failed(class_name, field, &e));
            }
        }

        match spec {
            TypeSpec::Concrete(ty) if ty.is_constructible() => ty.construct(&raw).map_err(|_| {
                SchemaError::type_mismatch(class_name, field, &spec.name(), &raw.type_name())
            }),
            TypeSpec::Nested(nested) => match raw {
                Value::Dict(map) => nested.named(map).map(Value::from),
                other => Err(SchemaError::shape_mismatch(
                    class_name,
                    field,
                    &other.type_name(),
                )),
            },
            TypeSpec::Converter(conv) => conv
                .call(&raw)
                .map_err(|e| SchemaError::decode_failed(class_name, field, &e)),
            TypeSpec::Concrete(_) => Err(SchemaError::no_decoder(class_name, field, &spec.name())),
        }
    }

    pub fn class(&self) -> &Arc<SchemaClass> {
        &self.class
    }

    pub fn policy(&self) -> &ConversionPolicy {
        self.class.policy()
    }

    fn is_strict(&self) -> bool {
        self.policy().is_strict()
    }

    fn is_mutable(&self) -> bool {
        self.policy().is_mutable()
    }

    /// Attribute-style read: field, then extra state, then class attribute.
    pub fn getattr(&self, name: &str) -> SchemaResult<&Slot> {
        self.values
            .get(name)
            .or_else(|| self.extras.get(name))
            .or_else(|| self.class.attribute(name))
            .ok_or_else(|| SchemaError::not_an_attribute(self.class.name(), name))
    }

    /// Mapping-style read: declared fields only.
    pub fn get(&self, key: &str) -> SchemaResult<&Slot> {
        self.values
            .get(key)
            .ok_or_else(|| SchemaError::not_a_key(self.class.name(), key))
    }

    /// Returns the value of a field if it is set.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key).and_then(Slot::as_value)
    }

    fn assign_field(&mut self, name: &str, raw: Value) -> SchemaResult<()> {
        if !self.is_mutable() {
            return Err(SchemaError::immutable(self.class.name()));
        }
        let value = self.coerce(name, raw)?;
        self.values.insert(name.to_string(), Slot::Value(value));
        Ok(())
    }

    /// Attribute-style write.
    ///
    /// Fields are re-coerced when the policy is mutable; other names become
    /// extra state unless the policy is strict.
    pub fn setattr(&mut self, name: &str, value: impl Into<Value>) -> SchemaResult<()> {
        let value = value.into();
        if self.values.contains_key(name) {
            self.assign_field(name, value)
        } else if self.is_strict() {
            Err(SchemaError::unknown_field(self.class.name(), name))
        } else {
            self.extras.insert(name.to_string(), Slot::Value(value));
            Ok(())
        }
    }

    /// Mapping-style write; only declared fields are keys.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> SchemaResult<()> {
        if self.values.contains_key(key) {
            self.assign_field(key, value.into())
        } else {
            Err(SchemaError::not_a_key(self.class.name(), key))
        }
    }

    /// Attribute-style delete: a field goes back to unset, extra state is dropped.
    pub fn delattr(&mut self, name: &str) -> SchemaResult<()> {
        if self.values.contains_key(name) {
            if !self.is_mutable() {
                return Err(SchemaError::immutable(self.class.name()));
            }
            self.values.insert(name.to_string(), Slot::Unset);
            Ok(())
        } else if self.extras.shift_remove(name).is_some() {
            Ok(())
        } else {
            Err(SchemaError::not_an_attribute(self.class.name(), name))
        }
    }

    /// Mapping-style delete: the field goes back to unset and keeps its key.
    pub fn remove(&mut self, key: &str) -> SchemaResult<()> {
        if !self.is_mutable() {
            return Err(SchemaError::immutable(self.class.name()));
        }
        match self.values.get_mut(key) {
            Some(slot) => {
                *slot = Slot::Unset;
                Ok(())
            }
            None => Err(SchemaError::not_a_key(self.class.name(), key)),
        }
    }

    /// Membership follows iteration: unset fields are absent unless strict.
    pub fn contains(&self, key: &str) -> bool {
        self.keys().any(|k| k == key)
    }

    /// Number of declared fields, set or not.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fields in declaration order; unset fields are skipped unless strict.
    pub fn items(&self) -> impl Iterator<Item = (&str, &Slot)> + '_ {
        let strict = self.is_strict();
        self.values
            .iter()
            .filter(move |(_, slot)| strict || slot.is_set())
            .map(|(name, slot)| (name.as_str(), slot))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.items().map(|(name, _)| name)
    }

    pub fn values(&self) -> impl Iterator<Item = &Slot> + '_ {
        self.items().map(|(_, slot)| slot)
    }

    /// Extra state attached outside the declared fields.
    pub fn extras(&self) -> impl Iterator<Item = (&str, &Slot)> + '_ {
        self.extras.iter().map(|(name, slot)| (name.as_str(), slot))
    }

    /// Human-readable form: `ClassName(name=repr, ...)`.
    pub fn repr(&self) -> String {
        let items: Vec<String> = self
            .items()
            .map(|(name, slot)| format!("{}={}", name, slot.repr()))
            .collect();
        format!("{}({})", self.class.name(), items.join(", "))
    }

    /// JSON-safe form of the items, with values passed through the encoders.
    pub fn to_json(&self) -> SchemaResult<serde_json::Value> {
        let policy = self.policy();
        let mut items = Vec::with_capacity(self.values.len());
        for (name, slot) in self.items() {
            let value = slot
                .as_value()
                .ok_or_else(|| SchemaError::unsupported_encoding("UNSET"))?;
            items.push((name, value));
        }
        render::to_json_object(items, &|v| policy.encode(v))
    }

    /// JSON text of the items.
    pub fn to_json_string(&self) -> SchemaResult<String> {
        render::to_text(&self.to_json()?)
    }

    /// Builds a new instance of the same class from the set values,
    /// running them through coercion again.
    pub fn copy(&self) -> SchemaResult<Self> {
        let named = self
            .values
            .iter()
            .filter_map(|(name, slot)| slot.as_value().map(|v| (name.clone(), v.clone())));
        Self::new(&self.class, Arguments::named(named))
    }

    /// Stores values for declared fields as-is.
    ///
    /// No coercion and no mutability check. Under a strict policy, any
    /// undeclared key rejects the whole update.
    pub fn update<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>) -> SchemaResult<()>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let data: Vec<(String, Value)> = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if self.is_strict() {
            let rejected: Vec<&str> = data
                .iter()
                .map(|(k, _)| k.as_str())
                .filter(|k| !self.values.contains_key(*k))
                .collect();
            if !rejected.is_empty() {
                return Err(SchemaError::update_rejected(self.class.name(), &rejected));
            }
        }

        for (key, value) in data {
            if let Some(slot) = self.values.get_mut(&key) {
                *slot = Slot::Value(value);
            }
        }
        Ok(())
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.class, &other.class) && self.repr() == other.repr()
    }
}

impl Eq for Instance {}

impl Hash for Instance {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.class.name().hash(state);
        self.repr().hash(state);
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::errors::SchemaErrorCode;
    use crate::schema::types::ConcreteType;

    fn model() -> Arc<SchemaClass> {
        SchemaClass::builder("M")
            .field("number", ConcreteType::Int)
            .field_with_default("default", ConcreteType::Float, 0.0)
            .build()
    }

    #[test]
    fn test_repr_skips_unset_fields() {
        let m = model().named([("number", 1)]).unwrap();
        assert_eq!(m.repr(), "M(number=1, default=0.0)");
        let empty = model().named(Vec::<(&str, Value)>::new()).unwrap();
        assert_eq!(empty.repr(), "M(default=0.0)");
        assert_eq!(empty.len(), 2);
        assert_eq!(empty.keys().count(), 1);
    }

    #[test]
    fn test_positional_and_named_together_rejected() {
        let args = Arguments::new().arg(1).kwarg("default", 2.0);
        let err = Instance::new(&model(), args).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::ArgumentShape);
    }

    #[test]
    fn test_positional_excess_dropped_when_lenient() {
        let m = model()
            .positional([Value::Int(1), Value::Float(2.0), Value::Int(3)])
            .unwrap();
        assert_eq!(m.repr(), "M(number=1, default=2.0)");
        assert_eq!(m.extras().count(), 0);
    }

    #[test]
    fn test_coercion_on_construction() {
        let m = model()
            .named([("number", Value::Str("7".into())), ("default", Value::Int(1))])
            .unwrap();
        assert_eq!(m.value("number"), Some(&Value::Int(7)));
        assert_eq!(m.value("default"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_type_mismatch_names_types() {
        let err = model()
            .named([("number", Value::Str("seven".into()))])
            .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::TypeMismatch);
        assert!(err.message().contains("<int>"));
        assert!(err.message().contains("<str>"));
        assert_eq!(err.fields(), &["number".to_string()]);
    }

    #[test]
    fn test_no_decoder_for_non_constructible_type() {
        let class = SchemaClass::builder("N")
            .field("nothing", ConcreteType::Null)
            .build();
        let err = class.named([("nothing", 1)]).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::NoDecoderAvailable);
        assert!(class.named([("nothing", Value::Null)]).is_ok());
    }

    #[test]
    fn test_update_skips_coercion() {
        let mut m = model().named([("number", 1)]).unwrap();
        m.update([("number", Value::Str("raw".into())), ("other", Value::Int(2))])
            .unwrap();
        assert_eq!(m.value("number"), Some(&Value::Str("raw".into())));
        assert!(!m.contains("other"));
    }

    #[test]
    fn test_copy_is_equal() {
        let m = model().named([("number", 1)]).unwrap();
        let copy = m.copy().unwrap();
        assert_eq!(m, copy);
    }

    #[test]
    fn test_to_json_string() {
        let m = model().named([("number", 1)]).unwrap();
        assert_eq!(
            m.to_json_string().unwrap(),
            "{\"number\": 1, \"default\": 0.0}"
        );
    }

    #[test]
    fn test_from_json_shapes() {
        let class = model();
        let named = Instance::from_json(&class, serde_json::json!({"number": 3})).unwrap();
        let positional = Instance::from_json(&class, serde_json::json!([3, 0.0])).unwrap();
        assert_eq!(named, positional);
        let err = Instance::from_json(&class, serde_json::json!(3)).unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::ShapeMismatch);
    }
}
