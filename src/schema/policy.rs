//! Conversion policy: strict/mutable flags plus decoder and encoder registries
//!
//! Every policy starts from a copy of the process-wide default registries;
//! overrides are merged on top of the copy, so the defaults themselves are
//! never mutated.

use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;

use super::errors::{ConversionError, SchemaError, SchemaResult};
use super::hierarchy;
use super::iso::{self, CalendarKind};
use super::types::ConvertFn;
use super::value::{TypeKey, Value};
use crate::observability::{log_event_with_fields, Event};

/// A shared decoder or encoder function.
pub type Codec = Arc<ConvertFn>;

struct Defaults {
    decoders: IndexMap<TypeKey, Codec>,
    encoders: IndexMap<TypeKey, Codec>,
}

fn defaults() -> &'static Defaults {
    static DEFAULTS: OnceLock<Defaults> = OnceLock::new();
    DEFAULTS.get_or_init(|| Defaults {
        decoders: default_decoders(),
        encoders: default_encoders(),
    })
}

fn default_decoders() -> IndexMap<TypeKey, Codec> {
    let mut decoders: IndexMap<TypeKey, Codec> = IndexMap::new();
    decoders.insert(TypeKey::Date, Arc::new(iso::parser(CalendarKind::Date)));
    decoders.insert(TypeKey::Time, Arc::new(iso::parser(CalendarKind::Time)));
    decoders.insert(TypeKey::DateTime, Arc::new(iso::parser(CalendarKind::DateTime)));
    decoders
}

fn default_encoders() -> IndexMap<TypeKey, Codec> {
    let to_list: Codec = Arc::new(|v: &Value| {
        v.elements()
            .map(|items| Value::List(items.to_vec()))
            .ok_or_else(|| ConversionError::unconvertible(v.type_name(), "list"))
    });
    let to_text: Codec = Arc::new(|v: &Value| Ok(Value::Str(v.repr())));

    let mut encoders: IndexMap<TypeKey, Codec> = IndexMap::new();
    encoders.insert(
        TypeKey::Uuid,
        Arc::new(|v: &Value| match v {
            Value::Uuid(u) => Ok(Value::Str(u.to_string())),
            other => Err(ConversionError::unconvertible(other.type_name(), "str")),
        }),
    );
    encoders.insert(
        TypeKey::Decimal,
        Arc::new(|v: &Value| match v {
            Value::Decimal(d) => d
                .to_f64()
                .map(Value::Float)
                .ok_or_else(|| ConversionError::unconvertible("decimal", "float")),
            other => Err(ConversionError::unconvertible(other.type_name(), "float")),
        }),
    );
    encoders.insert(TypeKey::Set, Arc::clone(&to_list));
    encoders.insert(TypeKey::FrozenSet, Arc::clone(&to_list));
    encoders.insert(TypeKey::Sequence, to_list);
    encoders.insert(TypeKey::Date, Arc::clone(&to_text));
    encoders.insert(TypeKey::Time, Arc::clone(&to_text));
    encoders.insert(TypeKey::DateTime, to_text);
    encoders.insert(
        TypeKey::Enum,
        Arc::new(|v: &Value| match v {
            Value::Enum(member) => Ok(member.value().clone()),
            other => Err(ConversionError::unconvertible(other.type_name(), "enum")),
        }),
    );
    encoders.insert(
        TypeKey::Bytes,
        Arc::new(|v: &Value| match v {
            Value::Bytes(bytes) => String::from_utf8(bytes.clone())
                .map(Value::Str)
                .map_err(|e| ConversionError::Custom(e.to_string())),
            other => Err(ConversionError::unconvertible(other.type_name(), "str")),
        }),
    );
    encoders.insert(
        TypeKey::Duration,
        Arc::new(|v: &Value| match v {
            Value::Duration(d) => Ok(Value::Float(
                d.num_seconds() as f64 + d.subsec_nanos() as f64 / 1e9,
            )),
            other => Err(ConversionError::unconvertible(other.type_name(), "float")),
        }),
    );
    encoders
}

fn same_fn(a: &Codec, b: &Codec) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Registry entries that differ from the defaults.
fn overrides(
    registry: &IndexMap<TypeKey, Codec>,
    defaults: &IndexMap<TypeKey, Codec>,
) -> Vec<(TypeKey, Codec)> {
    registry
        .iter()
        .filter(|(key, codec)| defaults.get(*key).map_or(true, |d| !same_fn(d, codec)))
        .map(|(key, codec)| (key.clone(), Arc::clone(codec)))
        .collect()
}

/// A policy setting that differs from the defaults.
#[derive(Clone)]
pub enum PolicyOption {
    Strict(bool),
    Mutable(bool),
    Encoders(Vec<(TypeKey, Codec)>),
    Decoders(Vec<(TypeKey, Codec)>),
}

impl PolicyOption {
    pub fn name(&self) -> &'static str {
        match self {
            PolicyOption::Strict(_) => "strict",
            PolicyOption::Mutable(_) => "mutable",
            PolicyOption::Encoders(_) => "encoders",
            PolicyOption::Decoders(_) => "decoders",
        }
    }
}

impl PartialEq for PolicyOption {
    fn eq(&self, other: &Self) -> bool {
        let same_entries = |a: &[(TypeKey, Codec)], b: &[(TypeKey, Codec)]| {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|((ka, fa), (kb, fb))| ka == kb && same_fn(fa, fb))
        };
        match (self, other) {
            (PolicyOption::Strict(a), PolicyOption::Strict(b)) => a == b,
            (PolicyOption::Mutable(a), PolicyOption::Mutable(b)) => a == b,
            (PolicyOption::Encoders(a), PolicyOption::Encoders(b)) => same_entries(a, b),
            (PolicyOption::Decoders(a), PolicyOption::Decoders(b)) => same_entries(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for PolicyOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyOption::Strict(v) | PolicyOption::Mutable(v) => write!(f, "{}={}", self.name(), v),
            PolicyOption::Encoders(entries) | PolicyOption::Decoders(entries) => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.name()).collect();
                write!(f, "{}=[{}]", self.name(), keys.join(", "))
            }
        }
    }
}

impl fmt::Debug for PolicyOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Strictness, mutability and the conversion registries of a schema class.
#[derive(Clone)]
pub struct ConversionPolicy {
    strict: bool,
    mutable: bool,
    decoders: IndexMap<TypeKey, Codec>,
    encoders: IndexMap<TypeKey, Codec>,
}

impl Default for ConversionPolicy {
    fn default() -> Self {
        let defaults = defaults();
        Self {
            strict: false,
            mutable: false,
            decoders: defaults.decoders.clone(),
            encoders: defaults.encoders.clone(),
        }
    }
}

impl ConversionPolicy {
    pub fn builder() -> ConversionPolicyBuilder {
        ConversionPolicyBuilder::default()
    }

    /// Default policy with strict mode on.
    pub fn strict() -> Self {
        Self::builder().strict(true).build()
    }

    /// Default policy with mutation allowed.
    pub fn mutable() -> Self {
        Self::builder().mutable(true).build()
    }

    /// Returns the shared built-in decoder for `key`, if there is one.
    pub fn default_decoder(key: &TypeKey) -> Option<Codec> {
        defaults().decoders.get(key).cloned()
    }

    /// Returns the shared built-in encoder for `key`, if there is one.
    pub fn default_encoder(key: &TypeKey) -> Option<Codec> {
        defaults().encoders.get(key).cloned()
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    pub fn decoder(&self, key: &TypeKey) -> Option<&Codec> {
        self.decoders.get(key)
    }

    pub fn encoder(&self, key: &TypeKey) -> Option<&Codec> {
        self.encoders.get(key)
    }

    /// Runs the decoder registered for `declared`, if any.
    pub fn decode(
        &self,
        declared: &TypeKey,
        raw: &Value,
    ) -> Option<Result<Value, ConversionError>> {
        self.decoders.get(declared).map(|decoder| decoder(raw))
    }

    /// Converts `value` into something closer to JSON.
    ///
    /// Lookup order: the exact runtime type, then schema instances (as an
    /// ordered mapping of their items), then the ancestor types of the value.
    pub fn encode(&self, value: &Value) -> SchemaResult<Value> {
        let key = value.type_key();
        if let Some(encoder) = self.encoders.get(&key) {
            return encoder(value).map_err(|e| SchemaError::encode_failed(key.name(), &e));
        }

        if let Value::Instance(instance) = value {
            let mut map = IndexMap::with_capacity(instance.len());
            for (name, slot) in instance.items() {
                let v = slot
                    .as_value()
                    .ok_or_else(|| SchemaError::unsupported_encoding("UNSET"))?;
                map.insert(name.to_string(), v.clone());
            }
            return Ok(Value::Dict(map));
        }

        for base in hierarchy::ancestors(value) {
            if let Some(encoder) = self.encoders.get(&base) {
                return encoder(value).map_err(|e| SchemaError::encode_failed(key.name(), &e));
            }
        }

        Err(SchemaError::unsupported_encoding(key.name()))
    }

    /// Settings that differ from the defaults, in the order strict, mutable,
    /// encoders, decoders.
    pub fn options(&self) -> Vec<PolicyOption> {
        let defaults = defaults();
        let mut options = Vec::new();
        if self.strict {
            options.push(PolicyOption::Strict(self.strict));
        }
        if self.mutable {
            options.push(PolicyOption::Mutable(self.mutable));
        }
        let encoders = overrides(&self.encoders, &defaults.encoders);
        if !encoders.is_empty() {
            options.push(PolicyOption::Encoders(encoders));
        }
        let decoders = overrides(&self.decoders, &defaults.decoders);
        if !decoders.is_empty() {
            options.push(PolicyOption::Decoders(decoders));
        }
        options
    }
}

impl PartialEq for ConversionPolicy {
    fn eq(&self, other: &Self) -> bool {
        self.options() == other.options()
    }
}

impl fmt::Display for ConversionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options: Vec<String> = self.options().iter().map(|o| o.to_string()).collect();
        write!(f, "ConversionPolicy({})", options.join(", "))
    }
}

impl fmt::Debug for ConversionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Builder for [`ConversionPolicy`]; unset options keep their defaults.
#[derive(Default)]
pub struct ConversionPolicyBuilder {
    strict: bool,
    mutable: bool,
    decoders: Vec<(TypeKey, Codec)>,
    encoders: Vec<(TypeKey, Codec)>,
}

impl ConversionPolicyBuilder {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    /// Registers a decoder for a declared type.
    pub fn decoder<F>(self, key: TypeKey, decoder: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.shared_decoder(key, Arc::new(decoder))
    }

    /// Registers an encoder for a runtime type.
    pub fn encoder<F>(self, key: TypeKey, encoder: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        self.shared_encoder(key, Arc::new(encoder))
    }

    /// Registers an already shared decoder function.
    pub fn shared_decoder(mut self, key: TypeKey, decoder: Codec) -> Self {
        self.decoders.push((key, decoder));
        self
    }

    /// Registers an already shared encoder function.
    pub fn shared_encoder(mut self, key: TypeKey, encoder: Codec) -> Self {
        self.encoders.push((key, encoder));
        self
    }

    pub fn build(self) -> ConversionPolicy {
        let mut policy = ConversionPolicy {
            strict: self.strict,
            mutable: self.mutable,
            ..ConversionPolicy::default()
        };
        policy.decoders.extend(self.decoders);
        policy.encoders.extend(self.encoders);

        let options = policy.options();
        if !options.is_empty() {
            let rendered = policy.to_string();
            log_event_with_fields(Event::PolicyBuilt, &[("policy", rendered.as_str())]);
        }
        policy
    }
}
