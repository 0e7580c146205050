//! Runtime values carried by schema instances
//!
//! `Value` is the dynamic value model: JSON-native variants plus the domain
//! types the default encoders know how to flatten (calendar types, uuids,
//! decimals, enums, byte strings, durations, sets and lazy sequences).

use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::instance::Instance;

/// Identity of a runtime type, used as the key of decoder and encoder registries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    List,
    Tuple,
    Set,
    FrozenSet,
    Dict,
    /// Values produced by an iterator rather than stored as a list
    Sequence,
    Date,
    Time,
    DateTime,
    Duration,
    Uuid,
    Decimal,
    /// Common ancestor of every enumeration
    Enum,
    /// A specific enumeration, by name
    Enumeration(String),
    /// A schema class, by name. Decoders and encoders registered for one
    /// class also apply to any other class built with the same name, so class
    /// names should be unique within a process.
    Class(String),
}

impl TypeKey {
    /// Returns the type name for messages and textual forms
    pub fn name(&self) -> &str {
        match self {
            TypeKey::Null => "null",
            TypeKey::Bool => "bool",
            TypeKey::Int => "int",
            TypeKey::Float => "float",
            TypeKey::Str => "str",
            TypeKey::Bytes => "bytes",
            TypeKey::List => "list",
            TypeKey::Tuple => "tuple",
            TypeKey::Set => "set",
            TypeKey::FrozenSet => "frozenset",
            TypeKey::Dict => "dict",
            TypeKey::Sequence => "sequence",
            TypeKey::Date => "date",
            TypeKey::Time => "time",
            TypeKey::DateTime => "datetime",
            TypeKey::Duration => "duration",
            TypeKey::Uuid => "uuid",
            TypeKey::Decimal => "decimal",
            TypeKey::Enum => "enum",
            TypeKey::Enumeration(name) => name,
            TypeKey::Class(name) => name,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An enumeration type: an ordered list of named members with values.
#[derive(Debug, PartialEq)]
pub struct EnumType {
    name: String,
    members: Vec<(String, Value)>,
    int_like: bool,
}

impl EnumType {
    /// Creates an enumeration with explicit member values.
    pub fn new<N, M>(name: impl Into<String>, members: M) -> Arc<Self>
    where
        N: Into<String>,
        M: IntoIterator<Item = (N, Value)>,
    {
        Arc::new(Self {
            name: name.into(),
            members: members.into_iter().map(|(n, v)| (n.into(), v)).collect(),
            int_like: false,
        })
    }

    /// Creates an enumeration whose members are numbered from 1.
    pub fn auto<N: Into<String>>(
        name: impl Into<String>,
        names: impl IntoIterator<Item = N>,
    ) -> Arc<Self> {
        Self::new(name, numbered(names))
    }

    /// Creates an integer enumeration: members are numbered from 1 and
    /// members also count as `int` values.
    pub fn int_enum<N: Into<String>>(
        name: impl Into<String>,
        names: impl IntoIterator<Item = N>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            members: numbered(names),
            int_like: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_int_like(&self) -> bool {
        self.int_like
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Looks a member up by name.
    pub fn member(self: &Arc<Self>, name: &str) -> Option<EnumMember> {
        self.members
            .iter()
            .position(|(n, _)| n == name)
            .map(|index| EnumMember {
                ty: Arc::clone(self),
                index,
            })
    }

    /// Looks a member up by value, first match wins.
    pub fn by_value(self: &Arc<Self>, value: &Value) -> Option<EnumMember> {
        self.members
            .iter()
            .position(|(_, v)| v == value)
            .map(|index| EnumMember {
                ty: Arc::clone(self),
                index,
            })
    }

    pub fn type_key(&self) -> TypeKey {
        TypeKey::Enumeration(self.name.clone())
    }
}

fn numbered<N: Into<String>>(names: impl IntoIterator<Item = N>) -> Vec<(String, Value)> {
    names
        .into_iter()
        .enumerate()
        .map(|(i, n)| (n.into(), Value::Int(i as i64 + 1)))
        .collect()
}

/// A member of an [`EnumType`].
#[derive(Debug, Clone)]
pub struct EnumMember {
    ty: Arc<EnumType>,
    index: usize,
}

impl EnumMember {
    pub fn enum_type(&self) -> &Arc<EnumType> {
        &self.ty
    }

    pub fn name(&self) -> &str {
        &self.ty.members[self.index].0
    }

    pub fn value(&self) -> &Value {
        &self.ty.members[self.index].1
    }
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ty, &other.ty) && self.index == other.index
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    FrozenSet(Vec<Value>),
    Dict(IndexMap<String, Value>),
    Sequence(Vec<Value>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Duration(Duration),
    Uuid(Uuid),
    Decimal(Decimal),
    Enum(EnumMember),
    Instance(Box<Instance>),
}

impl Value {
    /// Builds a set, dropping repeated elements while keeping first-seen order.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(dedup(items))
    }

    /// Builds a frozen set, dropping repeated elements.
    pub fn frozen_set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::FrozenSet(dedup(items))
    }

    /// Drains an iterator into a lazy-sequence value.
    pub fn sequence(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Sequence(items.into_iter().collect())
    }

    /// Builds a mapping value from key/value pairs.
    pub fn dict<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Dict(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns the exact runtime type of this value
    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::Null => TypeKey::Null,
            Value::Bool(_) => TypeKey::Bool,
            Value::Int(_) => TypeKey::Int,
            Value::Float(_) => TypeKey::Float,
            Value::Str(_) => TypeKey::Str,
            Value::Bytes(_) => TypeKey::Bytes,
            Value::List(_) => TypeKey::List,
            Value::Tuple(_) => TypeKey::Tuple,
            Value::Set(_) => TypeKey::Set,
            Value::FrozenSet(_) => TypeKey::FrozenSet,
            Value::Dict(_) => TypeKey::Dict,
            Value::Sequence(_) => TypeKey::Sequence,
            Value::Date(_) => TypeKey::Date,
            Value::Time(_) => TypeKey::Time,
            Value::DateTime(_) => TypeKey::DateTime,
            Value::Duration(_) => TypeKey::Duration,
            Value::Uuid(_) => TypeKey::Uuid,
            Value::Decimal(_) => TypeKey::Decimal,
            Value::Enum(member) => member.enum_type().type_key(),
            Value::Instance(instance) => TypeKey::Class(instance.class().name().to_string()),
        }
    }

    /// Returns the runtime type name for error messages
    pub fn type_name(&self) -> String {
        self.type_key().name().to_string()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumMember> {
        match self {
            Value::Enum(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Returns the elements of any list-like value
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Value::List(items)
            | Value::Tuple(items)
            | Value::Set(items)
            | Value::FrozenSet(items)
            | Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness, as used when building a `bool` from another value.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::Dict(d) => !d.is_empty(),
            Value::Duration(d) => !d.is_zero(),
            Value::Decimal(d) => !d.is_zero(),
            other => other.elements().map_or(true, |items| !items.is_empty()),
        }
    }

    /// Human-readable representation used by instance textual forms.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_repr(&mut out);
        out
    }

    fn write_repr(&self, out: &mut String) -> fmt::Result {
        match self {
            Value::Null => out.write_str("null"),
            Value::Bool(b) => write!(out, "{}", b),
            Value::Int(i) => write!(out, "{}", i),
            Value::Float(f) => write!(out, "{:?}", f),
            Value::Str(s) => write!(out, "{:?}", s),
            Value::Bytes(bytes) => {
                out.write_str("b\"")?;
                for b in bytes {
                    write!(out, "{}", std::ascii::escape_default(*b))?;
                }
                out.write_char('"')
            }
            Value::List(items) => write_items(out, "[", items, "]"),
            Value::Tuple(items) if items.len() == 1 => write_items(out, "(", items, ",)"),
            Value::Tuple(items) => write_items(out, "(", items, ")"),
            Value::Set(items) => write_items(out, "{", items, "}"),
            Value::FrozenSet(items) => write_items(out, "frozenset({", items, "})"),
            Value::Sequence(items) => write_items(out, "sequence[", items, "]"),
            Value::Dict(map) => {
                out.write_char('{')?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    write!(out, "{:?}: ", k)?;
                    v.write_repr(out)?;
                }
                out.write_char('}')
            }
            Value::Date(d) => write!(out, "{}", d),
            Value::Time(t) => write!(out, "{}", t),
            Value::DateTime(dt) => write!(out, "{}", dt),
            Value::Duration(d) => write!(out, "{}", d),
            Value::Uuid(u) => write!(out, "{}", u),
            Value::Decimal(d) => write!(out, "{}", d),
            Value::Enum(m) => write!(out, "{}::{}", m.enum_type().name(), m.name()),
            Value::Instance(instance) => out.write_str(&instance.repr()),
        }
    }
}

fn write_items(out: &mut String, open: &str, items: &[Value], close: &str) -> fmt::Result {
    out.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.write_str(", ")?;
        }
        item.write_repr(out)?;
    }
    out.write_str(close)
}

fn dedup(items: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

/// Converts parsed JSON into a `Value`.
///
/// Integers outside the `i64` range (large `u64` values or arbitrary
/// precision numbers) become a `Float` and lose precision.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Dict(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    f64 => Float,
    String => Str,
    &str => Str,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    Duration => Duration,
    Uuid => Uuid,
    Decimal => Decimal,
    EnumMember => Enum,
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(Box::new(instance))
    }
}
