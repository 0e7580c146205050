//! Declared type specifiers
//!
//! A field's declared type is one of:
//! - a concrete value type (`int`, `str`, `date`, an enumeration, ...)
//! - another schema class, built from a mapping
//! - a converter function applied to the raw value

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Duration;
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::errors::ConversionError;
use super::registrar::SchemaClass;
use super::value::{EnumType, TypeKey, Value};

/// Concrete value types a field can be declared with.
#[derive(Debug, Clone, PartialEq)]
pub enum ConcreteType {
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
    Sequence,
    Date,
    Time,
    DateTime,
    Duration,
    Uuid,
    Decimal,
    Enum(Arc<EnumType>),
}

impl ConcreteType {
    /// Resolves a built-in type name as used in declarations
    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "null" | "none" => ConcreteType::Null,
            "bool" => ConcreteType::Bool,
            "int" => ConcreteType::Int,
            "float" => ConcreteType::Float,
            "str" | "string" => ConcreteType::Str,
            "bytes" => ConcreteType::Bytes,
            "list" => ConcreteType::List,
            "tuple" => ConcreteType::Tuple,
            "set" => ConcreteType::Set,
            "frozenset" => ConcreteType::FrozenSet,
            "dict" => ConcreteType::Dict,
            "sequence" => ConcreteType::Sequence,
            "date" => ConcreteType::Date,
            "time" => ConcreteType::Time,
            "datetime" => ConcreteType::DateTime,
            "duration" => ConcreteType::Duration,
            "uuid" => ConcreteType::Uuid,
            "decimal" => ConcreteType::Decimal,
            _ => return None,
        };
        Some(ty)
    }

    /// Returns the registry key of this type
    pub fn key(&self) -> TypeKey {
        match self {
            ConcreteType::Null => TypeKey::Null,
            ConcreteType::Bool => TypeKey::Bool,
            ConcreteType::Int => TypeKey::Int,
            ConcreteType::Float => TypeKey::Float,
            ConcreteType::Str => TypeKey::Str,
            ConcreteType::Bytes => TypeKey::Bytes,
            ConcreteType::List => TypeKey::List,
            ConcreteType::Tuple => TypeKey::Tuple,
            ConcreteType::Set => TypeKey::Set,
            ConcreteType::FrozenSet => TypeKey::FrozenSet,
            ConcreteType::Dict => TypeKey::Dict,
            ConcreteType::Sequence => TypeKey::Sequence,
            ConcreteType::Date => TypeKey::Date,
            ConcreteType::Time => TypeKey::Time,
            ConcreteType::DateTime => TypeKey::DateTime,
            ConcreteType::Duration => TypeKey::Duration,
            ConcreteType::Uuid => TypeKey::Uuid,
            ConcreteType::Decimal => TypeKey::Decimal,
            ConcreteType::Enum(ty) => ty.type_key(),
        }
    }

    /// Whether values of this type can be built from another value.
    ///
    /// The null type and lazy sequences have no constructor; fields declared
    /// with them only accept matching values or a registered decoder.
    pub fn is_constructible(&self) -> bool {
        !matches!(self, ConcreteType::Null | ConcreteType::Sequence)
    }

    /// Builds a value of this type from `raw`.
    pub fn construct(&self, raw: &Value) -> Result<Value, ConversionError> {
        let unconvertible = || ConversionError::unconvertible(raw.type_name(), self.key().name());
        match self {
            ConcreteType::Null | ConcreteType::Sequence => Err(unconvertible()),
            ConcreteType::Bool => Ok(Value::Bool(raw.is_truthy())),
            ConcreteType::Int => match raw {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::Bool(b) => Ok(Value::Int(*b as i64)),
                Value::Float(f) => f.to_i64().map(Value::Int).ok_or_else(unconvertible),
                Value::Str(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| ConversionError::invalid_literal("int", s.as_str())),
                Value::Decimal(d) => d.trunc().to_i64().map(Value::Int).ok_or_else(unconvertible),
                Value::Enum(m) if m.enum_type().is_int_like() => Ok(m.value().clone()),
                _ => Err(unconvertible()),
            },
            ConcreteType::Float => match raw {
                Value::Float(f) => Ok(Value::Float(*f)),
                Value::Int(i) => Ok(Value::Float(*i as f64)),
                Value::Bool(b) => Ok(Value::Float(if *b { 1.0 } else { 0.0 })),
                Value::Str(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| ConversionError::invalid_literal("float", s.as_str())),
                Value::Decimal(d) => d.to_f64().map(Value::Float).ok_or_else(unconvertible),
                _ => Err(unconvertible()),
            },
            ConcreteType::Str => match raw {
                Value::Str(s) => Ok(Value::Str(s.clone())),
                other => Ok(Value::Str(other.repr())),
            },
            ConcreteType::Bytes => match raw {
                Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
                Value::Str(s) => Ok(Value::Bytes(s.as_bytes().to_vec())),
                other => {
                    let items = other.elements().ok_or_else(unconvertible)?;
                    items
                        .iter()
                        .map(|item| match item {
                            Value::Int(i) => u8::try_from(*i).map_err(|_| unconvertible()),
                            _ => Err(unconvertible()),
                        })
                        .collect::<Result<Vec<u8>, _>>()
                        .map(Value::Bytes)
                }
            },
            ConcreteType::List => iterate(raw).map(Value::List).ok_or_else(unconvertible),
            ConcreteType::Tuple => iterate(raw).map(Value::Tuple).ok_or_else(unconvertible),
            ConcreteType::Set => iterate(raw).map(Value::set).ok_or_else(unconvertible),
            ConcreteType::FrozenSet => iterate(raw).map(Value::frozen_set).ok_or_else(unconvertible),
            ConcreteType::Dict => match raw {
                Value::Dict(map) => Ok(Value::Dict(map.clone())),
                Value::Instance(instance) => Ok(Value::Dict(
                    instance
                        .items()
                        .filter_map(|(k, slot)| slot.as_value().map(|v| (k.to_string(), v.clone())))
                        .collect(),
                )),
                other => {
                    let items = other.elements().ok_or_else(unconvertible)?;
                    let mut map = IndexMap::with_capacity(items.len());
                    for item in items {
                        match item.elements() {
                            Some([Value::Str(k), v]) => {
                                map.insert(k.clone(), v.clone());
                            }
                            _ => {
                                return Err(ConversionError::Custom(format!(
                                    "dictionary update element {} is not a (str, value) pair",
                                    item.repr()
                                )))
                            }
                        }
                    }
                    Ok(Value::Dict(map))
                }
            },
            ConcreteType::Date => match raw {
                Value::Date(d) => Ok(Value::Date(*d)),
                _ => Err(unconvertible()),
            },
            ConcreteType::Time => match raw {
                Value::Time(t) => Ok(Value::Time(*t)),
                _ => Err(unconvertible()),
            },
            ConcreteType::DateTime => match raw {
                Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
                _ => Err(unconvertible()),
            },
            ConcreteType::Duration => match raw {
                Value::Duration(d) => Ok(Value::Duration(*d)),
                Value::Int(secs) => Duration::try_seconds(*secs)
                    .map(Value::Duration)
                    .ok_or_else(unconvertible),
                Value::Float(secs) => (secs * 1e6)
                    .round()
                    .to_i64()
                    .map(|micros| Value::Duration(Duration::microseconds(micros)))
                    .ok_or_else(unconvertible),
                _ => Err(unconvertible()),
            },
            ConcreteType::Uuid => match raw {
                Value::Uuid(u) => Ok(Value::Uuid(*u)),
                Value::Str(s) => Uuid::parse_str(s)
                    .map(Value::Uuid)
                    .map_err(|_| ConversionError::invalid_literal("uuid", s.as_str())),
                Value::Bytes(b) => Uuid::from_slice(b)
                    .map(Value::Uuid)
                    .map_err(|_| unconvertible()),
                _ => Err(unconvertible()),
            },
            ConcreteType::Decimal => match raw {
                Value::Decimal(d) => Ok(Value::Decimal(*d)),
                Value::Int(i) => Ok(Value::Decimal(Decimal::from(*i))),
                Value::Float(f) => Decimal::try_from(*f)
                    .map(Value::Decimal)
                    .map_err(|_| unconvertible()),
                Value::Str(s) => Decimal::from_str(s.trim())
                    .map(Value::Decimal)
                    .map_err(|_| ConversionError::invalid_literal("decimal", s.as_str())),
                _ => Err(unconvertible()),
            },
            ConcreteType::Enum(ty) => ty
                .by_value(raw)
                .map(Value::Enum)
                .ok_or_else(|| {
                    ConversionError::Custom(format!("{} is not a valid {}", raw.repr(), ty.name()))
                }),
        }
    }
}

/// Elements of an iterable value, as the list-like constructors see them.
fn iterate(raw: &Value) -> Option<Vec<Value>> {
    match raw {
        Value::Str(s) => Some(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Bytes(b) => Some(b.iter().map(|byte| Value::Int(*byte as i64)).collect()),
        Value::Dict(map) => Some(map.keys().map(|k| Value::Str(k.clone())).collect()),
        other => other.elements().map(<[Value]>::to_vec),
    }
}

/// Signature shared by decoders, encoders and converters.
pub type ConvertFn = dyn Fn(&Value) -> Result<Value, ConversionError> + Send + Sync;

/// A named single-argument function used as a field's declared type.
#[derive(Clone)]
pub struct Converter {
    name: String,
    func: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, raw: &Value) -> Result<Value, ConversionError> {
        (self.func)(raw)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").field("name", &self.name).finish()
    }
}

/// Declared type of a field.
#[derive(Debug, Clone)]
pub enum TypeSpec {
    Concrete(ConcreteType),
    Nested(Arc<SchemaClass>),
    Converter(Converter),
}

impl TypeSpec {
    /// Registry key for decoder lookup; converters have none.
    ///
    /// Nested classes are keyed by name, unlike instance equality, which
    /// compares class identity.
    pub fn key(&self) -> Option<TypeKey> {
        match self {
            TypeSpec::Concrete(ty) => Some(ty.key()),
            TypeSpec::Nested(class) => Some(TypeKey::Class(class.name().to_string())),
            TypeSpec::Converter(_) => None,
        }
    }

    /// Returns the type name for error messages
    pub fn name(&self) -> String {
        match self {
            TypeSpec::Concrete(ty) => ty.key().name().to_string(),
            TypeSpec::Nested(class) => class.name().to_string(),
            TypeSpec::Converter(conv) => conv.name().to_string(),
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<ConcreteType> for TypeSpec {
    fn from(ty: ConcreteType) -> Self {
        TypeSpec::Concrete(ty)
    }
}

impl From<Arc<SchemaClass>> for TypeSpec {
    fn from(class: Arc<SchemaClass>) -> Self {
        TypeSpec::Nested(class)
    }
}

impl From<&Arc<SchemaClass>> for TypeSpec {
    fn from(class: &Arc<SchemaClass>) -> Self {
        TypeSpec::Nested(Arc::clone(class))
    }
}

impl From<Arc<EnumType>> for TypeSpec {
    fn from(ty: Arc<EnumType>) -> Self {
        TypeSpec::Concrete(ConcreteType::Enum(ty))
    }
}

impl From<Converter> for TypeSpec {
    fn from(conv: Converter) -> Self {
        TypeSpec::Converter(conv)
    }
}

/// A field declaration: name, declared type and optional default.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub spec: TypeSpec,
    pub default: Option<Value>,
}

impl FieldDecl {
    /// A field without a default
    pub fn required(name: impl Into<String>, spec: impl Into<TypeSpec>) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            default: None,
        }
    }

    /// A field with a default value
    pub fn with_default(
        name: impl Into<String>,
        spec: impl Into<TypeSpec>,
        default: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            default: Some(default.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_from_text() {
        assert_eq!(
            ConcreteType::Int.construct(&Value::Str("1".into())),
            Ok(Value::Int(1))
        );
        assert!(ConcreteType::Int.construct(&Value::Str("one".into())).is_err());
        assert!(ConcreteType::Int.construct(&Value::List(vec![])).is_err());
    }

    #[test]
    fn test_int_from_float_truncates_within_range() {
        assert_eq!(ConcreteType::Int.construct(&Value::Float(-2.7)), Ok(Value::Int(-2)));
        for f in [1e300, -1e300, 9.3e18, f64::NAN, f64::INFINITY] {
            assert!(ConcreteType::Int.construct(&Value::Float(f)).is_err(), "{f}");
        }
    }

    #[test]
    fn test_duration_out_of_range_is_rejected() {
        assert_eq!(
            ConcreteType::Duration.construct(&Value::Int(90)),
            Ok(Value::Duration(Duration::seconds(90)))
        );
        for secs in [i64::MAX, i64::MIN] {
            assert!(ConcreteType::Duration.construct(&Value::Int(secs)).is_err());
        }
        assert_eq!(
            ConcreteType::Duration.construct(&Value::Float(1.5)),
            Ok(Value::Duration(Duration::milliseconds(1500)))
        );
        for secs in [1e300, f64::NEG_INFINITY, f64::NAN] {
            assert!(ConcreteType::Duration.construct(&Value::Float(secs)).is_err());
        }
    }

    #[test]
    fn test_str_from_int() {
        assert_eq!(
            ConcreteType::Str.construct(&Value::Int(1)),
            Ok(Value::Str("1".into()))
        );
    }

    #[test]
    fn test_dict_from_pairs() {
        let pairs = Value::List(vec![Value::Tuple(vec![Value::Str("a".into()), Value::Int(1)])]);
        assert_eq!(
            ConcreteType::Dict.construct(&pairs),
            Ok(Value::dict([("a", Value::Int(1))]))
        );
        let bad = Value::List(vec![Value::Int(1)]);
        assert!(ConcreteType::Dict.construct(&bad).is_err());
    }

    #[test]
    fn test_enum_from_member_value() {
        let choice = EnumType::auto("Choice", ["yes", "no"]);
        let ty = ConcreteType::Enum(choice.clone());
        assert_eq!(
            ty.construct(&Value::Int(1)),
            Ok(Value::Enum(choice.member("yes").unwrap()))
        );
        assert!(ty.construct(&Value::Int(9)).is_err());
    }

    #[test]
    fn test_decimal_and_uuid_from_text() {
        let d = ConcreteType::Decimal.construct(&Value::Str("1.50".into())).unwrap();
        assert_eq!(d.repr(), "1.50");
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let u = ConcreteType::Uuid.construct(&Value::Str(raw.into())).unwrap();
        assert_eq!(u.repr(), raw);
    }

    #[test]
    fn test_non_constructible_types() {
        assert!(!ConcreteType::Null.is_constructible());
        assert!(!ConcreteType::Sequence.is_constructible());
        assert!(ConcreteType::Date.is_constructible());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ConcreteType::from_name("datetime"), Some(ConcreteType::DateTime));
        assert_eq!(ConcreteType::from_name("string"), Some(ConcreteType::Str));
        assert_eq!(ConcreteType::from_name("widget"), None);
    }

    #[test]
    fn test_converter_has_no_registry_key() {
        let conv = Converter::new("NewInt", |v| ConcreteType::Int.construct(v));
        let spec = TypeSpec::from(conv);
        assert!(spec.key().is_none());
        assert_eq!(spec.name(), "NewInt");
    }
}
