//! Type-hierarchy walk over runtime values
//!
//! Enumerates a value's runtime type followed by its ancestor types in
//! declaration order:
//! - `bool` descends from `int`
//! - `datetime` descends from `date`
//! - every enumeration descends from `enum`; integer enumerations also from `int`
//! - a schema instance walks its class ancestors in resolution order
//!
//! Class keys carry the class name, so names must be unique within a
//! process; [`SchemaRegistry`](super::SchemaRegistry) enforces that.

use std::sync::Arc;

use super::registrar::SchemaClass;
use super::value::{TypeKey, Value};

/// Returns the runtime type of `value` followed by all of its ancestors.
pub fn walk(value: &Value) -> Vec<TypeKey> {
    let mut keys = vec![value.type_key()];
    keys.extend(ancestors(value));
    keys
}

/// Returns the ancestors of the runtime type of `value`, nearest first.
pub fn ancestors(value: &Value) -> Vec<TypeKey> {
    match value {
        Value::Bool(_) => vec![TypeKey::Int],
        Value::DateTime(_) => vec![TypeKey::Date],
        Value::Enum(member) if member.enum_type().is_int_like() => {
            vec![TypeKey::Int, TypeKey::Enum]
        }
        Value::Enum(_) => vec![TypeKey::Enum],
        Value::Instance(instance) => class_ancestors(instance.class()),
        _ => Vec::new(),
    }
}

/// Returns the ancestor classes of `class` as type keys, nearest first.
pub fn class_ancestors(class: &Arc<SchemaClass>) -> Vec<TypeKey> {
    class
        .ancestors()
        .iter()
        .map(|ancestor| TypeKey::Class(ancestor.name().to_string()))
        .collect()
}

/// Returns whether `value` is an instance of `class` or one of its subclasses.
pub fn is_instance_of(value: &Value, class: &Arc<SchemaClass>) -> bool {
    match value {
        Value::Instance(instance) => {
            Arc::ptr_eq(instance.class(), class) || instance.class().is_subclass_of(class)
        }
        _ => false,
    }
}

/// Returns whether the runtime type of `value`, or an ancestor, is `key`.
pub fn satisfies(value: &Value, key: &TypeKey) -> bool {
    walk(value).iter().any(|k| k == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ConcreteType, TypeSpec};
    use crate::schema::value::EnumType;
    use chrono::NaiveDate;

    #[test]
    fn test_scalar_walks() {
        assert_eq!(walk(&Value::Bool(true)), vec![TypeKey::Bool, TypeKey::Int]);
        assert_eq!(walk(&Value::Int(1)), vec![TypeKey::Int]);
        let dt = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(
            walk(&Value::DateTime(dt)),
            vec![TypeKey::DateTime, TypeKey::Date]
        );
    }

    #[test]
    fn test_enum_walks() {
        let choice = EnumType::auto("Choice", ["yes", "no"]);
        let tiny = EnumType::int_enum("TinyInt", ["one", "two"]);
        assert_eq!(
            walk(&Value::Enum(choice.member("yes").unwrap())),
            vec![TypeKey::Enumeration("Choice".into()), TypeKey::Enum]
        );
        assert_eq!(
            ancestors(&Value::Enum(tiny.member("one").unwrap())),
            vec![TypeKey::Int, TypeKey::Enum]
        );
    }

    #[test]
    fn test_instance_walks_all_bases() {
        let root = SchemaClass::builder("Root")
            .field("a", TypeSpec::Concrete(ConcreteType::Int))
            .build();
        let middle = SchemaClass::builder("Middle").base(&root).build();
        let other = SchemaClass::builder("Other").build();
        let leaf = SchemaClass::builder("Leaf")
            .base(&middle)
            .base(&other)
            .build();

        let instance = leaf.named(Vec::<(&str, Value)>::new()).unwrap();
        let keys = walk(&Value::from(instance));
        assert_eq!(
            keys,
            vec![
                TypeKey::Class("Leaf".into()),
                TypeKey::Class("Middle".into()),
                TypeKey::Class("Root".into()),
                TypeKey::Class("Other".into()),
            ]
        );
    }

    #[test]
    fn test_same_named_classes_are_distinct() {
        let first = SchemaClass::builder("Model").build();
        let second = SchemaClass::builder("Model").build();
        let instance = first.named(Vec::<(&str, Value)>::new()).unwrap();
        let value = Value::from(instance);
        assert!(is_instance_of(&value, &first));
        assert!(!is_instance_of(&value, &second));
    }

    #[test]
    fn test_satisfies() {
        assert!(satisfies(&Value::Bool(false), &TypeKey::Int));
        assert!(!satisfies(&Value::Int(1), &TypeKey::Bool));
        assert!(!satisfies(&Value::Str("1".into()), &TypeKey::Int));
    }
}
