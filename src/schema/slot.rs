//! Field slots and the unset sentinel

use std::fmt;

use super::value::Value;

/// Contents of a field slot: either a value or the unset marker.
///
/// `Slot::Unset` means "declared but never assigned" and is distinct from
/// `Value::Null`. Decoders and encoders never see it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot {
    #[default]
    Unset,
    Value(Value),
}

/// The unset marker.
pub const UNSET: Slot = Slot::Unset;

impl Slot {
    pub fn is_unset(&self) -> bool {
        matches!(self, Slot::Unset)
    }

    pub fn is_set(&self) -> bool {
        !self.is_unset()
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Slot::Value(v) => Some(v),
            Slot::Unset => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Slot::Value(v) => Some(v),
            Slot::Unset => None,
        }
    }

    /// Human-readable representation; the marker renders as `UNSET`.
    pub fn repr(&self) -> String {
        match self {
            Slot::Value(v) => v.repr(),
            Slot::Unset => "UNSET".to_string(),
        }
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Value(value)
    }
}

impl From<Option<Value>> for Slot {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Slot::Unset, Slot::Value)
    }
}

impl PartialEq<Value> for Slot {
    fn eq(&self, other: &Value) -> bool {
        self.as_value() == Some(other)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_not_null() {
        assert_ne!(UNSET, Slot::Value(Value::Null));
        assert!(UNSET.is_unset());
        assert!(Slot::Value(Value::Null).is_set());
    }

    #[test]
    fn test_unset_renders_marker() {
        assert_eq!(UNSET.repr(), "UNSET");
        assert_eq!(Slot::from(Value::Int(3)).repr(), "3");
    }

    #[test]
    fn test_compare_with_value() {
        assert_eq!(Slot::from(Value::Int(3)), Value::Int(3));
        assert_ne!(UNSET, Value::Null);
    }
}
