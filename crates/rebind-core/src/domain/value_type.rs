//! ValueType - 設定値の宣言型

use std::fmt;

/// The declared type of a configuration value.
///
/// Persisted values are opaque JSON; a `ValueType` says what shape a value
/// must have once coerced. `Enum` carries its canonical variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Any,
    Bool,
    Integer,
    Float,
    String,
    List,
    Map,
    Enum(&'static [&'static str]),
}

impl ValueType {
    /// Whether a value of the `declared` type may be handed out as `self`.
    pub fn accepts(self, declared: ValueType) -> bool {
        match (self, declared) {
            (ValueType::Any, _) => true,
            (ValueType::Float, ValueType::Integer) => true,
            (ValueType::String, ValueType::Enum(_)) => true,
            (requested, declared) => requested == declared,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Any => "any",
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::List => "list",
            ValueType::Map => "map",
            ValueType::Enum(_) => "enum",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Enum(variants) => write!(f, "enum{variants:?}"),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_accepts_everything() {
        assert!(ValueType::Any.accepts(ValueType::Map));
        assert!(ValueType::Any.accepts(ValueType::Integer));
    }

    #[test]
    fn narrower_requests_are_rejected() {
        assert!(!ValueType::Integer.accepts(ValueType::String));
        assert!(!ValueType::Integer.accepts(ValueType::Float));
        assert!(ValueType::Float.accepts(ValueType::Integer));
    }
}
