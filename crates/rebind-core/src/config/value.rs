//! ConfigValue - ストアに保存される生の値

use serde_json::Value;

use super::deferred::{Deferred, DeferredState};

/// A raw stored value: a literal or a deferred computation.
#[derive(Debug, Clone)]
pub enum ConfigValue {
    Literal(Value),
    Deferred(Deferred),
}

impl ConfigValue {
    pub fn is_deferred(&self) -> bool {
        matches!(self, ConfigValue::Deferred(_))
    }

    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            ConfigValue::Literal(value) => Some(value),
            ConfigValue::Deferred(_) => None,
        }
    }

    /// The literal, or a deferred value's result if it already has one.
    pub fn settled(&self) -> Option<Value> {
        match self {
            ConfigValue::Literal(value) => Some(value.clone()),
            ConfigValue::Deferred(deferred) => match deferred.peek() {
                DeferredState::Ready(value) => Some(value),
                DeferredState::Pending | DeferredState::Failed(_) => None,
            },
        }
    }
}

impl PartialEq for ConfigValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ConfigValue::Literal(a), ConfigValue::Literal(b)) => a == b,
            (ConfigValue::Deferred(a), ConfigValue::Deferred(b)) => a.same_value_cell(b),
            _ => false,
        }
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        ConfigValue::Literal(value)
    }
}

impl From<Deferred> for ConfigValue {
    fn from(deferred: Deferred) -> Self {
        ConfigValue::Deferred(deferred)
    }
}
