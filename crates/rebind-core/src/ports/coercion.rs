//! TypeCoercer port - 永続化表現と宣言型の間の変換

use serde_json::Value;

use crate::domain::{CoercionError, ValueType};

/// Best-effort conversion of persisted values to declared types.
pub trait TypeCoercer: Send + Sync {
    fn coerce(&self, value: &Value, target: ValueType) -> Result<Value, CoercionError>;

    fn try_coerce(&self, value: &Value, target: ValueType) -> Option<Value> {
        self.coerce(value, target).ok()
    }
}
