//! Errors - エラー型と分類
//!
//! 致命的なものだけが `Err` として伝播します。欠落した参照（親/子が
//! 見つからない）や未知のフラグはエラーではなく、警告ログと
//! `RebindReport` への記録で扱います。

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use super::ids::{ObjectId, ObjectKind};
use super::memento::MementoError;
use super::value_type::ValueType;

/// A value could not be converted to a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot coerce {value} to {target}: {reason}")]
pub struct CoercionError {
    pub value: String,
    pub target: ValueType,
    pub reason: String,
}

impl CoercionError {
    pub fn new(value: &Value, target: ValueType, reason: impl Into<String>) -> Self {
        let mut rendered = value.to_string();
        if rendered.len() > 64 {
            let cut = (0..=61).rev().find(|i| rendered.is_char_boundary(*i)).unwrap_or(0);
            rendered.truncate(cut);
            rendered.push_str("...");
        }
        Self {
            value: rendered,
            target,
            reason: reason.into(),
        }
    }
}

/// Why a deferred value produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("deferred value failed: {0}")]
    Failed(String),

    #[error("deferred value was abandoned before it completed")]
    Abandoned,
}

/// Outcome of waiting on a unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkError {
    #[error("unit of work did not finish within {0:?}")]
    Timeout(Duration),

    #[error("unit of work failed: {0}")]
    Failed(String),

    #[error("unit of work was cancelled")]
    Cancelled,
}

/// Errors raised by `ConfigStore` reads and typed writes.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config {key} of {owner} is of type {declared}, but asked for incompatible {requested}")]
    IncompatibleType {
        owner: ObjectId,
        key: String,
        declared: ValueType,
        requested: ValueType,
    },

    #[error("config {key} of {owner}: {source}")]
    Coercion {
        owner: ObjectId,
        key: String,
        #[source]
        source: CoercionError,
    },

    #[error("config {key} of {owner} could not be resolved: {source}")]
    Resolution {
        owner: ObjectId,
        key: String,
        #[source]
        source: ResolveError,
    },

    #[error("config {key} of {owner} does not decode as the requested type: {reason}")]
    Decode {
        owner: ObjectId,
        key: String,
        reason: String,
    },

    #[error("value for config {key} of {owner} cannot be encoded: {reason}")]
    Encode {
        owner: ObjectId,
        key: String,
        reason: String,
    },
}

/// Fatal rebind errors.
#[derive(Debug, Error)]
pub enum RebindError {
    #[error(transparent)]
    InvalidMemento(#[from] MementoError),

    #[error("duplicate object {0} in rebind batch")]
    DuplicateObject(ObjectId),

    #[error("no type registered for {type_name} (memento {id})")]
    UnknownType { id: ObjectId, type_name: String },

    #[error("type {type_name} is a {declared}, but memento {id} was persisted as a {persisted}")]
    KindMismatch {
        id: ObjectId,
        type_name: String,
        declared: ObjectKind,
        persisted: ObjectKind,
    },

    #[error("no rebind support registered for {0} objects")]
    NoSupport(ObjectKind),

    #[error("config {key} of {id}({type_name}) rejects its persisted value: {source}")]
    Coercion {
        id: ObjectId,
        type_name: String,
        key: String,
        #[source]
        source: CoercionError,
    },

    #[error("{operation} is not supported for {kind} {id}")]
    Unsupported {
        operation: &'static str,
        kind: ObjectKind,
        id: ObjectId,
    },

    #[error("rebind of {id}({type_name}) failed: {source}")]
    ObjectFailed {
        id: ObjectId,
        type_name: String,
        #[source]
        source: Box<RebindError>,
    },

    #[error("rebind finished with {count} failed object(s); first: {first}")]
    BatchFailed { count: usize, first: String },
}

impl RebindError {
    pub fn object_failed(id: &ObjectId, type_name: &str, source: RebindError) -> Self {
        RebindError::ObjectFailed {
            id: id.clone(),
            type_name: type_name.to_string(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coercion_error_truncates_long_values() {
        let long = json!("x".repeat(200));
        let err = CoercionError::new(&long, ValueType::Integer, "not a number");
        assert!(err.value.len() <= 64);
        assert!(err.value.ends_with("..."));
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn object_failures_name_the_record() {
        let err = RebindError::object_failed(
            &ObjectId::new("loc-1"),
            "SshLocation",
            RebindError::NoSupport(ObjectKind::Location),
        );
        let msg = err.to_string();
        assert!(msg.contains("loc-1"));
        assert!(msg.contains("SshLocation"));
    }
}
