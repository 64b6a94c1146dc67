//! ConverterRegistry - (ソース表現, ターゲット型) をキーにした変換器の登録表
//!
//! # 変換の順序
//! 1. null はそのまま（null の扱いは呼び出し側が決める）
//! 2. すでに宣言型に合っている値はそのまま
//! 3. 登録済みの変換器
//! 4. 構造的なフォールバック（文字列 → enum）

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};

use crate::domain::{CoercionError, ValueType};
use crate::ports::TypeCoercer;

/// JSON representation of a persisted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceRepr {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl SourceRepr {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => SourceRepr::Null,
            Value::Bool(_) => SourceRepr::Bool,
            Value::Number(_) => SourceRepr::Number,
            Value::String(_) => SourceRepr::String,
            Value::Array(_) => SourceRepr::Array,
            Value::Object(_) => SourceRepr::Object,
        }
    }
}

impl fmt::Display for SourceRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A `ValueType` without enum payload, usable as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Any,
    Bool,
    Integer,
    Float,
    String,
    List,
    Map,
    Enum,
}

impl From<ValueType> for TargetKind {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Any => TargetKind::Any,
            ValueType::Bool => TargetKind::Bool,
            ValueType::Integer => TargetKind::Integer,
            ValueType::Float => TargetKind::Float,
            ValueType::String => TargetKind::String,
            ValueType::List => TargetKind::List,
            ValueType::Map => TargetKind::Map,
            ValueType::Enum(_) => TargetKind::Enum,
        }
    }
}

pub type Converter = Arc<dyn Fn(&Value, ValueType) -> Result<Value, String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<(SourceRepr, TargetKind), Converter>,
}

impl ConverterRegistry {
    /// No converters; only identity and the structural fallback apply.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(SourceRepr::String, TargetKind::Bool, |v, _| {
            match as_str(v)?.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err("not a boolean".into()),
            }
        });
        registry.register(SourceRepr::String, TargetKind::Integer, |v, _| {
            let s = as_str(v)?.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Value::from(i));
            }
            s.parse::<u64>()
                .map(Value::from)
                .map_err(|_| "not an integer".to_string())
        });
        registry.register(SourceRepr::String, TargetKind::Float, |v, _| {
            let f = as_str(v)?
                .trim()
                .parse::<f64>()
                .map_err(|_| "not a number".to_string())?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| "not a finite number".to_string())
        });
        registry.register(SourceRepr::Number, TargetKind::Integer, |v, _| {
            match v.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => Err("not a whole number".into()),
            }
        });
        registry.register(SourceRepr::Number, TargetKind::String, |v, _| {
            Ok(Value::String(v.to_string()))
        });
        registry.register(SourceRepr::Bool, TargetKind::String, |v, _| {
            Ok(Value::String(v.to_string()))
        });
        registry.register(SourceRepr::String, TargetKind::List, |v, _| {
            parse_json(v, Value::is_array)
        });
        registry.register(SourceRepr::String, TargetKind::Map, |v, _| {
            parse_json(v, Value::is_object)
        });
        registry
    }

    pub fn register<F>(&mut self, source: SourceRepr, target: TargetKind, converter: F)
    where
        F: Fn(&Value, ValueType) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.converters.insert((source, target), Arc::new(converter));
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl TypeCoercer for ConverterRegistry {
    fn coerce(&self, value: &Value, target: ValueType) -> Result<Value, CoercionError> {
        if value.is_null() || conforms(value, target) {
            return Ok(value.clone());
        }
        let source = SourceRepr::of(value);
        if let Some(converter) = self.converters.get(&(source, TargetKind::from(target))) {
            return converter(value, target)
                .map_err(|reason| CoercionError::new(value, target, reason));
        }
        if let (ValueType::Enum(variants), Value::String(s)) = (target, value) {
            return match_variant(s, variants)
                .map(|canonical| Value::String(canonical.to_string()))
                .ok_or_else(|| CoercionError::new(value, target, "no such variant"));
        }
        Err(CoercionError::new(
            value,
            target,
            format!("no converter from {source}"),
        ))
    }
}

fn conforms(value: &Value, target: ValueType) -> bool {
    match target {
        ValueType::Any => true,
        ValueType::Bool => value.is_boolean(),
        ValueType::Integer => value.is_i64() || value.is_u64(),
        ValueType::Float => value.is_number(),
        ValueType::String => value.is_string(),
        ValueType::List => value.is_array(),
        ValueType::Map => value.is_object(),
        ValueType::Enum(variants) => value
            .as_str()
            .is_some_and(|s| variants.contains(&s)),
    }
}

/// Case-insensitive, treating `-` and `_` alike.
fn match_variant(s: &str, variants: &'static [&'static str]) -> Option<&'static str> {
    let normalize = |x: &str| x.trim().to_ascii_lowercase().replace('-', "_");
    let wanted = normalize(s);
    variants.iter().copied().find(|v| normalize(v) == wanted)
}

fn as_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| "not a string".to_string())
}

fn parse_json(value: &Value, accept: fn(&Value) -> bool) -> Result<Value, String> {
    let parsed: Value = serde_json::from_str(as_str(value)?).map_err(|e| e.to_string())?;
    if accept(&parsed) {
        Ok(parsed)
    } else {
        Err("parsed to the wrong shape".into())
    }
}
