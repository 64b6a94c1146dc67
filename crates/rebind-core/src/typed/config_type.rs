//! ConfigType - 設定値として扱える Rust 型
//!
//! # 学習ポイント
//! - Associated Constants (`const VALUE_TYPE`)
//! - serde の trait bounds で「永続化表現 ↔ Rust 型」を結ぶ

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::ValueType;

/// A Rust type a typed config key can carry.
///
/// Values are coerced to `VALUE_TYPE` first and then decoded with serde.
pub trait ConfigType: Serialize + DeserializeOwned + Send + Sync + 'static {
    const VALUE_TYPE: ValueType;
}

macro_rules! config_type {
    ($value_type:expr => $($ty:ty),+ $(,)?) => {
        $(impl ConfigType for $ty {
            const VALUE_TYPE: ValueType = $value_type;
        })+
    };
}

config_type!(ValueType::Bool => bool);
config_type!(ValueType::Integer => i32, i64, u16, u32, u64);
config_type!(ValueType::Float => f32, f64);
config_type!(ValueType::String => String);
config_type!(ValueType::Any => serde_json::Value);

impl<T: ConfigType> ConfigType for Vec<T> {
    const VALUE_TYPE: ValueType = ValueType::List;
}

impl<T: ConfigType> ConfigType for BTreeMap<String, T> {
    const VALUE_TYPE: ValueType = ValueType::Map;
}

impl<T: ConfigType> ConfigType for IndexMap<String, T> {
    const VALUE_TYPE: ValueType = ValueType::Map;
}
