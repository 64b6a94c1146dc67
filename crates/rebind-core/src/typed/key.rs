//! ConfigKey<T> - 型付き設定キー
//!
//! # 二層構造
//! - **表層（Typed）**: `ConfigKey<T>` - 読み書きの型が静的に決まる
//! - **内部（Erased）**: `KeyDescriptor` - 宣言済みキー集合やフラグテーブルで扱う

use std::fmt;
use std::marker::PhantomData;

use crate::config::key::KeyDescriptor;
use crate::domain::ValueType;

use super::config_type::ConfigType;

pub struct ConfigKey<T: ConfigType> {
    descriptor: KeyDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ConfigType> ConfigKey<T> {
    /// A simple key named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::wrap(KeyDescriptor::new(name, T::VALUE_TYPE))
    }

    /// A structured key when `T` is a map or a list, else a simple one.
    pub fn structured(name: impl Into<String>) -> Self {
        let descriptor = match T::VALUE_TYPE {
            ValueType::Map => KeyDescriptor::map(name),
            ValueType::List => KeyDescriptor::list(name),
            other => KeyDescriptor::new(name, other),
        };
        Self::wrap(descriptor)
    }

    fn wrap(descriptor: KeyDescriptor) -> Self {
        Self {
            descriptor,
            _marker: PhantomData,
        }
    }

    /// Attaches a default. A value that cannot be encoded leaves the key without one.
    pub fn with_default(self, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(encoded) => Self::wrap(self.descriptor.with_default(encoded)),
            Err(_) => self,
        }
    }

    pub fn with_deprecated_name(self, name: impl Into<String>) -> Self {
        Self::wrap(self.descriptor.with_deprecated_name(name))
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self::wrap(self.descriptor.with_description(description))
    }

    pub fn not_inherited(self) -> Self {
        Self::wrap(self.descriptor.not_inherited())
    }

    /// One entry of a structured map key, typed as `E`.
    pub fn sub_key<E: ConfigType>(&self, sub: impl Into<String>) -> Option<ConfigKey<E>> {
        self.descriptor
            .sub_element(sub, E::VALUE_TYPE)
            .map(ConfigKey::wrap)
    }

    /// Typed view of an erased descriptor. Reads coerce to the descriptor's
    /// declared type and then decode as `T`.
    pub fn from_descriptor(descriptor: KeyDescriptor) -> Self {
        Self::wrap(descriptor)
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &KeyDescriptor {
        &self.descriptor
    }
}

impl<T: ConfigType> Clone for ConfigKey<T> {
    fn clone(&self) -> Self {
        Self::wrap(self.descriptor.clone())
    }
}

impl<T: ConfigType> fmt::Debug for ConfigKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigKey")
            .field("name", &self.descriptor.name())
            .field("type", &self.descriptor.value_type())
            .finish()
    }
}

impl<T: ConfigType> From<ConfigKey<T>> for KeyDescriptor {
    fn from(key: ConfigKey<T>) -> Self {
        key.descriptor
    }
}

impl<T: ConfigType> AsRef<KeyDescriptor> for ConfigKey<T> {
    fn as_ref(&self) -> &KeyDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn declared_type_follows_the_rust_type() {
        assert_eq!(ConfigKey::<u16>::new("port").descriptor().value_type(), ValueType::Integer);
        assert_eq!(ConfigKey::<String>::new("user").descriptor().value_type(), ValueType::String);
        assert!(!ConfigKey::<BTreeMap<String, String>>::new("env").descriptor().is_structured());
        let env = ConfigKey::<BTreeMap<String, String>>::structured("env");
        assert!(env.descriptor().is_structured());
        assert!(ConfigKey::<Vec<String>>::structured("tags").descriptor().is_structured());
    }

    #[test]
    fn defaults_are_stored_encoded() {
        let port = ConfigKey::<u16>::new("port").with_default(22);
        assert_eq!(port.descriptor().default_value(), Some(&json!(22)));
    }

    #[test]
    fn sub_keys_are_typed() {
        let env = ConfigKey::<BTreeMap<String, String>>::structured("env");
        let path: ConfigKey<String> = env.sub_key("PATH").unwrap();
        assert_eq!(path.name(), "env.PATH");
        assert_eq!(path.descriptor().value_type(), ValueType::String);
    }
}
