//! ObjectType - 管理対象オブジェクトの型宣言
//!
//! 型ごとに以下を宣言します。
//! - 宣言済み設定キーの集合
//! - フラグテーブル（型付きキー導入以前の永続化名 → フィールド）
//! - rebind 後に一度だけ走る初期化フック

use indexmap::IndexMap;

use crate::config::KeyDescriptor;
use crate::domain::{ObjectKind, ValueType};

use super::live::LiveObject;

/// Where a legacy flag's value goes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDescriptor {
    /// The field is itself a configuration key.
    ConfigKey(KeyDescriptor),
    /// A plain field, assigned outside configuration.
    Plain {
        field: &'static str,
        value_type: ValueType,
    },
}

/// Declarative flag table: persisted flag name -> field.
#[derive(Debug, Clone, Default)]
pub struct FlagTable {
    entries: IndexMap<String, FieldDescriptor>,
}

impl FlagTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_key(
        mut self,
        flag: impl Into<String>,
        key: impl Into<KeyDescriptor>,
    ) -> Self {
        self.entries
            .insert(flag.into(), FieldDescriptor::ConfigKey(key.into()));
        self
    }

    pub fn with_field(
        mut self,
        flag: impl Into<String>,
        field: &'static str,
        value_type: ValueType,
    ) -> Self {
        self.entries
            .insert(flag.into(), FieldDescriptor::Plain { field, value_type });
        self
    }

    pub fn find_field_for_flag(&self, flag: &str) -> Option<&FieldDescriptor> {
        self.entries.get(flag)
    }

    /// The flag a plain field is persisted under.
    pub fn flag_for_field(&self, field: &str) -> Option<&str> {
        self.entries.iter().find_map(|(flag, descriptor)| match descriptor {
            FieldDescriptor::Plain { field: f, .. } if *f == field => Some(flag.as_str()),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The declaration of a concrete object type.
pub trait ObjectType: Send + Sync {
    fn type_name(&self) -> &str;

    fn kind(&self) -> ObjectKind;

    fn config_keys(&self) -> &[KeyDescriptor];

    fn flags(&self) -> &FlagTable;

    fn find_field_for_flag(&self, flag: &str) -> Option<&FieldDescriptor> {
        self.flags().find_field_for_flag(flag)
    }

    /// Runs once per object after its relationships are wired.
    fn on_rebind_init(&self, _object: &LiveObject) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_both_ways() {
        let flags = FlagTable::new()
            .with_field("address", "address", ValueType::String)
            .with_config_key("sshTries", KeyDescriptor::new("ssh.tries", ValueType::Integer));

        assert!(matches!(
            flags.find_field_for_flag("sshTries"),
            Some(FieldDescriptor::ConfigKey(key)) if key.name() == "ssh.tries"
        ));
        assert_eq!(flags.flag_for_field("address"), Some("address"));
        assert_eq!(flags.flag_for_field("ssh.tries"), None);
        assert!(flags.find_field_for_flag("unknown").is_none());
        assert_eq!(flags.len(), 2);
    }
}
