//! BasicType - 宣言だけで組み立てる ObjectType

use std::fmt;
use std::sync::Arc;

use crate::config::KeyDescriptor;
use crate::domain::{ObjectKind, ValueType};
use crate::rebind::{FlagTable, LiveObject, ObjectType};

type InitHook = Box<dyn Fn(&LiveObject) + Send + Sync>;

pub struct BasicType {
    type_name: String,
    kind: ObjectKind,
    keys: Vec<KeyDescriptor>,
    flags: FlagTable,
    init: Option<InitHook>,
}

impl BasicType {
    pub fn location(type_name: impl Into<String>) -> BasicTypeBuilder {
        BasicTypeBuilder::new(type_name, ObjectKind::Location)
    }

    pub fn entity(type_name: impl Into<String>) -> BasicTypeBuilder {
        BasicTypeBuilder::new(type_name, ObjectKind::Entity)
    }

    pub fn application(type_name: impl Into<String>) -> BasicTypeBuilder {
        BasicTypeBuilder::new(type_name, ObjectKind::Application)
    }
}

impl ObjectType for BasicType {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn config_keys(&self) -> &[KeyDescriptor] {
        &self.keys
    }

    fn flags(&self) -> &FlagTable {
        &self.flags
    }

    fn on_rebind_init(&self, object: &LiveObject) {
        if let Some(init) = &self.init {
            init(object);
        }
    }
}

impl fmt::Debug for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicType")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("keys", &self.keys.len())
            .field("flags", &self.flags.len())
            .finish()
    }
}

pub struct BasicTypeBuilder {
    inner: BasicType,
}

impl BasicTypeBuilder {
    fn new(type_name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            inner: BasicType {
                type_name: type_name.into(),
                kind,
                keys: Vec::new(),
                flags: FlagTable::new(),
                init: None,
            },
        }
    }

    pub fn key(mut self, key: impl Into<KeyDescriptor>) -> Self {
        self.inner.keys.push(key.into());
        self
    }

    /// A legacy flag assigned to a plain field.
    pub fn flag_field(mut self, flag: &str, field: &'static str, value_type: ValueType) -> Self {
        self.inner.flags = self.inner.flags.with_field(flag, field, value_type);
        self
    }

    /// A legacy flag whose field is a config key.
    pub fn flag_key(mut self, flag: &str, key: impl Into<KeyDescriptor>) -> Self {
        self.inner.flags = self.inner.flags.with_config_key(flag, key);
        self
    }

    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&LiveObject) + Send + Sync + 'static,
    {
        self.inner.init = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Arc<dyn ObjectType> {
        Arc::new(self.inner)
    }
}
