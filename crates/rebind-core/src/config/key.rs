//! KeyDescriptor - 型消去された設定キー
//!
//! 型付き API（`typed::ConfigKey<T>`）はこの descriptor を包むだけです。
//! 宣言済みキーの集合やフラグテーブルのように異なる型のキーを
//! 一緒に扱う場所では descriptor を直接使います。

use serde_json::Value;

use crate::domain::ValueType;

/// How a key's effective value is assembled.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyShape {
    /// One stored value.
    Simple,
    /// Merged from `name` (a whole map) and `name.<sub>` fragments;
    /// last write wins per sub-key.
    Map,
    /// Merged from `name` (a whole list) and `name.<sub>` fragments, appended.
    List,
    /// One entry of a structured map key.
    SubElement { parent: Box<KeyDescriptor>, sub: String },
}

/// How a stored name relates to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    Deprecated,
    /// `name.<sub>` of a structured key.
    Element(String),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyDescriptor {
    name: String,
    value_type: ValueType,
    default: Option<Value>,
    shape: KeyShape,
    deprecated_names: Vec<String>,
    inherited: bool,
    description: Option<String>,
}

impl KeyDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: None,
            shape: KeyShape::Simple,
            deprecated_names: Vec::new(),
            inherited: true,
            description: None,
        }
    }

    /// Anonymous (untyped) key, used for legacy names with no declaration.
    pub fn anonymous(name: impl Into<String>) -> Self {
        Self::new(name, ValueType::Any)
    }

    pub fn map(name: impl Into<String>) -> Self {
        Self {
            shape: KeyShape::Map,
            ..Self::new(name, ValueType::Map)
        }
    }

    pub fn list(name: impl Into<String>) -> Self {
        Self {
            shape: KeyShape::List,
            ..Self::new(name, ValueType::List)
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_deprecated_name(mut self, name: impl Into<String>) -> Self {
        self.deprecated_names.push(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The key does not fall back to the parent object's store.
    pub fn not_inherited(mut self) -> Self {
        self.inherited = false;
        self
    }

    /// Descriptor for one entry of this map key. Returns `None` for other shapes.
    pub fn sub_element(
        &self,
        sub: impl Into<String>,
        value_type: ValueType,
    ) -> Option<KeyDescriptor> {
        if self.shape != KeyShape::Map {
            return None;
        }
        let sub = sub.into();
        Some(Self {
            name: format!("{}.{}", self.name, sub),
            value_type,
            default: None,
            shape: KeyShape::SubElement {
                parent: Box::new(self.clone()),
                sub,
            },
            deprecated_names: Vec::new(),
            inherited: self.inherited,
            description: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn shape(&self) -> &KeyShape {
        &self.shape
    }

    pub fn deprecated_names(&self) -> &[String] {
        &self.deprecated_names
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_inherited(&self) -> bool {
        self.inherited
    }

    /// Map, list and sub-element keys.
    pub fn is_structured(&self) -> bool {
        !matches!(self.shape, KeyShape::Simple)
    }

    /// Relates a stored or persisted name to this key.
    pub fn match_name(&self, name: &str) -> NameMatch {
        if name == self.name {
            return NameMatch::Exact;
        }
        if self.deprecated_names.iter().any(|d| d == name) {
            return NameMatch::Deprecated;
        }
        if matches!(self.shape, KeyShape::Map | KeyShape::List) {
            if let Some(sub) = name
                .strip_prefix(self.name.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .filter(|sub| !sub.is_empty())
            {
                return NameMatch::Element(sub.to_string());
            }
        }
        NameMatch::None
    }
}
