//! Memento - 永続化されたノードのスナップショット
//!
//! Memento は不変の値型です。構築は `MementoBuilder` 経由でのみ行い、
//! 自己参照（自分自身を親や子として持つこと）は構築時に拒否します。
//! 親 ↔ 子の相互参照は想定どおりであり、エラーではありません。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{ObjectId, ObjectKind};

/// MementoError は Memento の不変条件違反
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MementoError {
    #[error("memento id must not be empty")]
    EmptyId,

    #[error("memento {0} has an empty type name")]
    EmptyType(ObjectId),

    #[error("memento {0} names itself as its parent")]
    SelfParent(ObjectId),

    #[error("memento {0} names itself as one of its children")]
    SelfChild(ObjectId),
}

/// Immutable snapshot of one graph node's persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MementoBuilder", rename_all = "camelCase")]
pub struct Memento {
    id: ObjectId,
    #[serde(rename = "type")]
    type_name: String,
    kind: ObjectKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog_item_id: Option<String>,
    config: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<ObjectId>,
    child_ids: Vec<ObjectId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    feeds: Vec<Value>,
}

impl Memento {
    pub fn builder(
        id: impl Into<ObjectId>,
        type_name: impl Into<String>,
        kind: ObjectKind,
    ) -> MementoBuilder {
        MementoBuilder::new(id, type_name, kind)
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn catalog_item_id(&self) -> Option<&str> {
        self.catalog_item_id.as_deref()
    }

    /// Persisted config in insertion order: flag-or-key name -> opaque value.
    pub fn config(&self) -> &IndexMap<String, Value> {
        &self.config
    }

    pub fn parent_id(&self) -> Option<&ObjectId> {
        self.parent_id.as_ref()
    }

    pub fn child_ids(&self) -> &[ObjectId] {
        &self.child_ids
    }

    pub fn tags(&self) -> &[Value] {
        &self.tags
    }

    pub fn feeds(&self) -> &[Value] {
        &self.feeds
    }

    /// Multi-line rendering of every field, for trace logging.
    pub fn to_verbose_string(&self) -> String {
        let config = self
            .config
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        let children = self
            .child_ids
            .iter()
            .map(ObjectId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{kind} {id} (type={ty}, displayName={dn:?}, catalogItemId={cat:?})\n  \
             parent: {parent}\n  children: [{children}]\n  config: {{{config}}}\n  \
             tags: {tags}\n  feeds: {feeds}",
            kind = self.kind,
            id = self.id,
            ty = self.type_name,
            dn = self.display_name,
            cat = self.catalog_item_id,
            parent = self
                .parent_id
                .as_ref()
                .map(ObjectId::as_str)
                .unwrap_or("<none>"),
            tags = self.tags.len(),
            feeds = self.feeds.len(),
        )
    }
}

/// Builder for [`Memento`]; `build()` enforces the invariants.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MementoBuilder {
    id: ObjectId,
    #[serde(rename = "type")]
    type_name: String,
    kind: ObjectKind,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    catalog_item_id: Option<String>,
    #[serde(default)]
    config: IndexMap<String, Value>,
    #[serde(default)]
    parent_id: Option<ObjectId>,
    #[serde(default)]
    child_ids: Vec<ObjectId>,
    #[serde(default)]
    tags: Vec<Value>,
    #[serde(default)]
    feeds: Vec<Value>,
}

impl MementoBuilder {
    pub fn new(id: impl Into<ObjectId>, type_name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            kind,
            display_name: None,
            catalog_item_id: None,
            config: IndexMap::new(),
            parent_id: None,
            child_ids: Vec::new(),
            tags: Vec::new(),
            feeds: Vec::new(),
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn catalog_item_id(mut self, id: impl Into<String>) -> Self {
        self.catalog_item_id = Some(id.into());
        self
    }

    pub fn config(mut self, name: impl Into<String>, value: Value) -> Self {
        self.config.insert(name.into(), value);
        self
    }

    pub fn parent(mut self, id: impl Into<ObjectId>) -> Self {
        self.parent_id = Some(id.into());
        self
    }

    pub fn child(mut self, id: impl Into<ObjectId>) -> Self {
        self.child_ids.push(id.into());
        self
    }

    pub fn tag(mut self, tag: Value) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn feed(mut self, feed: Value) -> Self {
        self.feeds.push(feed);
        self
    }

    pub fn build(self) -> Result<Memento, MementoError> {
        if self.id.as_str().is_empty() {
            return Err(MementoError::EmptyId);
        }
        if self.type_name.is_empty() {
            return Err(MementoError::EmptyType(self.id));
        }
        if self.parent_id.as_ref() == Some(&self.id) {
            return Err(MementoError::SelfParent(self.id));
        }
        if self.child_ids.contains(&self.id) {
            return Err(MementoError::SelfChild(self.id));
        }
        Ok(Memento {
            id: self.id,
            type_name: self.type_name,
            kind: self.kind,
            display_name: self.display_name,
            catalog_item_id: self.catalog_item_id,
            config: self.config,
            parent_id: self.parent_id,
            child_ids: self.child_ids,
            tags: self.tags,
            feeds: self.feeds,
        })
    }
}

impl TryFrom<MementoBuilder> for Memento {
    type Error = MementoError;

    fn try_from(builder: MementoBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loc(id: &str) -> MementoBuilder {
        Memento::builder(id, "SshLocation", ObjectKind::Location)
    }

    #[test]
    fn builder_keeps_config_and_child_order() {
        let m = loc("loc-1")
            .config("user", json!("alice"))
            .config("customFlag", json!("v1"))
            .parent("loc-0")
            .child("loc-2")
            .child("loc-3")
            .build()
            .unwrap();

        let names: Vec<_> = m.config().keys().cloned().collect();
        assert_eq!(names, vec!["user", "customFlag"]);
        assert_eq!(m.child_ids(), &[ObjectId::new("loc-2"), ObjectId::new("loc-3")]);
        assert_eq!(m.parent_id(), Some(&ObjectId::new("loc-0")));
    }

    #[test]
    fn self_references_are_rejected() {
        assert_eq!(
            loc("loc-1").parent("loc-1").build(),
            Err(MementoError::SelfParent(ObjectId::new("loc-1")))
        );
        assert_eq!(
            loc("loc-1").child("loc-2").child("loc-1").build(),
            Err(MementoError::SelfChild(ObjectId::new("loc-1")))
        );
    }

    #[test]
    fn deserializing_goes_through_the_same_checks() {
        let err = serde_json::from_value::<Memento>(json!({
            "id": "loc-1",
            "type": "SshLocation",
            "kind": "location",
            "parentId": "loc-1"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("itself as its parent"));

        let ok: Memento = serde_json::from_value(json!({
            "id": "loc-1",
            "type": "SshLocation",
            "kind": "location",
            "config": { "user": "alice" }
        }))
        .unwrap();
        assert_eq!(ok.config()["user"], json!("alice"));
        assert!(ok.child_ids().is_empty());
    }

    #[test]
    fn verbose_string_names_the_record() {
        let m = loc("loc-9").config("user", json!("bob")).build().unwrap();
        let s = m.to_verbose_string();
        assert!(s.contains("loc-9"));
        assert!(s.contains("SshLocation"));
        assert!(s.contains("user=\"bob\""));
    }
}
