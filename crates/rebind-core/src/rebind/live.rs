//! LiveObject - 再構築されるライブオブジェクト
//!
//! # 所有関係
//! - 子は `Arc` で所有する（親の破棄は子に波及する）
//! - 親は `Weak` の後方参照（所有しない）
//! - 設定ストアはオブジェクトが 1 つだけ所有する
//!
//! # ライフサイクル
//! pass 1 で空のまま生成 → pass 2 で設定と関係を復元 → 両方成功したら managed。
//! 破棄は `unmanage` による明示的な teardown のみ。

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::config::{ConfigStore, StoreServices};
use crate::domain::{ObjectId, ObjectKind};

use super::object_type::ObjectType;

pub struct LiveObject {
    id: ObjectId,
    object_type: Arc<dyn ObjectType>,
    config: ConfigStore,
    display_name: RwLock<Option<String>>,
    catalog_item_id: RwLock<Option<String>>,
    tags: RwLock<Vec<Value>>,
    fields: RwLock<IndexMap<&'static str, Value>>,
    parent: RwLock<Weak<LiveObject>>,
    children: RwLock<Vec<Arc<LiveObject>>>,
    feeds: RwLock<Vec<Value>>,
    initialized: AtomicBool,
    managed: AtomicBool,
}

impl LiveObject {
    /// A bare object: empty config, no relationships, not managed.
    pub fn new(
        id: ObjectId,
        object_type: Arc<dyn ObjectType>,
        services: StoreServices,
    ) -> Arc<Self> {
        let config = ConfigStore::new(
            id.clone(),
            object_type.config_keys().iter().cloned(),
            services,
        );
        Arc::new(Self {
            id,
            object_type,
            config,
            display_name: RwLock::new(None),
            catalog_item_id: RwLock::new(None),
            tags: RwLock::new(Vec::new()),
            fields: RwLock::new(IndexMap::new()),
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
            feeds: RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
            managed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.object_type.kind()
    }

    pub fn type_name(&self) -> &str {
        self.object_type.type_name()
    }

    pub fn object_type(&self) -> &Arc<dyn ObjectType> {
        &self.object_type
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn display_name(&self) -> Option<String> {
        self.display_name.read().clone()
    }

    pub fn set_display_name(&self, name: Option<String>) {
        *self.display_name.write() = name;
    }

    pub fn catalog_item_id(&self) -> Option<String> {
        self.catalog_item_id.read().clone()
    }

    pub fn set_catalog_item_id(&self, id: Option<String>) {
        *self.catalog_item_id.write() = id;
    }

    pub fn tags(&self) -> Vec<Value> {
        self.tags.read().clone()
    }

    pub fn set_tags(&self, tags: Vec<Value>) {
        *self.tags.write() = tags;
    }

    // ------------------------------------------------------------------------
    // Legacy fields
    // ------------------------------------------------------------------------

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    pub fn set_field(&self, name: &'static str, value: Value) {
        self.fields.write().insert(name, value);
    }

    pub fn fields(&self) -> Vec<(&'static str, Value)> {
        self.fields
            .read()
            .iter()
            .map(|(name, value)| (*name, value.clone()))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------------

    pub fn parent(&self) -> Option<Arc<LiveObject>> {
        self.parent.read().upgrade()
    }

    /// Whether `id` appears on this object's parent chain.
    pub fn descends_from(&self, id: &ObjectId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.parent();
        while let Some(object) = current {
            if &object.id == id {
                return true;
            }
            if !seen.insert(object.id.clone()) {
                return false;
            }
            current = object.parent();
        }
        false
    }

    /// Links the parent and its config store. The parent's children are
    /// not touched.
    pub fn set_parent(&self, parent: Option<&Arc<LiveObject>>) {
        *self.parent.write() = parent.map(Arc::downgrade).unwrap_or_default();
        self.config.set_parent(parent.map(|p| p.config()));
    }

    pub fn children(&self) -> Vec<Arc<LiveObject>> {
        self.children.read().clone()
    }

    pub fn child_ids(&self) -> Vec<ObjectId> {
        self.children.read().iter().map(|c| c.id.clone()).collect()
    }

    /// Appends `child` unless a child with its id is already attached.
    pub fn add_child(&self, child: Arc<LiveObject>) -> bool {
        let mut children = self.children.write();
        if children.iter().any(|c| c.id == child.id) {
            return false;
        }
        children.push(child);
        true
    }

    pub fn remove_child(&self, id: &ObjectId) -> Option<Arc<LiveObject>> {
        let mut children = self.children.write();
        let index = children.iter().position(|c| &c.id == id)?;
        Some(children.remove(index))
    }

    // ------------------------------------------------------------------------
    // Feeds
    // ------------------------------------------------------------------------

    pub fn feeds(&self) -> Vec<Value> {
        self.feeds.read().clone()
    }

    pub fn set_feeds(&self, feeds: Vec<Value>) {
        *self.feeds.write() = feeds;
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Runs the type's init hook unless it already ran. Returns whether it ran now.
    pub fn initialize_once(&self) -> bool {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.object_type.on_rebind_init(self);
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn is_managed(&self) -> bool {
        self.managed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_managed(&self) {
        self.managed.store(true, Ordering::Release);
    }

    /// Stops managing this object and every descendant. Returns the ids
    /// that were torn down, this object first.
    pub fn unmanage(&self) -> Vec<ObjectId> {
        self.managed.store(false, Ordering::Release);
        let children = std::mem::take(&mut *self.children.write());
        let mut removed = vec![self.id.clone()];
        for child in children {
            removed.extend(child.unmanage());
        }
        removed
    }
}

impl std::fmt::Debug for LiveObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveObject")
            .field("id", &self.id)
            .field("type", &self.type_name())
            .field("managed", &self.is_managed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{quick_services, test_location_type};
    use std::sync::atomic::AtomicUsize;

    fn location(id: &str) -> Arc<LiveObject> {
        LiveObject::new(ObjectId::new(id), test_location_type(), quick_services())
    }

    #[test]
    fn children_are_deduplicated_and_ordered() {
        let parent = location("loc-0");
        assert!(parent.add_child(location("loc-2")));
        assert!(parent.add_child(location("loc-1")));
        assert!(!parent.add_child(location("loc-2")));
        assert_eq!(
            parent.child_ids(),
            vec![ObjectId::new("loc-2"), ObjectId::new("loc-1")]
        );
    }

    #[test]
    fn parent_links_are_weak() {
        let child = location("loc-1");
        {
            let parent = location("loc-0");
            child.set_parent(Some(&parent));
            assert_eq!(child.parent().map(|p| p.id().clone()), Some(ObjectId::new("loc-0")));
        }
        assert!(child.parent().is_none());
    }

    #[test]
    fn descends_from_walks_the_parent_chain() {
        let root = location("loc-0");
        let mid = location("loc-1");
        let leaf = location("loc-2");
        mid.set_parent(Some(&root));
        leaf.set_parent(Some(&mid));
        assert!(leaf.descends_from(&ObjectId::new("loc-0")));
        assert!(!root.descends_from(&ObjectId::new("loc-2")));

        root.set_parent(Some(&leaf));
        assert!(!leaf.descends_from(&ObjectId::new("loc-9")));
    }

    #[test]
    fn init_hook_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let object_type = crate::impls::BasicType::location("CountingLocation")
            .on_init({
                let calls = calls.clone();
                move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build();
        let object = LiveObject::new(ObjectId::new("loc-1"), object_type, quick_services());

        assert!(object.initialize_once());
        assert!(!object.initialize_once());
        assert!(object.is_initialized());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unmanage_cascades_to_children() {
        let root = location("loc-0");
        let child = location("loc-1");
        let grandchild = location("loc-2");
        child.add_child(grandchild.clone());
        root.add_child(child.clone());
        for object in [&root, &child, &grandchild] {
            object.mark_managed();
        }

        let removed = root.unmanage();
        assert_eq!(
            removed,
            vec![ObjectId::new("loc-0"), ObjectId::new("loc-1"), ObjectId::new("loc-2")]
        );
        assert!(!grandchild.is_managed());
        assert!(root.children().is_empty());
    }
}
