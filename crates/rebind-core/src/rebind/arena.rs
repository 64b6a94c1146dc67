//! ObjectArena - ID で引けるライブオブジェクトの集合
//!
//! 複数の rebind バッチを跨いで生き続けます。バッチ内の参照解決は
//! `BatchContext` 経由でこのアリーナを読み取り専用で引きます。

use std::sync::Arc;

use indexmap::IndexMap;

use crate::domain::{ObjectId, ObjectKind, RebindError};

use super::live::LiveObject;

#[derive(Debug, Default)]
pub struct ObjectArena {
    objects: IndexMap<ObjectId, Arc<LiveObject>>,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: Arc<LiveObject>) -> Result<(), RebindError> {
        if self.objects.contains_key(object.id()) {
            return Err(RebindError::DuplicateObject(object.id().clone()));
        }
        self.objects.insert(object.id().clone(), object);
        Ok(())
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Arc<LiveObject>> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// `id` within the lookup space of `kind`. Applications and entities
    /// share one space.
    pub fn lookup(&self, kind: ObjectKind, id: &ObjectId) -> Option<Arc<LiveObject>> {
        self.objects
            .get(id)
            .filter(|object| object.kind().lookup_space() == kind.lookup_space())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<LiveObject>> {
        self.objects.values()
    }

    /// Objects with no live parent, in insertion order.
    pub fn roots(&self) -> Vec<Arc<LiveObject>> {
        self.objects
            .values()
            .filter(|object| object.parent().is_none())
            .cloned()
            .collect()
    }

    pub fn managed(&self) -> Vec<Arc<LiveObject>> {
        self.objects
            .values()
            .filter(|object| object.is_managed())
            .cloned()
            .collect()
    }

    /// Tears down `id` and its descendants and drops them from the arena.
    pub fn unmanage(&mut self, id: &ObjectId) -> Vec<ObjectId> {
        let Some(object) = self.objects.get(id).cloned() else {
            return Vec::new();
        };
        if let Some(parent) = object.parent() {
            parent.remove_child(id);
        }
        let removed = object.unmanage();
        for removed_id in &removed {
            self.objects.shift_remove(removed_id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entity, location};

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut arena = ObjectArena::new();
        arena.insert(location("loc-1")).unwrap();
        assert!(matches!(
            arena.insert(location("loc-1")),
            Err(RebindError::DuplicateObject(id)) if id.as_str() == "loc-1"
        ));
    }

    #[test]
    fn lookup_respects_the_kind_namespace() {
        let mut arena = ObjectArena::new();
        arena.insert(location("loc-1")).unwrap();
        arena.insert(entity("ent-1")).unwrap();

        let loc = ObjectId::new("loc-1");
        let ent = ObjectId::new("ent-1");
        assert!(arena.lookup(ObjectKind::Location, &loc).is_some());
        assert!(arena.lookup(ObjectKind::Entity, &loc).is_none());
        assert!(arena.lookup(ObjectKind::Application, &ent).is_some());
        assert!(arena.lookup(ObjectKind::Location, &ent).is_none());
    }

    #[test]
    fn unmanage_drops_the_subtree() {
        let mut arena = ObjectArena::new();
        let root = location("loc-0");
        let child = location("loc-1");
        let other = location("loc-9");
        child.set_parent(Some(&root));
        root.add_child(child.clone());
        for object in [root, child, other] {
            arena.insert(object).unwrap();
        }

        let removed = arena.unmanage(&ObjectId::new("loc-0"));
        assert_eq!(removed.len(), 2);
        assert_eq!(arena.len(), 1);
        assert!(arena.contains(&ObjectId::new("loc-9")));
        assert!(arena.unmanage(&ObjectId::new("loc-0")).is_empty());
    }
}
