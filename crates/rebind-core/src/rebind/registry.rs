//! SupportRegistry - ObjectKind → RebindSupport の登録と管理
//!
//! # 学習ポイント
//! - HashMap での型消去された trait object の管理
//! - Arc による共有所有権

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ObjectKind;

use super::entity::EntityRebindSupport;
use super::location::LocationRebindSupport;
use super::support::RebindSupport;

/// One strategy per object kind.
#[derive(Default, Clone)]
pub struct SupportRegistry {
    supports: HashMap<ObjectKind, Arc<dyn RebindSupport>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Rebind support for kind '{0}' is already registered")]
    AlreadyRegistered(ObjectKind),
}

impl SupportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location, entity and application strategies.
    pub fn standard() -> Self {
        let supports: [Arc<dyn RebindSupport>; 3] = [
            Arc::new(LocationRebindSupport),
            Arc::new(EntityRebindSupport::entity()),
            Arc::new(EntityRebindSupport::application()),
        ];
        Self {
            supports: supports.into_iter().map(|s| (s.kind(), s)).collect(),
        }
    }

    pub fn register<S: RebindSupport + 'static>(
        &mut self,
        support: S,
    ) -> Result<(), RegistryError> {
        let kind = support.kind();
        if self.supports.contains_key(&kind) {
            return Err(RegistryError::AlreadyRegistered(kind));
        }
        self.supports.insert(kind, Arc::new(support));
        Ok(())
    }

    pub fn get(&self, kind: ObjectKind) -> Option<Arc<dyn RebindSupport>> {
        self.supports.get(&kind).cloned()
    }

    /// Registered kinds, sorted.
    pub fn registered_kinds(&self) -> Vec<ObjectKind> {
        let mut kinds: Vec<_> = self.supports.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut registry = SupportRegistry::new();
        registry.register(LocationRebindSupport).unwrap();

        assert!(registry.get(ObjectKind::Location).is_some());
        assert!(registry.get(ObjectKind::Entity).is_none());
    }

    #[test]
    fn test_double_registration() {
        let mut registry = SupportRegistry::new();
        registry.register(EntityRebindSupport::entity()).unwrap();
        let result = registry.register(EntityRebindSupport::entity());
        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered(ObjectKind::Entity))
        ));
    }

    #[test]
    fn test_standard_covers_every_kind() {
        let registry = SupportRegistry::standard();
        assert_eq!(registry.registered_kinds().len(), 3);
        assert!(registry.get(ObjectKind::Application).unwrap().supports_feeds());
        assert!(!registry.get(ObjectKind::Location).unwrap().supports_feeds());
    }

    #[test]
    fn test_registered_kinds() {
        let mut registry = SupportRegistry::new();
        registry.register(LocationRebindSupport).unwrap();
        registry.register(EntityRebindSupport::application()).unwrap();
        registry.register(EntityRebindSupport::entity()).unwrap();
        assert_eq!(
            registry.registered_kinds(),
            vec![ObjectKind::Application, ObjectKind::Entity, ObjectKind::Location]
        );
    }
}
