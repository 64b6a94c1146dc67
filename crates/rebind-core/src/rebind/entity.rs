//! Entity / Application の rebind 戦略
//!
//! Location と違い、永続化された feed をライブオブジェクトに戻します。

use crate::domain::{Memento, ObjectKind, RebindError};

use super::live::LiveObject;
use super::support::RebindSupport;

#[derive(Debug, Clone, Copy)]
pub struct EntityRebindSupport {
    kind: ObjectKind,
}

impl EntityRebindSupport {
    pub fn entity() -> Self {
        Self {
            kind: ObjectKind::Entity,
        }
    }

    pub fn application() -> Self {
        Self {
            kind: ObjectKind::Application,
        }
    }
}

impl Default for EntityRebindSupport {
    fn default() -> Self {
        Self::entity()
    }
}

impl RebindSupport for EntityRebindSupport {
    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn supports_feeds(&self) -> bool {
        true
    }

    fn restore_feeds(&self, memento: &Memento, object: &LiveObject) -> Result<usize, RebindError> {
        Ok(super::restore::restore_feeds(memento, object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::entity;
    use serde_json::json;

    #[test]
    fn feeds_are_attached_and_replaced() {
        let object = entity("ent-1");
        let memento = Memento::builder("ent-1", "BasicEntity", ObjectKind::Entity)
            .feed(json!({ "type": "http", "period": "30s" }))
            .feed(json!({ "type": "ssh" }))
            .build()
            .unwrap();

        let support = EntityRebindSupport::entity();
        assert!(support.supports_feeds());
        assert_eq!(support.restore_feeds(&memento, &object).unwrap(), 2);
        assert_eq!(support.restore_feeds(&memento, &object).unwrap(), 2);
        assert_eq!(object.feeds().len(), 2);
        assert_eq!(object.feeds()[1], json!({ "type": "ssh" }));
    }

    #[test]
    fn applications_use_the_same_strategy() {
        assert_eq!(EntityRebindSupport::application().kind(), ObjectKind::Application);
        assert_eq!(EntityRebindSupport::default().kind(), ObjectKind::Entity);
    }
}
