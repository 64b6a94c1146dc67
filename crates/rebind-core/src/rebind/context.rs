//! BatchContext - 1 回の rebind pass に閉じた RebindContext

use std::sync::Arc;

use tracing::trace;

use crate::domain::{ObjectId, ObjectKind, RebindId};
use crate::ports::RebindContext;

use super::arena::ObjectArena;
use super::live::LiveObject;

/// Read-only view of the arena while pass 2 of one batch runs.
pub struct BatchContext<'a> {
    rebind_id: RebindId,
    arena: &'a ObjectArena,
}

impl<'a> BatchContext<'a> {
    pub fn new(rebind_id: RebindId, arena: &'a ObjectArena) -> Self {
        Self { rebind_id, arena }
    }

    pub fn rebind_id(&self) -> RebindId {
        self.rebind_id
    }
}

impl RebindContext for BatchContext<'_> {
    fn lookup(&self, kind: ObjectKind, id: &ObjectId) -> Option<Arc<LiveObject>> {
        let found = self.arena.lookup(kind, id);
        if found.is_none() {
            trace!(rebind = %self.rebind_id, %kind, %id, "Lookup miss");
        }
        found
    }
}
