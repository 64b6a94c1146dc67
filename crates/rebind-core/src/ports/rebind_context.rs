//! RebindContext port - rebind pass 内での ID → ライブオブジェクト解決

use std::sync::Arc;

use crate::domain::{ObjectId, ObjectKind};
use crate::rebind::LiveObject;

/// Resolves identifiers to live objects within one rebind batch.
///
/// Within a batch every id that has a memento resolves once pass 1 is done;
/// ids without one are simply not found. Implementations are shared
/// read-only by every restore call of the batch.
pub trait RebindContext: Send + Sync {
    fn lookup(&self, kind: ObjectKind, id: &ObjectId) -> Option<Arc<LiveObject>>;
}
