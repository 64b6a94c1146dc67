//! Location の rebind 戦略
//!
//! Location は feed を持たないので `restore_feeds` は常にエラーです。

use crate::domain::{Memento, ObjectKind, RebindError};

use super::live::LiveObject;
use super::support::RebindSupport;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocationRebindSupport;

impl RebindSupport for LocationRebindSupport {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Location
    }

    fn restore_feeds(&self, _memento: &Memento, object: &LiveObject) -> Result<usize, RebindError> {
        Err(RebindError::Unsupported {
            operation: "restore_feeds",
            kind: ObjectKind::Location,
            id: object.id().clone(),
        })
    }
}
