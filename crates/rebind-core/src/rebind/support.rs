//! RebindSupport - 種類ごとの保存/復元戦略
//!
//! # 学習ポイント
//! - 既定メソッド付き trait（共通アルゴリズムは `restore` に置き、
//!   種類ごとの差分だけを各実装で上書きする）
//! - `&dyn RebindContext` による参照解決の差し替え

use std::sync::Arc;

use crate::config::KeyDescriptor;
use crate::domain::{Memento, ObjectKind, RebindError};
use crate::ports::RebindContext;

use super::live::LiveObject;
use super::report::{ConfigRestoreStats, MissingReference};
use super::restore;

/// Serializes live objects of one kind and restores them from mementos.
pub trait RebindSupport: Send + Sync {
    fn kind(&self) -> ObjectKind;

    /// Whether `restore_feeds` is meaningful for this kind. The rebinder
    /// skips it otherwise.
    fn supports_feeds(&self) -> bool {
        false
    }

    /// Places the memento's persisted config on the object. Running it
    /// twice with the same memento leaves the same store.
    fn restore_config(
        &self,
        memento: &Memento,
        declared: &[KeyDescriptor],
        object: &LiveObject,
    ) -> Result<ConfigRestoreStats, RebindError> {
        restore::restore_config(memento, declared, object)
    }

    /// Attaches parent and children found through `context`, then runs the
    /// init hook once. Unresolved ids are returned, not raised.
    fn restore_relationships(
        &self,
        memento: &Memento,
        context: &dyn RebindContext,
        object: &Arc<LiveObject>,
    ) -> Vec<MissingReference> {
        restore::restore_relationships(memento, context, object)
    }

    /// Returns how many feeds were attached.
    fn restore_feeds(&self, memento: &Memento, object: &LiveObject) -> Result<usize, RebindError>;

    fn memento(&self, object: &LiveObject) -> Result<Memento, RebindError> {
        restore::memento_of(object)
    }
}
