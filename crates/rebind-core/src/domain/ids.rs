//! Domain identifiers (strongly-typed IDs).
//!
//! 2 種類の ID を扱います。
//! - **ObjectId**: 管理対象オブジェクトの ID。永続化されたスナップショットに
//!   記録され、再起動やフェイルオーバーを跨いで安定している必要があるため、
//!   文字列のまま保持します。
//! - **Id<T>**: プロセス内で発行する ID（unit of work, rebind pass）。
//!   ULID + Phantom type で `WorkId` と `RebindId` を型レベルで区別します。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// Identifier of a managed object (application, entity or location).
///
/// Stable across restarts: this is the value a memento is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The broad kind of a managed object.
///
/// Applications are entities as far as identifier lookup is concerned, so
/// they share the entity lookup space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Application,
    Entity,
    Location,
}

impl ObjectKind {
    /// The kind whose identifiers this kind is looked up among.
    pub fn lookup_space(self) -> ObjectKind {
        match self {
            ObjectKind::Application | ObjectKind::Entity => ObjectKind::Entity,
            ObjectKind::Location => ObjectKind::Location,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Application => "application",
            ObjectKind::Entity => "entity",
            ObjectKind::Location => "location",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"work-", "rebind-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は PhantomData で、実行時にはメモリを消費しませんが、
/// コンパイル時に型安全性を提供します。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型の定義
// ========================================

/// Unit of work のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Work {}

impl IdMarker for Work {
    fn prefix() -> &'static str {
        "work-"
    }
}

/// Rebind pass のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rebind {}

impl IdMarker for Rebind {
    fn prefix() -> &'static str {
        "rebind-"
    }
}

/// Identifier of a unit of work submitted to an execution context.
pub type WorkId = Id<Work>;

/// Identifier of one rebind pass (one batch of mementos).
pub type RebindId = Id<Rebind>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let work = WorkId::from_ulid(Ulid::new());
        let rebind = RebindId::from_ulid(Ulid::new());

        assert!(work.to_string().starts_with("work-"));
        assert!(rebind.to_string().starts_with("rebind-"));
        // let _: WorkId = rebind; // <- does not compile
    }

    #[test]
    fn object_ids_serialize_as_plain_strings() {
        let id = ObjectId::new("loc-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"loc-1\"");
        let back: ObjectId = serde_json::from_str("\"loc-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn applications_share_the_entity_lookup_space() {
        assert_eq!(ObjectKind::Application.lookup_space(), ObjectKind::Entity);
        assert_eq!(ObjectKind::Entity.lookup_space(), ObjectKind::Entity);
        assert_eq!(ObjectKind::Location.lookup_space(), ObjectKind::Location);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<WorkId>(), size_of::<Ulid>());
        assert_eq!(size_of::<RebindId>(), 16);
    }
}
