//! Rebind - 永続化スナップショットからライブオブジェクトグラフを再構築する
//!
//! # 主要コンポーネント
//! - **LiveObject / ObjectArena**: 再構築されたオブジェクトと、その ID 索引
//! - **ObjectType / FlagTable**: 型ごとの宣言済みキーとレガシーフラグ
//! - **RebindSupport**: 種類ごとの保存/復元戦略（Location, Entity）
//! - **GraphRebinder**: 2 パスでバッチ全体を rebind する

pub mod arena;
pub mod context;
pub mod entity;
pub mod live;
pub mod location;
pub mod object_type;
pub mod rebinder;
pub mod registry;
pub mod report;
pub mod restore;
pub mod support;

pub use self::arena::ObjectArena;
pub use self::context::BatchContext;
pub use self::entity::EntityRebindSupport;
pub use self::live::LiveObject;
pub use self::location::LocationRebindSupport;
pub use self::object_type::{FieldDescriptor, FlagTable, ObjectType};
pub use self::rebinder::GraphRebinder;
pub use self::registry::{RegistryError, SupportRegistry};
pub use self::report::{
    ConfigRestoreStats, MissingReference, ObjectFailure, RebindCounts, RebindReport, Relation,
};
pub use self::support::RebindSupport;
