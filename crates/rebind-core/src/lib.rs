//! rebind-core
//!
//! 永続化されたスナップショットから、管理対象オブジェクト（application /
//! entity / location）のライブグラフを再構築するためのコア。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, memento, value_type, errors）
//! - **ports**: 抽象化レイヤー（RebindContext, ExecutionContext, TypeCoercer, TypeCatalog, Clock, IdGenerator）
//! - **config**: 設定キー、Deferred 値、オブジェクトごとの ConfigStore
//! - **typed**: 型付き設定 API（ConfigType, ConfigKey<T>）
//! - **rebind**: ライブオブジェクト、RebindSupport、GraphRebinder
//! - **app**: RebinderBuilder（起動時検証つきのワイヤリング）
//! - **impls**: 実装（tokio 実行、変換器レジストリ、静的カタログ、組み込み型）
//! - **settings**: RebindConfig（失敗モードとタイムアウト）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod rebind;
pub mod settings;
pub mod typed;

pub use self::app::{BuildError, RebinderBuilder};
pub use self::config::{ConfigStore, ConfigValue, Deferred, KeyDescriptor};
pub use self::domain::{ConfigError, Memento, ObjectId, ObjectKind, RebindError};
pub use self::rebind::{GraphRebinder, LiveObject, ObjectArena, RebindReport};
pub use self::settings::{FailureMode, RebindConfig, ResolveTimeouts};
pub use self::typed::{ConfigKey, ConfigType};
