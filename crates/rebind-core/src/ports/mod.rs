//! Ports - 抽象化レイヤー
//!
//! Rebind core が外部の協調者に要求するインターフェースを定義します。
//! - RebindContext: バッチ内の ID 解決
//! - ExecutionContext: 遅延計算の submit / join / cancel
//! - TypeCoercer: 値の型変換
//! - TypeCatalog: 型名の解決
//! - Clock / IdGenerator: 時刻と ID（テストで差し替え可能）

pub mod catalog;
pub mod clock;
pub mod coercion;
pub mod execution;
pub mod id_generator;
pub mod rebind_context;

pub use self::catalog::TypeCatalog;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::coercion::TypeCoercer;
pub use self::execution::{ExecutionContext, UnitOfWork, WorkHandle};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::rebind_context::RebindContext;
