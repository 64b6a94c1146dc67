//! Impls - ports の実装と組み込みの型宣言
//!
//! # 含まれる実装
//! - **TokioExecutionContext**: tokio 上の ExecutionContext
//! - **ConverterRegistry**: 変換器の登録表による TypeCoercer
//! - **StaticCatalog**: 固定の TypeCatalog
//! - **BasicType** / **builtin**: 宣言的な ObjectType と組み込みの型

pub mod basic_type;
pub mod builtin;
pub mod catalog;
pub mod coercion;
pub mod tokio_execution;

pub use self::basic_type::{BasicType, BasicTypeBuilder};
pub use self::catalog::StaticCatalog;
pub use self::coercion::{ConverterRegistry, SourceRepr, TargetKind};
pub use self::tokio_execution::{TokioExecutionContext, TokioWorkHandle};
