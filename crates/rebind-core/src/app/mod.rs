//! App - アプリケーション層
//!
//! ports と rebind を組み合わせて GraphRebinder を組み立てます。

pub mod builder;

pub use self::builder::{BuildError, RebinderBuilder};
