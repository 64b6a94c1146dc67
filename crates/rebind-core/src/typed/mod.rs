//! Typed - 型付き設定キー API
//!
//! このモジュールはキー名の typo と読み出し型の食い違いを型で排除します。

pub mod config_type;
pub mod key;

pub use self::config_type::ConfigType;
pub use self::key::ConfigKey;
