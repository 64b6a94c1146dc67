//! Configuration (keys, deferred values, per-object stores).

pub mod deferred;
pub mod key;
pub mod merge;
pub mod store;
pub mod value;

pub use self::deferred::{Completer, Deferred, DeferredState};
pub use self::key::{KeyDescriptor, KeyShape, NameMatch};
pub use self::merge::Fragment;
pub use self::store::{ConfigStore, StoreServices};
pub use self::value::ConfigValue;
