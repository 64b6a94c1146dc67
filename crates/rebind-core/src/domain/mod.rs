//! Domain model (IDs, mementos, value types, errors).

pub mod errors;
pub mod ids;
pub mod memento;
pub mod value_type;

pub use self::errors::{CoercionError, ConfigError, RebindError, ResolveError, WorkError};
pub use self::ids::{Id, IdMarker, ObjectId, ObjectKind, RebindId, WorkId};
pub use self::memento::{Memento, MementoBuilder, MementoError};
pub use self::value_type::ValueType;
