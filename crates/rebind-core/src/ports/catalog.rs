//! TypeCatalog port - 型名から ObjectType への解決

use std::sync::Arc;

use crate::rebind::ObjectType;

/// Resolves the type name recorded in a memento to its declaration.
pub trait TypeCatalog: Send + Sync {
    fn resolve(&self, type_name: &str) -> Option<Arc<dyn ObjectType>>;
}
