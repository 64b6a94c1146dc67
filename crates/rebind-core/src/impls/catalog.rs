//! StaticCatalog - 起動時に固定される型カタログ

use std::collections::HashMap;
use std::sync::Arc;

use crate::ports::TypeCatalog;
use crate::rebind::ObjectType;

#[derive(Default, Clone)]
pub struct StaticCatalog {
    types: HashMap<String, Arc<dyn ObjectType>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `object_type`, replacing any type with the same name.
    pub fn with_type(mut self, object_type: Arc<dyn ObjectType>) -> Self {
        self.types
            .insert(object_type.type_name().to_string(), object_type);
        self
    }

    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl TypeCatalog for StaticCatalog {
    fn resolve(&self, type_name: &str) -> Option<Arc<dyn ObjectType>> {
        self.types.get(type_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::builtin;

    #[test]
    fn resolves_registered_types_only() {
        let catalog = builtin::catalog();
        assert_eq!(
            catalog.type_names(),
            vec!["BasicApplication", "BasicEntity", "LocalhostLocation", "SshLocation"]
        );
        let ssh = catalog.resolve(builtin::SSH_LOCATION).unwrap();
        assert_eq!(ssh.type_name(), "SshLocation");
        assert!(catalog.resolve("FtpLocation").is_none());
    }
}
