//! Custom entry types and field aliases
//!
//! A `Registry` is an explicitly constructed, shareable object that parsers and
//! serializers receive as `Arc<Registry>`. Registration is append-only and takes
//! an exclusive write lock; lookups take a shared read lock. `Registry::global()`
//! returns the process-wide instance.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::entry_type::{EntryType, FieldSchema};
use crate::error::RegistryError;

/// Aliases every new registry starts with
const DEFAULT_ALIASES: &[(&str, &str)] = &[("journaltitle", "journal"), ("location", "address")];

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<Registry> = Arc::new(Registry::new());
}

#[derive(Debug)]
pub struct Registry {
    types: RwLock<HashMap<String, FieldSchema>>,
    aliases: RwLock<HashMap<String, String>>,
}

impl Registry {
    /// A registry seeded with the default field aliases
    pub fn new() -> Self {
        let registry = Self::empty();
        {
            let mut aliases = registry
                .aliases
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for (alias, canonical) in DEFAULT_ALIASES {
                aliases.insert(alias.to_string(), canonical.to_string());
            }
        }
        registry
    }

    /// A registry with no custom types and no aliases
    pub fn empty() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            aliases: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry
    pub fn global() -> Arc<Registry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Register a custom entry type. Re-registering replaces the schema.
    pub fn register_type(
        &self,
        name: &str,
        schema: FieldSchema,
    ) -> Result<EntryType, RegistryError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if EntryType::standard(&name).is_some() {
            return Err(RegistryError::StandardTypeConflict(name));
        }

        let mut types = self
            .types
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        info!(entry_type = %name, required = ?schema.required, "Registered custom entry type");
        types.insert(name.clone(), schema);
        Ok(EntryType::Custom(name))
    }

    /// Register `alias` as another name for the `canonical` field
    pub fn register_alias(&self, alias: &str, canonical: &str) -> Result<(), RegistryError> {
        let alias = alias.trim().to_lowercase();
        let canonical = canonical.trim().to_lowercase();
        if alias.is_empty() || canonical.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if alias == canonical {
            return Err(RegistryError::SelfAlias(alias));
        }

        let mut aliases = self
            .aliases
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        debug!(%alias, %canonical, "Registered field alias");
        aliases.insert(alias, canonical);
        Ok(())
    }

    /// Resolve a type name: standard first, then registered custom types,
    /// otherwise `Unknown`.
    pub fn resolve_type(&self, name: &str) -> EntryType {
        if let Some(ty) = EntryType::standard(name) {
            return ty;
        }
        let name = name.trim().to_lowercase();
        let types = self
            .types
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if types.contains_key(&name) {
            EntryType::Custom(name)
        } else {
            EntryType::Unknown(name)
        }
    }

    /// Schema for any type this registry knows about
    pub fn schema(&self, ty: &EntryType) -> Option<FieldSchema> {
        if let Some(schema) = ty.standard_schema() {
            return Some(schema);
        }
        let types = self
            .types
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        types.get(ty.as_str()).cloned()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        let types = self
            .types
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        types.contains_key(&name.trim().to_lowercase())
    }

    /// Lower-cased canonical field name after alias resolution.
    ///
    /// Aliases are resolved one level deep.
    pub fn canonical_field(&self, name: &str) -> String {
        let name = name.trim().to_lowercase();
        let aliases = self
            .aliases
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        aliases.get(&name).cloned().unwrap_or(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_default_aliases() {
        let registry = Registry::new();
        assert_eq!(registry.canonical_field("JournalTitle"), "journal");
        assert_eq!(registry.canonical_field("location"), "address");
        assert_eq!(registry.canonical_field("Title"), "title");
        assert_eq!(Registry::empty().canonical_field("location"), "location");
    }

    #[test]
    fn test_register_custom_type() {
        let registry = Registry::new();
        let ty = registry
            .register_type("Software", FieldSchema::new(["author", "title"], ["version"]))
            .unwrap();
        assert_eq!(ty, EntryType::Custom("software".to_string()));
        assert!(matches!(registry.resolve_type("SOFTWARE"), EntryType::Custom(_)));
        assert!(registry.is_registered("software"));
        assert_eq!(registry.schema(&ty).unwrap().required, vec!["author", "title"]);
    }

    #[test]
    fn test_unregistered_type_is_unknown() {
        let registry = Registry::new();
        assert!(matches!(registry.resolve_type("dataset"), EntryType::Unknown(_)));
        assert_eq!(registry.resolve_type("Article"), EntryType::Article);
    }

    #[test]
    fn test_registration_errors() {
        let registry = Registry::new();
        assert_eq!(
            registry.register_type("article", FieldSchema::default()),
            Err(RegistryError::StandardTypeConflict("article".to_string()))
        );
        assert_eq!(
            registry.register_alias("title", "TITLE"),
            Err(RegistryError::SelfAlias("title".to_string()))
        );
        assert_eq!(registry.register_alias(" ", "x"), Err(RegistryError::EmptyName));
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry
                        .register_alias(&format!("alias{i}"), "note")
                        .unwrap();
                    registry.canonical_field(&format!("alias{i}"))
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "note");
        }
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&Registry::global(), &Registry::global()));
    }
}
