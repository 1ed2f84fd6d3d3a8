use std::collections::BTreeMap;

use thiserror::Error;

use super::{AksManagedIdentity, DomainMinimumTlsVersion, Plugin, PluginDescriptor};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("plugin already registered: {0}")]
    Duplicate(String),

    #[error("unknown plugin: {0}")]
    Unknown(String),
}

/// Rule plugins available to an assessment, keyed by rule id.
///
/// Plugins are registered explicitly; there is no discovery step.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<&'static str, Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every rule shipped with this crate
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_plugins(builtin_plugins())
    }

    /// Register each plugin in turn, failing on a repeated id
    pub fn from_plugins(
        plugins: impl IntoIterator<Item = Box<dyn Plugin>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for plugin in plugins {
            registry.register(plugin)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<(), RegistryError> {
        let id = plugin.id();
        if self.plugins.contains_key(id) {
            return Err(RegistryError::Duplicate(id.to_string()));
        }
        self.plugins.insert(id, plugin);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Plugin> {
        self.plugins.get(id).map(|p| &**p)
    }

    /// Resolve a list of ids, failing on the first unknown one
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<&dyn Plugin>, RegistryError> {
        ids.iter()
            .map(|id| {
                let id = id.as_ref();
                self.get(id)
                    .ok_or_else(|| RegistryError::Unknown(id.to_string()))
            })
            .collect()
    }

    /// All plugins in id order
    pub fn plugins(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins.values().map(|p| &**p)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static PluginDescriptor> + '_ {
        self.plugins.values().map(|p| p.descriptor())
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.plugins.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

fn builtin_plugins() -> Vec<Box<dyn Plugin>> {
    vec![Box::new(DomainMinimumTlsVersion), Box::new(AksManagedIdentity)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_are_unique() {
        let registry = PluginRegistry::builtin().unwrap();
        assert_eq!(registry.len(), builtin_plugins().len());
        assert_eq!(registry.ids(), vec!["aksManagedIdentity", "domainMinimumTlsVersion"]);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = PluginRegistry::builtin().unwrap();
        let err = registry.register(Box::new(AksManagedIdentity)).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("aksManagedIdentity".to_string()));
    }

    #[test]
    fn test_from_plugins_rejects_repeated_ids() {
        let plugins: Vec<Box<dyn Plugin>> = vec![
            Box::new(DomainMinimumTlsVersion),
            Box::new(AksManagedIdentity),
            Box::new(DomainMinimumTlsVersion),
        ];
        assert_eq!(
            PluginRegistry::from_plugins(plugins).err(),
            Some(RegistryError::Duplicate("domainMinimumTlsVersion".to_string()))
        );
    }

    #[test]
    fn test_select() {
        let registry = PluginRegistry::builtin().unwrap();
        let selected = registry.select(&["domainMinimumTlsVersion"]).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].descriptor().category, "Event Grid");

        assert_eq!(
            registry.select(&["nope"]).err(),
            Some(RegistryError::Unknown("nope".to_string()))
        );
    }

    #[test]
    fn test_descriptors_declare_apis() {
        for descriptor in PluginRegistry::builtin().unwrap().descriptors() {
            assert!(descriptor.primary_api().is_some(), "{} has no apis", descriptor.id);
            assert!(!descriptor.realtime_triggers.is_empty());
        }
    }
}
