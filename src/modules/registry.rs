//! Module registry: ids to constructors and decoders.
//!
//! # Responsibilities
//! - Map module ids to factory and decode functions
//! - Resolve ids at parse time (instantiate blank modules)
//! - Resolve tags at provision time (decode encoded modules)
//!
//! # Design Decisions
//! - Plain function pointers; registration happens once at startup
//! - Lookups are in-process map reads with no side effects
//! - Duplicate ids are rejected rather than silently replaced

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::raw::RawModule;
use super::{ListenerWrapper, Module, ModuleId, LISTENER_NAMESPACE, LISTENER_WRAPPER_KEY};

/// Errors raised by registry lookups and decoding.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module not registered: {0}")]
    NotRegistered(String),

    #[error("module already registered: {0}")]
    Duplicate(String),

    #[error("encoded module has no '{key}' tag")]
    MissingTag { key: &'static str },

    #[error("decoding module '{id}': {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("module '{0}' is not a listener wrapper")]
    NotListenerWrapper(String),
}

type NewFn = fn() -> Box<dyn Module>;
type DecodeFn = fn(serde_json::Value) -> serde_json::Result<Box<dyn Module>>;

fn new_module<T>() -> Box<dyn Module>
where
    T: Module + Default + 'static,
{
    Box::new(T::default())
}

fn decode_module<T>(config: serde_json::Value) -> serde_json::Result<Box<dyn Module>>
where
    T: Module + DeserializeOwned + 'static,
{
    Ok(Box::new(serde_json::from_value::<T>(config)?))
}

/// How to build one kind of module.
#[derive(Clone, Copy)]
pub struct ModuleInfo {
    id: &'static str,
    new: NewFn,
    decode: DecodeFn,
}

impl ModuleInfo {
    /// Describe module type `T` under `id`.
    pub fn of<T>(id: &'static str) -> Self
    where
        T: Module + Default + DeserializeOwned + 'static,
    {
        Self {
            id,
            new: new_module::<T>,
            decode: decode_module::<T>,
        }
    }

    pub fn id(&self) -> ModuleId {
        ModuleId::new(self.id)
    }

    /// A blank, unconfigured instance.
    pub fn instantiate(&self) -> Box<dyn Module> {
        (self.new)()
    }

    /// An instance configured from its encoded payload.
    pub fn decode(&self, config: serde_json::Value) -> Result<Box<dyn Module>, RegistryError> {
        (self.decode)(config).map_err(|source| RegistryError::Decode {
            id: self.id.to_string(),
            source,
        })
    }
}

impl fmt::Debug for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInfo").field("id", &self.id).finish()
    }
}

/// All modules known to the process.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<&'static str, ModuleInfo>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the standard modules.
    pub fn with_standard_modules() -> Self {
        let mut registry = Self::new();
        super::standard::register(&mut registry);
        registry
    }

    pub fn register(&mut self, info: ModuleInfo) -> Result<(), RegistryError> {
        if self.modules.contains_key(info.id) {
            return Err(RegistryError::Duplicate(info.id.to_string()));
        }
        tracing::trace!(module = info.id, "Module registered");
        self.modules.insert(info.id, info);
        Ok(())
    }

    pub fn get_module(&self, id: &str) -> Result<&ModuleInfo, RegistryError> {
        self.modules
            .get(id)
            .ok_or_else(|| RegistryError::NotRegistered(id.to_string()))
    }

    /// Modules directly inside `namespace`, ordered by id.
    pub fn modules_in<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a ModuleInfo> + 'a {
        self.modules
            .values()
            .filter(move |info| info.id().namespace() == namespace)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Decode an encoded listener wrapper back into a live one.
    pub fn load_listener_wrapper(
        &self,
        raw: &RawModule,
    ) -> Result<Box<dyn ListenerWrapper>, RegistryError> {
        let name = raw.tag(LISTENER_WRAPPER_KEY).ok_or(RegistryError::MissingTag {
            key: LISTENER_WRAPPER_KEY,
        })?;
        let id = ModuleId::in_namespace(LISTENER_NAMESPACE, name);
        let info = self.get_module(id.as_str())?;
        let module = info.decode(raw.payload(LISTENER_WRAPPER_KEY))?;
        module
            .into_listener_wrapper()
            .ok_or_else(|| RegistryError::NotListenerWrapper(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Inert {
        #[serde(default)]
        level: u8,
    }

    impl Module for Inert {
        fn id(&self) -> ModuleId {
            ModuleId::new("listeners.inert")
        }

        fn encode(&self) -> serde_json::Result<serde_json::Value> {
            serde_json::to_value(self)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ModuleRegistry::new();
        registry.register(ModuleInfo::of::<Inert>("listeners.inert")).unwrap();

        let info = registry.get_module("listeners.inert").unwrap();
        assert_eq!(info.id().name(), "inert");
        assert_eq!(info.instantiate().id().as_str(), "listeners.inert");
        assert!(matches!(
            registry.get_module("listeners.missing"),
            Err(RegistryError::NotRegistered(id)) if id == "listeners.missing"
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ModuleRegistry::new();
        registry.register(ModuleInfo::of::<Inert>("listeners.inert")).unwrap();
        let err = registry
            .register(ModuleInfo::of::<Inert>("listeners.inert"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_standard_modules_in_namespace() {
        let registry = ModuleRegistry::with_standard_modules();
        let names: Vec<String> = registry
            .modules_in(LISTENER_NAMESPACE)
            .map(|info| info.id().name().to_string())
            .collect();
        assert_eq!(names, ["proxy_protocol", "tls"]);
    }

    #[test]
    fn test_load_listener_wrapper_errors() {
        let mut registry = ModuleRegistry::with_standard_modules();
        registry.register(ModuleInfo::of::<Inert>("listeners.inert")).unwrap();

        let untagged: RawModule = serde_json::from_str(r#"{"timeout": 5}"#).unwrap();
        assert!(matches!(
            registry.load_listener_wrapper(&untagged),
            Err(RegistryError::MissingTag { .. })
        ));

        let unknown: RawModule = serde_json::from_str(r#"{"wrapper": "nope"}"#).unwrap();
        assert!(matches!(
            registry.load_listener_wrapper(&unknown),
            Err(RegistryError::NotRegistered(_))
        ));

        let inert: RawModule = serde_json::from_str(r#"{"wrapper": "inert"}"#).unwrap();
        assert!(matches!(
            registry.load_listener_wrapper(&inert),
            Err(RegistryError::NotListenerWrapper(_))
        ));

        let malformed: RawModule =
            serde_json::from_str(r#"{"wrapper": "proxy_protocol", "allow": 7}"#).unwrap();
        assert!(matches!(
            registry.load_listener_wrapper(&malformed),
            Err(RegistryError::Decode { .. })
        ));
    }
}
