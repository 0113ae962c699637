//! Pluggable module system.
//!
//! # Data Flow
//! ```text
//! parse time:
//!     "listeners.<name>" → registry.rs (lookup) → ModuleInfo::instantiate()
//!     → Module::as_unmarshaler() parses its own segment
//!     → Module::as_listener_wrapper() proves it can wrap listeners
//!     → raw.rs (tagged JSON: {"wrapper": "<name>", ...fields})
//!
//! provision time:
//!     RawModule → registry.rs (second lookup by tag) → ModuleInfo::decode()
//!     → Box<dyn ListenerWrapper> → wraps a net::Accept
//! ```
//!
//! # Design Decisions
//! - Capabilities are explicit accessor methods on `Module`, not downcasts;
//!   a missing capability is a typed error at the call site
//! - Module configuration stays opaque to the option parser; only the
//!   module itself knows its fields
//! - Ids are `namespace.name`; the name doubles as the tag in encoded form

pub mod raw;
pub mod registry;
pub mod standard;

use std::fmt;

use crate::directive::{Dispenser, ParseError};
use crate::net::Accept;

pub use raw::RawModule;
pub use registry::{ModuleInfo, ModuleRegistry, RegistryError};

/// Namespace holding listener wrapper modules.
pub const LISTENER_NAMESPACE: &str = "listeners";

/// Key carrying the module name inside an encoded listener wrapper.
pub const LISTENER_WRAPPER_KEY: &str = "wrapper";

/// Fully qualified module identifier, e.g. `listeners.proxy_protocol`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id for `name` inside `namespace`.
    pub fn in_namespace(namespace: &str, name: &str) -> Self {
        Self(format!("{namespace}.{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last dot.
    pub fn namespace(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(ns, _)| ns)
    }

    /// The last dot-separated label.
    pub fn name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, name)| name)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A configurable unit of functionality, constructed by the registry.
pub trait Module: Send + Sync + fmt::Debug {
    fn id(&self) -> ModuleId;

    /// Serialize this module's own configuration.
    fn encode(&self) -> serde_json::Result<serde_json::Value>;

    /// The directive-parsing capability, if supported.
    fn as_unmarshaler(&mut self) -> Option<&mut dyn UnmarshalDirectives> {
        None
    }

    /// The listener-wrapping capability, if supported.
    fn as_listener_wrapper(&self) -> Option<&dyn ListenerWrapper> {
        None
    }

    /// Convert into an owned listener wrapper, if supported.
    fn into_listener_wrapper(self: Box<Self>) -> Option<Box<dyn ListenerWrapper>> {
        None
    }
}

/// Modules that configure themselves from a directive segment.
pub trait UnmarshalDirectives {
    /// Parse the segment in `d`, which starts before the module's own name.
    fn unmarshal_directives(&mut self, d: &mut Dispenser) -> Result<(), ParseError>;
}

/// Modules that layer behavior over a network listener.
pub trait ListenerWrapper: Send + Sync + fmt::Debug {
    fn wrap_listener(&self, inner: Box<dyn Accept>) -> Box<dyn Accept>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id_parts() {
        let id = ModuleId::in_namespace(LISTENER_NAMESPACE, "proxy_protocol");
        assert_eq!(id.as_str(), "listeners.proxy_protocol");
        assert_eq!(id.namespace(), "listeners");
        assert_eq!(id.name(), "proxy_protocol");

        let bare = ModuleId::new("root");
        assert_eq!(bare.namespace(), "");
        assert_eq!(bare.name(), "root");
    }
}
