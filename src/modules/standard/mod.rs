//! Built-in modules.

pub mod proxy_protocol;
pub mod tls;

use super::{ModuleInfo, ModuleRegistry};

pub use proxy_protocol::ProxyProtocol;
pub use tls::TlsPlaceholder;

/// Register every built-in module.
pub fn register(registry: &mut ModuleRegistry) {
    let builtins = [
        ModuleInfo::of::<TlsPlaceholder>(TlsPlaceholder::ID),
        ModuleInfo::of::<ProxyProtocol>(ProxyProtocol::ID),
    ];
    for info in builtins {
        if let Err(e) = registry.register(info) {
            tracing::warn!(error = %e, "Skipping built-in module");
        }
    }
}
