//! HTTP server runtime configuration.
//!
//! # Responsibilities
//! - Hold the transport-level settings of one server instance
//! - Identify the server by its listen addresses when options are applied
//! - Decode configured listener wrappers and apply them to a listener
//!
//! # Design Decisions
//! - Zero durations and sizes mean "use the transport default"
//! - Listener wrappers stay encoded until the server is provisioned, so
//!   the option parser never needs to know their shape
//! - Wrappers are applied in declaration order: the first one wraps the
//!   raw listener, the last one is what the HTTP layer accepts from

use serde::{Deserialize, Serialize};

use crate::modules::{ListenerWrapper, ModuleRegistry, RawModule, RegistryError};
use crate::net::Accept;
use crate::values::{Duration, TriState};

fn is_zero(n: &usize) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One HTTP server instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpServer {
    /// Addresses the server listens on, e.g. `":443"` or `"10.0.0.1:80"`.
    pub listen: Vec<String>,

    /// Encoded listener wrappers, outermost last.
    #[serde(rename = "listener_wrappers", skip_serializing_if = "Vec::is_empty")]
    pub listener_wrappers_raw: Vec<RawModule>,

    /// Time allowed to read a whole request, body included.
    #[serde(skip_serializing_if = "Duration::is_zero")]
    pub read_timeout: Duration,

    #[serde(skip_serializing_if = "Duration::is_zero")]
    pub read_header_timeout: Duration,

    #[serde(skip_serializing_if = "Duration::is_zero")]
    pub write_timeout: Duration,

    /// Keep-alive idle time between requests.
    #[serde(skip_serializing_if = "Duration::is_zero")]
    pub idle_timeout: Duration,

    #[serde(skip_serializing_if = "is_zero")]
    pub max_header_bytes: usize,

    /// Accept cleartext HTTP/2.
    #[serde(skip_serializing_if = "is_false")]
    pub allow_h2c: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub experimental_http3: bool,

    /// Require TLS SNI to match the Host header.
    #[serde(skip_serializing_if = "TriState::is_unset")]
    pub strict_sni_host: TriState,
}

impl HttpServer {
    /// A server listening on `listen` with all transport defaults.
    pub fn new<I, S>(listen: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            listen: listen.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Whether `address` is one of this server's listen addresses (exact match).
    pub fn listens_on(&self, address: &str) -> bool {
        self.listen.iter().any(|listener| listener == address)
    }

    /// Decode the configured listener wrappers, in declaration order.
    pub fn provision_listener_wrappers(
        &self,
        registry: &ModuleRegistry,
    ) -> Result<Vec<Box<dyn ListenerWrapper>>, RegistryError> {
        self.listener_wrappers_raw
            .iter()
            .map(|raw| registry.load_listener_wrapper(raw))
            .collect()
    }
}

/// Apply `wrappers` to `listener`, first wrapper innermost.
pub fn wrap_listener(wrappers: &[Box<dyn ListenerWrapper>], listener: Box<dyn Accept>) -> Box<dyn Accept> {
    wrappers
        .iter()
        .fold(listener, |inner, wrapper| wrapper.wrap_listener(inner))
}
