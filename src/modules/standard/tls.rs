//! `listeners.tls`: marks where TLS termination sits in a wrapper chain.
//!
//! The handshake itself is performed by the server after all wrappers
//! have been applied; wrappers listed before `tls` see raw TLS bytes and
//! wrappers listed after it see plaintext.

use serde::{Deserialize, Serialize};

use crate::directive::{Dispenser, ParseError};
use crate::modules::{ListenerWrapper, Module, ModuleId, UnmarshalDirectives};
use crate::net::Accept;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsPlaceholder {}

impl TlsPlaceholder {
    pub const ID: &'static str = "listeners.tls";
}

impl Module for TlsPlaceholder {
    fn id(&self) -> ModuleId {
        ModuleId::new(Self::ID)
    }

    fn encode(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn as_unmarshaler(&mut self) -> Option<&mut dyn UnmarshalDirectives> {
        Some(self)
    }

    fn as_listener_wrapper(&self) -> Option<&dyn ListenerWrapper> {
        Some(self)
    }

    fn into_listener_wrapper(self: Box<Self>) -> Option<Box<dyn ListenerWrapper>> {
        Some(self)
    }
}

impl UnmarshalDirectives for TlsPlaceholder {
    fn unmarshal_directives(&mut self, d: &mut Dispenser) -> Result<(), ParseError> {
        while d.next() {
            if d.next_arg() {
                return Err(d.arg_err());
            }
            if d.next_block(d.nesting()) {
                return Err(d.err("the tls listener wrapper takes no options"));
            }
        }
        Ok(())
    }
}

impl ListenerWrapper for TlsPlaceholder {
    fn wrap_listener(&self, inner: Box<dyn Accept>) -> Box<dyn Accept> {
        inner
    }
}
