//! Parse errors with positional context.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::modules::RegistryError;

/// A position in a directive file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    pub file: Arc<str>,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Capabilities a module may be required to expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Parses its own nested directive block.
    DirectiveParsing,
    /// Wraps a network listener.
    ListenerWrapping,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::DirectiveParsing => f.write_str("directive parsing"),
            Capability::ListenerWrapping => f.write_str("listener wrapping"),
        }
    }
}

/// Fatal errors raised while turning directive text into options.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed input: wrong argument count, unknown key, bad value.
    #[error("{at} - Error during parsing: {message}")]
    Syntax { at: Location, message: String },

    /// A directive named a module the registry does not know.
    #[error("{at} - finding listener module '{name}': {source}")]
    ModuleNotFound {
        at: Location,
        name: String,
        #[source]
        source: RegistryError,
    },

    /// A module was found but lacks a capability its position requires.
    #[error("{at} - module '{module}' does not support {capability}")]
    MissingCapability {
        at: Location,
        module: String,
        capability: Capability,
    },

    /// A configured module could not be encoded into its tagged form.
    #[error("{at} - encoding module '{module}': {source}")]
    Encode {
        at: Location,
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    pub fn location(&self) -> &Location {
        match self {
            ParseError::Syntax { at, .. }
            | ParseError::ModuleNotFound { at, .. }
            | ParseError::MissingCapability { at, .. }
            | ParseError::Encode { at, .. } => at,
        }
    }
}
