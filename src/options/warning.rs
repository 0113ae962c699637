//! Non-fatal diagnostics collected while parsing and applying options.

use std::fmt;

use serde::Serialize;

use crate::directive::Location;

/// A message for the operator that never stops a configuration load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            message: message.into(),
        }
    }

    /// A warning pointing at a place in the directive file.
    pub fn at(location: &Location, message: impl Into<String>) -> Self {
        Self {
            file: Some(location.file.to_string()),
            line: Some(location.line),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{file}:{line}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}
