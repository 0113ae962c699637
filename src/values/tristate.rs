//! Three-valued boolean for options where "not mentioned" differs from "off".

use serde::{Deserialize, Serialize};

/// An optional boolean that keeps "unset" distinct from an explicit `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum TriState {
    /// Not configured; the consumer applies its own default.
    #[default]
    Unset,
    True,
    False,
}

impl TriState {
    pub fn is_unset(&self) -> bool {
        matches!(self, TriState::Unset)
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            TriState::Unset => None,
            TriState::True => Some(true),
            TriState::False => Some(false),
        }
    }

    /// Resolve against a default used when the value is unset.
    pub fn unwrap_or(self, default: bool) -> bool {
        self.as_option().unwrap_or(default)
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            TriState::True
        } else {
            TriState::False
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(TriState::Unset, TriState::from)
    }
}

impl From<TriState> for Option<bool> {
    fn from(value: TriState) -> Self {
        value.as_option()
    }
}
