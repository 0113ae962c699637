//! The global options block.
//!
//! This parser owns repeated `servers` entries and the legacy
//! `experimental_http3` flag. Other global options belong to other
//! parsers; they are skipped with a located warning.

use std::collections::{BTreeMap, HashSet};

use crate::directive::{ParseError, ServerBlock};
use crate::modules::ModuleRegistry;

use super::server::{parse_server_options, ServerOptions};
use super::warning::Warning;

/// Group name holding the ordered `servers` entries.
pub const SERVERS: &str = "servers";

/// Legacy flag enabling HTTP/3 on every server.
pub const EXPERIMENTAL_HTTP3: &str = "experimental_http3";

/// Value of one named global option group.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Flag(bool),
    Servers(Vec<ServerOptions>),
}

/// Parsed global options, keyed by group name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalOptions {
    groups: BTreeMap<String, OptionValue>,
}

impl GlobalOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: OptionValue) {
        self.groups.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.groups.get(name)
    }

    /// Boolean group `name`; absent or non-flag values read as false.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.groups.get(name), Some(OptionValue::Flag(true)))
    }

    /// The `servers` entries in declaration order, if any were given.
    pub fn servers(&self) -> Option<&[ServerOptions]> {
        match self.groups.get(SERVERS) {
            Some(OptionValue::Servers(entries)) => Some(entries),
            _ => None,
        }
    }

    /// Append one `servers` entry.
    pub fn push_server_options(&mut self, options: ServerOptions) {
        match self.groups.get_mut(SERVERS) {
            Some(OptionValue::Servers(entries)) => entries.push(options),
            _ => {
                self.groups
                    .insert(SERVERS.to_string(), OptionValue::Servers(vec![options]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Parse the global options `block`.
///
/// Entries that can never take effect are reported through `warnings`.
pub fn parse_global_options(
    block: &ServerBlock,
    registry: &ModuleRegistry,
    warnings: &mut Vec<Warning>,
) -> Result<GlobalOptions, ParseError> {
    let mut options = GlobalOptions::new();
    let mut seen_scopes: HashSet<String> = HashSet::new();
    let mut unscoped_seen = false;

    for segment in &block.segments {
        let mut d = segment.dispenser();
        match segment.directive() {
            SERVERS => {
                let entry = parse_server_options(&mut d, registry)?;
                let scope = entry.listener_address.clone();

                if unscoped_seen {
                    let shown = if scope.is_empty() { "all listeners" } else { scope.as_str() };
                    warnings.push(Warning::at(
                        &segment.location(),
                        format!(
                            "servers entry for {shown} follows an unscoped servers entry and will never be applied"
                        ),
                    ));
                } else if !seen_scopes.insert(scope.clone()) {
                    warnings.push(Warning::at(
                        &segment.location(),
                        format!("duplicate servers entry for '{scope}' will never be applied"),
                    ));
                }
                unscoped_seen |= scope.is_empty();

                options.push_server_options(entry);
            }
            EXPERIMENTAL_HTTP3 => {
                d.next();
                if d.next_arg() {
                    return Err(d.arg_err());
                }
                options.set(EXPERIMENTAL_HTTP3, OptionValue::Flag(true));
            }
            other => {
                tracing::debug!(option = other, "Skipping global option handled elsewhere");
                warnings.push(Warning::at(
                    &segment.location(),
                    format!("unrecognized global option '{other}' ignored"),
                ));
            }
        }
    }

    if options.flag(EXPERIMENTAL_HTTP3) && options.servers().is_some() {
        return Err(ParseError::Syntax {
            at: block.location.clone(),
            message: format!(
                "global option '{EXPERIMENTAL_HTTP3}' cannot be combined with '{SERVERS}'; \
                 use 'servers > protocol > experimental_http3' instead"
            ),
        });
    }

    tracing::debug!(
        servers = options.servers().map_or(0, <[ServerOptions]>::len),
        legacy_http3 = options.flag(EXPERIMENTAL_HTTP3),
        "Parsed global options"
    );
    Ok(options)
}
