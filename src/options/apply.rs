//! Applying parsed `servers` options to live servers.
//!
//! # Design Decisions
//! - First match in declaration order wins, even when a later entry is
//!   scoped to the exact address; order beats specificity
//! - A match overwrites every transport field, so anything the entry left
//!   unset is reset to its zero value
//! - Servers without a match keep their current settings

use std::collections::BTreeMap;
use std::fmt;

use crate::http::HttpServer;

use super::global::{GlobalOptions, EXPERIMENTAL_HTTP3};
use super::server::ServerOptions;
use super::warning::Warning;

pub const LEGACY_HTTP3_WARNING: &str = "the 'experimental_http3' global option is deprecated, \
please use the 'servers > protocol > experimental_http3' option instead";

/// Failure while applying options.
///
/// Applying currently cannot fail; the type keeps the error path in the
/// signature so callers already handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyError {}

impl fmt::Display for ApplyError {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for ApplyError {}

/// The first entry in `entries` that applies to `server`.
pub fn find_match<'a>(entries: &'a [ServerOptions], server: &HttpServer) -> Option<&'a ServerOptions> {
    entries.iter().find(|entry| entry.matches(server))
}

/// Apply the `servers` options and the legacy HTTP/3 flag to `servers`.
pub fn apply_server_options(
    servers: &mut BTreeMap<String, HttpServer>,
    options: &GlobalOptions,
    warnings: &mut Vec<Warning>,
) -> Result<(), ApplyError> {
    // Parsing rejects the legacy flag alongside `servers`, so this never
    // fights with the per-server setting below.
    if options.flag(EXPERIMENTAL_HTTP3) {
        warnings.push(Warning::new(LEGACY_HTTP3_WARNING));
        for server in servers.values_mut() {
            server.experimental_http3 = true;
        }
    }

    let Some(entries) = options.servers() else {
        return Ok(());
    };

    for (name, server) in servers.iter_mut() {
        match find_match(entries, server) {
            Some(entry) => {
                tracing::debug!(
                    server = %name,
                    scope = %entry.listener_address,
                    "Applying servers options"
                );
                entry.apply_to(server);
            }
            None => tracing::debug!(server = %name, "No servers options match"),
        }
    }
    Ok(())
}
