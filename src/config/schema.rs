//! Server manifest schema.
//!
//! The manifest lists the server instances to build before global
//! options are applied, each with its listen addresses and any transport
//! settings it starts out with.
//!
//! ```toml
//! [servers.srv0]
//! listen = [":443"]
//! idle_timeout = "30s"
//!
//! [servers.srv1]
//! listen = [":80"]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::http::HttpServer;

/// Root of a server manifest file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServersManifest {
    /// Server instances keyed by name.
    pub servers: BTreeMap<String, HttpServer>,
}

impl ServersManifest {
    /// The manifest used when none is given: one server per default port.
    pub fn default_servers() -> Self {
        let servers = [("srv0", ":443"), ("srv1", ":80")]
            .into_iter()
            .map(|(name, listen)| (name.to_string(), HttpServer::new([listen])))
            .collect();
        Self { servers }
    }
}
