//! Shared utilities for integration tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use edge_config::config::{adapt_str, Adapted, ServersManifest};
use edge_config::modules::ModuleRegistry;
use edge_config::HttpServer;

/// Build a manifest from `(name, listen addresses)` pairs.
pub fn manifest(defs: &[(&str, &[&str])]) -> ServersManifest {
    let servers: BTreeMap<String, HttpServer> = defs
        .iter()
        .map(|(name, listen)| (name.to_string(), HttpServer::new(listen.iter().copied())))
        .collect();
    ServersManifest { servers }
}

/// Adapt `input` against `manifest` with the standard modules.
pub fn adapt_with(input: &str, manifest: ServersManifest) -> Adapted {
    adapt_str(input, "Edgefile", manifest, &ModuleRegistry::with_standard_modules())
        .expect("configuration should adapt")
}

/// Write `contents` to `name` inside `dir` and return the path.
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write test file");
    path
}
