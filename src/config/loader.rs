//! Loading a directive file and manifest into adapted servers.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::schema::ServersManifest;
use crate::directive::{self, ParseError};
use crate::http::HttpServer;
use crate::modules::{ModuleRegistry, RegistryError};
use crate::options::{apply_server_options, parse_global_options, ApplyError, GlobalOptions, Warning};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Directive(ParseError),
    Apply(ApplyError),
    Provision { server: String, source: RegistryError },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Manifest parse error: {}", e),
            ConfigError::Directive(e) => write!(f, "{}", e),
            ConfigError::Apply(e) => write!(f, "Applying options: {}", e),
            ConfigError::Provision { server, source } => {
                write!(f, "Provisioning server '{}': {}", server, source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Directive(e) => Some(e),
            ConfigError::Apply(e) => Some(e),
            ConfigError::Provision { source, .. } => Some(source),
        }
    }
}

/// Servers after global options were applied, with the warnings raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Adapted {
    pub servers: BTreeMap<String, HttpServer>,
    pub warnings: Vec<Warning>,
}

/// Load a server manifest from a TOML file.
pub fn load_manifest(path: &Path) -> Result<ServersManifest, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Parse the global options of a directive file.
///
/// A file without a global options block yields empty options.
pub fn parse_directives(
    input: &str,
    file: &str,
    registry: &ModuleRegistry,
    warnings: &mut Vec<Warning>,
) -> Result<GlobalOptions, ConfigError> {
    let blocks = directive::parse(input, file).map_err(ConfigError::Directive)?;

    let (global, sites) = match blocks.split_first() {
        Some((first, rest)) if first.is_global_options() => (Some(first), rest),
        _ => (None, blocks.as_slice()),
    };
    tracing::debug!(file, site_blocks = sites.len(), "Directive file parsed");

    match global {
        Some(block) => {
            parse_global_options(block, registry, warnings).map_err(ConfigError::Directive)
        }
        None => Ok(GlobalOptions::new()),
    }
}

/// Apply the directives in `input` to the servers of `manifest`.
pub fn adapt_str(
    input: &str,
    file: &str,
    manifest: ServersManifest,
    registry: &ModuleRegistry,
) -> Result<Adapted, ConfigError> {
    let mut warnings = Vec::new();
    let options = parse_directives(input, file, registry, &mut warnings)?;

    let mut servers = manifest.servers;
    apply_server_options(&mut servers, &options, &mut warnings).map_err(ConfigError::Apply)?;

    for (name, server) in &servers {
        server
            .provision_listener_wrappers(registry)
            .map_err(|source| ConfigError::Provision {
                server: name.clone(),
                source,
            })?;
    }

    for warning in &warnings {
        tracing::warn!(%warning, "Configuration warning");
    }
    Ok(Adapted { servers, warnings })
}

/// Load `config` and apply it to the servers in `manifest`, or to the
/// default servers when no manifest is given.
pub fn adapt(
    config: &Path,
    manifest: Option<&Path>,
    registry: &ModuleRegistry,
) -> Result<Adapted, ConfigError> {
    let input = fs::read_to_string(config).map_err(ConfigError::Io)?;
    let manifest = match manifest {
        Some(path) => load_manifest(path)?,
        None => ServersManifest::default_servers(),
    };

    let adapted = adapt_str(&input, &config.display().to_string(), manifest, registry)?;
    tracing::info!(
        config = %config.display(),
        servers = adapted.servers.len(),
        warnings = adapted.warnings.len(),
        "Configuration adapted"
    );
    Ok(adapted)
}
