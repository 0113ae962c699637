//! Edge server configuration library.
//!
//! Parses the `servers` global option of a directive file and applies it
//! to a set of HTTP server instances.

// Front end
pub mod directive;
pub mod values;

// Modules and runtime
pub mod http;
pub mod modules;
pub mod net;

// Options and loading
pub mod config;
pub mod options;

pub use config::{adapt, Adapted, ConfigError, ServersManifest};
pub use http::HttpServer;
pub use modules::ModuleRegistry;
pub use options::{apply_server_options, parse_server_options, GlobalOptions, ServerOptions, Warning};
