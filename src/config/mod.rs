//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! directive file + servers manifest (TOML)
//!     → loader.rs (parse directives, load manifest)
//!     → options (parse global options, apply to servers)
//!     → provision listener wrappers (fail early on bad modules)
//!     → Adapted { servers, warnings }
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs adapts again
//!     → atomic swap of Arc<Adapted>
//!     → update sent to subscribers
//! ```
//!
//! # Design Decisions
//! - Adapted configuration is immutable; changes require a full reload
//! - A failed reload never replaces the last good configuration
//! - Without a manifest, the default `:443` and `:80` servers are used

pub mod loader;
pub mod schema;
pub mod watcher;

pub use loader::{adapt, adapt_str, load_manifest, parse_directives, Adapted, ConfigError};
pub use schema::ServersManifest;
pub use watcher::ConfigWatcher;
