//! Global `servers` options: parsing and applying.
//!
//! # Data Flow
//! ```text
//! global options block
//!     → global.rs (dispatch by option name)
//!         → server.rs (one ServerOptions per `servers` entry)
//!     → GlobalOptions { "servers": [...], "experimental_http3": bool }
//!     → apply.rs (first match per server, wholesale overwrite)
//!     → HttpServer fields + Vec<Warning>
//! ```
//!
//! # Responsibilities
//! - Turn `servers` directives into typed option sets
//! - Validate module references in `listener_wrappers` at parse time
//! - Apply option sets to already constructed servers
//! - Report entries that can never apply, and deprecated options, as warnings

pub mod apply;
pub mod global;
pub mod server;
pub mod warning;

pub use apply::{apply_server_options, find_match, ApplyError, LEGACY_HTTP3_WARNING};
pub use global::{parse_global_options, GlobalOptions, OptionValue, EXPERIMENTAL_HTTP3, SERVERS};
pub use server::{parse_server_options, ServerOptions};
pub use warning::Warning;
