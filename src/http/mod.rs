//! HTTP server subsystem.
//!
//! # Data Flow
//! ```text
//! manifest / defaults
//!     → server.rs (HttpServer transport settings)
//!     → options applied (timeouts, header limits, protocols, wrappers)
//!     → provision_listener_wrappers() → wrap_listener()
//! ```

pub mod server;

pub use server::{wrap_listener, HttpServer};
