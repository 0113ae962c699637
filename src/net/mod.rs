//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! tokio TcpListener (implements Accept)
//!     → listener wrappers, first configured innermost
//!     → outermost Accept handed to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Listeners are poll-based trait objects so wrappers can be stacked
//!   at runtime from configuration

pub mod accept;

pub use accept::{accept, Accept};
