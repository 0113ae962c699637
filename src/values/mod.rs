//! Unit-aware option values.
//!
//! # Responsibilities
//! - Parse durations (`"1h30m"`, `"250ms"`, `"2d"`)
//! - Parse byte sizes (`"1MB"`, `"16KiB"`)
//! - Model tri-state booleans (unset / true / false)
//!
//! # Design Decisions
//! - Zero means "unset" for durations and sizes, matching the server defaults
//! - Parse errors carry the offending input; callers add positional context

pub mod duration;
pub mod size;
pub mod tristate;

pub use duration::{Duration, DurationError};
pub use size::{parse_bytes, SizeError};
pub use tristate::TriState;
