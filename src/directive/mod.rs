//! Directive file front end.
//!
//! # Data Flow
//! ```text
//! directive text
//!     → lexer.rs (words with file/line/column)
//!     → blocks.rs (global options block + site blocks, split into segments)
//!     → dispenser.rs (cursor handed to each directive parser)
//! ```
//!
//! # Design Decisions
//! - Nesting follows the text: a parser walks one block level at a time
//!   and recurses for nested blocks
//! - Segments are self-contained token lists, so a module can parse its
//!   own sub-grammar without access to the surrounding file
//! - Every error carries the location of the token that caused it

pub mod blocks;
pub mod dispenser;
pub mod error;
pub mod lexer;

pub use blocks::{parse_server_blocks, Segment, ServerBlock};
pub use dispenser::Dispenser;
pub use error::{Capability, Location, ParseError};
pub use lexer::{tokenize, Token};

/// Tokenize `input` and group it into blocks.
pub fn parse(input: &str, file: &str) -> Result<Vec<ServerBlock>, ParseError> {
    parse_server_blocks(tokenize(input, file)?)
}
