//! Errors raised while reading a regular expression.

use std::fmt;
use thiserror::Error;

/// The lookahead the parser was looking at when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found(pub Option<u8>);

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(byte) => write!(f, "'{}'", byte.escape_ascii()),
            None => f.write_str("end of input"),
        }
    }
}

/// The regex text does not conform to the grammar.
///
/// Offsets are byte positions into the source text. A parse either fully
/// succeeds or fails with one of these; no partial automaton is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected a symbol or '(' at offset {position}, found {found}")]
    UnexpectedToken { position: usize, found: Found },

    #[error("parenthesis opened at offset {open} is not closed (offset {position})")]
    UnclosedParenthesis { open: usize, position: usize },

    #[error("unexpected {found} at offset {position} after a complete expression")]
    TrailingInput { position: usize, found: Found },
}

impl ParseError {
    /// Byte offset at which the error was detected.
    pub fn position(&self) -> usize {
        match *self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnclosedParenthesis { position, .. }
            | ParseError::TrailingInput { position, .. } => position,
        }
    }
}
