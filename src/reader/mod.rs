//! Support for reading tokens from byte streams.

use std::io::ErrorKind;

pub use source::{CountingSource, PushbackReader, Unit, UnitSource, DEFAULT_PUSHBACK};
pub use symbols::{SymbolError, SymbolSet};
pub use token::{classify, Offsets, Token, TokenKind, TokenOffset, Tokenizer};

mod source;
mod symbols;
mod token;

/// Tokenize an in-memory buffer.
pub fn tokenize(input: &[u8]) -> ReadResult<Vec<Token>> {
    Tokenizer::new(PushbackReader::new(input)).collect()
}

/// Error type if a read does not complete.
///
/// Input itself can never be malformed: every byte is a letter, a digit, whitespace, or punctuation.
/// A read fails only when the underlying source faults,
/// or when a caller breaks the pushback contract.
/// All of these end the token sequence.
#[derive(Debug, thiserror::Error)]
pub enum ReadErr {
    /// The underlying source reported an I/O fault.
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] std::io::Error),
    /// More units were pushed back than the source can hold.
    #[error("pushback overflow: buffer holds at most {capacity} unit(s)")]
    PushbackOverflow { capacity: usize },
    /// The end-of-source marker was pushed back.
    #[error("invalid pushback: end of source cannot be pushed back")]
    InvalidPushback,
    /// A unit was pushed back with no successful read left to undo.
    #[error("invalid pushback: no preceding read to undo")]
    PushbackWithoutRead,
}

impl ReadErr {
    /// True if this error reflects a broken usage contract rather than a faulty source.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, ReadErr::SourceUnavailable(_))
    }
}

/// The main result type for this module.
pub type ReadResult<T> = Result<T, ReadErr>;

impl From<ReadErr> for std::io::Error {
    fn from(value: ReadErr) -> Self {
        match value {
            ReadErr::SourceUnavailable(e) => e,
            e @ ReadErr::PushbackOverflow { .. } => std::io::Error::new(ErrorKind::Other, e),
            e @ (ReadErr::InvalidPushback | ReadErr::PushbackWithoutRead) => {
                std::io::Error::new(ErrorKind::InvalidInput, e)
            }
        }
    }
}
