//! Streaming tokenizer for byte sources.
//!
//! Splits input into words, numbers, and symbols one byte at a time,
//! never holding more than the current token and a bounded pushback buffer in memory.
//!
//! ```
//! use streamlex::{PushbackReader, TokenKind, Tokenizer};
//!
//! let tokens: Vec<_> = Tokenizer::new(PushbackReader::new(&b"a==b"[..]))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(tokens[1].kind(), TokenKind::MultiCharSymbol);
//! ```

pub mod reader;

pub use reader::{
    classify, tokenize, CountingSource, PushbackReader, ReadErr, ReadResult, SymbolError,
    SymbolSet, Token, TokenKind, TokenOffset, Tokenizer, Unit, UnitSource,
};
