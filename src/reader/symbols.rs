//! Recognized multi-character symbols.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::OnceLock;

/// Comparison, logical, increment and path operators.
const STANDARD: &[&str] = &["==", "!=", ">=", "<=", "++", "--", "&&", "||", "::"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    #[error("invalid symbol {0:?}: expected exactly two single-byte characters")]
    InvalidSymbol(String),
}

/// An immutable set of two-character symbols.
///
/// The tokenizer consults this when it sees punctuation:
/// if the punctuation and the following byte form a member of the set,
/// they are emitted together as one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSet {
    symbols: BTreeSet<[u8; 2]>,
}

impl SymbolSet {
    /// Build a set from two-character lexemes.
    ///
    /// Characters are taken as Latin-1, so each must be at most U+00FF.
    pub fn new<I, S>(lexemes: I) -> Result<Self, SymbolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let symbols = lexemes
            .into_iter()
            .map(|s| encode(s.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(SymbolSet { symbols })
    }

    /// The default set, shared process-wide.
    pub fn standard() -> &'static SymbolSet {
        static SET: OnceLock<SymbolSet> = OnceLock::new();
        SET.get_or_init(|| SymbolSet::new(STANDARD).expect("could not build standard symbol set"))
    }

    /// A set that recognizes nothing; all punctuation becomes single-character symbols.
    pub fn empty() -> Self {
        SymbolSet {
            symbols: BTreeSet::new(),
        }
    }

    pub fn is_two_char_symbol(&self, candidate: [u8; 2]) -> bool {
        self.symbols.contains(&candidate)
    }

    pub fn contains(&self, lexeme: &str) -> bool {
        encode(lexeme).is_ok_and(|candidate| self.is_two_char_symbol(candidate))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The symbols in byte order.
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        self.symbols
            .iter()
            .map(|pair| pair.iter().copied().map(char::from).collect())
    }
}

/// Parses a list of symbols separated by whitespace or commas, e.g. `"== != <="`.
impl FromStr for SymbolSet {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymbolSet::new(
            s.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty()),
        )
    }
}

fn encode(lexeme: &str) -> Result<[u8; 2], SymbolError> {
    let mut chars = lexeme.chars().map(u8::try_from);
    match (chars.next(), chars.next(), chars.next()) {
        (Some(Ok(a)), Some(Ok(b)), None) => Ok([a, b]),
        _ => Err(SymbolError::InvalidSymbol(lexeme.to_owned())),
    }
}
