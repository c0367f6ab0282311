//! Module for extracting tokens from a byte stream.
//!
//! The tokenizer pulls one unit at a time from a [`UnitSource`]:
//! - Letters and digits accumulate into a pending token,
//!   which is classified when a non-alphanumeric unit (or the end of input) completes it.
//! - Whitespace separates tokens and is otherwise dropped.
//! - Anything else is punctuation. Punctuation is matched greedily against a [`SymbolSet`]:
//!   the tokenizer reads one more unit, and pushes it back if the pair is not a known symbol.
//!
//! Classification is ASCII-only; bytes are rendered into lexemes as Latin-1.

use std::fmt;
use std::iter::FusedIterator;

use crate::reader::{ReadResult, SymbolSet, Unit, UnitSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Letters only.
    Word,
    /// Digits only.
    Number,
    /// A single punctuation character.
    Symbol,
    /// Two punctuation characters that form a member of the symbol set.
    MultiCharSymbol,
    /// Letters and digits, interleaved.
    Mixed,
}

impl TokenKind {
    /// Label used when printing tokens.
    pub fn label(self) -> &'static str {
        match self {
            TokenKind::Word => "Word",
            TokenKind::Number => "Number",
            TokenKind::Symbol | TokenKind::MultiCharSymbol => "Symbol",
            TokenKind::Mixed => "Mixed/Unknown",
        }
    }
}

/// A classified run of input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    kind: TokenKind,
    lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The exact text of the token.
    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.lexeme)
    }
}

/// A token along with its starting position in the input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOffset {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

impl From<TokenOffset> for Token {
    fn from(value: TokenOffset) -> Self {
        value.token
    }
}

impl fmt::Display for TokenOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.line, self.column, self.token)
    }
}

/// Classify a run of letters and digits the way the tokenizer does.
///
/// Returns `None` if the run is empty or contains anything else.
pub fn classify(lexeme: &[u8]) -> Option<TokenKind> {
    if lexeme.is_empty() || !lexeme.iter().all(u8::is_ascii_alphanumeric) {
        return None;
    }
    if lexeme.iter().all(u8::is_ascii_digit) {
        Some(TokenKind::Number)
    } else if lexeme.iter().all(u8::is_ascii_alphabetic) {
        Some(TokenKind::Word)
    } else {
        Some(TokenKind::Mixed)
    }
}

/// ASCII whitespace, plus vertical tab and the information separators.
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t'..=b'\r' | 0x1c..=0x1f)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Line and column of the next unit; both 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    line: usize,
    column: usize,
}

impl Position {
    fn start() -> Self {
        Position { line: 1, column: 1 }
    }

    fn advance(&mut self, b: u8) {
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

/// Lazily splits a [`UnitSource`] into tokens.
///
/// The tokenizer is forward-only: once it returns `None` or an error, it is finished.
#[derive(Debug)]
pub struct Tokenizer<'s, S> {
    source: S,
    symbols: &'s SymbolSet,

    // Letters and digits of the token being formed.
    buffer: Vec<u8>,
    // Where the token in `buffer` started.
    start: Position,
    // Where the next unit read from `source` sits.
    position: Position,
    // Punctuation that ended the last word; handled on the next call.
    boundary: Option<(u8, Position)>,
    done: bool,
}

impl<S: UnitSource> Tokenizer<'static, S> {
    /// Tokenize with the standard symbol set.
    pub fn new(source: S) -> Self {
        Tokenizer::with_symbols(source, SymbolSet::standard())
    }
}

impl<'s, S: UnitSource> Tokenizer<'s, S> {
    pub fn with_symbols(source: S, symbols: &'s SymbolSet) -> Self {
        Tokenizer {
            source,
            symbols,
            buffer: Vec::new(),
            start: Position::start(),
            position: Position::start(),
            boundary: None,
            done: false,
        }
    }

    /// Get the next token, along with where it started.
    pub fn next_offset(&mut self) -> Option<ReadResult<TokenOffset>> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(token)) => {
                tracing::trace!(
                    line = token.line,
                    column = token.column,
                    "{}",
                    token.token
                );
                Some(Ok(token))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                if err.is_contract_violation() {
                    tracing::warn!("tokenizer stopped: {err}");
                }
                Some(Err(err))
            }
        }
    }

    /// Iterate over tokens along with their positions.
    pub fn offsets(self) -> Offsets<'s, S> {
        Offsets(self)
    }

    /// Recover the source. A pending boundary unit, if any, is lost.
    pub fn into_inner(self) -> S {
        self.source
    }

    fn read(&mut self) -> ReadResult<Option<(u8, Position)>> {
        let at = self.position;
        match self.source.read()? {
            Unit::Byte(b) => {
                self.position.advance(b);
                Ok(Some((b, at)))
            }
            Unit::End => Ok(None),
        }
    }

    fn step(&mut self) -> ReadResult<Option<TokenOffset>> {
        loop {
            let next = match self.boundary.take() {
                Some(pending) => Some(pending),
                None => self.read()?,
            };
            let Some((b, at)) = next else {
                return Ok(self.flush());
            };

            if b.is_ascii_alphanumeric() {
                if self.buffer.is_empty() {
                    self.start = at;
                }
                self.buffer.push(b);
            } else if !self.buffer.is_empty() {
                if !is_whitespace(b) {
                    self.boundary = Some((b, at));
                }
                return Ok(self.flush());
            } else if !is_whitespace(b) {
                return self.punctuation(b, at).map(Some);
            }
        }
    }

    /// Emit the pending word, number, or mixed run, if any.
    fn flush(&mut self) -> Option<TokenOffset> {
        if self.buffer.is_empty() {
            return None;
        }
        let kind = classify(&self.buffer).unwrap_or(TokenKind::Mixed);
        let token = Token::new(kind, latin1(&self.buffer));
        self.buffer.clear();
        Some(TokenOffset {
            token,
            line: self.start.line,
            column: self.start.column,
        })
    }

    /// Resolve punctuation, trying a two-character symbol first.
    fn punctuation(&mut self, first: u8, at: Position) -> ReadResult<TokenOffset> {
        let token = match self.source.read()? {
            Unit::Byte(second) if self.symbols.is_two_char_symbol([first, second]) => {
                self.position.advance(second);
                Token::new(TokenKind::MultiCharSymbol, latin1(&[first, second]))
            }
            Unit::End => Token::new(TokenKind::Symbol, latin1(&[first])),
            lookahead => {
                self.source.unread(lookahead)?;
                Token::new(TokenKind::Symbol, latin1(&[first]))
            }
        };
        Ok(TokenOffset {
            token,
            line: at.line,
            column: at.column,
        })
    }
}

impl<S: UnitSource> Iterator for Tokenizer<'_, S> {
    type Item = ReadResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_offset().map(|result| result.map(Token::from))
    }
}

impl<S: UnitSource> FusedIterator for Tokenizer<'_, S> {}

/// Iterator over tokens and their positions; see [`Tokenizer::offsets`].
#[derive(Debug)]
pub struct Offsets<'s, S>(Tokenizer<'s, S>);

impl<S: UnitSource> Iterator for Offsets<'_, S> {
    type Item = ReadResult<TokenOffset>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_offset()
    }
}

impl<S: UnitSource> FusedIterator for Offsets<'_, S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{CountingSource, PushbackReader, ReadErr};
    use proptest::prelude::*;
    use std::io::{ErrorKind, Read};

    fn tokens(input: &[u8]) -> ReadResult<Vec<Token>> {
        Tokenizer::new(PushbackReader::new(input)).collect()
    }

    fn tokens_with(input: &[u8], symbols: &SymbolSet) -> ReadResult<Vec<Token>> {
        Tokenizer::with_symbols(PushbackReader::new(input), symbols).collect()
    }

    fn word(s: &str) -> Token {
        Token::new(TokenKind::Word, s)
    }

    fn number(s: &str) -> Token {
        Token::new(TokenKind::Number, s)
    }

    fn sym(s: &str) -> Token {
        Token::new(TokenKind::Symbol, s)
    }

    fn multi(s: &str) -> Token {
        Token::new(TokenKind::MultiCharSymbol, s)
    }

    /// Yields its data, then fails.
    struct Failing<'a>(&'a [u8]);

    impl Read for Failing<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.0.is_empty() {
                return Err(std::io::Error::new(ErrorKind::UnexpectedEof, "truncated"));
            }
            self.0.read(buf)
        }
    }

    /// A source that refuses all pushback.
    struct NoPushback<R>(PushbackReader<R>);

    impl<R: Read> UnitSource for NoPushback<R> {
        fn read(&mut self) -> ReadResult<Unit> {
            self.0.read()
        }

        fn unread(&mut self, _unit: Unit) -> ReadResult<()> {
            Err(ReadErr::PushbackOverflow { capacity: 0 })
        }
    }

    #[test]
    fn single_symbol_between_words() -> ReadResult<()> {
        assert_eq!(tokens(b"a+b")?, vec![word("a"), sym("+"), word("b")]);
        Ok(())
    }

    #[test]
    fn greedy_two_char_symbol() -> ReadResult<()> {
        assert_eq!(tokens(b"a==b")?, vec![word("a"), multi("=="), word("b")]);
        Ok(())
    }

    #[test]
    fn fallback_restores_lookahead() -> ReadResult<()> {
        assert_eq!(tokens(b"a=b")?, vec![word("a"), sym("="), word("b")]);
        Ok(())
    }

    #[test]
    fn fallback_reprocesses_punctuation() -> ReadResult<()> {
        assert_eq!(
            tokens(b"a&&&b")?,
            vec![word("a"), multi("&&"), sym("&"), word("b")]
        );
        assert_eq!(
            tokens(b"x:::y")?,
            vec![word("x"), multi("::"), sym(":"), word("y")]
        );
        assert_eq!(tokens(b"<<=")?, vec![sym("<"), multi("<=")]);
        Ok(())
    }

    #[test]
    fn whitespace_is_dropped() -> ReadResult<()> {
        assert_eq!(tokens(b"a   b")?, vec![word("a"), word("b")]);
        assert_eq!(
            tokens(b"\ta\x0bb\x0cc\r\nd\x1fe ")?,
            vec![word("a"), word("b"), word("c"), word("d"), word("e")]
        );
        // Whitespace between punctuation blocks a two-character match.
        assert_eq!(tokens(b"= =")?, vec![sym("="), sym("=")]);
        Ok(())
    }

    #[test]
    fn classifies_runs() -> ReadResult<()> {
        assert_eq!(
            tokens(b"count 42 x1 9lives")?,
            vec![
                word("count"),
                number("42"),
                Token::new(TokenKind::Mixed, "x1"),
                Token::new(TokenKind::Mixed, "9lives"),
            ]
        );
        Ok(())
    }

    #[test]
    fn operators() -> ReadResult<()> {
        assert_eq!(
            tokens(b"if (i++ >= 10 || !done) j--;")?,
            vec![
                word("if"),
                sym("("),
                word("i"),
                multi("++"),
                multi(">="),
                number("10"),
                multi("||"),
                sym("!"),
                word("done"),
                sym(")"),
                word("j"),
                multi("--"),
                sym(";"),
            ]
        );
        Ok(())
    }

    #[test]
    fn punctuation_at_end() -> ReadResult<()> {
        assert_eq!(tokens(b"a+")?, vec![word("a"), sym("+")]);
        assert_eq!(tokens(b"!")?, vec![sym("!")]);
        assert_eq!(tokens(b"!=")?, vec![multi("!=")]);
        assert_eq!(tokens(b"b=\n")?, vec![word("b"), sym("=")]);
        Ok(())
    }

    #[test]
    fn empty_symbol_set() -> ReadResult<()> {
        let none = SymbolSet::empty();
        assert_eq!(
            tokens_with(b"a==b", &none)?,
            vec![word("a"), sym("="), sym("="), word("b")]
        );
        Ok(())
    }

    #[test]
    fn custom_symbol_set() -> ReadResult<()> {
        let arrows = SymbolSet::new(["->", "=>"]).unwrap();
        assert_eq!(
            tokens_with(b"f->g==h", &arrows)?,
            vec![word("f"), multi("->"), word("g"), sym("="), sym("="), word("h")]
        );
        Ok(())
    }

    #[test]
    fn high_bytes_are_symbols() -> ReadResult<()> {
        // "é" in UTF-8 is two bytes; each is its own Latin-1 symbol.
        assert_eq!(
            tokens("caf\u{e9}".as_bytes())?,
            vec![word("caf"), sym("\u{c3}"), sym("\u{a9}")]
        );
        assert_eq!(tokens(&[0xe9, b'x'])?, vec![sym("\u{e9}"), word("x")]);
        Ok(())
    }

    #[test]
    fn positions() -> ReadResult<()> {
        let got: Vec<(String, usize, usize)> =
            Tokenizer::new(PushbackReader::new(&b"ab\n  == c=\nd"[..]))
                .offsets()
                .map(|t| t.map(|t| (t.token.lexeme().to_owned(), t.line, t.column)))
                .collect::<ReadResult<_>>()?;
        let want = vec![
            ("ab".to_owned(), 1, 1),
            ("==".to_owned(), 2, 3),
            ("c".to_owned(), 2, 6),
            ("=".to_owned(), 2, 7),
            ("d".to_owned(), 3, 1),
        ];
        assert_eq!(got, want);
        Ok(())
    }

    #[test]
    fn display() {
        assert_eq!(word("abc").to_string(), "Word: abc");
        assert_eq!(number("7").to_string(), "Number: 7");
        assert_eq!(multi("==").to_string(), "Symbol: ==");
        assert_eq!(
            Token::new(TokenKind::Mixed, "a1").to_string(),
            "Mixed/Unknown: a1"
        );
        let offset = TokenOffset {
            token: sym("+"),
            line: 3,
            column: 9,
        };
        assert_eq!(offset.to_string(), "3:9 Symbol: +");
    }

    #[test]
    fn classify_lexemes() {
        assert_eq!(classify(b"abc"), Some(TokenKind::Word));
        assert_eq!(classify(b"123"), Some(TokenKind::Number));
        assert_eq!(classify(b"a1b"), Some(TokenKind::Mixed));
        assert_eq!(classify(b""), None);
        assert_eq!(classify(b"a b"), None);
        assert_eq!(classify(b"+"), None);
    }

    #[test]
    fn source_error_ends_sequence() {
        let mut tokenizer = Tokenizer::new(PushbackReader::new(Failing(b"ab+")));
        assert_eq!(tokenizer.next().unwrap().unwrap(), word("ab"));
        match tokenizer.next() {
            Some(Err(ReadErr::SourceUnavailable(e))) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("expected source error, got {:?}", other),
        }
        assert!(tokenizer.next().is_none());
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn pushback_failure_is_reported() {
        let source = NoPushback(PushbackReader::new(&b"a=b"[..]));
        let got: Vec<_> = Tokenizer::new(source).collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].as_ref().unwrap(), &word("a"));
        assert!(matches!(
            got[1],
            Err(ReadErr::PushbackOverflow { capacity: 0 })
        ));
    }

    #[test]
    fn not_restartable() -> ReadResult<()> {
        let mut tokenizer = Tokenizer::new(PushbackReader::new(&b"one"[..]));
        assert_eq!(tokenizer.next().transpose()?, Some(word("one")));
        assert_eq!(tokenizer.next().transpose()?, None);
        assert_eq!(tokenizer.next().transpose()?, None);
        Ok(())
    }

    #[test]
    fn counts_consumed_bytes() -> ReadResult<()> {
        let input = b"a <= b; c = d";
        let mut source = CountingSource::new(PushbackReader::new(&input[..]));
        let got = Tokenizer::new(&mut source).collect::<ReadResult<Vec<_>>>()?;
        assert_eq!(got.len(), 7);
        assert_eq!(source.consumed(), input.len());
        Ok(())
    }

    #[test]
    fn source_outlives_tokenizer() -> ReadResult<()> {
        let source = CountingSource::new(PushbackReader::new(&b"ab cd"[..]));
        let mut tokenizer = Tokenizer::new(source);
        assert_eq!(tokenizer.next().transpose()?, Some(word("ab")));
        let mut source = tokenizer.into_inner();
        assert_eq!(source.consumed(), 3);
        assert_eq!(source.read()?, Unit::Byte(b'c'));
        Ok(())
    }

    #[test]
    fn larger_pushback_capacity() -> ReadResult<()> {
        let source = PushbackReader::with_capacity(&b"a=b"[..], 4);
        let got = Tokenizer::new(source).collect::<ReadResult<Vec<_>>>()?;
        assert_eq!(got, vec![word("a"), sym("="), word("b")]);
        Ok(())
    }

    proptest! {
        #[test]
        fn letters_form_one_word(input in "[a-zA-Z]{1,64}") {
            let got = tokens(input.as_bytes()).unwrap();
            prop_assert_eq!(got, vec![word(&input)]);
        }

        #[test]
        fn digits_form_one_number(input in "[0-9]{1,64}") {
            let got = tokens(input.as_bytes()).unwrap();
            prop_assert_eq!(got, vec![number(&input)]);
        }

        #[test]
        fn reclassification_is_stable(input in prop::collection::vec(any::<u8>(), 0..256)) {
            for token in tokens(&input).unwrap() {
                let bytes: Vec<u8> = token.lexeme().chars().map(|c| c as u8).collect();
                match token.kind() {
                    TokenKind::Word | TokenKind::Number | TokenKind::Mixed => {
                        prop_assert_eq!(classify(&bytes), Some(token.kind()));
                    }
                    TokenKind::Symbol => {
                        prop_assert_eq!(bytes.len(), 1);
                    }
                    TokenKind::MultiCharSymbol => {
                        prop_assert!(SymbolSet::standard().is_two_char_symbol([bytes[0], bytes[1]]));
                    }
                }
            }
        }

        #[test]
        fn lexemes_cover_input(input in prop::collection::vec(any::<u8>(), 0..256)) {
            let joined: Vec<u8> = tokens(&input)
                .unwrap()
                .iter()
                .flat_map(|t| t.lexeme().chars().map(|c| c as u8).collect::<Vec<_>>())
                .collect();
            let want: Vec<u8> = input.iter().copied().filter(|&b| !is_whitespace(b)).collect();
            prop_assert_eq!(joined, want);
        }
    }
}
