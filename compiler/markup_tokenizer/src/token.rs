//! Tokens and the token arena.
//!
//! Tokens link to each other by [`TokenId`] rather than by reference:
//! `previous` forms a flat chain over the whole stream, `parent` points at the
//! token that opened the innermost enclosing grouping (a tree overlay), and
//! `last` points at the most recent non-whitespace token. A [`TokenList`]
//! collected from a scan is the arena those ids index into.

use std::fmt;
use std::sync::Arc;

/// Index of a token in emission order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TokenId(u32);

impl TokenId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        TokenId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Shift an id from a delegated stream into the outer stream.
    #[inline]
    #[must_use]
    pub(crate) const fn rebase(self, base: u32) -> Self {
        TokenId(self.0 + base)
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self.0)
    }
}

/// Semantic class of a non-alphanumeric token.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Punctuator {
    Nonbreaker,
    Operator,
    Comment,
    Span,
    Quote,
    Closure,
    Breaker,
    Assigner,
    Combinator,
    Opener,
    Closer,
}

impl Punctuator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Punctuator::Nonbreaker => "nonbreaker",
            Punctuator::Operator => "operator",
            Punctuator::Comment => "comment",
            Punctuator::Span => "span",
            Punctuator::Quote => "quote",
            Punctuator::Closure => "closure",
            Punctuator::Breaker => "breaker",
            Punctuator::Assigner => "assigner",
            Punctuator::Combinator => "combinator",
            Punctuator::Opener => "opener",
            Punctuator::Closer => "closer",
        }
    }

    /// Aggregators take precedence over every other punctuator class.
    pub const fn is_aggregator(self) -> bool {
        matches!(self, Punctuator::Assigner | Punctuator::Combinator)
    }
}

impl fmt::Display for Punctuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a token is.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TokenKind {
    /// Source the matcher skipped over (or could not match at all).
    Pre,
    Whitespace,
    /// Punctuation with no better classification.
    Sequence,
    /// A word in an inert region, or one that is neither keyword nor identifier.
    Text,
    Punctuator,
    Keyword,
    Identifier,
    /// Embedded source that could not be delegated.
    Code,
    Comment,
    /// A grammar-defined segment (e.g. `literal` for PostScript `/name`).
    Segment(Arc<str>),
}

impl TokenKind {
    pub fn as_str(&self) -> &str {
        match self {
            TokenKind::Pre => "pre",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Sequence => "sequence",
            TokenKind::Text => "text",
            TokenKind::Punctuator => "punctuator",
            TokenKind::Keyword => "keyword",
            TokenKind::Identifier => "identifier",
            TokenKind::Code => "code",
            TokenKind::Comment => "comment",
            TokenKind::Segment(name) => name,
        }
    }

    #[inline]
    pub fn is_whitespace(&self) -> bool {
        matches!(self, TokenKind::Whitespace)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scanned unit.
///
/// `offset` is a byte offset into the *immediate* source: tokens produced by
/// a delegated scan are relative to the delegated slice.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub kind: TokenKind,
    pub text: Box<str>,
    pub offset: usize,
    pub punctuator: Option<Punctuator>,
    /// Newline count; set on whitespace tokens only.
    pub line_breaks: Option<u32>,
    /// Active hinters followed by `in-<goal>`.
    pub hint: Arc<str>,
    pub previous: Option<TokenId>,
    pub parent: Option<TokenId>,
    pub last: Option<TokenId>,
}

impl Token {
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    /// `punctuator` when present, otherwise the kind name.
    pub fn label(&self) -> &str {
        match self.punctuator {
            Some(punctuator) => punctuator.as_str(),
            None => self.kind.as_str(),
        }
    }

    #[inline]
    pub fn is_significant(&self) -> bool {
        !self.kind.is_whitespace()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} @ {} [{}]",
            self.label(),
            self.text,
            self.offset,
            self.hint
        )
    }
}

/// Arena of tokens indexed by [`TokenId`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.index())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    pub fn previous(&self, token: &Token) -> Option<&Token> {
        token.previous.and_then(|id| self.get(id))
    }

    pub fn parent(&self, token: &Token) -> Option<&Token> {
        token.parent.and_then(|id| self.get(id))
    }

    /// Walk the `parent` chain outwards, innermost first.
    pub fn ancestors<'a>(&'a self, token: &'a Token) -> impl Iterator<Item = &'a Token> + 'a {
        std::iter::successors(self.parent(token), move |t| self.parent(t))
    }

    /// Concatenated token text. Equals the scanned source.
    pub fn source(&self) -> String {
        self.tokens.iter().map(|t| &*t.text).collect()
    }
}

impl FromIterator<Token> for TokenList {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        let tokens: Vec<Token> = iter.into_iter().collect();
        debug_assert!(
            tokens.iter().enumerate().all(|(i, t)| t.id.index() == i),
            "token ids must follow emission order"
        );
        TokenList { tokens }
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl std::ops::Index<TokenId> for TokenList {
    type Output = Token;

    fn index(&self, id: TokenId) -> &Token {
        &self.tokens[id.index()]
    }
}
