//! Grammar definitions.
//!
//! A [`Mode`] is the immutable, per-syntax grammar the engine is driven by:
//! a matcher regex plus symbol sets and opener-keyed closure tables. Modes
//! are built once through [`ModeBuilder`] and shared behind `Arc`.
//!
//! # Matcher contract
//!
//! The matcher must define (at least) three capture groups, tried in order:
//!
//! 1. whitespace
//! 2. sequence (punctuation)
//! 3. word
//!
//! A match where none of the three participates is treated as a sequence.
//!
//! # Caches
//!
//! Each Mode owns the memo tables the engine derives from it: the grouper
//! table, the root [`Context`], and the root punctuator/aggregator
//! classification tables. They are write-once per key, so concurrent scans of
//! one Mode share them without coordination beyond the lock.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::context::{ClassCache, Context, Contextualizer};
use crate::grouping::{GrouperCache, GroupingHooks};
use crate::{ModeError, Symbols};

/// Compile a grammar pattern, tagging failures with the syntax and role.
pub fn compile_pattern(
    syntax: &str,
    role: &'static str,
    pattern: &str,
) -> Result<Regex, ModeError> {
    Regex::new(pattern).map_err(|source| ModeError::Pattern {
        syntax: syntax.to_owned(),
        role,
        source,
    })
}

/// How a grouping recognizes its closing token.
#[derive(Clone, Debug)]
pub enum Closer {
    /// Exact token text.
    Text(Box<str>),
    /// Any token whose text matches (e.g. a line break ending a line comment).
    Pattern(Regex),
}

impl Closer {
    #[inline]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Closer::Text(closer) => &**closer == text,
            Closer::Pattern(pattern) => pattern.is_match(text),
        }
    }
}

impl From<&str> for Closer {
    fn from(text: &str) -> Self {
        Closer::Text(text.into())
    }
}

/// One entry of a comment, closure or span table.
#[derive(Clone, Debug)]
pub struct ClosureSpec {
    pub opener: Box<str>,
    pub closer: Closer,
    /// Matcher used while this grouping is on top (defaults to the Mode's).
    pub matcher: Option<Regex>,
    /// Quote characters recognized inside this grouping.
    pub quotes: Option<Symbols>,
    pub hooks: Option<Arc<dyn GroupingHooks>>,
}

impl ClosureSpec {
    pub fn new(opener: &str, closer: impl Into<Closer>) -> Self {
        ClosureSpec {
            opener: opener.into(),
            closer: closer.into(),
            matcher: None,
            quotes: None,
            hooks: None,
        }
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: Regex) -> Self {
        self.matcher = Some(matcher);
        self
    }

    #[must_use]
    pub fn with_quotes(mut self, quotes: Symbols) -> Self {
        self.quotes = Some(quotes);
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn GroupingHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }
}

/// Opener-keyed table of [`ClosureSpec`]s.
#[derive(Clone, Debug, Default)]
pub struct Closures {
    entries: FxHashMap<Box<str>, ClosureSpec>,
}

impl Closures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(opener, closer)` text pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        pairs
            .iter()
            .map(|&(opener, closer)| ClosureSpec::new(opener, closer))
            .collect()
    }

    /// Insert (or replace) the entry for `spec.opener`.
    #[must_use]
    pub fn with(mut self, spec: ClosureSpec) -> Self {
        self.insert(spec);
        self
    }

    pub fn insert(&mut self, spec: ClosureSpec) {
        self.entries.insert(spec.opener.clone(), spec);
    }

    #[inline]
    pub fn get(&self, opener: &str) -> Option<&ClosureSpec> {
        self.entries.get(opener)
    }

    #[inline]
    pub fn includes(&self, opener: &str) -> bool {
        self.entries.contains_key(opener)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn openers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(AsRef::as_ref)
    }
}

impl FromIterator<ClosureSpec> for Closures {
    fn from_iter<I: IntoIterator<Item = ClosureSpec>>(iter: I) -> Self {
        let mut closures = Closures::new();
        for spec in iter {
            closures.insert(spec);
        }
        closures
    }
}

/// A named pattern that reclassifies otherwise unclassified sequences.
#[derive(Clone, Debug)]
pub struct Segment {
    pub name: Arc<str>,
    pub pattern: Regex,
}

/// Optional word and segment patterns.
#[derive(Clone, Debug, Default)]
pub struct Patterns {
    pub maybe_identifier: Option<Regex>,
    /// Cheap pre-filter applied before the keyword set lookup.
    pub maybe_keyword: Option<Regex>,
    /// Tried in order; the first match names the token kind.
    pub segments: Vec<Segment>,
}

/// A per-syntax grammar definition.
pub struct Mode {
    syntax: Arc<str>,
    matcher: Regex,
    keywords: Symbols,
    assigners: Symbols,
    operators: Symbols,
    combinators: Symbols,
    nonbreakers: Symbols,
    breakers: Symbols,
    quotes: Symbols,
    comments: Closures,
    closures: Closures,
    spans: FxHashMap<Box<str>, Arc<Closures>>,
    patterns: Patterns,

    pub(crate) groupers: GrouperCache,
    pub(crate) root_context: OnceCell<Arc<Context>>,
    pub(crate) punctuators: Arc<ClassCache>,
    pub(crate) aggregators: Arc<ClassCache>,
}

impl Mode {
    pub fn builder(syntax: &str, matcher: &str) -> ModeBuilder {
        ModeBuilder::new(syntax, matcher)
    }

    #[inline]
    pub fn syntax(&self) -> &Arc<str> {
        &self.syntax
    }

    #[inline]
    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub fn keywords(&self) -> &Symbols {
        &self.keywords
    }

    pub fn assigners(&self) -> &Symbols {
        &self.assigners
    }

    pub fn operators(&self) -> &Symbols {
        &self.operators
    }

    pub fn combinators(&self) -> &Symbols {
        &self.combinators
    }

    pub fn nonbreakers(&self) -> &Symbols {
        &self.nonbreakers
    }

    pub fn breakers(&self) -> &Symbols {
        &self.breakers
    }

    pub fn quotes(&self) -> &Symbols {
        &self.quotes
    }

    pub fn comments(&self) -> &Closures {
        &self.comments
    }

    pub fn closures(&self) -> &Closures {
        &self.closures
    }

    /// Span table nested inside the quote opened by `quote`.
    pub fn spans(&self, quote: &str) -> Option<&Arc<Closures>> {
        self.spans.get(quote)
    }

    pub fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    /// Whether words can classify beyond plain `text`.
    pub fn is_wording(&self) -> bool {
        !self.keywords.is_empty() || self.patterns.maybe_identifier.is_some()
    }

    /// Whether the aggregator pass runs at all.
    pub fn declares_aggregators(&self) -> bool {
        !self.assigners.is_empty() || !self.combinators.is_empty()
    }

    pub fn contextualizer(&self) -> Contextualizer<'_> {
        Contextualizer::new(self)
    }

    /// Number of grouping definitions minted so far.
    pub fn grouper_count(&self) -> usize {
        self.groupers.len()
    }
}

impl fmt::Debug for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mode")
            .field("syntax", &self.syntax)
            .field("matcher", &self.matcher.as_str())
            .field("groupers", &self.groupers.len())
            .finish_non_exhaustive()
    }
}

/// Incremental [`Mode`] construction. Patterns are compiled in [`build`](Self::build).
#[derive(Debug)]
pub struct ModeBuilder {
    syntax: String,
    matcher: String,
    keywords: Symbols,
    assigners: Symbols,
    operators: Symbols,
    combinators: Symbols,
    nonbreakers: Symbols,
    breakers: Symbols,
    quotes: Symbols,
    comments: Closures,
    closures: Closures,
    spans: FxHashMap<Box<str>, Closures>,
    maybe_identifier: Option<String>,
    maybe_keyword: Option<String>,
    segments: Vec<(String, String)>,
}

impl ModeBuilder {
    pub fn new(syntax: &str, matcher: &str) -> Self {
        ModeBuilder {
            syntax: syntax.to_owned(),
            matcher: matcher.to_owned(),
            keywords: Symbols::new(),
            assigners: Symbols::new(),
            operators: Symbols::new(),
            combinators: Symbols::new(),
            nonbreakers: Symbols::new(),
            breakers: Symbols::new(),
            quotes: Symbols::new(),
            comments: Closures::new(),
            closures: Closures::new(),
            spans: FxHashMap::default(),
            maybe_identifier: None,
            maybe_keyword: None,
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn keywords(mut self, words: &str) -> Self {
        self.keywords = Symbols::from_words(words);
        self
    }

    #[must_use]
    pub fn assigners(mut self, words: &str) -> Self {
        self.assigners = Symbols::from_words(words);
        self
    }

    #[must_use]
    pub fn operators(mut self, words: &str) -> Self {
        self.operators = Symbols::from_words(words);
        self
    }

    #[must_use]
    pub fn combinators(mut self, words: &str) -> Self {
        self.combinators = Symbols::from_words(words);
        self
    }

    #[must_use]
    pub fn nonbreakers(mut self, words: &str) -> Self {
        self.nonbreakers = Symbols::from_words(words);
        self
    }

    #[must_use]
    pub fn breakers(mut self, words: &str) -> Self {
        self.breakers = Symbols::from_words(words);
        self
    }

    #[must_use]
    pub fn quotes(mut self, words: &str) -> Self {
        self.quotes = Symbols::from_words(words);
        self
    }

    #[must_use]
    pub fn comments(mut self, comments: Closures) -> Self {
        self.comments = comments;
        self
    }

    #[must_use]
    pub fn closures(mut self, closures: Closures) -> Self {
        self.closures = closures;
        self
    }

    /// Spans opened inside the quote `quote` (e.g. `${` inside a backtick).
    #[must_use]
    pub fn spans(mut self, quote: &str, spans: Closures) -> Self {
        self.spans.insert(quote.into(), spans);
        self
    }

    #[must_use]
    pub fn maybe_identifier(mut self, pattern: &str) -> Self {
        self.maybe_identifier = Some(pattern.to_owned());
        self
    }

    #[must_use]
    pub fn maybe_keyword(mut self, pattern: &str) -> Self {
        self.maybe_keyword = Some(pattern.to_owned());
        self
    }

    #[must_use]
    pub fn segment(mut self, name: &str, pattern: &str) -> Self {
        self.segments.push((name.to_owned(), pattern.to_owned()));
        self
    }

    pub fn build(self) -> Result<Mode, ModeError> {
        let syntax = self.syntax;
        let matcher = compile_pattern(&syntax, "matcher", &self.matcher)?;

        // captures_len counts the implicit whole-match group.
        let found = matcher.captures_len().saturating_sub(1);
        if found < 3 {
            return Err(ModeError::MatcherGroups { syntax, found });
        }

        let tables = [
            ("comments", &self.comments),
            ("closures", &self.closures),
        ];
        let spans = self.spans.values().map(|s| ("spans", s));
        for (table, closures) in tables.into_iter().chain(spans) {
            if closures.openers().any(str::is_empty) {
                return Err(ModeError::EmptyOpener { syntax, table });
            }
        }

        let maybe_identifier = self
            .maybe_identifier
            .as_deref()
            .map(|p| compile_pattern(&syntax, "maybe_identifier", p))
            .transpose()?;
        let maybe_keyword = self
            .maybe_keyword
            .as_deref()
            .map(|p| compile_pattern(&syntax, "maybe_keyword", p))
            .transpose()?;
        let segments = self
            .segments
            .iter()
            .map(|(name, pattern)| {
                Ok(Segment {
                    name: Arc::from(name.as_str()),
                    pattern: compile_pattern(&syntax, "segment", pattern)?,
                })
            })
            .collect::<Result<Vec<_>, ModeError>>()?;

        Ok(Mode {
            syntax: Arc::from(syntax.as_str()),
            matcher,
            keywords: self.keywords,
            assigners: self.assigners,
            operators: self.operators,
            combinators: self.combinators,
            nonbreakers: self.nonbreakers,
            breakers: self.breakers,
            quotes: self.quotes,
            comments: self.comments,
            closures: self.closures,
            spans: self
                .spans
                .into_iter()
                .map(|(quote, spans)| (quote, Arc::new(spans)))
                .collect(),
            patterns: Patterns {
                maybe_identifier,
                maybe_keyword,
                segments,
            },
            groupers: GrouperCache::default(),
            root_context: OnceCell::new(),
            punctuators: Arc::default(),
            aggregators: Arc::default(),
        })
    }
}
