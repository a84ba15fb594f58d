//! Token classification.
//!
//! Turns a raw matcher hit into a [`Token`]: whitespace gets its line-break
//! count, sequences get a punctuator class (aggregators first), and words
//! become keywords, identifiers or plain text depending on the context.

use std::sync::Arc;

use regex::Captures;

use crate::context::Context;
use crate::mode::Mode;
use crate::{Punctuator, Token, TokenId, TokenKind};

/// Which matcher group produced a hit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RawKind {
    Whitespace,
    Sequence,
    Word,
}

/// One matcher hit, before classification.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawMatch<'s> {
    pub kind: RawKind,
    pub text: &'s str,
    pub offset: usize,
}

impl<'s> RawMatch<'s> {
    /// Group 1 is whitespace, group 3 is a word; anything else is a sequence.
    pub fn from_captures(captures: &Captures<'s>) -> Option<Self> {
        let whole = captures.get(0)?;
        let kind = if captures.get(1).is_some() {
            RawKind::Whitespace
        } else if captures.get(3).is_some() {
            RawKind::Word
        } else {
            RawKind::Sequence
        };
        Some(RawMatch {
            kind,
            text: whole.as_str(),
            offset: whole.start(),
        })
    }
}

/// Link state of the stream at the point a token is synthesized.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Links {
    pub previous: Option<TokenId>,
    pub parent: Option<TokenId>,
    pub last: Option<TokenId>,
    /// Last significant token was a nonbreaker with no line break since.
    pub follows_nonbreaker: bool,
}

/// Classifies matches against one [`Mode`].
#[derive(Clone, Copy, Debug)]
pub struct TokenSynthesizer<'m> {
    mode: &'m Mode,
}

impl<'m> TokenSynthesizer<'m> {
    pub fn new(mode: &'m Mode) -> Self {
        TokenSynthesizer { mode }
    }

    pub(crate) fn synthesize(
        &self,
        raw: RawMatch<'_>,
        context: &Context,
        links: &Links,
        id: TokenId,
        hint: Arc<str>,
    ) -> Token {
        let mut punctuator = None;
        let mut line_breaks = None;

        let kind = match raw.kind {
            RawKind::Whitespace => {
                line_breaks = Some(count_line_breaks(raw.text));
                TokenKind::Whitespace
            }
            _ if context.is_comment() => TokenKind::Comment,
            RawKind::Sequence => {
                let has_previous = links.previous.is_some();
                let (kind, class) = self.classify_sequence(raw.text, context, has_previous);
                punctuator = class;
                kind
            }
            RawKind::Word => self.classify_word(raw.text, context, links.follows_nonbreaker),
        };

        Token {
            id,
            kind,
            text: raw.text.into(),
            offset: raw.offset,
            punctuator,
            line_breaks,
            hint,
            previous: links.previous,
            parent: links.parent,
            last: links.last,
        }
    }

    /// Kind and punctuator class of a non-whitespace, non-word match.
    ///
    /// Aggregators apply only when a token precedes this one.
    pub fn classify_sequence(
        &self,
        text: &str,
        context: &Context,
        has_previous: bool,
    ) -> (TokenKind, Option<Punctuator>) {
        if has_previous && context.forming() && self.mode.declares_aggregators() {
            let class = context
                .aggregators()
                .get_or_classify(text, |text| self.aggregate(text));
            if class.is_some() {
                return (TokenKind::Punctuator, class);
            }
        }

        let class = context
            .punctuators()
            .get_or_classify(text, |text| self.punctuate(text, context));
        if class.is_some() {
            return (TokenKind::Punctuator, class);
        }

        if context.forming() {
            if let Some(segment) = self
                .mode
                .patterns()
                .segments
                .iter()
                .find(|segment| segment.pattern.is_match(text))
            {
                return (TokenKind::Segment(Arc::clone(&segment.name)), None);
            }
        }

        (TokenKind::Sequence, None)
    }

    /// Assigner or combinator class, if `text` is one.
    pub fn aggregate(&self, text: &str) -> Option<Punctuator> {
        let mode = self.mode;
        if mode.assigners().includes(text) {
            Some(Punctuator::Assigner)
        } else if mode.combinators().includes(text) {
            Some(Punctuator::Combinator)
        } else {
            None
        }
    }

    /// Punctuator class of `text` in `context`, aggregators aside.
    pub fn punctuate(&self, text: &str, context: &Context) -> Option<Punctuator> {
        let mode = self.mode;
        let in_spans = || context.spans().is_some_and(|spans| spans.includes(text));

        if !context.forming() {
            return if in_spans() {
                Some(Punctuator::Span)
            } else if context.quotes().includes(text) {
                Some(Punctuator::Quote)
            } else {
                None
            };
        }

        if mode.nonbreakers().includes(text) {
            Some(Punctuator::Nonbreaker)
        } else if mode.operators().includes(text) {
            Some(Punctuator::Operator)
        } else if mode.comments().includes(text) {
            Some(Punctuator::Comment)
        } else if in_spans() {
            Some(Punctuator::Span)
        } else if context.quotes().includes(text) {
            Some(Punctuator::Quote)
        } else if mode.closures().includes(text) {
            Some(Punctuator::Closure)
        } else if mode.breakers().includes(text) {
            Some(Punctuator::Breaker)
        } else {
            None
        }
    }

    /// Word kind in `context`.
    ///
    /// A keyword directly after a nonbreaker (`a.default`) is a property name,
    /// unless a line break separates them.
    pub fn classify_word(
        &self,
        text: &str,
        context: &Context,
        follows_nonbreaker: bool,
    ) -> TokenKind {
        let mode = self.mode;
        if !context.forming() || !mode.is_wording() {
            return TokenKind::Text;
        }

        let word = text.trim();
        let patterns = mode.patterns();
        let keyword_shaped = patterns
            .maybe_keyword
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(word));

        if keyword_shaped && mode.keywords().includes(word) && !follows_nonbreaker {
            TokenKind::Keyword
        } else if patterns
            .maybe_identifier
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(word))
        {
            TokenKind::Identifier
        } else {
            TokenKind::Text
        }
    }
}

fn count_line_breaks(text: &str) -> u32 {
    let count = text.bytes().filter(|&b| b == b'\n').count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests;
