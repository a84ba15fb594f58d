//! Hook results that redirect part of the source.

use std::sync::Arc;

use crate::grouping::GroupingStack;
use crate::{TokenId, TokenKind};

/// Read-only view of the scan handed to grouping hooks.
#[derive(Debug)]
pub struct ScanState<'a> {
    pub source: &'a str,
    /// Byte position just past the token that triggered the hook.
    pub index: usize,
    pub syntax: &'a str,
    /// Delegation nesting of the running scanner (0 for a top-level scan).
    pub depth: usize,
    pub stack: &'a GroupingStack,
    /// Opener of the grouping being opened or closed.
    pub opener: Option<&'a crate::Token>,
    pub last_significant: Option<TokenId>,
}

impl<'a> ScanState<'a> {
    /// Unscanned source after the triggering token.
    pub fn remaining(&self) -> &'a str {
        self.source.get(self.index..).unwrap_or_default()
    }
}

/// What a hook asks the scanner to do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delegation {
    /// Tokenize `source[offset..index]` with the tokenizer registered for
    /// `syntax`, then resume at `index`.
    Subrange {
        syntax: Arc<str>,
        offset: usize,
        index: usize,
    },
    /// Emit the given fragments in order, then resume at `index`.
    Fragments { fragments: Vec<Fragment>, index: usize },
}

impl Delegation {
    pub fn subrange(syntax: &str, offset: usize, index: usize) -> Self {
        Delegation::Subrange {
            syntax: Arc::from(syntax),
            offset,
            index,
        }
    }

    /// Where scanning resumes.
    pub fn index(&self) -> usize {
        match self {
            Delegation::Subrange { index, .. } | Delegation::Fragments { index, .. } => *index,
        }
    }
}

/// A piece of source a hook classified (or delegated) itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub offset: usize,
    /// Forced kind; when absent the fragment is classified like a match.
    pub kind: Option<TokenKind>,
    /// Tokenize the fragment with this syntax instead.
    pub syntax: Option<Arc<str>>,
}

impl Fragment {
    pub fn new(text: &str, offset: usize) -> Self {
        Fragment {
            text: text.to_owned(),
            offset,
            kind: None,
            syntax: None,
        }
    }

    pub fn typed(text: &str, offset: usize, kind: TokenKind) -> Self {
        Fragment {
            kind: Some(kind),
            ..Fragment::new(text, offset)
        }
    }

    pub fn embedded(syntax: &str, text: &str, offset: usize) -> Self {
        Fragment {
            syntax: Some(Arc::from(syntax)),
            ..Fragment::new(text, offset)
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}
