//! Per-grouping scanning contexts.
//!
//! A [`Context`] is everything the scanner needs while a particular grouping
//! is on top of the stack: the matcher, the closer to watch for, which quote
//! and span openers are live, and whether words classify as code (`forming`).
//!
//! Contexts are resolved once and memoized: the root context lives on the
//! [`Mode`], a grouping's context lives on the [`Grouping`]. Repeated entries
//! into the same grouping therefore hand back the same `Arc<Context>`.

use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::grouping::{Grouping, GroupingKind};
use crate::mode::{Closer, Closures, Mode};
use crate::{Punctuator, Symbols};

/// Memo table from sequence text to its punctuator class.
///
/// Negative results are cached too. Entries are written at most once, so a
/// racing second writer keeps the first value.
#[derive(Debug, Default)]
pub struct ClassCache {
    table: RwLock<FxHashMap<Box<str>, Option<Punctuator>>>,
}

impl ClassCache {
    pub fn get_or_classify(
        &self,
        text: &str,
        classify: impl FnOnce(&str) -> Option<Punctuator>,
    ) -> Option<Punctuator> {
        if let Some(&class) = self.table.read().get(text) {
            return class;
        }

        let class = classify(text);
        let mut table = self.table.write();
        *table.entry(text.into()).or_insert(class)
    }

    pub fn get(&self, text: &str) -> Option<Option<Punctuator>> {
        self.table.read().get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

/// Resolved scanning state for one grouping (or the root).
#[derive(Debug)]
pub struct Context {
    syntax: Arc<str>,
    goal: Arc<str>,
    punctuator: Option<GroupingKind>,
    punctuators: Arc<ClassCache>,
    aggregators: Arc<ClassCache>,
    closer: Option<Closer>,
    spans: Option<Arc<Closures>>,
    matcher: Regex,
    quotes: Symbols,
    forming: bool,
}

impl Context {
    #[inline]
    pub fn syntax(&self) -> &Arc<str> {
        &self.syntax
    }

    #[inline]
    pub fn goal(&self) -> &Arc<str> {
        &self.goal
    }

    /// Kind of the grouping this context belongs to; `None` at the root.
    #[inline]
    pub fn punctuator(&self) -> Option<GroupingKind> {
        self.punctuator
    }

    pub fn punctuators(&self) -> &ClassCache {
        &self.punctuators
    }

    pub fn aggregators(&self) -> &ClassCache {
        &self.aggregators
    }

    #[inline]
    pub fn closer(&self) -> Option<&Closer> {
        self.closer.as_ref()
    }

    /// Span openers live inside this context (only inside quotes that declare them).
    #[inline]
    pub fn spans(&self) -> Option<&Arc<Closures>> {
        self.spans.as_ref()
    }

    #[inline]
    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }

    #[inline]
    pub fn quotes(&self) -> &Symbols {
        &self.quotes
    }

    /// Whether scanning in this context classifies words as code.
    #[inline]
    pub fn forming(&self) -> bool {
        self.forming
    }

    pub fn is_comment(&self) -> bool {
        self.punctuator == Some(GroupingKind::Comment)
    }

    pub fn is_quote(&self) -> bool {
        self.punctuator == Some(GroupingKind::Quote)
    }

    /// Whether `text` is the closer this context is waiting for.
    #[inline]
    pub fn closes_on(&self, text: &str) -> bool {
        self.closer.as_ref().is_some_and(|closer| closer.matches(text))
    }
}

/// Resolves and memoizes [`Context`]s for one [`Mode`].
#[derive(Clone, Copy, Debug)]
pub struct Contextualizer<'m> {
    mode: &'m Mode,
}

impl<'m> Contextualizer<'m> {
    pub fn new(mode: &'m Mode) -> Self {
        Contextualizer { mode }
    }

    /// Context for `grouping`, or the root context for `None`.
    pub fn prime(&self, grouping: Option<&Grouping>) -> Arc<Context> {
        let context = match grouping {
            None => self
                .mode
                .root_context
                .get_or_init(|| Arc::new(self.root())),
            Some(grouping) => grouping
                .context
                .get_or_init(|| Arc::new(self.resolve(grouping))),
        };
        Arc::clone(context)
    }

    fn root(&self) -> Context {
        let mode = self.mode;
        tracing::trace!(syntax = %mode.syntax(), "resolved root context");
        Context {
            syntax: Arc::clone(mode.syntax()),
            goal: Arc::clone(mode.syntax()),
            punctuator: None,
            punctuators: Arc::clone(&mode.punctuators),
            aggregators: Arc::clone(&mode.aggregators),
            closer: None,
            spans: None,
            matcher: mode.matcher().clone(),
            quotes: mode.quotes().clone(),
            forming: true,
        }
    }

    fn resolve(&self, grouping: &Grouping) -> Context {
        let mode = self.mode;
        let forming = grouping.goal() == mode.syntax();

        // The root punctuator memo is only valid where the root quote set is:
        // a sequence that is an operator in code is plain text inside a string.
        let punctuators = if forming && grouping.quotes().is_none() {
            Arc::clone(&mode.punctuators)
        } else {
            Arc::default()
        };
        let aggregators = if forming {
            Arc::clone(&mode.aggregators)
        } else {
            Arc::default()
        };

        let quotes = match grouping.quotes() {
            Some(quotes) => quotes.clone(),
            None if forming => mode.quotes().clone(),
            None => Symbols::new(),
        };

        tracing::trace!(
            syntax = %mode.syntax(),
            hinter = %grouping.hinter(),
            opener = grouping.opener(),
            forming,
            "resolved grouping context"
        );

        Context {
            syntax: Arc::clone(mode.syntax()),
            goal: Arc::clone(grouping.goal()),
            punctuator: Some(grouping.kind()),
            punctuators,
            aggregators,
            closer: Some(grouping.closer().clone()),
            spans: grouping.spans().cloned(),
            matcher: grouping
                .matcher()
                .unwrap_or_else(|| mode.matcher())
                .clone(),
            quotes,
            forming,
        }
    }
}
