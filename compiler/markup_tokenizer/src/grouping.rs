//! Groupings and the grouping stack.
//!
//! A [`Grouping`] is the resolved definition of one bracket-like construct:
//! a quote, a comment, a closure (`{ }`, `( )`...) or a span (template
//! interpolation inside a quote). Groupings are minted lazily the first time
//! an opener is seen and cached on the [`Mode`] by hinter and opener text.
//!
//! The [`GroupingStack`] tracks which groupings are open during a scan. It
//! relabels opener/closer tokens and maintains the goal and hint strings every
//! emitted token carries.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::context::Context;
use crate::delegation::{Delegation, ScanState};
use crate::mode::{Closer, ClosureSpec, Closures, Mode};
use crate::{Punctuator, Symbols, Token, TokenKind};

/// Callbacks fired when a grouping opens or closes.
///
/// Hooks run after the stack transition. Returning a [`Delegation`] hands the
/// next stretch of source to another tokenizer (or to explicit fragments).
pub trait GroupingHooks: Send + Sync + fmt::Debug {
    fn open(&self, token: &Token, state: &ScanState<'_>, context: &Context) -> Option<Delegation> {
        let _ = (token, state, context);
        None
    }

    fn close(&self, token: &Token, state: &ScanState<'_>, context: &Context) -> Option<Delegation> {
        let _ = (token, state, context);
        None
    }
}

/// The four grouping families.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum GroupingKind {
    Quote,
    Comment,
    Closure,
    Span,
}

impl GroupingKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            GroupingKind::Quote => "quote",
            GroupingKind::Comment => "comment",
            GroupingKind::Closure => "closure",
            GroupingKind::Span => "span",
        }
    }

    /// Label an opening token receives.
    pub const fn opener_label(self) -> Punctuator {
        match self {
            GroupingKind::Quote => Punctuator::Quote,
            GroupingKind::Comment => Punctuator::Comment,
            GroupingKind::Closure | GroupingKind::Span => Punctuator::Opener,
        }
    }

    /// Label a closing token receives.
    pub const fn closer_label(self) -> Punctuator {
        match self {
            GroupingKind::Quote => Punctuator::Quote,
            GroupingKind::Comment => Punctuator::Comment,
            GroupingKind::Closure | GroupingKind::Span => Punctuator::Closer,
        }
    }

    /// Kind given to transition tokens.
    fn token_kind(self) -> TokenKind {
        match self {
            GroupingKind::Comment => TokenKind::Comment,
            _ => TokenKind::Punctuator,
        }
    }
}

impl fmt::Display for GroupingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved definition of one grouping.
pub struct Grouping {
    kind: GroupingKind,
    syntax: Arc<str>,
    goal: Arc<str>,
    opener: Box<str>,
    closer: Closer,
    hinter: Arc<str>,
    matcher: Option<Regex>,
    quotes: Option<Symbols>,
    spans: Option<Arc<Closures>>,
    hooks: Option<Arc<dyn GroupingHooks>>,

    pub(crate) context: OnceCell<Arc<Context>>,
}

impl Grouping {
    /// Mint the grouping `text` opens in `mode`, if the relevant table has it.
    pub(crate) fn mint(
        kind: GroupingKind,
        mode: &Mode,
        context: &Context,
        text: &str,
    ) -> Option<Self> {
        let syntax = Arc::clone(mode.syntax());
        let goal: Arc<str> = match kind {
            GroupingKind::Closure => Arc::clone(&syntax),
            other => Arc::from(other.as_str()),
        };
        let hinter: Arc<str> = Arc::from(format!("{syntax}-{kind}"));

        let grouping = match kind {
            GroupingKind::Quote => Grouping {
                kind,
                goal,
                opener: text.into(),
                closer: Closer::from(text),
                hinter,
                matcher: None,
                quotes: None,
                spans: mode.spans(text).cloned(),
                hooks: None,
                syntax,
                context: OnceCell::new(),
            },
            GroupingKind::Comment => {
                Self::from_spec(kind, syntax, goal, hinter, mode.comments().get(text)?)
            }
            GroupingKind::Closure => {
                Self::from_spec(kind, syntax, goal, hinter, mode.closures().get(text)?)
            }
            GroupingKind::Span => {
                Self::from_spec(kind, syntax, goal, hinter, context.spans()?.get(text)?)
            }
        };
        Some(grouping)
    }

    fn from_spec(
        kind: GroupingKind,
        syntax: Arc<str>,
        goal: Arc<str>,
        hinter: Arc<str>,
        spec: &ClosureSpec,
    ) -> Self {
        Grouping {
            kind,
            syntax,
            goal,
            opener: spec.opener.clone(),
            closer: spec.closer.clone(),
            hinter,
            matcher: spec.matcher.clone(),
            quotes: spec.quotes.clone(),
            spans: None,
            hooks: spec.hooks.clone(),
            context: OnceCell::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> GroupingKind {
        self.kind
    }

    pub fn syntax(&self) -> &Arc<str> {
        &self.syntax
    }

    /// `syntax` for closures, otherwise the kind name.
    #[inline]
    pub fn goal(&self) -> &Arc<str> {
        &self.goal
    }

    pub fn opener(&self) -> &str {
        &self.opener
    }

    pub fn closer(&self) -> &Closer {
        &self.closer
    }

    /// `<syntax>-<kind>`; the hint fragment contributed while open.
    pub fn hinter(&self) -> &Arc<str> {
        &self.hinter
    }

    pub fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }

    pub fn quotes(&self) -> Option<&Symbols> {
        self.quotes.as_ref()
    }

    pub fn spans(&self) -> Option<&Arc<Closures>> {
        self.spans.as_ref()
    }

    pub fn open(
        &self,
        token: &Token,
        state: &ScanState<'_>,
        context: &Context,
    ) -> Option<Delegation> {
        self.hooks.as_ref()?.open(token, state, context)
    }

    pub fn close(
        &self,
        token: &Token,
        state: &ScanState<'_>,
        context: &Context,
    ) -> Option<Delegation> {
        self.hooks.as_ref()?.close(token, state, context)
    }
}

impl fmt::Debug for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grouping")
            .field("kind", &self.kind)
            .field("opener", &self.opener)
            .field("closer", &self.closer)
            .field("goal", &self.goal)
            .field("hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}

/// Grouping definitions minted for one Mode, keyed by `<hinter>,<opener>`.
#[derive(Debug, Default)]
pub(crate) struct GrouperCache {
    groupers: RwLock<FxHashMap<Box<str>, Arc<Grouping>>>,
}

impl GrouperCache {
    pub(crate) fn get_or_insert_with(
        &self,
        key: &str,
        mint: impl FnOnce() -> Option<Grouping>,
    ) -> Option<Arc<Grouping>> {
        if let Some(grouping) = self.groupers.read().get(key) {
            return Some(Arc::clone(grouping));
        }

        let grouping = mint()?;
        let mut groupers = self.groupers.write();
        // Another scan may have minted it while we held no lock.
        let entry = groupers
            .entry(key.into())
            .or_insert_with(|| Arc::new(grouping));
        Some(Arc::clone(entry))
    }

    pub(crate) fn len(&self) -> usize {
        self.groupers.read().len()
    }
}

/// A grouping on the stack together with the token that opened it.
#[derive(Clone, Debug)]
pub struct OpenGrouping {
    pub grouping: Arc<Grouping>,
    pub opener: Token,
}

/// Stack of open groupings for one scan.
#[derive(Debug)]
pub struct GroupingStack {
    syntax: Arc<str>,
    groupings: SmallVec<[OpenGrouping; 8]>,
    /// Active hinters in first-opened order, with open counts.
    hinters: SmallVec<[(Arc<str>, u32); 4]>,
    goal: Arc<str>,
    hint: Arc<str>,
}

impl GroupingStack {
    pub fn new(syntax: &Arc<str>) -> Self {
        GroupingStack {
            syntax: Arc::clone(syntax),
            groupings: SmallVec::new(),
            hinters: SmallVec::new(),
            goal: Arc::clone(syntax),
            hint: Arc::from(format!("in-{syntax}")),
        }
    }

    #[inline]
    pub fn top(&self) -> Option<&OpenGrouping> {
        self.groupings.last()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.groupings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groupings.is_empty()
    }

    /// Goal of the innermost grouping, or the syntax at the root.
    #[inline]
    pub fn goal(&self) -> &Arc<str> {
        &self.goal
    }

    /// Active hinters followed by `in-<goal>`.
    #[inline]
    pub fn hint(&self) -> &Arc<str> {
        &self.hint
    }

    /// Opening tokens, outermost first.
    pub fn openers(&self) -> impl Iterator<Item = &Token> {
        self.groupings.iter().map(|open| &open.opener)
    }

    /// Push the grouping `token` opens, if any, relabeling `token`.
    ///
    /// Quotes do not open inside quotes, and comments and closures open only
    /// outside quotes and comments. Spans open wherever the context lists them.
    pub fn open(
        &mut self,
        token: &mut Token,
        context: &Context,
        mode: &Mode,
    ) -> Option<Arc<Grouping>> {
        let punctuator = token.punctuator?;
        let text = &*token.text;

        let kind = match punctuator {
            Punctuator::Span if context.spans().is_some_and(|spans| spans.includes(text)) => {
                GroupingKind::Span
            }
            _ if context.is_quote() => return None,
            Punctuator::Quote => GroupingKind::Quote,
            _ if context.is_comment() => return None,
            Punctuator::Comment if mode.comments().includes(text) => GroupingKind::Comment,
            Punctuator::Closure if mode.closures().includes(text) => GroupingKind::Closure,
            _ => return None,
        };

        let key = format!("{}-{kind},{text}", mode.syntax());
        let grouping = mode
            .groupers
            .get_or_insert_with(&key, || Grouping::mint(kind, mode, context, text))?;

        token.punctuator = Some(kind.opener_label());
        token.kind = kind.token_kind();

        tracing::debug!(
            opener = %token.text,
            offset = token.offset,
            hinter = %grouping.hinter(),
            depth = self.groupings.len() + 1,
            "grouping opened"
        );

        self.groupings.push(OpenGrouping {
            grouping: Arc::clone(&grouping),
            opener: token.clone(),
        });
        self.enter(grouping.hinter());
        self.goal = Arc::clone(grouping.goal());
        self.rebuild_hint();

        Some(grouping)
    }

    /// Pop the top grouping, relabeling `token` as its closer.
    pub fn close(&mut self, token: &mut Token) -> Option<OpenGrouping> {
        let open = self.groupings.pop()?;
        let kind = open.grouping.kind();

        token.punctuator = Some(kind.closer_label());
        // A line break ending a line comment stays whitespace.
        if !token.kind.is_whitespace() {
            token.kind = kind.token_kind();
        }

        tracing::debug!(
            closer = %token.text,
            offset = token.offset,
            hinter = %open.grouping.hinter(),
            depth = self.groupings.len(),
            "grouping closed"
        );

        self.leave(open.grouping.hinter());
        self.goal = match self.groupings.last() {
            Some(top) => Arc::clone(top.grouping.goal()),
            None => Arc::clone(&self.syntax),
        };
        self.rebuild_hint();

        Some(open)
    }

    fn enter(&mut self, hinter: &Arc<str>) {
        match self.hinters.iter_mut().find(|(h, _)| h == hinter) {
            Some((_, count)) => *count += 1,
            None => self.hinters.push((Arc::clone(hinter), 1)),
        }
    }

    fn leave(&mut self, hinter: &Arc<str>) {
        if let Some(index) = self.hinters.iter().position(|(h, _)| h == hinter) {
            self.hinters[index].1 -= 1;
            if self.hinters[index].1 == 0 {
                self.hinters.remove(index);
            }
        }
    }

    fn rebuild_hint(&mut self) {
        let mut hint = String::new();
        for (hinter, _) in &self.hinters {
            hint.push_str(hinter);
            hint.push(' ');
        }
        hint.push_str("in-");
        hint.push_str(&self.goal);
        self.hint = Arc::from(hint);
    }
}
