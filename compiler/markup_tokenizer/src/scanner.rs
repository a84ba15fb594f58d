//! The scanning loop.
//!
//! A [`Scanner`] is a lazy iterator over [`Token`]s. Each step searches the
//! active context's matcher from the current index, emits any skipped source
//! as a `pre` token, classifies the match, applies grouping transitions and
//! then any delegation a grouping hook asked for. Concatenating the emitted
//! token texts always reproduces the scanned source.

use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::context::Context;
use crate::delegation::{Delegation, Fragment, ScanState};
use crate::grouping::GroupingStack;
use crate::mode::Mode;
use crate::synthesizer::{Links, RawKind, RawMatch, TokenSynthesizer};
use crate::{ensure_sufficient_stack, Punctuator, Registry, ScanConfig, Token, TokenId, TokenKind};

/// A [`Mode`] ready to scan, plus its scan configuration.
#[derive(Clone, Debug)]
pub struct Tokenizer {
    mode: Arc<Mode>,
    config: ScanConfig,
}

impl Tokenizer {
    pub fn new(mode: Arc<Mode>) -> Self {
        Self::with_config(mode, ScanConfig::default())
    }

    pub fn with_config(mode: Arc<Mode>, config: ScanConfig) -> Self {
        Tokenizer { mode, config }
    }

    #[inline]
    pub fn mode(&self) -> &Arc<Mode> {
        &self.mode
    }

    #[inline]
    pub fn config(&self) -> ScanConfig {
        self.config
    }

    /// Scan `source`. Without a registry, delegations produce `code` tokens.
    pub fn tokenize<'r, 's>(
        &self,
        source: &'s str,
        registry: Option<&'r Registry>,
    ) -> Scanner<'r, 's> {
        Scanner::new(Arc::clone(&self.mode), self.config, source, registry, 0)
    }

    fn tokenize_nested<'r, 's>(
        &self,
        source: &'s str,
        registry: &'r Registry,
        depth: usize,
    ) -> Scanner<'r, 's> {
        Scanner::new(Arc::clone(&self.mode), self.config, source, Some(registry), depth)
    }
}

/// Lazy token stream over one source string.
pub struct Scanner<'r, 's> {
    mode: Arc<Mode>,
    registry: Option<&'r Registry>,
    config: ScanConfig,
    source: &'s str,
    index: usize,
    depth: usize,
    stack: GroupingStack,
    context: Arc<Context>,
    pending: VecDeque<Token>,
    next_id: u32,
    previous: Option<TokenId>,
    last_significant: Option<TokenId>,
    follows_nonbreaker: bool,
    finished: bool,
}

impl<'r, 's> Scanner<'r, 's> {
    fn new(
        mode: Arc<Mode>,
        config: ScanConfig,
        source: &'s str,
        registry: Option<&'r Registry>,
        depth: usize,
    ) -> Self {
        let context = mode.contextualizer().prime(None);
        let stack = GroupingStack::new(mode.syntax());
        trace!(syntax = %mode.syntax(), len = source.len(), depth, "scan started");
        Scanner {
            mode,
            registry,
            config,
            source,
            index: 0,
            depth,
            stack,
            context,
            pending: VecDeque::new(),
            next_id: 0,
            previous: None,
            last_significant: None,
            follows_nonbreaker: false,
            finished: false,
        }
    }

    pub fn mode(&self) -> &Arc<Mode> {
        &self.mode
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Byte position the next search starts from.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn stack(&self) -> &GroupingStack {
        &self.stack
    }

    /// Context of the innermost open grouping.
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    pub fn is_finished(&self) -> bool {
        self.finished && self.pending.is_empty()
    }

    /// Chunk the remaining stream into `batch_size` vectors.
    pub fn batches(self) -> Batches<'r, 's> {
        let size = self.config.batch_size.max(1);
        Batches { scanner: self, size }
    }

    fn step(&mut self) {
        if self.index >= self.source.len() {
            self.finish();
            return;
        }

        let context = Arc::clone(&self.context);
        let Some(captures) = context.matcher().captures_at(self.source, self.index) else {
            self.finish();
            return;
        };
        let Some(raw) = RawMatch::from_captures(&captures) else {
            self.finish();
            return;
        };

        let end = raw.offset + raw.text.len();
        if end <= self.index {
            // An empty match would never advance.
            self.finish();
            return;
        }
        if raw.offset > self.index {
            self.emit_pre(self.index, raw.offset);
        }
        self.index = end;

        let mut token = self.synthesize(raw, &context);
        trace!(label = token.label(), text = ?token.text, offset = token.offset, "matched");

        let delegation = self.transition(&mut token, &context);
        self.emit(token);
        if let Some(delegation) = delegation {
            self.delegate(delegation);
        }
    }

    fn synthesize(&mut self, raw: RawMatch<'_>, context: &Context) -> Token {
        let links = self.links();
        let id = self.allocate_id();
        let hint = Arc::clone(self.stack.hint());
        TokenSynthesizer::new(&self.mode).synthesize(raw, context, &links, id, hint)
    }

    fn links(&self) -> Links {
        Links {
            previous: self.previous,
            parent: self.stack.top().map(|open| open.opener.id),
            last: self.last_significant,
            follows_nonbreaker: self.follows_nonbreaker,
        }
    }

    /// Close before open: a token that both closes the top grouping and could
    /// open another (a quote character) closes.
    fn transition(&mut self, token: &mut Token, context: &Context) -> Option<Delegation> {
        if !self.stack.is_empty() && context.closes_on(&token.text) {
            let closed = self.stack.close(token)?;
            self.reprime();
            let state = self.state(Some(&closed.opener));
            return closed.grouping.close(token, &state, context);
        }

        token.punctuator?;
        let grouping = self.stack.open(token, context, &self.mode)?;
        self.reprime();
        let state = self.state(Some(&*token));
        grouping.open(token, &state, &self.context)
    }

    fn state<'a>(&'a self, opener: Option<&'a Token>) -> ScanState<'a> {
        ScanState {
            source: self.source,
            index: self.index,
            syntax: self.mode.syntax(),
            depth: self.depth,
            stack: &self.stack,
            opener,
            last_significant: self.last_significant,
        }
    }

    fn reprime(&mut self) {
        let next = self
            .mode
            .contextualizer()
            .prime(self.stack.top().map(|open| &*open.grouping));
        if !Arc::ptr_eq(&next, &self.context) {
            trace!(goal = %next.goal(), forming = next.forming(), "context switched");
            self.context = next;
        }
    }

    fn delegate(&mut self, delegation: Delegation) {
        trace!(from = self.index, resume = delegation.index(), "applying delegation");
        match delegation {
            Delegation::Subrange { syntax, offset, index } => {
                let Some((start, end)) = self.clamp(offset, index) else {
                    debug!(%syntax, offset, index, "ignored out-of-range delegation");
                    return;
                };
                if start > self.index {
                    self.emit_pre(self.index, start);
                }
                let source = self.source;
                self.embed(&syntax, start, &source[start..end]);
                self.index = end;
            }
            Delegation::Fragments { fragments, index } => {
                debug!(count = fragments.len(), index, "emitting fragments");
                let mut covered = self.index;
                for fragment in fragments {
                    if fragment.offset > covered {
                        self.emit_gap(covered, fragment.offset);
                    }
                    covered = covered.max(fragment.end());
                    match fragment.syntax.clone() {
                        Some(syntax) => self.embed(&syntax, fragment.offset, &fragment.text),
                        None => self.emit_fragment(fragment),
                    }
                }
                if let Some((_, end)) = self.clamp(self.index, index) {
                    if end > covered {
                        self.emit_gap(covered, end);
                    }
                    self.index = end;
                }
            }
        }
    }

    /// Clamp a hook-supplied range to `[self.index, source.len()]`.
    fn clamp(&self, offset: usize, index: usize) -> Option<(usize, usize)> {
        let start = offset.max(self.index);
        let end = index.min(self.source.len());
        let source = self.source;
        let valid = start <= end && source.is_char_boundary(start) && source.is_char_boundary(end);
        valid.then_some((start, end))
    }

    /// Tokenize `text` with the tokenizer for `syntax` and splice the result.
    fn embed(&mut self, syntax: &str, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.delegated_tokens(syntax, text) {
            Some((inner, tokens)) if !tokens.is_empty() => self.splice(&inner, tokens),
            _ => self.emit_code(offset, text),
        }
    }

    fn delegated_tokens(&self, syntax: &str, text: &str) -> Option<(Arc<str>, Vec<Token>)> {
        if self.depth >= self.config.max_delegation_depth {
            warn!(
                %syntax,
                depth = self.depth,
                max = self.config.max_delegation_depth,
                "delegation too deep; emitting code"
            );
            return None;
        }
        let Some(registry) = self.registry else {
            debug!(%syntax, "no registry to delegate to; emitting code");
            return None;
        };
        let tokenizer = match registry.tokenizer(syntax) {
            Ok(tokenizer) => tokenizer,
            Err(error) => {
                warn!(%syntax, %error, "cannot delegate; emitting code");
                return None;
            }
        };

        debug!(%syntax, len = text.len(), depth = self.depth + 1, "delegating");
        let depth = self.depth + 1;
        let tokens: Vec<Token> =
            ensure_sufficient_stack(|| tokenizer.tokenize_nested(text, registry, depth).collect());
        Some((Arc::clone(tokenizer.mode().syntax()), tokens))
    }

    /// Append delegated tokens, rebasing their ids onto this stream.
    fn splice(&mut self, inner: &str, tokens: Vec<Token>) {
        let base = self.next_id;
        let parent = self.stack.top().map(|open| open.opener.id);
        let label = format!("{inner}-in-{}", self.mode.syntax());
        let mut hints: FxHashMap<Arc<str>, Arc<str>> = FxHashMap::default();

        for mut token in tokens {
            token.id = token.id.rebase(base);
            token.previous = token.previous.map(|id| id.rebase(base)).or(self.previous);
            token.parent = token.parent.map(|id| id.rebase(base)).or(parent);
            token.last = token.last.map(|id| id.rebase(base)).or(self.last_significant);
            token.hint = Arc::clone(
                hints
                    .entry(Arc::clone(&token.hint))
                    .or_insert_with_key(|hint| Arc::from(format!("{hint} {label}"))),
            );
            self.next_id = token.id.raw() + 1;
            self.track(&token);
            self.pending.push_back(token);
        }
    }

    fn emit_fragment(&mut self, fragment: Fragment) {
        let id = self.allocate_id();
        let links = self.links();
        let hint = Arc::clone(self.stack.hint());

        let token = match fragment.kind {
            Some(kind) => Token {
                id,
                line_breaks: kind.is_whitespace().then(|| {
                    u32::try_from(fragment.text.matches('\n').count()).unwrap_or(u32::MAX)
                }),
                kind,
                text: fragment.text.into_boxed_str(),
                offset: fragment.offset,
                punctuator: None,
                hint,
                previous: links.previous,
                parent: links.parent,
                last: links.last,
            },
            None => {
                let raw = self.fragment_match(&fragment);
                TokenSynthesizer::new(&self.mode).synthesize(raw, &self.context, &links, id, hint)
            }
        };
        self.emit(token);
    }

    /// Raw match for an unforced fragment: the matcher's view when it covers
    /// the whole text, otherwise a word.
    fn fragment_match<'f>(&self, fragment: &'f Fragment) -> RawMatch<'f> {
        let text = fragment.text.as_str();
        let kind = if !text.is_empty() && text.chars().all(char::is_whitespace) {
            RawKind::Whitespace
        } else {
            self.context
                .matcher()
                .captures(text)
                .and_then(|captures| RawMatch::from_captures(&captures))
                .filter(|raw| raw.offset == 0 && raw.text.len() == text.len())
                .map_or(RawKind::Word, |raw| raw.kind)
        };
        RawMatch {
            kind,
            text,
            offset: fragment.offset,
        }
    }

    fn emit_pre(&mut self, start: usize, end: usize) {
        let source = self.source;
        self.emit_plain(TokenKind::Pre, start, &source[start..end]);
    }

    /// Source a fragment delegation skipped over, as `pre`.
    fn emit_gap(&mut self, start: usize, end: usize) {
        let source = self.source;
        if let Some(text) = source.get(start..end) {
            self.emit_plain(TokenKind::Pre, start, text);
        }
    }

    fn emit_code(&mut self, offset: usize, text: &str) {
        self.emit_plain(TokenKind::Code, offset, text);
    }

    fn emit_plain(&mut self, kind: TokenKind, offset: usize, text: &str) {
        let links = self.links();
        let token = Token {
            id: self.allocate_id(),
            kind,
            text: text.into(),
            offset,
            punctuator: None,
            line_breaks: None,
            hint: Arc::clone(self.stack.hint()),
            previous: links.previous,
            parent: links.parent,
            last: links.last,
        };
        self.emit(token);
    }

    fn emit(&mut self, token: Token) {
        self.track(&token);
        self.pending.push_back(token);
    }

    fn track(&mut self, token: &Token) {
        self.previous = Some(token.id);
        if token.is_significant() {
            self.last_significant = Some(token.id);
            self.follows_nonbreaker = token.punctuator == Some(Punctuator::Nonbreaker);
        } else if token.line_breaks.is_some_and(|breaks| breaks > 0) {
            self.follows_nonbreaker = false;
        }
    }

    fn allocate_id(&mut self) -> TokenId {
        let id = TokenId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn finish(&mut self) {
        if self.index < self.source.len() {
            self.emit_pre(self.index, self.source.len());
            self.index = self.source.len();
        }
        if !self.finished {
            debug!(
                syntax = %self.mode.syntax(),
                tokens = self.next_id,
                unterminated = self.stack.depth(),
                "scan finished"
            );
        }
        self.finished = true;
    }
}

impl Iterator for Scanner<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            self.step();
        }
    }
}

impl FusedIterator for Scanner<'_, '_> {}

impl std::fmt::Debug for Scanner<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("syntax", self.mode.syntax())
            .field("index", &self.index)
            .field("depth", &self.depth)
            .field("open", &self.stack.depth())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Scanner output in fixed-size chunks.
#[derive(Debug)]
pub struct Batches<'r, 's> {
    scanner: Scanner<'r, 's>,
    size: usize,
}

impl Iterator for Batches<'_, '_> {
    type Item = Vec<Token>;

    fn next(&mut self) -> Option<Vec<Token>> {
        let batch: Vec<Token> = self.scanner.by_ref().take(self.size).collect();
        (!batch.is_empty()).then_some(batch)
    }
}

impl FusedIterator for Batches<'_, '_> {}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests;
