//! Small grammars for engine tests.

#![allow(clippy::unwrap_used, reason = "test fixtures unwrap for brevity")]

use std::sync::Arc;

use crate::{
    compile_pattern, Closer, ClosureSpec, Closures, Context, Delegation, Fragment, GroupingHooks,
    Mode, RegisterOptions, Registry, ScanState, Token, TokenKind, TokenList, Tokenizer,
};

/// Whitespace, then sequences (escapes, multi-char operators, single
/// punctuation), then words.
const MINI_MATCHER: &str = concat!(
    r"(\s+)",
    r"|(\\(?s:.)|\$\{|::|//|/\*|\*/|\?\.|&&|\|\||[-+*/%=<>!]=?|[{}()\[\];,.:?`'\x22]|[^\s\w])",
    r"|(\w+)",
);

/// A C-like grammar: keywords, aggregators, comments, closures, quotes and
/// template spans inside backticks.
pub fn mini_mode() -> Mode {
    Mode::builder("mini", MINI_MATCHER)
        .keywords("let const if else return new default")
        .assigners("= += -=")
        .combinators("== != < > <= >= && ||")
        .operators("+ - * / % !")
        .nonbreakers(". ?.")
        .breakers(", ;")
        .quotes("' \" `")
        .comments(
            Closures::new()
                .with(ClosureSpec::new("//", Closer::Pattern(line_end())))
                .with(ClosureSpec::new("/*", "*/")),
        )
        .closures(Closures::from_pairs(&[("{", "}"), ("(", ")"), ("[", "]")]))
        .spans("`", Closures::from_pairs(&[("${", "}")]))
        .maybe_identifier(r"^[A-Za-z_$][\w$]*$")
        .segment("scope", r"^::$")
        .build()
        .unwrap()
}

fn line_end() -> regex::Regex {
    compile_pattern("mini", "closer", r"\n").unwrap()
}

/// Delegates the body of `<< ... >>` to `mini` when closing the opener.
#[derive(Debug)]
pub struct EmbedHooks;

impl GroupingHooks for EmbedHooks {
    fn open(&self, _: &Token, state: &ScanState<'_>, _: &Context) -> Option<Delegation> {
        let end = state.index + state.remaining().find(">>")?;
        Some(Delegation::subrange("mini", state.index, end))
    }
}

/// Emits the body of `[[ ... ]]` as explicit fragments.
#[derive(Debug)]
pub struct FragmentHooks;

impl GroupingHooks for FragmentHooks {
    fn open(&self, _: &Token, state: &ScanState<'_>, _: &Context) -> Option<Delegation> {
        let end = state.index + state.remaining().find("]]")?;
        let body = &state.source[state.index..end];
        let fragments = vec![Fragment::typed(body, state.index, TokenKind::Code)];
        Some(Delegation::Fragments { fragments, index: end })
    }
}

/// Emits only the trimmed body of `{{ ... }}`, leaving its padding uncovered.
#[derive(Debug)]
pub struct TrimmedHooks;

impl GroupingHooks for TrimmedHooks {
    fn open(&self, _: &Token, state: &ScanState<'_>, _: &Context) -> Option<Delegation> {
        let end = state.index + state.remaining().find("}}")?;
        let body = &state.source[state.index..end];
        let start = state.index + (body.len() - body.trim_start().len());
        let fragments = vec![Fragment::typed(body.trim(), start, TokenKind::Code)];
        Some(Delegation::Fragments { fragments, index: end })
    }
}

/// A host grammar whose `<<` groupings embed `mini` and whose `[[` and `{{`
/// groupings emit code fragments.
pub fn host_mode() -> Mode {
    Mode::builder("host", r"(\s+)|(<<|>>|\[\[|\]\]|\{\{|\}\})|(\w+)")
        .closures(
            Closures::new()
                .with(ClosureSpec::new("<<", ">>").with_hooks(Arc::new(EmbedHooks)))
                .with(ClosureSpec::new("[[", "]]").with_hooks(Arc::new(FragmentHooks)))
                .with(ClosureSpec::new("{{", "}}").with_hooks(Arc::new(TrimmedHooks))),
        )
        .build()
        .unwrap()
}

pub fn mini_registry() -> Registry {
    crate::init_tracing();
    let registry = Registry::new();
    registry.register(mini_mode(), RegisterOptions::new().alias("m")).unwrap();
    registry
        .register(host_mode(), RegisterOptions::new().requires("mini"))
        .unwrap();
    registry
}

pub fn scan(mode: Mode, source: &str) -> TokenList {
    crate::init_tracing();
    Tokenizer::new(Arc::new(mode)).tokenize(source, None).collect()
}

/// `(label, text)` pairs, whitespace dropped.
pub fn labels(tokens: &TokenList) -> Vec<(String, String)> {
    tokens
        .iter()
        .filter(|t| t.is_significant())
        .map(|t| (t.label().to_owned(), t.text.to_string()))
        .collect()
}

pub fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected
        .iter()
        .map(|&(label, text)| (label.to_owned(), text.to_owned()))
        .collect()
}
