//! Property tests over every bundled grammar.
//!
//! Whatever the input, a scan must:
//! - reproduce the source when token texts are concatenated,
//! - number tokens 0, 1, 2... in emission order, delegated tokens included,
//! - lay tokens end to end when nothing is delegated,
//! - give the same stream when repeated against warm caches.
//!
//! Balanced bracket input must also leave the grouping stack empty.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(clippy::doc_markdown, reason = "Proptest macros generate code with these patterns")]

use std::sync::Arc;

use markup_grammars::standard_registry;
use markup_tokenizer::{Punctuator, Registry, TokenList, TokenizeState, Tokenizer};
use proptest::prelude::*;

const SYNTAXES: &[&str] = &["es", "css", "html", "md", "ps"];

// -- Strategies --

/// Printable ASCII plus the whitespace grammars care about.
fn source_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~\n\t]{0,160}").expect("valid regex")
}

/// Source leaning on the characters that open and close groupings.
fn punctuation_strategy() -> impl Strategy<Value = String> {
    let piece = prop::sample::select(vec![
        "`", "'", "\"", "${", "}", "{", "(", ")", "/*", "*/", "//", "<!--", "-->", "<script>",
        "</script>", "```js\n", "```\n", "%", "\n", " ", "x", "let",
    ]);
    prop::collection::vec(piece, 0..40).prop_map(|pieces| pieces.concat())
}

/// Words and operators nested in balanced brackets.
fn balanced_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[a-z]{1,6}",
        "[0-9]{1,3}",
        Just(" + ".to_owned()),
        Just(", ".to_owned()),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        (
            prop::sample::select(vec![("(", ")"), ("[", "]"), ("{", "}")]),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|((open, close), parts)| format!("{open}{}{close}", parts.join(" ")))
    })
}

// -- Helpers --

fn scan_alone(registry: &Registry, syntax: &str, source: &str) -> TokenList {
    markup_tokenizer::init_tracing();
    let tokenizer = registry.tokenizer(syntax).unwrap();
    tokenizer.tokenize(source, None).collect()
}

fn scan_delegating(registry: &Registry, syntax: &str, source: &str) -> TokenList {
    registry.tokenize(source, &TokenizeState::new(syntax)).collect()
}

fn check_stream(tokens: &TokenList, source: &str) -> Result<(), TestCaseError> {
    prop_assert_eq!(tokens.source(), source);
    for (i, token) in tokens.iter().enumerate() {
        prop_assert_eq!(token.id.index(), i);
        prop_assert!(!token.text.is_empty(), "empty token at {}", i);
        if let Some(previous) = token.previous {
            prop_assert!(previous < token.id);
        }
        if let Some(parent) = token.parent {
            prop_assert!(parent < token.id);
        }
    }
    Ok(())
}

fn check_contiguous(tokens: &TokenList) -> Result<(), TestCaseError> {
    let mut expected = 0;
    for token in tokens {
        prop_assert_eq!(token.offset, expected, "gap before {:?}", token);
        expected = token.end();
    }
    Ok(())
}

// -- Property Tests --

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_standalone_scans_are_lossless(source in source_strategy()) {
        let registry = standard_registry().unwrap();
        for syntax in SYNTAXES {
            let tokens = scan_alone(&registry, syntax, &source);
            check_stream(&tokens, &source)?;
            check_contiguous(&tokens)?;
        }
    }

    #[test]
    fn prop_delegating_scans_are_lossless(source in punctuation_strategy()) {
        let registry = standard_registry().unwrap();
        for syntax in SYNTAXES {
            let tokens = scan_delegating(&registry, syntax, &source);
            check_stream(&tokens, &source)?;
        }
    }

    #[test]
    fn prop_groupings_without_delegation_stay_contiguous(source in punctuation_strategy()) {
        let registry = standard_registry().unwrap();
        for syntax in SYNTAXES {
            let tokens = scan_alone(&registry, syntax, &source);
            check_stream(&tokens, &source)?;
            check_contiguous(&tokens)?;
        }
    }

    #[test]
    fn prop_rescanning_is_stable(source in punctuation_strategy()) {
        let registry = standard_registry().unwrap();
        for syntax in SYNTAXES {
            let cold = scan_delegating(&registry, syntax, &source);
            let warm = scan_delegating(&registry, syntax, &source);
            prop_assert_eq!(cold, warm);
        }
    }

    #[test]
    fn prop_balanced_brackets_close(source in balanced_strategy()) {
        for syntax in ["es", "ps"] {
            let registry = standard_registry().unwrap();
            let tokenizer = registry.tokenizer(syntax).unwrap();
            let mut scanner = tokenizer.tokenize(&source, None);
            let tokens: TokenList = scanner.by_ref().collect();

            prop_assert_eq!(scanner.stack().depth(), 0);
            let count = |class| tokens.iter().filter(|t| t.punctuator == Some(class)).count();
            prop_assert_eq!(count(Punctuator::Opener), count(Punctuator::Closer));
        }
    }

    #[test]
    fn prop_fresh_modes_agree_with_registry(source in source_strategy()) {
        let registry = standard_registry().unwrap();
        let fresh = Tokenizer::new(Arc::new(markup_grammars::es::mode().unwrap()));
        let expected: TokenList = fresh.tokenize(&source, None).collect();
        prop_assert_eq!(scan_alone(&registry, "es", &source), expected);
    }
}
