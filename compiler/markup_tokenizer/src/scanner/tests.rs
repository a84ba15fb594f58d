use super::*;
use crate::test_helpers::{host_mode, labels, mini_mode, mini_registry, pairs, scan};
use crate::TokenList;
use pretty_assertions::assert_eq;

#[test]
fn round_trips_source() {
    let source = "let a = `x ${b + 1} y`; // done\n/* c */ f(a, [1]);";
    let tokens = scan(mini_mode(), source);
    assert_eq!(tokens.source(), source);

    let mut offset = 0;
    for token in &tokens {
        assert_eq!(token.offset, offset);
        offset = token.end();
    }
}

#[test]
fn empty_source_yields_nothing() {
    assert!(scan(mini_mode(), "").is_empty());
}

#[test]
fn classifies_declaration() {
    let tokens = scan(mini_mode(), "let total = a.count;");
    assert_eq!(
        labels(&tokens),
        pairs(&[
            ("keyword", "let"),
            ("identifier", "total"),
            ("assigner", "="),
            ("identifier", "a"),
            ("nonbreaker", "."),
            ("identifier", "count"),
            ("breaker", ";"),
        ])
    );
}

#[test]
fn keyword_after_nonbreaker_is_not_keyword() {
    let tokens = scan(mini_mode(), "a.default\n.new\nreturn");
    let kinds: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Keyword || t.kind == TokenKind::Identifier)
        .map(|t| t.kind.as_str())
        .collect();
    assert_eq!(kinds, vec!["identifier", "identifier", "identifier", "keyword"]);
}

#[test]
fn line_break_after_nonbreaker_restores_keywords() {
    let tokens = scan(mini_mode(), "a.\nreturn");
    let last = tokens.iter().last().unwrap();
    assert_eq!(last.kind, TokenKind::Keyword);
}

#[test]
fn strings_are_inert() {
    let tokens = scan(mini_mode(), "'let = {'");
    assert_eq!(
        labels(&tokens),
        pairs(&[
            ("quote", "'"),
            ("text", "let"),
            ("sequence", "="),
            ("sequence", "{"),
            ("quote", "'"),
        ])
    );
    assert!(tokens.iter().all(|t| t.kind != TokenKind::Keyword));
}

#[test]
fn template_spans_nest_inside_quotes() {
    let tokens = scan(mini_mode(), "`a${b}c`");
    assert_eq!(
        labels(&tokens),
        pairs(&[
            ("quote", "`"),
            ("text", "a"),
            ("opener", "${"),
            ("text", "b"),
            ("closer", "}"),
            ("text", "c"),
            ("quote", "`"),
        ])
    );
    let b = tokens.iter().find(|t| &*t.text == "b").unwrap();
    assert_eq!(&*b.hint, "mini-quote mini-span in-span");
    assert_eq!(tokens.parent(b).map(|t| &*t.text), Some("${"));
}

#[test]
fn line_comment_closes_on_newline() {
    let tokens = scan(mini_mode(), "// let x\nlet");
    let newline = tokens.iter().find(|t| t.text.contains('\n')).unwrap();
    assert_eq!(newline.kind, TokenKind::Whitespace);
    assert_eq!(newline.punctuator, Some(Punctuator::Comment));
    assert_eq!(newline.line_breaks, Some(1));

    let words: Vec<(&str, &str)> = tokens
        .iter()
        .filter(|t| t.is_significant())
        .map(|t| (t.kind.as_str(), &*t.text))
        .collect();
    assert_eq!(
        words,
        vec![("comment", "//"), ("comment", "let"), ("comment", "x"), ("keyword", "let")]
    );
}

#[test]
fn block_comment_hides_quotes() {
    let tokens = scan(mini_mode(), "/* 'x */ y");
    let y = tokens.iter().last().unwrap();
    assert_eq!(y.kind, TokenKind::Identifier);
    assert_eq!(&*y.hint, "in-mini");
}

#[test]
fn parents_follow_nesting() {
    let tokens = scan(mini_mode(), "f(a[b])");
    let b = tokens.iter().find(|t| &*t.text == "b").unwrap();
    let ancestors: Vec<&str> = tokens.ancestors(b).map(|t| &*t.text).collect();
    assert_eq!(ancestors, vec!["[", "("]);

    let close = tokens.iter().find(|t| &*t.text == ")").unwrap();
    assert_eq!(tokens.parent(close).map(|t| &*t.text), Some("("));
    assert_eq!(close.punctuator, Some(Punctuator::Closer));
}

#[test]
fn last_skips_whitespace() {
    let tokens = scan(mini_mode(), "a  b");
    let b = tokens.iter().last().unwrap();
    assert_eq!(b.last.map(|id| &*tokens[id].text), Some("a"));
    assert_eq!(b.previous.map(|id| &*tokens[id].text), Some("  "));
}

#[test]
fn unterminated_groupings_stay_open() {
    let mut scanner = Tokenizer::new(Arc::new(mini_mode())).tokenize("f(`abc", None);
    let tokens: Vec<Token> = scanner.by_ref().collect();
    assert_eq!(tokens.last().map(|t| &*t.text), Some("abc"));
    assert_eq!(scanner.stack().depth(), 2);
    assert!(scanner.is_finished());
}

#[test]
fn unmatched_source_becomes_pre() {
    let tokens = scan(host_mode(), "a; b");
    assert_eq!(
        tokens.iter().map(|t| (t.kind.as_str(), &*t.text)).collect::<Vec<_>>(),
        vec![("text", "a"), ("pre", ";"), ("whitespace", " "), ("text", "b")]
    );

    let tail = scan(host_mode(), "a;;");
    assert_eq!(tail.iter().last().map(|t| (t.kind.as_str(), &*t.text)), Some(("pre", ";;")));
}

#[test]
fn ids_follow_emission_order() {
    let tokens = scan(mini_mode(), "x = [1, 2];");
    for (i, token) in tokens.iter().enumerate() {
        assert_eq!(token.id.index(), i);
        let previous = i.checked_sub(1).map(|p| TokenId::new(u32::try_from(p).unwrap()));
        assert_eq!(token.previous, previous);
    }
}

#[test]
fn subrange_delegation_splices_inner_tokens() {
    let registry = mini_registry();
    let state = crate::TokenizeState::new("host");
    let tokens: TokenList = registry.tokenize("x << let y >> z", &state).collect();
    assert_eq!(tokens.source(), "x << let y >> z");

    let keyword = tokens.iter().find(|t| &*t.text == "let").unwrap();
    assert_eq!(keyword.kind, TokenKind::Keyword);
    assert_eq!(&*keyword.hint, "in-mini mini-in-host");
    assert_eq!(tokens.parent(keyword).map(|t| &*t.text), Some("<<"));

    let close = tokens.iter().find(|t| &*t.text == ">>").unwrap();
    assert_eq!(close.punctuator, Some(Punctuator::Closer));

    for (i, token) in tokens.iter().enumerate() {
        assert_eq!(token.id.index(), i);
    }
}

#[test]
fn delegated_offsets_are_relative_to_the_slice() {
    let registry = mini_registry();
    let state = crate::TokenizeState::new("host");
    let tokens: TokenList = registry.tokenize("<<ab>>", &state).collect();
    let ab = tokens.iter().find(|t| &*t.text == "ab").unwrap();
    assert_eq!(ab.offset, 0);
}

#[test]
fn delegation_without_registry_is_code() {
    let tokens = scan(host_mode(), "<< let y >>");
    assert_eq!(
        labels(&tokens),
        pairs(&[("opener", "<<"), ("code", " let y "), ("closer", ">>")])
    );
}

#[test]
fn delegation_depth_is_capped() {
    let scan = ScanConfig::default().with_max_delegation_depth(0);
    let registry = crate::Registry::with_config(crate::RegistryConfig::default().with_scan(scan));
    registry.register(mini_mode(), crate::RegisterOptions::new()).unwrap();
    registry.register(host_mode(), crate::RegisterOptions::new()).unwrap();

    let state = crate::TokenizeState::new("host");
    let tokens: TokenList = registry.tokenize("<<let>>", &state).collect();
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Code && &*t.text == "let"));
}

#[test]
fn fragment_delegation_emits_fragments() {
    let tokens = scan(host_mode(), "[[ raw ]] tail");
    assert_eq!(tokens.source(), "[[ raw ]] tail");
    assert_eq!(
        labels(&tokens),
        pairs(&[("opener", "[["), ("code", " raw "), ("closer", "]]"), ("text", "tail")])
    );
}

#[test]
fn fragments_leaving_gaps_emit_pre() {
    let source = "{{ raw }}";
    let tokens = scan(host_mode(), source);
    assert_eq!(tokens.source(), source);
    let spans: Vec<(&str, &str, usize)> = tokens
        .iter()
        .map(|t| (t.label(), &*t.text, t.offset))
        .collect();
    assert_eq!(
        spans,
        vec![
            ("opener", "{{", 0),
            ("pre", " ", 2),
            ("code", "raw", 3),
            ("pre", " ", 6),
            ("closer", "}}", 7),
        ]
    );
}

#[test]
fn delegation_reports_resume_index() {
    assert_eq!(Delegation::subrange("mini", 2, 9).index(), 9);
    let fragments = vec![Fragment::new("ab", 4)];
    assert_eq!(fragments[0].end(), 6);
    assert_eq!(Delegation::Fragments { fragments, index: 7 }.index(), 7);
}

#[test]
fn hook_without_closer_leaves_scan_running() {
    let tokens = scan(host_mode(), "<< a b");
    assert_eq!(tokens.source(), "<< a b");
    assert_eq!(tokens.iter().last().map(|t| &*t.text), Some("b"));
}

#[test]
fn batches_chunk_the_stream() {
    let config = ScanConfig::default().with_batch_size(3);
    let tokenizer = Tokenizer::with_config(Arc::new(mini_mode()), config);
    let batches: Vec<Vec<Token>> = tokenizer.tokenize("a b c d", None).batches().collect();
    assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 3, 1]);
    let joined: String = batches.iter().flatten().map(|t| &*t.text).collect();
    assert_eq!(joined, "a b c d");
}

#[test]
fn scanner_is_lazy() {
    let mut scanner = Tokenizer::new(Arc::new(mini_mode())).tokenize("a b c", None);
    let first = scanner.next().unwrap();
    assert_eq!(&*first.text, "a");
    assert!(scanner.index() < 5);
    assert!(!scanner.is_finished());
}
