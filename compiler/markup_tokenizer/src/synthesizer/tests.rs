use super::*;
use crate::test_helpers::mini_mode;
use crate::GroupingStack;
use pretty_assertions::assert_eq;

#[test]
fn raw_kind_follows_groups() {
    let mode = mini_mode();
    let kinds: Vec<(RawKind, &str)> = mode
        .matcher()
        .captures_iter("a += \n")
        .filter_map(|captures| RawMatch::from_captures(&captures))
        .map(|raw| (raw.kind, raw.text))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (RawKind::Word, "a"),
            (RawKind::Whitespace, " "),
            (RawKind::Sequence, "+="),
            (RawKind::Whitespace, " \n"),
        ]
    );
}

#[test]
fn aggregators_need_a_predecessor() {
    let mode = mini_mode();
    let root = mode.contextualizer().prime(None);
    let synth = TokenSynthesizer::new(&mode);

    assert_eq!(
        synth.classify_sequence("=", &root, true),
        (TokenKind::Punctuator, Some(Punctuator::Assigner))
    );
    assert_eq!(
        synth.classify_sequence("<", &root, true),
        (TokenKind::Punctuator, Some(Punctuator::Combinator))
    );
    assert_eq!(synth.classify_sequence("=", &root, false), (TokenKind::Sequence, None));
}

#[test]
fn aggregators_win_over_operators() {
    let mode = Mode::builder("agg", r"(\s+)|([^\s\w]+)|(\w+)")
        .operators("+")
        .combinators("+")
        .build()
        .unwrap();
    let root = mode.contextualizer().prime(None);
    let synth = TokenSynthesizer::new(&mode);
    assert_eq!(synth.classify_sequence("+", &root, true).1, Some(Punctuator::Combinator));
    assert_eq!(synth.classify_sequence("+", &root, false).1, Some(Punctuator::Operator));
}

#[test]
fn punctuator_order_in_forming_context() {
    let mode = mini_mode();
    let root = mode.contextualizer().prime(None);
    let synth = TokenSynthesizer::new(&mode);

    let classes: Vec<Option<Punctuator>> = [".", "*", "//", "'", "{", ";", "@"]
        .into_iter()
        .map(|text| synth.punctuate(text, &root))
        .collect();
    assert_eq!(
        classes,
        vec![
            Some(Punctuator::Nonbreaker),
            Some(Punctuator::Operator),
            Some(Punctuator::Comment),
            Some(Punctuator::Quote),
            Some(Punctuator::Closure),
            Some(Punctuator::Breaker),
            None,
        ]
    );
}

#[test]
fn inert_context_only_sees_spans_and_quotes() {
    let mode = mini_mode();
    let root = mode.contextualizer().prime(None);
    let mut stack = GroupingStack::new(mode.syntax());
    let mut tick = Token {
        id: TokenId::new(0),
        kind: TokenKind::Punctuator,
        text: "`".into(),
        offset: 0,
        punctuator: Some(Punctuator::Quote),
        line_breaks: None,
        hint: Arc::from("in-mini"),
        previous: None,
        parent: None,
        last: None,
    };
    let grouping = stack.open(&mut tick, &root, &mode).unwrap();
    let quoted = mode.contextualizer().prime(Some(&*grouping));
    let synth = TokenSynthesizer::new(&mode);

    assert_eq!(synth.punctuate("${", &quoted), Some(Punctuator::Span));
    assert_eq!(synth.punctuate("{", &quoted), None);
    assert_eq!(synth.classify_sequence("=", &quoted, true), (TokenKind::Sequence, None));
    assert_eq!(synth.classify_word("let", &quoted, false), TokenKind::Text);
}

#[test]
fn words_classify_in_forming_context() {
    let mode = mini_mode();
    let root = mode.contextualizer().prime(None);
    let synth = TokenSynthesizer::new(&mode);

    assert_eq!(synth.classify_word("return", &root, false), TokenKind::Keyword);
    assert_eq!(synth.classify_word("value", &root, false), TokenKind::Identifier);
    assert_eq!(synth.classify_word("9lives", &root, false), TokenKind::Text);
    assert_eq!(synth.classify_word("default", &root, true), TokenKind::Identifier);
}

#[test]
fn keyword_prefilter_gates_lookup() {
    let mode = Mode::builder("pre", r"(\s+)|([^\s\w]+)|(\w+)")
        .keywords("if Then")
        .maybe_keyword(r"^[a-z]+$")
        .build()
        .unwrap();
    let root = mode.contextualizer().prime(None);
    let synth = TokenSynthesizer::new(&mode);
    assert_eq!(synth.classify_word("if", &root, false), TokenKind::Keyword);
    assert_eq!(synth.classify_word("Then", &root, false), TokenKind::Text);
}

#[test]
fn segments_name_unclassified_sequences() {
    let mode = mini_mode();
    let root = mode.contextualizer().prime(None);
    let synth = TokenSynthesizer::new(&mode);
    let (kind, punctuator) = synth.classify_sequence("::", &root, true);
    assert_eq!(kind.as_str(), "scope");
    assert_eq!(punctuator, None);
}

#[test]
fn classification_is_memoized() {
    let mode = mini_mode();
    let root = mode.contextualizer().prime(None);
    let synth = TokenSynthesizer::new(&mode);
    let first = synth.classify_sequence(";", &root, true);
    assert_eq!(root.punctuators().get(";"), Some(Some(Punctuator::Breaker)));
    assert_eq!(synth.classify_sequence(";", &root, true), first);
}

#[test]
fn line_breaks_are_counted() {
    assert_eq!(count_line_breaks(" \n\t\r\n"), 2);
    assert_eq!(count_line_breaks("   "), 0);
}
