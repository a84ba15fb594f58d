//! ECMAScript.
//!
//! Template literals (`` `a ${b} c` ``) are a backtick quote carrying a span
//! table, so `${` only opens inside backticks. Regular expression literals
//! are not recognized; `/` is always an operator.

use markup_tokenizer::{compile_pattern, Closer, ClosureSpec, Closures, Mode, ModeError};

pub const SYNTAX: &str = "es";

pub const ALIASES: &[&str] = &["js", "javascript", "ecmascript"];

const MATCHER: &str = concat!(
    r"(\s+)",
    r"|(\\(?s:.)|\$\{|//|/\*|\*/|\.\.\.|=>|\?\?=?|\?\.|[=!]==?",
    r"|<<=?|>>>?=?|&&=?|\|\|=?|\*\*=?|\+\+|--",
    r#"|[-+*/%&|^<>]=?|[{}()\[\];,.:?~!=`"']|[^\s\w$])"#,
    r"|(\w+(?:\$+\w+)*|\$+\w*)",
);

const KEYWORDS: &str = "\
    abstract arguments async await boolean break byte case catch char class const continue \
    debugger default delete do double else enum eval export extends false final finally float \
    for from function get goto if implements import in instanceof int interface let long native \
    new null of package private protected public return set short static super switch \
    synchronized this throw throws transient true try typeof undefined var void volatile while \
    with yield";

pub fn mode() -> Result<Mode, ModeError> {
    let line_end = compile_pattern(SYNTAX, "closer", r"\n")?;

    Mode::builder(SYNTAX, MATCHER)
        .keywords(KEYWORDS)
        .assigners("= += -= *= /= %= **= <<= >>= >>>= &= |= ^= &&= ||= ??=")
        .combinators("== === != !== < > <= >= && || ?? !")
        .operators("+ - * / % ** ++ -- & | ^ ~ << >> >>> => ... ? :")
        .nonbreakers(". ?.")
        .breakers(", ;")
        .quotes("' \" `")
        .comments(
            Closures::new()
                .with(ClosureSpec::new("//", Closer::Pattern(line_end)))
                .with(ClosureSpec::new("/*", "*/")),
        )
        .closures(Closures::from_pairs(&[("{", "}"), ("(", ")"), ("[", "]")]))
        .spans("`", Closures::from_pairs(&[("${", "}")]))
        .maybe_identifier(r"^[\p{L}_$][\p{L}\p{N}_$]*$")
        .maybe_keyword(r"^[a-z]+$")
        .build()
}
