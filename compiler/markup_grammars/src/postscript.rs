//! PostScript.
//!
//! Strings are `( )` closures with a matcher of their own: only escapes and
//! parentheses are sequences inside them, so `%` or a stray bracket in a
//! string stays text while nested parentheses still balance.

use markup_tokenizer::{compile_pattern, Closer, ClosureSpec, Closures, Mode, ModeError};

pub const SYNTAX: &str = "ps";

pub const ALIASES: &[&str] = &["postscript"];

const STRING_MATCHER: &str = r"(\s+)|(\\(?s:.)|[()])|([^\s()\\]+)";

/// Names (`/name`, `//name`) scan as one sequence so segments can type them.
const MATCHER: &str = concat!(
    r"(\s+)",
    r"|(\\(?s:.)|<<|>>|//?[^\s{}\[\]()<>/%]*|[{}\[\]()<>%])",
    r"|([^\s{}\[\]()<>/%]+)",
);

const KEYWORDS: &str = "\
    def begin end dict if ifelse for forall repeat loop exit exec stop show moveto rmoveto \
    lineto rlineto curveto arc stroke fill newpath closepath gsave grestore setrgbcolor \
    setgray setlinewidth translate rotate scale findfont scalefont setfont showpage add sub \
    mul div mod neg dup pop exch copy index roll true false null";

pub fn mode() -> Result<Mode, ModeError> {
    Mode::builder(SYNTAX, MATCHER)
        .keywords(KEYWORDS)
        .comments(Closures::new().with(ClosureSpec::new(
            "%",
            Closer::Pattern(compile_pattern(SYNTAX, "closer", r"\n")?),
        )))
        .closures(
            Closures::from_pairs(&[("{", "}"), ("[", "]"), ("<<", ">>")]).with(
                ClosureSpec::new("(", ")")
                    .with_matcher(compile_pattern(SYNTAX, "matcher", STRING_MATCHER)?),
            ),
        )
        .maybe_identifier(r"^[A-Za-z_][\w.-]*$")
        .segment("literal", r"^/[^/]")
        .segment("immediate", r"^//")
        .build()
}
