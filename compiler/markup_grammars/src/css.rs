//! CSS.
//!
//! Numbers with units (`1.5em`, `.5s`, `50%`), hex colors and class/id
//! selectors scan as single words. `:` is an assigner, so `color: red`
//! reads as a declaration.

use markup_tokenizer::{ClosureSpec, Closures, Mode, ModeError};

pub const SYNTAX: &str = "css";

const MATCHER: &str = concat!(
    r"(\s+)",
    r"|(\\(?s:.)|/\*|\*/|::|[^\s\w.#-])",
    r"|(-?\d*\.\d+[\w%]*|[#.]?[\w-]+%?|[#.])",
);

pub fn mode() -> Result<Mode, ModeError> {
    Mode::builder(SYNTAX, MATCHER)
        .keywords("and not only or from to inherit initial unset revert important")
        .assigners(":")
        .operators("> + ~ * ! =")
        .breakers("; ,")
        .quotes("\" '")
        .comments(Closures::new().with(ClosureSpec::new("/*", "*/")))
        .closures(Closures::from_pairs(&[("{", "}"), ("(", ")"), ("[", "]")]))
        .maybe_identifier(r"^-?[A-Za-z_][\w-]*$")
        .build()
}
