//! HTML.
//!
//! Tags are closures opened by `<` (closed by `>` or `/>`) and `</`. Quotes
//! are only live inside tags, so apostrophes in text stay inert. Closing the
//! opening tag of a `<script>` or `<style>` element delegates the element
//! body to `es` or `css`.

use std::sync::Arc;

use markup_tokenizer::{
    compile_pattern, Closer, ClosureSpec, Closures, Context, Delegation, GroupingHooks, Mode,
    ModeError, ScanState, Symbols, Token,
};

pub const SYNTAX: &str = "html";

const MATCHER: &str = concat!(
    r"(\s+)",
    r"|(\\(?s:.)|<!--|-->|</|/>|[^\s\w])",
    r"|(\w[\w:.-]*)",
);

/// Syntax embedded in the body of a raw-text element.
pub fn element_syntax(tag: &str) -> Option<&'static str> {
    if tag.eq_ignore_ascii_case("script") {
        Some("es")
    } else if tag.eq_ignore_ascii_case("style") {
        Some("css")
    } else {
        None
    }
}

/// Delegates `<script>` and `<style>` bodies.
#[derive(Debug, Default)]
pub struct ElementHooks;

impl GroupingHooks for ElementHooks {
    fn close(
        &self,
        token: &Token,
        state: &ScanState<'_>,
        _context: &Context,
    ) -> Option<Delegation> {
        let opener = state.opener?;
        if &*opener.text != "<" || &*token.text != ">" {
            return None;
        }

        let tag = tag_name(state.source.get(opener.end()..)?);
        let syntax = element_syntax(tag)?;
        let end = find_closing_tag(state.source, state.index, tag)?;
        tracing::debug!(tag, syntax, offset = state.index, end, "embedding element body");
        Some(Delegation::subrange(syntax, state.index, end))
    }
}

fn tag_name(rest: &str) -> &str {
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Byte offset of `</tag` at or after `from`, matched case-insensitively.
fn find_closing_tag(source: &str, from: usize, tag: &str) -> Option<usize> {
    let haystack = source.get(from..)?.as_bytes();
    let needle_len = tag.len() + 2;
    haystack
        .windows(needle_len)
        .position(|window| {
            window.starts_with(b"</") && window[2..].eq_ignore_ascii_case(tag.as_bytes())
        })
        .map(|position| from + position)
}

pub fn mode() -> Result<Mode, ModeError> {
    let hooks: Arc<dyn GroupingHooks> = Arc::new(ElementHooks);
    let tag_quotes = Symbols::from_words("\" '");
    let tag_end = compile_pattern(SYNTAX, "closer", r"^/?>$")?;

    Mode::builder(SYNTAX, MATCHER)
        .assigners("=")
        .comments(Closures::new().with(ClosureSpec::new("<!--", "-->")))
        .closures(
            Closures::new()
                .with(
                    ClosureSpec::new("<", Closer::Pattern(tag_end))
                        .with_quotes(tag_quotes.clone())
                        .with_hooks(Arc::clone(&hooks)),
                )
                .with(
                    ClosureSpec::new("</", ">")
                        .with_quotes(tag_quotes)
                        .with_hooks(hooks),
                ),
        )
        .maybe_identifier(r"^[A-Za-z][\w:-]*$")
        .build()
}
