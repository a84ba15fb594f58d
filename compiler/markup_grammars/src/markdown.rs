//! Markdown.
//!
//! Fenced code blocks are comment groupings. A fence opens a block only at the
//! start of a line, after at most three spaces; elsewhere it pairs up like an
//! inline comment. Opening a block reads the info string, then hands the
//! block body over in one go: embedded under the named syntax when there is
//! one, otherwise split into indent, code and newline fragments per line.
//! Scanning resumes at the closing fence, which closes the grouping.

use std::sync::Arc;

use markup_tokenizer::{
    ClosureSpec, Closures, Context, Delegation, Fragment, GroupingHooks, Mode, ModeError, ScanState,
    Token, TokenKind,
};

pub const SYNTAX: &str = "md";

pub const ALIASES: &[&str] = &["markdown"];

const MATCHER: &str = concat!(
    r"(\s+)",
    r"|(\\(?s:.)|```|~~~|<!--|-->|[^\s\w])",
    r"|(\w+)",
);

/// Splits fenced blocks into info string and body.
#[derive(Debug, Default)]
pub struct FenceHooks;

impl GroupingHooks for FenceHooks {
    fn open(
        &self,
        token: &Token,
        state: &ScanState<'_>,
        _context: &Context,
    ) -> Option<Delegation> {
        let fence = &*token.text;
        let source = state.source;
        if !opens_line(source, token.offset) {
            return None;
        }
        let info_start = state.index;
        let info_end = info_start + source.get(info_start..)?.find('\n')?;
        let body_start = info_end + 1;

        let info = &source[info_start..info_end];
        if fence.starts_with('`') && info.contains('`') {
            return None;
        }

        let closer = find_closing_fence(source, body_start, fence)?;
        let mut fragments = Vec::new();
        let language = push_info(&mut fragments, info, info_start);
        fragments.push(Fragment::typed("\n", info_end, TokenKind::Whitespace));

        let body = &source[body_start..closer.line];
        match language {
            Some(language) if !body.is_empty() => {
                // The newline before the closing fence belongs to the fence line.
                let code_end = closer.line - 1;
                if code_end > body_start {
                    let code = &source[body_start..code_end];
                    fragments.push(Fragment::embedded(language, code, body_start));
                }
                fragments.push(Fragment::typed(
                    &source[code_end..closer.fence],
                    code_end,
                    TokenKind::Whitespace,
                ));
            }
            _ => {
                push_lines(&mut fragments, body, body_start);
                if closer.fence > closer.line {
                    fragments.push(Fragment::typed(
                        &source[closer.line..closer.fence],
                        closer.line,
                        TokenKind::Whitespace,
                    ));
                }
            }
        }

        tracing::debug!(fence, language, body = body.len(), "fenced block");
        Some(Delegation::Fragments {
            fragments,
            index: closer.fence,
        })
    }
}

/// Whether only up to three spaces precede `offset` on its line.
fn opens_line(source: &str, offset: usize) -> bool {
    let Some(before) = source.get(..offset) else {
        return false;
    };
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let indent = &before[line_start..];
    indent.len() <= 3 && indent.bytes().all(|b| b == b' ')
}

struct ClosingFence {
    /// Start of the closing fence's line.
    line: usize,
    /// Start of the fence itself, after its indent.
    fence: usize,
}

/// First line at or after `from` that, after spaces and tabs, starts with `fence`.
fn find_closing_fence(source: &str, from: usize, fence: &str) -> Option<ClosingFence> {
    let mut line = from;
    while line <= source.len() {
        let rest = &source[line..];
        let trimmed = rest.trim_start_matches([' ', '\t']);
        if trimmed.starts_with(fence) {
            return Some(ClosingFence {
                line,
                fence: line + (rest.len() - trimmed.len()),
            });
        }
        line += rest.find('\n')? + 1;
    }
    None
}

/// Emit the info string (leading space, text, trailing space) and return the
/// language it names.
fn push_info<'s>(fragments: &mut Vec<Fragment>, info: &'s str, offset: usize) -> Option<&'s str> {
    let trimmed_start = info.trim_start();
    let lead = info.len() - trimmed_start.len();
    let text = trimmed_start.trim_end();

    if lead > 0 {
        fragments.push(Fragment::typed(&info[..lead], offset, TokenKind::Whitespace));
    }
    if text.is_empty() {
        return None;
    }
    fragments.push(Fragment::typed(text, offset + lead, TokenKind::Text));
    let tail = lead + text.len();
    if tail < info.len() {
        fragments.push(Fragment::typed(&info[tail..], offset + tail, TokenKind::Whitespace));
    }
    text.split_whitespace().next()
}

/// Indent, code and newline fragments for each line of `body`.
fn push_lines(fragments: &mut Vec<Fragment>, body: &str, offset: usize) {
    let mut start = 0;
    for line in body.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let code = content.trim_start_matches([' ', '\t']);
        let indent = content.len() - code.len();

        if indent > 0 {
            let lead = &content[..indent];
            fragments.push(Fragment::typed(lead, offset + start, TokenKind::Whitespace));
        }
        if !code.is_empty() {
            fragments.push(Fragment::typed(code, offset + start + indent, TokenKind::Code));
        }
        if content.len() < line.len() {
            let newline = offset + start + content.len();
            fragments.push(Fragment::typed("\n", newline, TokenKind::Whitespace));
        }
        start += line.len();
    }
}

pub fn mode() -> Result<Mode, ModeError> {
    let fences: Arc<dyn GroupingHooks> = Arc::new(FenceHooks);

    Mode::builder(SYNTAX, MATCHER)
        .quotes("`")
        .comments(
            Closures::new()
                .with(ClosureSpec::new("```", "```").with_hooks(Arc::clone(&fences)))
                .with(ClosureSpec::new("~~~", "~~~").with_hooks(fences))
                .with(ClosureSpec::new("<!--", "-->")),
        )
        .closures(Closures::from_pairs(&[("[", "]"), ("(", ")")]))
        .build()
}
