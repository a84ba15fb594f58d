//! Markup Tokenizer - grouping tokenizer engine
//!
//! One regex-driven cursor scans the source and classifies each match into a
//! [`Token`]. A nested grouping stack keeps strings, comments, bracket
//! closures and template spans balanced, and each grouping resolves its own
//! [`Context`] (matcher, punctuator tables, forming flag). Grouping hooks can
//! hand a sub-range of source to a tokenizer running under another [`Mode`],
//! whose tokens are spliced back into the outer stream.
//!
//! # Pipeline
//!
//! ```text
//! Scanner ── match ──► TokenSynthesizer ── punctuator ──► GroupingStack
//!    ▲                                                        │
//!    └──────── re-prime matcher ◄── Contextualizer ◄──────────┘
//! ```
//!
//! # Failure model
//!
//! Configuration problems surface as [`ModeError`] / [`RegistryError`] when a
//! grammar is built or registered. Scanning never fails: unterminated
//! groupings stay open, unresolved delegations degrade to `code` tokens, and
//! unknown source types produce an empty stream.
//!
//! # Tracing
//!
//! The engine emits `tracing` events (`debug` for grouping transitions and
//! delegation, `trace` per match). Call [`init_tracing`] from a binary or test
//! and run with `RUST_LOG=markup_tokenizer=debug`.

mod config;
mod context;
mod delegation;
mod error;
mod grouping;
mod mode;
mod registry;
mod scanner;
mod stack;
mod symbols;
mod synthesizer;
mod token;

#[cfg(test)]
mod test_helpers;

pub use config::{RegistryConfig, ScanConfig};
pub use context::{ClassCache, Context, Contextualizer};
pub use delegation::{Delegation, Fragment, ScanState};
pub use error::{ModeError, RegistryError};
pub use grouping::{Grouping, GroupingHooks, GroupingKind, GroupingStack, OpenGrouping};
pub use mode::{
    compile_pattern, Closer, ClosureSpec, Closures, Mode, ModeBuilder, Patterns, Segment,
};
pub use registry::{RegisterOptions, Registry, TokenizeState, Tokens};
pub use scanner::{Batches, Scanner, Tokenizer};
pub use stack::ensure_sufficient_stack;
pub use symbols::Symbols;
pub use synthesizer::{RawKind, RawMatch, TokenSynthesizer};
pub use token::{Punctuator, Token, TokenId, TokenKind, TokenList};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Only installs a subscriber when `RUST_LOG`
/// is set, e.g. `RUST_LOG=markup_tokenizer=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // A host may already own the global subscriber.
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
