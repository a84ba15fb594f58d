//! Configuration errors.
//!
//! Everything here is raised while building or registering grammars. The
//! scan loop itself has no error type: malformed source degrades instead of
//! failing.

use thiserror::Error;

/// A grammar definition that cannot be turned into a [`Mode`](crate::Mode).
#[derive(Debug, Error)]
pub enum ModeError {
    /// A matcher, closer or pattern failed to compile.
    #[error("invalid pattern for `{syntax}` ({role}): {source}")]
    Pattern {
        syntax: String,
        role: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The matcher must expose whitespace, sequence and word groups.
    #[error(
        "matcher for `{syntax}` must define at least 3 capture groups \
         (whitespace, sequence, word), found {found}"
    )]
    MatcherGroups { syntax: String, found: usize },

    /// A closure, comment or span table entry with an empty opener.
    #[error("empty opener in `{syntax}` {table} table")]
    EmptyOpener { syntax: String, table: &'static str },
}

/// Registry misuse: bad names, duplicates, unmet requirements.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("`{id}` is not a valid syntax identifier")]
    InvalidIdentifier { id: String },

    #[error("syntax `{syntax}` is already registered")]
    DuplicateSyntax { syntax: String },

    #[error("alias `{alias}` is already taken by `{owner}`")]
    DuplicateAlias { alias: String, owner: String },

    #[error("`{syntax}` requires `{requirement}`, which is not registered")]
    MissingRequirement { syntax: String, requirement: String },

    #[error("no mode registered for `{id}`")]
    UnknownSyntax { id: String },

    #[error("mode factory for `{syntax}` produced `{found}`")]
    MismatchedSyntax { syntax: String, found: String },

    #[error("mode factory for `{syntax}` failed")]
    Factory {
        syntax: String,
        #[source]
        source: ModeError,
    },
}
