//! Syntax registry.
//!
//! Maps syntax identifiers (and aliases) to [`Mode`]s and caches one
//! [`Tokenizer`] per Mode. Delegating hooks name their target syntax; the
//! scanner resolves it here at delegation time.
//!
//! Registration is validated eagerly. Modes may also be registered as
//! factories, realized on first use.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::scanner::{Scanner, Tokenizer};
use crate::{Mode, ModeError, RegistryConfig, RegistryError, Token};

type ModeFactory = Box<dyn Fn() -> Result<Mode, ModeError> + Send + Sync>;

/// Aliases and prerequisites for a registration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    pub aliases: Vec<String>,
    /// Syntaxes that must already be registered.
    pub requires: Vec<String>,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_owned());
        self
    }

    #[must_use]
    pub fn requires(mut self, syntax: &str) -> Self {
        self.requires.push(syntax.to_owned());
        self
    }
}

/// Caller-side description of a tokenize request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenizeState {
    /// Syntax or alias to scan with.
    pub source_type: Option<String>,
}

impl TokenizeState {
    pub fn new(source_type: &str) -> Self {
        TokenizeState {
            source_type: Some(source_type.to_owned()),
        }
    }
}

struct Entry {
    syntax: Arc<str>,
    aliases: Vec<Arc<str>>,
    factory: Option<ModeFactory>,
    mode: OnceCell<Arc<Mode>>,
    tokenizer: OnceCell<Arc<Tokenizer>>,
}

impl Entry {
    fn mode(&self) -> Result<Arc<Mode>, RegistryError> {
        let mode = self.mode.get_or_try_init(|| {
            let Some(factory) = &self.factory else {
                return Err(RegistryError::UnknownSyntax {
                    id: self.syntax.to_string(),
                });
            };
            debug!(syntax = %self.syntax, "realizing mode");
            let mode = factory().map_err(|source| RegistryError::Factory {
                syntax: self.syntax.to_string(),
                source,
            })?;
            if mode.syntax() != &self.syntax {
                return Err(RegistryError::MismatchedSyntax {
                    syntax: self.syntax.to_string(),
                    found: mode.syntax().to_string(),
                });
            }
            Ok(Arc::new(mode))
        })?;
        Ok(Arc::clone(mode))
    }
}

#[derive(Default)]
struct Entries {
    by_syntax: FxHashMap<Arc<str>, Arc<Entry>>,
    /// Alias to canonical syntax.
    by_alias: FxHashMap<Arc<str>, Arc<str>>,
}

impl Entries {
    fn resolve(&self, id: &str) -> Option<&Arc<Entry>> {
        match self.by_syntax.get(id) {
            Some(entry) => Some(entry),
            None => self.by_alias.get(id).and_then(|syntax| self.by_syntax.get(syntax)),
        }
    }

    fn owner(&self, id: &str) -> Option<Arc<str>> {
        self.resolve(id).map(|entry| Arc::clone(&entry.syntax))
    }
}

/// Thread-safe syntax registry.
#[derive(Default)]
pub struct Registry {
    config: RegistryConfig,
    entries: RwLock<Entries>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Registry {
            config,
            entries: RwLock::default(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a built Mode under its own syntax.
    pub fn register(
        &self,
        mode: Mode,
        options: RegisterOptions,
    ) -> Result<Arc<Mode>, RegistryError> {
        let mode = Arc::new(mode);
        let syntax = Arc::clone(mode.syntax());
        self.insert(&syntax, &options, Some(Arc::clone(&mode)), None)?;
        Ok(mode)
    }

    /// Register a Mode built on first use.
    pub fn register_factory<F>(
        &self,
        syntax: &str,
        options: RegisterOptions,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn() -> Result<Mode, ModeError> + Send + Sync + 'static,
    {
        self.insert(syntax, &options, None, Some(Box::new(factory)))
    }

    fn insert(
        &self,
        syntax: &str,
        options: &RegisterOptions,
        mode: Option<Arc<Mode>>,
        factory: Option<ModeFactory>,
    ) -> Result<(), RegistryError> {
        validate_identifier(syntax)?;
        for alias in &options.aliases {
            validate_identifier(alias)?;
        }

        let mut entries = self.entries.write();
        if entries.resolve(syntax).is_some() {
            return Err(RegistryError::DuplicateSyntax {
                syntax: syntax.to_owned(),
            });
        }
        for (i, alias) in options.aliases.iter().enumerate() {
            let owner = if alias.as_str() == syntax || options.aliases[..i].contains(alias) {
                Some(Arc::from(syntax))
            } else {
                entries.owner(alias)
            };
            if let Some(owner) = owner {
                return Err(RegistryError::DuplicateAlias {
                    alias: alias.clone(),
                    owner: owner.to_string(),
                });
            }
        }
        for requirement in &options.requires {
            if entries.resolve(requirement).is_none() {
                return Err(RegistryError::MissingRequirement {
                    syntax: syntax.to_owned(),
                    requirement: requirement.clone(),
                });
            }
        }

        let syntax: Arc<str> = Arc::from(syntax);
        let aliases: Vec<Arc<str>> = options
            .aliases
            .iter()
            .map(|a| Arc::from(a.as_str()))
            .collect();
        let entry = Arc::new(Entry {
            syntax: Arc::clone(&syntax),
            aliases: aliases.clone(),
            factory,
            mode: mode.map_or_else(OnceCell::new, OnceCell::with_value),
            tokenizer: OnceCell::new(),
        });
        for alias in aliases {
            entries.by_alias.insert(alias, Arc::clone(&syntax));
        }
        entries.by_syntax.insert(Arc::clone(&syntax), Arc::clone(&entry));
        debug!(
            %syntax,
            aliases = ?options.aliases,
            lazy = entry.factory.is_some(),
            "registered syntax"
        );
        Ok(())
    }

    /// Remove a syntax and its aliases.
    pub fn unregister(&self, id: &str) -> Result<(), RegistryError> {
        let mut entries = self.entries.write();
        let Some(syntax) = entries.owner(id) else {
            return Err(RegistryError::UnknownSyntax { id: id.to_owned() });
        };
        if let Some(entry) = entries.by_syntax.remove(&syntax) {
            for alias in &entry.aliases {
                entries.by_alias.remove(alias);
            }
        }
        debug!(%syntax, "unregistered syntax");
        Ok(())
    }

    /// Check that every syntax in `list` is registered, on behalf of `syntax`.
    pub fn requires(&self, syntax: &str, list: &[&str]) -> Result<(), RegistryError> {
        let entries = self.entries.read();
        match list.iter().find(|id| entries.resolve(id).is_none()) {
            Some(missing) => Err(RegistryError::MissingRequirement {
                syntax: syntax.to_owned(),
                requirement: (*missing).to_owned(),
            }),
            None => Ok(()),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().resolve(id).is_some()
    }

    /// Canonical syntax for a syntax or alias.
    pub fn resolve(&self, id: &str) -> Option<Arc<str>> {
        self.entries.read().owner(id)
    }

    /// Registered syntaxes, sorted.
    pub fn syntaxes(&self) -> Vec<Arc<str>> {
        let mut syntaxes: Vec<Arc<str>> = self.entries.read().by_syntax.keys().cloned().collect();
        syntaxes.sort_unstable();
        syntaxes
    }

    fn entry(&self, id: &str) -> Result<Arc<Entry>, RegistryError> {
        self.entries
            .read()
            .resolve(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownSyntax { id: id.to_owned() })
    }

    /// Mode for a syntax or alias, realizing a factory if needed.
    pub fn get(&self, id: &str) -> Result<Arc<Mode>, RegistryError> {
        // Factories run without the registry lock held.
        self.entry(id)?.mode()
    }

    /// Cached tokenizer for a syntax or alias.
    pub fn tokenizer(&self, id: &str) -> Result<Arc<Tokenizer>, RegistryError> {
        let entry = self.entry(id)?;
        let tokenizer = entry.tokenizer.get_or_try_init(|| {
            let mode = entry.mode()?;
            Ok::<_, RegistryError>(Arc::new(Tokenizer::with_config(mode, self.config.scan)))
        })?;
        Ok(Arc::clone(tokenizer))
    }

    /// Scan `source` with the Mode named by `state`, falling back to the
    /// configured fallback syntax. Unresolvable requests yield no tokens.
    #[tracing::instrument(level = "debug", skip(self, source), fields(len = source.len()))]
    pub fn tokenize<'r, 's>(&'r self, source: &'s str, state: &TokenizeState) -> Tokens<'r, 's> {
        let requested = state.source_type.as_deref().filter(|id| self.contains(id));
        let Some(id) = requested.or(self.config.fallback_syntax.as_deref()) else {
            warn!(source_type = ?state.source_type, "no mode for source type; yielding no tokens");
            return Tokens { scanner: None };
        };

        match self.tokenizer(id) {
            Ok(tokenizer) => Tokens {
                scanner: Some(tokenizer.tokenize(source, Some(self))),
            },
            Err(error) => {
                warn!(%error, "cannot tokenize; yielding no tokens");
                Tokens { scanner: None }
            }
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("syntaxes", &self.syntaxes())
            .finish()
    }
}

/// Token stream of [`Registry::tokenize`]; empty when the request was unresolved.
#[derive(Debug)]
pub struct Tokens<'r, 's> {
    scanner: Option<Scanner<'r, 's>>,
}

impl<'r, 's> Tokens<'r, 's> {
    pub fn is_resolved(&self) -> bool {
        self.scanner.is_some()
    }

    pub fn scanner(&self) -> Option<&Scanner<'r, 's>> {
        self.scanner.as_ref()
    }

    pub fn into_scanner(self) -> Option<Scanner<'r, 's>> {
        self.scanner
    }
}

impl Iterator for Tokens<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.scanner.as_mut()?.next()
    }
}

#[allow(clippy::expect_used, reason = "pattern is a literal")]
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_+-]*$").expect("valid regex"));

fn validate_identifier(id: &str) -> Result<(), RegistryError> {
    if IDENTIFIER.is_match(id) {
        Ok(())
    } else {
        Err(RegistryError::InvalidIdentifier { id: id.to_owned() })
    }
}
