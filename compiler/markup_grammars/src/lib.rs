//! Grammars for `markup_tokenizer`.
//!
//! Each module exposes its syntax identifier and a `mode()` constructor.
//! [`standard_registry`] registers all of them as lazy factories, so a Mode is
//! only compiled the first time something is tokenized (or delegated) with it.
//!
//! | syntax | aliases | embeds |
//! |--------|---------|--------|
//! | `es`   | `js`, `javascript`, `ecmascript` | |
//! | `css`  | | |
//! | `html` | | `es` in `<script>`, `css` in `<style>` |
//! | `md`   | `markdown` | any registered syntax in fenced blocks |
//! | `ps`   | `postscript` | |

pub mod css;
pub mod es;
pub mod html;
pub mod markdown;
pub mod postscript;

use markup_tokenizer::{Mode, ModeError, RegisterOptions, Registry, RegistryConfig, RegistryError};

fn options(aliases: &[&str]) -> RegisterOptions {
    aliases
        .iter()
        .fold(RegisterOptions::new(), |options, alias| options.alias(alias))
}

/// Register every bundled grammar with `registry`.
pub fn register_all(registry: &Registry) -> Result<(), RegistryError> {
    registry.register_factory(es::SYNTAX, options(es::ALIASES), es::mode)?;
    registry.register_factory(css::SYNTAX, RegisterOptions::new(), css::mode)?;
    registry.register_factory(
        html::SYNTAX,
        RegisterOptions::new().requires(es::SYNTAX).requires(css::SYNTAX),
        html::mode,
    )?;
    registry.register_factory(markdown::SYNTAX, options(markdown::ALIASES), markdown::mode)?;
    registry.register_factory(postscript::SYNTAX, options(postscript::ALIASES), postscript::mode)?;
    Ok(())
}

/// A registry holding every bundled grammar.
pub fn standard_registry() -> Result<Registry, RegistryError> {
    registry_with_config(RegistryConfig::default())
}

pub fn registry_with_config(config: RegistryConfig) -> Result<Registry, RegistryError> {
    let registry = Registry::with_config(config);
    register_all(&registry)?;
    Ok(registry)
}

/// Build every bundled Mode eagerly, e.g. to validate patterns at startup.
pub fn modes() -> Result<Vec<Mode>, ModeError> {
    Ok(vec![es::mode()?, css::mode()?, html::mode()?, markdown::mode()?, postscript::mode()?])
}
