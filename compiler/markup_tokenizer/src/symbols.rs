//! Set-like symbol tables for grammar authors.

use rustc_hash::FxHashSet;

/// An unordered set of symbols (keywords, operators, quote characters...).
///
/// Grammars usually write these as one whitespace-separated string:
///
/// ```text
/// Symbols::from_words("+= -= *= /=")
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Symbols {
    set: FxHashSet<Box<str>>,
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a whitespace-separated list.
    pub fn from_words(words: &str) -> Self {
        words.split_whitespace().collect()
    }

    #[inline]
    pub fn includes(&self, text: &str) -> bool {
        self.set.contains(text)
    }

    pub fn insert(&mut self, symbol: impl Into<Box<str>>) -> bool {
        self.set.insert(symbol.into())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.set.iter().map(AsRef::as_ref)
    }
}

impl<'a> FromIterator<&'a str> for Symbols {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Symbols {
            set: iter.into_iter().map(Box::from).collect(),
        }
    }
}

impl FromIterator<String> for Symbols {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Symbols {
            set: iter.into_iter().map(String::into_boxed_str).collect(),
        }
    }
}
