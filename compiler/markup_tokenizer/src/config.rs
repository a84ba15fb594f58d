//! Scan and registry configuration.

/// Knobs for a single scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanConfig {
    /// Deepest nesting of delegated scans. A delegation past this depth is
    /// emitted as one `code` token instead of being tokenized.
    pub max_delegation_depth: usize,
    /// Token count per chunk yielded by [`Scanner::batches`](crate::Scanner::batches).
    pub batch_size: usize,
}

impl ScanConfig {
    pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 8;
    pub const DEFAULT_BATCH_SIZE: usize = 256;

    #[must_use]
    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    /// Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            max_delegation_depth: Self::DEFAULT_MAX_DELEGATION_DEPTH,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }
}

/// Registry-wide settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegistryConfig {
    /// Syntax used when a tokenize request names no (or an unknown) source type.
    pub fallback_syntax: Option<String>,
    /// Config handed to every tokenizer the registry creates.
    pub scan: ScanConfig,
}

impl RegistryConfig {
    #[must_use]
    pub fn with_fallback(mut self, syntax: impl Into<String>) -> Self {
        self.fallback_syntax = Some(syntax.into());
        self
    }

    #[must_use]
    pub fn with_scan(mut self, scan: ScanConfig) -> Self {
        self.scan = scan;
        self
    }
}
