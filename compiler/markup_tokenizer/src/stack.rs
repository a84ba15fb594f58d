//! Stack growth for nested delegation.
//!
//! Each delegated scan runs a full scanner on the native stack of the one
//! that delegated to it. Grammars that embed each other (HTML hosting a
//! script, markdown hosting a fenced block) nest those scans, so every
//! delegation is entered through [`ensure_sufficient_stack`].
//!
//! - **Native targets**: `stacker` grows the stack on demand.
//! - **WASM targets**: passthrough.

/// Grow when less than this remains (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Size of each growth segment (1MB).
const STACK_PER_DELEGATION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if it is close to exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_DELEGATION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
