//! Lazily compiled regexes shared by the rewriting passes.
//!
//! A pattern that fails to compile yields `None`, and the pass that owns it
//! turns into a no-op instead of panicking.

use std::sync::LazyLock;

use regex::Regex;

pub(crate) type Pattern = LazyLock<Option<Regex>>;

/// Force a pattern, returning the compiled regex if it is valid.
pub(crate) fn compiled(pattern: &'static Pattern) -> Option<&'static Regex> {
    LazyLock::force(pattern).as_ref()
}

/// Compile a pattern built at runtime (e.g. around an identifier).
pub(crate) fn dynamic(pattern: &str) -> Option<Regex> {
    Regex::new(pattern).ok()
}
