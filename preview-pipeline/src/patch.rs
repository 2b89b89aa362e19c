//! Auto-patcher: shallow, error-driven rewrites for the failure classes
//! generated snippets hit most often.
//!
//! Rules live in [`RULES`] and are tried in table order against the source
//! as rewritten by the rules before them. Any subset may fire; none firing
//! returns the source unchanged. No rule can panic.

use regex::Regex;
use tracing::debug;

use crate::normalize::{declares, first_component, rename_component, CANONICAL_COMPONENT};
use crate::pattern::{compiled, dynamic, Pattern};

/// The error a patch is trying to fix, as reported by the sandbox.
#[derive(Debug, Clone, Copy)]
pub struct ErrorReport<'a> {
    pub message: &'a str,
    /// 1-based line from a transpiler `(line:col)` suffix, if present.
    pub line: Option<usize>,
}

impl<'a> ErrorReport<'a> {
    pub fn parse(message: &'a str) -> Self {
        let line = compiled(&LOCATION)
            .and_then(|re| re.captures_iter(message).last())
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok());
        Self { message, line }
    }

    /// Capitalized identifier from a `"<Name> is not defined"` message.
    fn undefined_component(&self) -> Option<&'a str> {
        compiled(&NOT_DEFINED)
            .and_then(|re| re.captures(self.message))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }
}

/// One pattern -> rewrite rule. `apply` returns `None` when the rule does not
/// match or would not change anything.
pub struct PatchRule {
    pub name: &'static str,
    apply: fn(&str, &ErrorReport<'_>) -> Option<String>,
}

/// The rule table, in application order.
pub static RULES: &[PatchRule] = &[
    PatchRule {
        name: "rename-to-expected",
        apply: rename_to_expected,
    },
    PatchRule {
        name: "rename-to-canonical",
        apply: rename_to_canonical,
    },
    PatchRule {
        name: "wrap-adjacent-elements",
        apply: wrap_adjacent_elements,
    },
    PatchRule {
        name: "unexpected-token-whitespace",
        apply: fix_keyword_spacing,
    },
];

/// Result of running the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub source: String,
    pub applied: Vec<&'static str>,
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Best-effort patch of `source` for `error`. Returns the input unchanged
/// when no rule applies.
pub fn patch(source: &str, error: &str) -> String {
    apply_rules(source, error).source
}

/// Run every rule in order and report which ones fired.
pub fn apply_rules(source: &str, error: &str) -> PatchOutcome {
    let report = ErrorReport::parse(error);
    let mut current = source.to_string();
    let mut applied = Vec::new();
    for rule in RULES {
        if let Some(next) = (rule.apply)(&current, &report) {
            if next != current {
                debug!(rule = rule.name, "applied patch rule");
                current = next;
                applied.push(rule.name);
            }
        }
    }
    PatchOutcome {
        source: current,
        applied,
    }
}

// ── Patterns ──────────────────────────────────────────────────────────

static LOCATION: Pattern = Pattern::new(|| Regex::new(r"\((\d+):(\d+)\)").ok());

static NOT_DEFINED: Pattern =
    Pattern::new(|| Regex::new(r"\b([A-Z][\w$]*) is not defined").ok());

static ADJACENT: Pattern = Pattern::new(|| {
    Regex::new(r"(?i)adjacent jsx elements|must be wrapped in an enclosing tag").ok()
});

static RETURN_JSX: Pattern =
    Pattern::new(|| Regex::new(r"\breturn[ \t]*(\(?)[ \t\r\n]*<").ok());

static BARE_RETURN_END: Pattern =
    Pattern::new(|| Regex::new(r">[ \t]*;?[ \t]*\r?\n[ \t]*\}").ok());

static BARE_RETURN_SEMI: Pattern = Pattern::new(|| Regex::new(r">[ \t]*;").ok());

static PAREN_RETURN_END: Pattern =
    Pattern::new(|| Regex::new(r">[ \t\r\n]*\)[ \t]*;?[ \t]*(?:\r?\n|$)").ok());

static CLOSE_ELSE: Pattern = Pattern::new(|| Regex::new(r"\}[ \t\r\n]*else\b").ok());
static ELSE_OPEN: Pattern = Pattern::new(|| Regex::new(r"\belse[ \t]*\{").ok());
static CLOSE_CATCH: Pattern = Pattern::new(|| Regex::new(r"\}[ \t\r\n]*catch\b").ok());
static CATCH_OPEN: Pattern = Pattern::new(|| Regex::new(r"\bcatch[ \t]*\(").ok());
static CLOSE_FINALLY: Pattern = Pattern::new(|| Regex::new(r"\}[ \t\r\n]*finally\b").ok());

static FENCE_LINE: Pattern =
    Pattern::new(|| Regex::new(r"(?m)^[ \t]*```[\w+#.-]*[ \t]*(?:\r?\n|$)").ok());

// ── Rules ─────────────────────────────────────────────────────────────

/// Globals supplied by the document runtime. A missing one means a runtime
/// failed to load, not that a component is misnamed.
const RUNTIME_GLOBALS: &[&str] = &["React", "ReactDOM", "Babel"];

/// Whether `name` is used as a JSX tag anywhere in `source`.
fn used_as_tag(source: &str, name: &str) -> bool {
    dynamic(&format!(r"<{}[\s/>]", regex::escape(name))).is_some_and(|re| re.is_match(source))
}

/// `"<Name> is not defined"` where nothing renders `<Name>`: the host
/// expected the root component under that name, so give it that name.
fn rename_to_expected(source: &str, error: &ErrorReport<'_>) -> Option<String> {
    let expected = error.undefined_component()?;
    if RUNTIME_GLOBALS.contains(&expected)
        || declares(source, expected)
        || used_as_tag(source, expected)
    {
        return None;
    }
    let decl = first_component(source)?;
    Some(rename_component(source, &decl, expected))
}

/// A capitalized `is not defined` while the canonical component is still
/// missing: bind the first component to the canonical name.
fn rename_to_canonical(source: &str, error: &ErrorReport<'_>) -> Option<String> {
    let missing = error.undefined_component()?;
    if RUNTIME_GLOBALS.contains(&missing)
        || declares(source, CANONICAL_COMPONENT)
        || declares(source, missing)
    {
        return None;
    }
    let decl = first_component(source)?;
    Some(rename_component(source, &decl, CANONICAL_COMPONENT))
}

/// Sibling JSX roots: wrap the offending return's markup in a fragment.
fn wrap_adjacent_elements(source: &str, error: &ErrorReport<'_>) -> Option<String> {
    if !compiled(&ADJACENT)?.is_match(error.message) {
        return None;
    }
    let returns: Vec<_> = compiled(&RETURN_JSX)?.captures_iter(source).collect();
    let line_of = |offset: usize| source[..offset].matches('\n').count() + 1;
    let target = error
        .line
        .and_then(|line| {
            returns
                .iter()
                .filter(|c| c.get(0).is_some_and(|m| line_of(m.start()) <= line))
                .last()
        })
        .or_else(|| returns.first())?;

    let whole = target.get(0)?;
    // The match ends just past the opening `<`.
    let open = whole.end() - 1;
    if source[open..].starts_with("<>") {
        return None;
    }
    let parenthesized = target.get(1).is_some_and(|m| !m.as_str().is_empty());
    let rest = &source[open..];
    let close = if parenthesized {
        compiled(&PAREN_RETURN_END)?.find(rest)
    } else {
        compiled(&BARE_RETURN_END)?
            .find(rest)
            .or_else(|| compiled(&BARE_RETURN_SEMI).and_then(|re| re.find(rest)))
    }?;
    // `close` starts at the final `>` of the markup.
    let close = open + close.start() + 1;

    let mut out = String::with_capacity(source.len() + 5);
    out.push_str(&source[..open]);
    out.push_str("<>");
    out.push_str(&source[open..close]);
    out.push_str("</>");
    out.push_str(&source[close..]);
    Some(out)
}

/// `Unexpected token`: normalize spacing at `else`/`catch`/`finally`
/// boundaries and drop stray markdown fence lines.
fn fix_keyword_spacing(source: &str, error: &ErrorReport<'_>) -> Option<String> {
    if !error.message.contains("Unexpected token") {
        return None;
    }
    let mut out = source.to_string();
    if let Some(re) = compiled(&FENCE_LINE) {
        out = re.replace_all(&out, "").into_owned();
    }
    let spacing: [(&'static Pattern, &str); 5] = [
        (&CLOSE_ELSE, "} else"),
        (&ELSE_OPEN, "else {"),
        (&CLOSE_CATCH, "} catch"),
        (&CATCH_OPEN, "catch ("),
        (&CLOSE_FINALLY, "} finally"),
    ];
    for (pattern, replacement) in spacing {
        if let Some(re) = compiled(pattern) {
            out = re.replace_all(&out, replacement).into_owned();
        }
    }
    Some(out)
}
