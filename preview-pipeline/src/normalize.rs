//! Source normalizer: strips module syntax from a component snippet and
//! binds its root component to [`CANONICAL_COMPONENT`] so the bootstrap
//! trailer can mount it without knowing what the model called it.
//!
//! This is a textual rewrite: line-anchored patterns, no parsing. Anything
//! the patterns do not recognise is left exactly as written.

use regex::{Captures, Regex};

use crate::pattern::{compiled, dynamic, Pattern};

/// The identifier the bootstrap trailer mounts.
pub const CANONICAL_COMPONENT: &str = "App";

/// Name given to an anonymous default export when the canonical name is
/// already taken.
const FALLBACK_DEFAULT: &str = "__PreviewDefault";

/// A top-level, capitalized declaration that looks like a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDecl {
    pub name: String,
    /// Byte range of the identifier at the declaration site.
    pub start: usize,
    pub end: usize,
}

// ── Module syntax ─────────────────────────────────────────────────────

static IMPORT_STATEMENT: Pattern = Pattern::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*(?:import\b[^;'"]*?["'][^"'\n]*["'][ \t]*;?[ \t]*)+(?://[^\n]*|/\*[^\n]*?\*/[ \t]*)?(?:\r?\n|$)"#,
    )
    .ok()
});

static EXPORT_LIST: Pattern = Pattern::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*export[ \t]*(?:type[ \t]*)?(?:\{[^}]*\}|\*(?:[ \t]+as[ \t]+[\w$]+)?)(?:[ \t]*from[ \t]*["'][^"'\n]*["'])?[ \t]*;?[ \t]*(?:\r?\n|$)"#,
    )
    .ok()
});

static EXPORT_DEFAULT_IDENT: Pattern = Pattern::new(|| {
    Regex::new(r"(?m)^[ \t]*export[ \t]+default[ \t]+[A-Za-z_$][\w$]*[ \t]*;?[ \t]*(?:\r?\n|$)").ok()
});

static EXPORT_DEFAULT_IDENT_INLINE: Pattern = Pattern::new(|| {
    Regex::new(r"(?m)([;}])[ \t]*export[ \t]+default[ \t]+[A-Za-z_$][\w$]*[ \t]*(?:;|$)").ok()
});

static EXPORT_DEFAULT_ANON_FN: Pattern = Pattern::new(|| {
    Regex::new(r"(?m)^([ \t]*)export[ \t]+default[ \t]+((?:async[ \t]+)?function)[ \t]*(\*?)[ \t]*\(")
        .ok()
});

static EXPORT_DEFAULT_ARROW: Pattern = Pattern::new(|| {
    Regex::new(r"(?m)^([ \t]*)export[ \t]+default[ \t]+((?:async[ \t]*)?\()").ok()
});

static EXPORT_PREFIX: Pattern = Pattern::new(|| {
    Regex::new(r"(?m)(^|[;}])([ \t]*)export[ \t]+(?:default[ \t]+)?").ok()
});

// ── Component declarations ────────────────────────────────────────────

static FUNCTION_COMPONENT: Pattern = Pattern::new(|| {
    Regex::new(r"(?m)^(?:async[ \t]+)?function[ \t]*\*?[ \t]*([A-Z][\w$]*)[ \t]*[(<]").ok()
});

static CONST_COMPONENT: Pattern = Pattern::new(|| {
    Regex::new(
        r"(?m)^(?:const|let|var)[ \t]+([A-Z][\w$]*)[ \t]*(?::[^=\n]+)?=[ \t]*(?:async[ \t]*)?(?:\(|<|function\b|[A-Za-z_$][\w$]*[ \t]*=>|(?:React\.)?(?:memo|forwardRef)\b)",
    )
    .ok()
});

static CLASS_COMPONENT: Pattern =
    Pattern::new(|| Regex::new(r"(?m)^class[ \t]+([A-Z][\w$]*)[ \t]+extends\b").ok());

/// Normalize a component snippet: strip imports/exports and, unless the
/// canonical component is already declared, rename the first top-level
/// component declaration (and its tag usages) to the canonical name.
///
/// Idempotent: normalizing normalized output returns it unchanged.
pub fn normalize(source: &str) -> String {
    let default_name = if declares(source, CANONICAL_COMPONENT) {
        FALLBACK_DEFAULT
    } else {
        CANONICAL_COMPONENT
    };
    // Trim before looking for declarations so "top level" means the same
    // thing on a second pass.
    let stripped = strip_module_syntax(source.trim(), default_name)
        .trim()
        .to_string();

    if declares(&stripped, CANONICAL_COMPONENT) {
        return stripped;
    }
    match first_component(&stripped) {
        Some(decl) => rename_component(&stripped, &decl, CANONICAL_COMPONENT),
        None => stripped,
    }
}

/// Remove import statements and export syntax.
///
/// Export lists and `export default Name;` lines disappear entirely;
/// otherwise only the `export`/`export default` prefix is dropped and the
/// declaration stays. Anonymous default exports are bound to `default_name`.
pub fn strip_module_syntax(source: &str, default_name: &str) -> String {
    let mut out = source.to_string();

    for pattern in [&IMPORT_STATEMENT, &EXPORT_LIST, &EXPORT_DEFAULT_IDENT] {
        if let Some(re) = compiled(pattern) {
            out = re.replace_all(&out, "").into_owned();
        }
    }
    if let Some(re) = compiled(&EXPORT_DEFAULT_IDENT_INLINE) {
        out = re.replace_all(&out, "${1}").into_owned();
    }

    if let Some(re) = compiled(&EXPORT_DEFAULT_ANON_FN) {
        out = re
            .replace_all(&out, |c: &Captures| {
                format!("{}{}{} {default_name}(", &c[1], &c[2], &c[3])
            })
            .into_owned();
    }
    if let Some(re) = compiled(&EXPORT_DEFAULT_ARROW) {
        out = re
            .replace_all(&out, |c: &Captures| {
                format!("{}const {default_name} = {}", &c[1], &c[2])
            })
            .into_owned();
    }
    if let Some(re) = compiled(&EXPORT_PREFIX) {
        out = re.replace_all(&out, "${1}${2}").into_owned();
    }
    out
}

/// Whether `source` declares `name` at line start as a function, class,
/// or `const`/`let`/`var` binding (an `export` prefix is allowed).
pub fn declares(source: &str, name: &str) -> bool {
    let name = regex::escape(name);
    dynamic(&format!(
        r"(?m)^[ \t]*(?:export[ \t]+(?:default[ \t]+)?)?(?:(?:async[ \t]+)?function[ \t]*\*?[ \t]*{name}[ \t]*[(<]|(?:const|let|var)[ \t]+{name}\b|class[ \t]+{name}\b)"
    ))
    .is_some_and(|re| re.is_match(source))
}

/// The first top-level declaration whose name starts with an uppercase
/// letter and whose shape suggests a component (function, arrow/function
/// valued binding, or class extending something).
pub fn first_component(source: &str) -> Option<ComponentDecl> {
    [&FUNCTION_COMPONENT, &CONST_COMPONENT, &CLASS_COMPONENT]
        .into_iter()
        .filter_map(compiled)
        .filter_map(|re| re.captures(source).and_then(|c| c.get(1)))
        .min_by_key(|m| m.start())
        .map(|m| ComponentDecl {
            name: m.as_str().to_string(),
            start: m.start(),
            end: m.end(),
        })
}

/// Rename a component at its declaration site and at every `<Name ...>`,
/// `<Name/>` and `</Name>` tag. Other references are left alone.
pub fn rename_component(source: &str, decl: &ComponentDecl, to: &str) -> String {
    if decl.name == to || source.get(decl.start..decl.end) != Some(decl.name.as_str()) {
        return source.to_string();
    }
    let mut out = String::with_capacity(source.len());
    out.push_str(&source[..decl.start]);
    out.push_str(to);
    out.push_str(&source[decl.end..]);
    rename_tags(&out, &decl.name, to)
}

/// Rename JSX tag usages of `from` to `to`.
pub fn rename_tags(source: &str, from: &str, to: &str) -> String {
    let escaped = regex::escape(from);
    let mut out = source.to_string();
    if let Some(open) = dynamic(&format!(r"<{escaped}([\s/>])")) {
        out = open
            .replace_all(&out, |c: &Captures| format!("<{to}{}", &c[1]))
            .into_owned();
    }
    if let Some(close) = dynamic(&format!(r"</[ \t]*{escaped}[ \t]*>")) {
        out = close.replace_all(&out, format!("</{to}>").as_str()).into_owned();
    }
    out
}

/// Derive a component identifier from a file stem (`my-header` ->
/// `MyHeader`), used to name anonymous default exports in sibling files.
pub fn component_name_for(stem: &str) -> String {
    let mut name = String::with_capacity(stem.len());
    let mut upper = true;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if upper {
                name.push(c.to_ascii_uppercase());
                upper = false;
            } else {
                name.push(c);
            }
        } else {
            upper = true;
        }
    }
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "Component");
    }
    name
}
