//! Document synthesizer: turns a set of virtual files into one
//! self-contained HTML document for the sandbox.
//!
//! Strategy, by priority:
//! 1. a pre-built `.html` file is used verbatim, with stylesheets and
//!    scripts injected when missing ([`prebuilt`]);
//! 2. a component-style script is normalized, optionally patched, and
//!    mounted by the bootstrap trailer ([`component`]);
//! 3. plain scripts run inside a try/catch trailer ([`script`]);
//! 4. a lone stylesheet gets a static placeholder page ([`styles`]);
//! 5. otherwise the document is empty and must not be mounted.
//!
//! User text only enters a document through [`crate::escape`], so the
//! markup stays well-formed whatever the files contain.

pub mod component;
pub mod polyfills;
pub mod prebuilt;
pub mod prelude;
pub mod script;
pub mod styles;

use regex::Regex;
use serde::Serialize;

use crate::config::{PreviewConfig, RuntimeUrls};
use crate::escape::{html_escape, style_text};
use crate::file::{Language, VirtualFile};
use crate::pattern::{compiled, Pattern};

pub use polyfills::{Polyfill, PolyfillCatalog, PolyfillKind};

/// Which synthesis path produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Prebuilt,
    Component,
    PlainScript,
    StylesOnly,
    Empty,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prebuilt => "prebuilt",
            Self::Component => "component",
            Self::PlainScript => "plain-script",
            Self::StylesOnly => "styles-only",
            Self::Empty => "empty",
        }
    }
}

/// Retry context for a synthesis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchHint {
    pub last_error: Option<String>,
    pub attempt_patch: bool,
}

impl PatchHint {
    /// A first attempt: no patching.
    pub fn none() -> Self {
        Self::default()
    }

    /// A recovery attempt for `error`.
    pub fn retry(error: impl Into<String>) -> Self {
        Self {
            last_error: Some(error.into()),
            attempt_patch: true,
        }
    }

    /// The error to patch against, when patching is requested.
    pub fn patch_error(&self) -> Option<&str> {
        match (&self.last_error, self.attempt_patch) {
            (Some(e), true) => Some(e.as_str()),
            _ => None,
        }
    }
}

/// A synthesized document plus how it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub strategy: Strategy,
    pub html: String,
    /// File that drives the document (component entry or pre-built page).
    pub entry: Option<String>,
    /// Patch rules applied to the entry.
    pub patches: Vec<&'static str>,
}

impl Document {
    pub fn empty() -> Self {
        Self {
            strategy: Strategy::Empty,
            html: String::new(),
            entry: None,
            patches: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

/// Synthesizer configured with runtime URLs, a polyfill catalog and a title.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    pub runtime: RuntimeUrls,
    pub polyfills: PolyfillCatalog,
    pub title: String,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(&PreviewConfig::default())
    }
}

impl Synthesizer {
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            runtime: config.runtime.clone(),
            polyfills: PolyfillCatalog::standard(),
            title: config.title.clone(),
        }
    }

    pub fn with_polyfills(mut self, polyfills: PolyfillCatalog) -> Self {
        self.polyfills = polyfills;
        self
    }

    /// The document HTML, or `""` when nothing is renderable.
    pub fn synthesize(&self, files: &[VirtualFile], hint: &PatchHint) -> String {
        self.build(files, hint).html
    }

    pub fn build(&self, files: &[VirtualFile], hint: &PatchHint) -> Document {
        match select_strategy(files) {
            Strategy::Prebuilt => prebuilt::build(self, files),
            Strategy::Component => component::build(self, files, hint),
            Strategy::PlainScript => script::build(self, files),
            Strategy::StylesOnly => styles::build(self, files),
            Strategy::Empty => Document::empty(),
        }
    }

    /// Common document shell: prelude first, then `head`, then `body`.
    fn shell(&self, head: &str, body: &str) -> String {
        format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
{prelude}
{head}
</head>
<body>
{body}
</body>
</html>
"##,
            title = html_escape(&self.title),
            prelude = prelude::prelude_tag(),
        )
    }
}

/// Synthesize with the default configuration.
pub fn synthesize(files: &[VirtualFile], hint: &PatchHint) -> String {
    Synthesizer::default().synthesize(files, hint)
}

/// Pick the synthesis path for a file set.
pub fn select_strategy(files: &[VirtualFile]) -> Strategy {
    if files.iter().any(|f| f.language == Language::Html) {
        Strategy::Prebuilt
    } else if files.iter().any(is_component_like) {
        Strategy::Component
    } else if files.iter().any(is_plain_script) {
        Strategy::PlainScript
    } else if files.iter().any(is_stylesheet) {
        Strategy::StylesOnly
    } else {
        Strategy::Empty
    }
}

static COMPONENT_SIGNAL: Pattern = Pattern::new(|| {
    Regex::new(
        r"\buse(?:State|Effect|Ref|Memo|Callback|Reducer|Context|LayoutEffect)\s*\(|\bReact\.|\breturn\s*\(?\s*<[A-Za-z>]|=>\s*\(?\s*<[A-Za-z>]|</[A-Za-z][\w.]*>",
    )
    .ok()
});

/// Component-flavored extension, or a script whose content carries hook
/// calls, JSX-like markup or a function returning tags.
pub fn is_component_like(file: &VirtualFile) -> bool {
    match file.language {
        Language::Tsx | Language::Jsx => true,
        Language::Typescript | Language::Javascript => {
            compiled(&COMPONENT_SIGNAL).is_some_and(|re| re.is_match(&file.content))
        }
        _ => false,
    }
}

fn is_plain_script(file: &VirtualFile) -> bool {
    matches!(file.language, Language::Typescript | Language::Javascript)
        && !is_component_like(file)
}

fn is_stylesheet(file: &VirtualFile) -> bool {
    file.language == Language::Css
}

// ── Shared tag builders ───────────────────────────────────────────────

fn external_script(url: &str) -> String {
    format!("<script crossorigin src=\"{}\"></script>", html_escape(url))
}

/// One `<style>` element per stylesheet, in file order.
fn style_tags(files: &[VirtualFile]) -> String {
    files
        .iter()
        .filter(|f| is_stylesheet(f))
        .map(|f| {
            format!(
                "<style data-file=\"{}\">\n{}\n</style>",
                html_escape(&f.name),
                style_text(&f.content)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(name: &str, content: &str) -> VirtualFile {
        VirtualFile::new(name, content)
    }

    #[test]
    fn strategy_priority() {
        let html = f("index.html", "<html></html>");
        let tsx = f("App.tsx", "export default function App() { return <p/>; }");
        let js = f("main.js", "console.log(1)");
        let css = f("style.css", "body{}");
        let md = f("README.md", "# hi");

        assert_eq!(select_strategy(&[tsx.clone(), html.clone()]), Strategy::Prebuilt);
        assert_eq!(select_strategy(&[js.clone(), tsx.clone(), css.clone()]), Strategy::Component);
        assert_eq!(select_strategy(&[css.clone(), js.clone()]), Strategy::PlainScript);
        assert_eq!(select_strategy(&[css.clone(), md.clone()]), Strategy::StylesOnly);
        assert_eq!(select_strategy(&[md]), Strategy::Empty);
        assert_eq!(select_strategy(&[]), Strategy::Empty);
    }

    #[test]
    fn component_signals() {
        assert!(is_component_like(&f("a.js", "const [n, setN] = useState(0);")));
        assert!(is_component_like(&f("a.ts", "const A = () => <div/>;")));
        assert!(is_component_like(&f("a.js", "function A(p) {\n  return (\n    <div/>\n  );\n}")));
        assert!(is_component_like(&f("a.jsx", "const x = 1;")));
        assert!(!is_component_like(&f("a.js", "document.body.innerHTML = 'x';")));
        assert!(!is_component_like(&f("a.ts", "if (a < b) { return; }")));
        assert!(!is_component_like(&f("a.css", "useState(")));
    }

    #[test]
    fn nothing_renderable_is_empty_string() {
        assert_eq!(synthesize(&[f("notes.txt", "x"), f("data.json", "{}")], &PatchHint::none()), "");
    }

    #[test]
    fn hint_only_patches_when_asked() {
        assert_eq!(PatchHint::none().patch_error(), None);
        assert_eq!(PatchHint::retry("boom").patch_error(), Some("boom"));
        let hint = PatchHint {
            last_error: Some("boom".into()),
            attempt_patch: false,
        };
        assert_eq!(hint.patch_error(), None);
    }

    #[test]
    fn title_is_escaped() {
        let synth = Synthesizer {
            title: "</title><script>x</script>".into(),
            ..Synthesizer::default()
        };
        let html = synth.synthesize(&[f("a.css", "p{}")], &PatchHint::none());
        assert!(html.contains("<title>&lt;/title&gt;&lt;script&gt;x&lt;/script&gt;</title>"));
    }
}
