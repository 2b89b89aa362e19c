//! Component strategy: normalize the entry component, embed every
//! component file as data, and mount the canonical component from the
//! bootstrap trailer.
//!
//! The trailer walks `Init -> Mounting -> {Ready, Failed}` exactly once:
//! missing `#root` fails with "mount point not found", an undefined
//! canonical component fails with "<App> is not defined", and render errors
//! are caught by an error boundary. Ready is posted from an effect that only
//! commits once the component tree has rendered.

use tracing::debug;

use super::{external_script, style_tags, Document, PatchHint, Strategy, Synthesizer};
use crate::escape::js_string_literal;
use crate::file::VirtualFile;
use crate::normalize::{component_name_for, normalize, strip_module_syntax, CANONICAL_COMPONENT};
use crate::patch::apply_rules;

/// Hooks and helpers snippets use unqualified after their imports are gone.
const REACT_GLOBALS: &[&str] = &[
    "useState",
    "useEffect",
    "useRef",
    "useMemo",
    "useCallback",
    "useReducer",
    "useContext",
    "useLayoutEffect",
    "useId",
    "createContext",
    "forwardRef",
    "memo",
    "Fragment",
];

/// A file ready to embed: its name and final source.
struct Module {
    name: String,
    source: String,
}

pub(super) fn build(synth: &Synthesizer, files: &[VirtualFile], hint: &PatchHint) -> Document {
    let components: Vec<&VirtualFile> = files.iter().filter(|f| super::is_component_like(f)).collect();
    let Some(entry_idx) = entry_index(&components) else {
        return Document::empty();
    };
    let entry = components[entry_idx];

    let mut source = normalize(&entry.content);
    let mut patches = Vec::new();
    if let Some(error) = hint.patch_error() {
        let outcome = apply_rules(&source, error);
        debug!(file = %entry.name, applied = ?outcome.applied, "patched entry component");
        source = outcome.source;
        patches = outcome.applied;
    }

    let mut modules: Vec<Module> = components
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != entry_idx)
        .map(|(_, f)| Module {
            name: f.name.clone(),
            source: strip_module_syntax(f.content.trim(), &component_name_for(f.stem()))
                .trim()
                .to_string(),
        })
        .collect();
    modules.push(Module {
        name: entry.name.clone(),
        source,
    });

    let head = [
        external_script(&synth.runtime.react),
        external_script(&synth.runtime.react_dom),
        external_script(&synth.runtime.babel),
        external_script(&synth.runtime.tailwind),
        style_tags(files),
        format!("<script>\n{}\n{}</script>", react_globals(), synth.polyfills.render()),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join("\n");

    let body = format!(
        "<div id=\"root\"></div>\n<script>\n{}\n</script>",
        trailer(&modules)
    );

    Document {
        strategy: Strategy::Component,
        html: synth.shell(&head, &body),
        entry: Some(entry.name.clone()),
        patches,
    }
}

/// Entry file: stem `App`, then `index`/`main`, then the first component.
fn entry_index(components: &[&VirtualFile]) -> Option<usize> {
    let by_stem = |stems: &[&str]| {
        components
            .iter()
            .position(|f| stems.iter().any(|s| f.stem().eq_ignore_ascii_case(s)))
    };
    by_stem(&["app"])
        .or_else(|| by_stem(&["index", "main"]))
        .or_else(|| (!components.is_empty()).then_some(0))
}

fn react_globals() -> String {
    let names: Vec<String> = REACT_GLOBALS.iter().map(|n| js_string_literal(n)).collect();
    format!(
        r#"if (typeof React !== 'undefined') {{
  [{}].forEach(function (k) {{ if (!(k in window)) window[k] = React[k]; }});
}}"#,
        names.join(", ")
    )
}

fn modules_literal(modules: &[Module]) -> String {
    let items: Vec<String> = modules
        .iter()
        .map(|m| {
            format!(
                "{{ name: {}, source: {} }}",
                js_string_literal(&m.name),
                js_string_literal(&m.source)
            )
        })
        .collect();
    format!("[\n    {}\n  ]", items.join(",\n    "))
}

fn trailer(modules: &[Module]) -> String {
    let modules = modules_literal(modules);
    let canonical = CANONICAL_COMPONENT;
    format!(
        r##"(function () {{
  var modules = {modules};
  var mount = document.getElementById('root');
  if (!mount) {{
    window.__preview.fail(new Error('mount point not found'));
    return;
  }}
  try {{
    var compiled = modules.map(function (m) {{
      return Babel.transform(m.source, {{
        filename: m.name,
        presets: [['typescript', {{ isTSX: true, allExtensions: true }}], ['react', {{ runtime: 'classic' }}]]
      }}).code;
    }}).join('\n;\n');
    var Root = new Function(compiled + '\nreturn typeof {canonical} === "undefined" ? undefined : {canonical};')();
    if (typeof Root === 'undefined') {{
      throw new ReferenceError('{canonical} is not defined');
    }}
    var Ready = function (props) {{
      React.useEffect(function () {{ window.__preview.ready(); }}, []);
      return props.children;
    }};
    var Boundary = class extends React.Component {{
      constructor(props) {{
        super(props);
        this.state = {{ failed: false }};
      }}
      static getDerivedStateFromError() {{
        return {{ failed: true }};
      }}
      componentDidCatch(error) {{
        window.__preview.fail(error);
      }}
      render() {{
        return this.state.failed ? null : this.props.children;
      }}
    }};
    ReactDOM.createRoot(mount).render(
      React.createElement(Boundary, null,
        React.createElement(Ready, null, React.createElement(Root)))
    );
  }} catch (err) {{
    window.__preview.fail(err);
  }}
}})();"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(name: &str, content: &str) -> VirtualFile {
        VirtualFile::new(name, content)
    }

    fn build_default(files: &[VirtualFile], hint: &PatchHint) -> Document {
        build(&Synthesizer::default(), files, hint)
    }

    #[test]
    fn entry_prefers_app_then_index() {
        let files = [
            f("Header.tsx", "export const Header = () => <h1/>;"),
            f("index.jsx", "const Root = () => <Header/>;"),
            f("src/App.tsx", "const Page = () => <main/>;"),
        ];
        let refs: Vec<&VirtualFile> = files.iter().collect();
        assert_eq!(entry_index(&refs), Some(2));
        assert_eq!(entry_index(&refs[..2]), Some(1));
        assert_eq!(entry_index(&refs[..1]), Some(0));
        assert_eq!(entry_index(&[]), None);
    }

    #[test]
    fn embeds_normalized_entry_after_siblings() {
        let doc = build_default(
            &[
                f("App.tsx", "import Header from './Header';\nexport default function Home() { return <Header/>; }"),
                f("Header.tsx", "export default function Header() { return <h1>Hi</h1>; }"),
            ],
            &PatchHint::none(),
        );
        assert_eq!(doc.entry.as_deref(), Some("App.tsx"));
        let header = doc.html.find(r#"name: "Header.tsx""#).expect("sibling embedded");
        let app = doc.html.find(r#"name: "App.tsx""#).expect("entry embedded");
        assert!(header < app);
        assert!(doc.html.contains("function App() { return \\u003cHeader/\\u003e; }"));
        assert!(doc.html.contains("function Header() { return \\u003ch1\\u003eHi"));
        assert!(!doc.html.contains("import Header"));
    }

    #[test]
    fn patches_only_on_retry() {
        let files = [f("App.jsx", "function Hello() {\n  return <p/>;\n}")];
        let first = build_default(&files, &PatchHint::none());
        assert!(first.patches.is_empty());
        let retry = build_default(&files, &PatchHint::retry("Main is not defined"));
        assert_eq!(retry.patches, vec!["rename-to-expected"]);
        assert!(retry.html.contains("function Main()"));
    }

    #[test]
    fn runtimes_and_styles_in_head() {
        let doc = build_default(
            &[f("App.tsx", "const App = () => <p/>;"), f("app.css", "p { color: red }")],
            &PatchHint::none(),
        );
        let head_end = doc.html.find("</head>").expect("head");
        for needle in ["react.development.js", "babel.min.js", "cdn.tailwindcss.com", "p { color: red }", "__makeIcon"] {
            let at = doc.html.find(needle).unwrap_or_else(|| panic!("missing {needle}"));
            assert!(at < head_end, "{needle} outside head");
        }
        assert!(doc.html.contains("<div id=\"root\"></div>"));
    }

    #[test]
    fn jsx_uses_classic_runtime() {
        let doc = build_default(&[f("App.tsx", "const App = () => <p/>;")], &PatchHint::none());
        assert!(doc.html.contains("['react', { runtime: 'classic' }]"));
        assert!(!doc.html.contains("jsx-runtime"));
    }

    #[test]
    fn hostile_source_cannot_break_out() {
        let doc = build_default(
            &[f("App.tsx", "const App = () => <p>{'</script><script>alert(1)</script>'}</p>;")],
            &PatchHint::none(),
        );
        assert_eq!(doc.html.matches("</script>").count(), doc.html.matches("<script").count());
        assert!(doc.html.trim_end().ends_with("</html>"));
    }
}
