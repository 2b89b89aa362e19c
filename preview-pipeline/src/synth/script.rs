//! Plain-script strategy: run non-component scripts in order inside a
//! try/catch trailer. TypeScript is transpiled in the browser first.

use super::{external_script, style_tags, Document, Strategy, Synthesizer};
use crate::escape::js_string_literal;
use crate::file::{Language, VirtualFile};

pub(super) fn build(synth: &Synthesizer, files: &[VirtualFile]) -> Document {
    let scripts: Vec<&VirtualFile> = files.iter().filter(|f| super::is_plain_script(f)).collect();
    let Some(first) = scripts.first() else {
        return Document::empty();
    };
    let needs_transpiler = scripts.iter().any(|f| f.language == Language::Typescript);

    let mut head = Vec::new();
    if needs_transpiler {
        head.push(external_script(&synth.runtime.babel));
    }
    let styles = style_tags(files);
    if !styles.is_empty() {
        head.push(styles);
    }

    let body = format!(
        "<div id=\"root\"></div>\n<script>\n{}\n</script>",
        trailer(&scripts)
    );

    Document {
        strategy: Strategy::PlainScript,
        html: synth.shell(&head.join("\n"), &body),
        entry: Some(first.name.clone()),
        patches: Vec::new(),
    }
}

fn trailer(scripts: &[&VirtualFile]) -> String {
    let items: Vec<String> = scripts
        .iter()
        .map(|f| {
            format!(
                "{{ name: {}, source: {}, typescript: {} }}",
                js_string_literal(&f.name),
                js_string_literal(&f.content),
                f.language == Language::Typescript
            )
        })
        .collect();
    let scripts = format!("[\n    {}\n  ]", items.join(",\n    "));
    format!(
        r##"(function () {{
  var scripts = {scripts};
  var mount = document.getElementById('root');
  if (!mount) {{
    window.__preview.fail(new Error('mount point not found'));
    return;
  }}
  try {{
    scripts.forEach(function (s) {{
      var code = s.typescript
        ? Babel.transform(s.source, {{ filename: s.name, presets: ['typescript'] }}).code
        : s.source;
      (0, eval)(code);
    }});
    window.__preview.ready();
  }} catch (err) {{
    window.__preview.fail(err);
  }}
}})();"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn javascript_runs_without_transpiler() {
        let doc = build(
            &Synthesizer::default(),
            &[VirtualFile::new("main.js", "document.title = 'x';")],
        );
        assert_eq!(doc.strategy, Strategy::PlainScript);
        assert!(!doc.html.contains("babel"));
        assert!(doc.html.contains("typescript: false"));
        assert!(doc.html.contains("(0, eval)(code)"));
        assert!(!doc.html.contains("react.development"));
    }

    #[test]
    fn typescript_pulls_in_transpiler() {
        let doc = build(
            &Synthesizer::default(),
            &[
                VirtualFile::new("util.ts", "const n: number = 1;"),
                VirtualFile::new("theme.css", "body { margin: 0 }"),
            ],
        );
        assert!(doc.html.contains("babel.min.js"));
        assert!(doc.html.contains("typescript: true"));
        assert!(doc.html.contains("body { margin: 0 }"));
        assert_eq!(doc.entry.as_deref(), Some("util.ts"));
    }

    #[test]
    fn scripts_keep_file_order() {
        let doc = build(
            &Synthesizer::default(),
            &[VirtualFile::new("b.js", "var b = 1;"), VirtualFile::new("a.js", "var a = b;")],
        );
        let b = doc.html.find("\"b.js\"").expect("b");
        let a = doc.html.find("\"a.js\"").expect("a");
        assert!(b < a);
    }
}
