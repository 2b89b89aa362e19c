pub mod config;
pub mod controller;
pub mod error;
pub mod escape;
pub mod extract;
pub mod file;
pub mod host;
pub mod input;
pub mod normalize;
pub mod patch;
pub(crate) mod pattern;
pub mod protocol;
#[cfg(not(target_arch = "wasm32"))]
pub mod server;
pub mod synth;

#[cfg(feature = "wasm")]
pub mod wasm;

use config::PreviewConfig;
use extract::{ChatMessage, Extractor};
use file::VirtualFile;
use synth::{Document, PatchHint, Synthesizer};

/// Extract the virtual files from a chat history using `config`'s
/// lookback window.
pub fn extract_files(messages: &[ChatMessage], config: &PreviewConfig) -> Vec<VirtualFile> {
    Extractor::new(config.lookback_chars).extract(messages)
}

/// First-attempt document for a chat history: extract, then synthesize.
pub fn build_preview(messages: &[ChatMessage], config: &PreviewConfig) -> Document {
    let files = extract_files(messages, config);
    Synthesizer::new(config).build(&files, &PatchHint::none())
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::controller::{PreviewController, PreviewStatus, TimerKind};
    use crate::host::MemoryHost;
    use crate::protocol::Notification;
    use crate::synth::{PolyfillCatalog, Strategy};

    fn hello() -> Vec<VirtualFile> {
        vec![VirtualFile::new(
            "App.tsx",
            "function Hello(){return <div>Hi</div>;} export default Hello;",
        )]
    }

    #[test]
    fn extraction_is_idempotent() {
        let messages = vec![
            ChatMessage::user("make me a counter"),
            ChatMessage::assistant(
                "Here is `App.tsx`:\n```tsx\nexport default function App() { return <p/>; }\n```\n\
                 and the styles in `styles.css`:\n```css\np { color: red; }\n```\n```js\nconsole.log(1)\n```",
            ),
        ];
        let first = extract_files(&messages, &PreviewConfig::default());
        let second = extract_files(&messages, &PreviewConfig::default());
        assert_eq!(first, second);
        let names: Vec<&str> = first.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["App.tsx", "styles.css", "code1.js"]);
    }

    #[test]
    fn later_block_overwrites_same_name() {
        let messages = vec![ChatMessage::assistant(
            "Create `App.tsx`:\n```tsx\nconst App = () => <b>one</b>;\n```\n\
             Now update `App.tsx`:\n```tsx\nconst App = () => <b>two</b>;\n```",
        )];
        let files = extract_files(&messages, &PreviewConfig::default());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "App.tsx");
        assert_eq!(files[0].content, "const App = () => <b>two</b>;");
    }

    #[test]
    fn normalization_canonicalizes_widget() {
        let out = normalize::normalize("function Widget(){ return <div/>; } export default Widget;");
        assert!(out.contains("function App()"), "{out}");
        assert!(!out.contains("Widget"), "{out}");
        assert!(!out.contains("export"), "{out}");
    }

    #[test]
    fn synthesis_never_panics() {
        let garbage = String::from_utf8_lossy(&[0xff, 0x00, b'{', b'<', 0xfe, b'}', b'}', 0x80]).into_owned();
        let inputs = vec![
            vec![VirtualFile::new("App.tsx", "function App( { return <div>")],
            vec![VirtualFile::new("App.tsx", "}}}}{{{{ <<<>>> export default")],
            vec![VirtualFile::new("App.tsx", garbage.clone())],
            vec![VirtualFile::new("index.html", garbage.clone())],
            vec![VirtualFile::new("main.ts", garbage.clone())],
            vec![VirtualFile::new("a.css", garbage)],
            vec![VirtualFile::new("App.jsx", "")],
        ];
        for files in inputs {
            for hint in [PatchHint::none(), PatchHint::retry("Unexpected token (1:1)")] {
                let _html: String = synth::synthesize(&files, &hint);
            }
        }
    }

    #[test]
    fn recovery_stops_after_max_retries() {
        let config = PreviewConfig {
            max_retries: 2,
            ..PreviewConfig::default()
        };
        let mut c = PreviewController::new(MemoryHost::default(), &config);
        c.set_files(hello());
        let mut reported = 0;
        loop {
            let g = c.session().generation;
            reported += 1;
            match c.handle_notification(g, Notification::error("boom")) {
                Some(timer) => {
                    assert_eq!(timer.kind, TimerKind::Recovery);
                    c.on_timer(timer);
                }
                None => break,
            }
        }
        // Two recoveries, then the third error is final.
        assert_eq!(reported, 3);
        assert_eq!(c.status(), PreviewStatus::Failed);
        assert_eq!(c.host().mounts.len(), 3);
    }

    #[test]
    fn stale_generation_does_not_regress_state() {
        let mut c = PreviewController::new(MemoryHost::default(), &PreviewConfig::default());
        c.set_files(hello());
        let old = c.session().generation;
        c.set_files(vec![VirtualFile::new("App.tsx", "const App = () => <i/>;")]);
        let current = c.session().generation;
        c.handle_notification(current, Notification::Ready);
        let before = c.session().clone();
        c.handle_notification(old, Notification::error("late error from old frame"));
        assert_eq!(c.session(), &before);
        assert_eq!(c.status(), PreviewStatus::Ready);
    }

    #[test]
    fn hello_renders_and_becomes_ready() {
        let mut c = PreviewController::new(MemoryHost::default(), &PreviewConfig::default());
        c.set_files(hello());
        let doc = c.document().expect("document");
        assert_eq!(doc.strategy, Strategy::Component);
        assert!(doc.html.contains("function App()"));
        assert!(!doc.html.contains("Hello"));
        assert!(doc.html.contains("preview-ready"));
        assert!(doc.html.contains(r#"<div id="root"></div>"#));

        // The mounted bytes are the exported bytes.
        let (generation, mounted) = c.host().mounted.clone().expect("mounted");
        assert_eq!(mounted, doc.html);

        c.handle_raw(generation, &serde_json::json!({"type": "preview-ready"}));
        assert_eq!(c.status(), PreviewStatus::Ready);
        assert!(c.session().ready);
        assert_eq!(c.session().last_error, None);
    }

    #[test]
    fn unknown_component_exhausts_retries_unpatched() {
        let config = PreviewConfig::default();
        let synth = Synthesizer::new(&config).with_polyfills(PolyfillCatalog::standard().without("Button"));
        let mut c = PreviewController::with_synthesizer(MemoryHost::default(), synth, &config);
        c.set_files(vec![VirtualFile::new(
            "App.tsx",
            "function Hello(){return <Button>Hi</Button>;} export default Hello;",
        )]);
        let original = c.document().expect("document").html.clone();
        assert!(!original.contains(r#"window["Button"]"#));

        let error = "ReferenceError: Button is not defined";
        loop {
            let g = c.session().generation;
            match c.handle_notification(g, Notification::error(error)) {
                Some(timer) => {
                    c.on_timer(timer);
                    let doc = c.document().expect("re-synthesized");
                    assert!(doc.patches.is_empty(), "{:?}", doc.patches);
                    assert_eq!(doc.html, original);
                }
                None => break,
            }
        }
        assert_eq!(c.status(), PreviewStatus::Failed);
        assert_eq!(c.session().retry_count, config.max_retries);
        assert_eq!(c.session().last_error.as_deref(), Some(error));
    }

    #[test]
    fn build_preview_from_transcript() {
        let messages = vec![ChatMessage::assistant(
            "```html index.html\n<!DOCTYPE html><html><head></head><body><p>hi</p></body></html>\n```",
        )];
        let doc = build_preview(&messages, &PreviewConfig::default());
        assert_eq!(doc.strategy, Strategy::Prebuilt);
        assert_eq!(doc.entry.as_deref(), Some("index.html"));
        assert!(doc.html.contains("<p>hi</p>"));
        assert!(doc.html.contains("window.__preview"));
    }
}
