//! Loading virtual files from disk.
//!
//! An input path is one of:
//! - a chat transcript (`.json`): a message array, or an object with a
//!   `messages` array, run through the extractor;
//! - raw assistant output (`.md`/`.txt`), extracted as one message;
//! - a directory, whose text files become virtual files named by their
//!   path relative to it;
//! - any other single file, used as-is.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::PreviewConfig;
use crate::error::{PreviewError, Result};
use crate::extract::{ChatMessage, Extractor};
use crate::file::VirtualFile;

/// Directories never read when loading a project tree.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist", "build"];

#[derive(Deserialize)]
#[serde(untagged)]
enum Transcript {
    Messages(Vec<ChatMessage>),
    Wrapped { messages: Vec<ChatMessage> },
}

/// Parse transcript JSON.
pub fn parse_transcript(text: &str) -> std::result::Result<Vec<ChatMessage>, serde_json::Error> {
    Ok(match serde_json::from_str(text)? {
        Transcript::Messages(m) | Transcript::Wrapped { messages: m } => m,
    })
}

pub fn load_transcript(path: &Path) -> Result<Vec<ChatMessage>> {
    let text = fs::read_to_string(path).map_err(|e| PreviewError::io(path, e))?;
    parse_transcript(&text).map_err(|source| PreviewError::Transcript {
        path: path.to_path_buf(),
        source,
    })
}

/// Messages for `path` when it is a transcript or raw assistant output.
pub fn load_messages(path: &Path) -> Result<Option<Vec<ChatMessage>>> {
    match extension(path).as_str() {
        "json" => load_transcript(path).map(Some),
        "md" | "markdown" | "txt" => {
            let text = fs::read_to_string(path).map_err(|e| PreviewError::io(path, e))?;
            Ok(Some(vec![ChatMessage::assistant(text)]))
        }
        _ => Ok(None),
    }
}

/// Resolve an input path to the virtual file set it describes.
pub fn load_input(path: &Path, config: &PreviewConfig) -> Result<Vec<VirtualFile>> {
    if path.is_dir() {
        let mut files = Vec::new();
        read_tree(path, path, &mut files)?;
        files.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(dir = %path.display(), files = files.len(), "loaded directory");
        return Ok(files);
    }
    if let Some(messages) = load_messages(path)? {
        let files = Extractor::new(config.lookback_chars).extract(&messages);
        debug!(path = %path.display(), messages = messages.len(), files = files.len(), "extracted transcript");
        return Ok(files);
    }
    let content = fs::read_to_string(path).map_err(|e| PreviewError::io(path, e))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input.txt")
        .to_string();
    Ok(vec![VirtualFile::new(name, content)])
}

fn read_tree(root: &Path, dir: &Path, out: &mut Vec<VirtualFile>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| PreviewError::io(dir, e))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            if !SKIPPED_DIRS.contains(&name) {
                read_tree(root, &path, out)?;
            }
            continue;
        }
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), "skipping unreadable file: {e}");
                continue;
            }
        };
        let rel = path.strip_prefix(root).unwrap_or(&path);
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        out.push(VirtualFile::new(rel, content));
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Language;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("preview-input-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("mkdir");
        dir
    }

    #[test]
    fn transcript_shapes() {
        let plain = r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"x"}]"#;
        let wrapped = r#"{"messages":[{"role":"assistant","content":"x"}],"title":"t"}"#;
        assert_eq!(parse_transcript(plain).expect("array").len(), 2);
        assert_eq!(parse_transcript(wrapped).expect("object").len(), 1);
        assert!(parse_transcript(r#"{"content":"x"}"#).is_err());
    }

    #[test]
    fn unknown_roles_are_kept_but_not_scanned() {
        let messages = parse_transcript(r#"[{"role":"tool","content":"```js\nx()\n```"}]"#).expect("parse");
        assert_eq!(crate::extract::extract(&messages), Vec::new());
    }

    #[test]
    fn loads_directory_tree() {
        let dir = scratch("tree");
        fs::create_dir_all(dir.join("src")).expect("mkdir");
        fs::create_dir_all(dir.join("node_modules/x")).expect("mkdir");
        fs::write(dir.join("src/App.tsx"), "const App = () => <p/>;").expect("write");
        fs::write(dir.join("index.css"), "p{}").expect("write");
        fs::write(dir.join(".env"), "SECRET=1").expect("write");
        fs::write(dir.join("node_modules/x/index.js"), "x").expect("write");

        let files = load_input(&dir, &PreviewConfig::default()).expect("load");
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["index.css", "src/App.tsx"]);
        assert_eq!(files[1].language, Language::Tsx);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn loads_transcript_and_markdown() {
        let dir = scratch("chat");
        let chat = dir.join("chat.json");
        fs::write(
            &chat,
            r#"[{"role":"assistant","content":"Create `App.tsx`:\n```tsx\nconst App = () => <p/>;\n```"}]"#,
        )
        .expect("write");
        let files = load_input(&chat, &PreviewConfig::default()).expect("load");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "App.tsx");

        let md = dir.join("reply.md");
        fs::write(&md, "```css\np { color: red }\n```").expect("write");
        let files = load_input(&md, &PreviewConfig::default()).expect("load");
        assert_eq!(files[0].name, "code1.css");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn single_file_and_errors() {
        let dir = scratch("single");
        let page = dir.join("page.html");
        fs::write(&page, "<p>hi</p>").expect("write");
        let files = load_input(&page, &PreviewConfig::default()).expect("load");
        assert_eq!(files, vec![VirtualFile::new("page.html", "<p>hi</p>")]);

        let bad = dir.join("bad.json");
        fs::write(&bad, "{").expect("write");
        assert!(matches!(
            load_input(&bad, &PreviewConfig::default()),
            Err(PreviewError::Transcript { .. })
        ));
        assert!(matches!(
            load_input(&dir.join("missing.tsx"), &PreviewConfig::default()),
            Err(PreviewError::Io { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }
}
