//! Virtual source files and the language/extension tables.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Source language of a virtual file.
///
/// Fence tags and file extensions both normalize into this enum, and
/// [`Language::extension`] maps back, so `ts` <-> `typescript` and friends
/// are mutual inverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Typescript,
    Tsx,
    Javascript,
    Jsx,
    Css,
    Html,
    Json,
    Markdown,
    Python,
    Shell,
    Yaml,
    Sql,
    Text,
}

/// Every language, in table order.
pub const ALL_LANGUAGES: [Language; 13] = [
    Language::Typescript,
    Language::Tsx,
    Language::Javascript,
    Language::Jsx,
    Language::Css,
    Language::Html,
    Language::Json,
    Language::Markdown,
    Language::Python,
    Language::Shell,
    Language::Yaml,
    Language::Sql,
    Language::Text,
];

impl Language {
    /// Normalize a fence info tag (`ts`, `typescript`, `tsx`, ...).
    /// Empty and unknown tags become [`Language::Text`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ts" | "typescript" | "mts" | "cts" => Self::Typescript,
            "tsx" => Self::Tsx,
            "js" | "javascript" | "mjs" | "cjs" | "node" => Self::Javascript,
            "jsx" | "react" => Self::Jsx,
            "css" => Self::Css,
            "html" | "htm" | "xhtml" => Self::Html,
            "json" | "jsonc" => Self::Json,
            "md" | "markdown" => Self::Markdown,
            "py" | "python" => Self::Python,
            "sh" | "bash" | "shell" | "zsh" => Self::Shell,
            "yaml" | "yml" => Self::Yaml,
            "sql" => Self::Sql,
            _ => Self::Text,
        }
    }

    /// Language for a file extension (without the dot). Extensions share the
    /// tag table.
    pub fn from_extension(ext: &str) -> Self {
        Self::from_tag(ext)
    }

    /// Canonical file extension, used when a block's filename must be
    /// synthesized.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Typescript => "ts",
            Self::Tsx => "tsx",
            Self::Javascript => "js",
            Self::Jsx => "jsx",
            Self::Css => "css",
            Self::Html => "html",
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Python => "py",
            Self::Shell => "sh",
            Self::Yaml => "yaml",
            Self::Sql => "sql",
            Self::Text => "txt",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Typescript => "typescript",
            Self::Tsx => "tsx",
            Self::Javascript => "javascript",
            Self::Jsx => "jsx",
            Self::Css => "css",
            Self::Html => "html",
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Python => "python",
            Self::Shell => "shell",
            Self::Yaml => "yaml",
            Self::Sql => "sql",
            Self::Text => "text",
        }
    }

    /// Languages the browser can execute, directly or after transpiling.
    pub fn is_script(self) -> bool {
        matches!(
            self,
            Self::Typescript | Self::Tsx | Self::Javascript | Self::Jsx
        )
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-memory source artifact authored by the assistant.
///
/// Identity is `name`, which always carries an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualFile {
    pub name: String,
    pub language: Language,
    pub content: String,
}

impl VirtualFile {
    /// Build a file, taking the language from the name's extension.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        let language = Language::from_extension(extension_of(&name));
        Self {
            name,
            language,
            content: content.into(),
        }
    }

    /// Lowercased extension of `name`, empty when there is none.
    pub fn extension(&self) -> String {
        extension_of(&self.name).to_ascii_lowercase()
    }

    /// File name without directories or extension.
    pub fn stem(&self) -> &str {
        let base = self.name.rsplit('/').next().unwrap_or(&self.name);
        match base.rfind('.') {
            Some(i) if i > 0 => &base[..i],
            _ => base,
        }
    }
}

/// Extension of a file name (text after the last dot of the last path
/// segment), or `""`.
pub fn extension_of(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    match base.rfind('.') {
        Some(i) if i > 0 => &base[i + 1..],
        _ => "",
    }
}

/// Replace the content of files that have an editor override, keyed by
/// filename. Overrides naming unknown files are ignored; extraction is not
/// re-run.
pub fn apply_overrides(
    files: &[VirtualFile],
    overrides: &BTreeMap<String, String>,
) -> Vec<VirtualFile> {
    files
        .iter()
        .map(|f| match overrides.get(&f.name) {
            Some(content) => VirtualFile {
                content: content.clone(),
                ..f.clone()
            },
            None => f.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_and_extension_tables_are_inverse() {
        for lang in ALL_LANGUAGES {
            assert_eq!(Language::from_extension(lang.extension()), lang, "{lang}");
            assert_eq!(Language::from_tag(lang.as_str()), lang, "{lang}");
        }
    }

    #[test]
    fn common_aliases_normalize() {
        assert_eq!(Language::from_tag("ts"), Language::Typescript);
        assert_eq!(Language::from_tag("TypeScript"), Language::Typescript);
        assert_eq!(Language::from_tag("js"), Language::Javascript);
        assert_eq!(Language::from_tag("htm"), Language::Html);
        assert_eq!(Language::from_tag(""), Language::Text);
        assert_eq!(Language::from_tag("brainfuck"), Language::Text);
        assert_eq!(Language::from_tag("brainfuck").extension(), "txt");
    }

    #[test]
    fn new_infers_language_from_name() {
        let f = VirtualFile::new("src/App.tsx", "x");
        assert_eq!(f.language, Language::Tsx);
        assert_eq!(f.stem(), "App");
        assert_eq!(f.extension(), "tsx");

        let g = VirtualFile::new("README", "x");
        assert_eq!(g.language, Language::Text);
        assert_eq!(g.extension(), "");
        assert_eq!(g.stem(), "README");
    }

    #[test]
    fn dotfiles_have_no_extension() {
        assert_eq!(extension_of(".env"), "");
        assert_eq!(extension_of("dir.v2/file"), "");
    }

    #[test]
    fn overrides_replace_content_only() {
        let files = vec![VirtualFile::new("App.tsx", "old"), VirtualFile::new("a.css", "x")];
        let mut overrides = BTreeMap::new();
        overrides.insert("App.tsx".to_string(), "new".to_string());
        overrides.insert("ghost.ts".to_string(), "ignored".to_string());
        let out = apply_overrides(&files, &overrides);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].content, "new");
        assert_eq!(out[0].language, Language::Tsx);
        assert_eq!(out[1].content, "x");
    }

    #[test]
    fn language_serializes_lowercase() {
        let json = serde_json::to_string(&Language::Typescript).expect("serialize");
        assert_eq!(json, "\"typescript\"");
    }
}
