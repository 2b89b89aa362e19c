//! Code block extractor. Scans assistant chat text for fenced code blocks
//! and turns them into an ordered, deduplicated set of virtual files.
//!
//! Filenames are inferred heuristically:
//! 1. a filename in the fence info string (```` ```tsx App.tsx ````),
//! 2. a backtick-quoted path in the text just before the fence,
//! 3. a path following a word like "file", "create", "update" or "in",
//! 4. a bare `name.ext` at the end of a line.
//!
//! When nothing matches, the block is named `code<N>.<ext>`.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::file::{extension_of, Language, VirtualFile};
use crate::pattern::{compiled, Pattern};

/// Default number of characters searched before a fence for a filename.
pub const DEFAULT_LOOKBACK: usize = 150;

/// Author of a chat message. Only assistant output is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A fenced block found in one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch {
    /// Language from the fence tag (`Text` when absent or unknown).
    pub language: Language,
    /// Filename given directly in the fence info string, if any.
    pub info_name: Option<String>,
    /// Block body with trailing whitespace removed.
    pub raw_content: String,
    /// Byte offset of the opening fence.
    pub start_offset: usize,
    /// Byte offset just past the closing fence.
    pub end_offset: usize,
}

// ── Patterns ──────────────────────────────────────────────────────────

static FENCE: Pattern = Pattern::new(|| Regex::new(r"(?s)```([^\n`]*)\n(.*?)```").ok());

static PATH_TOKEN: Pattern =
    Pattern::new(|| Regex::new(r"([\w@./-]*[\w-]\.[A-Za-z][A-Za-z0-9]{0,5})").ok());

static BACKTICK_NAME: Pattern =
    Pattern::new(|| Regex::new(r"`([\w@./-]*[\w-]\.[A-Za-z][A-Za-z0-9]{0,5})`").ok());

static KEYWORD_NAME: Pattern = Pattern::new(|| {
    Regex::new(
        r#"(?i)\b(?:file|create|update|in|named|called|edit)\b\s*:?\s*[*_"']*([\w@./-]*[\w-]\.[A-Za-z][A-Za-z0-9]{0,5})\b"#,
    )
    .ok()
});

static LINE_END_NAME: Pattern = Pattern::new(|| {
    Regex::new(r#"(?m)([\w@./-]*[\w-]\.[A-Za-z][A-Za-z0-9]{0,5})[*_"':]*[ \t]*$"#).ok()
});

// ── Extractor ─────────────────────────────────────────────────────────

/// Turns chat history into virtual files.
#[derive(Debug, Clone)]
pub struct Extractor {
    lookback: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

impl Extractor {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    /// Extract every non-empty fenced block from assistant messages.
    ///
    /// Output is in first-seen order of distinct filenames. A later block
    /// with the same name replaces the earlier content in place.
    pub fn extract(&self, messages: &[ChatMessage]) -> Vec<VirtualFile> {
        let mut files: Vec<VirtualFile> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut counter = 0usize;

        for message in messages.iter().filter(|m| m.role == Role::Assistant) {
            let text = message.content.as_str();
            let mut prev_end = 0usize;

            for block in find_blocks(text) {
                let window = lookback_window(text, prev_end, block.start_offset, self.lookback);
                prev_end = block.end_offset;

                if block.raw_content.trim().is_empty() {
                    continue;
                }

                let inferred = block
                    .info_name
                    .clone()
                    .or_else(|| infer_filename(window))
                    .filter(|name| compatible(block.language, name));

                let (name, language) = match inferred {
                    Some(name) => {
                        let language = if block.language == Language::Text {
                            Language::from_extension(extension_of(&name))
                        } else {
                            block.language
                        };
                        (name, language)
                    }
                    None => {
                        counter += 1;
                        (
                            format!("code{counter}.{}", block.language.extension()),
                            block.language,
                        )
                    }
                };

                let file = VirtualFile {
                    name: name.clone(),
                    language,
                    content: block.raw_content,
                };
                match index.get(&name) {
                    Some(&i) => files[i] = file,
                    None => {
                        index.insert(name, files.len());
                        files.push(file);
                    }
                }
            }
        }

        debug!(files = files.len(), synthesized = counter, "extracted virtual files");
        files
    }
}

/// Extract with the default lookback window.
pub fn extract(messages: &[ChatMessage]) -> Vec<VirtualFile> {
    Extractor::default().extract(messages)
}

/// Find every closed fenced block in `text`.
pub fn find_blocks(text: &str) -> Vec<ExtractionMatch> {
    let Some(fence) = compiled(&FENCE) else {
        return Vec::new();
    };
    fence
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let info = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            let (language, info_name) = parse_info_string(info);
            Some(ExtractionMatch {
                language,
                info_name,
                raw_content: body.trim_end().to_string(),
                start_offset: whole.start(),
                end_offset: whole.end(),
            })
        })
        .collect()
}

/// Split a fence info string into its language tag and an optional filename.
fn parse_info_string(info: &str) -> (Language, Option<String>) {
    let info = info.trim();
    let tag_len = info
        .find(|c: char| c.is_whitespace() || c == ':' || c == '{')
        .unwrap_or(info.len());
    let (tag, rest) = info.split_at(tag_len);

    // ```App.tsx: the tag itself is the filename
    if tag.contains('.') {
        if let Some(name) = first_path_token(tag) {
            let language = Language::from_extension(extension_of(&name));
            return (language, Some(name));
        }
    }

    (Language::from_tag(tag), first_path_token(rest))
}

fn first_path_token(s: &str) -> Option<String> {
    let re = compiled(&PATH_TOKEN)?;
    re.captures(s)
        .and_then(|c| c.get(1))
        .map(|m| clean_name(m.as_str()))
        .filter(|n| !n.is_empty())
}

/// Slice of `text` searched for a filename: at most `lookback` bytes before
/// `start`, never reaching back past `floor` (the previous fence's end).
fn lookback_window(text: &str, floor: usize, start: usize, lookback: usize) -> &str {
    let mut from = start.saturating_sub(lookback).max(floor).min(start);
    while from < start && !text.is_char_boundary(from) {
        from += 1;
    }
    &text[from..start]
}

/// Infer a filename from the text preceding a fence. Patterns are tried in
/// order; within a pattern the match closest to the fence wins.
pub fn infer_filename(window: &str) -> Option<String> {
    [&BACKTICK_NAME, &KEYWORD_NAME, &LINE_END_NAME]
        .into_iter()
        .filter_map(compiled)
        .find_map(|re| {
            re.captures_iter(window)
                .filter_map(|c| c.get(1))
                .last()
                .map(|m| clean_name(m.as_str()))
                .filter(|n| !n.is_empty())
        })
}

fn clean_name(raw: &str) -> String {
    raw.trim_start_matches("./")
        .trim_start_matches('/')
        .trim_end_matches('.')
        .to_string()
}

/// Whether an inferred filename fits the fence's language. Untagged blocks
/// accept any name; script tags accept any script extension.
fn compatible(tag: Language, name: &str) -> bool {
    let named = Language::from_extension(extension_of(name));
    tag == Language::Text || named == tag || (tag.is_script() && named.is_script())
}
