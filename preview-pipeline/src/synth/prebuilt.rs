//! Pre-built strategy: the first `.html` file is the document.
//!
//! The page is kept verbatim apart from three insertions: the notification
//! shim right after `<head>`, stylesheets not already present before
//! `</head>`, and JavaScript files not already present before `</body>`.
//! Nothing is normalized. Missing landmarks fall back to the nearest
//! sensible position, so any text yields a document.

use regex::Regex;

use super::{prelude, style_tags, Document, Strategy, Synthesizer};
use crate::escape::{html_escape, script_text};
use crate::file::{Language, VirtualFile};
use crate::pattern::{compiled, Pattern};

static HEAD_OPEN: Pattern = Pattern::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").ok());
static HTML_OPEN: Pattern = Pattern::new(|| Regex::new(r"(?i)<html(?:\s[^>]*)?>").ok());
static DOCTYPE: Pattern = Pattern::new(|| Regex::new(r"(?i)<!doctype[^>]*>").ok());
static HEAD_CLOSE: Pattern = Pattern::new(|| Regex::new(r"(?i)</head\s*>").ok());
static BODY_OPEN: Pattern = Pattern::new(|| Regex::new(r"(?i)<body(?:\s[^>]*)?>").ok());
static BODY_CLOSE: Pattern = Pattern::new(|| Regex::new(r"(?i)</body\s*>").ok());
static HTML_CLOSE: Pattern = Pattern::new(|| Regex::new(r"(?i)</html\s*>").ok());

/// Marker the shim defines; a page that already has it is not re-instrumented.
const SHIM_MARKER: &str = "window.__preview = {";

pub(super) fn build(_synth: &Synthesizer, files: &[VirtualFile]) -> Document {
    let Some(page) = files.iter().find(|f| f.language == Language::Html) else {
        return Document::empty();
    };
    let original = page.content.as_str();
    let mut html = original.to_string();

    let mut floor = head_start(&html);
    if !original.contains(SHIM_MARKER) {
        let shim = shim();
        html.insert_str(floor, &shim);
        floor += shim.len();
    }

    let missing = |f: &&VirtualFile| {
        let body = f.content.trim();
        !body.is_empty() && !original.contains(body)
    };

    let styles: Vec<VirtualFile> = files
        .iter()
        .filter(|f| f.language == Language::Css)
        .filter(missing)
        .cloned()
        .collect();
    if !styles.is_empty() {
        let at = head_end(&html, floor);
        html.insert_str(at, &format!("{}\n", style_tags(&styles)));
    }

    let scripts: Vec<String> = files
        .iter()
        .filter(|f| f.language == Language::Javascript)
        .filter(missing)
        .map(|f| {
            format!(
                "<script data-file=\"{}\">\n{}\n</script>\n",
                html_escape(&f.name),
                script_text(&f.content)
            )
        })
        .collect();
    if !scripts.is_empty() {
        let at = body_end(&html);
        html.insert_str(at, &scripts.concat());
    }

    Document {
        strategy: Strategy::Prebuilt,
        html,
        entry: Some(page.name.clone()),
        patches: Vec::new(),
    }
}

fn shim() -> String {
    format!(
        "\n<script>{}\nwindow.addEventListener('load', function () {{ window.__preview.ready(); }});</script>\n<style>{}</style>\n",
        prelude::NOTIFY_PRELUDE,
        prelude::PANEL_CSS
    )
}

fn end_of(pattern: &'static Pattern, html: &str) -> Option<usize> {
    compiled(pattern)?.find(html).map(|m| m.end())
}

fn start_of(pattern: &'static Pattern, html: &str) -> Option<usize> {
    compiled(pattern)?.find(html).map(|m| m.start())
}

fn last_start_of(pattern: &'static Pattern, html: &str) -> Option<usize> {
    compiled(pattern)?.find_iter(html).last().map(|m| m.start())
}

/// Just inside the head: after `<head>`, else `<html>`, else the doctype.
fn head_start(html: &str) -> usize {
    end_of(&HEAD_OPEN, html)
        .or_else(|| end_of(&HTML_OPEN, html))
        .or_else(|| end_of(&DOCTYPE, html))
        .unwrap_or(0)
}

/// Before `</head>`, else before `<body>`, else `floor` (past the shim).
fn head_end(html: &str, floor: usize) -> usize {
    start_of(&HEAD_CLOSE, html)
        .or_else(|| start_of(&BODY_OPEN, html))
        .map_or(floor, |at| at.max(floor))
}

/// Before the last `</body>`, else before `</html>`, else the end.
fn body_end(html: &str) -> usize {
    last_start_of(&BODY_CLOSE, html)
        .or_else(|| last_start_of(&HTML_CLOSE, html))
        .unwrap_or(html.len())
}
