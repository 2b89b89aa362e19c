//! String encoders for embedding untrusted text inside generated markup.
//!
//! Every synthesized document has to stay well-formed no matter what the
//! embedded source contains, so user text only ever enters a document
//! through one of these functions.

/// Escape text for an HTML text node or a double-quoted attribute value.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Encode a string as a JSON/JS string literal that is safe to place inside
/// an inline `<script>` block.
///
/// `<`, `>` and `&` become `\u` escapes so the literal can never close the
/// surrounding script element or open a comment. U+2028/U+2029 are escaped
/// for older JS engines. The decoded value is byte-identical to the input.
pub fn js_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c < '\x20' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Make stylesheet text safe to place inside a `<style>` element.
///
/// `</` is rewritten to `<\/`, which CSS reads as the same characters.
pub fn style_text(css: &str) -> String {
    css.replace("</", "<\\/")
}

/// Make script text safe to place inside an inline `<script>` element.
///
/// Any `</script` (any case) becomes `<\/script`, which JS string and
/// regex literals read the same way.
pub fn script_text(js: &str) -> String {
    let lower = js.to_ascii_lowercase();
    let mut out = String::with_capacity(js.len());
    let mut last = 0;
    for (i, _) in lower.match_indices("</script") {
        out.push_str(&js[last..i]);
        out.push_str("<\\/");
        last = i + 2;
    }
    out.push_str(&js[last..]);
    out
}
