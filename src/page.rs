//! The single-page client shell served at `GET /`.
//!
//! The HTML lives in `static/index.html` and is compiled into the binary.
//! Two placeholders are filled per request: `{{ROOT}}` (HTML text) and
//! `{{INITIAL_FILE}}` (a JavaScript string literal).

use std::path::Path;

const INDEX_TEMPLATE: &str = include_str!("../static/index.html");

/// Renders the client shell for `root`, preselecting `initial_file` if non-empty.
pub fn render_index(root: &Path, initial_file: &str) -> String {
    INDEX_TEMPLATE
        .replace("{{ROOT}}", &escape_html(&root.display().to_string()))
        .replace("{{INITIAL_FILE}}", &js_string(initial_file))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// JSON-encodes `s` and neutralizes characters that could close the script tag.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}
