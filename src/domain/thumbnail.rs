//! Thumbnail derivation for uploaded HTML documents

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::sync::OnceLock;

/// Snapshot size: half of the 1200x800 viewport the document is laid out in
pub const SNAPSHOT_WIDTH: u32 = 600;
pub const SNAPSHOT_HEIGHT: u32 = 400;

const LINE_CHARS: usize = 38;
const MAX_LINES: usize = 9;

fn img_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?is)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).unwrap()
    })
}

fn title_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap())
}

fn heading_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>").unwrap())
}

fn invisible_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<head\b.*?</head>|<!--.*?-->")
            .unwrap()
    })
}

fn tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

/// `src` of the first `<img>` element, if any
pub fn first_image_src(html: &str) -> Option<String> {
    let captures = img_regex().captures(html)?;
    let src = captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))?
        .as_str()
        .trim();
    if src.is_empty() {
        None
    } else {
        Some(decode_entities(src))
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn strip_tags(fragment: &str) -> String {
    let text = tag_regex().replace_all(fragment, " ");
    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Document title: `<title>`, else the first heading
pub fn document_title(html: &str) -> Option<String> {
    [title_regex(), heading_regex()]
        .iter()
        .filter_map(|re| re.captures(html))
        .map(|c| strip_tags(&c[1]))
        .find(|t| !t.is_empty())
}

/// Visible body text with markup, scripts and styles removed
pub fn visible_text(html: &str) -> String {
    let without_hidden = invisible_regex().replace_all(html, " ");
    strip_tags(&without_hidden)
}

fn wrap(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let pending = current.chars().count() + usize::from(!current.is_empty());
        if !current.is_empty() && pending + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
            if lines.len() == max_lines {
                return lines;
            }
        }
        if !current.is_empty() {
            current.push(' ');
        }
        // Words longer than a line are hard-split.
        for ch in word.chars() {
            if current.chars().count() == width {
                lines.push(std::mem::take(&mut current));
                if lines.len() == max_lines {
                    return lines;
                }
            }
            current.push(ch);
        }
    }

    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }
    lines
}

/// Render a representative snapshot of an HTML document as an SVG data URI.
pub fn render_snapshot(html: &str) -> String {
    let title = document_title(html).unwrap_or_else(|| "HTML".to_string());
    let title: String = title.chars().take(LINE_CHARS).collect();
    let body = visible_text(html);

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\
         <rect width=\"{w}\" height=\"{h}\" fill=\"#ffffff\"/>\
         <rect width=\"{w}\" height=\"56\" fill=\"#1e3a8a\"/>\
         <text x=\"24\" y=\"36\" font-family=\"sans-serif\" font-size=\"22\" fill=\"#ffffff\">{t}</text>",
        w = SNAPSHOT_WIDTH,
        h = SNAPSHOT_HEIGHT,
        t = escape_xml(&title)
    );
    for (i, line) in wrap(&body, LINE_CHARS, MAX_LINES).iter().enumerate() {
        svg.push_str(&format!(
            "<text x=\"24\" y=\"{}\" font-family=\"sans-serif\" font-size=\"16\" fill=\"#374151\">{}</text>",
            96 + i * 32,
            escape_xml(line)
        ));
    }
    svg.push_str("</svg>");

    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

/// Thumbnail for an HTML upload: its first image, or a rendered snapshot
pub fn html_thumbnail(html: &str) -> String {
    first_image_src(html).unwrap_or_else(|| render_snapshot(html))
}
