//! HTML and text sanitization for schema field values

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::collections::HashSet;

use crate::url_utils::is_safe_link;

/// Tags that survive [`sanitize`] when no custom allow-list is configured.
pub const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "br", "ol", "ul", "li", "a", "p", "b", "strong", "i", "em",
];

/// Elements dropped together with everything inside them.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

static RE_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);")
        .expect("invalid entity regex")
});
static RE_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]").expect("invalid newline regex"));
static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("invalid br regex"));
static RE_BLOCK_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(p|div|h[1-6])>").expect("invalid block close regex"));
static RE_LI_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(<li\b[^>]*>)").expect("invalid li regex"));
static RE_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

static DEFAULT_SANITIZER: Lazy<HtmlSanitizer> = Lazy::new(HtmlSanitizer::default);

/// Rich-text cleaner that keeps a fixed set of tags and drops everything else.
#[derive(Debug, Clone)]
pub struct HtmlSanitizer {
    allowed: HashSet<String>,
}

impl Default for HtmlSanitizer {
    fn default() -> Self {
        Self::with_allowed_tags(DEFAULT_ALLOWED_TAGS.iter().copied())
    }
}

impl HtmlSanitizer {
    /// Build a sanitizer with a custom tag allow-list (names are case-insensitive).
    pub fn with_allowed_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: tags
                .into_iter()
                .map(|tag| tag.as_ref().trim().to_ascii_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect(),
        }
    }

    pub fn is_allowed(&self, tag: &str) -> bool {
        self.allowed.contains(&tag.to_ascii_lowercase())
    }

    /// Strip disallowed markup from `html`.
    ///
    /// The input is parsed as an HTML fragment and re-serialized from the
    /// tree. Script-like elements and comments go away with their content.
    /// Allowed tags are re-emitted without attributes, except a safe `href`
    /// on links. Disallowed tags are removed but their text is kept, and all
    /// text is escaped, so a stray `<` comes out as `&lt;`.
    pub fn sanitize(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }

        let fragment = Html::parse_fragment(html);
        let mut out = String::with_capacity(html.len());
        self.write_children(fragment.root_element(), &mut out);
        out.trim().to_string()
    }

    fn write_children(&self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&escape_html(text, false)),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.write_element(child, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn write_element(&self, element: ElementRef<'_>, out: &mut String) {
        let name = element.value().name();
        if HIDDEN_TAGS.contains(&name) {
            return;
        }
        if !self.allowed.contains(name) {
            self.write_children(element, out);
            return;
        }

        out.push('<');
        out.push_str(name);
        if name == "a" {
            let href = element
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|href| is_safe_link(href));
            if let Some(href) = href {
                out.push_str(" href=\"");
                out.push_str(&escape_html(href, true));
                out.push('"');
            }
        }
        out.push('>');

        if VOID_TAGS.contains(&name) {
            return;
        }
        self.write_children(element, out);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

/// Sanitize with the default allow-list.
pub fn sanitize(html: &str) -> String {
    DEFAULT_SANITIZER.sanitize(html)
}

/// Remove all tags without gluing words together.
///
/// Line breaks and `<br>` become spaces, closing block tags get a trailing
/// space and list items a bullet, so `<p>One</p><p>Two</p>` reads `One Two`.
/// Entities are decoded and whitespace is collapsed.
///
/// Text is read the way a browser parses it: a tag whose attribute quote is
/// never closed runs to the end of the input, and whatever follows it is lost.
pub fn strip_tags_smart(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let prepared = RE_NEWLINE.replace_all(html, " ");
    let prepared = RE_BR.replace_all(&prepared, " ");
    let prepared = RE_BLOCK_CLOSE.replace_all(&prepared, "</${1}> ");
    let prepared = RE_LI_OPEN.replace_all(&prepared, "${1}• ");

    let fragment = Html::parse_fragment(&prepared);
    let mut text = String::with_capacity(prepared.len());
    collect_text(fragment.root_element(), &mut text);

    RE_WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Escape text for use inside an HTML attribute or URL fragment.
///
/// Existing entities are left alone so already-escaped input is not
/// double-encoded.
pub fn escape_attr(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        match ch {
            '&' if RE_ENTITY.is_match(&text[idx..]) => escaped.push('&'),
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escape decoded text from the parse tree; every `&` is encoded.
fn escape_html(text: &str, in_attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !HIDDEN_TAGS.contains(&child.value().name()) {
                        collect_text(child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_allowed_tags() {
        let html = "<p>Mix <strong>well</strong> and <em>wait</em></p>";
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_sanitize_drops_disallowed_tags_but_keeps_text() {
        let html = r#"<div class="x"><span>Combine</span> ingredients</div>"#;
        assert_eq!(sanitize(html), "Combine ingredients");
    }

    #[test]
    fn test_sanitize_strips_attributes() {
        let html = r#"<p style="color:red" onclick="evil()">Text</p>"#;
        assert_eq!(sanitize(html), "<p>Text</p>");
    }

    #[test]
    fn test_sanitize_keeps_link_href() {
        let html = r#"<a href="https://example.com/a?b=1&amp;c=2" target="_blank">link</a>"#;
        assert_eq!(
            sanitize(html),
            r#"<a href="https://example.com/a?b=1&amp;c=2">link</a>"#
        );
    }

    #[test]
    fn test_sanitize_drops_javascript_href() {
        let html = r#"<a href="javascript:alert(1)">click</a>"#;
        assert_eq!(sanitize(html), "<a>click</a>");
    }

    #[test]
    fn test_sanitize_drops_obfuscated_and_foreign_schemes() {
        assert_eq!(
            sanitize(r#"<a href="java&#x73;cript:alert(1)">x</a>"#),
            "<a>x</a>"
        );
        assert_eq!(sanitize(r#"<a href=" JaVaScRiPt:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(sanitize(r#"<a href="vbscript:msgbox(1)">x</a>"#), "<a>x</a>");
        assert_eq!(
            sanitize(r#"<a href="data:text/html;base64,PHNjcmlwdD4=">x</a>"#),
            "<a>x</a>"
        );
    }

    #[test]
    fn test_sanitize_keeps_safe_link_schemes() {
        assert_eq!(
            sanitize(r#"<a href="mailto:baker@x.test">mail</a>"#),
            r#"<a href="mailto:baker@x.test">mail</a>"#
        );
        assert_eq!(
            sanitize(r#"<a href="/recipes/rye">rye</a>"#),
            r#"<a href="/recipes/rye">rye</a>"#
        );
    }

    #[test]
    fn test_sanitize_unbalanced_quote_in_disallowed_tag() {
        let sanitized = sanitize(r#"<img src=x onerror=alert(1) ">hi"#);
        assert!(!sanitized.contains("onerror"));
        assert_eq!(sanitized, "hi");
    }

    #[test]
    fn test_sanitize_escapes_stray_angle_brackets() {
        assert_eq!(sanitize("<p>1 < 2 & 3 > 2</p>"), "<p>1 &lt; 2 &amp; 3 &gt; 2</p>");
    }

    #[test]
    fn test_sanitize_keeps_void_tags_unclosed() {
        assert_eq!(sanitize("one<br/>two"), "one<br>two");
    }

    #[test]
    fn test_sanitize_removes_scripts_and_comments() {
        let html = r#"
            <p>Keep this</p>
            <script>alert('remove this')</script>
            <!-- a comment -->
            <style>p { color: red; }</style>
        "#;

        let sanitized = sanitize(html);
        assert!(sanitized.starts_with("<p>Keep this</p>"));
        assert!(!sanitized.contains("alert"));
        assert!(!sanitized.contains("comment"));
        assert!(!sanitized.contains("color"));
    }

    #[test]
    fn test_sanitize_empty_input() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   \n"), "");
    }

    #[test]
    fn test_custom_allow_list() {
        let sanitizer = HtmlSanitizer::with_allowed_tags(["B"]);
        assert!(sanitizer.is_allowed("b"));
        assert_eq!(sanitizer.sanitize("<p><b>bold</b></p>"), "<b>bold</b>");
    }

    #[test]
    fn test_strip_tags_smart_separates_blocks() {
        let html = "<p>First</p><p>Second</p><h2>Third</h2>";
        assert_eq!(strip_tags_smart(html), "First Second Third");
    }

    #[test]
    fn test_strip_tags_smart_line_breaks() {
        assert_eq!(strip_tags_smart("one<br>two<br />three\nfour"), "one two three four");
    }

    #[test]
    fn test_strip_tags_smart_list_items() {
        let html = "<ul><li>Flour</li><li>Water</li></ul>";
        assert_eq!(strip_tags_smart(html), "• Flour• Water");
    }

    #[test]
    fn test_strip_tags_smart_decodes_entities() {
        assert_eq!(strip_tags_smart("Salt &amp; <b>pepper</b>"), "Salt & pepper");
    }

    #[test]
    fn test_strip_tags_smart_drops_script_content() {
        assert_eq!(
            strip_tags_smart("Title<script>alert(1)</script>"),
            "Title"
        );
    }

    #[test]
    fn test_unterminated_attribute_swallows_rest_of_input() {
        let html = "<p>a</p>\n<p onclick=\"x>b</p>";
        assert_eq!(strip_tags_smart(html), "a");
        assert_eq!(sanitize(html), "<p>a</p>");
    }

    #[test]
    fn test_strip_tags_smart_empty_input() {
        assert_eq!(strip_tags_smart(""), "");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"a"b'<c>&d"#), "a&quot;b&#039;&lt;c&gt;&amp;d");
        assert_eq!(escape_attr("already &amp; fine"), "already &amp; fine");
        assert_eq!(escape_attr("how-to-step-1"), "how-to-step-1");
    }
}
