use url::Url;

use crate::sanitizer::escape_attr;

/// Build a node identifier of the form `<canonical>#<fragment>`.
pub fn fragment_id(canonical: &str, fragment: &str) -> String {
    format!("{canonical}#{fragment}")
}

/// Build a node identifier from an author-supplied anchor (step or question id).
///
/// The anchor is attribute-escaped before it is appended.
pub fn anchor_id(canonical: &str, anchor: &str) -> String {
    fragment_id(canonical, &escape_attr(anchor))
}

/// Schemes a link may point at; anything else loses its `href`.
const LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];
const IMAGE_SCHEMES: &[&str] = &["http", "https"];

/// Whether an already entity-decoded `href` is relative or uses a link scheme.
///
/// Whitespace and control characters are ignored while reading the scheme,
/// since browsers skip them too (`java\tscript:`).
pub fn is_safe_link(href: &str) -> bool {
    let compact: String = href
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace() && !ch.is_control())
        .collect();
    if compact.is_empty() {
        return false;
    }

    match compact.find([':', '/', '?', '#']) {
        Some(idx) if compact[idx..].starts_with(':') => {
            let scheme = compact[..idx].to_ascii_lowercase();
            LINK_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

/// Resolve an image `src` against the page's canonical URL.
///
/// Absolute sources are normalized, relative ones are joined onto the
/// canonical URL. Returns `None` when neither works or the result is not
/// an `http`/`https` URL.
pub fn resolve_image_url(canonical: &str, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }

    let resolved = match Url::parse(src) {
        Ok(parsed) => parsed,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(canonical).and_then(|base| base.join(src)).ok()?
        }
        Err(_) => return None,
    };

    IMAGE_SCHEMES
        .contains(&resolved.scheme())
        .then(|| resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_fragment_ids() {
        assert_eq!(
            fragment_id("https://x.test/p", "howto-1"),
            "https://x.test/p#howto-1"
        );
    }

    #[test]
    fn escapes_anchor_ids() {
        assert_eq!(
            anchor_id("https://x.test/p", "step\"1"),
            "https://x.test/p#step&quot;1"
        );
    }

    #[test]
    fn keeps_absolute_image_urls() {
        let url = "https://cdn.x.test/img/a.png";
        assert_eq!(resolve_image_url("https://x.test/p", url).as_deref(), Some(url));
    }

    #[test]
    fn joins_relative_image_urls() {
        assert_eq!(
            resolve_image_url("https://x.test/blog/post", "/uploads/a.png").as_deref(),
            Some("https://x.test/uploads/a.png")
        );
    }

    #[test]
    fn rejects_non_web_image_schemes() {
        let canonical = "https://x.test/p";
        assert_eq!(resolve_image_url(canonical, "javascript:alert(1)"), None);
        assert_eq!(resolve_image_url(canonical, "data:image/png;base64,AAAA"), None);
        assert_eq!(resolve_image_url(canonical, "vbscript:msgbox(1)"), None);
    }

    #[test]
    fn entity_lookalike_sources_stay_on_the_page_origin() {
        let resolved = resolve_image_url("https://x.test/p", "java&#x73;cript:alert(1)").unwrap();
        assert!(resolved.starts_with("https://x.test/"));
    }

    #[test]
    fn link_scheme_allow_list() {
        assert!(is_safe_link("https://x.test/a"));
        assert!(is_safe_link("HTTP://x.test/a"));
        assert!(is_safe_link("mailto:baker@x.test"));
        assert!(is_safe_link("/relative/path?q=a:b"));
        assert!(is_safe_link("#step-2"));
        assert!(is_safe_link("page.html"));

        assert!(!is_safe_link("javascript:alert(1)"));
        assert!(!is_safe_link("java\tscript:alert(1)"));
        assert!(!is_safe_link("vbscript:msgbox(1)"));
        assert!(!is_safe_link("data:text/html,x"));
        assert!(!is_safe_link("   "));
    }

    #[test]
    fn rejects_unresolvable_image_urls() {
        assert_eq!(resolve_image_url("not a base", "a.png"), None);
        assert_eq!(resolve_image_url("https://x.test/p", "   "), None);
    }
}
