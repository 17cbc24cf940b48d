//! Regex-based [`CredentialExtractor`] for the share and project pages.
//!
//! The remote service renders its bootstrap values as `<meta>` tags in the
//! page head, e.g. `<meta name="ol-csrfToken" content="...">`. Attribute
//! values are HTML-escaped, so captured values are unescaped before use.

use std::sync::LazyLock;

use regex::Regex;

use crate::CredentialExtractor;

static CSRF_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="ol-csrfToken"\s+content="([^"]*)"\s*/?>"#)
        .expect("CSRF pattern is valid")
});

static TITLE_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="og:title"\s+content="([^"]*)"\s*/?>"#)
        .expect("title pattern is valid")
});

/// Extracts fields by matching the `<meta>` tags the service emits.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl RegexExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialExtractor for RegexExtractor {
    fn csrf_token(&self, page: &str) -> Option<String> {
        capture(&CSRF_META, page)
    }

    fn project_title(&self, page: &str) -> Option<String> {
        capture(&TITLE_META, page)
    }
}

fn capture(pattern: &Regex, page: &str) -> Option<String> {
    let raw = pattern.captures(page)?.get(1)?.as_str();
    let value = unescape_attribute(raw);
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Reverses the escaping applied to HTML attribute values.
fn unescape_attribute(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    // `&amp;` last so "&amp;lt;" becomes "&lt;", not "<".
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARE_PAGE: &str = r#"<!DOCTYPE html><html><head>
<meta name="og:title" content="Thesis &amp; Notes">
<meta name="ol-csrfToken" content="csrf-xyz">
<meta name="ol-user_id" content="">
</head><body></body></html>"#;

    #[test]
    fn extracts_csrf_token() {
        assert_eq!(
            RegexExtractor::new().csrf_token(SHARE_PAGE).as_deref(),
            Some("csrf-xyz")
        );
    }

    #[test]
    fn extracts_and_unescapes_title() {
        assert_eq!(
            RegexExtractor::new().project_title(SHARE_PAGE).as_deref(),
            Some("Thesis & Notes")
        );
    }

    #[test]
    fn missing_or_empty_markers_yield_none() {
        let extractor = RegexExtractor::new();
        assert_eq!(extractor.csrf_token("<html></html>"), None);
        assert_eq!(
            extractor.csrf_token(r#"<meta name="ol-csrfToken" content="">"#),
            None
        );
        assert_eq!(extractor.project_title("<html></html>"), None);
    }

    #[test]
    fn accepts_self_closing_tags() {
        assert_eq!(
            RegexExtractor::new()
                .csrf_token(r#"<meta name="ol-csrfToken" content="abc" />"#)
                .as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn unescape_does_not_double_decode() {
        assert_eq!(unescape_attribute("&amp;lt;"), "&lt;");
    }
}
