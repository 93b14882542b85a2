//! Text cleanup shared by the fetcher and the synthesizer: entity decoding,
//! markup stripping and URL normalization.

use std::sync::OnceLock;

use regex::Regex;

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Decode the HTML entities that show up in news feed payloads.
pub fn decode_html_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#x2F;", "/")
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&#xa0;", " ")
        .replace("&#xA0;", " ")
}

/// Strip residual markup and collapse whitespace runs.
pub fn strip_markup(text: &str) -> String {
    let without_tags = tag_regex().replace_all(text, " ");
    whitespace_regex()
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// Entity-decode first (feeds often double-encode embedded markup), then
/// strip tags and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    strip_markup(&decode_html_entities(text))
}

/// Canonical article identity: drop the query string and any trailing slash.
pub fn normalize_url(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    without_query.trim_end_matches('/').to_string()
}

/// Truncate on a char boundary, for per-article display summaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(
            decode_html_entities("Ben &amp; Jerry &lt;b&gt;news&lt;/b&gt;"),
            "Ben & Jerry <b>news</b>"
        );
        assert_eq!(decode_html_entities("it&#39;s&nbsp;fine"), "it's fine");
    }

    #[test]
    fn test_clean_text_strips_encoded_markup() {
        let raw = "&lt;a href=\"https://x.com\"&gt;Headline&lt;/a&gt;   more \n text";
        assert_eq!(clean_text(raw), "Headline more text");
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("https://example.com/a/b/?q=1&x=2"),
            "https://example.com/a/b"
        );
        assert_eq!(normalize_url("https://example.com/a"), "https://example.com/a");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo world", 5), "héllo");
        assert_eq!(truncate_chars("short", 300), "short");
    }
}
