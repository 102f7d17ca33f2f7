//! Plain-text extraction from HTML pages for LLM consumption.

use regex::Regex;
use std::sync::OnceLock;

/// Upper bound on extracted page text. Enough context for a summary prompt
/// without blowing out the model's input window.
pub const MAX_PAGE_TEXT_LEN: usize = 8000;

fn script_style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("valid regex")
    })
}

/// Strips an HTML document down to readable plain text.
///
/// Script and style blocks are removed wholesale, remaining tags are dropped,
/// common entities are decoded, and whitespace is collapsed. Output is capped
/// at [`MAX_PAGE_TEXT_LEN`] characters. Never fails; garbage in produces a
/// best-effort string out.
#[must_use]
pub fn extract_text(html: &str) -> String {
    let without_blocks = script_style_re().replace_all(html, " ");

    // Drop remaining tags with a small state machine rather than regex, so an
    // unclosed '<' near the end cannot swallow the rest of the document.
    let mut text = String::with_capacity(without_blocks.len() / 2);
    let mut in_tag = false;
    for c in without_blocks.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                if in_tag {
                    in_tag = false;
                    text.push(' ');
                } else {
                    text.push('>');
                }
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = decode_entities(&text);

    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() > MAX_PAGE_TEXT_LEN {
        collapsed.chars().take(MAX_PAGE_TEXT_LEN).collect()
    } else {
        collapsed
    }
}

/// Decodes the handful of entities that show up in practice in blog HTML.
fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&mdash;", "\u{2014}")
        .replace("&ndash;", "\u{2013}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<html><body><h1>Title</h1>\n\n<p>First   paragraph.</p></body></html>";
        assert_eq!(extract_text(html), "Title First paragraph.");
    }

    #[test]
    fn removes_script_and_style_contents() {
        let html = "<p>visible</p><script>var x = 'hidden';</script>\
                    <style>.a { color: red }</style><p>also visible</p>";
        let text = extract_text(html);
        assert!(text.contains("visible"));
        assert!(text.contains("also visible"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn removes_multiline_script_blocks() {
        let html = "<p>before</p><SCRIPT type=\"text/javascript\">\nline1\nline2\n</SCRIPT><p>after</p>";
        let text = extract_text(html);
        assert_eq!(text, "before after");
    }

    #[test]
    fn decodes_common_entities() {
        let html = "<p>fish &amp; chips &mdash; a &quot;classic&quot;</p>";
        assert_eq!(extract_text(html), "fish & chips \u{2014} a \"classic\"");
    }

    #[test]
    fn amp_decoded_last_so_double_encoding_survives() {
        // "&amp;lt;" means a literal "&lt;" in the source text; it must not
        // collapse all the way down to "<".
        assert_eq!(extract_text("&amp;lt;"), "&lt;");
    }

    #[test]
    fn caps_output_length() {
        let html = "a ".repeat(MAX_PAGE_TEXT_LEN);
        let text = extract_text(&html);
        assert!(text.chars().count() <= MAX_PAGE_TEXT_LEN);
    }

    #[test]
    fn tolerates_unclosed_tag() {
        let html = "<p>kept</p><a href=\"trailing";
        assert_eq!(extract_text(html), "kept");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(extract_text(""), "");
    }
}
