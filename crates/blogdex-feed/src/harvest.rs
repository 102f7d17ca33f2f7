//! Homepage scraping fallback for sources without a working feed.

use chrono::Utc;
use regex::Regex;
use reqwest::Url;
use std::collections::HashSet;
use std::sync::OnceLock;

use blogdex_core::DiscoveredPost;

use crate::text::extract_text;

/// Post titles shorter than this are almost always navigation chrome.
const MIN_TITLE_LEN: usize = 5;
const MAX_TITLE_LEN: usize = 200;

fn embedded_feed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"href=["']([^"']*(?:feed|rss)[^"']*)["']"#).expect("valid regex")
    })
}

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\s[^>]*?href=["']([^"']+)["'][^>]*>(.*?)</a>"#).expect("valid regex")
    })
}

fn nav_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(menu|search|login|sign|home|about|contact|privacy|terms)")
            .expect("valid regex")
    })
}

/// Finds a feed URL advertised inside a homepage document, if any.
///
/// Scans `href` attributes for anything containing `feed` or `rss` and
/// resolves the first hit against `base_url`. Blog engines that do not serve
/// feeds at a conventional path usually still link theirs from the homepage.
#[must_use]
pub fn find_embedded_feed_url(html: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let captures = embedded_feed_re().captures(html)?;
    let href = captures.get(1)?.as_str();
    base.join(href).ok().map(|u| u.to_string())
}

/// Harvests likely post links from a homepage document.
///
/// Anchors survive when they resolve to the source's own host and have a
/// plausible post title (length bounds, not starting with navigation chrome
/// like "About" or "Sign in"). Fragments are stripped from harvested URLs;
/// fragment-only hrefs are in-page links and skipped. Harvested posts get
/// `published_at = now`; homepages rarely expose real dates.
#[must_use]
pub fn harvest_anchors(html: &str, base_url: &str, limit: usize) -> Vec<DiscoveredPost> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let Some(host) = base.host_str().map(str::to_owned) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut posts = Vec::new();

    for captures in anchor_re().captures_iter(html) {
        let (Some(href), Some(inner)) = (captures.get(1), captures.get(2)) else {
            continue;
        };

        let href = href.as_str();
        // A bare fragment is an in-page link, not a post.
        if href.starts_with('#') {
            continue;
        }

        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        resolved.set_fragment(None);
        if resolved.host_str() != Some(host.as_str()) {
            continue;
        }

        let title = extract_text(inner.as_str());
        let title_len = title.chars().count();
        if !(MIN_TITLE_LEN..=MAX_TITLE_LEN).contains(&title_len) {
            continue;
        }
        if nav_prefix_re().is_match(&title) {
            continue;
        }

        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        posts.push(DiscoveredPost {
            title,
            url,
            published_at: Utc::now(),
            score: 0,
            comments: 0,
        });

        if posts.len() >= limit {
            break;
        }
    }

    posts
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com";

    #[test]
    fn finds_embedded_feed_link() {
        let html = r#"<link rel="alternate" href="/custom/feed.xml" type="application/rss+xml">"#;
        assert_eq!(
            find_embedded_feed_url(html, BASE).as_deref(),
            Some("https://example.com/custom/feed.xml")
        );
    }

    #[test]
    fn embedded_feed_link_may_be_absolute() {
        let html = r#"<a href="https://feeds.example.com/rss">subscribe</a>"#;
        assert_eq!(
            find_embedded_feed_url(html, BASE).as_deref(),
            Some("https://feeds.example.com/rss")
        );
    }

    #[test]
    fn no_feed_link_returns_none() {
        let html = r#"<a href="/about">About</a>"#;
        assert!(find_embedded_feed_url(html, BASE).is_none());
    }

    #[test]
    fn harvests_same_host_anchors() {
        let html = r#"
            <a href="/posts/why-rust-is-fast">Why Rust is fast</a>
            <a href="https://example.com/posts/borrow-checker">Taming the borrow checker</a>
            <a href="https://other.com/posts/elsewhere">A post on another site</a>
        "#;
        let posts = harvest_anchors(html, BASE, 10);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "https://example.com/posts/why-rust-is-fast");
        assert_eq!(posts[1].title, "Taming the borrow checker");
    }

    #[test]
    fn strips_fragments_from_post_links() {
        let html = r##"<a href="/posts/deep-dive#section-2">Deep dive, part two</a>"##;
        let posts = harvest_anchors(html, BASE, 10);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, "https://example.com/posts/deep-dive");
    }

    #[test]
    fn skips_fragment_only_links() {
        let html = r##"<a href="#top">Back to top of page</a>"##;
        assert!(harvest_anchors(html, BASE, 10).is_empty());
    }

    #[test]
    fn fragment_variants_of_one_post_collapse() {
        let html = r##"
            <a href="/posts/one">Post number one</a>
            <a href="/posts/one#comments">Post number one comments</a>
        "##;
        let posts = harvest_anchors(html, BASE, 10);
        assert_eq!(posts.len(), 1);
    }

    #[test]
    fn skips_navigation_chrome() {
        let html = r#"
            <a href="/about-me">About this blog</a>
            <a href="/signin">Sign in to comment</a>
            <a href="/posts/real">An actual article title</a>
        "#;
        let posts = harvest_anchors(html, BASE, 10);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "An actual article title");
    }

    #[test]
    fn skips_short_and_overlong_titles() {
        let long_title = "x".repeat(201);
        let html = format!(
            r#"<a href="/a">Ok?</a><a href="/b">{long_title}</a><a href="/c">Just right title</a>"#
        );
        let posts = harvest_anchors(&html, BASE, 10);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Just right title");
    }

    #[test]
    fn dedupes_repeated_urls_within_page() {
        let html = r#"
            <a href="/posts/one">Post number one</a>
            <a href="/posts/one">Post number one again</a>
        "#;
        let posts = harvest_anchors(html, BASE, 10);
        assert_eq!(posts.len(), 1);
    }

    #[test]
    fn respects_limit() {
        let html = r#"
            <a href="/posts/one">Post number one</a>
            <a href="/posts/two">Post number two</a>
            <a href="/posts/three">Post number three</a>
        "#;
        let posts = harvest_anchors(html, BASE, 2);
        assert_eq!(posts.len(), 2);
    }

    #[test]
    fn strips_markup_from_anchor_titles() {
        let html = r#"<a href="/posts/one"><span>Styled</span> post title</a>"#;
        let posts = harvest_anchors(html, BASE, 10);
        assert_eq!(posts[0].title, "Styled post title");
    }
}
