//! Integration tests for discovery against a mock HTTP server.

use blogdex_feed::FeedFetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> FeedFetcher {
    FeedFetcher::new(2, 2, "blogdex-test/0").expect("client should build")
}

const RSS_BODY: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Mock Blog</title>
  <item>
    <title>Post one</title>
    <link>https://example.com/one</link>
    <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
  </item>
  <item>
    <title>Post two</title>
    <link>https://example.com/two</link>
    <pubDate>Sun, 05 Jan 2025 10:00:00 GMT</pubDate>
  </item>
</channel></rss>"#;

#[tokio::test]
async fn discovers_posts_from_conventional_feed_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS_BODY))
        .mount(&server)
        .await;

    let scan = fetcher().discover_posts(&server.uri(), 10).await;
    assert_eq!(scan.posts.len(), 2);
    assert_eq!(scan.posts[0].title, "Post one");
    assert_eq!(scan.posts[0].url, "https://example.com/one");
}

#[tokio::test]
async fn respects_per_source_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS_BODY))
        .mount(&server)
        .await;

    let scan = fetcher().discover_posts(&server.uri(), 1).await;
    assert_eq!(scan.posts.len(), 1);
}

#[tokio::test]
async fn falls_back_to_feed_advertised_on_homepage() {
    let server = MockServer::start().await;

    // All conventional paths 404; the homepage links the real feed location.
    let homepage = r#"<html><head>
        <link rel="alternate" type="application/rss+xml" href="/unusual/feed-location">
    </head><body>tiny</body></html>"#;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(homepage))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/unusual/feed-location"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS_BODY))
        .mount(&server)
        .await;

    let scan = fetcher().discover_posts(&server.uri(), 10).await;
    assert_eq!(scan.posts.len(), 2);
    assert_eq!(scan.posts[0].title, "Post one");
}

#[tokio::test]
async fn falls_back_to_homepage_anchor_harvest() {
    let server = MockServer::start().await;

    let base = server.uri();
    let homepage = format!(
        r#"<html><body>
            <a href="{base}/posts/first-article">My first proper article</a>
            <a href="{base}/posts/second-article">Another lengthy write-up</a>
            <a href="{base}/about">About</a>
        </body></html>"#
    );

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(homepage))
        .mount(&server)
        .await;

    let scan = fetcher().discover_posts(&base, 10).await;
    assert_eq!(scan.posts.len(), 2);
    assert_eq!(scan.posts[0].title, "My first proper article");
}

#[tokio::test]
async fn feed_wins_tie_against_homepage_harvest() {
    let server = MockServer::start().await;

    let base = server.uri();
    // Two posts from the feed, two harvestable anchors: counts tie, and the
    // feed result must win because it carries real publish dates.
    let homepage = format!(
        r#"<html><body>
            <a href="{base}/posts/alpha">Harvested alpha title</a>
            <a href="{base}/posts/beta">Harvested beta title</a>
        </body></html>"#
    );

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS_BODY))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(homepage))
        .mount(&server)
        .await;

    let scan = fetcher().discover_posts(&base, 10).await;
    assert_eq!(scan.posts[0].title, "Post one");
}

#[tokio::test]
async fn total_failure_yields_empty_scan_with_soft_error() {
    let server = MockServer::start().await;
    // No mounts at all: every request 404s.
    let scan = fetcher().discover_posts(&server.uri(), 10).await;
    assert!(scan.posts.is_empty());
    let problem = scan.soft_error.expect("failed homepage fetch is reported");
    assert!(problem.contains("404"));
}

#[tokio::test]
async fn fetch_page_text_strips_html() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/posts/one"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><h1>Heading</h1><p>Body text.</p></body></html>"),
        )
        .mount(&server)
        .await;

    let text = fetcher()
        .fetch_page_text(&format!("{}/posts/one", server.uri()))
        .await
        .expect("page fetch should succeed");
    assert_eq!(text, "Heading Body text.");
}

#[tokio::test]
async fn fetch_page_text_reports_http_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let err = fetcher()
        .fetch_page_text(&format!("{}/gone", server.uri()))
        .await
        .expect_err("410 should be an error");
    assert!(err.to_string().contains("410"));
}
