//! Post discovery for a single source: feed probing with homepage fallback.

use std::time::Duration;

use reqwest::Client;

use blogdex_core::DiscoveredPost;

use crate::error::FeedError;
use crate::harvest::{find_embedded_feed_url, harvest_anchors};
use crate::parse::parse_feed;
use crate::text::extract_text;

/// Conventional feed locations, probed in order. Covers WordPress, Jekyll,
/// Hugo, Ghost, and the common static-site generators.
const FEED_PATHS: [&str; 8] = [
    "/feed",
    "/feed.xml",
    "/rss",
    "/rss.xml",
    "/index.xml",
    "/atom.xml",
    "/feeds/all.atom.xml",
    "/feeds/all.rss.xml",
];

/// Result of scanning one source: whatever posts were found, plus the first
/// fetch failure seen when the scan came back empty.
#[derive(Debug, Default)]
pub struct SourceScan {
    pub posts: Vec<DiscoveredPost>,
    pub soft_error: Option<String>,
}

/// Fetches and discovers posts for blog sources.
///
/// Construct with [`FeedFetcher::new`] for production; tests point it at a
/// mock server by passing that server's URL as the source base URL.
pub struct FeedFetcher {
    client: Client,
    feed_timeout_secs: u64,
}

impl FeedFetcher {
    /// Creates a fetcher with the given timeouts and `User-Agent`.
    ///
    /// `feed_timeout_secs` bounds each individual feed probe;
    /// `fetch_timeout_secs` bounds homepage and article-page fetches.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(
        feed_timeout_secs: u64,
        fetch_timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(fetch_timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            feed_timeout_secs,
        })
    }

    /// Discovers up to `limit` posts for the source rooted at `base_url`.
    ///
    /// Two strategies race concurrently: probing conventional feed paths
    /// (including a feed advertised on the homepage) and scraping post links
    /// from the homepage itself. The strategy yielding more posts wins; on a
    /// tie the feed result is preferred since feeds carry real publish dates.
    ///
    /// Never fails. A source that is down, feedless, and unscrapable yields
    /// an empty [`SourceScan`]; when a fetch failure caused that, it is
    /// reported in `soft_error` so the caller can record it per source.
    pub async fn discover_posts(&self, base_url: &str, limit: usize) -> SourceScan {
        let ((from_feed, feed_problem), (from_homepage, homepage_problem)) =
            tokio::join!(self.scan_feeds(base_url, limit), self.scan_homepage(base_url, limit));

        tracing::debug!(
            base_url,
            feed_posts = from_feed.len(),
            homepage_posts = from_homepage.len(),
            "discovery strategies settled"
        );

        let posts = if from_homepage.len() > from_feed.len() {
            from_homepage
        } else {
            from_feed
        };
        let soft_error = if posts.is_empty() {
            feed_problem.or(homepage_problem)
        } else {
            None
        };

        SourceScan { posts, soft_error }
    }

    /// Fetches an article page and reduces it to plain text for the model.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::UnexpectedStatus`] on a non-2xx response or
    /// [`FeedError::Http`] on a network failure.
    pub async fn fetch_page_text(&self, url: &str) -> Result<String, FeedError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        Ok(extract_text(&body))
    }

    /// Probes conventional feed paths; if none yields posts, looks for a feed
    /// URL advertised on the homepage and tries that. A missing feed is not a
    /// failure; network errors are remembered and returned alongside.
    async fn scan_feeds(&self, base_url: &str, limit: usize) -> (Vec<DiscoveredPost>, Option<String>) {
        let mut problem: Option<String> = None;

        for path in FEED_PATHS {
            let url = format!("{base_url}{path}");
            match self.try_feed_url(&url, limit).await {
                Ok(posts) if !posts.is_empty() => {
                    tracing::debug!(url, count = posts.len(), "feed probe hit");
                    return (posts, None);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(url, error = %e, "feed probe failed");
                    problem = Some(e.to_string());
                }
            }
        }

        match self.fetch_html(base_url).await {
            Ok(html) => {
                if let Some(feed_url) = find_embedded_feed_url(&html, base_url) {
                    tracing::debug!(feed_url, "trying feed advertised on homepage");
                    match self.try_feed_url(&feed_url, limit).await {
                        Ok(posts) if !posts.is_empty() => return (posts, None),
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(feed_url, error = %e, "advertised feed fetch failed");
                            problem = Some(e.to_string());
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(base_url, error = %e, "homepage fetch failed");
                problem = Some(e.to_string());
            }
        }

        (Vec::new(), problem)
    }

    /// Fetches the homepage and harvests post links from its anchors.
    async fn scan_homepage(&self, base_url: &str, limit: usize) -> (Vec<DiscoveredPost>, Option<String>) {
        match self.fetch_html(base_url).await {
            Ok(html) => (harvest_anchors(&html, base_url, limit), None),
            Err(e) => {
                tracing::warn!(base_url, error = %e, "homepage fetch failed");
                (Vec::new(), Some(e.to_string()))
            }
        }
    }

    /// Fetches one candidate feed URL and parses it. A non-2xx status is an
    /// empty result so the probe loop moves to the next path; network errors
    /// propagate so the caller can report them.
    async fn try_feed_url(&self, url: &str, limit: usize) -> Result<Vec<DiscoveredPost>, FeedError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(self.feed_timeout_secs))
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body = response.text().await?;
        Ok(parse_feed(&body, limit))
    }

    async fn fetch_html(&self, url: &str) -> Result<String, FeedError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}
