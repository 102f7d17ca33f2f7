//! Feed discovery and HTML text extraction for blog sources.

pub mod discover;
pub mod error;
pub mod harvest;
pub mod parse;
pub mod text;

pub use discover::{FeedFetcher, SourceScan};
pub use error::FeedError;
pub use harvest::{find_embedded_feed_url, harvest_anchors};
pub use parse::parse_feed;
pub use text::{extract_text, MAX_PAGE_TEXT_LEN};
