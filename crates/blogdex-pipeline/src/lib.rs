//! Batch orchestration: progressive discovery over the roster and
//! budget-bounded enrichment of the unsummarized backlog.

pub mod discovery;
pub mod enrichment;

use thiserror::Error;

pub use discovery::{run_discovery_batch, DiscoveryOutcome, SourceError};
pub use enrichment::{run_enrichment_batch, EnrichmentOutcome, PostError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Db(#[from] blogdex_db::DbError),
}

/// Base URL for fetching a source.
///
/// Roster domains are bare hosts and get `https://` prepended. A domain that
/// already carries a scheme is used verbatim, which also lets tests point a
/// source at a local mock server.
#[must_use]
pub fn source_base_url(domain: &str) -> String {
    if domain.contains("://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_https() {
        assert_eq!(source_base_url("example.com"), "https://example.com");
    }

    #[test]
    fn explicit_scheme_is_respected() {
        assert_eq!(
            source_base_url("http://127.0.0.1:9000"),
            "http://127.0.0.1:9000"
        );
    }
}
