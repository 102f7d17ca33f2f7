use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One blog source as declared in the roster file.
///
/// `domain` is the bare host (no scheme, no path); discovery derives the
/// `https://` base URL from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub domain: String,
    pub author: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub rank: Option<i32>,
}

impl SourceConfig {
    /// Base URL for fetching this source.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

#[derive(Debug, Deserialize)]
pub struct RosterFile {
    pub sources: Vec<SourceConfig>,
}

/// Load and validate the source roster from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_roster(path: &Path) -> Result<RosterFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RosterFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let roster: RosterFile = serde_yaml::from_str(&content).map_err(ConfigError::RosterFileParse)?;

    validate_roster(&roster)?;

    Ok(roster)
}

fn validate_roster(roster: &RosterFile) -> Result<(), ConfigError> {
    if roster.sources.is_empty() {
        return Err(ConfigError::Validation(
            "roster must declare at least one source".to_string(),
        ));
    }

    let mut seen_domains = HashSet::new();

    for source in &roster.sources {
        let domain = source.domain.trim();
        if domain.is_empty() {
            return Err(ConfigError::Validation(
                "source domain must be non-empty".to_string(),
            ));
        }

        if domain.contains("://") || domain.contains('/') {
            return Err(ConfigError::Validation(format!(
                "source domain '{domain}' must be a bare host, without scheme or path"
            )));
        }

        let lower = domain.to_lowercase();
        if !seen_domains.insert(lower) {
            return Err(ConfigError::Validation(format!(
                "duplicate source domain: '{domain}'"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(domain: &str) -> SourceConfig {
        SourceConfig {
            domain: domain.to_string(),
            author: None,
            topics: Vec::new(),
            rank: None,
        }
    }

    #[test]
    fn base_url_prepends_https() {
        assert_eq!(source("example.com").base_url(), "https://example.com");
    }

    #[test]
    fn validate_rejects_empty_roster() {
        let roster = RosterFile {
            sources: Vec::new(),
        };
        let err = validate_roster(&roster).unwrap_err();
        assert!(err.to_string().contains("at least one source"));
    }

    #[test]
    fn validate_rejects_empty_domain() {
        let roster = RosterFile {
            sources: vec![source("  ")],
        };
        let err = validate_roster(&roster).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_domain_with_scheme() {
        let roster = RosterFile {
            sources: vec![source("https://example.com")],
        };
        let err = validate_roster(&roster).unwrap_err();
        assert!(err.to_string().contains("bare host"));
    }

    #[test]
    fn validate_rejects_duplicate_domain_case_insensitively() {
        let roster = RosterFile {
            sources: vec![source("Example.com"), source("example.com")],
        };
        let err = validate_roster(&roster).unwrap_err();
        assert!(err.to_string().contains("duplicate source domain"));
    }

    #[test]
    fn validate_accepts_valid_roster() {
        let roster = RosterFile {
            sources: vec![
                SourceConfig {
                    domain: "blog.rust-lang.org".to_string(),
                    author: Some("Rust Project".to_string()),
                    topics: vec!["rust".to_string()],
                    rank: Some(1),
                },
                source("example.com"),
            ],
        };
        assert!(validate_roster(&roster).is_ok());
    }

    #[test]
    fn load_roster_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("sources.yaml");
        assert!(
            path.exists(),
            "sources.yaml missing at {path:?}, required for this test"
        );
        let result = load_roster(&path);
        assert!(result.is_ok(), "failed to load sources.yaml: {result:?}");
        let roster = result.unwrap();
        assert!(!roster.sources.is_empty());
    }

    #[test]
    fn roster_parses_yaml_with_defaults() {
        let yaml = r"
sources:
  - domain: example.com
    author: Jane Doe
    rank: 2
  - domain: other.dev
";
        let roster: RosterFile = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(roster.sources.len(), 2);
        assert_eq!(roster.sources[0].rank, Some(2));
        assert!(roster.sources[1].topics.is_empty());
        assert!(roster.sources[1].author.is_none());
    }
}
