pub mod app_config;
pub mod config;
pub mod roster;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use roster::{load_roster, RosterFile, SourceConfig};

/// A candidate post produced by discovery, before persistence.
///
/// `url` is the identity of a post everywhere in the pipeline; titles can
/// collide or be empty, URLs cannot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredPost {
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub score: i32,
    pub comments: i32,
}

/// Overall sentiment of a post as classified by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Coerce an arbitrary model-supplied label into the closed set.
    ///
    /// Anything that is not exactly `positive` or `negative` (e.g. `mixed`,
    /// `Positive!`, an empty string) collapses to [`Sentiment::Neutral`].
    #[must_use]
    pub fn from_loose(label: &str) -> Self {
        match label.trim() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structured result of enriching one post.
///
/// `summary` already carries the `【translated title】` prefix; callers store
/// it verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub summary: String,
    pub key_points: Vec<String>,
    pub sentiment: Sentiment,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read roster file {path}: {source}")]
    RosterFileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse roster file: {0}")]
    RosterFileParse(#[from] serde_yaml::Error),
    #[error("roster validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_from_loose_accepts_exact_labels() {
        assert_eq!(Sentiment::from_loose("positive"), Sentiment::Positive);
        assert_eq!(Sentiment::from_loose("negative"), Sentiment::Negative);
        assert_eq!(Sentiment::from_loose("neutral"), Sentiment::Neutral);
    }

    #[test]
    fn sentiment_from_loose_coerces_unknown_to_neutral() {
        assert_eq!(Sentiment::from_loose("mixed"), Sentiment::Neutral);
        assert_eq!(Sentiment::from_loose(""), Sentiment::Neutral);
        assert_eq!(Sentiment::from_loose("Positive"), Sentiment::Neutral);
    }

    #[test]
    fn sentiment_serializes_lowercase() {
        let json = serde_json::to_string(&Sentiment::Positive).expect("serialize");
        assert_eq!(json, "\"positive\"");
    }

    #[test]
    fn post_summary_round_trips_through_json() {
        let summary = PostSummary {
            summary: "【标题】总结。".to_string(),
            key_points: vec!["要点一".to_string(), "要点二".to_string()],
            sentiment: Sentiment::Neutral,
        };
        let json = serde_json::to_string(&summary).expect("serialize");
        let back: PostSummary = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.summary, summary.summary);
        assert_eq!(back.key_points.len(), 2);
        assert_eq!(back.sentiment, Sentiment::Neutral);
    }
}
