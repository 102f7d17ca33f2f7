//! Cleaning and normalization of raw model completions.
//!
//! Models behind this endpoint misbehave in predictable ways: reasoning
//! models leak `<think>` transcripts before the answer, and many wrap the
//! JSON payload in Markdown code fences even when asked not to. Cleaning
//! strips both before the payload is parsed.

use blogdex_core::{PostSummary, Sentiment};

use crate::error::LlmError;

/// Strips reasoning transcripts and Markdown fences from a raw completion.
#[must_use]
pub fn clean_completion(raw: &str) -> String {
    // Everything before the final </think> is reasoning, not the answer.
    let after_think = match raw.rfind("</think>") {
        Some(idx) => &raw[idx + "</think>".len()..],
        None => raw,
    };

    let trimmed = after_think.trim();

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map_or(trimmed, |rest| rest.strip_suffix("```").unwrap_or(rest));

    unfenced.trim().to_string()
}

/// Parses a cleaned completion into a [`PostSummary`].
///
/// The payload is expected to be a JSON object with `translatedTitle`,
/// `summary`, `keyPoints`, and `sentiment`. Missing or empty
/// `translatedTitle` falls back to `original_title`; `keyPoints` defaults to
/// empty; any unrecognized sentiment collapses to neutral. The translated
/// title is prefixed onto the summary as `【title】` unless the summary
/// already contains it.
///
/// # Errors
///
/// Returns [`LlmError::MalformedResponse`] if the payload is not valid JSON
/// or lacks a non-empty `summary`.
pub fn normalize_summary(cleaned: &str, original_title: &str) -> Result<PostSummary, LlmError> {
    let value: serde_json::Value =
        serde_json::from_str(cleaned).map_err(|e| LlmError::MalformedResponse {
            reason: format!("not valid JSON: {e}"),
        })?;

    let summary = value
        .get("summary")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| LlmError::MalformedResponse {
            reason: "missing or empty summary field".to_string(),
        })?;

    let translated_title = value
        .get("translatedTitle")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(original_title);

    let key_points = value
        .get("keyPoints")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let sentiment = value
        .get("sentiment")
        .and_then(|v| v.as_str())
        .map_or(Sentiment::Neutral, Sentiment::from_loose);

    let summary = if summary.contains(translated_title) {
        summary.to_string()
    } else {
        format!("\u{3010}{translated_title}\u{3011}{summary}")
    };

    Ok(PostSummary {
        summary,
        key_points,
        sentiment,
    })
}
