//! Chat-completion client for summarization.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use blogdex_core::PostSummary;

use crate::error::LlmError;
use crate::keys::KeyPool;
use crate::response::{clean_completion, normalize_summary};

const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn";

/// Article text beyond this length adds cost without improving summaries.
const MAX_CONTENT_LEN: usize = 3000;

/// Pages yielding less text than this are likely paywalls or fetch failures;
/// the model summarizes from the title alone instead.
const MIN_CONTENT_LEN: usize = 50;

const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 600;

/// Client for an OpenAI-compatible chat-completion endpoint.
///
/// Keys rotate round-robin via [`KeyPool`]; a key that keeps returning 429
/// is retired and the request moves to the next one. Transient errors (5xx,
/// network failures) are retried with exponential backoff and jitter.
pub struct LlmClient {
    client: Client,
    base_url: String,
    model: String,
    keys: KeyPool,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl LlmClient {
    /// Creates a client against the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(
        model: &str,
        api_keys: Vec<String>,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self, LlmError> {
        Self::with_base_url(DEFAULT_BASE_URL, model, api_keys, timeout_secs, max_retries, 1_000)
    }

    /// Creates a client against an explicit base URL, for configuration
    /// overrides and mock servers in tests.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn with_base_url(
        base_url: &str,
        model: &str,
        api_keys: Vec<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            keys: KeyPool::new(api_keys),
            max_retries,
            backoff_base_ms,
        })
    }

    /// The model name requests are issued with.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Summarizes an article into Chinese with key points and sentiment.
    ///
    /// A 429 records a strike against the current key and rotates to the next
    /// one immediately; 5xx and network failures back off and retry up to
    /// `max_retries` times.
    ///
    /// # Errors
    ///
    /// - [`LlmError::NoKeys`] / [`LlmError::KeysExhausted`] when no usable key remains.
    /// - [`LlmError::UnexpectedStatus`] on a non-retriable HTTP status.
    /// - [`LlmError::EmptyResponse`] when the completion carries no content.
    /// - [`LlmError::MalformedResponse`] when the payload cannot be normalized.
    /// - [`LlmError::Http`] on network failure after retries are exhausted.
    pub async fn summarize(&self, title: &str, page_text: &str) -> Result<PostSummary, LlmError> {
        let content = prepare_content(title, page_text);
        let prompt = build_prompt(title, &content);

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "response_format": { "type": "json_object" },
        });

        let mut attempt = 0u32;
        loop {
            let key = self.keys.next_key()?;
            match self.send_completion(&key, &body).await {
                Ok(raw) => {
                    let cleaned = clean_completion(&raw);
                    return normalize_summary(&cleaned, title);
                }
                Err(LlmError::RateLimited) => {
                    tracing::warn!(title, "completion rate limited, rotating API key");
                    self.keys.record_failure(&key);
                    // Loop re-enters next_key; once every key is retired it
                    // returns KeysExhausted, so rotation terminates.
                }
                Err(err) if is_retriable(&err) && attempt < self.max_retries => {
                    attempt += 1;
                    let delay_ms = backoff_delay_ms(self.backoff_base_ms, attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms,
                        error = %err,
                        "transient completion error, retrying after backoff"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_completion(
        &self,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            return Err(LlmError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}

/// 5xx statuses and network-level failures are worth retrying; everything
/// else (4xx, malformed payloads) will fail the same way again.
fn is_retriable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        LlmError::UnexpectedStatus { status } => *status >= 500,
        _ => false,
    }
}

fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    const MAX_DELAY_MS: u64 = 30_000;
    let computed = base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    jittered
}

fn prepare_content(title: &str, page_text: &str) -> String {
    let trimmed = page_text.trim();
    if trimmed.chars().count() < MIN_CONTENT_LEN {
        return format!("Title: {title}");
    }
    trimmed.chars().take(MAX_CONTENT_LEN).collect()
}

fn build_prompt(title: &str, content: &str) -> String {
    format!(
        "\u{8bf7}\u{9605}\u{8bfb}\u{4ee5}\u{4e0b}\u{535a}\u{5ba2}\u{6587}\u{7ae0}\u{ff0c}\u{5e76}\u{7528}\u{4e2d}\u{6587}\u{5b8c}\u{6210}\u{4efb}\u{52a1}\u{ff1a}\n\
         1. \u{5c06}\u{6807}\u{9898}\u{7ffb}\u{8bd1}\u{6210}\u{4e2d}\u{6587}\n\
         2. \u{7528}\u{4e2d}\u{6587}\u{5199}\u{4e00}\u{6bb5}\u{7b80}\u{6d01}\u{7684}\u{6458}\u{8981}\u{ff08}100-150\u{5b57}\u{ff09}\n\
         3. \u{5217}\u{51fa}3-5\u{4e2a}\u{5173}\u{952e}\u{8981}\u{70b9}\n\
         4. \u{5224}\u{65ad}\u{6587}\u{7ae0}\u{60c5}\u{611f}\u{503e}\u{5411}\u{ff08}positive/negative/neutral\u{ff09}\n\n\
         \u{4ee5} JSON \u{683c}\u{5f0f}\u{8fd4}\u{56de}\u{ff1a}\n\
         {{\"translatedTitle\": \"...\", \"summary\": \"...\", \"keyPoints\": [\"...\"], \"sentiment\": \"...\"}}\n\n\
         \u{6807}\u{9898}\u{ff1a}{title}\n\n\u{6b63}\u{6587}\u{ff1a}\n{content}"
    )
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_page_text_falls_back_to_title() {
        let content = prepare_content("A Great Post", "  too short  ");
        assert_eq!(content, "Title: A Great Post");
    }

    #[test]
    fn long_page_text_is_truncated() {
        let text = "x".repeat(MAX_CONTENT_LEN * 2);
        let content = prepare_content("t", &text);
        assert_eq!(content.chars().count(), MAX_CONTENT_LEN);
    }

    #[test]
    fn prompt_embeds_title_and_content() {
        let prompt = build_prompt("My Title", "the body");
        assert!(prompt.contains("My Title"));
        assert!(prompt.contains("the body"));
        assert!(prompt.contains("translatedTitle"));
    }

    #[test]
    fn backoff_grows_with_attempts_and_respects_cap() {
        let first = backoff_delay_ms(1_000, 1);
        assert!((750..=1_250).contains(&first));
        let capped = backoff_delay_ms(1_000, 10);
        assert!(capped <= 37_500);
    }
}
