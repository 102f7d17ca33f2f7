use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no API keys configured")]
    NoKeys,

    #[error("all API keys exhausted by rate limiting")]
    KeysExhausted,

    #[error("rate limited (HTTP 429)")]
    RateLimited,

    #[error("unexpected HTTP status {status} from completion endpoint")]
    UnexpectedStatus { status: u16 },

    #[error("model returned an empty completion")]
    EmptyResponse,

    #[error("model response did not match the expected shape: {reason}")]
    MalformedResponse { reason: String },
}
