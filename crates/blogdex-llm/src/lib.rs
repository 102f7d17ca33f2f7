//! LLM enrichment client: Chinese summarization with key rotation.

pub mod client;
pub mod error;
pub mod keys;
pub mod response;

pub use client::LlmClient;
pub use error::LlmError;
pub use keys::KeyPool;
pub use response::{clean_completion, normalize_summary};
