use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub sources_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub fetch_user_agent: String,
    pub feed_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub discover_window: usize,
    pub posts_per_source: usize,
    pub enrich_batch: usize,
    pub job_budget_secs: u64,
    pub llm_endpoint: String,
    pub llm_model: String,
    pub llm_api_keys: Vec<String>,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("sources_path", &self.sources_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("feed_timeout_secs", &self.feed_timeout_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("discover_window", &self.discover_window)
            .field("posts_per_source", &self.posts_per_source)
            .field("enrich_batch", &self.enrich_batch)
            .field("job_budget_secs", &self.job_budget_secs)
            .field("llm_endpoint", &self.llm_endpoint)
            .field("llm_model", &self.llm_model)
            .field(
                "llm_api_keys",
                &format_args!("[{} key(s) redacted]", self.llm_api_keys.len()),
            )
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_max_retries", &self.llm_max_retries)
            .finish()
    }
}
