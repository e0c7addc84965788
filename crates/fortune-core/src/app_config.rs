use std::net::SocketAddr;

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

/// What the portrait fallback reports for `total_posts` / `avg_engagement`.
///
/// `Zeroed` keeps the long-standing behavior of reporting zeros whenever the
/// model output is unusable, even for a non-empty batch. `FromBatch` reports
/// the real batch statistics instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackStats {
    #[default]
    Zeroed,
    FromBatch,
}

impl std::fmt::Display for FallbackStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackStats::Zeroed => write!(f, "zeroed"),
            FallbackStats::FromBatch => write!(f, "batch"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub max_posts_per_analysis: usize,
    pub cache_analysis_days: i64,
    pub portrait_fallback_stats: FallbackStats,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub generation_timeout_secs: u64,
    pub generation_max_retries: u32,
    pub threads_access_token: Option<String>,
    pub threads_user_id: Option<String>,
    pub sync_limit: u32,
    pub http_timeout_secs: u64,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("max_posts_per_analysis", &self.max_posts_per_analysis)
            .field("cache_analysis_days", &self.cache_analysis_days)
            .field("portrait_fallback_stats", &self.portrait_fallback_stats)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("generation_timeout_secs", &self.generation_timeout_secs)
            .field("generation_max_retries", &self.generation_max_retries)
            .field(
                "threads_access_token",
                &self.threads_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("threads_user_id", &self.threads_user_id)
            .field("sync_limit", &self.sync_limit)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .finish()
    }
}
