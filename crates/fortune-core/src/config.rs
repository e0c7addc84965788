use crate::app_config::{AppConfig, Environment, FallbackStats};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the real environment so tests can
/// drive it from a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("FORTUNE_ENV", "development"))?;
    let bind_addr = parse_addr("FORTUNE_BIND_ADDR", "0.0.0.0:8000")?;
    let log_level = or_default("FORTUNE_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("FORTUNE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FORTUNE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FORTUNE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let max_posts_per_analysis = or_default("FORTUNE_MAX_POSTS_PER_ANALYSIS", "10")
        .parse::<usize>()
        .map_err(|e| invalid("FORTUNE_MAX_POSTS_PER_ANALYSIS", e.to_string()))?;
    if max_posts_per_analysis == 0 {
        return Err(invalid(
            "FORTUNE_MAX_POSTS_PER_ANALYSIS",
            "must be at least 1".to_string(),
        ));
    }

    let cache_analysis_days = or_default("FORTUNE_CACHE_ANALYSIS_DAYS", "30")
        .parse::<i64>()
        .map_err(|e| invalid("FORTUNE_CACHE_ANALYSIS_DAYS", e.to_string()))?;
    if cache_analysis_days < 0 {
        return Err(invalid(
            "FORTUNE_CACHE_ANALYSIS_DAYS",
            "must not be negative".to_string(),
        ));
    }

    let portrait_fallback_stats =
        parse_fallback_stats(&or_default("FORTUNE_PORTRAIT_FALLBACK_STATS", "zeroed"))?;

    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_base_url = or_default("OPENAI_BASE_URL", "https://api.openai.com/v1");
    let openai_model = or_default("OPENAI_MODEL", "gpt-3.5-turbo");
    let generation_timeout_secs = parse_u64("FORTUNE_GENERATION_TIMEOUT_SECS", "30")?;
    let generation_max_retries = parse_u32("FORTUNE_GENERATION_MAX_RETRIES", "2")?;

    let threads_access_token = optional("THREADS_ACCESS_TOKEN");
    let threads_user_id = optional("THREADS_USER_ID");
    let sync_limit = parse_u32("FORTUNE_SYNC_LIMIT", "50")?;
    let http_timeout_secs = parse_u64("FORTUNE_HTTP_TIMEOUT_SECS", "30")?;

    let rate_limit_max_requests = or_default("FORTUNE_RATE_LIMIT_MAX_REQUESTS", "120")
        .parse::<usize>()
        .map_err(|e| invalid("FORTUNE_RATE_LIMIT_MAX_REQUESTS", e.to_string()))?;
    let rate_limit_window_secs = parse_u64("FORTUNE_RATE_LIMIT_WINDOW_SECS", "60")?;
    if rate_limit_max_requests > 0 && rate_limit_window_secs == 0 {
        return Err(invalid(
            "FORTUNE_RATE_LIMIT_WINDOW_SECS",
            "must be at least 1 while rate limiting is enabled".to_string(),
        ));
    }

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        max_posts_per_analysis,
        cache_analysis_days,
        portrait_fallback_stats,
        openai_api_key,
        openai_base_url,
        openai_model,
        generation_timeout_secs,
        generation_max_retries,
        threads_access_token,
        threads_user_id,
        sync_limit,
        http_timeout_secs,
        rate_limit_max_requests,
        rate_limit_window_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FORTUNE_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_fallback_stats(s: &str) -> Result<FallbackStats, ConfigError> {
    match s {
        "zeroed" => Ok(FallbackStats::Zeroed),
        "batch" => Ok(FallbackStats::FromBatch),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FORTUNE_PORTRAIT_FALLBACK_STATS".to_string(),
            reason: format!("expected 'zeroed' or 'batch', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
