//! Domain types and configuration shared by every Threads Fortune crate.

pub mod app_config;
pub mod clock;
pub mod config;
pub mod engagement;
pub mod post;

pub use app_config::{AppConfig, Environment, FallbackStats};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{load_app_config, load_app_config_from_env};
pub use engagement::engagement_rate;
pub use post::{Post, PostMetrics};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
