mod api;
mod middleware;

use std::sync::Arc;

use fortune_analysis::{
    AnalyzerSettings, DisabledGenerator, OpenAiClient, PortraitGenerator, PostAnalyzer,
    TextGenerator,
};
use fortune_core::{AppConfig, Clock, SystemClock};
use fortune_db::PgPostStore;
use fortune_share::StoryCardRenderer;
use fortune_threads::ThreadsClient;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};
use crate::middleware::RateLimitState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = fortune_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = fortune_db::PoolConfig::from_app_config(&config);
    let pool = fortune_db::connect_pool(&config.database_url, pool_config).await?;
    fortune_db::run_migrations(&pool).await?;

    let generator = build_generator(&config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state = AppState {
        store: Arc::new(PgPostStore::new(pool)),
        analyzer: Arc::new(PostAnalyzer::new(
            Arc::clone(&generator),
            Arc::clone(&clock),
            AnalyzerSettings::from_app_config(&config),
        )),
        portraits: Arc::new(PortraitGenerator::from_app_config(generator, &config)),
        renderer: Arc::new(StoryCardRenderer::new()),
        threads: build_threads_client(&config)?.map(Arc::new),
        sync_limit: config.sync_limit,
        clock,
    };
    let app = build_app(state, RateLimitState::from_app_config(&config));

    tracing::info!(addr = %config.bind_addr, env = %config.env, "threads fortune api listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_generator(config: &AppConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let Some(api_key) = config.openai_api_key.as_deref() else {
        tracing::warn!("OPENAI_API_KEY not set; analyses and portraits will use fallbacks");
        return Ok(Arc::new(DisabledGenerator));
    };
    let client = OpenAiClient::from_app_config(api_key, config)?;
    Ok(Arc::new(client))
}

fn build_threads_client(config: &AppConfig) -> anyhow::Result<Option<ThreadsClient>> {
    match (
        config.threads_access_token.as_deref(),
        config.threads_user_id.as_deref(),
    ) {
        (Some(token), Some(user_id)) => Ok(Some(ThreadsClient::new(
            token,
            user_id,
            config.http_timeout_secs,
        )?)),
        _ => {
            tracing::warn!("Threads credentials not set; /api/sync is disabled");
            Ok(None)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received, draining connections");
}
