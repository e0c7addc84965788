use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use fortune_analysis::{
    summarize, AnalyzerSettings, DisabledGenerator, OpenAiClient, PortraitGenerator,
    PortraitOutcome, PostAnalyzer, TextGenerator,
};
use fortune_core::{AppConfig, Clock, SystemClock};
use fortune_db::{PgPostStore, PostStore};
use fortune_threads::{sync_posts, ThreadsClient};
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fortune-cli")]
#[command(about = "Threads Fortune command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Pull recent posts and insights from Threads
    Sync {
        /// Number of posts to fetch (defaults to FORTUNE_SYNC_LIMIT)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Print engagement statistics for every stored post
    Summary,
    /// Analyze the given posts, reusing fresh cached results
    Analyze {
        /// Thread ids to analyze
        #[arg(required = true)]
        post_ids: Vec<String>,
    },
    /// Generate a creator portrait from every stored post
    Portrait,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("fortune-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = fortune_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = fortune_db::connect_pool(
        &config.database_url,
        fortune_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match command {
        Commands::Db { command } => run_db(&pool, command).await?,
        Commands::Sync { limit } => {
            let client = threads_client(&config)?;
            let store = PgPostStore::new(pool);
            let report = sync_posts(
                &client,
                &store,
                limit.unwrap_or(config.sync_limit),
                Utc::now(),
            )
            .await?;
            print_json(&report)?;
        }
        Commands::Summary => {
            let posts = PgPostStore::new(pool).all().await?;
            print_json(&summarize(&posts))?;
        }
        Commands::Analyze { post_ids } => {
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let analyzer = PostAnalyzer::new(
                build_generator(&config)?,
                clock,
                AnalyzerSettings::from_app_config(&config),
            );
            let batch = analyzer
                .analyze_batch(&PgPostStore::new(pool), &post_ids)
                .await?;
            print_json(&batch)?;
        }
        Commands::Portrait => {
            let posts = PgPostStore::new(pool).all().await?;
            let generator = PortraitGenerator::from_app_config(build_generator(&config)?, &config);
            let outcome = generator.generate(&posts).await;
            if let PortraitOutcome::Fallback { reason, .. } = &outcome {
                tracing::warn!(reason = %reason, "printing default portrait");
            }
            print_json(outcome.portrait())?;
        }
    }

    Ok(())
}

async fn run_db(pool: &PgPool, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            PgPostStore::new(pool.clone()).health_check().await?;
            println!("database reachable");
        }
        DbCommands::Migrate => {
            fortune_db::run_migrations(pool).await?;
            println!("migrations applied");
        }
    }
    Ok(())
}

fn build_generator(config: &AppConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    match config.openai_api_key.as_deref() {
        Some(api_key) => Ok(Arc::new(OpenAiClient::from_app_config(api_key, config)?)),
        None => {
            tracing::warn!("OPENAI_API_KEY not set; results will be fallbacks");
            Ok(Arc::new(DisabledGenerator))
        }
    }
}

fn threads_client(config: &AppConfig) -> anyhow::Result<ThreadsClient> {
    let token = config
        .threads_access_token
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("THREADS_ACCESS_TOKEN is required for sync"))?;
    let user_id = config
        .threads_user_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("THREADS_USER_ID is required for sync"))?;
    Ok(ThreadsClient::new(token, user_id, config.http_timeout_secs)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
