use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use blogdex_core::AppConfig;
use blogdex_pipeline::{run_discovery_batch, run_enrichment_batch};

#[derive(Debug, Parser)]
#[command(name = "blogdex-cli")]
#[command(about = "Blogdex command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sync the YAML roster into the sources table.
    Seed,
    /// Run one discovery batch over a roster window.
    Discover {
        /// Roster offset to start from.
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Number of sources to visit; defaults to the configured window.
        #[arg(long)]
        window: Option<usize>,
    },
    /// Run one enrichment batch over the unsummarized backlog.
    Enrich {
        /// Maximum posts to summarize; defaults to the configured batch size.
        #[arg(long)]
        batch: Option<usize>,
    },
    /// Print the most recently published posts with their summaries.
    Recent {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = blogdex_core::load_app_config_from_env()?;

    let pool_config = blogdex_db::PoolConfig::from_app_config(&config);
    let pool = blogdex_db::connect_pool(&config.database_url, pool_config).await?;
    blogdex_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Seed => {
            let roster = blogdex_core::load_roster(&config.sources_path)?;
            let seeded = blogdex_db::seed_sources(&pool, &roster.sources).await?;
            println!("seeded {seeded} source(s) from {}", config.sources_path.display());
        }
        Commands::Discover { offset, window } => {
            let fetcher = build_fetcher(&config)?;
            let outcome = run_discovery_batch(
                &pool,
                &fetcher,
                offset,
                window.unwrap_or(config.discover_window),
                config.posts_per_source,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Enrich { batch } => {
            let fetcher = build_fetcher(&config)?;
            let llm = Arc::new(blogdex_llm::LlmClient::with_base_url(
                &config.llm_endpoint,
                &config.llm_model,
                config.llm_api_keys.clone(),
                config.llm_timeout_secs,
                config.llm_max_retries,
                1_000,
            )?);
            let budget = Duration::from_secs(config.job_budget_secs);
            let outcome = run_enrichment_batch(
                &pool,
                &fetcher,
                &llm,
                batch.unwrap_or(config.enrich_batch),
                budget,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Recent { limit } => {
            let rows = blogdex_db::list_recent_posts(&pool, limit).await?;
            if rows.is_empty() {
                println!("no posts discovered yet");
            }
            for row in rows {
                let marker = if row.is_summarized { "*" } else { " " };
                println!(
                    "{marker} [{}] {} ({})",
                    row.published_at.format("%Y-%m-%d"),
                    row.title,
                    row.source_domain
                );
                if let Some(summary) = row.summary_text {
                    println!("    {summary}");
                }
            }
        }
    }

    Ok(())
}

fn build_fetcher(config: &AppConfig) -> anyhow::Result<blogdex_feed::FeedFetcher> {
    Ok(blogdex_feed::FeedFetcher::new(
        config.feed_timeout_secs,
        config.fetch_timeout_secs,
        &config.fetch_user_agent,
    )?)
}
