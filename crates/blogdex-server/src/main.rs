mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(blogdex_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = blogdex_db::PoolConfig::from_app_config(&config);
    let pool = blogdex_db::connect_pool(&config.database_url, pool_config).await?;
    blogdex_db::run_migrations(&pool).await?;

    let roster = blogdex_core::load_roster(&config.sources_path)?;
    let seeded = blogdex_db::seed_sources(&pool, &roster.sources).await?;
    tracing::info!(seeded, "roster synced into database");

    let fetcher = Arc::new(blogdex_feed::FeedFetcher::new(
        config.feed_timeout_secs,
        config.fetch_timeout_secs,
        &config.fetch_user_agent,
    )?);
    let llm = Arc::new(blogdex_llm::LlmClient::with_base_url(
        &config.llm_endpoint,
        &config.llm_model,
        config.llm_api_keys.clone(),
        config.llm_timeout_secs,
        config.llm_max_retries,
        1_000,
    )?);

    let _scheduler = scheduler::build_scheduler(
        pool.clone(),
        Arc::clone(&fetcher),
        Arc::clone(&llm),
        Arc::clone(&config),
    )
    .await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        blogdex_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            fetcher,
            llm,
            config: Arc::clone(&config),
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
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

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
