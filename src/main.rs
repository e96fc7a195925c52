use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quiz_server::api;
use quiz_server::cache::{self, ViewCache};
use quiz_server::config::Config;
use quiz_server::database::{NewQuestion, QuestionRepository, SqliteQuestionRepository};
use quiz_server::server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("quiz_server=info")),
        )
        .init();

    let config = Config::parse();

    let store = cache::connect(&config.cache_url)
        .await
        .with_context(|| format!("failed to open cache store at {}", config.cache_url))?;
    let view_cache = ViewCache::new(store, config.cache_ttl());

    let repository = Arc::new(
        SqliteQuestionRepository::connect(&config.database_url)
            .await
            .with_context(|| format!("failed to open question database at {}", config.database_url))?,
    );
    let seed = match &config.seed {
        Some(path) if repository.all_questions().await?.is_empty() => Some(path),
        _ => None,
    };
    if let Some(path) = seed {
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        let batch: Vec<NewQuestion> = serde_json::from_slice(&raw)
            .with_context(|| format!("seed file {} is not a list of questions", path.display()))?;
        let stored = repository.add_questions(batch).await?;
        info!(count = stored.len(), path = %path.display(), "seeded questions");
    }

    let app = Arc::new(api::app(repository, view_cache));

    let server = Server::bind(&config.bind).await?;
    info!(
        address = %server.local_addr(),
        cache_ttl_secs = config.cache_ttl_secs,
        "starting quiz server"
    );

    server
        .run_until(
            move |req| {
                let app = Arc::clone(&app);
                async move { app.handle(req).await }
            },
            shutdown_signal(),
        )
        .await?;

    info!("quiz server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
