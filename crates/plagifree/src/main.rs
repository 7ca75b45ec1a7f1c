use std::sync::Arc;

use plagifree_core::config::PlagiConfig;
use plagifree_core::{Mailer, PaymentGateway, RewriteEngine};
use plagifree_engine::InstructionTable;
use plagifree_llm::ChatCompletionsEngine;
use plagifree_payments::StripeGateway;
use plagifree_server::{AppState, Collaborators, LogMailer, SmtpMailer, build_router};
use plagifree_storage_sqlite::{
    SqliteAccountStore, SqliteHistoryStore, SqlitePaymentStore, open_pool,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .pretty()
        .init();

    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/plagifree.toml".to_string());
    let config = PlagiConfig::load(&config_path)?;

    // Ensure the data directory exists
    std::fs::create_dir_all("data")?;

    let pool = open_pool(&config.database.url).await?;

    let engine: Arc<dyn RewriteEngine> = Arc::new(ChatCompletionsEngine::new(&config.rewriter)?);
    let instructions = InstructionTable::load(config.rewriter.instructions_path.as_deref())?;

    let gateway: Option<Arc<dyn PaymentGateway>> = match &config.payments {
        Some(payments) => Some(Arc::new(StripeGateway::new(payments)?)),
        None => {
            tracing::warn!("no [payments] section configured; credit purchases are disabled");
            None
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            tracing::warn!("no [smtp] section configured; outbound mail is only logged");
            Arc::new(LogMailer)
        }
    };

    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState::new(
        config,
        SqliteAccountStore::new(pool.clone()),
        SqliteHistoryStore::new(pool.clone()),
        SqlitePaymentStore::new(pool.clone()),
        Collaborators {
            engine,
            gateway,
            mailer,
            instructions,
        },
    )?;
    let router = build_router(state);

    tracing::info!("plagifree starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("plagifree stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
